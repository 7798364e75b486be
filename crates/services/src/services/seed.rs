//! Demo data for a fresh install. Running it twice leaves the database unchanged.

use std::collections::HashMap;

use anyhow::{Context, anyhow};
use chrono::{Days, NaiveDate};
use db::models::{
    allocation::{Allocation, Period},
    client::{Client, CreateClient},
    job::{CreateJob, Job, RequirementInput},
    note::{CreateNote, Note},
    trade_person::TradePerson,
    trade_role::TradeRole,
    user::{User, UserRole},
};
use sqlx::SqlitePool;
use tracing::info;

use super::{auth::AuthService, schedule::week_start};

pub const SEED_PASSWORD: &str = "password123";

const TRADE_ROLES: &[&str] = &["Plumber", "Tiler", "Carpenter", "Electrician"];

const STAFF: &[(&str, &str, UserRole)] = &[
    ("admin@tradiedr.com", "System Administrator", UserRole::SystemAdmin),
    ("office@tradiedr.com", "Office Staff", UserRole::OfficeStaff),
];

/// (email, name, trade)
const TRADIES: &[(&str, &str, &str)] = &[
    ("john.plumber@tradiedr.com", "John Smith", "Plumber"),
    ("sarah.tiler@tradiedr.com", "Sarah Johnson", "Tiler"),
    ("mike.carpenter@tradiedr.com", "Mike Brown", "Carpenter"),
    ("lisa.electrician@tradiedr.com", "Lisa Williams", "Electrician"),
    ("david.plumber@tradiedr.com", "David Chen", "Plumber"),
    ("emma.tiler@tradiedr.com", "Emma Davis", "Tiler"),
    ("james.carpenter@tradiedr.com", "James Wilson", "Carpenter"),
    ("sophia.electrician@tradiedr.com", "Sophia Martinez", "Electrician"),
];

const CLIENTS: &[(&str, &str)] = &[
    ("ABC Renovations Ltd", "contact@abcrenovations.com"),
    ("Home Sweet Home", "info@homesweethome.com"),
    ("Modern Living Co", "hello@modernliving.com"),
    ("Elite Properties", "info@eliteproperties.com"),
    ("Dream Homes Inc", "contact@dreamhomes.com"),
    ("Premium Builders", "hello@premiumbuilders.com"),
];

struct JobSeed {
    name: &'static str,
    description: &'static str,
    client: usize,
    materials: &'static str,
    requirements: &'static [(&'static str, i64)],
}

const JOBS: &[JobSeed] = &[
    JobSeed {
        name: "Bathroom Renovation - Main Suite",
        description: "Complete bathroom renovation including plumbing, tiling, and carpentry",
        client: 0,
        materials: "Tiles, fixtures, vanity, mirror",
        requirements: &[("Plumber", 4), ("Tiler", 6), ("Carpenter", 2)],
    },
    JobSeed {
        name: "Kitchen Upgrade",
        description: "Kitchen plumbing and electrical work",
        client: 1,
        materials: "Sink, taps, electrical outlets",
        requirements: &[("Plumber", 2), ("Electrician", 3)],
    },
    JobSeed {
        name: "Ensuite Bathroom",
        description: "New ensuite bathroom installation",
        client: 2,
        materials: "Toilet, shower, tiles, vanity",
        requirements: &[("Plumber", 3), ("Tiler", 4)],
    },
    JobSeed {
        name: "Master Bathroom Renovation",
        description: "Full master bathroom renovation with premium fixtures",
        client: 3,
        materials: "Premium tiles, fixtures, heated floors, custom vanity",
        requirements: &[("Plumber", 5), ("Tiler", 8), ("Electrician", 2)],
    },
    JobSeed {
        name: "Guest Bathroom Remodel",
        description: "Complete guest bathroom remodel",
        client: 0,
        materials: "Tiles, fixtures, vanity, lighting",
        requirements: &[("Plumber", 3), ("Tiler", 5), ("Carpenter", 1)],
    },
    JobSeed {
        name: "Kitchen & Bathroom Combo",
        description: "Simultaneous kitchen and bathroom renovation",
        client: 4,
        materials: "Kitchen fixtures, bathroom tiles, plumbing, electrical",
        requirements: &[("Plumber", 6), ("Tiler", 4), ("Electrician", 4), ("Carpenter", 3)],
    },
    JobSeed {
        name: "Luxury Spa Bathroom",
        description: "High-end spa-style bathroom installation",
        client: 5,
        materials: "Premium materials, spa fixtures, custom cabinetry",
        requirements: &[("Plumber", 6), ("Tiler", 10), ("Electrician", 3), ("Carpenter", 4)],
    },
    JobSeed {
        name: "Powder Room Update",
        description: "Small powder room update and refresh",
        client: 1,
        materials: "New fixtures, paint, mirror",
        requirements: &[("Plumber", 1), ("Tiler", 2)],
    },
    JobSeed {
        name: "Family Bathroom Overhaul",
        description: "Complete family bathroom overhaul",
        client: 2,
        materials: "Durable tiles, family-friendly fixtures, storage",
        requirements: &[("Plumber", 4), ("Tiler", 6), ("Carpenter", 2)],
    },
    JobSeed {
        name: "Commercial Bathroom Refit",
        description: "Commercial bathroom refit for office building",
        client: 3,
        materials: "Commercial-grade fixtures, durable materials",
        requirements: &[("Plumber", 8), ("Tiler", 12), ("Electrician", 4)],
    },
];

/// (job, tradie, days after this week's Monday, period)
const ALLOCATIONS: &[(usize, usize, u64, Period)] = &[
    (0, 0, 0, Period::Am),
    (0, 0, 0, Period::Pm),
    (0, 1, 1, Period::Am),
    (0, 1, 1, Period::Pm),
    (0, 2, 2, Period::Am),
    (1, 0, 3, Period::Am),
    (1, 3, 3, Period::Pm),
    (2, 1, 4, Period::Am),
    (3, 4, 0, Period::Am),
    (3, 5, 0, Period::Pm),
    (3, 4, 1, Period::Am),
    (3, 5, 1, Period::Pm),
    (4, 0, 2, Period::Am),
    (4, 1, 2, Period::Pm),
    (5, 4, 3, Period::Am),
    (5, 7, 3, Period::Pm),
    (5, 6, 4, Period::Am),
    (6, 7, 4, Period::Pm),
    (6, 5, 7, Period::Am),
    (7, 4, 0, Period::Pm),
    (7, 5, 1, Period::Am),
    (8, 2, 1, Period::Pm),
    (8, 4, 2, Period::Am),
    (8, 5, 2, Period::Pm),
    (9, 0, 7, Period::Pm),
    (9, 1, 3, Period::Pm),
    (9, 5, 4, Period::Am),
    (9, 3, 4, Period::Pm),
];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub trade_persons: usize,
    pub clients: usize,
    pub jobs: usize,
    pub allocations: usize,
    pub notes: usize,
}

/// Populate the demo company, with bookings around the week containing `today`.
///
/// Roles, users and trade persons are matched by natural key. Clients, jobs and
/// notes are only written into a database with no clients yet. Allocations skip
/// any slot that is already taken.
pub async fn seed(
    pool: &SqlitePool,
    auth: &AuthService,
    today: NaiveDate,
) -> anyhow::Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut roles: HashMap<&str, TradeRole> = HashMap::new();
    for name in TRADE_ROLES {
        roles.insert(*name, TradeRole::upsert(pool, name).await?);
    }
    info!(count = roles.len(), "Trade roles ready");

    let password_hash = auth
        .hash_password(SEED_PASSWORD)
        .await
        .context("hashing seed password")?;

    let mut office = None;
    for (email, name, role) in STAFF {
        let user = User::upsert_by_email(pool, email, name, *role, &password_hash).await?;
        if *role == UserRole::OfficeStaff {
            office = Some(user);
        }
        summary.users += 1;
    }

    let mut tradies: Vec<(User, TradePerson)> = Vec::with_capacity(TRADIES.len());
    for (email, name, trade) in TRADIES {
        let user =
            User::upsert_by_email(pool, email, name, UserRole::TradePerson, &password_hash).await?;
        summary.users += 1;
        let trade_person = match TradePerson::find_by_user_id(pool, user.id).await? {
            Some(existing) => existing,
            None => {
                let role = roles
                    .get(trade)
                    .ok_or_else(|| anyhow!("unknown trade {trade}"))?;
                summary.trade_persons += 1;
                TradePerson::create(pool, user.id, &[role.id]).await?
            }
        };
        tradies.push((user, trade_person));
    }
    info!(users = summary.users, new_trade_persons = summary.trade_persons, "Users ready");

    if Client::count(pool).await? > 0 {
        info!("Clients already present, leaving jobs and notes alone");
        return Ok(summary);
    }

    let mut clients = Vec::with_capacity(CLIENTS.len());
    for (name, contact) in CLIENTS {
        let client = Client::create(
            pool,
            &CreateClient {
                name: name.to_string(),
                contact: Some(contact.to_string()),
                phone: None,
            },
        )
        .await?;
        clients.push(client);
    }
    summary.clients = clients.len();

    let mut jobs: Vec<Job> = Vec::with_capacity(JOBS.len());
    for seed in JOBS {
        let mut requirements = Vec::with_capacity(seed.requirements.len());
        for (trade, slots) in seed.requirements {
            let role = roles
                .get(trade)
                .ok_or_else(|| anyhow!("unknown trade {trade}"))?;
            requirements.push(RequirementInput {
                trade_role_id: role.id,
                required_slots: *slots,
            });
        }
        let job = Job::create(
            pool,
            &CreateJob {
                name: seed.name.to_string(),
                description: Some(seed.description.to_string()),
                client_id: clients[seed.client].id,
                materials: Some(seed.materials.to_string()),
                requirements,
            },
        )
        .await?;
        jobs.push(job);
    }
    summary.jobs = jobs.len();

    let monday = week_start(today);
    let mut first_for_john = None;
    let mut conn = pool.acquire().await?;
    for (job, tradie, offset, period) in ALLOCATIONS {
        let date = monday + Days::new(*offset);
        let trade_person_id = tradies[*tradie].1.id;
        if Allocation::find_by_slot(&mut *conn, trade_person_id, date, *period)
            .await?
            .is_some()
        {
            continue;
        }
        let allocation =
            Allocation::insert(&mut *conn, jobs[*job].id, trade_person_id, date, *period).await?;
        if *tradie == 0 && first_for_john.is_none() {
            first_for_john = Some(allocation.id);
        }
        summary.allocations += 1;
    }
    drop(conn);

    if let Some(office) = &office {
        Note::create(
            pool,
            office.id,
            &CreateNote {
                content: "Client requested early start time".to_string(),
                client_id: Some(clients[0].id),
                trade_person_id: None,
                allocation_id: None,
            },
        )
        .await?;
        summary.notes += 1;
    }
    if let Some(allocation_id) = first_for_john {
        Note::create(
            pool,
            tradies[0].0.id,
            &CreateNote {
                content: "Materials delivered on site".to_string(),
                client_id: None,
                trade_person_id: None,
                allocation_id: Some(allocation_id),
            },
        )
        .await?;
        summary.notes += 1;
    }

    info!(
        clients = summary.clients,
        jobs = summary.jobs,
        allocations = summary.allocations,
        notes = summary.notes,
        "Demo data seeded"
    );
    Ok(summary)
}
