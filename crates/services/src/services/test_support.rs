use db::{
    DBService,
    models::{
        client::{Client, CreateClient},
        job::{CreateJob, Job, RequirementInput},
        trade_person::TradePerson,
        trade_role::TradeRole,
        user::{User, UserRole},
    },
};
use secrecy::SecretString;
use sqlx::SqlitePool;

use super::auth::{AuthService, AuthUser};

pub fn test_auth() -> AuthService {
    AuthService::new(&SecretString::from("test-secret".to_string()), 8, 4)
}

pub fn caller(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

pub struct TestContext {
    pub pool: SqlitePool,
    pub auth: AuthService,
}

impl TestContext {
    pub const PASSWORD: &'static str = "password123";

    pub async fn new() -> Self {
        let db = DBService::new_in_memory().await.unwrap();
        Self {
            pool: db.pool,
            auth: test_auth(),
        }
    }

    pub async fn user(&self, email: &str, name: &str, role: UserRole) -> User {
        let hash = self.auth.hash_password(Self::PASSWORD).await.unwrap();
        User::create(&self.pool, email, name, role, &hash).await.unwrap()
    }

    pub async fn role(&self, name: &str) -> TradeRole {
        TradeRole::upsert(&self.pool, name).await.unwrap()
    }

    pub async fn tradie(&self, email: &str, name: &str, roles: &[&TradeRole]) -> (User, TradePerson) {
        let user = self.user(email, name, UserRole::TradePerson).await;
        let ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
        let trade_person = TradePerson::create(&self.pool, user.id, &ids).await.unwrap();
        (user, trade_person)
    }

    pub async fn client(&self, name: &str) -> Client {
        Client::create(
            &self.pool,
            &CreateClient {
                name: name.to_string(),
                contact: None,
                phone: None,
            },
        )
        .await
        .unwrap()
    }

    pub async fn job(&self, client: &Client, requirements: &[(&TradeRole, i64)]) -> Job {
        Job::create(
            &self.pool,
            &CreateJob {
                name: format!("Job for {}", client.name),
                description: None,
                client_id: client.id,
                materials: None,
                requirements: requirements
                    .iter()
                    .map(|(role, slots)| RequirementInput {
                        trade_role_id: role.id,
                        required_slots: *slots,
                    })
                    .collect(),
            },
        )
        .await
        .unwrap()
    }
}
