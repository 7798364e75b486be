//! Write TypeScript declarations for the API payloads.
//!
//! Usage: `generate_types [OUTPUT]` (defaults to `shared/types.ts`).

use std::{fs, path::PathBuf};

use anyhow::Context;
use db::models::{
    allocation::{Allocation, AllocationDetails, CreateAllocation, JobBrief, Period},
    client::{Client, ClientBrief, CreateClient, UpdateClient},
    job::{
        CreateJob, Job, JobRequirement, JobSummary, JobWithAllocations, JobWithDetails,
        RequirementFill, RequirementInput, RequirementWithRole, UpdateJob,
    },
    note::{CreateNote, Note, NoteAuthor, NoteWithDetails},
    trade_person::{
        CreateTradePerson, TradePerson, TradePersonBrief, TradePersonRole,
        TradePersonWithDetails, UpdateTradePerson, UserBrief,
    },
    trade_role::TradeRole,
    user::{CreateUser, UpdateUser, User, UserRole, UserSummary},
};
use services::services::{
    auth::{LoginRequest, LoginResponse},
    notes::NoteQuery,
    schedule::{GridResponse, GridRow, WeekQuery, WeekSchedule},
};
use ts_rs::TS;
use utils::response::ApiResponse;

fn declarations() -> Vec<String> {
    vec![
        ApiResponse::<()>::decl(),
        UserRole::decl(),
        User::decl(),
        UserSummary::decl(),
        CreateUser::decl(),
        UpdateUser::decl(),
        LoginRequest::decl(),
        LoginResponse::decl(),
        Client::decl(),
        ClientBrief::decl(),
        CreateClient::decl(),
        UpdateClient::decl(),
        TradeRole::decl(),
        TradePerson::decl(),
        TradePersonRole::decl(),
        TradePersonWithDetails::decl(),
        UserBrief::decl(),
        TradePersonBrief::decl(),
        CreateTradePerson::decl(),
        UpdateTradePerson::decl(),
        Job::decl(),
        JobRequirement::decl(),
        RequirementWithRole::decl(),
        RequirementFill::decl(),
        JobWithDetails::decl(),
        JobSummary::decl(),
        JobWithAllocations::decl(),
        RequirementInput::decl(),
        CreateJob::decl(),
        UpdateJob::decl(),
        Period::decl(),
        Allocation::decl(),
        JobBrief::decl(),
        AllocationDetails::decl(),
        CreateAllocation::decl(),
        WeekQuery::decl(),
        GridRow::decl(),
        GridResponse::decl(),
        WeekSchedule::decl(),
        Note::decl(),
        NoteAuthor::decl(),
        NoteWithDetails::decl(),
        CreateNote::decl(),
        NoteQuery::decl(),
    ]
}

fn main() -> anyhow::Result<()> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shared/types.ts"));

    let mut contents = String::from(
        "// This file was generated by `generate_types`. Do not edit it by hand.\n\n",
    );
    for decl in declarations() {
        contents.push_str("export ");
        contents.push_str(&decl);
        contents.push_str("\n\n");
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&output, contents).with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote TypeScript types to {}", output.display());
    Ok(())
}
