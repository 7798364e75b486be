pub mod allocation;
pub mod client;
pub mod job;
pub mod note;
pub mod trade_person;
pub mod trade_role;
pub mod user;
