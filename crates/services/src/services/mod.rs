pub mod auth;
pub mod clients;
pub mod jobs;
pub mod notes;
pub mod schedule;
pub mod seed;
pub mod tradies;
pub mod users;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
