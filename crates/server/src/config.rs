//! Runtime settings read from the environment.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use utils::password::DEFAULT_COST;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tradiedr.db";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 8;
/// One year.
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let jwt_expiry_hours = match get("JWT_EXPIRY_HOURS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if (1..=MAX_JWT_EXPIRY_HOURS).contains(&hours) => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "JWT_EXPIRY_HOURS",
                        value: raw,
                        reason: "expected between 1 and 8760 hours",
                    });
                }
            },
            None => DEFAULT_JWT_EXPIRY_HOURS,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "BCRYPT_COST",
                        value: raw,
                        reason: "expected a cost between 4 and 31",
                    });
                }
            },
            None => DEFAULT_COST,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            jwt_secret: SecretString::from(
                get("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiry_hours,
            bcrypt_cost,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.expose_secret() == DEFAULT_JWT_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_address(), "127.0.0.1:4000");
        assert_eq!(config.jwt_expiry_hours, 8);
        assert_eq!(config.bcrypt_cost, DEFAULT_COST);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn explicit_values_win() {
        let config = config(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRY_HOURS", "1"),
            ("BCRYPT_COST", "6"),
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.jwt_expiry_hours, 1);
        assert_eq!(config.bcrypt_cost, 6);
        assert!(!config.uses_default_secret());
        // the secret is redacted in debug output
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("JWT_EXPIRY_HOURS", "0")]),
            Err(ConfigError::Invalid { name: "JWT_EXPIRY_HOURS", .. })
        ));
        assert!(matches!(
            config(&[("JWT_EXPIRY_HOURS", "9223372036854775807")]),
            Err(ConfigError::Invalid { name: "JWT_EXPIRY_HOURS", .. })
        ));
        assert!(matches!(
            config(&[("BCRYPT_COST", "99")]),
            Err(ConfigError::Invalid { name: "BCRYPT_COST", .. })
        ));
    }

    #[test]
    fn longest_token_lifetime_is_accepted() {
        let config = config(&[("JWT_EXPIRY_HOURS", "8760")]).unwrap();
        assert_eq!(config.jwt_expiry_hours, MAX_JWT_EXPIRY_HOURS);
        // the deployment builds its token signer from this value
        services::services::auth::AuthService::new(
            &config.jwt_secret,
            config.jwt_expiry_hours,
            config.bcrypt_cost,
        );
    }

    #[test]
    fn blank_values_fall_back() {
        let config = config(&[("PORT", "  "), ("HOST", "")]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:4000");
    }
}
