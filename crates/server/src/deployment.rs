use std::sync::Arc;

use db::DBService;
use services::services::auth::AuthService;

use crate::config::ServerConfig;

/// Shared state handed to every route: the database, token issuer and settings.
#[derive(Clone)]
pub struct DeploymentImpl {
    db: DBService,
    auth: AuthService,
    config: Arc<ServerConfig>,
}

impl DeploymentImpl {
    pub fn new(db: DBService, config: ServerConfig) -> Self {
        let auth = AuthService::new(
            &config.jwt_secret,
            config.jwt_expiry_hours,
            config.bcrypt_cost,
        );
        Self {
            db,
            auth,
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
