//! Login, bearer tokens and the identity attached to authenticated requests.

use chrono::{Duration, Utc};
use db::models::user::{User, UserRole, UserSummary};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use ts_rs::TS;
use utils::password::{self, MIN_PASSWORD_LENGTH, PasswordError};

use super::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("token encoding failed: {0}")]
    TokenEncoding(jsonwebtoken::errors::Error),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("User not found")]
    UserNotFound,
}

/// Claims carried by issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Identity of the caller, decoded from a verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Issues and verifies HS256 tokens and owns the bcrypt cost used for new hashes.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(secret: &SecretString, token_ttl_hours: i64, bcrypt_cost: u32) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl: Duration::hours(token_ttl_hours),
            bcrypt_cost,
        }
    }

    pub async fn hash_password(&self, plain: &str) -> Result<String, PasswordError> {
        password::hash_password(plain, self.bcrypt_cost).await
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::TokenEncoding)
    }

    pub fn verify_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                AuthError::InvalidToken
            })?;
        let id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            id,
            email: data.claims.email,
            role: data.claims.role,
        })
    }

    /// Unknown, deleted and wrong-password logins all fail the same way.
    pub async fn login(
        &self,
        pool: &SqlitePool,
        request: &LoginRequest,
    ) -> Result<LoginResponse, AuthError> {
        validation::require_email(&request.email)?;
        validation::require_min_len("password", &request.password, MIN_PASSWORD_LENGTH)?;

        let user = User::find_active_by_email(pool, &request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !password::verify_password(&request.password, &user.password_hash).await? {
            debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginResponse {
            token,
            user: user.summary(),
        })
    }

    /// The caller's current profile; fails if the account was deleted after the token was issued.
    pub async fn me(pool: &SqlitePool, user_id: i64) -> Result<UserSummary, AuthError> {
        match User::find_by_id(pool, user_id).await? {
            Some(user) if !user.is_deleted() => Ok(user.summary()),
            _ => Err(AuthError::UserNotFound),
        }
    }
}
