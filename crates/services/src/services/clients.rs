use db::models::client::{Client, CreateClient, UpdateClient};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use super::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Client not found")]
    NotFound,
}

pub struct ClientService;

impl ClientService {
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Client>, ClientError> {
        Ok(Client::find_all_active(pool).await?)
    }

    pub async fn create(pool: &SqlitePool, data: &CreateClient) -> Result<Client, ClientError> {
        validation::require_non_empty("name", &data.name)?;
        let client = Client::create(pool, data).await?;
        info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        data: &UpdateClient,
    ) -> Result<Client, ClientError> {
        if let Some(name) = &data.name {
            validation::require_non_empty("name", name)?;
        }
        Self::find_live(pool, id).await?;
        let client = Client::update(pool, id, data).await?;
        info!(client_id = %id, "Client updated");
        Ok(client)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<Client, ClientError> {
        Self::find_live(pool, id).await?;
        let client = Client::soft_delete(pool, id).await?;
        info!(client_id = %id, "Client soft-deleted");
        Ok(client)
    }

    async fn find_live(pool: &SqlitePool, id: i64) -> Result<Client, ClientError> {
        Client::find_active_by_id(pool, id)
            .await?
            .ok_or(ClientError::NotFound)
    }
}
