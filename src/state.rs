use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::storage::{MediaStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage =
            Arc::new(MediaStorage::new(&config.media_root).await?) as Arc<dyn StorageClient>;

        Ok(Self {
            db,
            config,
            storage,
        })
    }
}
