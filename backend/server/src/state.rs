use std::sync::Arc;

use anyhow::Result;
use sea_orm::DatabaseConnection;

use super::{config::Config, database::init_database};

pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let db = init_database(&config.database_url).await?;

        Ok(Self::with_connection(config, db))
    }

    pub fn with_connection(config: Config, db: DatabaseConnection) -> Arc<Self> {
        Arc::new(Self { config, db })
    }

    pub fn short_link_url(&self, token: &str) -> String {
        format!("{}/s/{token}", self.config.public_url)
    }

    pub fn recipe_url(&self, recipe_id: i32) -> String {
        format!("{}/recipes/{recipe_id}/", self.config.public_url)
    }
}
