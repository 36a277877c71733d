use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::{
    config::AppConfig,
    random::{RandomSource, ThreadRandom},
    tmdb::{MetadataService, TmdbClient},
    users::{PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn MetadataService>,
    pub random: Arc<dyn RandomSource>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        let store = PgUserStore::new(db);
        store.migrate().await?;

        let catalog = TmdbClient::new(&config.tmdb).context("build tmdb client")?;
        info!(provider = catalog.name(), "metadata service ready");

        Ok(Self {
            users: Arc::new(store),
            catalog: Arc::new(catalog),
            random: Arc::new(ThreadRandom),
            config,
        })
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn MetadataService>,
        random: Arc<dyn RandomSource>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            catalog,
            random,
            config,
        }
    }
}
