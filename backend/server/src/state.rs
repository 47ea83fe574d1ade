use std::sync::Arc;

use tracing::warn;

use super::{
    config::{Config, StoreKind},
    database::MySqlStore,
    store::{MemoryStore, SchoolStore},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn SchoolStore>,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, sqlx::Error> {
        let store: Arc<dyn SchoolStore> = match config.store {
            StoreKind::MySql => Arc::new(MySqlStore::connect(&config.mysql).await?),
            StoreKind::Memory => {
                warn!("Using the in-memory store, nothing will be persisted");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn SchoolStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
