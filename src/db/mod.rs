use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};
use std::time::Duration;

use crate::{config::Config, errors::AppResult};

/// Handle on the engine's Mongo database. Cloning shares the client pool.
#[derive(Clone)]
pub struct Database {
    inner: mongodb::Database,
}

/// Client options for the configured deployment: stable API v1, pool bounds
/// and one timeout for connecting and server selection.
pub async fn client_options(config: &Config) -> AppResult<ClientOptions> {
    let mut options = ClientOptions::parse(&config.mongo_conn_string).await?;
    let timeout = Duration::from_secs(config.mongo_timeout_secs);

    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.app_name = Some("exam-prep-engine".to_string());
    options.max_pool_size = Some(config.mongo_max_pool_size);
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);

    Ok(options)
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::with_options(client_options(config).await?)?;
        let db = Self {
            inner: client.database(&config.mongo_db_name),
        };
        db.health_check().await?;

        log::info!("Connected to MongoDB database '{}'", db.db_name());
        Ok(db)
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.inner.collection(collection_name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.inner.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    pub fn db_name(&self) -> &str {
        self.inner.name()
    }
}
