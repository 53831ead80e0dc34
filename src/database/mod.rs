use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StorageBackend;

pub mod memory;
pub mod models;
pub mod queries;
pub mod store;

pub use store::{ChatStore, ContentStore, StoreError, StoreResult, UserStore};

const MAX_CONNECT_RETRIES: u32 = 10;

/// Store handles shared by every service, created once at startup
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub chats: Arc<dyn ChatStore>,
    pub contents: Arc<dyn ContentStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let relational = Arc::new(memory::MemoryRelationalStore::default());
        Self {
            users: relational.clone(),
            chats: relational,
            contents: Arc::new(memory::MemoryContentStore::default()),
        }
    }
}

/// Owns the connections behind [`Stores`] for the lifetime of the process
pub struct Database {
    stores: Stores,
    pools: Vec<PgPool>,
}

impl Database {
    pub async fn connect(backend: &StorageBackend) -> Result<Self, sqlx::Error> {
        match backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory stores, data will not persist");
                Ok(Self {
                    stores: Stores::in_memory(),
                    pools: Vec::new(),
                })
            }
            StorageBackend::Postgres {
                database_url,
                document_database_url,
            } => {
                let relational = connect_with_retry(database_url).await?;
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&relational).await?;

                let documents = connect_with_retry(document_database_url).await?;
                queries::contents::ensure_schema(&documents).await?;

                let users = Arc::new(queries::users::PgUserStore::new(relational.clone()));
                let chats = Arc::new(queries::chats::PgChatStore::new(relational.clone()));
                let contents = Arc::new(queries::contents::PgContentStore::new(documents.clone()));

                Ok(Self {
                    stores: Stores {
                        users,
                        chats,
                        contents,
                    },
                    pools: vec![relational, documents],
                })
            }
        }
    }

    pub fn stores(&self) -> Stores {
        self.stores.clone()
    }

    /// Close every pool; called once during shutdown
    pub async fn close(&self) {
        for pool in &self.pools {
            pool.close().await;
        }
        tracing::info!("Database connections closed");
    }
}

async fn connect_with_retry(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool_options = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(300));

    let mut attempt = 0;
    loop {
        attempt += 1;
        tracing::debug!("Connection attempt {} of {}", attempt, MAX_CONNECT_RETRIES);

        let result = match pool_options.clone().connect(database_url).await {
            Ok(pool) => sqlx::query("SELECT 1").execute(&pool).await.map(|_| pool),
            Err(e) => Err(e),
        };

        match result {
            Ok(pool) => {
                tracing::info!("Connected to database on attempt {}", attempt);
                return Ok(pool);
            }
            Err(e) if attempt >= MAX_CONNECT_RETRIES => {
                tracing::error!(
                    "Failed to connect to database after {} attempts: {}",
                    MAX_CONNECT_RETRIES,
                    e
                );
                return Err(e);
            }
            Err(e) => {
                // Exponential backoff, capped at ~6.4 seconds
                let delay = Duration::from_millis(100 * (1 << (attempt - 1).min(6)));
                tracing::warn!(
                    "Connection attempt {} failed: {}, retrying in {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
