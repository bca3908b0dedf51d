mod mongo_store;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use store::UserStore;

use mongodb::error::ErrorKind;
use mongodb::{bson::doc, options::ClientOptions, Client, Collection, Database};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::models::USERS_COLLECTION;
use crate::utils::AppError;

const DEFAULT_DATABASE: &str = "mtec";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
    /// Set once the unique index and the id counter are in place.
    prepared: Arc<OnceCell<()>>,
}

impl MongoDB {
    /// Builds the pooled client. Only an unparseable URI is fatal; an
    /// unreachable server is logged and the driver keeps retrying lazily.
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);
        let mongodb = Self {
            db,
            prepared: Arc::new(OnceCell::new()),
        };

        match mongodb.db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                log::info!("✅ MongoDB connected successfully (database: {})", db_name);
                if let Err(e) = mongodb.prepare().await {
                    log::error!("❌ Database preparation failed, will retry on first write: {}", e);
                }
            }
            Err(e) => log::error!("❌ DB connection error: {}", e),
        }

        Ok(mongodb)
    }

    /// Creates the `userId` index and syncs the id counter, once. A failed
    /// attempt leaves the cell empty so the next write tries again.
    async fn prepare(&self) -> Result<(), AppError> {
        self.prepared
            .get_or_try_init(|| async {
                self.ensure_indexes().await?;
                self.sync_user_counter().await
            })
            .await
            .map(|_| ())
    }

    /// Creates the unique `userId` index; duplicate inserts then fail with code 11000.
    /// A server-side refusal (e.g. existing duplicates) is logged and not retried.
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let users = self.collection::<mongodb::bson::Document>(USERS_COLLECTION);
        let user_id_index = IndexModel::builder()
            .keys(doc! { "userId": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(user_id_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(userId) unique"),
            Err(e) if matches!(e.kind.as_ref(), ErrorKind::Command(_)) => {
                log::warn!("   ⚠️  Could not create users(userId) index: {}", e)
            }
            Err(e) => return Err(AppError::Database(e)),
        }
        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
