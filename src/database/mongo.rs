//! MongoDB database wrapper.

use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::info;

/// Database wrapper for MongoDB operations.
#[derive(Debug, Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connect to MongoDB and verify the connection with a ping.
    pub async fn connect(uri: &str, db_name: &str) -> anyhow::Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        Ok(Self {
            db: client.database(db_name),
        })
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Create the unique indexes the repositories rely on for upserts.
    pub async fn ensure_indexes(&self) -> anyhow::Result<()> {
        let indexes = [
            ("users", doc! { "user_id": 1 }),
            ("groups", doc! { "chat_id": 1 }),
            ("settings", doc! { "user_id": 1 }),
            ("blacklist", doc! { "kind": 1, "value": 1 }),
        ];

        for (collection, keys) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection::<Document>(collection)
                .create_index(model)
                .await?;
        }

        info!("MongoDB indexes ensured");
        Ok(())
    }
}
