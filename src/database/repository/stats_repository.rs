//! Stats repository.

use anyhow::Result;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;

use crate::database::{BotStats, Database};

#[derive(Clone)]
pub struct StatsRepo {
    collection: Collection<BotStats>,
}

impl StatsRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("stats"),
        }
    }

    pub async fn save(&self, stats: &BotStats) -> Result<()> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "_id": BotStats::GLOBAL_ID }, stats)
            .with_options(options)
            .await?;
        Ok(())
    }

    /// Counters persisted by the previous run, if any.
    pub async fn load(&self) -> Result<Option<BotStats>> {
        Ok(self
            .collection
            .find_one(doc! { "_id": BotStats::GLOBAL_ID })
            .await?)
    }
}
