//! Blacklist repository.
//!
//! The full blacklist is small and checked on every message, so it lives in
//! memory and every change is written through to MongoDB.

use std::future::Future;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use parking_lot::RwLock;
use tracing::info;

use crate::database::blacklist::normalize_word;
use crate::database::{Blacklist, BlacklistEntry, BlacklistKind, Database};

pub struct BlacklistRepo {
    collection: Collection<BlacklistEntry>,
    current: RwLock<Blacklist>,
}

impl BlacklistRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("blacklist"),
            current: RwLock::new(Blacklist::default()),
        }
    }

    /// Replace the in-memory view with the stored entries.
    pub async fn load(&self) -> Result<()> {
        let entries: Vec<BlacklistEntry> = self.collection.find(doc! {}).await?.try_collect().await?;
        let blacklist = Blacklist::from_entries(&entries);
        info!(
            "Blacklist loaded: {} user(s), {} word(s)",
            blacklist.user_count(),
            blacklist.word_count()
        );
        *self.current.write() = blacklist;
        Ok(())
    }

    pub fn is_user_blacklisted(&self, user_id: u64) -> bool {
        self.current.read().is_user_blacklisted(user_id)
    }

    pub fn find_word(&self, text: &str) -> Option<String> {
        self.current.read().find_word(text).map(str::to_string)
    }

    pub fn counts(&self) -> (usize, usize) {
        let current = self.current.read();
        (current.user_count(), current.word_count())
    }

    /// Returns `false` if the user was already blacklisted.
    pub async fn add_user(&self, user_id: u64, added_by: u64) -> Result<bool> {
        write_through(
            &self.current,
            |current| !current.is_user_blacklisted(user_id),
            self.store(BlacklistKind::User, user_id.to_string(), added_by),
            |current| current.add_user(user_id),
        )
        .await
    }

    pub async fn remove_user(&self, user_id: u64) -> Result<bool> {
        write_through(
            &self.current,
            |current| current.is_user_blacklisted(user_id),
            self.delete(BlacklistKind::User, user_id.to_string()),
            |current| current.remove_user(user_id),
        )
        .await
    }

    pub async fn add_word(&self, word: &str, added_by: u64) -> Result<bool> {
        write_through(
            &self.current,
            |current| !current.has_word(word),
            self.store(BlacklistKind::Word, normalize_word(word), added_by),
            |current| current.add_word(word),
        )
        .await
    }

    pub async fn remove_word(&self, word: &str) -> Result<bool> {
        write_through(
            &self.current,
            |current| current.has_word(word),
            self.delete(BlacklistKind::Word, normalize_word(word)),
            |current| current.remove_word(word),
        )
        .await
    }

    async fn store(&self, kind: BlacklistKind, value: String, added_by: u64) -> Result<()> {
        let entry = BlacklistEntry {
            kind,
            value,
            added_by,
            added_at: chrono::Utc::now().timestamp(),
        };
        let filter = doc! { "kind": kind_str(kind), "value": &entry.value };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, &entry)
            .with_options(options)
            .await?;
        Ok(())
    }

    async fn delete(&self, kind: BlacklistKind, value: String) -> Result<()> {
        self.collection
            .delete_one(doc! { "kind": kind_str(kind), "value": value })
            .await?;
        Ok(())
    }
}

fn kind_str(kind: BlacklistKind) -> &'static str {
    match kind {
        BlacklistKind::User => "user",
        BlacklistKind::Word => "word",
    }
}

/// Apply a change to the in-memory blacklist only after `persist` succeeded.
///
/// Returns `false` without touching MongoDB when `changes` says the entry is
/// already in the requested state. A failed write leaves memory as it was.
async fn write_through<P>(
    current: &RwLock<Blacklist>,
    changes: impl FnOnce(&Blacklist) -> bool,
    persist: P,
    apply: impl FnOnce(&mut Blacklist) -> bool,
) -> Result<bool>
where
    P: Future<Output = Result<()>>,
{
    let changes = changes(&current.read());
    if !changes {
        return Ok(false);
    }
    persist.await?;
    apply(&mut current.write());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use anyhow::anyhow;

    use super::*;

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let current = RwLock::new(Blacklist::default());

        let result = write_through(
            &current,
            |b| !b.is_user_blacklisted(7),
            async { Err(anyhow!("connection reset")) },
            |b| b.add_user(7),
        )
        .await;

        assert!(result.is_err());
        assert!(!current.read().is_user_blacklisted(7));

        // A retry after the outage goes through instead of reporting a duplicate.
        let retried = write_through(
            &current,
            |b| !b.is_user_blacklisted(7),
            async { Ok(()) },
            |b| b.add_user(7),
        )
        .await;
        assert!(retried.unwrap());
        assert!(current.read().is_user_blacklisted(7));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_word() {
        let mut blacklist = Blacklist::default();
        blacklist.add_word("spam");
        let current = RwLock::new(blacklist);

        let result = write_through(
            &current,
            |b| b.has_word("SPAM"),
            async { Err(anyhow!("timeout")) },
            |b| b.remove_word("SPAM"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(current.read().find_word("buy spam"), Some("spam"));
    }

    #[tokio::test]
    async fn test_unchanged_entry_skips_the_write() {
        let mut blacklist = Blacklist::default();
        blacklist.add_user(3);
        let current = RwLock::new(blacklist);
        let persisted = AtomicBool::new(false);

        let changed = write_through(
            &current,
            |b| !b.is_user_blacklisted(3),
            async {
                persisted.store(true, Ordering::SeqCst);
                Ok(())
            },
            |b| b.add_user(3),
        )
        .await
        .unwrap();

        assert!(!changed);
        assert!(!persisted.load(Ordering::SeqCst));
        assert_eq!(current.read().user_count(), 1);
    }
}
