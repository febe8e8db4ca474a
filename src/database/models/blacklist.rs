//! Blacklisted users and words.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlacklistKind {
    User,
    Word,
}

/// One document in the `blacklist` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlacklistEntry {
    pub kind: BlacklistKind,
    /// User id as decimal string, or the lowercased word.
    pub value: String,
    pub added_by: u64,
    pub added_at: i64,
}

/// In-memory view checked on every message.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    users: HashSet<u64>,
    words: BTreeSet<String>,
}

impl Blacklist {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a BlacklistEntry>) -> Self {
        let mut blacklist = Self::default();
        for entry in entries {
            match entry.kind {
                BlacklistKind::User => {
                    if let Ok(id) = entry.value.parse() {
                        blacklist.users.insert(id);
                    }
                }
                BlacklistKind::Word => {
                    blacklist.add_word(&entry.value);
                }
            }
        }
        blacklist
    }

    pub fn is_user_blacklisted(&self, user_id: u64) -> bool {
        self.users.contains(&user_id)
    }

    /// First blacklisted word contained in `text`, case-insensitive.
    pub fn find_word(&self, text: &str) -> Option<&str> {
        if self.words.is_empty() {
            return None;
        }
        let text = text.to_lowercase();
        self.words
            .iter()
            .find(|word| text.contains(word.as_str()))
            .map(String::as_str)
    }

    /// Exact (normalized) membership, unlike the substring search of `find_word`.
    pub fn has_word(&self, word: &str) -> bool {
        self.words.contains(&normalize_word(word))
    }

    pub fn add_user(&mut self, user_id: u64) -> bool {
        self.users.insert(user_id)
    }

    pub fn remove_user(&mut self, user_id: u64) -> bool {
        self.users.remove(&user_id)
    }

    pub fn add_word(&mut self, word: &str) -> bool {
        self.words.insert(normalize_word(word))
    }

    pub fn remove_word(&mut self, word: &str) -> bool {
        self.words.remove(&normalize_word(word))
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: BlacklistKind, value: &str) -> BlacklistEntry {
        BlacklistEntry {
            kind,
            value: value.to_string(),
            added_by: 1,
            added_at: 0,
        }
    }

    #[test]
    fn test_from_entries_splits_kinds() {
        let entries = vec![
            entry(BlacklistKind::User, "42"),
            entry(BlacklistKind::User, "not-a-number"),
            entry(BlacklistKind::Word, "Spam"),
        ];
        let blacklist = Blacklist::from_entries(&entries);

        assert!(blacklist.is_user_blacklisted(42));
        assert_eq!(blacklist.user_count(), 1);
        assert_eq!(blacklist.word_count(), 1);
    }

    #[test]
    fn test_word_match_ignores_case() {
        let mut blacklist = Blacklist::default();
        blacklist.add_word("  CaSiNo ");

        assert_eq!(blacklist.find_word("Best CASINO bonus"), Some("casino"));
        assert_eq!(blacklist.find_word("hello there"), None);
    }

    #[test]
    fn test_add_and_remove_report_changes() {
        let mut blacklist = Blacklist::default();

        assert!(blacklist.add_user(5));
        assert!(!blacklist.add_user(5));
        assert!(blacklist.remove_user(5));
        assert!(!blacklist.remove_user(5));

        assert!(blacklist.add_word("scam"));
        assert!(blacklist.has_word(" Scam"));
        assert!(!blacklist.has_word("sca"));
        assert!(blacklist.remove_word("SCAM"));
        assert_eq!(blacklist.find_word("scam"), None);
    }
}
