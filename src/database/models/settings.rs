//! Per-user preferences edited from the /settings menu.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "🌞 Light",
            Self::Dark => "🌑 Dark",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSettings {
    pub user_id: u64,

    #[serde(default = "default_true")]
    pub notifications: bool,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub privacy: bool,

    #[serde(default)]
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl UserSettings {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            notifications: true,
            theme: Theme::default(),
            privacy: false,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_missing_fields_take_defaults() {
        let doc = bson::doc! { "user_id": 7_i64 };
        let settings: UserSettings = bson::from_document(doc).unwrap();

        assert!(settings.notifications);
        assert_eq!(settings.theme, Theme::Light);
        assert!(!settings.privacy);
    }

    #[test]
    fn test_theme_is_stored_lowercase() {
        let mut settings = UserSettings::new(7);
        settings.theme = Theme::Dark;
        let doc = bson::to_document(&settings).unwrap();

        assert_eq!(doc.get_str("theme").unwrap(), "dark");
    }
}
