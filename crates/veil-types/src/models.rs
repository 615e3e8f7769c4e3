use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display theme preference. Absence (`None` in `Preferences`) means the
/// user never picked one and the client falls back to its own default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Per-user preference pair, returned by the prefs endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Option<Theme>,
    pub is_anonymous: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: None,
            is_anonymous: true,
        }
    }
}

/// A persisted chat message as served by the history endpoint.
///
/// `timestamp` is the client's cosmetic clock string captured at send time;
/// `created_at` is the server-assigned instant and is what history ordering
/// uses. `is_anonymous` is frozen at send time and never rewritten by later
/// preference changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub group_id: String,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub is_anonymous: bool,
    pub timestamp: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_round_trips_through_str() {
        assert_eq!(Theme::from_str("light"), Some(Theme::Light));
        assert_eq!(Theme::from_str("dark"), Some(Theme::Dark));
        assert_eq!(Theme::from_str("sepia"), None);
        assert_eq!(Theme::Dark.as_str(), "dark");
    }

    #[test]
    fn preferences_default_is_anonymous() {
        let prefs = Preferences::default();
        assert!(prefs.is_anonymous);
        assert!(prefs.theme.is_none());
    }

    #[test]
    fn message_serializes_camel_case() {
        let msg = Message {
            id: Uuid::nil(),
            group_id: "G".into(),
            sender_id: Uuid::nil(),
            sender_name: "Alice".into(),
            content: "hello".into(),
            is_anonymous: true,
            timestamp: "03:45 PM".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["groupId"], "G");
        assert_eq!(json["senderName"], "Alice");
        assert_eq!(json["isAnonymous"], true);
        assert!(json.get("group_id").is_none());
    }
}
