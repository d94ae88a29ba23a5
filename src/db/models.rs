use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a godpack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GpState {
    #[default]
    Testing,
    Alive,
    Dead,
    Invalid,
    Expired,
}

impl GpState {
    pub const ALL: [GpState; 5] = [
        GpState::Testing,
        GpState::Alive,
        GpState::Dead,
        GpState::Invalid,
        GpState::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GpState::Testing => "TESTING",
            GpState::Alive => "ALIVE",
            GpState::Dead => "DEAD",
            GpState::Invalid => "INVALID",
            GpState::Expired => "EXPIRED",
        }
    }

    /// Total lookup of legacy state text. Anything unrecognised is `Testing`.
    pub fn lookup(text: &str) -> Self {
        let wanted = text.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == wanted)
            .unwrap_or_default()
    }
}

impl fmt::Display for GpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account state of a user in the reroll group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    #[default]
    Inactive,
    Farm,
    Leech,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Farm => "farm",
            UserStatus::Leech => "leech",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            "farm" => Some(UserStatus::Farm),
            "leech" => Some(UserStatus::Leech),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub discord_id: i64,
    pub player_id: Option<String>,
    pub display_name: String,
    pub prefix: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GodpackRecord {
    pub message_id: i64,
    pub timestamp: NaiveDateTime,
    pub pack_number: i32,
    pub name: String,
    pub friend_code: String,
    pub state: GpState,
    pub screenshot_url: String,
    pub ratio: i32,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{GpState, UserStatus};

    #[test_case("ALIVE" => GpState::Alive ; "exact tag")]
    #[test_case("dead" => GpState::Dead ; "lower case")]
    #[test_case("Invalid" => GpState::Invalid ; "mixed case")]
    #[test_case("expired" => GpState::Expired ; "expired")]
    #[test_case("testing" => GpState::Testing ; "default tag")]
    #[test_case("bogus_value" => GpState::Testing ; "unknown falls back")]
    #[test_case("" => GpState::Testing ; "empty falls back")]
    fn gp_state_lookup_is_total(text: &str) -> GpState {
        GpState::lookup(text)
    }

    #[test]
    fn gp_state_text_round_trips() {
        for state in GpState::ALL {
            assert_eq!(GpState::lookup(state.as_str()), state);
        }
    }

    #[test]
    fn user_status_parse_rejects_unknown() {
        assert_eq!(UserStatus::parse("FARM"), Some(UserStatus::Farm));
        assert_eq!(UserStatus::parse("retired"), None);
        assert_eq!(UserStatus::default(), UserStatus::Inactive);
    }
}
