//! Turns one legacy XML element into a typed record. Missing attributes
//! fall back to the defaults the bot always assumed; only a missing identity
//! or a garbled number makes an element unusable.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use roxmltree::Node;

use crate::db::{GodpackRecord, GpState, UserRecord, UserStatus};

const UNKNOWN: &str = "Unknown";
const DEFAULT_PACK_NUMBER: i32 = 1;
const UNRATED: i32 = -1;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Why an element was left out of the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingDiscordId,
    MissingMessageId,
    InvalidAttribute { attribute: &'static str, value: String },
    AlreadyPresent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingDiscordId => f.write_str("missing or zero discord id"),
            SkipReason::MissingMessageId => f.write_str("missing or zero message id"),
            SkipReason::InvalidAttribute { attribute, value } => {
                write!(f, "attribute {attribute}={value:?} is not an integer")
            }
            SkipReason::AlreadyPresent => f.write_str("already present in the database"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: SkipReason,
}

impl SkippedRecord {
    pub fn new(key: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            key: key.into(),
            reason,
        }
    }
}

/// Identifies an element in diagnostics: its identity attribute when present,
/// otherwise its tag and byte offset.
pub fn record_key(node: Node<'_, '_>, attribute: &str) -> String {
    node.attribute(attribute)
        .map(str::to_string)
        .unwrap_or_else(|| format!("<{}> at byte {}", node.tag_name().name(), node.range().start))
}

// Zero was the exporters' placeholder for "no id", so it never identifies anything.
fn identity(node: Node<'_, '_>, attribute: &str) -> Option<i64> {
    node.attribute(attribute)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id != 0)
}

fn int_attribute(
    node: Node<'_, '_>,
    attribute: &'static str,
    default: i32,
) -> Result<i32, SkipReason> {
    match node.attribute(attribute) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| SkipReason::InvalidAttribute {
            attribute,
            value: raw.to_string(),
        }),
    }
}

fn text_attribute(node: Node<'_, '_>, attribute: &str, default: &str) -> String {
    node.attribute(attribute).unwrap_or(default).to_string()
}

/// Accepts the ISO-8601 shapes the bot has written over time: with or
/// without `T`, seconds, fractions, or a UTC offset, and bare dates.
/// Offsets are dropped after reading the wall-clock time they qualify.
pub fn parse_legacy_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(text, format).ok())
    {
        return Some(dt.naive_local());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn map_user(node: Node<'_, '_>) -> Result<UserRecord, SkipReason> {
    let discord_id = identity(node, "id").ok_or(SkipReason::MissingDiscordId)?;

    Ok(UserRecord {
        discord_id,
        player_id: node.attribute("playerId").map(str::to_string),
        display_name: text_attribute(node, "displayName", UNKNOWN),
        prefix: node.attribute("prefix").map(str::to_string),
        status: text_attribute(node, "status", UserStatus::default().as_str()),
    })
}

/// `now` stands in for a missing or unreadable timestamp.
pub fn map_godpack(node: Node<'_, '_>, now: NaiveDateTime) -> Result<GodpackRecord, SkipReason> {
    let message_id = identity(node, "messageId").ok_or(SkipReason::MissingMessageId)?;

    Ok(GodpackRecord {
        message_id,
        timestamp: node
            .attribute("timestamp")
            .and_then(parse_legacy_timestamp)
            .unwrap_or(now),
        pack_number: int_attribute(node, "packNumber", DEFAULT_PACK_NUMBER)?,
        name: text_attribute(node, "name", UNKNOWN),
        friend_code: text_attribute(node, "friendCode", UNKNOWN),
        state: node
            .attribute("state")
            .map(GpState::lookup)
            .unwrap_or_default(),
        screenshot_url: text_attribute(node, "screenshotUrl", ""),
        ratio: int_attribute(node, "ratio", UNRATED)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use roxmltree::Document;
    use test_case::test_case;

    use super::{SkipReason, map_godpack, map_user, parse_legacy_timestamp, record_key};
    use crate::db::GpState;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 14)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn fallback() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test_case("2025-02-14T18:30:05" => Some(at(18, 30, 5)) ; "iso seconds")]
    #[test_case("2025-02-14T18:30" => Some(at(18, 30, 0)) ; "minutes only")]
    #[test_case("2025-02-14T18:30:05+02:00" => Some(at(18, 30, 5)) ; "offset keeps wall clock")]
    #[test_case("2025-02-14 18:30:05+00:00" => Some(at(18, 30, 5)) ; "space with offset")]
    #[test_case("2025-02-14" => Some(at(0, 0, 0)) ; "bare date")]
    #[test_case(" 2025-02-14T18:30:05 " => Some(at(18, 30, 5)) ; "surrounding whitespace")]
    #[test_case("14/02/2025" => None ; "day first")]
    #[test_case("yesterday" => None ; "prose")]
    #[test_case("" => None ; "empty")]
    fn parses_legacy_timestamps(text: &str) -> Option<NaiveDateTime> {
        parse_legacy_timestamp(text)
    }

    #[test]
    fn keeps_fractional_seconds() {
        let parsed = parse_legacy_timestamp("2025-02-14 18:30:05.123456").unwrap();
        assert_eq!(parsed, at(18, 30, 5) + chrono::Duration::microseconds(123_456));
    }

    #[test]
    fn user_defaults_fill_missing_attributes() {
        let document = Document::parse(r#"<Users><user id="123"/></Users>"#).unwrap();
        let user = map_user(document.root_element().first_element_child().unwrap()).unwrap();

        assert_eq!(user.discord_id, 123);
        assert_eq!(user.display_name, "Unknown");
        assert_eq!(user.status, "inactive");
        assert_eq!(user.player_id, None);
        assert_eq!(user.prefix, None);
    }

    #[test_case(r#"<user/>"# ; "absent")]
    #[test_case(r#"<user id="0"/>"# ; "zero")]
    #[test_case(r#"<user id="abc"/>"# ; "not a number")]
    fn user_without_identity_is_skipped(xml: &str) {
        let document = Document::parse(xml).unwrap();
        assert_eq!(
            map_user(document.root_element()),
            Err(SkipReason::MissingDiscordId)
        );
    }

    #[test]
    fn godpack_attributes_are_mapped() {
        let xml = r#"<godpack messageId="1300000000000000001" timestamp="2025-02-14T18:30:05"
            packNumber="3" name="Celebi" friendCode="1234-5678-9012-3456" state="alive"
            screenshotUrl="https://cdn.example/gp.png" ratio="4"/>"#;
        let document = Document::parse(xml).unwrap();
        let godpack = map_godpack(document.root_element(), fallback()).unwrap();

        assert_eq!(godpack.message_id, 1_300_000_000_000_000_001);
        assert_eq!(godpack.timestamp, at(18, 30, 5));
        assert_eq!(godpack.pack_number, 3);
        assert_eq!(godpack.name, "Celebi");
        assert_eq!(godpack.friend_code, "1234-5678-9012-3456");
        assert_eq!(godpack.state, GpState::Alive);
        assert_eq!(godpack.screenshot_url, "https://cdn.example/gp.png");
        assert_eq!(godpack.ratio, 4);
    }

    #[test]
    fn godpack_defaults_and_fallbacks() {
        let document =
            Document::parse(r#"<gp messageId="77" timestamp="not a date" state="bogus_value"/>"#)
                .unwrap();
        let godpack = map_godpack(document.root_element(), fallback()).unwrap();

        assert_eq!(godpack.timestamp, fallback());
        assert_eq!(godpack.pack_number, 1);
        assert_eq!(godpack.name, "Unknown");
        assert_eq!(godpack.friend_code, "Unknown");
        assert_eq!(godpack.state, GpState::Testing);
        assert_eq!(godpack.screenshot_url, "");
        assert_eq!(godpack.ratio, -1);
    }

    #[test]
    fn godpack_without_message_id_is_skipped() {
        let document = Document::parse(r#"<pack messageId="0" name="Mew"/>"#).unwrap();
        assert_eq!(
            map_godpack(document.root_element(), fallback()),
            Err(SkipReason::MissingMessageId)
        );
    }

    #[test]
    fn garbled_number_skips_the_element() {
        let document = Document::parse(r#"<pack messageId="5" ratio="high"/>"#).unwrap();
        assert_eq!(
            map_godpack(document.root_element(), fallback()),
            Err(SkipReason::InvalidAttribute {
                attribute: "ratio",
                value: "high".to_string(),
            })
        );
    }

    #[test]
    fn record_key_falls_back_to_position() {
        let document = Document::parse(r#"<root><gp name="x"/><gp messageId="8"/></root>"#).unwrap();
        let keys: Vec<String> = document
            .root_element()
            .children()
            .map(|node| record_key(node, "messageId"))
            .collect();
        assert_eq!(keys, vec!["<gp> at byte 6".to_string(), "8".to_string()]);
    }
}
