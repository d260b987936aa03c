//! Chat Message Model
//!
//! Wire shape of a chat message (shared by live frames and history), the
//! immutable display model built from it, and the small formatting helpers the
//! views need.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{flexible_id, optional_flexible_id};

/// Server clock value, in whichever shape the transport provides
///
/// The backend has emitted epoch milliseconds, ISO-8601 strings and
/// `[seconds, nanos]` pairs over time; all three are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Parts(Vec<i64>),
    Text(String),
}

impl ServerTimestamp {
    /// Resolve to an instant, `None` if the value is unusable
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ServerTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            ServerTimestamp::FractionalMillis(ms) if ms.is_finite() => {
                DateTime::from_timestamp_millis(ms.floor() as i64)
            }
            ServerTimestamp::FractionalMillis(_) => None,
            ServerTimestamp::Parts(parts) => {
                let seconds = *parts.first()?;
                let nanos = parts.get(1).copied().unwrap_or(0);
                DateTime::from_timestamp_millis(
                    seconds.checked_mul(1000)?.checked_add(nanos / 1_000_000)?,
                )
            }
            ServerTimestamp::Text(text) => parse_text_timestamp(text),
        }
    }
}

fn parse_text_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // Zone-less timestamps are server time, which is UTC
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A chat message as the backend sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(deserialize_with = "flexible_id")]
    pub message_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<ServerTimestamp>,
    #[serde(
        default,
        deserialize_with = "optional_flexible_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub city_id: Option<String>,
}

/// A received chat message, ready for display
///
/// Immutable once built. `is_own` is derived from the identity the message
/// was received under and never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_own: bool,
}

impl ChatMessage {
    /// Build the display model for `current_user_id`
    pub fn from_wire(wire: WireMessage, current_user_id: &str) -> Self {
        let is_own = !wire.user_id.is_empty() && wire.user_id == current_user_id;
        Self {
            timestamp: wire.timestamp.as_ref().and_then(ServerTimestamp::to_datetime),
            id: wire.message_id,
            author_id: wire.user_id,
            author_name: wire.user_name,
            body: wire.message,
            is_own,
        }
    }

    /// "You" for own messages, otherwise the author's name
    pub fn display_author(&self) -> &str {
        if self.is_own {
            "You"
        } else {
            &self.author_name
        }
    }

    /// Local clock time (`3:07 PM`), empty when the timestamp was unusable
    pub fn clock_time(&self) -> String {
        self.clock_time_in(&chrono::Local)
    }

    /// Clock time in an explicit zone
    pub fn clock_time_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.timestamp
            .map(|ts| format_clock(&ts, tz))
            .unwrap_or_default()
    }

    /// Avatar for this message's author
    pub fn avatar(&self) -> Avatar {
        let seed = [self.author_id.as_str(), self.author_name.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("guest");
        avatar(seed, &self.author_name)
    }
}

/// Format an instant as 12-hour clock time in `tz`
pub fn format_clock<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format("%-I:%M %p").to_string()
}

/// Deterministic avatar: two-letter initials over a two-hue gradient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub initials: String,
    pub hues: (u16, u16),
}

impl Avatar {
    /// CSS background for the avatar bubble
    pub fn css_gradient(&self) -> String {
        format!(
            "linear-gradient(135deg, hsl({}, 70%, 60%), hsl({}, 70%, 60%))",
            self.hues.0, self.hues.1
        )
    }
}

/// Build an avatar; `seed` picks the colours, `name` the initials
pub fn avatar(seed: &str, name: &str) -> Avatar {
    let hash = string_hash(seed) as i64;
    let hue = |offset: i64| ((hash + offset * 111) % 360).unsigned_abs() as u16;

    Avatar {
        initials: initials(name),
        hues: (hue(0), hue(1)),
    }
}

/// First letters of the first two words, upper-cased
pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

// 31-multiplier hash over UTF-16 units, same values the web client produced
fn string_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}
