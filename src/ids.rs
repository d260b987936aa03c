//! Backend identifier helpers
//!
//! The backend is inconsistent about id types: cities and incidents come back
//! with numeric ids from some endpoints and UUID strings from others, and chat
//! message ids are either. Everything on the client side treats ids as opaque
//! strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Integer(n) => n.to_string(),
            RawId::Float(f) => {
                if f.fract() == 0.0 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }
        }
    }
}

/// Deserialize a string or numeric id into a `String`
pub fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RawId::into_string)
}

/// Same as [`flexible_id`] for optional fields
pub fn optional_flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(RawId::into_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "flexible_id")]
        id: String,
        #[serde(default, deserialize_with = "optional_flexible_id")]
        parent: Option<String>,
    }

    #[test]
    fn test_numeric_and_text_ids() {
        let row: Row = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(row.id, "42");
        assert_eq!(row.parent, None);

        let row: Row = serde_json::from_str(r#"{"id": "c-7", "parent": 3}"#).unwrap();
        assert_eq!(row.id, "c-7");
        assert_eq!(row.parent.as_deref(), Some("3"));
    }

    #[test]
    fn test_whole_float_id_has_no_fraction() {
        let row: Row = serde_json::from_str(r#"{"id": 12.0}"#).unwrap();
        assert_eq!(row.id, "12");
    }
}
