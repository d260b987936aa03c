//! Incident records and report drafts

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::catalog::Searchable;
use crate::chat::ServerTimestamp;
use crate::ids::flexible_id;

/// Errors from validating an incident report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftError {
    #[error("Incident type is required")]
    MissingKind,

    #[error("{field} is not a number: {value:?}")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Reportable incident types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IncidentKind {
    PowerCut,
    TrafficJam,
    SafetyIssue,
    Other,
}

impl IncidentKind {
    pub const ALL: [IncidentKind; 4] = [
        IncidentKind::PowerCut,
        IncidentKind::TrafficJam,
        IncidentKind::SafetyIssue,
        IncidentKind::Other,
    ];

    /// Wire value
    pub fn id(&self) -> &'static str {
        match self {
            IncidentKind::PowerCut => "power_cut",
            IncidentKind::TrafficJam => "traffic_jam",
            IncidentKind::SafetyIssue => "safety_issue",
            IncidentKind::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncidentKind::PowerCut => "Power Cut",
            IncidentKind::TrafficJam => "Traffic Jam",
            IncidentKind::SafetyIssue => "Safety Issue",
            IncidentKind::Other => "Other",
        }
    }

    /// Parse a wire value; unknown values are `None`
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(id.trim()))
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for IncidentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

// Types added on the backend after this client shipped render as "Other"
impl<'de> Deserialize<'de> for IncidentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_id(&raw).unwrap_or(IncidentKind::Other))
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Validated coordinate
    pub fn new(lat: f64, lng: f64) -> Result<Self, DraftError> {
        check_range("latitude", lat, 90.0)?;
        check_range("longitude", lng, 180.0)?;
        Ok(Self { lat, lng })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.lat, self.lng).is_ok()
    }
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), DraftError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(DraftError::OutOfRange { field, value })
    }
}

/// A reported incident
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    #[serde(deserialize_with = "flexible_id")]
    pub incident_id: String,
    #[serde(alias = "type")]
    pub incident_type: IncidentKind,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub reported_at: Option<ServerTimestamp>,
}

impl Incident {
    pub fn position(&self) -> Coordinate {
        Coordinate {
            lat: self.latitude,
            lng: self.longitude,
        }
    }

    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        self.reported_at.as_ref().and_then(ServerTimestamp::to_datetime)
    }
}

impl Searchable for Incident {
    fn name(&self) -> &str {
        self.incident_type.label()
    }

    fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    fn category(&self) -> &str {
        self.incident_type.id()
    }
}

/// Body of `POST /api/incidents`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: IncidentKind,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The report form's in-progress state
///
/// Coordinates are kept as the text the form shows so that hand edits can be
/// validated the same way as map clicks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentDraft {
    pub kind: Option<IncidentKind>,
    pub description: String,
    pub latitude: String,
    pub longitude: String,
}

impl IncidentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft staged from a map double-click, coordinates to 8 decimals
    pub fn at(position: Coordinate) -> Self {
        Self {
            latitude: format!("{:.8}", position.lat),
            longitude: format!("{:.8}", position.lng),
            ..Self::default()
        }
    }

    /// Move the staged position, keeping type and description
    pub fn relocate(&mut self, position: Coordinate) {
        self.latitude = format!("{:.8}", position.lat);
        self.longitude = format!("{:.8}", position.lng);
    }

    /// Check every field and build the request body
    pub fn validate(&self, user_id: impl Into<String>) -> Result<NewIncident, DraftError> {
        let kind = self.kind.ok_or(DraftError::MissingKind)?;
        let lat = parse_coordinate("latitude", &self.latitude)?;
        let lng = parse_coordinate("longitude", &self.longitude)?;
        let position = Coordinate::new(lat, lng)?;

        Ok(NewIncident {
            user_id: user_id.into(),
            kind,
            description: self.description.trim().to_string(),
            latitude: position.lat,
            longitude: position.lng,
        })
    }
}

fn parse_coordinate(field: &'static str, text: &str) -> Result<f64, DraftError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| DraftError::InvalidCoordinate {
            field,
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_click_stages_eight_decimals() {
        let draft = IncidentDraft::at(Coordinate {
            lat: 6.927079,
            lng: 79.861244,
        });
        assert_eq!(draft.latitude, "6.92707900");
        assert_eq!(draft.longitude, "79.86124400");
        assert_eq!(draft.kind, None);
    }

    #[test]
    fn test_validate_requires_kind() {
        let draft = IncidentDraft::at(Coordinate { lat: 1.0, lng: 2.0 });
        assert_eq!(draft.validate("u"), Err(DraftError::MissingKind));
    }

    #[test]
    fn test_validate_rejects_bad_coordinates() {
        let mut draft = IncidentDraft {
            kind: Some(IncidentKind::PowerCut),
            latitude: "abc".to_string(),
            longitude: "79.8".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            draft.validate("u"),
            Err(DraftError::InvalidCoordinate { field: "latitude", .. })
        ));

        draft.latitude = "91".to_string();
        assert!(matches!(
            draft.validate("u"),
            Err(DraftError::OutOfRange { field: "latitude", .. })
        ));

        draft.latitude = "6.9".to_string();
        draft.longitude = "NaN".to_string();
        assert!(matches!(
            draft.validate("u"),
            Err(DraftError::OutOfRange { field: "longitude", .. })
        ));
    }

    #[test]
    fn test_validated_body() {
        let mut draft = IncidentDraft::at(Coordinate {
            lat: 6.9271,
            lng: 79.8612,
        });
        draft.kind = Some(IncidentKind::TrafficJam);
        draft.description = "  Gridlock at Galle Rd  ".to_string();

        let body = draft.validate("3f0c31a8").unwrap();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "traffic_jam");
        assert_eq!(json["userId"], "3f0c31a8");
        assert_eq!(json["description"], "Gridlock at Galle Rd");
        assert_eq!(json["latitude"], 6.9271);
    }

    #[test]
    fn test_incident_record() {
        let incident: Incident = serde_json::from_str(
            r#"{"incidentId": 41, "incidentType": "safety_issue", "description": null,
                "latitude": 6.9, "longitude": 79.8, "reportedAt": "2024-05-01T10:00:00"}"#,
        )
        .unwrap();

        assert_eq!(incident.incident_id, "41");
        assert_eq!(incident.incident_type, IncidentKind::SafetyIssue);
        assert_eq!(Searchable::description(&incident), "");
        assert!(incident.reported_at().is_some());
    }

    #[test]
    fn test_unknown_kind_is_other() {
        let incident: Incident = serde_json::from_str(
            r#"{"incidentId": "x", "type": "flood", "latitude": 0, "longitude": 0}"#,
        )
        .unwrap();
        assert_eq!(incident.incident_type, IncidentKind::Other);
    }
}
