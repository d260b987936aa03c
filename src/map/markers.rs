//! Marker placement
//!
//! Translates fetched incidents into instructions for the map widget. The
//! widget owns rendering, hit-testing and the info window; this module only
//! decides where each marker goes, how it looks and what its popup says.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::incident::{Coordinate, Incident, IncidentKind};

/// Initial viewport: Colombo
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 6.9271,
    lng: 79.8612,
};

pub const DEFAULT_ZOOM: u8 = 12;

/// Rendered marker size in pixels
pub const MARKER_SIZE: u32 = 40;

const PIN_PATH: &str = "M18.364 4.636a9 9 0 0 1 .203 12.519l-.203 .21l-4.243 4.242a3 3 0 0 1 -4.097 .135l-.144 -.135l-4.244 -4.243a9 9 0 0 1 12.728 -12.728zm-6.364 3.364a3 3 0 1 0 0 6a3 3 0 0 0 0 -6z";

/// Marker styling for one incident type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerIcon {
    pub color: &'static str,
    pub glyph: &'static str,
}

impl MarkerIcon {
    pub fn for_kind(kind: IncidentKind) -> Self {
        match kind {
            IncidentKind::PowerCut => MarkerIcon {
                color: "#f59e0b",
                glyph: "⚡",
            },
            IncidentKind::TrafficJam => MarkerIcon {
                color: "#f97316",
                glyph: "🚗",
            },
            IncidentKind::SafetyIssue => MarkerIcon {
                color: "#ef4444",
                glyph: "⚠️",
            },
            IncidentKind::Other => MarkerIcon {
                color: "#6b7280",
                glyph: "📍",
            },
        }
    }

    /// Pin image as a `data:` URL
    pub fn svg_data_url(&self) -> String {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="50" height="50" viewBox="0 0 24 24" fill="{}"><path d="{}"/></svg>"#,
            self.color, PIN_PATH
        );
        format!(
            "data:image/svg+xml;charset=UTF-8,{}",
            urlencoding::encode(&svg)
        )
    }
}

/// Content of the info window bound to a marker
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub kind: IncidentKind,
    pub description: String,
    pub reported_at: Option<DateTime<Utc>>,
}

impl Popup {
    pub fn for_incident(incident: &Incident) -> Self {
        Self {
            title: format!("Incident #{}", incident.incident_id),
            kind: incident.incident_type,
            description: incident.description.clone().unwrap_or_default(),
            reported_at: incident.reported_at(),
        }
    }

    /// HTML for the widget's info window, times in `tz`
    pub fn to_html_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let icon = MarkerIcon::for_kind(self.kind);
        let reported = self
            .reported_at
            .map(|ts| format_reported(&ts, tz))
            .unwrap_or_default();

        format!(
            concat!(
                r#"<div style="max-width: 280px">"#,
                r#"<div style="display:flex;align-items:center;gap:6px;margin-bottom:6px">"#,
                r#"<span style="display:inline-block;width:14px;height:14px;background:{color};border-radius:50%"></span>"#,
                r#"<strong style="font-size:13px">{title}</strong></div>"#,
                r#"<div style="font-size:12px;color:#374151;margin-bottom:6px">{kind}</div>"#,
                r#"<div style="font-size:12px;color:#6b7280;margin-bottom:6px">{description}</div>"#,
                r#"<div style="font-size:11px;color:#6b7280">{reported}</div>"#,
                "</div>"
            ),
            color = icon.color,
            title = escape_html(&self.title),
            kind = self.kind.label(),
            description = escape_html(&self.description),
            reported = reported,
        )
    }
}

/// "5/1/2024 at 3:30:00 PM"
pub fn format_reported<Tz>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz)
        .format("%-m/%-d/%Y at %-I:%M:%S %p")
        .to_string()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Placement instruction for one incident
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// Stable key, the incident id
    pub key: String,
    pub position: Coordinate,
    pub icon: MarkerIcon,
    pub popup: Popup,
}

impl MarkerSpec {
    /// Flattened form handed to the map widget
    pub fn to_widget_in<Tz>(&self, tz: &Tz) -> WidgetMarker
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        WidgetMarker {
            key: self.key.clone(),
            lat: self.position.lat,
            lng: self.position.lng,
            icon_url: self.icon.svg_data_url(),
            size: MARKER_SIZE,
            popup_html: self.popup.to_html_in(tz),
        }
    }

    pub fn to_widget(&self) -> WidgetMarker {
        self.to_widget_in(&chrono::Local)
    }
}

/// Marker as serialized for the JS map bridge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMarker {
    pub key: String,
    pub lat: f64,
    pub lng: f64,
    pub icon_url: String,
    pub size: u32,
    pub popup_html: String,
}

/// One marker per incident with a usable position
pub fn markers(incidents: &[Incident]) -> Vec<MarkerSpec> {
    incidents
        .iter()
        .filter(|incident| {
            let ok = incident.position().is_valid();
            if !ok {
                tracing::warn!(
                    incident_id = %incident.incident_id,
                    lat = incident.latitude,
                    lng = incident.longitude,
                    "Incident skipped, position out of range"
                );
            }
            ok
        })
        .map(|incident| MarkerSpec {
            key: incident.incident_id.clone(),
            position: incident.position(),
            icon: MarkerIcon::for_kind(incident.incident_type),
            popup: Popup::for_incident(incident),
        })
        .collect()
}

/// Incident count per type, every type present
pub fn counts_by_kind(incidents: &[Incident]) -> BTreeMap<IncidentKind, usize> {
    let mut counts: BTreeMap<IncidentKind, usize> =
        IncidentKind::ALL.into_iter().map(|kind| (kind, 0)).collect();
    for incident in incidents {
        *counts.entry(incident.incident_type).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn incident(id: &str, kind: IncidentKind, lat: f64, description: Option<&str>) -> Incident {
        Incident {
            incident_id: id.to_string(),
            incident_type: kind,
            description: description.map(str::to_string),
            latitude: lat,
            longitude: 79.86,
            reported_at: Some(crate::chat::ServerTimestamp::Text(
                "2024-05-01T15:30:00Z".to_string(),
            )),
        }
    }

    #[test]
    fn test_one_marker_per_valid_incident() {
        let incidents = vec![
            incident("1", IncidentKind::PowerCut, 6.9, None),
            incident("2", IncidentKind::Other, 120.0, None),
            incident("3", IncidentKind::TrafficJam, 6.8, Some("Jam")),
        ];
        let specs = markers(&incidents);

        let keys: Vec<_> = specs.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "3"]);
        assert_eq!(specs[1].icon, MarkerIcon::for_kind(IncidentKind::TrafficJam));
        assert_eq!(specs[1].position, Coordinate { lat: 6.8, lng: 79.86 });
    }

    #[test]
    fn test_popup_content() {
        let marker = &markers(&[incident(
            "7",
            IncidentKind::SafetyIssue,
            6.9,
            Some("Broken <b>lights</b>"),
        )])[0];

        let utc = FixedOffset::east_opt(0).unwrap();
        let html = marker.popup.to_html_in(&utc);
        assert!(html.contains("Incident #7"));
        assert!(html.contains("Safety Issue"));
        assert!(html.contains("Broken &lt;b&gt;lights&lt;/b&gt;"));
        assert!(html.contains("5/1/2024 at 3:30:00 PM"));
    }

    #[test]
    fn test_widget_marker_shape() {
        let marker = &markers(&[incident("9", IncidentKind::PowerCut, 6.9, None)])[0];
        let widget = marker.to_widget_in(&FixedOffset::east_opt(0).unwrap());
        let json = serde_json::to_value(&widget).unwrap();

        assert_eq!(json["key"], "9");
        assert_eq!(json["size"], 40);
        assert!(json["iconUrl"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;charset=UTF-8,%3Csvg"));
        assert!(json["popupHtml"].as_str().unwrap().contains("Power Cut"));
    }

    #[test]
    fn test_counts_include_every_kind() {
        let counts = counts_by_kind(&[
            incident("1", IncidentKind::PowerCut, 6.9, None),
            incident("2", IncidentKind::PowerCut, 6.9, None),
            incident("3", IncidentKind::Other, 6.9, None),
        ]);
        assert_eq!(counts[&IncidentKind::PowerCut], 2);
        assert_eq!(counts[&IncidentKind::TrafficJam], 0);
        assert_eq!(counts[&IncidentKind::Other], 1);
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_default_viewport() {
        assert!(DEFAULT_CENTER.is_valid());
        assert_eq!(DEFAULT_ZOOM, 12);
    }
}
