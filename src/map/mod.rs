//! Incident Map
//!
//! Incident records, the report draft staged from a map double-click, and the
//! marker instructions handed to the external map widget.

mod incident;
mod markers;

pub use incident::{Coordinate, DraftError, Incident, IncidentDraft, IncidentKind, NewIncident};
pub use markers::{
    counts_by_kind, format_reported, markers, MarkerIcon, MarkerSpec, Popup, WidgetMarker,
    DEFAULT_CENTER, DEFAULT_ZOOM, MARKER_SIZE,
};
