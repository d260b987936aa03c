//! Pages
//!
//! Top-level page components for each route.

pub mod cities;
pub mod city_detail;
pub mod incident_map;
pub mod profile;

pub use cities::Cities;
pub use city_detail::CityDetailPage;
pub use incident_map::IncidentMap;
pub use profile::Profile;
