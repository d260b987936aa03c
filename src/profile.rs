//! User Profile
//!
//! Home location and mobile number, read from and written to
//! `/api/users/{userId}`. Updates are staged and validated here; the backend
//! only ever sees complete bodies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::map::Coordinate;
use crate::session::Session;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Sign in to update your profile")]
    Unauthenticated,

    #[error("Mobile number is required")]
    MissingMobile,

    #[error("No location selected")]
    MissingLocation,

    #[error("Place search result has no coordinates")]
    NoCoordinates,

    #[error("Location is out of range: {0}")]
    InvalidLocation(String),
}

/// Profile as returned by `GET /api/users/{userId}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub city_latitude: Option<f64>,
    #[serde(default)]
    pub city_longitude: Option<f64>,
    #[serde(default)]
    pub mobile_number: Option<String>,
}

impl UserProfile {
    /// Saved home location, if complete
    pub fn location(&self) -> Option<SelectedLocation> {
        Some(SelectedLocation {
            name: self.city_name.clone().unwrap_or_default(),
            position: Coordinate {
                lat: self.city_latitude?,
                lng: self.city_longitude?,
            },
        })
    }

    pub fn mobile_number(&self) -> Option<&str> {
        self.mobile_number
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// One feature from the place-search widget's result
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeFeature {
    #[serde(default)]
    pub place_name: Option<String>,
    pub geometry: GeocodeGeometry,
}

/// GeoJSON point geometry, `[longitude, latitude]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeGeometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Place search response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

/// A location the user picked
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedLocation {
    pub name: String,
    pub position: Coordinate,
}

impl SelectedLocation {
    /// From the first feature of a place search
    pub fn from_geocoder(result: &GeocodeResult) -> Result<Self, ProfileError> {
        let feature = result.features.first().ok_or(ProfileError::MissingLocation)?;
        Self::from_feature(feature)
    }

    pub fn from_feature(feature: &GeocodeFeature) -> Result<Self, ProfileError> {
        let (lng, lat) = match feature.geometry.coordinates.as_slice() {
            [lng, lat, ..] => (*lng, *lat),
            _ => return Err(ProfileError::NoCoordinates),
        };
        let position =
            Coordinate::new(lat, lng).map_err(|e| ProfileError::InvalidLocation(e.to_string()))?;

        Ok(Self {
            name: feature.place_name.clone().unwrap_or_default(),
            position,
        })
    }

    /// Place name, or `Location (lat, lng)` when the search returned none
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!(
                "Location ({:.4}, {:.4})",
                self.position.lat, self.position.lng
            )
        } else {
            name.to_string()
        }
    }
}

/// Body of `PUT /api/users/{userId}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProfileUpdate {
    #[serde(rename_all = "camelCase")]
    Location {
        city_name: String,
        city_latitude: f64,
        city_longitude: f64,
    },
    #[serde(rename_all = "camelCase")]
    Mobile { mobile_number: String },
}

impl ProfileUpdate {
    pub fn location(selected: Option<&SelectedLocation>) -> Result<Self, ProfileError> {
        let selected = selected.ok_or(ProfileError::MissingLocation)?;
        Ok(ProfileUpdate::Location {
            city_name: selected.display_name(),
            city_latitude: selected.position.lat,
            city_longitude: selected.position.lng,
        })
    }

    pub fn mobile(number: &str) -> Result<Self, ProfileError> {
        let number = number.trim();
        if number.is_empty() {
            return Err(ProfileError::MissingMobile);
        }
        Ok(ProfileUpdate::Mobile {
            mobile_number: number.to_string(),
        })
    }
}

/// User id for profile calls; profile writes need a signed-in session
pub fn profile_owner(session: &Session) -> Result<String, ProfileError> {
    if !session.is_authenticated() {
        return Err(ProfileError::Unauthenticated);
    }
    session.subject().ok_or(ProfileError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(json: &str) -> GeocodeResult {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_feature_coordinates_are_lng_lat() {
        let picked = SelectedLocation::from_geocoder(&result(
            r#"{"features": [{"place_name": "Kandy, Sri Lanka",
                "geometry": {"type": "Point", "coordinates": [80.6337, 7.2906]}}]}"#,
        ))
        .unwrap();

        assert_eq!(picked.position.lat, 7.2906);
        assert_eq!(picked.position.lng, 80.6337);
        assert_eq!(picked.display_name(), "Kandy, Sri Lanka");
    }

    #[test]
    fn test_blank_name_falls_back_to_coordinates() {
        let picked = SelectedLocation {
            name: "  ".to_string(),
            position: Coordinate {
                lat: 6.927079,
                lng: 79.861244,
            },
        };
        assert_eq!(picked.display_name(), "Location (6.9271, 79.8612)");

        let body = serde_json::to_value(ProfileUpdate::location(Some(&picked)).unwrap()).unwrap();
        assert_eq!(body["cityName"], "Location (6.9271, 79.8612)");
        assert_eq!(body["cityLatitude"], 6.927079);
    }

    #[test]
    fn test_missing_geometry() {
        let empty = result(r#"{"features": []}"#);
        assert_eq!(
            SelectedLocation::from_geocoder(&empty),
            Err(ProfileError::MissingLocation)
        );

        let no_coords = result(r#"{"features": [{"geometry": {"coordinates": [1.0]}}]}"#);
        assert_eq!(
            SelectedLocation::from_geocoder(&no_coords),
            Err(ProfileError::NoCoordinates)
        );
    }

    #[test]
    fn test_mobile_number_required() {
        assert_eq!(ProfileUpdate::mobile("  "), Err(ProfileError::MissingMobile));

        let body = serde_json::to_value(ProfileUpdate::mobile(" +94 77 123 4567 ").unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"mobileNumber": "+94 77 123 4567"}));
    }

    #[test]
    fn test_profile_read() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"cityName": "Galle", "cityLatitude": 6.03, "cityLongitude": 80.21, "mobileNumber": ""}"#,
        )
        .unwrap();
        assert_eq!(profile.location().unwrap().name, "Galle");
        assert_eq!(profile.mobile_number(), None);

        assert_eq!(UserProfile::default().location(), None);
    }

    #[test]
    fn test_profile_requires_sign_in() {
        assert_eq!(
            profile_owner(&Session::anonymous()),
            Err(ProfileError::Unauthenticated)
        );
    }
}
