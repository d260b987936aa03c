//! Backend REST API
//!
//! Every endpoint wraps its payload in an envelope:
//!
//! ```json
//! {"success": true, "data": ..., "message": "optional"}
//! ```
//!
//! # Endpoints
//!
//! - `GET /api/cities` - List ranked cities
//! - `GET /api/cities/:slug` - City detail
//! - `POST /api/cities/:cityId/ratings` - Submit a rating
//! - `GET /api/incidents` - List incidents
//! - `POST /api/incidents` - Report an incident
//! - `GET /api/users/:userId` - Read profile
//! - `PUT /api/users/:userId` - Update location or mobile number
//! - `GET /api/chat/history/city/:cityId` - Chat history for a room
//!
//! Decoding lives here and is shared with the browser client; the reqwest
//! client is native only.

pub mod endpoints;
mod error;

#[cfg(feature = "native")]
mod client;

pub use error::{ApiError, ApiResult};

#[cfg(feature = "native")]
pub use client::{ApiClient, ApiClientConfig};

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Standard response wrapper
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// The payload, or why there is none
    pub fn into_result(self) -> ApiResult<T> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Request failed".to_string()),
            ));
        }
        self.data.ok_or(ApiError::MissingData)
    }

    /// Success flag only, for writes whose payload is not used
    pub fn into_ack(self) -> ApiResult<()> {
        if self.success {
            Ok(())
        } else {
            self.into_result().map(|_| ())
        }
    }
}

/// Decode an enveloped payload
pub fn decode<T: DeserializeOwned>(body: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value::<Envelope<T>>(body)?.into_result()
}

/// Decode an enveloped list; a bare JSON array is accepted too
pub fn decode_list<T: DeserializeOwned>(body: serde_json::Value) -> ApiResult<Vec<T>> {
    match body {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(body)?),
        other => decode(other),
    }
}

/// Decode a write acknowledgment
pub fn decode_ack(body: serde_json::Value) -> ApiResult<()> {
    serde_json::from_value::<Envelope<serde_json::Value>>(body)?.into_ack()
}

/// Error text carried by a failed response body, if any
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Fall back to the empty state after a failed call
///
/// Returns the default value and the message for the inline banner. Pages use
/// this so that no REST failure ever leaves a view without content.
pub fn recover<T: Default>(result: ApiResult<T>, context: &str) -> (T, Option<String>) {
    match result {
        Ok(value) => (value, None),
        Err(e) => {
            tracing::warn!(context = %context, error = %e, "Request failed, showing empty state");
            (T::default(), Some(e.user_message()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::City;
    use serde_json::json;

    #[test]
    fn test_decode_envelope() {
        let cities: Vec<City> = decode_list(json!({
            "success": true,
            "data": [{"cityId": 1, "name": "Kandy"}]
        }))
        .unwrap();
        assert_eq!(cities[0].name, "Kandy");
    }

    #[test]
    fn test_decode_bare_list() {
        let cities: Vec<City> = decode_list(json!([{"id": 2, "name": "Galle"}])).unwrap();
        assert_eq!(cities[0].id, "2");
    }

    #[test]
    fn test_rejected_envelope() {
        let err = decode::<City>(json!({"success": false, "message": "City not found"})).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "City not found"));

        let err = decode::<City>(json!({"success": false})).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Request failed"));
    }

    #[test]
    fn test_missing_data() {
        let err = decode::<City>(json!({"success": true})).unwrap_err();
        assert!(matches!(err, ApiError::MissingData));
        assert!(decode_ack(json!({"success": true})).is_ok());
        assert!(decode_ack(json!({"success": false, "message": "no"})).is_err());
    }

    #[test]
    fn test_missing_data_for_detail_payloads() {
        use crate::catalog::CityDetail;
        use crate::profile::UserProfile;

        let envelope: Envelope<CityDetail> = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(envelope.data.is_none());
        assert!(matches!(envelope.into_result(), Err(ApiError::MissingData)));

        let err = decode::<UserProfile>(json!({"success": true, "data": null})).unwrap_err();
        assert!(matches!(err, ApiError::MissingData));
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(error_message(r#"{"success":false,"message":"Bad token"}"#), "Bad token");
        assert_eq!(error_message(" plain text "), "plain text");
    }

    #[test]
    fn test_recover_yields_default() {
        let (cities, banner): (Vec<City>, _) = recover(Err(ApiError::Unavailable), "cities");
        assert!(cities.is_empty());
        assert!(banner.is_some());

        let (value, banner) = recover(Ok(vec![1, 2]), "numbers");
        assert_eq!(value, vec![1, 2]);
        assert_eq!(banner, None);
    }
}
