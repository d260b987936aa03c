//! HTTP API Client
//!
//! Functions for the Wayfarer REST backend. Response decoding and endpoint
//! paths come from the core crate so the browser and the CLI agree on them.

use gloo_net::http::{Request, RequestBuilder, Response};
use serde::Serialize;

use wayfarer::api::endpoints::{self, DEFAULT_API_URL, DEFAULT_WS_URL};
use wayfarer::api::{decode, decode_ack, decode_list, error_message, ApiError, ApiResult};
use wayfarer::catalog::{City, CityDetail};
use wayfarer::chat::{RoomId, WireMessage};
use wayfarer::map::{Incident, NewIncident};
use wayfarer::profile::{GeocodeResult, ProfileUpdate, UserProfile};
use wayfarer::rating::RatingSubmission;
use wayfarer::session::Session;

const API_URL_KEY: &str = "wayfarer_api_url";
const WS_URL_KEY: &str = "wayfarer_ws_url";

const GEOCODER_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Map widget key, baked in at build time
pub const MAP_API_KEY: Option<&str> = option_env!("WAYFARER_MAP_API_KEY");

/// Place search token, baked in at build time
pub const GEOCODER_TOKEN: Option<&str> = option_env!("WAYFARER_GEOCODER_TOKEN");

fn stored(key: &str) -> Option<String> {
    web_sys::window()?
        .local_storage()
        .ok()??
        .get_item(key)
        .ok()?
        .filter(|value| !value.trim().is_empty())
}

/// REST base URL from local storage, else the default
pub fn api_base() -> String {
    stored(API_URL_KEY)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Chat WebSocket URL from local storage, else the default
pub fn ws_url() -> String {
    stored(WS_URL_KEY).unwrap_or_else(|| DEFAULT_WS_URL.to_string())
}

fn url(path: &str) -> String {
    endpoints::url(&api_base(), path)
}

fn authorize(request: RequestBuilder, session: &Session) -> RequestBuilder {
    match session.authorization_header() {
        Some(header) => request.header("Authorization", &header),
        None => request,
    }
}

fn network(err: gloo_net::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

async fn read(response: Response) -> ApiResult<serde_json::Value> {
    if !response.ok() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: response.status(),
            message: error_message(&text),
        });
    }
    response
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

async fn get(path: &str, session: &Session) -> ApiResult<serde_json::Value> {
    let response = authorize(Request::get(&url(path)), session)
        .send()
        .await
        .map_err(network)?;
    read(response).await
}

async fn send_json<B: Serialize>(
    request: RequestBuilder,
    body: &B,
    session: &Session,
) -> ApiResult<()> {
    let response = authorize(request, session)
        .json(body)
        .map_err(network)?
        .send()
        .await
        .map_err(network)?;
    decode_ack(read(response).await?)
}

pub async fn fetch_cities(session: &Session) -> ApiResult<Vec<City>> {
    decode_list(get(&endpoints::cities(), session).await?)
}

pub async fn fetch_city(slug: &str, session: &Session) -> ApiResult<CityDetail> {
    decode(get(&endpoints::city(slug), session).await?)
}

pub async fn submit_rating(submission: &RatingSubmission, session: &Session) -> ApiResult<()> {
    send_json(
        Request::post(&url(&endpoints::city_ratings(&submission.city_id))),
        &submission.payload,
        session,
    )
    .await
}

pub async fn fetch_incidents(session: &Session) -> ApiResult<Vec<Incident>> {
    decode_list(get(&endpoints::incidents(), session).await?)
}

pub async fn create_incident(incident: &NewIncident, session: &Session) -> ApiResult<()> {
    send_json(Request::post(&url(&endpoints::incidents())), incident, session).await
}

pub async fn fetch_profile(user_id: &str, session: &Session) -> ApiResult<UserProfile> {
    decode(get(&endpoints::user(user_id), session).await?)
}

pub async fn update_profile(
    user_id: &str,
    update: &ProfileUpdate,
    session: &Session,
) -> ApiResult<()> {
    send_json(Request::put(&url(&endpoints::user(user_id))), update, session).await
}

pub async fn fetch_chat_history(room: &RoomId, session: &Session) -> ApiResult<Vec<WireMessage>> {
    decode_list(get(&endpoints::chat_history(room.as_str()), session).await?)
}

/// Place search; the result is empty when no token is configured
pub async fn search_places(query: &str) -> ApiResult<GeocodeResult> {
    let Some(token) = GEOCODER_TOKEN else {
        return Ok(GeocodeResult::default());
    };
    let query = query.trim();
    if query.is_empty() {
        return Ok(GeocodeResult::default());
    }

    let response = Request::get(&geocoder_url(query, token))
        .send()
        .await
        .map_err(network)?;
    if !response.ok() {
        return Err(ApiError::Status {
            status: response.status(),
            message: "Place search failed".to_string(),
        });
    }
    response
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn geocoder_url(query: &str, token: &str) -> String {
    format!(
        "{}/{}.json?types=place,locality&limit=5&access_token={}",
        GEOCODER_URL,
        String::from(js_sys::encode_uri_component(query)),
        String::from(js_sys::encode_uri_component(token))
    )
}
