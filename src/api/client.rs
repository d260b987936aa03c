//! Backend REST Client
//!
//! reqwest client for the city, incident, profile and chat history endpoints.
//! Attaches the session's bearer token when there is one; anonymous calls go
//! out without an `Authorization` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::endpoints;
use super::error::{ApiError, ApiResult};
use super::{decode, decode_ack, decode_list, error_message};
use crate::catalog::{City, CityDetail};
use crate::chat::{ChatError, ChatResult, HistorySource, RoomId, WireMessage};
use crate::map::{Incident, NewIncident};
use crate::profile::{ProfileUpdate, UserProfile};
use crate::rating::RatingSubmission;
use crate::session::Session;

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL (e.g., "http://localhost:8080")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: endpoints::DEFAULT_API_URL.to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// REST client bound to one session
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiClientConfig,
    session: Session,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig, session: Session) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        endpoints::url(&self.config.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.authorization_header() {
            Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
            None => request,
        }
    }

    /// Send and return the JSON body of a successful response
    async fn send(&self, request: RequestBuilder) -> ApiResult<serde_json::Value> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else if e.is_connect() {
                ApiError::Unavailable
            } else {
                ApiError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.send(self.client.get(self.url(path))).await?;
        decode(body)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let body = self.send(self.client.get(self.url(path))).await?;
        decode_list(body)
    }

    async fn post_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let body = self
            .send(self.client.post(self.url(path)).json(body))
            .await?;
        decode_ack(body)
    }

    async fn put_ack<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let body = self.send(self.client.put(self.url(path)).json(body)).await?;
        decode_ack(body)
    }

    /// Ranked cities
    pub async fn list_cities(&self) -> ApiResult<Vec<City>> {
        let cities: Vec<City> = self.get_list(&endpoints::cities()).await?;
        tracing::debug!(count = cities.len(), "Fetched cities");
        Ok(cities)
    }

    /// City detail by slug
    pub async fn get_city(&self, slug: &str) -> ApiResult<CityDetail> {
        self.get(&endpoints::city(slug)).await
    }

    pub async fn submit_rating(&self, submission: &RatingSubmission) -> ApiResult<()> {
        self.post_ack(
            &endpoints::city_ratings(&submission.city_id),
            &submission.payload,
        )
        .await?;
        tracing::info!(city_id = %submission.city_id, "Rating submitted");
        Ok(())
    }

    pub async fn list_incidents(&self) -> ApiResult<Vec<Incident>> {
        self.get_list(&endpoints::incidents()).await
    }

    pub async fn create_incident(&self, incident: &NewIncident) -> ApiResult<()> {
        self.post_ack(&endpoints::incidents(), incident).await?;
        tracing::info!(kind = %incident.kind.id(), "Incident reported");
        Ok(())
    }

    pub async fn get_profile(&self, user_id: &str) -> ApiResult<UserProfile> {
        self.get(&endpoints::user(user_id)).await
    }

    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> ApiResult<()> {
        self.put_ack(&endpoints::user(user_id), update).await
    }

    /// Stored messages for a chat room, oldest first
    pub async fn chat_history(&self, room: &RoomId) -> ApiResult<Vec<WireMessage>> {
        self.get_list(&endpoints::chat_history(room.as_str())).await
    }
}

#[async_trait]
impl HistorySource for ApiClient {
    async fn history(&self, room: &RoomId) -> ChatResult<Vec<WireMessage>> {
        self.chat_history(room)
            .await
            .map_err(|e| ChatError::History(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::{RatingCategory, RatingDraft};
    use crate::session::SessionUser;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: String, session: Session) -> ApiClient {
        ApiClient::new(
            ApiClientConfig {
                base_url,
                request_timeout_ms: 2_000,
            },
            session,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_cities_sends_bearer() {
        let seen = Arc::new(Mutex::new(None::<String>));
        let captured = seen.clone();
        let app = Router::new().route(
            "/api/cities",
            get(move |headers: HeaderMap| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    Json(json!({"success": true, "data": [
                        {"cityId": 1, "name": "Kandy", "rankPosition": 2},
                        {"cityId": 2, "name": "Galle", "rankPosition": 1}
                    ]}))
                }
            }),
        );
        let base = serve(app).await;

        let session = Session::new(Some("tok".to_string()), SessionUser::default());
        let cities = client(base, session).list_cities().await.unwrap();

        assert_eq!(cities.len(), 2);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn test_anonymous_calls_have_no_auth_header() {
        let app = Router::new().route(
            "/api/incidents",
            get(|headers: HeaderMap| async move {
                assert!(headers.get("authorization").is_none());
                Json(json!({"success": true, "data": []}))
            }),
        );
        let base = serve(app).await;

        let incidents = client(base, Session::anonymous()).list_incidents().await.unwrap();
        assert!(incidents.is_empty());
    }

    #[tokio::test]
    async fn test_city_by_slug() {
        let app = Router::new().route(
            "/api/cities/:slug",
            get(|Path(slug): Path<String>| async move {
                Json(json!({"success": true, "data": {"cityId": 9, "name": slug, "population": 1200}}))
            }),
        );
        let base = serve(app).await;

        let detail = client(base, Session::anonymous())
            .get_city("nuwara eliya")
            .await
            .unwrap();
        assert_eq!(detail.city.name, "nuwara eliya");
        assert_eq!(detail.population, 1200);
    }

    #[tokio::test]
    async fn test_submit_rating_body() {
        let body = Arc::new(Mutex::new(Value::Null));
        let captured = body.clone();
        let app = Router::new().route(
            "/api/cities/:id/ratings",
            post(move |Json(payload): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = payload;
                    Json(json!({"success": true}))
                }
            }),
        );
        let base = serve(app).await;

        let mut draft = RatingDraft::new();
        draft.set_value(RatingCategory::Safety, 5).unwrap();
        let submission = draft.prepare(Some("12"), "u-1").unwrap();
        client(base, Session::anonymous())
            .submit_rating(&submission)
            .await
            .unwrap();

        let sent = body.lock().unwrap().clone();
        assert_eq!(sent["userId"], "u-1");
        assert_eq!(sent["ratings"]["safety"], 5);
        assert_eq!(sent["ratings"]["nightlife"], 3);
        assert!(sent.get("reviewText").is_none());
    }

    #[tokio::test]
    async fn test_error_status_carries_message() {
        let app = Router::new().route(
            "/api/users/:id",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"success": false, "message": "Not your profile"})),
                )
            }),
        );
        let base = serve(app).await;

        let err = client(base, Session::anonymous())
            .get_profile("someone")
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Not your profile");
            }
            other => panic!("Expected Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}", addr), Session::anonymous())
            .list_cities()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unavailable));
    }

    #[tokio::test]
    async fn test_history_source() {
        let app = Router::new().route(
            "/api/chat/history/city/:id",
            get(|| async {
                Json(json!({"success": true, "data": [
                    {"messageId": 1, "userId": "a", "userName": "A", "message": "first"},
                    {"messageId": 2, "userId": "b", "userName": "B", "message": "second"}
                ]}))
            }),
        );
        let base = serve(app).await;

        let api = client(base, Session::anonymous());
        let history = api.history(&RoomId::new("12").unwrap()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].message_id, "2");
    }
}
