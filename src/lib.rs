//! # Wayfarer
//!
//! Client core for a travel and relocation companion: city rankings and
//! ratings, a community chat room per city, and an incident-reporting map.
//! Ranking, rating aggregation, persistence and chat fan-out all live in the
//! backend; this crate owns what the client has to get right on its own.
//!
//! ## Features
//!
//! - **Reconnecting chat**: a pure state machine for join/send/receive with a
//!   fixed-delay reconnect, driven by tokio here and by the browser in
//!   `wayfarer-ui`
//! - **De-duplicated history**: live and historical messages share one
//!   id-keyed log
//! - **Listing controllers**: filter-then-sort over fetched cities and incidents
//! - **Form staging**: rating payloads, incident drafts and profile updates are
//!   validated before any request goes out
//!
//! ## Modules
//!
//! - [`chat`]: chat state machine, message log and (native) runtime
//! - [`catalog`]: city records and the list/filter/sort controllers
//! - [`rating`]: rating categories, scores and submission payloads
//! - [`map`]: incident records, drafts and marker placement
//! - [`profile`]: user profile reads and location/mobile updates
//! - [`session`]: bearer credential and user identity
//! - [`api`]: REST envelope and (native) HTTP client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wayfarer::api::ApiClient;
//! use wayfarer::chat::{ChatConnectionManager, ReconnectPolicy, RoomId, WsConnector};
//! use wayfarer::config::Config;
//! use wayfarer::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let session = Session::anonymous();
//!     let api = ApiClient::new(config.api.client_config(), session.clone())?;
//!
//!     let manager = ChatConnectionManager::new(
//!         WsConnector::new(&config.chat.ws_url),
//!         ReconnectPolicy::fixed(config.chat.reconnect_delay()),
//!     );
//!     manager.open_with_history(RoomId::new("colombo")?, session.chat_user(), api)?;
//!     manager.connected().await?;
//!     manager.send("Any good kottu near Galle Face?")?;
//!
//!     manager.close();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod chat;
pub mod ids;
pub mod map;
pub mod profile;
pub mod rating;
pub mod session;

#[cfg(feature = "native")]
pub mod config;

pub use catalog::{City, CityDetail, SortKey};
pub use chat::{ChatAction, ChatError, ChatMachine, ChatMessage, ConnectionState, RoomId};
pub use map::{Incident, IncidentDraft, IncidentKind, MarkerSpec};
pub use rating::{RatingCategory, RatingDraft, RatingPayload, Score};
pub use session::{ChatUser, Session};

#[cfg(feature = "native")]
pub use api::{ApiClient, ApiError};

#[cfg(feature = "native")]
pub use chat::{ChatConnectionManager, WsConnector};

#[cfg(feature = "native")]
pub use config::{Config, ConfigError};
