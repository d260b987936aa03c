//! City Chat
//!
//! Real-time chat room per city over a single WebSocket endpoint.
//!
//! ## Architecture
//!
//! - **Machine**: pure connection state machine emitting [`ChatAction`]s
//! - **Log**: arrival-ordered, id-unique message list
//! - **Protocol**: `join` / `message` frames with a `data` envelope
//! - **Manager** (native): tokio task executing the machine's actions
//!
//! ## Data Flow
//!
//! 1. `open` moves to `Connecting` and asks the driver for a transport
//! 2. Transport ready: the join frame goes out, state becomes `Connected`
//! 3. Inbound frames become [`ChatMessage`]s, appended if their id is new
//! 4. Transport loss: `Disconnected`, one reconnect after a fixed delay
//! 5. `close` cancels the timer and releases the transport

mod error;
mod log;
mod machine;
mod message;
mod protocol;

#[cfg(feature = "native")]
mod manager;
#[cfg(feature = "native")]
mod transport;

pub use error::{ChatError, ChatResult};
pub use log::MessageLog;
pub use machine::{
    ChatAction, ChatMachine, ConnectionState, ReconnectPolicy, RoomId, DEFAULT_RECONNECT_DELAY,
};
pub use message::{avatar, format_clock, initials, Avatar, ChatMessage, ServerTimestamp, WireMessage};
pub use protocol::{InboundFrame, JoinPayload, MessagePayload, OutboundFrame};

#[cfg(feature = "native")]
pub use manager::ChatConnectionManager;
#[cfg(feature = "native")]
pub use transport::{Connector, HistorySource, Link, TransportEvent, WsConnector};
