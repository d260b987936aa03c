//! Chat connection state machine.
//!
//! [`ChatMachine`] owns everything about one room connection that is not I/O:
//! the connection state, the reconnect timer's existence, the join
//! announcement and the message log. It consumes transport events and user
//! intents and returns [`ChatAction`]s for a driver to execute. The tokio
//! driver in `ChatConnectionManager` and the browser driver in `wayfarer-ui` run the
//! same machine, which keeps the reconnect and cleanup rules testable without a
//! socket.
//!
//! ```text
//!               open()                transport_opened()
//! Disconnected ───────▶ Connecting ─────────────────────▶ Connected
//!      ▲  │                  │  ▲                             │
//!      │  │ transport_lost() │  │ reconnect_elapsed()         │ transport_lost()
//!      │  └──────────────────┘  │                             │
//!      │    (ScheduleReconnect) └──── Disconnected + timer ◀──┘
//!      │
//!      └── close() from any state: cancel timer, close transport, stop
//! ```

use std::fmt;
use std::time::Duration;

use super::error::{ChatError, ChatResult};
use super::log::MessageLog;
use super::message::{ChatMessage, WireMessage};
use super::protocol::{InboundFrame, JoinPayload, MessagePayload, OutboundFrame};
use crate::session::ChatUser;

/// Delay before a reconnect attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Connection status as the UI sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
        }
    }

    /// Whether the input affordance should be enabled
    pub fn can_send(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Chat room identifier (one room per city)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Rejects blank ids
    pub fn new(id: impl Into<String>) -> ChatResult<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyRoom);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reconnect timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl ReconnectPolicy {
    /// Same delay before every attempt, retried until closed
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

/// Side effects requested by the machine
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// Open a transport to the chat endpoint.
    Connect {
        /// 1 for the first attempt, counting up until one succeeds.
        attempt: u32,
    },

    /// Send a frame on the open transport.
    Transmit(OutboundFrame),

    /// Arm the reconnect timer; call `reconnect_elapsed` when it fires.
    ScheduleReconnect(Duration),

    /// Disarm the reconnect timer.
    CancelReconnect,

    /// Release the current transport, if any.
    CloseTransport,

    /// Connection status changed.
    StateChanged(ConnectionState),

    /// The message list changed.
    MessagesChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Open,
    Closed,
}

/// Pure connection state machine for one chat room
#[derive(Debug, Clone)]
pub struct ChatMachine {
    room: RoomId,
    user: ChatUser,
    policy: ReconnectPolicy,
    state: ConnectionState,
    lifecycle: Lifecycle,
    reconnect_pending: bool,
    attempt: u32,
    log: MessageLog,
}

impl ChatMachine {
    pub fn new(room: RoomId, user: ChatUser, policy: ReconnectPolicy) -> Self {
        Self {
            room,
            user,
            policy,
            state: ConnectionState::Disconnected,
            lifecycle: Lifecycle::Idle,
            reconnect_pending: false,
            attempt: 0,
            log: MessageLog::new(),
        }
    }

    /// Start connecting
    ///
    /// Ignored while a connection is being attempted or is open. If a
    /// reconnect is pending it is replaced by an immediate attempt.
    pub fn open(&mut self) -> Vec<ChatAction> {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!(room = %self.room, state = %self.state, "open ignored, already active");
            return vec![];
        }

        self.lifecycle = Lifecycle::Open;
        let mut actions = Vec::new();
        if self.reconnect_pending {
            self.reconnect_pending = false;
            actions.push(ChatAction::CancelReconnect);
        }
        actions.extend(self.begin_connect());
        actions
    }

    /// The transport reported ready: announce presence and go live
    pub fn transport_opened(&mut self) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Open {
            tracing::debug!(room = %self.room, "Transport opened after close, releasing it");
            return vec![ChatAction::CloseTransport];
        }
        if self.state != ConnectionState::Connecting {
            return vec![];
        }

        self.state = ConnectionState::Connected;
        self.attempt = 0;
        tracing::info!(room = %self.room, user = %self.user.id, "Chat connected");

        vec![
            ChatAction::Transmit(OutboundFrame::Join(JoinPayload {
                city_id: self.room.to_string(),
                user_id: self.user.id.clone(),
                user_name: self.user.name.clone(),
            })),
            ChatAction::StateChanged(ConnectionState::Connected),
        ]
    }

    /// The transport closed, errored, or could not be opened
    ///
    /// Schedules exactly one reconnect no matter how many loss events the
    /// transport reports for the same failure (an error is usually followed
    /// by a close).
    pub fn transport_lost(&mut self, reason: &str) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Open || self.reconnect_pending {
            return vec![];
        }

        tracing::warn!(
            room = %self.room,
            reason = %reason,
            retry_in_ms = self.policy.delay().as_millis() as u64,
            "Chat transport lost"
        );

        let was = self.state;
        self.state = ConnectionState::Disconnected;
        self.reconnect_pending = true;

        let mut actions = Vec::new();
        if was != ConnectionState::Disconnected {
            actions.push(ChatAction::CloseTransport);
            actions.push(ChatAction::StateChanged(ConnectionState::Disconnected));
        }
        actions.push(ChatAction::ScheduleReconnect(self.policy.delay()));
        actions
    }

    /// The reconnect timer fired
    pub fn reconnect_elapsed(&mut self) -> Vec<ChatAction> {
        if self.lifecycle != Lifecycle::Open || !self.reconnect_pending {
            return vec![];
        }
        self.reconnect_pending = false;
        tracing::info!(room = %self.room, attempt = self.attempt + 1, "Reconnecting chat");
        self.begin_connect()
    }

    /// A text frame arrived
    ///
    /// Malformed frames are logged and dropped; the channel stays open.
    pub fn frame_received(&mut self, text: &str) -> Vec<ChatAction> {
        if self.lifecycle == Lifecycle::Closed {
            return vec![];
        }

        match InboundFrame::parse(text) {
            Ok(InboundFrame::Message(wire)) => {
                let message = ChatMessage::from_wire(wire, &self.user.id);
                let id = message.id.clone();
                if self.log.push(message) {
                    tracing::debug!(room = %self.room, message_id = %id, "Message received");
                    vec![ChatAction::MessagesChanged]
                } else {
                    vec![]
                }
            }
            Ok(InboundFrame::Ignored { kind }) => {
                tracing::trace!(room = %self.room, kind = %kind, "Frame ignored");
                vec![]
            }
            Err(e) => {
                tracing::warn!(room = %self.room, error = %e, "Malformed chat frame dropped");
                vec![]
            }
        }
    }

    /// Send a chat line
    ///
    /// Never touches the message list: the line shows up when the server
    /// echoes it back.
    pub fn send(&self, text: &str) -> ChatResult<Vec<ChatAction>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.state != ConnectionState::Connected {
            return Err(ChatError::NotConnected);
        }

        Ok(vec![ChatAction::Transmit(OutboundFrame::Message(
            MessagePayload {
                city_id: self.room.to_string(),
                user_id: self.user.id.clone(),
                user_name: self.user.name.clone(),
                message: text.to_string(),
            },
        ))])
    }

    /// Merge the room history fetched over REST
    pub fn hydrate(&mut self, history: Vec<WireMessage>) -> Vec<ChatAction> {
        if self.lifecycle == Lifecycle::Closed {
            tracing::debug!(room = %self.room, "History arrived after close, ignored");
            return vec![];
        }
        if history.is_empty() {
            return vec![];
        }

        let messages = history
            .into_iter()
            .map(|wire| ChatMessage::from_wire(wire, &self.user.id))
            .collect();
        let added = self.log.hydrate(messages);
        tracing::debug!(room = %self.room, added, total = self.log.len(), "History merged");
        vec![ChatAction::MessagesChanged]
    }

    /// Release the connection; safe to call repeatedly
    pub fn close(&mut self) -> Vec<ChatAction> {
        if self.lifecycle == Lifecycle::Closed {
            return vec![];
        }
        self.lifecycle = Lifecycle::Closed;

        let mut actions = Vec::new();
        if self.reconnect_pending {
            self.reconnect_pending = false;
            actions.push(ChatAction::CancelReconnect);
        }
        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Disconnected;
            actions.push(ChatAction::CloseTransport);
            actions.push(ChatAction::StateChanged(ConnectionState::Disconnected));
        }

        tracing::info!(room = %self.room, "Chat closed");
        actions
    }

    fn begin_connect(&mut self) -> Vec<ChatAction> {
        self.attempt += 1;
        self.state = ConnectionState::Connecting;
        vec![
            ChatAction::StateChanged(ConnectionState::Connecting),
            ChatAction::Connect {
                attempt: self.attempt,
            },
        ]
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn user(&self) -> &ChatUser {
        &self.user
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Messages in display order
    pub fn messages(&self) -> &[ChatMessage] {
        self.log.as_slice()
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle == Lifecycle::Closed
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> ChatMachine {
        ChatMachine::new(
            RoomId::new("12").unwrap(),
            ChatUser::new("me@example.com", "Me"),
            ReconnectPolicy::default(),
        )
    }

    fn connected() -> ChatMachine {
        let mut m = machine();
        m.open();
        m.transport_opened();
        m
    }

    fn frame(id: &str, user: &str) -> String {
        format!(
            r#"{{"type":"message","data":{{"messageId":"{}","userId":"{}","userName":"X","message":"text {}","timestamp":1700000000000}}}}"#,
            id, user, id
        )
    }

    fn transmits(actions: &[ChatAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, ChatAction::Transmit(_)))
            .count()
    }

    #[test]
    fn test_room_id_rejects_blank() {
        assert_eq!(RoomId::new("  "), Err(ChatError::EmptyRoom));
        assert_eq!(RoomId::new(" 7 ").unwrap().as_str(), "7");
    }

    #[test]
    fn test_open_connects() {
        let mut m = machine();
        let actions = m.open();
        assert_eq!(
            actions,
            vec![
                ChatAction::StateChanged(ConnectionState::Connecting),
                ChatAction::Connect { attempt: 1 },
            ]
        );
        assert_eq!(m.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_join_sent_when_transport_ready() {
        let mut m = machine();
        m.open();
        let actions = m.transport_opened();

        assert_eq!(
            actions,
            vec![
                ChatAction::Transmit(OutboundFrame::Join(JoinPayload {
                    city_id: "12".to_string(),
                    user_id: "me@example.com".to_string(),
                    user_name: "Me".to_string(),
                })),
                ChatAction::StateChanged(ConnectionState::Connected),
            ]
        );
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_second_open_is_ignored() {
        let mut m = machine();
        m.open();
        assert!(m.open().is_empty());

        m.transport_opened();
        assert!(m.open().is_empty());
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_send_requires_connection() {
        let mut m = machine();
        assert_eq!(m.send("hi"), Err(ChatError::NotConnected));

        m.open();
        assert_eq!(m.send("hi"), Err(ChatError::NotConnected));
        assert!(m.messages().is_empty());
    }

    #[test]
    fn test_send_rejects_blank_text() {
        let m = connected();
        assert_eq!(m.send(""), Err(ChatError::EmptyMessage));
        assert_eq!(m.send(" \n\t "), Err(ChatError::EmptyMessage));
    }

    #[test]
    fn test_send_trims_and_does_not_touch_log() {
        let m = connected();
        let actions = m.send("  hello there  ").unwrap();

        match &actions[..] {
            [ChatAction::Transmit(OutboundFrame::Message(payload))] => {
                assert_eq!(payload.message, "hello there");
                assert_eq!(payload.city_id, "12");
                assert_eq!(payload.user_id, "me@example.com");
            }
            other => panic!("Expected one Transmit, got {:?}", other),
        }
        assert!(m.messages().is_empty());
    }

    #[test]
    fn test_inbound_messages_dedupe_in_arrival_order() {
        let mut m = connected();
        assert_eq!(m.frame_received(&frame("b", "x")), vec![ChatAction::MessagesChanged]);
        assert_eq!(m.frame_received(&frame("a", "x")), vec![ChatAction::MessagesChanged]);
        assert!(m.frame_received(&frame("b", "x")).is_empty());
        m.frame_received(&frame("c", "x"));

        let ids: Vec<_> = m.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_echo_of_own_message_is_marked_own() {
        let mut m = connected();
        m.frame_received(&frame("m1", "me@example.com"));
        m.frame_received(&frame("m2", "them@example.com"));

        assert!(m.messages()[0].is_own);
        assert!(!m.messages()[1].is_own);
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let mut m = connected();
        assert!(m.frame_received("{not json").is_empty());
        assert!(m.frame_received(r#"{"type":"presence","data":{}}"#).is_empty());
        assert_eq!(m.state(), ConnectionState::Connected);
        assert!(m.messages().is_empty());
    }

    #[test]
    fn test_loss_schedules_one_reconnect() {
        let mut m = connected();
        let actions = m.transport_lost("network error");
        assert_eq!(
            actions,
            vec![
                ChatAction::CloseTransport,
                ChatAction::StateChanged(ConnectionState::Disconnected),
                ChatAction::ScheduleReconnect(DEFAULT_RECONNECT_DELAY),
            ]
        );
        assert_eq!(m.state(), ConnectionState::Disconnected);

        // The close that follows an error must not arm a second timer
        assert!(m.transport_lost("closed").is_empty());
        assert!(m.reconnect_pending());
    }

    #[test]
    fn test_reconnect_fires_once_per_loss() {
        let mut m = connected();
        m.transport_lost("closed");

        let actions = m.reconnect_elapsed();
        assert_eq!(
            actions,
            vec![
                ChatAction::StateChanged(ConnectionState::Connecting),
                ChatAction::Connect { attempt: 1 },
            ]
        );
        assert!(m.reconnect_elapsed().is_empty());
    }

    #[test]
    fn test_reconnect_repeats_until_success() {
        let mut m = machine();
        m.open();

        for attempt in 2..=5 {
            let lost = m.transport_lost("refused");
            assert_eq!(lost.last(), Some(&ChatAction::ScheduleReconnect(DEFAULT_RECONNECT_DELAY)));
            let retry = m.reconnect_elapsed();
            assert_eq!(retry.last(), Some(&ChatAction::Connect { attempt }));
        }

        m.transport_opened();
        assert_eq!(m.state(), ConnectionState::Connected);

        m.transport_lost("closed");
        assert_eq!(m.reconnect_elapsed().last(), Some(&ChatAction::Connect { attempt: 1 }));
    }

    #[test]
    fn test_close_during_delay_cancels_reconnect() {
        let mut m = connected();
        m.transport_lost("closed");

        assert_eq!(m.close(), vec![ChatAction::CancelReconnect]);
        assert!(m.reconnect_elapsed().is_empty());
        assert!(m.transport_lost("late close").is_empty());
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut m = connected();
        assert_eq!(
            m.close(),
            vec![
                ChatAction::CloseTransport,
                ChatAction::StateChanged(ConnectionState::Disconnected),
            ]
        );
        assert!(m.close().is_empty());
        assert!(m.close().is_empty());

        let mut never_opened = machine();
        assert!(never_opened.close().is_empty());
    }

    #[test]
    fn test_transport_opened_after_close_is_released() {
        let mut m = machine();
        m.open();
        m.close();
        assert_eq!(m.transport_opened(), vec![ChatAction::CloseTransport]);
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_open_during_delay_connects_immediately() {
        let mut m = connected();
        m.transport_lost("closed");

        let actions = m.open();
        assert_eq!(actions[0], ChatAction::CancelReconnect);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert!(!m.reconnect_pending());
    }

    #[test]
    fn test_history_and_live_share_dedup() {
        let mut m = connected();
        m.frame_received(&frame("3", "x"));

        let history: Vec<WireMessage> = ["1", "2", "3"]
            .iter()
            .map(|id| WireMessage {
                message_id: id.to_string(),
                user_id: "x".to_string(),
                user_name: "X".to_string(),
                message: String::new(),
                timestamp: None,
                city_id: None,
            })
            .collect();

        assert_eq!(m.hydrate(history), vec![ChatAction::MessagesChanged]);
        let ids: Vec<_> = m.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        assert!(m.frame_received(&frame("2", "x")).is_empty());
    }

    #[test]
    fn test_history_after_close_is_ignored() {
        let mut m = connected();
        m.close();
        let history = vec![WireMessage {
            message_id: "1".to_string(),
            user_id: String::new(),
            user_name: String::new(),
            message: String::new(),
            timestamp: None,
            city_id: None,
        }];
        assert!(m.hydrate(history).is_empty());
        assert!(m.messages().is_empty());
        assert!(m.frame_received(&frame("9", "x")).is_empty());
    }
}
