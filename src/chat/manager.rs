//! Chat Connection Manager
//!
//! Tokio driver for [`ChatMachine`]. Each `open` spawns one task that owns the
//! machine, the socket link, the reconnect timer and the history fetch, and
//! multiplexes them with `select!`. The handle publishes connection state and
//! the message list through `watch` channels.
//!
//! One manager per chat view. Closing (or dropping) the manager stops the task,
//! which releases the socket and any pending timer.
//!
//! Every task carries the generation it was started under. `close` and `open`
//! bump the generation, and a task only publishes while its generation is
//! current, so a stopping task never writes into the channels of the next room.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;

use super::error::{ChatError, ChatResult};
use super::machine::{ChatAction, ChatMachine, ConnectionState, ReconnectPolicy, RoomId};
use super::message::{ChatMessage, WireMessage};
use super::transport::{Connector, HistorySource, Link, TransportEvent};
use crate::session::ChatUser;

enum Command {
    Send(String),
    Close,
}

struct Running {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

/// Watch channels shared by the handle and its tasks
struct Outputs {
    generation: u64,
    state_tx: watch::Sender<ConnectionState>,
    messages_tx: watch::Sender<Vec<ChatMessage>>,
}

/// A task's write access to [`Outputs`], valid for one generation
struct Publisher {
    generation: u64,
    outputs: Arc<Mutex<Outputs>>,
}

impl Publisher {
    fn publish(&self, update: impl FnOnce(&Outputs)) {
        let outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
        if outputs.generation == self.generation {
            update(&outputs);
        }
    }
}

/// Owns the chat connection for one mounted view
pub struct ChatConnectionManager {
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    outputs: Arc<Mutex<Outputs>>,
    state_rx: watch::Receiver<ConnectionState>,
    messages_rx: watch::Receiver<Vec<ChatMessage>>,
    running: Mutex<Option<Running>>,
}

impl ChatConnectionManager {
    pub fn new(connector: impl Connector, policy: ReconnectPolicy) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (messages_tx, messages_rx) = watch::channel(Vec::new());

        Self {
            connector: Arc::new(connector),
            policy,
            outputs: Arc::new(Mutex::new(Outputs {
                generation: 0,
                state_tx,
                messages_tx,
            })),
            state_rx,
            messages_rx,
            running: Mutex::new(None),
        }
    }

    /// Connect to `room` as `user`
    ///
    /// Must be called from within a tokio runtime. Ignored while a connection
    /// is already active.
    pub fn open(&self, room: RoomId, user: ChatUser) -> ChatResult<()> {
        self.start(room, user, None)
    }

    /// Connect and load the room history concurrently
    pub fn open_with_history(
        &self,
        room: RoomId,
        user: ChatUser,
        history: impl HistorySource,
    ) -> ChatResult<()> {
        self.start(room, user, Some(Arc::new(history)))
    }

    fn start(
        &self,
        room: RoomId,
        user: ChatUser,
        history: Option<Arc<dyn HistorySource>>,
    ) -> ChatResult<()> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = running.as_ref() {
            if !active.task.is_finished() {
                tracing::debug!(room = %room, "open ignored, connection already active");
                return Ok(());
            }
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let generation = {
            let mut outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
            outputs.generation += 1;
            outputs.messages_tx.send_replace(Vec::new());
            outputs.generation
        };
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let history = history.map(|source| {
            let room = room.clone();
            Box::pin(async move { source.history(&room).await })
                as BoxFuture<'static, ChatResult<Vec<WireMessage>>>
        });

        let driver = Driver {
            connector: self.connector.clone(),
            publisher: Publisher {
                generation,
                outputs: self.outputs.clone(),
            },
            link: None,
            connecting: None,
            reconnect: None,
        };
        let machine = ChatMachine::new(room, user, self.policy);
        let task = runtime.spawn(driver.run(machine, commands_rx, history));

        *running = Some(Running {
            commands: commands_tx,
            task,
        });
        Ok(())
    }

    /// Send a chat line
    ///
    /// Fails without touching the transport when the text is blank or the
    /// connection is not up. The line appears in [`messages`](Self::messages)
    /// once the server echoes it.
    pub fn send(&self, text: &str) -> ChatResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if *self.state_rx.borrow() != ConnectionState::Connected {
            return Err(ChatError::NotConnected);
        }

        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        match running.as_ref() {
            Some(active) => active
                .commands
                .send(Command::Send(text.to_string()))
                .map_err(|_| ChatError::Closed),
            None => Err(ChatError::NotConnected),
        }
    }

    /// Stop the connection task; safe to call repeatedly
    pub fn close(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(active) = running else { return };

        // The task winds down on its own; from here on it publishes nothing
        {
            let mut outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
            outputs.generation += 1;
            outputs.state_tx.send_replace(ConnectionState::Disconnected);
        }
        let _ = active.commands.send(Command::Close);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Current messages in display order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages_rx.borrow().clone()
    }

    pub fn subscribe_messages(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.messages_rx.clone()
    }

    /// Resolve once the connection reaches `target`
    pub async fn wait_for_state(&self, target: ConnectionState) -> ChatResult<()> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| ChatError::Closed)
    }

    pub async fn connected(&self) -> ChatResult<()> {
        self.wait_for_state(ConnectionState::Connected).await
    }
}

impl Drop for ChatConnectionManager {
    fn drop(&mut self) {
        self.close();
    }
}

/// Task-side state: the I/O the machine asks for
struct Driver {
    connector: Arc<dyn Connector>,
    publisher: Publisher,
    link: Option<Link>,
    connecting: Option<BoxFuture<'static, ChatResult<Link>>>,
    reconnect: Option<std::pin::Pin<Box<Sleep>>>,
}

impl Driver {
    async fn run(
        mut self,
        mut machine: ChatMachine,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut history: Option<BoxFuture<'static, ChatResult<Vec<WireMessage>>>>,
    ) {
        let actions = machine.open();
        self.apply(&machine, actions);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send(text)) => match machine.send(&text) {
                        Ok(actions) => self.apply(&machine, actions),
                        Err(e) => tracing::debug!(error = %e, "Send dropped"),
                    },
                    Some(Command::Close) | None => {
                        let actions = machine.close();
                        self.apply(&machine, actions);
                        break;
                    }
                },
                result = poll_slot(&mut self.connecting) => {
                    self.connecting = None;
                    let actions = match result {
                        Ok(link) => {
                            self.link = Some(link);
                            machine.transport_opened()
                        }
                        Err(e) => machine.transport_lost(&e.to_string()),
                    };
                    self.apply(&machine, actions);
                },
                event = next_event(&mut self.link) => {
                    let actions = match event {
                        Some(TransportEvent::Frame(text)) => machine.frame_received(&text),
                        Some(TransportEvent::Error(e)) => machine.transport_lost(&e),
                        Some(TransportEvent::Closed) | None => machine.transport_lost("closed"),
                    };
                    self.apply(&machine, actions);
                },
                _ = poll_slot(&mut self.reconnect) => {
                    self.reconnect = None;
                    let actions = machine.reconnect_elapsed();
                    self.apply(&machine, actions);
                },
                result = poll_slot(&mut history) => {
                    history = None;
                    match result {
                        Ok(messages) => {
                            let actions = machine.hydrate(messages);
                            self.apply(&machine, actions);
                        }
                        Err(e) => {
                            tracing::warn!(room = %machine.room(), error = %e, "Chat history unavailable");
                        }
                    }
                },
            }
        }
    }

    fn apply(&mut self, machine: &ChatMachine, actions: Vec<ChatAction>) {
        for action in actions {
            match action {
                ChatAction::Connect { attempt } => {
                    tracing::debug!(room = %machine.room(), attempt, "Opening chat transport");
                    let connector = self.connector.clone();
                    self.connecting = Some(Box::pin(async move { connector.connect().await }));
                }
                ChatAction::Transmit(frame) => {
                    let Some(link) = self.link.as_ref() else {
                        continue;
                    };
                    match frame.to_json() {
                        Ok(text) => {
                            // A dead pump reports its own loss event
                            let _ = link.outbound.send(text);
                        }
                        Err(e) => tracing::error!(error = %e, "Failed to encode chat frame"),
                    }
                }
                ChatAction::ScheduleReconnect(delay) => {
                    self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
                }
                ChatAction::CancelReconnect => {
                    self.reconnect = None;
                }
                ChatAction::CloseTransport => {
                    self.link = None;
                    self.connecting = None;
                }
                ChatAction::StateChanged(state) => {
                    self.publisher.publish(|outputs| {
                        outputs.state_tx.send_replace(state);
                    });
                }
                ChatAction::MessagesChanged => {
                    self.publisher.publish(|outputs| {
                        outputs.messages_tx.send_replace(machine.messages().to_vec());
                    });
                }
            }
        }
    }
}

async fn poll_slot<F>(slot: &mut Option<F>) -> F::Output
where
    F: Future + Unpin,
{
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn next_event(link: &mut Option<Link>) -> Option<TransportEvent> {
    match link {
        Some(link) => link.inbound.recv().await,
        None => std::future::pending().await,
    }
}
