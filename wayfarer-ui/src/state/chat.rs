//! Browser Chat Channel
//!
//! Drives a [`ChatMachine`] over `web_sys::WebSocket` and `gloo-timers`.
//! One channel belongs to one mounted chat view; the view closes it from
//! `on_cleanup`, which tears down the socket and drops any pending reconnect
//! timer.
//!
//! Socket callbacks hold a weak reference plus the generation of the socket
//! they were attached to, so events from a replaced or closed socket are
//! ignored.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use wayfarer::chat::{
    ChatAction, ChatMachine, ChatMessage, ChatResult, ConnectionState, ReconnectPolicy, RoomId,
    WireMessage,
};
use wayfarer::session::ChatUser;

struct Socket {
    ws: WebSocket,
    _on_open: Closure<dyn FnMut(JsValue)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

impl Socket {
    fn shutdown(self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
        self.ws.set_onerror(None);
        let _ = self.ws.close();
        // The callback that triggered the shutdown may still be running
        wasm_bindgen_futures::spawn_local(async move { drop(self) });
    }
}

struct Inner {
    machine: ChatMachine,
    url: String,
    socket: Option<Socket>,
    generation: u64,
    reconnect: Option<Timeout>,
    state: RwSignal<ConnectionState>,
    messages: RwSignal<Vec<ChatMessage>>,
}

/// Chat connection owned by one mounted view
#[derive(Clone)]
pub struct ChatChannel {
    inner: Rc<RefCell<Inner>>,
}

impl ChatChannel {
    /// Connect to `url` and join `room`
    pub fn open(url: &str, room: RoomId, user: ChatUser, policy: ReconnectPolicy) -> Self {
        let inner = Rc::new(RefCell::new(Inner {
            machine: ChatMachine::new(room, user, policy),
            url: url.to_string(),
            socket: None,
            generation: 0,
            reconnect: None,
            state: create_rw_signal(ConnectionState::Disconnected),
            messages: create_rw_signal(Vec::new()),
        }));

        dispatch(&inner, |machine| machine.open());
        Self { inner }
    }

    pub fn state(&self) -> ReadSignal<ConnectionState> {
        self.inner.borrow().state.read_only()
    }

    pub fn messages(&self) -> ReadSignal<Vec<ChatMessage>> {
        self.inner.borrow().messages.read_only()
    }

    /// Send a chat line; rejected unless connected and non-blank
    pub fn send(&self, text: &str) -> ChatResult<()> {
        let actions = self.inner.borrow().machine.send(text)?;
        apply_all(&self.inner, actions);
        Ok(())
    }

    /// Merge stored history into the live log
    pub fn hydrate(&self, history: Vec<WireMessage>) {
        dispatch(&self.inner, |machine| machine.hydrate(history));
    }

    pub fn close(&self) {
        dispatch(&self.inner, |machine| machine.close());
    }

    /// Handle for callbacks that must not keep the channel alive
    pub fn downgrade(&self) -> WeakChatChannel {
        WeakChatChannel {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle to a [`ChatChannel`]
#[derive(Clone)]
pub struct WeakChatChannel {
    inner: Weak<RefCell<Inner>>,
}

impl WeakChatChannel {
    pub fn upgrade(&self) -> Option<ChatChannel> {
        self.inner.upgrade().map(|inner| ChatChannel { inner })
    }
}

fn dispatch(inner: &Rc<RefCell<Inner>>, step: impl FnOnce(&mut ChatMachine) -> Vec<ChatAction>) {
    let actions = step(&mut inner.borrow_mut().machine);
    apply_all(inner, actions);
}

/// Run a machine step for the socket of `generation`, if it is still current
fn dispatch_for(
    weak: &Weak<RefCell<Inner>>,
    generation: u64,
    step: impl FnOnce(&mut ChatMachine) -> Vec<ChatAction>,
) {
    let Some(inner) = weak.upgrade() else { return };
    if inner.borrow().generation != generation {
        return;
    }
    dispatch(&inner, step);
}

fn apply_all(inner: &Rc<RefCell<Inner>>, actions: Vec<ChatAction>) {
    for action in actions {
        apply(inner, action);
    }
}

fn apply(inner: &Rc<RefCell<Inner>>, action: ChatAction) {
    match action {
        ChatAction::Connect { attempt } => {
            let url = inner.borrow().url.clone();
            web_sys::console::log_1(&format!("Opening chat socket (attempt {})", attempt).into());
            match connect(inner, &url) {
                Ok(socket) => inner.borrow_mut().socket = Some(socket),
                Err(e) => {
                    let reason = format!("{:?}", e);
                    dispatch(inner, |machine| machine.transport_lost(&reason));
                }
            }
        }
        ChatAction::Transmit(frame) => {
            let text = match frame.to_json() {
                Ok(text) => text,
                Err(e) => {
                    web_sys::console::error_1(&format!("Failed to encode chat frame: {}", e).into());
                    return;
                }
            };
            let inner = inner.borrow();
            if let Some(socket) = inner.socket.as_ref() {
                if let Err(e) = socket.ws.send_with_str(&text) {
                    web_sys::console::warn_1(&format!("Chat send failed: {:?}", e).into());
                }
            }
        }
        ChatAction::ScheduleReconnect(delay) => {
            let weak = Rc::downgrade(inner);
            let timer = Timeout::new(delay.as_millis() as u32, move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().reconnect = None;
                    dispatch(&inner, |machine| machine.reconnect_elapsed());
                }
            });
            inner.borrow_mut().reconnect = Some(timer);
        }
        ChatAction::CancelReconnect => {
            // Dropping the timeout cancels it
            inner.borrow_mut().reconnect = None;
        }
        ChatAction::CloseTransport => {
            let socket = {
                let mut inner = inner.borrow_mut();
                inner.generation += 1;
                inner.socket.take()
            };
            if let Some(socket) = socket {
                socket.shutdown();
            }
        }
        ChatAction::StateChanged(state) => {
            let signal = inner.borrow().state;
            signal.set(state);
        }
        ChatAction::MessagesChanged => {
            let (signal, messages) = {
                let inner = inner.borrow();
                (inner.messages, inner.machine.messages().to_vec())
            };
            signal.set(messages);
        }
    }
}

fn connect(inner: &Rc<RefCell<Inner>>, url: &str) -> Result<Socket, JsValue> {
    let ws = WebSocket::new(url)?;
    let generation = {
        let mut inner = inner.borrow_mut();
        inner.generation += 1;
        inner.generation
    };

    let weak = Rc::downgrade(inner);
    let on_open = Closure::wrap(Box::new(move |_: JsValue| {
        dispatch_for(&weak, generation, |machine| machine.transport_opened());
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let weak = Rc::downgrade(inner);
    let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
            let text: String = text.into();
            dispatch_for(&weak, generation, |machine| machine.frame_received(&text));
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let weak = Rc::downgrade(inner);
    let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
        let reason = format!("code={} reason={}", event.code(), event.reason());
        dispatch_for(&weak, generation, |machine| machine.transport_lost(&reason));
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    let weak = Rc::downgrade(inner);
    let on_error = Closure::wrap(Box::new(move |_: JsValue| {
        dispatch_for(&weak, generation, |machine| machine.transport_lost("socket error"));
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    Ok(Socket {
        ws,
        _on_open: on_open,
        _on_message: on_message,
        _on_close: on_close,
        _on_error: on_error,
    })
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::time::Duration;
    use wasm_bindgen_test::*;

    const FRAME: &str = r#"{"type":"message","data":{"messageId":"m1","userId":"them","userName":"Them","message":"hi"}}"#;

    /// Channel already connecting on socket generation 1, with no real socket
    fn connecting(policy: ReconnectPolicy) -> ChatChannel {
        let mut machine = ChatMachine::new(RoomId::new("12").unwrap(), ChatUser::guest(), policy);
        let _ = machine.open();
        let inner = Inner {
            machine,
            url: "ws://127.0.0.1:9/chat/chat".to_string(),
            socket: None,
            generation: 1,
            reconnect: None,
            state: create_rw_signal(ConnectionState::Connecting),
            messages: create_rw_signal(Vec::new()),
        };
        ChatChannel {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    #[wasm_bindgen_test]
    fn test_callbacks_from_replaced_socket_are_ignored() {
        let channel = connecting(ReconnectPolicy::default());
        let weak = Rc::downgrade(&channel.inner);

        dispatch_for(&weak, 0, |machine| machine.transport_opened());
        assert_eq!(channel.state().get_untracked(), ConnectionState::Connecting);

        dispatch_for(&weak, 1, |machine| machine.transport_opened());
        assert_eq!(channel.state().get_untracked(), ConnectionState::Connected);

        dispatch_for(&weak, 0, |machine| machine.frame_received(FRAME));
        assert!(channel.messages().get_untracked().is_empty());

        dispatch_for(&weak, 1, |machine| machine.frame_received(FRAME));
        assert_eq!(channel.messages().get_untracked().len(), 1);
    }

    #[wasm_bindgen_test]
    fn test_close_drops_pending_reconnect() {
        let channel = connecting(ReconnectPolicy::fixed(Duration::from_secs(60)));
        let weak = Rc::downgrade(&channel.inner);

        dispatch_for(&weak, 1, |machine| machine.transport_lost("reset"));
        assert_eq!(channel.state().get_untracked(), ConnectionState::Disconnected);
        assert!(channel.inner.borrow().reconnect.is_some());
        assert_eq!(channel.inner.borrow().generation, 2);

        // The socket that just failed can no longer reach the machine
        dispatch_for(&weak, 1, |machine| machine.transport_opened());
        assert_eq!(channel.state().get_untracked(), ConnectionState::Disconnected);

        channel.close();
        assert!(channel.inner.borrow().reconnect.is_none());
        assert!(channel.inner.borrow().machine.is_closed());
        assert!(channel.send("hello").is_err());
    }
}
