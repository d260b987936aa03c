//! Chat Panel Component
//!
//! Live chat room for one city. The panel owns its [`ChatChannel`]: it opens
//! on mount, loads the stored history alongside the live socket, and closes on
//! unmount.

use leptos::*;

use wayfarer::chat::{ChatMessage, ConnectionState, ReconnectPolicy, RoomId};

use crate::api;
use crate::state::{use_global_state, ChatChannel};

#[component]
pub fn ChatPanel(
    room: RoomId,
    #[prop(into)]
    city_name: String,
) -> impl IntoView {
    let state = use_global_state();
    let session = state.session.get_untracked();

    let channel = ChatChannel::open(
        &api::ws_url(),
        room.clone(),
        session.chat_user(),
        ReconnectPolicy::default(),
    );

    let weak = channel.downgrade();
    spawn_local(async move {
        let result = api::fetch_chat_history(&room, &session).await;
        let Some(channel) = weak.upgrade() else { return };
        match result {
            Ok(history) => channel.hydrate(history),
            Err(e) => web_sys::console::warn_1(
                &format!("Chat history unavailable for {}: {}", room, e).into(),
            ),
        }
    });

    let connection = channel.state();
    let messages = channel.messages();
    let draft = create_rw_signal(String::new());

    let closing = channel.clone();
    on_cleanup(move || closing.close());

    let send = move || {
        let text = draft.get_untracked();
        match channel.send(&text) {
            Ok(()) => draft.set(String::new()),
            Err(e) => state.show_error(&e.to_string()),
        }
    };
    let send = store_value(send);

    view! {
        <section class="bg-gray-800 rounded-xl flex flex-col h-[32rem]">
            <header class="flex items-center justify-between px-4 py-3 border-b border-gray-700">
                <h2 class="font-semibold">{format!("{} community chat", city_name)}</h2>
                <ConnectionBadge state=connection />
            </header>

            <div class="flex-1 overflow-y-auto p-4 space-y-3">
                {move || {
                    let list = messages.get();
                    if list.is_empty() {
                        view! {
                            <p class="text-center text-gray-500 py-8">"No messages yet. Say hello!"</p>
                        }.into_view()
                    } else {
                        list.into_iter()
                            .map(|message| view! { <MessageRow message=message /> })
                            .collect_view()
                    }
                }}
            </div>

            <form
                class="flex items-center space-x-2 p-3 border-t border-gray-700"
                on:submit=move |ev| {
                    ev.prevent_default();
                    send.with_value(|send| send());
                }
            >
                <input
                    type="text"
                    placeholder="Type a message..."
                    class="flex-1 bg-gray-900 border border-gray-700 rounded-lg px-3 py-2"
                    prop:value=move || draft.get()
                    on:input=move |ev| draft.set(event_target_value(&ev))
                />
                <button
                    type="submit"
                    disabled=move || !connection.get().can_send() || draft.with(|d| d.trim().is_empty())
                    class="px-4 py-2 bg-primary-600 hover:bg-primary-700 disabled:opacity-50 rounded-lg font-medium"
                >
                    "Send"
                </button>
            </form>
        </section>
    }
}

#[component]
fn ConnectionBadge(state: ReadSignal<ConnectionState>) -> impl IntoView {
    move || {
        let (dot, text) = match state.get() {
            ConnectionState::Connected => ("bg-green-400", "text-green-400"),
            ConnectionState::Connecting => ("bg-yellow-400 pulse", "text-yellow-400"),
            ConnectionState::Disconnected => ("bg-red-400", "text-red-400"),
        };
        view! {
            <span class=format!("flex items-center space-x-1 text-sm {}", text)>
                <span class=format!("w-2 h-2 rounded-full {}", dot) />
                <span>{state.get().label()}</span>
            </span>
        }
    }
}

#[component]
fn MessageRow(message: ChatMessage) -> impl IntoView {
    let avatar = message.avatar();
    let row_class = if message.is_own {
        "flex items-start space-x-2 flex-row-reverse space-x-reverse"
    } else {
        "flex items-start space-x-2"
    };
    let bubble_class = if message.is_own {
        "bg-primary-600 text-white"
    } else {
        "bg-gray-700 text-gray-100"
    };

    view! {
        <div class=row_class>
            <div
                class="w-8 h-8 rounded-full flex items-center justify-center text-xs font-bold text-white shrink-0"
                style=format!("background: {}", avatar.css_gradient())
            >
                {avatar.initials.clone()}
            </div>
            <div class="max-w-[75%]">
                <div class="text-xs text-gray-400 mb-1">
                    {message.display_author().to_string()}
                    " · "
                    {message.clock_time()}
                </div>
                <div class=format!("{} rounded-lg px-3 py-2 text-sm break-words", bubble_class)>
                    {message.body.clone()}
                </div>
            </div>
        </div>
    }
}
