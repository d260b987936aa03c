//! Toast Notification Component
//!
//! Global toasts plus the inline banner a page shows when a request fell
//! back to the empty state.

use leptos::*;

use crate::state::global::use_global_state;

/// Corner stack for the global success and error messages
///
/// Each toast also clears on click, before its timer runs out.
#[component]
pub fn Toast() -> impl IntoView {
    let state = use_global_state();

    view! {
        <div class="fixed bottom-20 right-4 z-50 flex flex-col items-end gap-2" aria-live="polite">
            <Notice message=state.success tone=Tone::Confirm />
            <Notice message=state.error tone=Tone::Alert />
        </div>
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Confirm,
    Alert,
}

impl Tone {
    fn classes(self) -> &'static str {
        match self {
            Tone::Confirm => "bg-emerald-600/95 border-emerald-400",
            Tone::Alert => "bg-rose-700/95 border-rose-400",
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            Tone::Confirm => "🧭",
            Tone::Alert => "⚠",
        }
    }
}

#[component]
fn Notice(message: RwSignal<Option<String>>, tone: Tone) -> impl IntoView {
    move || {
        message.get().map(|text| view! {
            <button
                type="button"
                on:click=move |_| message.set(None)
                class=format!(
                    "flex items-center gap-2 max-w-sm text-left text-white text-sm border-l-4 \
                     px-4 py-3 rounded-md shadow-xl animate-slide-in {}",
                    tone.classes()
                )
            >
                <span>{tone.glyph()}</span>
                <span>{text}</span>
            </button>
        })
    }
}

/// Inline error banner with a dismiss button
#[component]
pub fn InlineError(message: RwSignal<Option<String>>) -> impl IntoView {
    move || {
        message.get().map(|text| view! {
            <div class="flex items-center justify-between bg-red-900/40 border border-red-700 text-red-200 px-4 py-3 rounded-lg">
                <span class="text-sm">{text}</span>
                <button
                    on:click=move |_| message.set(None)
                    class="text-red-300 hover:text-white text-lg leading-none"
                >
                    "×"
                </button>
            </div>
        })
    }
}
