//! Loading Component
//!
//! Spinner and placeholder shapes shown while a page waits on the backend.

use leptos::*;

/// Centered spinner with an optional caption
#[component]
pub fn Loading(
    #[prop(optional, into)]
    label: Option<String>,
) -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center gap-3 py-12 text-gray-400" role="status">
            <div class="loading-spinner w-8 h-8" />
            {label.map(|text| view! { <span class="text-sm">{text}</span> })}
        </div>
    }
}

/// Spinner sized for buttons
#[component]
pub fn InlineLoading() -> impl IntoView {
    view! {
        <span class="inline-block align-middle loading-spinner w-4 h-4" aria-label="Working" />
    }
}

/// Placeholder rows shaped like a title over a detail line
#[component]
pub fn ListSkeleton(
    #[prop(default = 3)]
    rows: usize,
) -> impl IntoView {
    view! {
        <div class="space-y-2 animate-pulse">
            {(0..rows).map(|_| view! {
                <div class="bg-gray-800 rounded-lg p-4 space-y-2">
                    <div class="h-4 w-1/3 bg-gray-700 rounded" />
                    <div class="h-3 w-2/3 bg-gray-700 rounded" />
                </div>
            }).collect_view()}
        </div>
    }
}

/// Placeholder grid matching the city cards
#[component]
pub fn CityGridSkeleton(
    #[prop(default = 6)]
    cards: usize,
) -> impl IntoView {
    view! {
        <div class="grid md:grid-cols-2 lg:grid-cols-3 gap-4 animate-pulse">
            {(0..cards).map(|_| view! {
                <div class="bg-gray-800 rounded-xl overflow-hidden border border-gray-700">
                    <div class="h-40 bg-gray-700" />
                    <div class="p-4 space-y-2">
                        <div class="h-5 w-1/2 bg-gray-700 rounded" />
                        <div class="h-3 w-full bg-gray-700 rounded" />
                        <div class="h-3 w-1/4 bg-gray-700 rounded" />
                    </div>
                </div>
            }).collect_view()}
        </div>
    }
}
