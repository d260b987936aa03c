//! Wayfarer Web Client
//!
//! Browser front end for the Wayfarer backend, built with Leptos (WASM).
//!
//! # Features
//!
//! - City rankings with search, category filter and sort
//! - City detail with the rating form and a live chat room
//! - Incident map with double-click reporting
//! - Profile: home location and mobile number
//!
//! # Architecture
//!
//! Client-side rendered Leptos app. Listing, payload and chat logic come from
//! the `wayfarer` core crate; this crate only adds the browser drivers
//! (`gloo-net` for REST, `web_sys::WebSocket` for chat) and the views.

use leptos::*;

mod api;
mod app;
mod components;
mod map_bridge;
mod pages;
mod state;

fn main() {
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
