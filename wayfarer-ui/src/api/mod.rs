//! Backend API
//!
//! REST client over `gloo-net` and the Mapbox place search.

mod client;

pub use client::*;
