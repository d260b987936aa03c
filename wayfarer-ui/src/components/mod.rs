//! UI Components
//!
//! Reusable Leptos components shared by the pages.

pub mod chat_panel;
pub mod city_card;
pub mod loading;
pub mod nav;
pub mod rating_form;
pub mod toast;

pub use chat_panel::ChatPanel;
pub use city_card::CityCard;
pub use loading::{CityGridSkeleton, InlineLoading, ListSkeleton, Loading};
pub use nav::Nav;
pub use rating_form::RatingForm;
pub use toast::{InlineError, Toast};
