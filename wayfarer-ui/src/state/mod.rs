//! State Management
//!
//! Global application state and the per-view chat channel.

pub mod chat;
pub mod global;

pub use chat::ChatChannel;
pub use global::use_global_state;

use std::cell::Cell;
use std::rc::Rc;

/// Flag cleared when the calling component unmounts
///
/// Async results check it before touching signals, so responses that land
/// after navigation are dropped.
pub fn mounted_flag() -> Rc<Cell<bool>> {
    let mounted = Rc::new(Cell::new(true));
    let flag = Rc::clone(&mounted);
    leptos::on_cleanup(move || flag.set(false));
    mounted
}
