//! Main chat event loop and UI rendering
//!
//! Terminal input and stream output both arrive over channels; the loop
//! applies them to the [`App`](crate::core::app::App) it owns and redraws.

mod event_loop;
mod keybindings;
mod lifecycle;

pub use event_loop::run_chat;
