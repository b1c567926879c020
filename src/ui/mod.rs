//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that turns key presses into app
//!   actions and applies stream output from [`crate::core::chat_stream`].
//! - [`renderer`] and [`picker`]: frame composition.
//! - [`theme`]: styles, including per-persona accents.
//!
//! This layer presents and captures interaction state; [`crate::core`] owns
//! the conversation and the transport.

pub mod chat_loop;
pub mod picker;
pub mod renderer;
pub mod theme;
