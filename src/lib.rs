//! Polymind is a terminal chat client that talks to one hosted generation
//! service through a fixed catalog of personas.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the persona catalog, the conversation state machine, the
//!   streaming transport, configuration, and the interactive app state.
//! - [`ui`] renders the terminal interface and runs the event loop.
//! - [`api`] defines the request and response payloads of the service.
//! - [`cli`] parses arguments and dispatches to the chat screen or one-shot
//!   commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
