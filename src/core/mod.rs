pub mod app;
pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod persona;
pub mod text_wrapping;
