pub mod color;
pub mod logging;
pub mod scroll;
pub mod url;
