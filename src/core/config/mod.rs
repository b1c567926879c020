pub mod data;
pub mod io;


pub use data::{path_display, Config, BASE_URL_ENV_VAR};
pub use io::ConfigError;
