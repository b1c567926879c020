//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod persona_list;
pub mod say;
pub mod settings;


use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use crate::cli::persona_list::list_personas;
use crate::cli::say::run_say;
use crate::cli::settings::SettingRegistry;
use crate::core::config::{path_display, Config};
use crate::core::persona::PersonaId;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_tracing, LogTarget};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_DESCRIBE"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")\nbuilt: ",
    env!("VERGEN_BUILD_TIMESTAMP"),
);

#[derive(Parser)]
#[command(name = "polymind", version, long_version = LONG_VERSION)]
#[command(about = "A terminal chat with a catalog of AI personas")]
#[command(
    long_about = "Polymind is a full-screen terminal chat. Every persona talks to the same \
hosted generation service with its own system instruction and model, and replies stream \
into the transcript as they are generated.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY     API key for the generation service (API_KEY is also accepted)\n\
  POLYMIND_BASE_URL  Custom service base URL (optional)\n\
  RUST_LOG           Log filter for --log-file / stderr diagnostics\n\n\
Controls:\n\
  Enter              Send the message\n\
  Alt+Enter          Insert a new line\n\
  Ctrl+P / F2        Choose a persona\n\
  Up/Down, PgUp/PgDn Scroll the transcript\n\
  Ctrl+C             Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Persona to chat with (see `polymind personas`)
    #[arg(short = 'p', long, global = true, value_name = "PERSONA")]
    pub persona: Option<String>,

    /// Base URL of the generation service
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt and stream the reply to stdout
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List available personas
    Personas,
    /// Set configuration values, or show them when no key is given
    Set {
        /// Configuration key to set (default-persona, base-url)
        key: Option<String>,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);

    init_tracing(log_target(args.log_file.as_deref(), &command))?;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("config load failed: {e}");
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    match command {
        Commands::Chat => {
            let persona = resolve_persona_or_exit(&config, args.persona.as_deref());
            let base_url = config.resolve_base_url(args.base_url.as_deref());
            run_chat(persona, base_url).await
        }
        Commands::Say { prompt } => {
            let persona = resolve_persona_or_exit(&config, args.persona.as_deref());
            let base_url = config.resolve_base_url(args.base_url.as_deref());
            run_say(prompt, persona, base_url).await
        }
        Commands::Personas => list_personas(&config),
        Commands::Set { key, value } => {
            let registry = SettingRegistry::new();
            let Some(key) = key else {
                print_settings(&registry, &config);
                return Ok(());
            };
            let mut config = config;
            match registry.set(&key, value.as_deref(), &mut config) {
                Ok(message) => {
                    config.save()?;
                    println!("✅ {message}");
                    Ok(())
                }
                Err(err) => {
                    err.print();
                    std::process::exit(1);
                }
            }
        }
        Commands::Unset { key } => {
            let registry = SettingRegistry::new();
            let mut config = config;
            match registry.unset(&key, &mut config) {
                Ok(message) => {
                    config.save()?;
                    println!("✅ {message}");
                    Ok(())
                }
                Err(err) => {
                    err.print();
                    std::process::exit(1);
                }
            }
        }
    }
}

/// The chat screen owns the terminal, so it only logs to an explicit file.
fn log_target<'a>(log_file: Option<&'a std::path::Path>, command: &Commands) -> LogTarget<'a> {
    match (log_file, command) {
        (Some(path), _) => LogTarget::File(path),
        (None, Commands::Chat) => LogTarget::Disabled,
        (None, _) => LogTarget::Stderr,
    }
}

fn resolve_persona_or_exit(config: &Config, cli_choice: Option<&str>) -> PersonaId {
    match config.resolve_persona(cli_choice) {
        Ok(persona) => persona,
        Err(err) => {
            eprintln!("❌ {err}");
            eprintln!("   Run 'polymind personas' to see the catalog.");
            std::process::exit(1);
        }
    }
}

fn print_settings(registry: &SettingRegistry, config: &Config) {
    match Config::config_path() {
        Some(path) => println!("Current configuration ({}):", path_display(path)),
        None => println!("Current configuration:"),
    }
    for line in registry.format_all(config) {
        println!("{line}");
    }
}
