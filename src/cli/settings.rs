//! Handlers for `polymind set` / `polymind unset`.

use std::collections::HashMap;
use std::fmt;

use crate::core::config::Config;
use crate::core::persona::{PersonaId, UnknownPersona};

#[derive(Debug)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    UnknownPersona(UnknownPersona),
    /// Required arguments are missing.
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            other => eprintln!("❌ {other}"),
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => {
                let registry = SettingRegistry::new();
                write!(
                    f,
                    "Unknown config key: {key}. Known keys: {}",
                    registry.keys().join(", ")
                )
            }
            SettingError::UnknownPersona(err) => write!(f, "{err}"),
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
        }
    }
}

impl std::error::Error for SettingError {}

impl From<UnknownPersona> for SettingError {
    fn from(err: UnknownPersona) -> Self {
        SettingError::UnknownPersona(err)
    }
}

pub trait SettingHandler: Send + Sync {
    fn key(&self) -> &'static str;

    /// Apply `value` to `config`, returning a confirmation message.
    fn set(&self, value: Option<&str>, config: &mut Config) -> Result<String, SettingError>;

    fn unset(&self, config: &mut Config) -> String;

    /// Current value for display in `polymind set` output.
    fn format(&self, config: &Config) -> String;
}

struct DefaultPersonaHandler;

impl SettingHandler for DefaultPersonaHandler {
    fn key(&self) -> &'static str {
        "default-persona"
    }

    fn set(&self, value: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        let value = value.ok_or(SettingError::MissingArgs {
            hint: "Specify a persona id.",
            example: "polymind set default-persona grok",
        })?;
        let persona: PersonaId = value.parse()?;
        config.set_default_persona(persona);
        Ok(format!(
            "Set default-persona to: {} ({})",
            persona,
            persona.config().label
        ))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.unset_default_persona();
        format!("Unset default-persona (falls back to {})", PersonaId::default())
    }

    fn format(&self, config: &Config) -> String {
        match config.default_persona.as_deref() {
            Some(persona) => format!("  default-persona: {persona}"),
            None => format!("  default-persona: (unset, using {})", PersonaId::default()),
        }
    }
}

struct BaseUrlHandler;

impl SettingHandler for BaseUrlHandler {
    fn key(&self) -> &'static str {
        "base-url"
    }

    fn set(&self, value: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
        let value = value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SettingError::MissingArgs {
                hint: "Specify the service base URL.",
                example: "polymind set base-url http://localhost:8080/v1beta",
            })?;
        config.base_url = Some(value.to_string());
        Ok(format!("Set base-url to: {value}"))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.base_url = None;
        "Unset base-url".to_string()
    }

    fn format(&self, config: &Config) -> String {
        match config.base_url.as_deref() {
            Some(url) => format!("  base-url: {url}"),
            None => "  base-url: (unset)".to_string(),
        }
    }
}

pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `polymind set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };
        registry.register(Box::new(DefaultPersonaHandler));
        registry.register(Box::new(BaseUrlHandler));
        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    pub fn keys(&self) -> &[&'static str] {
        &self.display_order
    }

    pub fn set(
        &self,
        key: &str,
        value: Option<&str>,
        config: &mut Config,
    ) -> Result<String, SettingError> {
        let handler = self
            .get(key)
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
        handler.set(value, config)
    }

    pub fn unset(&self, key: &str, config: &mut Config) -> Result<String, SettingError> {
        let handler = self
            .get(key)
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
        Ok(handler.unset(config))
    }

    /// One line per key, in display order.
    pub fn format_all(&self, config: &Config) -> Vec<String> {
        self.display_order
            .iter()
            .filter_map(|key| self.get(key))
            .map(|handler| handler.format(config))
            .collect()
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
