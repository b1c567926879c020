use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::chat_stream::DEFAULT_BASE_URL;
use crate::core::persona::{PersonaId, UnknownPersona};

/// Environment override for the service base URL.
pub const BASE_URL_ENV_VAR: &str = "POLYMIND_BASE_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Persona selected at startup when `--persona` is not given (e.g. "grok")
    pub default_persona: Option<String>,
    /// Base URL of the generation service
    pub base_url: Option<String>,
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// Pick the startup persona. An explicit CLI choice must be valid; a
    /// stale value in the config file only earns a warning.
    pub fn resolve_persona(&self, cli_choice: Option<&str>) -> Result<PersonaId, UnknownPersona> {
        if let Some(choice) = cli_choice {
            return choice.parse();
        }

        match self.default_persona.as_deref() {
            Some(configured) => configured.parse().or_else(|err: UnknownPersona| {
                warn!("ignoring configured default persona: {err}");
                Ok(PersonaId::default())
            }),
            None => Ok(PersonaId::default()),
        }
    }

    /// Base URL by precedence: CLI flag, environment, config file, built-in default.
    pub fn resolve_base_url(&self, cli_choice: Option<&str>) -> String {
        let from_env = std::env::var(BASE_URL_ENV_VAR).ok();
        self.resolve_base_url_with(cli_choice, from_env.as_deref())
    }

    pub(crate) fn resolve_base_url_with(
        &self,
        cli_choice: Option<&str>,
        from_env: Option<&str>,
    ) -> String {
        [cli_choice, from_env, self.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn set_default_persona(&mut self, persona: PersonaId) {
        self.default_persona = Some(persona.as_str().to_string());
    }

    pub fn unset_default_persona(&mut self) {
        self.default_persona = None;
    }
}
