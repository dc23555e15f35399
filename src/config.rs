//! Model API configuration loaded from a `.env` file.
//!
//! The configuration is built once at startup and handed to the client that
//! needs it; nothing here touches process-wide state. Values in the `.env`
//! file take precedence over the process environment, which only fills in
//! keys the file does not define.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const API_BASE_VAR: &str = "OPENAI_API_BASE";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const TIMEOUT_VAR: &str = "OPENAI_TIMEOUT";

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Default model; must support JSON response mode.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";

const ENV_FILE: &str = ".env";
const ENV_EXAMPLE_FILE: &str = ".env.example";

/// Settings for the chat completions API.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: SecretString,
    pub api_base: String,
    pub model: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Config {
    /// Load `<root>/.env`, falling back to the process environment for keys
    /// the file does not set.
    ///
    /// A missing `.env` is only fatal when the process environment does not
    /// provide `OPENAI_API_KEY` either.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let env_path = root.join(ENV_FILE);
        debug!("Looking for config file at {}", env_path.display());

        if !env_path.exists() {
            if env::var(API_KEY_VAR).is_ok_and(|v| !v.trim().is_empty()) {
                info!("No .env file found, using process environment");
                return Self::from_lookup(|key| env::var(key).ok());
            }
            return Err(if root.join(ENV_EXAMPLE_FILE).exists() {
                ConfigError::MissingEnvFileWithExample { path: env_path }
            } else {
                ConfigError::MissingEnvFile { path: env_path }
            });
        }

        let vars = read_env_file(&env_path)?;
        info!("Loaded configuration from {}", env_path.display());
        Self::from_lookup(|key| vars.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    /// Build a configuration from a `.env` file alone.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let vars = read_env_file(path)?;
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;

        let api_base = non_empty(API_BASE_VAR)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let model = non_empty(MODEL_VAR)
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout = match non_empty(TIMEOUT_VAR) {
            Some(v) => {
                let secs = v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: TIMEOUT_VAR,
                    value: v.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        info!("Using API base URL: {}", api_base);
        debug!("Using model: {}", model);

        Ok(Config {
            api_key: SecretString::from(api_key),
            api_base,
            model,
            timeout,
        })
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let read_failed = |source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(read_failed)? {
        let (key, value) = item.map_err(read_failed)?;
        vars.insert(key, value);
    }
    Ok(vars)
}
