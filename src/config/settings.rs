use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Process-level settings: provider endpoints, network bounds, logging.
/// Loaded from `config/{CONFIG_ENV}.toml` (optional) with an `APP__`
/// environment overlay. Per-tool limits live in the tool definition, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub providers: ProvidersConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderEndpoint,
    pub anthropic: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderEndpoint {
                base_url: "https://api.openai.com".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
            },
            anthropic: ProviderEndpoint {
                base_url: "https://api.anthropic.com".to_string(),
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoint {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Hard per-call network timeout. The per-invocation wall-clock ceiling
    /// is enforced separately by the safety enforcer.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Resolve an API key from the configured environment variable.
    pub fn resolve_api_key(endpoint: &ProviderEndpoint) -> Option<String> {
        let name = endpoint.api_key_env.trim();
        if name.is_empty() {
            return None;
        }
        match env::var(name) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => {
                tracing::warn!(env_var = name, "API key environment variable is not set");
                None
            }
        }
    }
}
