//! Configuration system (layered: TOML file < `.env` < process environment).
//!
//! Everything is resolved once at startup into a read-only [`ParleyConfig`].
//! Validation failures are [`ParleyError::Configuration`] and stop the
//! process before it serves a single turn.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::engine::DEFAULT_PREAMBLE;
use crate::error::ParleyError;
use crate::tools::builtin::BuiltinSettings;
use crate::types::{AgentIdentity, GenerationSettings};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;
pub const DEFAULT_MAX_PASSES: usize = 20;
const DEFAULT_DELEGATION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_TOOL_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Whether and where to delegate requests the local agent cannot handle.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAgentConfig {
    pub enabled: bool,
    pub endpoint: Option<Url>,
    /// Request timeout for one delegation call.
    pub timeout: Duration,
    /// How many trailing user messages are forwarded.
    pub context_window: usize,
}

impl MultiAgentConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout: Duration::from_millis(DEFAULT_DELEGATION_TIMEOUT_MS),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    /// The peer endpoint, only when delegation is switched on.
    pub fn active_endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref().filter(|_| self.enabled)
    }
}

impl Default for MultiAgentConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Connection and sampling settings for the reasoning backend.
#[derive(Clone, PartialEq)]
pub struct ReasoningSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub generation: GenerationSettings,
}

impl fmt::Debug for ReasoningSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReasoningSettings")
            .field("api_key", &"..")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Per-turn bounds and the system preamble.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSettings {
    pub preamble: String,
    pub max_passes: usize,
    pub tool_timeout: Duration,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
            max_passes: DEFAULT_MAX_PASSES,
            tool_timeout: Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Fully resolved process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParleyConfig {
    /// Local agent identity stamped on every locally produced message.
    pub identity: AgentIdentity,
    /// Built-in tool keys, in configuration order.
    pub tools: Vec<String>,
    pub multi_agent: MultiAgentConfig,
    pub reasoning: ReasoningSettings,
    pub turn: TurnSettings,
    pub builtin: BuiltinSettings,
    pub server: ServerSettings,
}

impl ParleyConfig {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ParleyError> {
        Self::load(None)
    }

    /// Load with an optional TOML file as the lowest-precedence layer.
    pub fn load(file: Option<&Path>) -> Result<Self, ParleyError> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        let base = match file {
            Some(path) => ConfigLayer::from_toml_file(path)?,
            None => ConfigLayer::default(),
        };
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| base.get(key).map(str::to_string))
        })
    }

    /// Resolve every setting through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ParleyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| ParleyError::Configuration(format!("{key} is not set")))
        };

        let identity = AgentIdentity::local(required("NAME")?, required("DID")?);

        let tools = get("TOOLS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let enabled = get("AGENT_DISCOVERY_ENABLED")
            .map(|v| parse_bool("AGENT_DISCOVERY_ENABLED", &v))
            .transpose()?
            .unwrap_or(false);
        let endpoint = get("AGENT_DISCOVERY_ENDPOINT")
            .map(|v| parse_url("AGENT_DISCOVERY_ENDPOINT", &v))
            .transpose()?;
        if enabled && endpoint.is_none() {
            return Err(ParleyError::Configuration(
                "AGENT_DISCOVERY_ENABLED is true but AGENT_DISCOVERY_ENDPOINT is not set".into(),
            ));
        }
        let context_window = parse_or(&get, "AGENT_CONTEXT_WINDOW", DEFAULT_CONTEXT_WINDOW)?;
        if context_window == 0 {
            return Err(ParleyError::Configuration(
                "AGENT_CONTEXT_WINDOW must be at least 1".into(),
            ));
        }
        let multi_agent = MultiAgentConfig {
            enabled,
            endpoint,
            timeout: Duration::from_millis(parse_or(
                &get,
                "AGENT_DISCOVERY_TIMEOUT_MS",
                DEFAULT_DELEGATION_TIMEOUT_MS,
            )?),
            context_window,
        };

        let reasoning = ReasoningSettings {
            api_key: required("OPENAI_API_KEY")?,
            base_url: get("OPENAI_BASE_URL")
                .map(|v| parse_url("OPENAI_BASE_URL", &v).map(|_| v))
                .transpose()?,
            model: get("PARLEY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            generation: GenerationSettings::builder()
                .temperature(parse_or(&get, "PARLEY_TEMPERATURE", 0.0)?)
                .build(),
        };

        let max_passes = parse_or(&get, "PARLEY_MAX_PASSES", DEFAULT_MAX_PASSES)?;
        if max_passes == 0 {
            return Err(ParleyError::Configuration(
                "PARLEY_MAX_PASSES must be at least 1".into(),
            ));
        }
        let turn = TurnSettings {
            preamble: get("PARLEY_PREAMBLE").unwrap_or_else(|| DEFAULT_PREAMBLE.to_string()),
            max_passes,
            tool_timeout: Duration::from_millis(parse_or(
                &get,
                "PARLEY_TOOL_TIMEOUT_MS",
                DEFAULT_TOOL_TIMEOUT_MS,
            )?),
        };

        let defaults = BuiltinSettings::default();
        let builtin = BuiltinSettings {
            auth_endpoint: get("AUTH_ENDPOINT").unwrap_or(defaults.auth_endpoint),
            auth_redirect_url: get("AUTH_REDIRECT_URL").unwrap_or(defaults.auth_redirect_url),
        };

        let server = ServerSettings {
            host: get("PARLEY_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&get, "PARLEY_PORT", DEFAULT_PORT)?,
        };

        Ok(Self {
            identity,
            tools,
            multi_agent,
            reasoning,
            turn,
            builtin,
            server,
        })
    }
}

/// A flat key/value layer read from a TOML file.
///
/// Keys are matched case-insensitively against the environment variable
/// names, so `agent_context_window = 5` sets `AGENT_CONTEXT_WINDOW`. Arrays
/// of strings are joined with commas (`tools = ["wallet", "gmail"]`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigLayer {
    values: HashMap<String, String>,
}

impl ConfigLayer {
    pub fn from_toml_file(path: &Path) -> Result<Self, ParleyError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ParleyError::Configuration(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ParleyError> {
        let table: toml::Table = toml::from_str(text)
            .map_err(|e| ParleyError::Configuration(format!("invalid config file: {e}")))?;

        let mut values = HashMap::with_capacity(table.len());
        for (key, value) in table {
            let rendered = render_value(&key, value)?;
            values.insert(key.to_ascii_uppercase(), rendered);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

fn render_value(key: &str, value: toml::Value) -> Result<String, ParleyError> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                toml::Value::String(s) => Ok(s),
                other => Err(ParleyError::Configuration(format!(
                    "'{key}' must be a list of strings, found {}",
                    other.type_str()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|items| items.join(",")),
        other => Err(ParleyError::Configuration(format!(
            "unsupported value for '{key}': {}",
            other.type_str()
        ))),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ParleyError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ParleyError::Configuration(format!(
            "{key} must be true or false, got '{value}'"
        ))),
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ParleyError> {
    Url::parse(value)
        .map_err(|e| ParleyError::Configuration(format!("{key} is not a valid URL ('{value}'): {e}")))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ParleyError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| ParleyError::Configuration(format!("{key} has invalid value '{raw}': {e}"))),
        None => Ok(default),
    }
}
