//! Shared configuration for Kasa plug tools.
//!
//! TOML plug profiles layered with environment overrides, and translation
//! to `kasa_core::PlugConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kasa_core::PlugConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no plug named '{name}' in config")]
    UnknownPlug { name: String },

    #[error("no plug selected and no default_plug configured")]
    NoPlugSelected,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Plug used when none is named explicitly.
    pub default_plug: Option<String>,

    /// Settings shared by every plug unless overridden.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named plugs.
    #[serde(default)]
    pub plugs: HashMap<String, Plug>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seed of the payload transform.
    #[serde(default = "default_initial_key")]
    pub initial_key: i64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            initial_key: default_initial_key(),
            timeout: default_timeout(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_port() -> u16 {
    9999
}
fn default_initial_key() -> i64 {
    171
}
fn default_timeout() -> u64 {
    10
}
fn default_connect_timeout_ms() -> u64 {
    5000
}

/// A named plug.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Plug {
    /// Hostname or IP address.
    pub address: String,

    /// Override the default port.
    pub port: Option<u16>,

    /// Override the transform seed.
    pub initial_key: Option<i64>,

    /// Override the per-request timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "kasa", "kasa").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("kasa");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error; defaults and `KASA_*` variables still
/// apply. Nested keys use `__`, e.g. `KASA_DEFAULTS__TIMEOUT=3`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KASA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Plug resolution ─────────────────────────────────────────────────

/// Pick the named plug, falling back to `default_plug`.
pub fn resolve_plug<'a>(
    cfg: &'a Config,
    name: Option<&'a str>,
) -> Result<(&'a str, &'a Plug), ConfigError> {
    let name = name
        .or(cfg.default_plug.as_deref())
        .ok_or(ConfigError::NoPlugSelected)?;
    let plug = cfg
        .plugs
        .get(name)
        .ok_or_else(|| ConfigError::UnknownPlug { name: name.into() })?;
    Ok((name, plug))
}

/// Build a `PlugConfig` from a plug entry and the shared defaults.
pub fn plug_to_config(plug: &Plug, defaults: &Defaults) -> Result<PlugConfig, ConfigError> {
    let host = plug.address.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "address".into(),
            reason: "must not be empty".into(),
        });
    }

    let timeout = plug.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    if defaults.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation {
            field: "connect_timeout_ms".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let config = PlugConfig {
        port: plug.port.unwrap_or(defaults.port),
        connect_timeout: Duration::from_millis(defaults.connect_timeout_ms),
        timeout: Duration::from_secs(timeout),
        ..PlugConfig::new(host)
    };
    Ok(config.with_seed(plug.initial_key.unwrap_or(defaults.initial_key)))
}

/// Resolve a plug by name (or the default) straight to a `PlugConfig`.
pub fn resolve_plug_config(cfg: &Config, name: Option<&str>) -> Result<PlugConfig, ConfigError> {
    let (_, plug) = resolve_plug(cfg, name)?;
    plug_to_config(plug, &cfg.defaults)
}
