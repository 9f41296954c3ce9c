// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::DEFAULT_PREDICTIONS_PATH;
use crate::telemetry::DEFAULT_QUEUE_CAPACITY;

pub const ENV_CONFIG_PATH: &str = "NEWS_EXEMPLAR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

pub const ENV_PREDICTIONS_PATH: &str = "PREDICTIONS_PATH";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_TELEMETRY_DB_PATH: &str = "TELEMETRY_DB_PATH";
pub const ENV_TELEMETRY_QUEUE_CAPACITY: &str = "TELEMETRY_QUEUE_CAPACITY";
pub const ENV_METRICS_ROUTES: &str = "METRICS_ROUTES";

fn default_predictions_path() -> PathBuf {
    PathBuf::from(DEFAULT_PREDICTIONS_PATH)
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_predictions_path")]
    pub predictions_path: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub metrics_routes: bool,
    /// Usage reporting is enabled only when this section (or `TELEMETRY_DB_PATH`) is present.
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TelemetryConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predictions_path: default_predictions_path(),
            static_dir: default_static_dir(),
            bind_addr: default_bind_addr(),
            metrics_routes: false,
            telemetry: None,
        }
    }
}

impl AppConfig {
    /// Load config using env var + fallbacks, then apply env overrides:
    /// 1) $NEWS_EXEMPLAR_CONFIG
    /// 2) config/app.toml
    /// 3) built-in defaults
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::from_file(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::from_file(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_nonempty(ENV_PREDICTIONS_PATH) {
            self.predictions_path = PathBuf::from(v);
        }
        if let Some(v) = env_nonempty(ENV_STATIC_DIR) {
            self.static_dir = PathBuf::from(v);
        }
        if let Some(v) = env_nonempty(ENV_BIND_ADDR) {
            self.bind_addr = v;
        }
        if let Some(v) = env_nonempty(ENV_METRICS_ROUTES) {
            self.metrics_routes = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Some(v) = env_nonempty(ENV_TELEMETRY_DB_PATH) {
            let queue_capacity = self
                .telemetry
                .as_ref()
                .map(|t| t.queue_capacity)
                .unwrap_or(DEFAULT_QUEUE_CAPACITY);
            self.telemetry = Some(TelemetryConfig {
                db_path: PathBuf::from(v),
                queue_capacity,
            });
        }
        if let Some(v) = env_nonempty(ENV_TELEMETRY_QUEUE_CAPACITY) {
            let cap = v
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{ENV_TELEMETRY_QUEUE_CAPACITY}={v} is not a number"))?;
            if let Some(t) = self.telemetry.as_mut() {
                t.queue_capacity = cap.max(1);
            }
        }
        Ok(())
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
