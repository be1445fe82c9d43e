use serde::Deserialize;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_PLAN_PATH: &str = "harmony.toml";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    #[serde(default)]
    pub ingress: Value,
    #[serde(default)]
    pub context: Vec<StepConfig>,
    #[serde(default)]
    pub serial: Vec<StepConfig>,
    #[serde(default)]
    pub parallel: Vec<StepConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub name: String,
    #[serde(default)]
    pub delay_ms: u64,
    pub output: Option<Value>,
    pub from_ingress: Option<String>,
    pub from_context: Option<String>,
    pub fail: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read plan at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse toml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub fn load_plan(path: impl AsRef<Path>) -> Result<PlanConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_plan(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_plan(contents: &str) -> Result<PlanConfig, toml::de::Error> {
    toml::from_str(contents)
}
