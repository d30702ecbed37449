//! This module provides functionality for loading and handling the application's configuration.
//!
//! It defines the `SqlSeerConfig` struct, which holds the configuration parameters,
//! and a `load_config` function to load the configuration from a YAML file.
//!
//! # Examples
//!
//! Loading the configuration from a file:
//!
//! ```no_run
//! use sqlseer::config::{SqlSeerConfig, load_config};
//!
//! let config: SqlSeerConfig = load_config("/path/to/config.yaml").unwrap();
//! println!("{:?}", config);
//! ```

use std::{fs, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_top_k() -> usize {
    1
}

fn default_max_tokens() -> u32 {
    512
}

/// Represents the application's configuration.
///
/// Holds everything needed to run the pipeline: where the generation backend
/// lives, which model to ask for, where the exported schema description is,
/// and the request-shaping knobs.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SqlSeerConfig {
    /// The base URL of the OpenAI-compatible generation backend
    /// (e.g. `http://localhost:11434/v1` for Ollama).
    pub api_base: String,

    /// The API key used to authenticate requests. Local backends usually
    /// accept any value.
    pub api_key: String,

    /// The name of the model used for SQL generation.
    pub model: String,

    /// Path to the exported schema description JSON.
    pub schema_path: String,

    /// Completion token cap for a single generation call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request wall clock limit on the generation call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How many primary table matches to retrieve. The main pipeline always
    /// expands from the top-1; values above 1 only widen `retrieve` output.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl SqlSeerConfig {
    /// The generation timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Loads the application's configuration from a YAML file.
///
/// # Errors
///
/// Fails if the file cannot be read or the YAML does not match
/// [`SqlSeerConfig`].
pub fn load_config(file: &str) -> Result<SqlSeerConfig> {
    debug!("loading config from {file}");
    let content = fs::read_to_string(file)?;
    let config: SqlSeerConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}
