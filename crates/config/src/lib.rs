//! Configuration loading for omnifind.
//!
//! A config document is a map of named backends:
//!
//! ```toml
//! [backends.archive]
//! type = "s3"
//! region = "us-west-004"
//! endpoint = "https://s3.us-west-004.backblazeb2.com"
//! key_id = "..."
//! key_secret = "..."
//! buckets = ["archive", "uploads"]
//!
//! [backends.shared]
//! type = "box"
//! folders = "/;Projects"
//! page_size = 500
//! ```
//!
//! Any value can be overridden from the environment, with `__` separating
//! nesting levels: `OMNIFIND_BACKENDS__ARCHIVE__KEY_SECRET=...`.

mod backend;
pub mod error;

pub use crate::backend::{BackendConfig, BoxConfig, S3Config, ScopeList};
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix of environment variables merged over the config file.
pub const ENV_PREFIX: &str = "OMNIFIND_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
}

impl Config {
    /// Load and validate the config file at `path`, with environment
    /// overrides merged on top. The format is picked from the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Figment::from(Toml::file(path)),
            Some("yaml" | "yml") => Figment::from(Yaml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), "Loading configuration");
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load from the default location (see [`default_path`](Self::default_path)).
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => exn::bail!(ErrorKind::NotFound(PathBuf::from("config.toml"))),
        }
    }

    /// Extract and validate a config from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Malformed)?;
        config.validate()?;
        tracing::debug!(backends = config.backends.len(), "Loaded configuration");
        Ok(config)
    }

    /// Check every backend's scope is usable.
    pub fn validate(&self) -> Result<()> {
        for (name, backend) in &self.backends {
            backend.validate().map_err(|err| err.raise(ErrorKind::InvalidBackend(name.clone())))?;
        }
        Ok(())
    }

    /// `config.toml` in the platform's config directory for omnifind.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "omnifind").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
