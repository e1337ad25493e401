//! Server configuration file.
//!
//! ```toml
//! [keys.release]
//! algorithm = "secp256k1"
//! seed_env = "RELEASE_KEY_SEED"
//! roles = ["release"]
//!
//! [clients.builder]
//! token = "s3cret"
//! roles = ["release"]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid key '{0}': {1}")]
    InvalidKey(String, String),
    #[error("Invalid client '{0}': {1}")]
    InvalidClient(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Secp256k1,
    Rsa,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    pub algorithm: KeyAlgorithm,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub seed_env: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub token: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub keys: BTreeMap<String, KeyConfig>,
    #[serde(default)]
    pub clients: BTreeMap<String, ClientConfig>,
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, key) in &self.keys {
            match (&key.seed, &key.seed_env) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(ConfigError::InvalidKey(
                        name.clone(),
                        "exactly one of 'seed' or 'seed_env' must be set".into(),
                    ));
                }
            }
        }

        let mut tokens = HashSet::new();
        for (name, client) in &self.clients {
            if client.token.is_empty() {
                return Err(ConfigError::InvalidClient(name.clone(), "empty token".into()));
            }
            if !tokens.insert(client.token.as_str()) {
                return Err(ConfigError::InvalidClient(
                    name.clone(),
                    "token is shared with another client".into(),
                ));
            }
        }
        Ok(())
    }
}
