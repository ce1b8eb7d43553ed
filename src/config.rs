//! Service configuration, read once at startup from a TOML file.
//!
//! The file is looked up at `$DEVCONNECTOR_CONFIG`, falling back to
//! `config/default.toml`. Every section and key has a default except
//! `auth.jwt_secret`, which must be set. `$PORT` overrides `server.port`.

use std::{env, fs, path::{Path, PathBuf}};

use serde::Deserialize;

pub const CONFIG_ENV: &str = "DEVCONNECTOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the document store.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("store")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    /// How long an issued token stays valid.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: default_token_lifetime(),
        }
    }
}

const fn default_token_lifetime() -> u64 {
    360_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_api")]
    pub api_url: String,
    /// OAuth app credentials; raise the upstream rate limit when set.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api(),
            client_id: None,
            client_secret: None,
            timeout_secs: default_github_timeout(),
        }
    }
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

const fn default_github_timeout() -> u64 {
    10
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid $PORT value {0:?}")]
    Port(String),
    #[error("auth.jwt_secret must not be empty")]
    MissingSecret,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        if config.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Loads the file named by the environment and applies `$PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(Path::new(&path))?;
        if let Ok(port) = env::var(PORT_ENV) {
            config.server.port = port.parse().map_err(|_| ConfigError::Port(port))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_gets_defaults() {
        let config = Config::parse("[auth]\njwt_secret = \"s3cret\"\n").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.store.path, PathBuf::from("store"));
        assert_eq!(config.auth.token_lifetime_secs, 360_000);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.client_id, None);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(r#"
            [server]
            port = 8080
            [store]
            path = "/var/lib/devconnector"
            [auth]
            jwt_secret = "x"
            token_lifetime_secs = 3600
            [github]
            client_id = "id"
            client_secret = "secret"
            timeout_secs = 3
        "#).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.path, PathBuf::from("/var/lib/devconnector"));
        assert_eq!(config.auth.token_lifetime_secs, 3600);
        assert_eq!(config.github.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.github.timeout_secs, 3);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(Config::parse(""), Err(ConfigError::MissingSecret)));
        assert!(matches!(Config::parse("[server]\nport = \"x\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        assert!(Config::load(&path).is_ok());
    }
}
