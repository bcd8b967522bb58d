//! Service configuration, read from an optional TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    pub database: PathBuf,
    /// Key that signs session cookies. A random key is generated per
    /// process when unset, which logs everybody out on restart.
    pub session_secret: Option<String>,
    pub session_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub bootstrap: Option<Bootstrap>,
}

/// Superuser account created at startup when missing.
#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    pub username: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database: PathBuf::from("hospital.db"),
            session_secret: None,
            session_ttl_minutes: 8 * 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            bootstrap: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            anyhow::bail!("bcrypt_cost must be between 4 and 31, got {}", self.bcrypt_cost);
        }
        if self.session_ttl_minutes <= 0 {
            anyhow::bail!("session_ttl_minutes must be positive");
        }
        if let Some(bootstrap) = &self.bootstrap {
            if bootstrap.username.trim().is_empty() || bootstrap.password.is_empty() {
                anyhow::bail!("bootstrap username and password must not be empty");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.listen.port(), 5000);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.bootstrap.is_none());
    }

    #[test]
    fn values_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            listen = "0.0.0.0:8080"
            database = ":memory:"
            session_secret = "s3cret"
            bcrypt_cost = 4

            [bootstrap]
            username = "root"
            password = "root"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.database, PathBuf::from(":memory:"));
        assert_eq!(config.session_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.bootstrap.unwrap().username, "root");
    }

    #[test]
    fn out_of_range_cost_is_rejected() {
        assert!(Config::from_toml_str("bcrypt_cost = 2").is_err());
        assert!(Config::from_toml_str("session_ttl_minutes = 0").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/hospital.toml"))).is_err());
        assert!(Config::load(None).is_ok());
    }
}
