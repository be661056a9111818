use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadConfig {
    /// Default CSV file when the `load`/`run` subcommand gets no path argument.
    pub csv_path: Option<String>,
}

fn default_db_path() -> String {
    "claims.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self { csv_path: None }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            return Ok(Self {
                database: DatabaseConfig::default(),
                load: LoadConfig::default(),
            });
        }
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "/tmp/claims.db"

            [load]
            csv_path = "data/policies.csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, "/tmp/claims.db");
        assert_eq!(config.load.csv_path.as_deref(), Some("data/policies.csv"));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, "claims.db");
        assert!(config.load.csv_path.is_none());
    }
}
