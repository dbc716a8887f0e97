use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default location of the optional config file
pub const DEFAULT_CONFIG_FILE: &str = "rapport.toml";

/// Deployment environment. Development responses include diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("db").join("db.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Pre-shared token expected in the `Authorization` header
    pub token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: "Password123".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub environment: Environment,
}

impl AppConfig {
    /// Load defaults, then `path` if it exists, then `RAPPORT_` environment
    /// variables (`__` separates nesting) and finally `PORT`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::figment(path)
            .extract()
            .context("Failed to load configuration")
    }

    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed("RAPPORT_").split("__").ignore(&["config"]))
            .merge(Env::raw().only(&["port"]).map(|_| "server.port".into()))
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn uses_memory_database(&self) -> bool {
        self.database.path.as_os_str() == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("db/db.sqlite3"));
        assert_eq!(config.auth.token, "Password123");
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.is_development());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        Jail::expect_with(|jail| {
            let missing = jail.directory().join("missing.toml");
            let config: AppConfig = AppConfig::figment(&missing).extract()?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "rapport.toml",
                r#"
                environment = "development"

                [server]
                port = 8080

                [auth]
                token = "from-file"
                "#,
            )?;

            let config: AppConfig = AppConfig::figment(Path::new("rapport.toml")).extract()?;
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.auth.token, "from-file");
            assert!(config.is_development());
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("rapport.toml", "[auth]\ntoken = \"from-file\"\n")?;
            jail.set_env("RAPPORT_AUTH__TOKEN", "from-env");
            jail.set_env("RAPPORT_DATABASE__PATH", ":memory:");

            let config: AppConfig = AppConfig::figment(Path::new("rapport.toml")).extract()?;
            assert_eq!(config.auth.token, "from-env");
            assert!(config.uses_memory_database());
            Ok(())
        });
    }

    #[test]
    fn bare_port_variable_sets_server_port() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "4321");
            let config: AppConfig = AppConfig::figment(Path::new("rapport.toml")).extract()?;
            assert_eq!(config.server.port, 4321);
            Ok(())
        });
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
        };
        assert_eq!(server.socket_addr().unwrap().to_string(), "127.0.0.1:9000");

        let bad = ServerConfig {
            host: "not a host".to_string(),
            port: 1,
        };
        assert!(bad.socket_addr().is_err());
    }
}
