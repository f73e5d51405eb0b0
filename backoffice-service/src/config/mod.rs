use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct BackofficeConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
}

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown STORE_BACKEND '{}'. Must be one of: mongo, memory",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl BackofficeConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        if let Ok(endpoint) = env::var("OTLP_ENDPOINT") {
            common_config.otlp_endpoint = Some(endpoint);
        }

        let store: StoreBackend = get_env("STORE_BACKEND", Some("mongo"), false)?.parse()?;
        if is_prod && store == StoreBackend::Memory {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STORE_BACKEND=memory is not allowed in production"
            )));
        }

        // Mongo settings are only mandatory when Mongo is the backend.
        let mongo_required = is_prod && store == StoreBackend::Mongo;

        Ok(BackofficeConfig {
            common: common_config,
            store,
            mongodb: MongoConfig {
                uri: get_env(
                    "MONGODB_URI",
                    Some("mongodb://localhost:27017"),
                    mongo_required,
                )?,
                database: get_env("MONGODB_DATABASE", Some("backoffice_db"), mongo_required)?,
            },
        })
    }

    /// Configuration for tests and local runs: in-memory store on a random port.
    pub fn in_memory() -> Self {
        BackofficeConfig {
            common: core_config::Config {
                port: 0,
                ..Default::default()
            },
            store: StoreBackend::Memory,
            mongodb: MongoConfig {
                uri: String::new(),
                database: String::new(),
            },
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_known_names() {
        assert_eq!("mongo".parse::<StoreBackend>().unwrap(), StoreBackend::Mongo);
        assert_eq!("MongoDB".parse::<StoreBackend>().unwrap(), StoreBackend::Mongo);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn in_memory_config_binds_random_port() {
        let config = BackofficeConfig::in_memory();
        assert_eq!(config.common.port, 0);
        assert_eq!(config.store, StoreBackend::Memory);
    }
}
