//! Runtime configuration, read from environment variables.

use thiserror::Error;

use shipment_storage_core::{KEY_DELIMITER, SHIPMENT_TYPE_RESOURCE_NAME};

use crate::projections::DEFAULT_WRITE_CHUNK_SIZE;

pub const ENV_RESOURCE: &str = "SHIPMENT_TYPE_STORAGE_RESOURCE";
pub const ENV_CHUNK_SIZE: &str = "SHIPMENT_TYPE_STORAGE_CHUNK_SIZE";
pub const ENV_SYNC_QUEUE: &str = "SHIPMENT_TYPE_STORAGE_SYNC_QUEUE";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

pub const DEFAULT_SYNC_QUEUE_NAME: &str = "sync.storage.shipment_type";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got `{value}`")]
    InvalidChunkSize { name: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("resource name `{0}` must not contain `:`")]
    InvalidResourceName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentTypeStorageConfig {
    /// First segment of every storage key.
    pub resource_name: String,
    /// Shipment type ids fetched and written per round trip.
    pub write_chunk_size: usize,
    pub sync_queue_name: String,
    /// Unset: in-memory key/value store.
    pub redis_url: Option<String>,
    /// Unset: in-memory entity reader.
    pub database_url: Option<String>,
}

impl Default for ShipmentTypeStorageConfig {
    fn default() -> Self {
        Self {
            resource_name: SHIPMENT_TYPE_RESOURCE_NAME.to_string(),
            write_chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
            sync_queue_name: DEFAULT_SYNC_QUEUE_NAME.to_string(),
            redis_url: None,
            database_url: None,
        }
    }
}

impl ShipmentTypeStorageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let write_chunk_size = match var(ENV_CHUNK_SIZE) {
            None => defaults.write_chunk_size,
            Some(value) => match value.parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::InvalidChunkSize {
                        name: ENV_CHUNK_SIZE,
                        value,
                    });
                }
            },
        };

        Ok(Self {
            resource_name: var(ENV_RESOURCE).unwrap_or(defaults.resource_name),
            write_chunk_size,
            sync_queue_name: var(ENV_SYNC_QUEUE).unwrap_or(defaults.sync_queue_name),
            redis_url: var(ENV_REDIS_URL),
            database_url: var(ENV_DATABASE_URL),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resource_name.trim().is_empty() {
            return Err(ConfigError::Empty("resource_name"));
        }
        if self.resource_name.contains(KEY_DELIMITER) {
            return Err(ConfigError::InvalidResourceName(self.resource_name.clone()));
        }
        if self.sync_queue_name.trim().is_empty() {
            return Err(ConfigError::Empty("sync_queue_name"));
        }
        if self.write_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize {
                name: ENV_CHUNK_SIZE,
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ShipmentTypeStorageConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ShipmentTypeStorageConfig::default());
        assert_eq!(config.resource_name, "shipment_type");
        assert_eq!(config.write_chunk_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_every_variable() {
        let config = ShipmentTypeStorageConfig::from_lookup(lookup(&[
            (ENV_RESOURCE, "shipment_type_v2"),
            (ENV_CHUNK_SIZE, " 25 "),
            (ENV_SYNC_QUEUE, "sync.custom"),
            (ENV_REDIS_URL, "redis://localhost:6379"),
            (ENV_DATABASE_URL, "postgres://localhost/platform"),
        ]))
        .unwrap();

        assert_eq!(config.resource_name, "shipment_type_v2");
        assert_eq!(config.write_chunk_size, 25);
        assert_eq!(config.sync_queue_name, "sync.custom");
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/platform"));
    }

    #[test]
    fn rejects_zero_and_non_numeric_chunk_sizes() {
        for bad in ["0", "-1", "many"] {
            let err = ShipmentTypeStorageConfig::from_lookup(lookup(&[(ENV_CHUNK_SIZE, bad)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidChunkSize {
                    name: ENV_CHUNK_SIZE,
                    value: bad.to_string(),
                }
            );
        }
    }

    #[test]
    fn blank_urls_count_as_unset() {
        let config = ShipmentTypeStorageConfig::from_lookup(lookup(&[(ENV_REDIS_URL, "  ")])).unwrap();
        assert_eq!(config.redis_url, None);
    }

    #[test]
    fn resource_name_with_key_delimiter_is_rejected() {
        let config = ShipmentTypeStorageConfig::from_lookup(lookup(&[(ENV_RESOURCE, "shipment:type")])).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidResourceName("shipment:type".to_string()))
        );
    }
}
