use std::env;

use crate::errors::ConfigError;

pub const DEFAULT_DATABASE: &str = "testdb";
pub const DEFAULT_COLLECTION: &str = "texts";
pub const DEFAULT_SERVICE_NAME: &str = "persistence-api";
pub const DEFAULT_FAULT_MARKER: &str = "go error";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub mongodb_collection: String,
    pub service_name: String,
    /// Save requests whose text contains this marker fail on purpose.
    /// `None` disables the check.
    pub fault_marker: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongodb_uri = lookup("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?;
        if mongodb_uri.trim().is_empty() {
            return Err(ConfigError::Empty {
                name: "MONGODB_URI",
            });
        }

        Ok(Self {
            mongodb_uri,
            mongodb_database: lookup("MONGODB_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            mongodb_collection: lookup("MONGODB_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            service_name: lookup("SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            fault_marker: match lookup("FAULT_MARKER") {
                Some(marker) if marker.is_empty() => None,
                Some(marker) => Some(marker),
                None => Some(DEFAULT_FAULT_MARKER.to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("MONGODB_URI", "mongodb://localhost:27017")]))
                .unwrap();
        assert_eq!(config.mongodb_database, "testdb");
        assert_eq!(config.mongodb_collection, "texts");
        assert_eq!(config.service_name, "persistence-api");
        assert_eq!(config.fault_marker.as_deref(), Some("go error"));
    }

    #[test]
    fn test_missing_uri_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MONGODB_URI")));

        let err = AppConfig::from_lookup(lookup_from(&[("MONGODB_URI", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { .. }));
    }

    #[test]
    fn test_empty_fault_marker_disables_it() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("FAULT_MARKER", ""),
            ("MONGODB_DATABASE", "prod"),
        ]))
        .unwrap();
        assert!(config.fault_marker.is_none());
        assert_eq!(config.mongodb_database, "prod");
    }
}
