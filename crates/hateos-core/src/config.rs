//! Configuration for a hypermedia server.
//!
//! All configuration is driven by environment variables.

use hateos_codec::MediaType;

use crate::ConfigError;

/// Server and router configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HateosConfig {
    /// Bind address.
    pub listen: String,
    /// Base path every resource URL starts with.
    pub base_path: String,
    /// `json` or `xml`.
    pub media_type: String,
    /// Log level.
    pub log_level: String,
}

impl Default for HateosConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_owned(),
            base_path: "/api".to_owned(),
            media_type: "json".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl HateosConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("HATEOS_LISTEN") {
            config.listen = v;
        }
        if let Some(v) = lookup("HATEOS_BASE_PATH") {
            if v.starts_with('/') {
                config.base_path = v;
            } else {
                tracing::warn!(base_path = %v, "HATEOS_BASE_PATH must start with '/', using default");
            }
        }
        if let Some(v) = lookup("HATEOS_MEDIA_TYPE") {
            config.media_type = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The configured media type.
    pub fn media_type(&self) -> Result<MediaType, ConfigError> {
        self.media_type
            .parse()
            .map_err(|_| ConfigError::UnsupportedMediaType(self.media_type.clone()))
    }
}
