//! Error types for router construction, configuration and handlers.

use hateos_model::{HateosError, ResourceName};

/// Failures while assembling a [`HateosRouter`](crate::HateosRouter).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Two mappings share a resource name.
    #[error("duplicate resource name \"{0}\"")]
    DuplicateResourceName(ResourceName),

    /// Two mappings share a resource type, so links would be ambiguous.
    #[error("resource type {type_name} is mapped by both \"{first}\" and \"{second}\"")]
    DuplicateResourceType {
        /// The Rust type name.
        type_name: &'static str,
        /// The first mapping.
        first: ResourceName,
        /// The second mapping.
        second: ResourceName,
    },

    /// The base path is not absolute or contains `.`/`..` segments.
    #[error("invalid base path \"{0}\"")]
    InvalidBasePath(String),
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `HATEOS_MEDIA_TYPE` is not `json` or `xml`.
    #[error("unsupported media type \"{0}\"")]
    UnsupportedMediaType(String),
}

/// What a handler can report besides a result.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The handler does not support this selection shape. Answered with 501.
    #[error("{}", .0.as_deref().unwrap_or("Not Implemented"))]
    Unsupported(Option<String>),

    /// Anything else. Answered with 500 and the first line of the message.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl HandlerError {
    /// Unsupported with the default message.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::Unsupported(None)
    }

    /// Unsupported with a client-visible message.
    #[must_use]
    pub fn unsupported_with(message: impl Into<String>) -> Self {
        Self::Unsupported(Some(message.into()))
    }
}

impl From<HandlerError> for HateosError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Unsupported(message) => Self::not_implemented(message),
            HandlerError::Failed(err) => {
                tracing::error!(error = ?err, "resource handler failed");
                Self::internal(&err.to_string())
            }
        }
    }
}
