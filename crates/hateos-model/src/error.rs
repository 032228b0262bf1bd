//! Error types for the dispatch model.
//!
//! [`ModelError`] covers value-object validation. [`HateosError`] is the
//! HTTP-facing error produced by every dispatch step: it carries the status
//! code, the client-visible message and any extra response headers.

use std::fmt;

use http::header::{ALLOW, HeaderMap, HeaderValue};
use http::StatusCode;

use crate::HttpMethod;

/// Validation failures for the value objects in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The text is not a valid resource name.
    #[error("Invalid resource name \"{0}\"")]
    InvalidResourceName(String),

    /// The text is neither a relation token nor an absolute URL.
    #[error("Invalid link relation \"{0}\"")]
    InvalidLinkRelation(String),

    /// The text is not an uppercase method token.
    #[error("Invalid http method \"{0}\"")]
    InvalidHttpMethod(String),

    /// A range was built from bounds this engine cannot express.
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),
}

/// A dispatch failure that maps directly onto an HTTP response.
#[derive(Debug)]
pub struct HateosError {
    /// The response status.
    pub status: StatusCode,
    /// The client-visible message.
    pub message: String,
    /// Extra headers for the response (e.g. `Allow` on 405).
    pub headers: HeaderMap,
    /// The underlying source error, if any. Never shown to clients.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for HateosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HateosError({}): {}", self.status, self.message)
    }
}

impl std::error::Error for HateosError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl HateosError {
    /// Create an error with the given status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            headers: HeaderMap::new(),
            source: None,
        }
    }

    /// Create an error whose message is the status' canonical reason.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or_default())
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // -- Convenience constructors --

    /// 400 with the given message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 with the given message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 405 with an `Allow` header listing `allowed` in ascending order.
    #[must_use]
    pub fn method_not_allowed<'a>(
        message: impl Into<String>,
        allowed: impl IntoIterator<Item = &'a HttpMethod>,
    ) -> Self {
        let mut allowed: Vec<&HttpMethod> = allowed.into_iter().collect();
        allowed.sort();
        allowed.dedup();
        let allow = allowed
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut err = Self::new(StatusCode::METHOD_NOT_ALLOWED, message);
        if let Ok(hv) = HeaderValue::from_str(&allow) {
            err.headers.insert(ALLOW, hv);
        }
        err
    }

    /// 411 with the canonical reason as message.
    #[must_use]
    pub fn length_required() -> Self {
        Self::from_status(StatusCode::LENGTH_REQUIRED)
    }

    /// 501 with the handler supplied detail, or the canonical reason.
    #[must_use]
    pub fn not_implemented(message: Option<String>) -> Self {
        match message {
            Some(message) => Self::new(StatusCode::NOT_IMPLEMENTED, message),
            None => Self::from_status(StatusCode::NOT_IMPLEMENTED),
        }
    }

    /// 500 with only the first line of `message`, or the canonical reason
    /// when that line is blank.
    #[must_use]
    pub fn internal(message: &str) -> Self {
        match message.lines().next() {
            Some(line) if !line.trim().is_empty() => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, line)
            }
            _ => Self::from_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<ModelError> for HateosError {
    fn from(err: ModelError) -> Self {
        Self::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_sort_allow_header() {
        let err = HateosError::method_not_allowed(
            "DELETE resource: a",
            [&HttpMethod::POST, &HttpMethod::GET, &HttpMethod::POST],
        );
        assert_eq!(err.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.headers.get(ALLOW).unwrap(), "GET, POST");
    }

    #[test]
    fn test_should_keep_first_line_of_internal_message() {
        let err = HateosError::internal("boom\nat frame 1\nat frame 2");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_should_fall_back_to_reason_for_blank_internal_message() {
        assert_eq!(HateosError::internal("\nat frame 1").message, "Internal Server Error");
        assert_eq!(HateosError::internal("").message, "Internal Server Error");
        assert_eq!(HateosError::internal("  \nboom").message, "Internal Server Error");
    }

    #[test]
    fn test_should_default_not_implemented_message() {
        assert_eq!(HateosError::not_implemented(None).message, "Not Implemented");
        assert_eq!(
            HateosError::not_implemented(Some("no ranges".to_owned())).message,
            "no ranges"
        );
    }

    #[test]
    fn test_should_convert_model_error_to_bad_request() {
        let err: HateosError = ModelError::InvalidResourceName("9x".to_owned()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid resource name \"9x\"");
    }
}
