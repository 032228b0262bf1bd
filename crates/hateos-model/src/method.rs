//! Ordered HTTP method token.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// An HTTP method ordered by its text, so `Allow` headers and links sort
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpMethod(http::Method);

impl HttpMethod {
    /// `DELETE`
    pub const DELETE: Self = Self(http::Method::DELETE);
    /// `GET`
    pub const GET: Self = Self(http::Method::GET);
    /// `HEAD`
    pub const HEAD: Self = Self(http::Method::HEAD);
    /// `PATCH`
    pub const PATCH: Self = Self(http::Method::PATCH);
    /// `POST`
    pub const POST: Self = Self(http::Method::POST);
    /// `PUT`
    pub const PUT: Self = Self(http::Method::PUT);

    /// Parse an uppercase method token such as `GET` or `LOCK`.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let valid = !text.is_empty()
            && text
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
        if !valid {
            return Err(ModelError::InvalidHttpMethod(text.to_owned()));
        }
        http::Method::from_bytes(text.as_bytes())
            .map(Self)
            .map_err(|_| ModelError::InvalidHttpMethod(text.to_owned()))
    }

    /// The method text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The wrapped [`http::Method`].
    #[must_use]
    pub fn as_http(&self) -> &http::Method {
        &self.0
    }
}

impl From<http::Method> for HttpMethod {
    fn from(method: http::Method) -> Self {
        Self(method)
    }
}

impl From<&http::Method> for HttpMethod {
    fn from(method: &http::Method) -> Self {
        Self(method.clone())
    }
}

impl FromStr for HttpMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialOrd for HttpMethod {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HttpMethod {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
