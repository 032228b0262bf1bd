//! Resource name: the first path segment after the router base path.

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// A validated resource name such as `notes` or `resource1`.
///
/// Letters, digits and hyphens, starting with a letter. Names are stored
/// lower-cased, so `Notes` and `notes` are the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName(String);

impl ResourceName {
    /// Validate and normalize a resource name.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ModelError> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(ModelError::InvalidResourceName(name.to_owned()));
        }
        Ok(Self(name.to_ascii_lowercase()))
    }

    /// Whether `name` has resource name syntax.
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    /// The normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ResourceName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
