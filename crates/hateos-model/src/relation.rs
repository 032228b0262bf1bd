//! Link relations.
//!
//! A relation is either a registered token (`self`, `contents`, `about`) or
//! an extension relation written as an absolute URL
//! (`https://example.com/rel/archive`).

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// A link relation, ordered by its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkRelation(Cow<'static, str>);

impl LinkRelation {
    /// `about`
    pub const ABOUT: Self = Self(Cow::Borrowed("about"));
    /// `contents`
    pub const CONTENTS: Self = Self(Cow::Borrowed("contents"));
    /// `self`, the relation used when the path has no relation segment.
    pub const SELF: Self = Self(Cow::Borrowed("self"));

    /// Parse a relation token or URL. Tokens are lower-cased.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        if text.contains("://") {
            return if is_absolute_url(text) {
                Ok(Self(Cow::Owned(text.to_owned())))
            } else {
                Err(ModelError::InvalidLinkRelation(text.to_owned()))
            };
        }
        if is_token(text) {
            Ok(Self(Cow::Owned(text.to_ascii_lowercase())))
        } else {
            Err(ModelError::InvalidLinkRelation(text.to_owned()))
        }
    }

    /// The relation text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the `self` relation, whose links point at the
    /// resource itself rather than a sub path.
    #[must_use]
    pub fn is_self(&self) -> bool {
        self.0 == "self"
    }

    /// Whether this is a URL extension relation.
    #[must_use]
    pub fn is_url(&self) -> bool {
        self.0.contains("://")
    }
}

fn is_token(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

fn is_absolute_url(text: &str) -> bool {
    let Some((scheme, rest)) = text.split_once("://") else {
        return false;
    };
    let mut scheme_chars = scheme.chars();
    scheme_chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme_chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
        && !rest.chars().any(char::is_whitespace)
}

impl FromStr for LinkRelation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LinkRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_tokens() {
        assert_eq!(LinkRelation::parse("self").unwrap(), LinkRelation::SELF);
        assert_eq!(LinkRelation::parse("Contents").unwrap(), LinkRelation::CONTENTS);
        assert!(LinkRelation::parse("item-list.v2").is_ok());
    }

    #[test]
    fn test_should_parse_url_relation() {
        let rel = LinkRelation::parse("https://example.com/rel/archive").unwrap();
        assert!(rel.is_url());
        assert!(!rel.is_self());
    }

    #[test]
    fn test_should_reject_bad_syntax() {
        for bad in ["", "1abc", "a b", "a!", "://x", "http://"] {
            assert_eq!(
                LinkRelation::parse(bad).unwrap_err(),
                ModelError::InvalidLinkRelation(bad.to_owned()),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_should_order_lexically() {
        let mut rels = vec![LinkRelation::SELF, LinkRelation::ABOUT, LinkRelation::CONTENTS];
        rels.sort();
        assert_eq!(
            rels,
            vec![LinkRelation::ABOUT, LinkRelation::CONTENTS, LinkRelation::SELF]
        );
    }
}
