//! Id selections parsed from the segment after the resource name.
//!
//! ```text
//! /api/notes              -> Selection::None
//! /api/notes/7b           -> Selection::One(0x7b)
//! /api/notes/*            -> Selection::All
//! /api/notes/10-1f        -> Selection::Range(0x10..=0x1f)
//! /api/notes/1,2,3        -> Selection::List([1, 2, 3])
//! ```

use std::ops::Bound;

use crate::ModelError;

/// The parsed id segment of a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<I> {
    /// No id segment: the collection root.
    None,
    /// Exactly one id.
    One(I),
    /// The `*` wildcard.
    All,
    /// An inclusive range of ids.
    Range(SelectionRange<I>),
    /// Several ids, in request order. Duplicates are kept.
    List(Vec<I>),
}

impl<I> Selection<I> {
    /// A short name for the active variant, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::One(_) => "one",
            Self::All => "all",
            Self::Range(_) => "range",
            Self::List(_) => "list",
        }
    }
}

/// An inclusive id range with at least one bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRange<I> {
    lower: Option<I>,
    upper: Option<I>,
}

impl<I> SelectionRange<I> {
    /// Build a range from optional inclusive bounds.
    pub fn new(lower: Option<I>, upper: Option<I>) -> Result<Self, ModelError> {
        if lower.is_none() && upper.is_none() {
            return Err(ModelError::InvalidRange("at least one bound is required"));
        }
        Ok(Self { lower, upper })
    }

    /// `lower..=upper`
    #[must_use]
    pub fn between(lower: I, upper: I) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// `lower..`
    #[must_use]
    pub fn at_least(lower: I) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    /// `..=upper`
    #[must_use]
    pub fn at_most(upper: I) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    /// Build a range from std bounds. Exclusive bounds are rejected rather
    /// than widened or narrowed.
    pub fn from_bounds(lower: Bound<I>, upper: Bound<I>) -> Result<Self, ModelError> {
        let lower = match lower {
            Bound::Included(id) => Some(id),
            Bound::Unbounded => None,
            Bound::Excluded(_) => {
                return Err(ModelError::InvalidRange("exclusive lower bound"));
            }
        };
        let upper = match upper {
            Bound::Included(id) => Some(id),
            Bound::Unbounded => None,
            Bound::Excluded(_) => {
                return Err(ModelError::InvalidRange("exclusive upper bound"));
            }
        };
        Self::new(lower, upper)
    }

    /// The inclusive lower bound, if any.
    #[must_use]
    pub fn lower(&self) -> Option<&I> {
        self.lower.as_ref()
    }

    /// The inclusive upper bound, if any.
    #[must_use]
    pub fn upper(&self) -> Option<&I> {
        self.upper.as_ref()
    }
}

impl<I: Ord> SelectionRange<I> {
    /// Whether `id` falls inside this range.
    #[must_use]
    pub fn contains(&self, id: &I) -> bool {
        self.lower.as_ref().is_none_or(|lower| id >= lower)
            && self.upper.as_ref().is_none_or(|upper| id <= upper)
    }
}

/// A selection parse failure. The message is shown to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SelectionError {
    message: String,
}

impl SelectionError {
    /// Create an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The separators used by [`SelectionSyntax::parse`].
///
/// The escape character lets ids contain the range separator: with the
/// default syntax `a\-b` is the single id `a-b`. Escape characters are
/// removed before a token reaches the id parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSyntax {
    /// Separates range bounds.
    pub range_separator: char,
    /// Separates list items.
    pub list_separator: char,
    /// The segment selecting everything.
    pub wildcard: &'static str,
    /// Escapes the next character; `None` disables escaping.
    pub escape: Option<char>,
}

impl Default for SelectionSyntax {
    fn default() -> Self {
        Self {
            range_separator: '-',
            list_separator: ',',
            wildcard: "*",
            escape: Some('\\'),
        }
    }
}

impl SelectionSyntax {
    /// Parse an id segment, using `parse_id` for each id token.
    ///
    /// The range separator is looked for before the list separator, so a
    /// segment holding both is a range with a malformed bound.
    pub fn parse<I, F>(&self, segment: &str, parse_id: F) -> Result<Selection<I>, SelectionError>
    where
        F: Fn(&str) -> Option<I>,
    {
        if segment.is_empty() {
            return Ok(Selection::None);
        }
        if segment == self.wildcard {
            return Ok(Selection::All);
        }

        if let Some(index) = self.find_unescaped(segment, self.range_separator) {
            let begin = &segment[..index];
            let end = &segment[index + self.range_separator.len_utf8()..];
            let lower = parse_id(&self.unescape(begin))
                .ok_or_else(|| SelectionError::new(format!("Invalid range begin \"{begin}\"")))?;
            let upper = parse_id(&self.unescape(end))
                .ok_or_else(|| SelectionError::new(format!("Invalid range end \"{end}\"")))?;
            return Ok(Selection::Range(SelectionRange::between(lower, upper)));
        }

        if self.find_unescaped(segment, self.list_separator).is_some() {
            return self
                .split_unescaped(segment, self.list_separator)
                .into_iter()
                .map(|token| parse_id(&self.unescape(token)))
                .collect::<Option<Vec<I>>>()
                .map(Selection::List)
                .ok_or_else(|| SelectionError::new(format!("Invalid list \"{segment}\"")));
        }

        parse_id(&self.unescape(segment))
            .map(Selection::One)
            .ok_or_else(|| SelectionError::new(format!("Invalid id \"{segment}\"")))
    }

    /// Byte index of the first `separator` not preceded by the escape char.
    fn find_unescaped(&self, text: &str, separator: char) -> Option<usize> {
        let mut escaped = false;
        for (index, c) in text.char_indices() {
            if escaped {
                escaped = false;
            } else if Some(c) == self.escape {
                escaped = true;
            } else if c == separator {
                return Some(index);
            }
        }
        None
    }

    fn split_unescaped<'a>(&self, text: &'a str, separator: char) -> Vec<&'a str> {
        let mut parts = Vec::new();
        let mut rest = text;
        while let Some(index) = self.find_unescaped(rest, separator) {
            parts.push(&rest[..index]);
            rest = &rest[index + separator.len_utf8()..];
        }
        parts.push(rest);
        parts
    }

    fn unescape(&self, token: &str) -> String {
        let Some(escape) = self.escape else {
            return token.to_owned();
        };
        let mut out = String::with_capacity(token.len());
        let mut escaped = false;
        for c in token.chars() {
            if !escaped && c == escape {
                escaped = true;
                continue;
            }
            escaped = false;
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(text: &str) -> Option<u64> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        u64::from_str_radix(digits, 16).ok()
    }

    fn parse(segment: &str) -> Result<Selection<u64>, SelectionError> {
        SelectionSyntax::default().parse(segment, hex)
    }

    #[test]
    fn test_should_parse_empty_as_none() {
        assert_eq!(parse("").unwrap(), Selection::None);
    }

    #[test]
    fn test_should_parse_wildcard_as_all() {
        assert_eq!(parse("*").unwrap(), Selection::All);
    }

    #[test]
    fn test_should_parse_one() {
        assert_eq!(parse("7b").unwrap(), Selection::One(123));
        assert_eq!(parse("0x123").unwrap(), Selection::One(0x123));
    }

    #[test]
    fn test_should_report_invalid_id() {
        assert_eq!(parse("xyz").unwrap_err().message(), "Invalid id \"xyz\"");
    }

    #[test]
    fn test_should_parse_range() {
        assert_eq!(
            parse("10-1f").unwrap(),
            Selection::Range(SelectionRange::between(0x10, 0x1f))
        );
    }

    #[test]
    fn test_should_accept_equal_range_bounds() {
        assert_eq!(
            parse("5-5").unwrap(),
            Selection::Range(SelectionRange::between(5, 5))
        );
    }

    #[test]
    fn test_should_report_which_range_bound_failed() {
        assert_eq!(
            parse("zz-1").unwrap_err().message(),
            "Invalid range begin \"zz\""
        );
        assert_eq!(
            parse("1-zz").unwrap_err().message(),
            "Invalid range end \"zz\""
        );
        assert_eq!(parse("1-").unwrap_err().message(), "Invalid range end \"\"");
    }

    #[test]
    fn test_should_parse_list_in_order_with_duplicates() {
        assert_eq!(parse("3,1,3").unwrap(), Selection::List(vec![3, 1, 3]));
    }

    #[test]
    fn test_should_fail_whole_list_on_one_bad_token() {
        assert_eq!(
            parse("1,zz,3").unwrap_err().message(),
            "Invalid list \"1,zz,3\""
        );
    }

    #[test]
    fn test_should_prefer_range_over_list() {
        // The comma ends up inside the range end bound.
        assert_eq!(
            parse("1-2,3").unwrap_err().message(),
            "Invalid range end \"2,3\""
        );
    }

    #[test]
    fn test_should_treat_escaped_separator_as_id_text() {
        let syntax = SelectionSyntax::default();
        let selection = syntax
            .parse("a\\-b", |text| Some(text.to_owned()))
            .unwrap();
        assert_eq!(selection, Selection::One("a-b".to_owned()));

        let selection = syntax
            .parse("a\\-b-c", |text| Some(text.to_owned()))
            .unwrap();
        assert_eq!(
            selection,
            Selection::Range(SelectionRange::between("a-b".to_owned(), "c".to_owned()))
        );
    }

    #[test]
    fn test_should_split_on_plain_separator_without_escape() {
        let syntax = SelectionSyntax {
            escape: None,
            ..SelectionSyntax::default()
        };
        let selection = syntax.parse("a\\-b", |text| Some(text.to_owned())).unwrap();
        assert_eq!(
            selection,
            Selection::Range(SelectionRange::between("a\\".to_owned(), "b".to_owned()))
        );
    }

    #[test]
    fn test_should_reject_exclusive_bounds() {
        assert!(SelectionRange::from_bounds(Bound::Excluded(1), Bound::Included(2)).is_err());
        assert!(SelectionRange::from_bounds(Bound::Included(1), Bound::Excluded(2)).is_err());
        assert!(SelectionRange::<u64>::from_bounds(Bound::Unbounded, Bound::Unbounded).is_err());
        let range = SelectionRange::from_bounds(Bound::Included(1), Bound::Unbounded).unwrap();
        assert_eq!(range.lower(), Some(&1));
        assert_eq!(range.upper(), None);
    }

    #[test]
    fn test_should_check_range_membership() {
        let range = SelectionRange::between(2, 4);
        assert!(range.contains(&2));
        assert!(range.contains(&4));
        assert!(!range.contains(&5));
        assert!(SelectionRange::at_most(3).contains(&0));
        assert!(!SelectionRange::at_least(3).contains(&2));
    }
}
