//! The wire formats a router can speak.

use std::fmt;
use std::str::FromStr;

use mime::Mime;

use crate::{CodecError, Node, json, xml};

/// The single media type a router reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaType {
    /// `application/json`
    #[default]
    Json,
    /// `application/xml`
    Xml,
}

impl MediaType {
    /// The `type/subtype` without parameters.
    #[must_use]
    pub fn essence(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// The `Content-Type` value written on responses.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::Xml => "application/xml; charset=utf-8",
        }
    }

    /// Short format name used in parse error messages.
    #[must_use]
    pub fn format_name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
        }
    }

    /// Whether `mime` (possibly a wildcard) covers this media type.
    #[must_use]
    pub fn is_compatible(self, mime: &Mime) -> bool {
        let (top, sub) = (mime.type_(), mime.subtype());
        if top == mime::STAR {
            return true;
        }
        match self {
            Self::Json => {
                top == mime::APPLICATION
                    && (sub == mime::STAR
                        || sub == mime::JSON
                        || mime.suffix().is_some_and(|s| s == mime::JSON))
            }
            Self::Xml => {
                (top == mime::APPLICATION && sub == mime::STAR)
                    || ((top == mime::APPLICATION || top == mime::TEXT)
                        && (sub == mime::XML || mime.suffix().is_some_and(|s| s == mime::XML)))
            }
        }
    }

    /// Whether any entry of an `Accept` header value covers this media type.
    /// Unparseable entries are skipped, as are entries with `q=0`. An exact
    /// `q=0` entry for this type refuses it even when a wildcard follows.
    #[must_use]
    pub fn is_accepted_by(self, accept: &str) -> bool {
        let entries: Vec<Mime> = accept
            .split(',')
            .filter_map(|entry| entry.trim().parse::<Mime>().ok())
            .collect();
        if entries
            .iter()
            .any(|mime| is_refused(mime) && mime.essence_str() == self.essence())
        {
            return false;
        }
        entries
            .iter()
            .any(|mime| !is_refused(mime) && self.is_compatible(mime))
    }

    /// Render `node` as wire text. `root` names the XML document element and
    /// is ignored for JSON.
    pub fn to_text(self, root: &str, node: &Node) -> Result<String, CodecError> {
        match self {
            Self::Json => json::to_text(node),
            Self::Xml => xml::to_text(root, node),
        }
    }

    /// Parse wire text into a node.
    pub fn parse(self, text: &str) -> Result<Node, CodecError> {
        match self {
            Self::Json => json::parse(text),
            Self::Xml => xml::parse(text),
        }
    }
}

/// An `Accept` entry with quality zero. Unparseable weights count as accepted.
fn is_refused(mime: &Mime) -> bool {
    mime.get_param("q")
        .and_then(|q| q.as_str().parse::<f32>().ok())
        .is_some_and(|q| q <= 0.0)
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.essence())
    }
}

impl FromStr for MediaType {
    type Err = String;

    /// Accepts `json`, `xml` or a mime string such as `application/xml`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => return Ok(Self::Json),
            "xml" => return Ok(Self::Xml),
            _ => {}
        }
        let mime: Mime = s
            .parse()
            .map_err(|_| format!("unknown media type \"{s}\""))?;
        if mime.type_() != mime::STAR && mime.subtype() != mime::STAR {
            for candidate in [Self::Json, Self::Xml] {
                if candidate.is_compatible(&mime) {
                    return Ok(candidate);
                }
            }
        }
        Err(format!("unknown media type \"{s}\""))
    }
}
