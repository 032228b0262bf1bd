//! Codec error types.

/// Errors raised while marshalling, unmarshalling or parsing wire text.
///
/// The `Display` output is the bare parser message; callers add their own
/// prefix (`Invalid JSON: ...`).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON text or a JSON-shaped node did not match the target type.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// XML text could not be read or written.
    #[error("{0}")]
    Xml(String),

    /// A `{"type": ..}` node named a tag nobody registered.
    #[error("unknown type \"{0}\"")]
    UnknownTag(String),

    /// A value of this Rust type was marshalled with its type but never
    /// registered.
    #[error("type {0} is not registered")]
    UnregisteredType(&'static str),

    /// The same tag was registered twice.
    #[error("type \"{0}\" is already registered")]
    DuplicateTag(String),

    /// The node has the wrong shape for the requested operation.
    #[error("{0}")]
    Shape(String),
}

impl From<quick_xml::Error> for CodecError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for CodecError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(e.to_string())
    }
}
