//! Content negotiation against a router's single media type.
//!
//! These checks run before any handler and before any structured parsing.

use hateos_codec::MediaType;
use hateos_model::HateosError;
use http::HeaderMap;
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use mime::Mime;

/// Check that `Content-Length` agrees with the body that actually arrived.
pub fn check_content_length(headers: &HeaderMap, body: &[u8]) -> Result<(), HateosError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return if body.is_empty() {
            Ok(())
        } else {
            Err(HateosError::length_required())
        };
    };

    let text = value.to_str().unwrap_or_default().trim();
    let declared: u64 = text
        .parse()
        .map_err(|_| HateosError::bad_request(format!("Invalid Content-Length: {text}")))?;

    if body.is_empty() {
        if declared != 0 {
            return Err(HateosError::bad_request(format!(
                "Body absent with Content-Length: {declared}"
            )));
        }
        return Ok(());
    }
    if declared != body.len() as u64 {
        return Err(HateosError::bad_request(format!(
            "Content-Length: {declared} != body length={} mismatch",
            body.len()
        )));
    }
    Ok(())
}

/// Check that the client accepts `media_type`.
pub fn check_accept(headers: &HeaderMap, media_type: MediaType) -> Result<(), HateosError> {
    let Some(value) = headers.get(ACCEPT) else {
        return Err(HateosError::bad_request("Missing Accept"));
    };
    let accept = String::from_utf8_lossy(value.as_bytes());
    if value.to_str().is_ok_and(|accept| media_type.is_accepted_by(accept)) {
        Ok(())
    } else {
        Err(HateosError::bad_request(format!(
            "Expected Accept {media_type} got {accept}"
        )))
    }
}

/// Validate `Content-Type` and decode the body with its charset.
///
/// An empty body yields `None` without looking at `Content-Type`.
pub fn body_text(
    headers: &HeaderMap,
    body: &[u8],
    media_type: MediaType,
) -> Result<Option<String>, HateosError> {
    if body.is_empty() {
        return Ok(None);
    }
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Err(HateosError::bad_request("Missing Content-Type"));
    };
    let raw = String::from_utf8_lossy(value.as_bytes());
    let mime = raw
        .parse::<Mime>()
        .ok()
        .filter(|mime| media_type.is_compatible(mime) && mime.type_() != mime::STAR)
        .ok_or_else(|| {
            HateosError::bad_request(format!("Expected Content-Type {media_type} got {raw}"))
        })?;

    let charset = mime
        .get_param(mime::CHARSET)
        .map_or_else(|| "utf-8".to_owned(), |name| name.as_str().to_owned());
    decode_charset(body, &charset, media_type).map(Some)
}

fn decode_charset(body: &[u8], charset: &str, media_type: MediaType) -> Result<String, HateosError> {
    let invalid = |message: &str| {
        HateosError::bad_request(format!("Invalid {}: {message}", media_type.format_name()))
    };
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => String::from_utf8(body.to_vec()).map_err(|e| invalid(&e.to_string())),
        "us-ascii" | "ascii" => {
            if body.is_ascii() {
                Ok(body.iter().map(|&b| char::from(b)).collect())
            } else {
                Err(invalid("non-ASCII byte in US-ASCII body"))
            }
        }
        "iso-8859-1" | "latin1" => Ok(body.iter().map(|&b| char::from(b)).collect()),
        _ => Err(HateosError::bad_request(format!(
            "Unsupported charset \"{charset}\""
        ))),
    }
}
