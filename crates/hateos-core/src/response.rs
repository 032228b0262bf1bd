//! Response construction for dispatch results and errors.

use bytes::Bytes;
use hateos_codec::MediaType;
use hateos_model::HateosError;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::StatusCode;

use crate::HttpEntity;

/// Render a `HateosError` in the router's media type.
///
/// ```json
/// {"status": 404, "message": "resource: unknown123"}
/// ```
///
/// ```xml
/// <error type="object"><status>404</status><message>resource: unknown123</message></error>
/// ```
#[must_use]
pub fn error_to_response(error: &HateosError, media_type: MediaType) -> http::Response<Bytes> {
    let node = serde_json::json!({
        "status": error.status.as_u16(),
        "message": error.message,
    });
    let body = match media_type.to_text("error", &node) {
        Ok(text) => Bytes::from(text),
        Err(e) => {
            tracing::error!(error = %e, "failed to render error body");
            Bytes::from(error.message.clone())
        }
    };

    let mut response = text_response(error.status, media_type, body);
    for (name, value) in &error.headers {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}

/// A marshalled success body.
#[must_use]
pub fn entity_response(
    status: StatusCode,
    media_type: MediaType,
    body: impl Into<Bytes>,
) -> http::Response<Bytes> {
    text_response(status, media_type, body.into())
}

/// 204 with an empty body.
#[must_use]
pub fn no_content() -> http::Response<Bytes> {
    let mut response = http::Response::new(Bytes::new());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

/// The response for an entity handler result: 204 when the body is empty,
/// otherwise 200 with the entity's headers.
#[must_use]
pub fn from_entity(entity: HttpEntity) -> http::Response<Bytes> {
    if entity.is_empty() {
        let mut response = no_content();
        *response.headers_mut() = entity.headers;
        return response;
    }
    let mut response = http::Response::new(entity.body);
    *response.headers_mut() = entity.headers;
    response
}

fn text_response(status: StatusCode, media_type: MediaType, body: Bytes) -> http::Response<Bytes> {
    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(media_type.content_type()),
    );
    response
}
