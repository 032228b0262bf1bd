//! Hypermedia HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use hateos_core::HateosRouters;
use hateos_model::HateosError;
use http_body_util::{BodyExt, Limited};

use crate::body::HateosResponseBody;

/// Configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct HateosHttpConfig {
    /// Value of the `server` response header.
    pub server_name: String,
    /// Largest request body accepted, in bytes.
    pub max_body_size: usize,
}

impl Default for HateosHttpConfig {
    fn default() -> Self {
        Self {
            server_name: "hateos".to_owned(),
            max_body_size: 4 * 1024 * 1024,
        }
    }
}

/// Hyper `Service` that dispatches every request through a router chain.
#[derive(Clone)]
pub struct HateosHttpService {
    routers: Arc<HateosRouters>,
    config: Arc<HateosHttpConfig>,
}

impl fmt::Debug for HateosHttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HateosHttpService")
            .field("routers", &self.routers)
            .field("config", &self.config)
            .finish()
    }
}

impl HateosHttpService {
    /// Create a new `HateosHttpService`.
    #[must_use]
    pub fn new(routers: HateosRouters, config: HateosHttpConfig) -> Self {
        Self {
            routers: Arc::new(routers),
            config: Arc::new(config),
        }
    }
}

impl<B> hyper::service::Service<http::Request<B>> for HateosHttpService
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = http::Response<HateosResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let routers = Arc::clone(&self.routers);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let response = process_request(req, &routers, &config, &request_id).await;
            let response = add_common_headers(response, &request_id, &config.server_name);
            Ok(response.map(HateosResponseBody::from_bytes))
        })
    }
}

/// Process a single request through the full pipeline.
async fn process_request<B>(
    req: http::Request<B>,
    routers: &HateosRouters,
    config: &HateosHttpConfig,
    request_id: &str,
) -> http::Response<Bytes>
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let (parts, incoming) = req.into_parts();

    // 1. Collect body.
    let body = match collect_body(incoming, config.max_body_size).await {
        Ok(body) => body,
        Err(err) => {
            tracing::warn!(request_id, message = %err.message, "failed to read request body");
            return routers.error_response(&err);
        }
    };

    // 2. Route and dispatch.
    let request = http::Request::from_parts(parts, body);
    let response = routers.handle(&request);
    tracing::debug!(
        request_id,
        method = %request.method(),
        path = request.uri().path(),
        status = response.status().as_u16(),
        "handled request"
    );
    response
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, HateosError>
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.is::<http_body_util::LengthLimitError>() {
                HateosError::from_status(http::StatusCode::PAYLOAD_TOO_LARGE)
            } else {
                HateosError::bad_request(format!("Failed to read request body: {e}"))
            }
        })
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<Bytes>,
    request_id: &str,
    server_name: &str,
) -> http::Response<Bytes> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry("x-request-id").or_insert(hv);
    }
    if let Ok(hv) = http::HeaderValue::from_str(server_name) {
        headers.insert(http::header::SERVER, hv);
    }

    response
}
