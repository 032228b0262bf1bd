//! hyper service layer for the hypermedia dispatch engine.
//!
//! - **Service**: collects the request body, hands the request to a chain of
//!   [`HateosRouter`](hateos_core::HateosRouter)s and adds common headers
//! - **Body**: the buffered response body type

pub mod body;
pub mod service;

pub use body::HateosResponseBody;
pub use service::{HateosHttpConfig, HateosHttpService};
