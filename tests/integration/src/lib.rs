//! Integration tests for Hateos server.
//!
//! These tests require a running Hateos server at `localhost:8080` serving
//! JSON under `/api`. They are marked `#[ignore]` so they don't run during
//! normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p hateos-integration -- --ignored
//! ```

use std::sync::Once;

use anyhow::{Context, Result};
use serde_json::Value;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server, including the base path.
fn endpoint_url() -> String {
    std::env::var("HATEOS_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080/api".to_owned())
}

/// Absolute URL for `path`, which must start with `/`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", endpoint_url())
}

/// Absolute URL for an href found in a `_links` entry.
#[must_use]
pub fn href_url(href: &str) -> String {
    let endpoint = endpoint_url();
    let origin = endpoint
        .find("://")
        .and_then(|scheme| endpoint[scheme + 3..].find('/').map(|at| &endpoint[..scheme + 3 + at]))
        .unwrap_or(&endpoint);
    format!("{origin}{href}")
}

/// Create an HTTP client for the local server.
#[must_use]
pub fn client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// A title unique to one test run.
#[must_use]
pub fn test_title(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a note and return the server's JSON answer.
pub async fn create_note(client: &reqwest::Client, title: &str) -> Result<Value> {
    let response = client
        .post(url("/notes"))
        .header(reqwest::header::ACCEPT, "application/json")
        .json(&serde_json::json!({ "title": title }))
        .send()
        .await
        .context("failed to create note")?;
    anyhow::ensure!(
        response.status() == reqwest::StatusCode::CREATED,
        "unexpected status {}",
        response.status()
    );
    let note = response.json().await?;
    tracing::debug!(?note, "created note");
    Ok(note)
}

/// The id of a note returned by the server.
#[must_use]
pub fn note_id(note: &Value) -> u64 {
    note["id"].as_u64().unwrap_or_default()
}

/// Delete a note, ignoring failures.
pub async fn cleanup_note(client: &reqwest::Client, id: u64) {
    let _ = client
        .delete(url(&format!("/notes/{id}")))
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await;
}

mod test_error;
mod test_notes;
