//! Core Twitter API utilities.
//!
//! This module contains low-level helpers for making authenticated GET requests
//! to the Twitter API v2 and for logging API content safely.

use log::{debug, error, info};
use reqwest::Client;

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Flattens newlines and tabs so one tweet stays on one log line
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_chars`: Maximum number of characters before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_chars: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    let total = sanitized.chars().count();
    if total > max_chars {
        let head: String = sanitized.chars().take(max_chars).collect();
        format!("{}... [truncated, {} total chars]", head, total)
    } else {
        sanitized
    }
}

/// Builds the Authorization header for OAuth 2.0 Bearer Token authentication.
///
/// App-only bearer tokens are enough for the read-only recent search endpoint.
pub fn build_bearer_auth_header(bearer_token: &str) -> String {
    format!("Bearer {}", bearer_token)
}

/// Sends an authenticated GET request and returns the response body.
///
/// # Parameters
///
/// - `client`: The shared HTTP client
/// - `bearer_token`: App-only bearer token
/// - `url`: Fully built request URL, query already encoded
/// - `operation_name`: Human-readable name for the operation (for logging)
///
/// # Returns
///
/// - `Ok(String)`: The API response body on a 2xx status
/// - `Err(Box<dyn std::error::Error + Send + Sync>)`: On network failure or any other status
pub(crate) async fn get_authenticated(
    client: &Client,
    bearer_token: &str,
    url: &str,
    operation_name: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    info!("Making authenticated request for operation: {}", operation_name);
    debug!("Request URL: {}", url);
    debug!("Request headers: Authorization: Bearer [REDACTED]");

    let response = client
        .get(url)
        .header("Authorization", build_bearer_auth_header(bearer_token))
        .send()
        .await?;

    let status = response.status();
    debug!(
        "Received response with status: {} for operation: {}",
        status, operation_name
    );

    if status.is_success() {
        let response_text = response.text().await?;
        debug!(
            "Response summary for '{}': {} bytes received",
            operation_name,
            response_text.len()
        );
        return Ok(response_text);
    }

    let error_text = response.text().await?;
    error!("Operation '{}' failed - Status: {}", operation_name, status);
    debug!(
        "Error response for '{}': {}",
        operation_name,
        sanitize_for_logging(&error_text, 200)
    );
    Err(format!(
        "Twitter API error for operation '{}' ({}): {}",
        operation_name,
        status,
        sanitize_for_logging(&error_text, 200)
    )
    .into())
}
