use std::time::Duration;

use fiscal_core::types::SearchResponse;

/// Best-effort, at-most-once POST of a response to a caller-supplied URL.
pub struct CallbackNotifier {
    client: reqwest::Client,
}

impl CallbackNotifier {
    pub fn new(timeout: Duration) -> Self {
        // Only fails when the TLS backend cannot initialise.
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client }
    }

    /// `delivered:<status>` on 2xx, `failed:<status>` otherwise, and
    /// `failed:<error>` when the request could not be sent.
    pub async fn deliver(&self, url: &str, response: &SearchResponse) -> String {
        match self.client.post(url).json(response).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(url, status = resp.status().as_u16(), "callback delivered");
                format!("delivered:{}", resp.status().as_u16())
            }
            Ok(resp) => {
                tracing::warn!(url, status = resp.status().as_u16(), "callback rejected");
                format!("failed:{}", resp.status().as_u16())
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "callback delivery failed");
                format!("failed:{}", short_error(&e))
            }
        }
    }
}

fn short_error(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_builder() {
        "invalid_url"
    } else {
        "transport"
    }
}
