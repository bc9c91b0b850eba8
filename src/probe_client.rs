// probe_client.rs - Shared HTTP transport for bucket probes
// Purpose: One reqwest client per scan, bounded by the configured timeout,
//          with the relaxed TLS trust mode scanners need for unknown hosts

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use tracing::debug;

use crate::config::ScanConfig;

const USER_AGENT: &str = concat!("bucketrust/", env!("CARGO_PKG_VERSION"));

/// Upper bound on how much of a listing body is buffered
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Cheap to clone: every clone shares the same connection pool
#[derive(Clone, Debug)]
pub struct ProbeClient {
    client: Client,
}

impl ProbeClient {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        // Invalid certificates are accepted on purpose when configured: the
        // scanner has to reach self-signed and legacy storage endpoints.
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> reqwest::Result<Response> {
        let result = self.client.get(url).send().await;
        log_outcome("GET", url, &result);
        result
    }

    pub async fn put(&self, url: &str, body: &'static str) -> reqwest::Result<Response> {
        let result = self.client.put(url).body(body).send().await;
        log_outcome("PUT", url, &result);
        result
    }

    pub async fn delete(&self, url: &str) -> reqwest::Result<Response> {
        let result = self.client.delete(url).send().await;
        log_outcome("DELETE", url, &result);
        result
    }
}

fn log_outcome(method: &str, url: &str, result: &reqwest::Result<Response>) {
    match result {
        Ok(resp) => debug!(method, url, status = resp.status().as_u16(), "probe response"),
        Err(e) => debug!(method, url, error = %e, "probe request failed"),
    }
}

/// Read a response body up to [`MAX_BODY_BYTES`]
pub async fn read_body(resp: Response) -> String {
    read_body_limited(resp, MAX_BODY_BYTES).await
}

/// Read at most `limit` bytes of a response body.
///
/// Reading stops at the cap or at the first transport error; whatever arrived
/// by then is returned. A cut-off document no longer ends with its closing tag,
/// so the listing decoder treats it as malformed.
pub async fn read_body_limited(mut resp: Response, limit: usize) -> String {
    let mut body = Vec::new();

    while body.len() < limit {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "body read failed");
                break;
            }
        }
    }

    if body.len() >= limit {
        debug!(limit, "body truncated at size cap");
    }
    String::from_utf8_lossy(&body).into_owned()
}
