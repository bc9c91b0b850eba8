// write_probe.rs - Anonymous write check
// Purpose: PUT a small marker object into an existing container and remove it
//          again when the upload was accepted

use chrono::Utc;
use tracing::debug;

use crate::probe_client::ProbeClient;

pub const WRITE_PROBE_PREFIX: &str = "cloudbucket_test_";
pub const WRITE_PROBE_PAYLOAD: &str = "cloudbucket security test";

/// Marker object URL, unique per call
pub fn probe_object_url(base_url: &str) -> String {
    format!(
        "{}/{}{}_{:04x}.txt",
        base_url.trim_end_matches('/'),
        WRITE_PROBE_PREFIX,
        Utc::now().timestamp_millis(),
        rand::random::<u16>()
    )
}

/// True only when the anonymous PUT answered 200 or 201
pub async fn check_write_access(client: &ProbeClient, base_url: &str) -> bool {
    let object_url = probe_object_url(base_url);

    let status = match client.put(&object_url, WRITE_PROBE_PAYLOAD).await {
        Ok(resp) => resp.status().as_u16(),
        Err(_) => return false,
    };

    if status != 200 && status != 201 {
        return false;
    }

    // Cleanup outcome never changes the verdict
    if let Err(e) = client.delete(&object_url).await {
        debug!(url = %object_url, error = %e, "write probe cleanup failed");
    }

    true
}
