// providers.rs - Cloud storage provider probes
// Purpose: Per-provider candidate enumeration and HTTP status classification
//          for AWS S3, Google Cloud Storage, Azure Blob, Alibaba OSS and
//          DigitalOcean Spaces
//
// Within one probe, candidates are tried strictly one after another so the
// first conclusive candidate can stop the walk.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::{expand_template, ScanConfig};
use crate::listing::ListingFormat;
use crate::probe_client::{read_body, ProbeClient};
use crate::result::ProbeResult;
use crate::write_probe::check_write_access;

/// Object fetched after a 403 to tell "exists, private" from "exists, readable"
pub const READ_PROBE_OBJECT: &str = "test.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Aws,
    Gcp,
    Azure,
    Alibaba,
    DigitalOcean,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Aws,
        ProviderKind::Gcp,
        ProviderKind::Azure,
        ProviderKind::Alibaba,
        ProviderKind::DigitalOcean,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Aws => "AWS S3",
            ProviderKind::Gcp => "Google Cloud Storage",
            ProviderKind::Azure => "Azure Blob",
            ProviderKind::Alibaba => "Alibaba OSS",
            ProviderKind::DigitalOcean => "DigitalOcean Spaces",
        }
    }

    /// Canonical command-line token
    pub fn token(&self) -> &'static str {
        match self {
            ProviderKind::Aws => "aws",
            ProviderKind::Gcp => "gcp",
            ProviderKind::Azure => "azure",
            ProviderKind::Alibaba => "alibaba",
            ProviderKind::DigitalOcean => "do",
        }
    }

    /// Case-insensitive alias lookup (`all` is handled by the filter)
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "aws" | "s3" => Some(ProviderKind::Aws),
            "gcp" | "gcs" | "google" => Some(ProviderKind::Gcp),
            "azure" => Some(ProviderKind::Azure),
            "alibaba" | "aliyun" | "oss" => Some(ProviderKind::Alibaba),
            "do" | "digitalocean" | "spaces" => Some(ProviderKind::DigitalOcean),
            _ => None,
        }
    }

    /// Run this provider's full probe for one target.
    ///
    /// Never fails: transport problems only make candidates inconclusive.
    pub async fn probe(&self, target: &str, client: &ProbeClient, config: &ScanConfig) -> ProbeResult {
        let mut result = match self {
            ProviderKind::Aws => probe_aws(target, client, config).await,
            ProviderKind::Gcp => probe_gcp(target, client, config).await,
            ProviderKind::Azure => probe_azure(target, client, config).await,
            ProviderKind::Alibaba => {
                let endpoints = &config.endpoints;
                probe_regional(*self, target, &endpoints.alibaba, &endpoints.alibaba_regions, client, config)
                    .await
            }
            ProviderKind::DigitalOcean => {
                let endpoints = &config.endpoints;
                probe_regional(
                    *self,
                    target,
                    &endpoints.digitalocean,
                    &endpoints.digitalocean_regions,
                    client,
                    config,
                )
                .await
            }
        };

        if config.check_write && result.exists {
            result.public_write = check_write_access(client, &result.url).await;
        }

        debug!(
            bucket = target,
            provider = self.token(),
            exists = result.exists,
            read = result.public_read,
            list = result.public_list,
            write = result.public_write,
            "provider probe finished"
        );
        result
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

async fn fetch_listing(resp: reqwest::Response, format: ListingFormat, config: &ScanConfig) -> Vec<String> {
    if !config.list_files {
        return Vec::new();
    }
    format.decode(&read_body(resp).await, config.max_files)
}

// ═══════════════════════════════════════════════════════════════════════════
// AWS S3
// ═══════════════════════════════════════════════════════════════════════════

async fn probe_aws(target: &str, client: &ProbeClient, config: &ScanConfig) -> ProbeResult {
    let mut result = ProbeResult::new(target, ProviderKind::Aws);
    let candidates = [
        expand_template(&config.endpoints.aws_virtual_hosted, target, None),
        expand_template(&config.endpoints.aws_path_style, target, None),
    ];

    for url in candidates {
        result.url = url.clone();

        let resp = match client.get(&url).await {
            Ok(resp) => resp,
            Err(_) => continue,
        };

        match resp.status().as_u16() {
            200 => {
                result.mark_listable();
                result.files = fetch_listing(resp, ListingFormat::S3, config).await;
            }
            403 => {
                result.exists = true;
                result.public_read = object_readable(client, &url).await;
            }
            _ => continue,
        }

        if result.exists {
            break;
        }
    }

    result
}

/// Approximate: any answer other than 403 for a well-known object name is
/// taken as readable, even though it may be an unrelated error page.
async fn object_readable(client: &ProbeClient, base_url: &str) -> bool {
    let url = format!("{}/{}", base_url, READ_PROBE_OBJECT);
    match client.get(&url).await {
        Ok(resp) => resp.status().as_u16() != 403,
        Err(_) => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// GOOGLE CLOUD STORAGE
// ═══════════════════════════════════════════════════════════════════════════

async fn probe_gcp(target: &str, client: &ProbeClient, config: &ScanConfig) -> ProbeResult {
    let mut result = ProbeResult::new(target, ProviderKind::Gcp);
    result.url = expand_template(&config.endpoints.gcp, target, None);

    let resp = match client.get(&result.url).await {
        Ok(resp) => resp,
        Err(e) => {
            result.error = Some(e.to_string());
            return result;
        }
    };

    match resp.status().as_u16() {
        200 => {
            result.mark_listable();
            // GCS answers anonymous XML API listings in the S3 shape
            result.files = fetch_listing(resp, ListingFormat::S3, config).await;
        }
        403 => result.exists = true,
        _ => {}
    }

    result
}

// ═══════════════════════════════════════════════════════════════════════════
// AZURE BLOB STORAGE
// ═══════════════════════════════════════════════════════════════════════════

async fn probe_azure(target: &str, client: &ProbeClient, config: &ScanConfig) -> ProbeResult {
    let mut result = ProbeResult::new(target, ProviderKind::Azure);
    let account = expand_template(&config.endpoints.azure_account, target, None);
    result.url = account.clone();

    // A 403 marks the account as existing but keeps the walk going
    for container in &config.endpoints.azure_containers {
        let url = format!("{}/{}?restype=container&comp=list", account, container);

        let resp = match client.get(&url).await {
            Ok(resp) => resp,
            Err(_) => continue,
        };

        match resp.status().as_u16() {
            200 => {
                result.mark_listable();
                result.url = format!("{}/{}", account, container);
                result.files = fetch_listing(resp, ListingFormat::Azure, config).await;
                break;
            }
            403 => result.exists = true,
            _ => {}
        }
    }

    result
}

// ═══════════════════════════════════════════════════════════════════════════
// REGIONAL S3-COMPATIBLE PROVIDERS (ALIBABA OSS, DIGITALOCEAN SPACES)
// ═══════════════════════════════════════════════════════════════════════════

async fn probe_regional(
    kind: ProviderKind,
    target: &str,
    template: &str,
    regions: &[String],
    client: &ProbeClient,
    config: &ScanConfig,
) -> ProbeResult {
    let mut result = ProbeResult::new(target, kind);

    for region in regions {
        let url = expand_template(template, target, Some(region));
        result.url = url.clone();

        let resp = match client.get(&url).await {
            Ok(resp) => resp,
            Err(_) => continue,
        };

        match resp.status().as_u16() {
            200 => {
                result.mark_listable();
                result.files = fetch_listing(resp, ListingFormat::S3, config).await;
                break;
            }
            403 => {
                result.exists = true;
                break;
            }
            _ => {}
        }
    }

    result
}
