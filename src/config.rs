// config.rs - Scan Configuration
// Purpose: Immutable scan settings shared by every probe and worker, provider
//          selection, and the endpoint templates each provider enumerates

use anyhow::{bail, Result};
use std::time::Duration;

use crate::providers::ProviderKind;

// ═══════════════════════════════════════════════════════════════════════════
// ENDPOINT TEMPLATES
// ═══════════════════════════════════════════════════════════════════════════

/// Placeholder replaced with the target container name
pub const NAME_PLACEHOLDER: &str = "{name}";
/// Placeholder replaced with a provider region
pub const REGION_PLACEHOLDER: &str = "{region}";

/// URL templates, regions and container names the provider probes walk through.
///
/// Defaults point at the real public endpoints. Tests point them at a local
/// mock server instead.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub aws_virtual_hosted: String,
    pub aws_path_style: String,
    pub gcp: String,
    pub azure_account: String,
    /// Tried in order against the account host
    pub azure_containers: Vec<String>,
    pub alibaba: String,
    pub alibaba_regions: Vec<String>,
    pub digitalocean: String,
    pub digitalocean_regions: Vec<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            aws_virtual_hosted: "https://{name}.s3.amazonaws.com".to_string(),
            aws_path_style: "https://s3.amazonaws.com/{name}".to_string(),
            gcp: "https://storage.googleapis.com/{name}".to_string(),
            azure_account: "https://{name}.blob.core.windows.net".to_string(),
            azure_containers: to_owned_list(&[
                "$web", "public", "data", "files", "backup", "images", "static",
            ]),
            alibaba: "https://{name}.{region}.aliyuncs.com".to_string(),
            alibaba_regions: to_owned_list(&[
                "oss-cn-hangzhou",
                "oss-cn-shanghai",
                "oss-cn-beijing",
                "oss-cn-shenzhen",
                "oss-cn-hongkong",
                "oss-us-west-1",
            ]),
            digitalocean: "https://{name}.{region}.digitaloceanspaces.com".to_string(),
            digitalocean_regions: to_owned_list(&["nyc3", "ams3", "sgp1", "fra1", "sfo2", "sfo3"]),
        }
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fill a URL template with the target name and (optionally) a region
pub fn expand_template(template: &str, name: &str, region: Option<&str>) -> String {
    let url = template.replace(NAME_PLACEHOLDER, name);
    match region {
        Some(region) => url.replace(REGION_PLACEHOLDER, region),
        None => url,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PROVIDER FILTER
// ═══════════════════════════════════════════════════════════════════════════

/// Ordered, duplicate-free selection of providers to probe for every target
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderFilter {
    kinds: Vec<ProviderKind>,
}

impl Default for ProviderFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl ProviderFilter {
    pub fn all() -> Self {
        Self {
            kinds: ProviderKind::ALL.to_vec(),
        }
    }

    pub fn only(kinds: &[ProviderKind]) -> Self {
        let mut filter = Self { kinds: Vec::new() };
        for kind in kinds {
            filter.push(*kind);
        }
        filter
    }

    /// Parse a comma separated token list such as `aws,gcs,spaces` or `all`.
    ///
    /// Returns the filter plus every token that did not map to a provider.
    pub fn parse(spec: &str) -> (Self, Vec<String>) {
        let mut filter = Self { kinds: Vec::new() };
        let mut unknown = Vec::new();

        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.eq_ignore_ascii_case("all") {
                for kind in ProviderKind::ALL {
                    filter.push(kind);
                }
                continue;
            }
            match ProviderKind::from_token(token) {
                Some(kind) => filter.push(kind),
                None => unknown.push(token.to_string()),
            }
        }

        (filter, unknown)
    }

    fn push(&mut self, kind: ProviderKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    pub fn kinds(&self) -> &[ProviderKind] {
        &self.kinds
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn describe(&self) -> String {
        self.kinds
            .iter()
            .map(|k| k.token())
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SCAN CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Per-request deadline in seconds
    pub timeout_secs: u64,
    /// Maximum number of targets probed at the same time
    pub concurrency: usize,
    /// Attempt an anonymous PUT (and cleanup DELETE) on existing containers
    pub check_write: bool,
    /// Decode the listing document of listable containers
    pub list_files: bool,
    /// Cap on listed entries per result
    pub max_files: usize,
    pub providers: ProviderFilter,
    /// Accept self-signed, expired or mismatched TLS certificates.
    ///
    /// Scan targets are unknown infrastructure, so this is on by default.
    /// It disables server authentication entirely: never reuse a client built
    /// this way for anything that sends credentials.
    pub accept_invalid_certs: bool,
    pub endpoints: Endpoints,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            concurrency: 10,
            check_write: false,
            list_files: false,
            max_files: 10,
            providers: ProviderFilter::all(),
            accept_invalid_certs: true,
            endpoints: Endpoints::default(),
        }
    }
}

impl ScanConfig {
    /// Wide fan-out with short deadlines
    pub fn aggressive() -> Self {
        Self {
            timeout_secs: 5,
            concurrency: 50,
            ..Self::default()
        }
    }

    /// Few workers and patient deadlines
    pub fn respectful() -> Self {
        Self {
            timeout_secs: 20,
            concurrency: 3,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("timeout must be at least 1 second");
        }
        if self.providers.is_empty() {
            bail!("no provider selected (use aws, gcp, azure, alibaba, do or all)");
        }
        Ok(())
    }
}
