// result.rs - Probe verdicts
// Purpose: The per-target, per-provider exposure verdict and its derived severity

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::providers::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub name: String,
    pub provider: ProviderKind,
    /// Candidate URL that decided the verdict
    pub url: String,
    pub exists: bool,
    pub public_read: bool,
    pub public_list: bool,
    pub public_write: bool,
    pub files: Vec<String>,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn new(name: &str, provider: ProviderKind) -> Self {
        Self {
            name: name.to_string(),
            provider,
            url: String::new(),
            exists: false,
            public_read: false,
            public_list: false,
            public_write: false,
            files: Vec::new(),
            error: None,
        }
    }

    /// Anonymous listing worked, which implies anonymous read
    pub(crate) fn mark_listable(&mut self) {
        self.exists = true;
        self.public_list = true;
        self.public_read = true;
    }

    /// Whether the scan reports this result at all
    pub fn is_accepted(&self) -> bool {
        self.exists || self.public_read || self.public_list
    }

    /// Some anonymous access was confirmed
    pub fn is_accessible(&self) -> bool {
        self.public_read || self.public_list || self.public_write
    }

    pub fn exposure(&self) -> Exposure {
        if self.public_write {
            Exposure::Critical
        } else if self.public_list {
            Exposure::High
        } else if self.public_read {
            Exposure::Medium
        } else {
            Exposure::Exists
        }
    }

    /// One line of the flat results file
    pub fn summary_line(&self) -> String {
        format!(
            "{} | {} | {} | Read:{} | List:{} | Write:{}",
            self.name, self.provider, self.url, self.public_read, self.public_list, self.public_write
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exposure {
    Critical,
    High,
    Medium,
    Exists,
}

impl Exposure {
    pub const ALL: [Exposure; 4] = [Exposure::Critical, Exposure::High, Exposure::Medium, Exposure::Exists];

    pub fn label(&self) -> &'static str {
        match self {
            Exposure::Critical => "CRITICAL - PUBLIC WRITE",
            Exposure::High => "HIGH - PUBLIC LIST",
            Exposure::Medium => "MEDIUM - PUBLIC READ",
            Exposure::Exists => "EXISTS",
        }
    }
}

impl fmt::Display for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_is_discarded() {
        let result = ProbeResult::new("ghost-bucket", ProviderKind::Gcp);
        assert!(!result.is_accepted());
        assert!(!result.is_accessible());
        assert_eq!(result.exposure(), Exposure::Exists);
    }

    #[test]
    fn test_exposure_ordering() {
        let mut result = ProbeResult::new("b", ProviderKind::Aws);
        result.exists = true;
        assert!(result.is_accepted());
        assert!(!result.is_accessible());

        result.public_read = true;
        assert_eq!(result.exposure(), Exposure::Medium);

        result.mark_listable();
        assert_eq!(result.exposure(), Exposure::High);

        result.public_write = true;
        assert_eq!(result.exposure(), Exposure::Critical);
        assert!(Exposure::Critical < Exposure::Exists);
    }

    #[test]
    fn test_summary_line() {
        let mut result = ProbeResult::new("open-bucket", ProviderKind::Aws);
        result.url = "https://open-bucket.s3.amazonaws.com".to_string();
        result.mark_listable();
        assert_eq!(
            result.summary_line(),
            "open-bucket | AWS S3 | https://open-bucket.s3.amazonaws.com | Read:true | List:true | Write:false"
        );
    }
}
