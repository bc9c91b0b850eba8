use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::result::{Exposure, ProbeResult};

/// Aggregate statistics for one scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetrics {
    pub scan_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: f64,

    pub targets_scanned: usize,
    pub providers: Vec<String>,
    pub concurrency: usize,
    pub peak_workers: usize,

    /// Results that confirmed existence or access
    pub accepted_results: usize,
    /// Results with read, list or write access
    pub accessible_results: usize,
    pub by_provider: BTreeMap<String, usize>,
    pub by_exposure: BTreeMap<String, usize>,
}

impl ScanMetrics {
    pub fn start(targets_scanned: usize, providers: Vec<String>, concurrency: usize) -> Self {
        Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: 0.0,
            targets_scanned,
            providers,
            concurrency,
            peak_workers: 0,
            accepted_results: 0,
            accessible_results: 0,
            by_provider: BTreeMap::new(),
            by_exposure: BTreeMap::new(),
        }
    }

    /// Close the run and tally the accepted results
    pub fn finish(&mut self, results: &[ProbeResult], peak_workers: usize) {
        let end = Utc::now();
        self.end_time = Some(end);
        self.duration_seconds = (end - self.start_time).num_milliseconds() as f64 / 1000.0;
        self.peak_workers = peak_workers;

        self.accepted_results = results.len();
        self.accessible_results = results.iter().filter(|r| r.is_accessible()).count();

        self.by_provider.clear();
        self.by_exposure.clear();
        for level in Exposure::ALL {
            self.by_exposure.insert(level.label().to_string(), 0);
        }
        for result in results {
            *self.by_provider.entry(result.provider.label().to_string()).or_insert(0) += 1;
            *self.by_exposure.entry(result.exposure().label().to_string()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;

    #[test]
    fn test_finish_counts() {
        let mut listable = ProbeResult::new("open", ProviderKind::Aws);
        listable.exists = true;
        listable.public_list = true;
        listable.public_read = true;

        let mut private = ProbeResult::new("locked", ProviderKind::Azure);
        private.exists = true;

        let mut metrics = ScanMetrics::start(2, vec!["aws".into(), "azure".into()], 10);
        metrics.finish(&[listable, private], 2);

        assert!(metrics.end_time.is_some());
        assert_eq!(metrics.accepted_results, 2);
        assert_eq!(metrics.accessible_results, 1);
        assert_eq!(metrics.by_provider["AWS S3"], 1);
        assert_eq!(metrics.by_provider["Azure Blob"], 1);
        assert_eq!(metrics.by_exposure["HIGH - PUBLIC LIST"], 1);
        assert_eq!(metrics.by_exposure["EXISTS"], 1);
        assert_eq!(metrics.by_exposure["CRITICAL - PUBLIC WRITE"], 0);
        assert_eq!(metrics.peak_workers, 2);
    }
}
