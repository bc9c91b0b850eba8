// parallel_executor.rs - Bounded Parallel Bucket Scanner
// Purpose: Run every selected provider probe for each target, with one worker
//          per target and a semaphore capping how many workers run at once

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::aggregator::ResultAggregator;
use crate::config::ScanConfig;
use crate::probe_client::ProbeClient;
use crate::result::ProbeResult;

// ═══════════════════════════════════════════════════════════════════════════
// WORKER GAUGE
// ═══════════════════════════════════════════════════════════════════════════

/// Live and peak count of running target workers
#[derive(Debug, Default)]
pub struct WorkerGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl WorkerGauge {
    pub fn enter(self: &Arc<Self>) -> WorkerGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        WorkerGuard {
            gauge: Arc::clone(self),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct WorkerGuard {
    gauge: Arc<WorkerGauge>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PARALLEL BUCKET SCANNER
// ═══════════════════════════════════════════════════════════════════════════

pub struct ParallelBucketScanner {
    config: Arc<ScanConfig>,
    client: ProbeClient,
    semaphore: Arc<Semaphore>,
    gauge: Arc<WorkerGauge>,
    completed: Arc<AtomicUsize>,
    progress: Option<ProgressBar>,
}

impl ParallelBucketScanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate().context("Invalid scan configuration")?;
        let client = ProbeClient::new(&config)?;
        let workers = config.concurrency;

        Ok(Self {
            config: Arc::new(config),
            client,
            semaphore: Arc::new(Semaphore::new(workers)),
            gauge: Arc::new(WorkerGauge::default()),
            completed: Arc::new(AtomicUsize::new(0)),
            progress: None,
        })
    }

    /// Advance this bar by one for every finished target
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Highest number of target workers that ran at the same time
    pub fn peak_workers(&self) -> usize {
        self.gauge.peak()
    }

    pub fn completed_targets(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Scan all targets and return the accepted results once every worker is done.
    ///
    /// `on_accept` sees each accepted result as soon as its worker produces it.
    /// Spawning waits for a free permit, so a saturated pool slows the
    /// submitter down instead of dropping targets.
    pub async fn scan<F>(&self, targets: Vec<String>, on_accept: F) -> Vec<ProbeResult>
    where
        F: Fn(&ProbeResult) + Send + Sync + 'static,
    {
        if targets.is_empty() {
            return Vec::new();
        }

        // Per-run collection: concurrent scans on one scanner stay separate
        let aggregator = ResultAggregator::new();
        let on_accept = Arc::new(on_accept);
        let mut handles = Vec::with_capacity(targets.len());

        for target in targets {
            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "worker semaphore closed, stopping submission");
                    break;
                }
            };

            let client = self.client.clone();
            let config = Arc::clone(&self.config);
            let aggregator = aggregator.clone();
            let gauge = Arc::clone(&self.gauge);
            let completed = Arc::clone(&self.completed);
            let progress = self.progress.clone();
            let on_accept = Arc::clone(&on_accept);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let _guard = gauge.enter();

                for result in scan_target(&target, &client, &config).await {
                    on_accept(&result);
                    aggregator.append(result);
                }

                completed.fetch_add(1, Ordering::SeqCst);
                if let Some(progress) = progress {
                    progress.inc(1);
                }
            });

            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "target worker did not finish");
            }
        }

        aggregator.drain()
    }
}

/// Every selected provider, one after another, keeping only accepted verdicts
pub async fn scan_target(target: &str, client: &ProbeClient, config: &ScanConfig) -> Vec<ProbeResult> {
    info!(bucket = target, "scanning bucket");

    let mut accepted = Vec::new();
    for provider in config.providers.kinds() {
        let result = provider.probe(target, client, config).await;
        if result.is_accepted() {
            accepted.push(result);
        }
    }
    accepted
}

/// Read targets from file
pub fn read_targets_from_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read target list {}", path.display()))?;
    Ok(content
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect())
}
