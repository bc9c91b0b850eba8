//! bucketrust - Cloud storage bucket exposure scanner
//!
//! Probes AWS S3, Google Cloud Storage, Azure Blob, Alibaba OSS and
//! DigitalOcean Spaces for anonymous list, read and write access on a set of
//! candidate container names, with a bounded number of targets in flight.
//!
//! The HTTP client accepts invalid TLS certificates unless
//! [`ScanConfig::accept_invalid_certs`] is turned off. That removes server
//! authentication for every probe request; the probes send no credentials,
//! but the verdicts can be spoofed by anyone able to intercept the traffic.
//!
//! Verdicts are heuristic. In particular an AWS bucket answering 403 is
//! reported readable whenever `test.txt` inside it does not also answer 403.

pub mod aggregator;
pub mod config;
pub mod listing;
pub mod metrics;
pub mod parallel_executor;
pub mod probe_client;
pub mod providers;
pub mod report_generator;
pub mod result;
pub mod write_probe;

pub use aggregator::ResultAggregator;
pub use config::{Endpoints, ProviderFilter, ScanConfig};
pub use listing::ListingFormat;
pub use parallel_executor::ParallelBucketScanner;
pub use probe_client::ProbeClient;
pub use providers::ProviderKind;
pub use result::{Exposure, ProbeResult};
