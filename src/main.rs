// main.rs - bucketrust - Cloud Storage Bucket Scanner
// Purpose: Command-line front end: collect targets, run the parallel bucket
//          scanner, print findings and persist them

use anyhow::Result;
use bucketrust::config::{ProviderFilter, ScanConfig};
use bucketrust::metrics::ScanMetrics;
use bucketrust::parallel_executor::{read_targets_from_file, ParallelBucketScanner};
use bucketrust::report_generator::{print_result, save_flat_file, save_json_report};
use clap::{Parser, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// bucketrust - Cloud Storage Bucket Scanner
#[derive(Parser, Debug)]
#[command(
    name = "bucketrust",
    version,
    about = "Find publicly listable, readable or writable cloud storage buckets",
    long_about = r#"
Probes candidate bucket names against AWS S3, Google Cloud Storage, Azure Blob,
Alibaba OSS and DigitalOcean Spaces and reports anonymous access.

EXAMPLES:

  Single bucket:
    bucketrust -b company-backup

  Bucket list on selected providers:
    bucketrust -l buckets.txt -p aws,gcp

  List files and test anonymous write:
    bucketrust -b mydata --files --write

PROVIDERS:

  aws (s3), gcp (gcs, google), azure, alibaba (aliyun, oss),
  do (digitalocean, spaces), all
"#
)]
struct Args {
    // ═══════════════════════════════════════════════════════════════════════════
    // TARGET OPTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Single bucket name to scan
    #[arg(short, long, value_name = "NAME", help_heading = "Target Options")]
    bucket: Option<String>,

    /// File containing bucket names (one per line, # for comments)
    #[arg(short, long, value_name = "FILE", help_heading = "Target Options")]
    list: Option<PathBuf>,

    /// Providers to check: aws,gcp,azure,alibaba,do,all
    #[arg(short, long, default_value = "all", value_name = "LIST", help_heading = "Target Options")]
    providers: String,

    // ═══════════════════════════════════════════════════════════════════════════
    // CHECKS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Check for write access (creates and deletes a test file)
    #[arg(long, help_heading = "Checks")]
    write: bool,

    /// List files in accessible buckets
    #[arg(long, help_heading = "Checks")]
    files: bool,

    /// Maximum files to list per bucket
    #[arg(long, default_value = "10", value_name = "NUM", help_heading = "Checks")]
    max_files: usize,

    /// Verify TLS certificates (by default invalid certificates are accepted)
    #[arg(long, help_heading = "Checks")]
    strict_tls: bool,

    // ═══════════════════════════════════════════════════════════════════════════
    // PERFORMANCE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Number of buckets scanned concurrently [default: from preset]
    #[arg(short, long, value_name = "NUM", help_heading = "Performance")]
    threads: Option<usize>,

    /// Request timeout in seconds [default: from preset]
    #[arg(long, value_name = "SECONDS", help_heading = "Performance")]
    timeout: Option<u64>,

    /// Concurrency and timeout preset
    #[arg(long, value_enum, default_value = "standard", help_heading = "Performance")]
    preset: Preset,

    // ═══════════════════════════════════════════════════════════════════════════
    // OUTPUT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Output file for results
    #[arg(short, long, value_name = "FILE", help_heading = "Output")]
    output: Option<PathBuf>,

    /// Also export results and scan metrics as JSON
    #[arg(long, value_name = "FILE", help_heading = "Output")]
    json: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, help_heading = "Output")]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// 10 workers, 10s timeout
    Standard,
    /// 50 workers, 5s timeout
    Aggressive,
    /// 3 workers, 20s timeout
    Respectful,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    print_banner();

    let bucket = requested_bucket(args.bucket.as_deref());
    if bucket.is_none() && args.list.is_none() {
        print_usage();
        return Ok(());
    }

    let targets = match collect_targets(bucket, args.list.as_deref()) {
        Ok(targets) => targets,
        Err(e) => {
            eprintln!("{}", format!("[!] Error opening file: {:#}", e).red());
            return Ok(());
        }
    };

    let config = build_config(&args);
    if let Err(e) = config.validate() {
        eprintln!("{}", format!("[!] {}", e).red());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "\n[*] Scanning {} bucket(s) across providers: {}",
            targets.len(),
            config.providers.describe()
        )
        .cyan()
    );

    let mut metrics = ScanMetrics::start(targets.len(), provider_tokens(&config), config.concurrency);

    let progress = if targets.len() > 1 && !args.verbose {
        let bar = ProgressBar::new(targets.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("  {spinner} [{bar:40.cyan/blue}] {pos}/{len} buckets ({eta})") {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let Some(scanner) = build_scanner(config) else {
        return Ok(());
    };
    let scanner = scanner.with_progress(progress.clone());
    let printer = progress.clone();
    let results = scanner
        .scan(targets, move |result| print_result(result, Some(&printer)))
        .await;
    progress.finish_and_clear();

    metrics.finish(&results, scanner.peak_workers());

    println!(
        "{}",
        format!(
            "\n[*] Scan complete! Found {} accessible bucket(s) in {:.1}s",
            metrics.accessible_results, metrics.duration_seconds
        )
        .green()
        .bold()
    );

    if let Some(ref output) = args.output {
        if !results.is_empty() {
            match save_flat_file(&results, output) {
                Ok(()) => println!("{}", format!("[*] Results saved to {}", output.display()).cyan()),
                Err(e) => eprintln!("{}", format!("[!] Error creating output file: {:#}", e).red()),
            }
        }
    }

    if let Some(ref json) = args.json {
        match save_json_report(&results, &metrics, json) {
            Ok(()) => println!("{}", format!("[*] JSON report saved to {}", json.display()).cyan()),
            Err(e) => eprintln!("{}", format!("[!] Error writing JSON report: {:#}", e).red()),
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "bucketrust=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> ScanConfig {
    let preset = match args.preset {
        Preset::Standard => ScanConfig::default(),
        Preset::Aggressive => ScanConfig::aggressive(),
        Preset::Respectful => ScanConfig::respectful(),
    };

    let (providers, unknown) = ProviderFilter::parse(&args.providers);
    for token in unknown {
        eprintln!("{}", format!("[!] Unknown provider '{}', ignoring", token).yellow());
    }

    ScanConfig {
        timeout_secs: args.timeout.unwrap_or(preset.timeout_secs),
        concurrency: args.threads.unwrap_or(preset.concurrency),
        check_write: args.write,
        list_files: args.files,
        max_files: args.max_files,
        providers,
        accept_invalid_certs: !args.strict_tls,
        ..preset
    }
}

fn provider_tokens(config: &ScanConfig) -> Vec<String> {
    config
        .providers
        .kinds()
        .iter()
        .map(|k| k.token().to_string())
        .collect()
}

/// Scanner setup failures are reported like any other operator error
fn build_scanner(config: ScanConfig) -> Option<ParallelBucketScanner> {
    match ParallelBucketScanner::new(config) {
        Ok(scanner) => Some(scanner),
        Err(e) => {
            eprintln!("{}", format!("[!] Could not start scanner: {:#}", e).red());
            None
        }
    }
}

/// A blank `-b` counts as no bucket at all
fn requested_bucket(bucket: Option<&str>) -> Option<&str> {
    bucket.map(str::trim).filter(|b| !b.is_empty())
}

/// Single bucket first, then the list file in file order
fn collect_targets(bucket: Option<&str>, list: Option<&Path>) -> Result<Vec<String>> {
    let mut targets = Vec::new();
    if let Some(bucket) = requested_bucket(bucket) {
        targets.push(bucket.to_string());
    }
    if let Some(list) = list {
        targets.extend(read_targets_from_file(list)?);
    }
    Ok(targets)
}

fn print_banner() {
    println!("{}", "═══════════════════════════════════════════════════════════════".cyan().bold());
    println!("{}", format!("  bucketrust v{} - Cloud Storage Bucket Scanner", env!("CARGO_PKG_VERSION")).white().bold());
    println!("{}", "  AWS S3 | GCS | Azure Blob | Alibaba OSS | DO Spaces".white());
    println!("{}", "═══════════════════════════════════════════════════════════════".cyan().bold());
}

fn print_usage() {
    println!("\nUsage:");
    println!("  bucketrust -b company-backup");
    println!("  bucketrust -l buckets.txt -p aws,gcp");
    println!("  bucketrust -b mydata --files --write");
    println!("\nRun with --help for all options.");
    println!("\nProviders: aws, gcp, azure, alibaba, do (DigitalOcean), all");
}
