// report_generator.rs - Console and file reports for bucket findings
// Generates the colored per-result blocks, the flat results file and the JSON export

use anyhow::{Context, Result};
use colored::*;
use indicatif::ProgressBar;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::metrics::ScanMetrics;
use crate::result::{Exposure, ProbeResult};

/// Colored report block for one accepted result
pub fn format_result_block(result: &ProbeResult) -> String {
    let status = result.exposure();
    let header = match status {
        Exposure::Critical | Exposure::High => format!("[{}]", status).red().bold(),
        Exposure::Medium | Exposure::Exists => format!("[{}]", status).yellow().bold(),
    };
    let branch = "├─".green();

    let mut block = format!("\n{} {}\n", header, result.name.bold());
    block.push_str(&format!("  {} Provider: {}\n", branch, result.provider.label().cyan()));
    block.push_str(&format!("  {} URL: {}\n", branch, result.url));
    block.push_str(&format!("  {} Public Read: {}\n", branch, result.public_read));
    block.push_str(&format!("  {} Public List: {}\n", branch, result.public_list));
    block.push_str(&format!("  {} Public Write: {}", branch, result.public_write));

    if !result.files.is_empty() {
        block.push_str(&format!("\n  {} Files found ({}):", "└─".green(), result.files.len()));
        for file in &result.files {
            block.push_str(&format!("\n      • {}", file));
        }
    }

    block
}

/// Print a result block, above the progress bar when one is drawn
pub fn print_result(result: &ProbeResult, progress: Option<&ProgressBar>) {
    let block = format_result_block(result);
    match progress {
        Some(bar) if !bar.is_hidden() => bar.println(block),
        _ => println!("{}", block),
    }
}

/// Write one `name | provider | url | Read | List | Write` line per result
pub fn save_flat_file(results: &[ProbeResult], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for result in results.iter().filter(|r| r.is_accepted()) {
        writeln!(writer, "{}", result.summary_line())?;
    }

    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metrics: &'a ScanMetrics,
    results: Vec<&'a ProbeResult>,
}

/// Pretty JSON document with the run metrics and every accepted result
pub fn save_json_report(results: &[ProbeResult], metrics: &ScanMetrics, path: &Path) -> Result<()> {
    let report = JsonReport {
        metrics,
        results: results.iter().filter(|r| r.is_accepted()).collect(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write JSON report {}", path.display()))?;
    Ok(())
}
