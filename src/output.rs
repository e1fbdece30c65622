use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::aggregator::{AggregateStats, Finding};

/// Statistics about a finished (or cancelled) scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    /// Files whose content hash was computed
    pub files_hashed: usize,
    /// Entries and files left out because of an error
    pub files_skipped: usize,
    /// Number of duplicate findings
    pub duplicate_files: usize,
    pub duplicate_groups: usize,
    /// Total wasted space in bytes (could be reclaimed)
    pub wasted_bytes: u64,
    pub cancelled: bool,
}

/// All paths sharing one content hash
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub hash: String,
    /// Size of each file in this group
    pub size: u64,
    /// Sorted, so groups compare equal across runs
    pub files: Vec<PathBuf>,
}

/// Complete report of duplicate findings
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub stats: ScanStats,
    /// In arrival order
    pub findings: Vec<Finding>,
    /// Sorted by hash
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// Build a report from the aggregator's findings
    pub fn from_findings(findings: Vec<Finding>, stats: &AggregateStats, cancelled: bool) -> Self {
        let mut by_hash: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();
        for finding in &findings {
            let files = by_hash
                .entry(finding.hash.as_str())
                .or_insert_with(|| vec![finding.first.clone()]);
            files.push(finding.duplicate.clone());
        }

        let mut groups = Vec::with_capacity(by_hash.len());
        let mut wasted_bytes: u64 = 0;

        for (hash, mut files) in by_hash {
            files.sort();

            // All files in a group have the same content, so the same size
            let size = files
                .first()
                .and_then(|p| fs::metadata(p).ok())
                .map(|m| m.len())
                .unwrap_or(0);

            // Wasted space = size * (count - 1), since we keep one copy
            wasted_bytes += size * (files.len() as u64 - 1);

            groups.push(DuplicateGroup {
                hash: hash.to_string(),
                size,
                files,
            });
        }

        let stats = ScanStats {
            files_hashed: stats.files_hashed,
            files_skipped: stats.files_skipped,
            duplicate_files: findings.len(),
            duplicate_groups: groups.len(),
            wasted_bytes,
            cancelled,
        };

        Self {
            stats,
            findings,
            groups,
        }
    }

    pub fn has_duplicates(&self) -> bool {
        !self.findings.is_empty()
    }

    /// Output as human-readable colored text
    pub fn print_human(&self) {
        println!("\n{}", "Duplicate Report".bold().underline());
        println!("  Hashed: {} files", self.stats.files_hashed.to_string().cyan());
        println!(
            "  Skipped: {} files",
            self.stats.files_skipped.to_string().yellow()
        );
        println!(
            "  Duplicate files: {} in {} groups",
            self.stats.duplicate_files.to_string().cyan(),
            self.stats.duplicate_groups.to_string().cyan()
        );
        println!(
            "  Wasted space: {} bytes",
            self.stats.wasted_bytes.to_string().yellow()
        );

        if self.stats.cancelled {
            println!("\n{}", "Scan cancelled, results are partial.".red());
        } else if self.groups.is_empty() {
            println!("\n{}", "No duplicates found.".green());
        }
    }

    /// Output as JSON
    pub fn print_json(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing to JSON: {}", e),
        }
    }
}

/// Format a finding as a single report line
pub fn finding_line(finding: &Finding) -> String {
    format!(
        "duplicate found at {} of {}, hash {}",
        finding.first.display(),
        finding.duplicate.display(),
        finding.hash
    )
}

/// Print a finding the moment it is discovered
pub fn print_finding(finding: &Finding) {
    println!("{}", finding_line(finding).yellow());
}
