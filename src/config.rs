use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ConfigError;

/// Default number of concurrent hashes
pub const DEFAULT_JOBS: usize = 20;

/// How the hasher pool admits new paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Admission {
    /// Start a new hash as soon as any running one finishes
    Steady,
    /// Admit K paths, wait for all K to finish, repeat
    Batch,
}

/// Digest used for content hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HashAlgorithm {
    /// 160-bit SHA-1
    Sha1,
    /// 256-bit BLAKE3
    Blake3,
}

/// Validated settings for a single scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    /// Minimum file size in bytes, 0 disables the filter
    pub min_size: u64,
    pub excludes: GlobSet,
    pub jobs: usize,
    pub admission: Admission,
    pub algorithm: HashAlgorithm,
    /// Confirm hash matches byte for byte before reporting them
    pub verify: bool,
}

impl ScanConfig {
    /// Configuration with defaults for everything but the root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            min_size: 0,
            excludes: GlobSet::empty(),
            jobs: DEFAULT_JOBS,
            admission: Admission::Steady,
            algorithm: HashAlgorithm::Sha1,
            verify: false,
        }
    }

    pub fn with_min_size_kb(mut self, kb: u64) -> Self {
        self.min_size = kb.saturating_mul(1024);
        self
    }

    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        self.excludes = build_glob_set(patterns)?;
        Ok(self)
    }

    /// Reject settings that make a scan impossible
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }
        if !self.root.exists() {
            return Err(ConfigError::MissingRoot(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ConfigError::NotADirectory(self.root.clone()));
        }
        if self.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(())
    }
}

/// Read exclude patterns from a file, one per line.
/// Blank lines and lines starting with `#` are ignored.
pub fn read_exclude_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ExcludeFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
