use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;
use indicatif::ProgressBar;
use serde::Serialize;

use crate::error::ScanError;
use crate::hasher::{FileRecord, Hashed};

/// Two paths whose contents hashed to the same value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// First path seen with this hash
    pub first: PathBuf,
    pub duplicate: PathBuf,
    pub hash: String,
}

/// Counters collected while draining the record stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub files_hashed: usize,
    pub files_skipped: usize,
    /// Hash matches rejected by byte-for-byte verification
    pub collisions: usize,
}

/// Maps each content hash to the first path seen with it and reports every
/// later path with a known hash as a duplicate.
///
/// Which member of a group becomes the first path depends on arrival order,
/// which is not stable across runs when hashes are computed concurrently.
#[derive(Debug, Default)]
pub struct Aggregator {
    index: HashMap<String, PathBuf>,
    findings: Vec<Finding>,
    stats: AggregateStats,
    verify: bool,
}

impl Aggregator {
    pub fn new(verify: bool) -> Self {
        Self {
            verify,
            ..Self::default()
        }
    }

    /// Drain `rx` until every sender is gone, calling `on_finding` for each
    /// duplicate as soon as it is found.
    pub fn consume<F>(&mut self, rx: Receiver<Hashed>, progress: &ProgressBar, mut on_finding: F)
    where
        F: FnMut(&Finding),
    {
        for outcome in rx {
            progress.inc(1);
            if let Some(finding) = self.observe(outcome) {
                on_finding(finding);
            }
        }
    }

    /// Account for a single hasher outcome
    pub fn observe(&mut self, outcome: Hashed) -> Option<&Finding> {
        match outcome {
            Ok(record) => {
                self.stats.files_hashed += 1;
                self.insert(record)
            }
            Err(e) => {
                self.skip(e);
                None
            }
        }
    }

    fn insert(&mut self, record: FileRecord) -> Option<&Finding> {
        let Some(first) = self.index.get(&record.hash).cloned() else {
            self.index.insert(record.hash, record.path);
            return None;
        };
        let FileRecord { path, hash } = record;

        if self.verify {
            match files_identical(&first, &path) {
                Ok(true) => {}
                Ok(false) => {
                    self.stats.collisions += 1;
                    tracing::warn!(
                        "hash collision: {} and {} share hash {} but differ",
                        first.display(),
                        path.display(),
                        hash
                    );
                    return None;
                }
                Err(source) => {
                    self.skip(ScanError::Verify { path, source });
                    return None;
                }
            }
        }

        self.findings.push(Finding {
            first,
            duplicate: path,
            hash,
        });
        self.findings.last()
    }

    fn skip(&mut self, error: ScanError) {
        self.stats.files_skipped += 1;
        tracing::warn!("{error}");
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn into_parts(self) -> (Vec<Finding>, AggregateStats) {
        (self.findings, self.stats)
    }
}

/// Compare two files byte for byte
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    let file_a = File::open(a)?;
    let file_b = File::open(b)?;
    if file_a.metadata()?.len() != file_b.metadata()?.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::new(file_a);
    let mut reader_b = BufReader::new(file_b);
    let mut buf_a = vec![0u8; 64 * 1024];
    let mut buf_b = vec![0u8; 64 * 1024];

    loop {
        let n = reader_a.read(&mut buf_a)?;
        if n == 0 {
            let mut probe = [0u8; 1];
            return Ok(reader_b.read(&mut probe)? == 0);
        }
        match reader_b.read_exact(&mut buf_b[..n]) {
            Ok(()) => {}
            // Shrunk since the size check
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e),
        }
        if buf_a[..n] != buf_b[..n] {
            return Ok(false);
        }
    }
}
