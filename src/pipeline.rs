use std::io;
use std::thread;

use crossbeam_channel::bounded;
use indicatif::ProgressBar;

use crate::aggregator::{Aggregator, Finding};
use crate::cancel::CancelToken;
use crate::config::ScanConfig;
use crate::hasher::{HasherPool, PoolStats};
use crate::output::DuplicateReport;
use crate::scanner::{self, WalkStats};

/// Everything a finished scan produced
#[derive(Debug)]
pub struct ScanOutcome {
    pub report: DuplicateReport,
    pub walk: WalkStats,
    pub pool: PoolStats,
}

/// Run walker -> hasher pool -> aggregator over `config.root`.
///
/// The walker and the pool each get their own thread and the aggregator runs
/// on the caller's thread. Returns once the aggregator has drained the record
/// stream and both threads have been joined.
pub fn run_scan<F>(
    config: &ScanConfig,
    cancel: &CancelToken,
    progress: &ProgressBar,
    on_finding: F,
) -> io::Result<ScanOutcome>
where
    F: FnMut(&Finding),
{
    let (path_tx, path_rx) = bounded(config.jobs * 2);
    let (record_tx, record_rx) = bounded(config.jobs);
    let pool = HasherPool::new(config.jobs, config.admission);
    let mut aggregator = Aggregator::new(config.verify);

    let (walk, pool_stats) = thread::scope(|s| -> io::Result<_> {
        let walker = thread::Builder::new()
            .name("walker".to_string())
            .spawn_scoped(s, || scanner::walk(config, path_tx, cancel))?;

        let hasher = thread::Builder::new()
            .name("hasher-pool".to_string())
            .spawn_scoped(s, || pool.run(path_rx, record_tx, config.algorithm, cancel))?;

        aggregator.consume(record_rx, progress, on_finding);

        let walk = walker
            .join()
            .map_err(|_| io::Error::other("walker thread panicked"))?;
        let pool_stats = hasher
            .join()
            .map_err(|_| io::Error::other("hasher pool thread panicked"))??;
        Ok((walk, pool_stats))
    })?;

    tracing::info!(
        candidates = walk.candidates,
        walk_errors = walk.errors,
        admitted = pool_stats.admitted,
        hashed = aggregator.stats().files_hashed,
        skipped = aggregator.stats().files_skipped,
        "scan finished"
    );

    let (findings, stats) = aggregator.into_parts();
    let report = DuplicateReport::from_findings(findings, &stats, cancel.is_cancelled());

    Ok(ScanOutcome {
        report,
        walk,
        pool: pool_stats,
    })
}
