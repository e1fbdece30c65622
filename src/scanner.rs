use std::path::PathBuf;

use crossbeam_channel::Sender;
use jwalk::WalkDir;

use crate::cancel::CancelToken;
use crate::config::ScanConfig;
use crate::error::ScanError;

/// Walker output: a candidate path or an entry that could not be inspected
pub type Candidate = Result<PathBuf, ScanError>;

/// Counters reported by the walker once it finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub candidates: usize,
    pub errors: usize,
}

/// Stream every regular file under `config.root` that is at least
/// `config.min_size` bytes into `tx`.
///
/// Returns when the tree is exhausted, the token is cancelled, or the
/// receiving side hangs up. Dropping `tx` on return closes the stream.
pub fn walk(config: &ScanConfig, tx: Sender<Candidate>, cancel: &CancelToken) -> WalkStats {
    let min = config.min_size;
    let excludes = config.excludes.clone();
    let mut stats = WalkStats::default();

    let walker = WalkDir::new(&config.root)
        .skip_hidden(false)
        .follow_links(false) // Don't follow symlinks to avoid infinite loops
        .process_read_dir(move |_depth, _path, _state, children| {
            if excludes.is_empty() {
                return;
            }
            children.retain(|child| match child {
                Ok(entry) => !excludes.is_match(entry.file_name()),
                Err(_) => true,
            });
        });

    for entry in walker {
        if cancel.is_cancelled() {
            tracing::debug!("walker cancelled");
            break;
        }

        let item = match entry {
            Ok(entry) => match entry.metadata() {
                Ok(metadata) => {
                    if !metadata.is_file() || metadata.len() < min {
                        continue;
                    }
                    stats.candidates += 1;
                    Ok(entry.path())
                }
                Err(e) => {
                    stats.errors += 1;
                    Err(ScanError::Walk {
                        path: Some(entry.path()),
                        message: e.to_string(),
                    })
                }
            },
            Err(e) => {
                stats.errors += 1;
                Err(ScanError::Walk {
                    path: e.path().map(|p| p.to_path_buf()),
                    message: e.to_string(),
                })
            }
        };

        if tx.send(item).is_err() {
            break;
        }
    }

    stats
}
