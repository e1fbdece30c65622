use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender};
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use sha1::{Digest, Sha1};

use crate::cancel::CancelToken;
use crate::config::{Admission, HashAlgorithm};
use crate::error::ScanError;
use crate::scanner::Candidate;

/// Read buffer size used while streaming file contents
const CHUNK_SIZE: usize = 64 * 1024;

/// A successfully hashed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Lowercase hex digest of the full file contents
    pub hash: String,
}

/// Hasher pool output: a record, or the reason a path was skipped
pub type Hashed = Result<FileRecord, ScanError>;

enum Digester {
    Sha1(Sha1),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Digester::Sha1(Sha1::new()),
            HashAlgorithm::Blake3 => Digester::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Digester::Sha1(h) => h.update(bytes),
            Digester::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Digester::Sha1(h) => format!("{:x}", h.finalize()),
            Digester::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

/// Hash everything `reader` yields and return the hex digest
pub fn hash_reader<R: Read>(mut reader: R, algorithm: HashAlgorithm) -> io::Result<String> {
    let mut digester = Digester::new(algorithm);
    let mut buffer = vec![0u8; CHUNK_SIZE];

    // Read in chunks
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        digester.update(&buffer[..bytes_read]);
    }

    Ok(digester.finalize_hex())
}

/// Compute the content hash of an entire file
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<FileRecord, ScanError> {
    let to_error = |source| ScanError::Hash {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_error)?;
    let hash = hash_reader(BufReader::new(file), algorithm).map_err(to_error)?;

    Ok(FileRecord {
        path: path.to_path_buf(),
        hash,
    })
}

/// Counters reported by the pool once its output closes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub admitted: usize,
    pub batches: usize,
}

/// Hashes candidate paths with at most `jobs` hashes running at once.
pub struct HasherPool {
    jobs: usize,
    admission: Admission,
}

impl HasherPool {
    pub fn new(jobs: usize, admission: Admission) -> Self {
        Self {
            jobs: jobs.max(1),
            admission,
        }
    }

    /// Hash every candidate from `rx` with `algorithm` and send the outcomes to `tx`
    pub fn run(
        &self,
        rx: Receiver<Candidate>,
        tx: Sender<Hashed>,
        algorithm: HashAlgorithm,
        cancel: &CancelToken,
    ) -> io::Result<PoolStats> {
        self.run_with(rx, tx, cancel, |path| hash_file(path, algorithm))
    }

    /// Like [`HasherPool::run`] but with a caller-supplied hashing function.
    ///
    /// Walker errors are forwarded to `tx` untouched and do not occupy a slot.
    /// The output closes when `tx` is dropped on return, which happens only
    /// after the input is drained (or cancelled) and every admitted hash has
    /// finished.
    pub fn run_with<F>(
        &self,
        rx: Receiver<Candidate>,
        tx: Sender<Hashed>,
        cancel: &CancelToken,
        work: F,
    ) -> io::Result<PoolStats>
    where
        F: Fn(&Path) -> Hashed + Sync,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("hasher-{i}"))
            .build()
            .map_err(io::Error::other)?;

        let stats = match self.admission {
            Admission::Steady => self.run_steady(&pool, &rx, &tx, cancel, &work),
            Admission::Batch => self.run_batched(&pool, &rx, &tx, cancel, &work),
        };

        tracing::debug!(
            admitted = stats.admitted,
            batches = stats.batches,
            "hasher pool drained"
        );
        Ok(stats)
    }

    /// K long-lived workers pulling from the shared input queue
    fn run_steady<F>(
        &self,
        pool: &rayon::ThreadPool,
        rx: &Receiver<Candidate>,
        tx: &Sender<Hashed>,
        cancel: &CancelToken,
        work: &F,
    ) -> PoolStats
    where
        F: Fn(&Path) -> Hashed + Sync,
    {
        let admitted = AtomicUsize::new(0);

        pool.in_place_scope(|s| {
            for _ in 0..self.jobs {
                let admitted = &admitted;
                s.spawn(move |_| {
                    while !cancel.is_cancelled() {
                        let Ok(candidate) = rx.recv() else { break };
                        let outcome = match candidate {
                            Ok(path) => {
                                admitted.fetch_add(1, Ordering::Relaxed);
                                work(&path)
                            }
                            Err(e) => Err(e),
                        };
                        if tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
        });

        PoolStats {
            admitted: admitted.into_inner(),
            batches: 0,
        }
    }

    /// Admit up to K paths, wait for the whole batch, repeat
    fn run_batched<F>(
        &self,
        pool: &rayon::ThreadPool,
        rx: &Receiver<Candidate>,
        tx: &Sender<Hashed>,
        cancel: &CancelToken,
        work: &F,
    ) -> PoolStats
    where
        F: Fn(&Path) -> Hashed + Sync,
    {
        let mut stats = PoolStats::default();

        loop {
            let mut in_batch = 0;
            // The scope returns only once every task spawned in it has finished.
            let drained = pool.in_place_scope(|s| {
                while in_batch < self.jobs {
                    if cancel.is_cancelled() {
                        return true;
                    }
                    match rx.recv() {
                        Ok(Ok(path)) => {
                            in_batch += 1;
                            s.spawn(move |_| {
                                let _ = tx.send(work(&path));
                            });
                        }
                        Ok(Err(e)) => {
                            let _ = tx.send(Err(e));
                        }
                        Err(_) => return true,
                    }
                }
                false
            });

            if in_batch > 0 {
                stats.batches += 1;
                stats.admitted += in_batch;
            }
            if drained {
                break;
            }
        }

        stats
    }
}
