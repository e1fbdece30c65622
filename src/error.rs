use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid settings detected before the scan starts. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("search path must not be empty")]
    EmptyRoot,

    #[error("search path {0} does not exist")]
    MissingRoot(PathBuf),

    #[error("search path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("--jobs must be at least 1")]
    ZeroJobs,

    #[error("cannot read exclude file {}: {source}", .path.display())]
    ExcludeFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid exclude pattern: {0}")]
    InvalidGlob(#[from] globset::Error),
}

/// A single entry or file that had to be left out of the scan.
///
/// These never stop the pipeline; they travel downstream as values and are
/// logged once by the aggregator.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot traverse {}: {message}", display_opt(.path))]
    Walk {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("cannot hash {}: {source}", .path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot compare {} byte for byte: {source}", .path.display())]
    Verify {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn display_opt(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<unknown entry>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_error_mentions_path_and_cause() {
        let err = ScanError::Hash {
            path: PathBuf::from("/data/a.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/data/a.txt"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_walk_error_without_path() {
        let err = ScanError::Walk {
            path: None,
            message: "loop detected".to_string(),
        };

        assert_eq!(err.to_string(), "cannot traverse <unknown entry>: loop detected");
    }
}
