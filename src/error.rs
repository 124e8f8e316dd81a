use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a usable sample for one tick.
///
/// Both variants are contained within the tick that hit them: the cycle is
/// skipped and the previous frame stays on screen.
#[derive(Debug, Error)]
pub enum SampleError {
    /// A counter file could not be read at all.
    #[error("counter source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Data was read but is structurally invalid or incomplete.
    #[error("malformed snapshot: {reason}")]
    MalformedSnapshot { reason: String },
}

impl SampleError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        SampleError::MalformedSnapshot {
            reason: reason.into(),
        }
    }

    pub fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SampleError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }
}

/// Fatal errors raised before the refresh loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("terminal unavailable: {0}")]
    Terminal(#[from] io::Error),

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
