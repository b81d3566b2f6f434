use std::fmt;
use std::path::PathBuf;

use crate::batch::ProcessedImage;

pub type Result<T> = std::result::Result<T, MatteError>;

/// Filesystem operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    ReadDir,
    Read,
    Write,
    Delete,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            IoOp::ReadDir => "read dir",
            IoOp::Read => "read",
            IoOp::Write => "write",
            IoOp::Delete => "delete",
        };
        f.write_str(op)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatteError {
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{op} failed for {}: {source}", path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// Fail-fast batch stopped at `path`; `processed` were already replaced on disk.
    #[error("batch stopped at {} after {} replaced files: {source}", path.display(), processed.len())]
    Aborted {
        path: PathBuf,
        processed: Vec<ProcessedImage>,
        #[source]
        source: Box<MatteError>,
    },
}

impl MatteError {
    pub(crate) fn io(op: IoOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatteError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
