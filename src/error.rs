//! Module defining the errors which are exposed to the users of the crate

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A single epoch and an epoch range were requested at the same time
    #[error("--epoch cannot be combined with --start-epoch")]
    ConflictingSelection,

    /// Range whose last epoch lies before its first one
    #[error("invalid epoch range: end epoch {end} is before start epoch {start}")]
    InvalidRange { start: u64, end: u64 },

    /// The slot derived from the epoch does not fit into a u64
    #[error("epoch {epoch} is out of range: its slot overflows")]
    SlotOverflow { epoch: u64 },

    /// Legacy `--output-dir` that is not of the shape `<root>/<epoch>/inputs`
    #[error("legacy output dir {} must look like <root>/<epoch>/inputs", path.display())]
    InvalidLegacyOutputDir { path: PathBuf },

    /// Config file that parses but cannot drive a generation run
    #[error("invalid fixture config: {0}")]
    InvalidConfig(String),

    /// Reading or writing a file failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding a document or decoding a config file failed
    #[error("JSON error at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A worker thread of the parallel orchestrator died
    #[error("epoch worker thread panicked")]
    WorkerPanicked,
}

pub(crate) fn io_error(path: impl AsRef<Path>, source: std::io::Error) -> Error {
    Error::Io {
        path: path.as_ref().to_path_buf(),
        source,
    }
}

pub(crate) fn json_error(path: impl AsRef<Path>, source: serde_json::Error) -> Error {
    Error::Json {
        path: path.as_ref().to_path_buf(),
        source,
    }
}
