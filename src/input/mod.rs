//! Module turning the command line into a validated epoch selection and output root.

use std::{
    fmt,
    num::NonZeroUsize,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use clap::Parser;

use crate::{error::Error, telemetry::LogFormat};


/// Epoch generated when no selection is given.
pub const REFERENCE_EPOCH: u64 = 99_999;

pub const DEFAULT_OUTPUT_ROOT: &str = "./regression-data-fabricated";

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Generate fabricated test input data for settlement regression testing"
)]
pub struct Cli {
    /// Generate data for a single epoch
    #[arg(long)]
    pub epoch: Option<u64>,

    /// First epoch in range
    #[arg(long)]
    pub start_epoch: Option<u64>,

    /// Last epoch in range (inclusive), defaults to the start epoch
    #[arg(long, requires = "start_epoch")]
    pub end_epoch: Option<u64>,

    /// Root output directory
    #[arg(long, default_value = DEFAULT_OUTPUT_ROOT)]
    pub output_root: PathBuf,

    /// Legacy mode: the `<root>/<epoch>/inputs` directory of a single epoch
    #[arg(long, hide = true)]
    pub output_dir: Option<PathBuf>,

    /// Number of epochs generated concurrently
    #[arg(long, default_value = "1")]
    pub workers: NonZeroUsize,

    /// JSON file overriding the built-in fixture constants
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log format on stderr, `pretty` or `json` (default: `LOG_FORMAT` env variable)
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

/// What a run generates and where it writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTarget {
    pub selection: EpochSelection,
    pub output_root: PathBuf,
}

impl Cli {
    /// Resolves the epoch selection and the output root.
    ///
    /// The legacy `--output-dir` wins over `--output-root` and `--start-epoch`: its grandparent
    /// becomes the root and the epoch is `--epoch` or the reference epoch.
    pub fn target(&self) -> Result<RunTarget, Error> {
        if let Some(output_dir) = &self.output_dir {
            return Ok(RunTarget {
                selection: EpochSelection::single(self.epoch.unwrap_or(REFERENCE_EPOCH)),
                output_root: legacy_output_root(output_dir)?,
            });
        }

        let selection = match (self.epoch, self.start_epoch) {
            (Some(_), Some(_)) => return Err(Error::ConflictingSelection),
            (Some(epoch), None) => EpochSelection::single(epoch),
            (None, Some(start)) => EpochSelection::new(start, self.end_epoch.unwrap_or(start))?,
            (None, None) => EpochSelection::single(REFERENCE_EPOCH),
        };
        Ok(RunTarget {
            selection,
            output_root: self.output_root.clone(),
        })
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(LogFormat::from_env)
    }
}

fn legacy_output_root(output_dir: &Path) -> Result<PathBuf, Error> {
    let root = output_dir
        .parent()
        .and_then(Path::parent)
        .ok_or_else(|| Error::InvalidLegacyOutputDir {
            path: output_dir.to_path_buf(),
        })?;
    if root.as_os_str().is_empty() {
        Ok(PathBuf::from("."))
    } else {
        Ok(root.to_path_buf())
    }
}

/// Non-empty, inclusive range of epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochSelection {
    start: u64,
    end: u64,
}

impl EpochSelection {
    pub fn new(start: u64, end: u64) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(epoch: u64) -> Self {
        Self {
            start: epoch,
            end: epoch,
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn epochs(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }

    /// Number of selected epochs, saturating for the full u64 range.
    pub fn count(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }
}

impl fmt::Display for EpochSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
