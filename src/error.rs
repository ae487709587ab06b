use std::path::PathBuf;

use thiserror::Error;

/// Failures the command layer reports to the user.
///
/// Everything else travels as `anyhow::Error` with context attached; use
/// `downcast_ref::<MediaError>()` to branch on one of these.
#[derive(Debug, Error)]
pub(crate) enum MediaError {
    #[error("no media found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("multiple candidates in {}: {}", .dir.display(), .candidates.join(", "))]
    AmbiguousCandidate {
        dir: PathBuf,
        candidates: Vec<String>,
    },

    #[error("series at {} has been completed", .0.display())]
    SeriesComplete(PathBuf),

    #[error("queue at {} changed during playback, series progress not recorded", .0.display())]
    ConcurrentModification(PathBuf),

    #[error("failed to parse {}: {message}", .path.display())]
    MalformedDocument { path: PathBuf, message: String },

    #[error("{0}")]
    ConfigurationMissing(String),

    #[error("series already exists at {}, use --force to overwrite", .0.display())]
    StoreExists(PathBuf),

    #[error("{} queues an alias itself, alias chains are not supported", .0.display())]
    NestedAlias(PathBuf),
}

impl MediaError {
    /// Errors that `--ignore-errors` may skip over in batch commands.
    pub(crate) fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::AmbiguousCandidate { .. } | Self::SeriesComplete(_)
        )
    }
}
