use parcel_core::PartitionError;
use thiserror::Error;

/// Errors raised while loading, generating or writing grids.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feature {index}: {reason}")]
    Feature { index: usize, reason: String },

    #[error("invalid synthetic parameters: {reason}")]
    Params { reason: String },

    #[error(transparent)]
    Partition(#[from] PartitionError),
}
