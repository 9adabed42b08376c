use crate::cell::CellId;
use thiserror::Error;

/// Errors raised while validating a single polygon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("polygon exterior ring has {points} points, at least 4 are required")]
    EmptyRing { points: usize },

    #[error("polygon has zero area")]
    ZeroArea,

    #[error("polygon exterior ring intersects itself")]
    SelfIntersecting,

    #[error("polygon has no centroid")]
    NoCentroid,
}

/// Errors caused by unusable inputs or configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("cell collection is empty")]
    EmptyCollection,

    #[error("no partners configured")]
    NoPartners,

    #[error("partner '{partner}' has no leaders configured")]
    NoLeaders { partner: String },

    #[error("partner '{code}' is configured more than once")]
    DuplicatePartner { code: String },

    #[error("leader '{code}' is configured more than once for partner '{partner}'")]
    DuplicateLeader { partner: String, code: String },

    #[error("partner '{code}' has invalid resources {value}")]
    InvalidResources { code: String, value: f64 },

    #[error("partner resources sum to zero")]
    ZeroTotalResources,

    #[error("cell {id} has risk {risk}, expected a finite value in [0, 1]")]
    InvalidRisk { id: CellId, risk: f64 },

    #[error("seed {seed} is not a usable cell id (collection has {len} cells or the id is repeated)")]
    InvalidSeed { seed: CellId, len: usize },

    #[error("expected {expected} partner seeds, got {actual}")]
    SeedCountMismatch { expected: usize, actual: usize },

    #[error("spatial index bucket size {value} must be finite and positive")]
    InvalidBucketSize { value: f64 },
}

/// Top-level error for building collections and running partitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("cell {id} has invalid geometry: {source}")]
    Cell {
        id: CellId,
        #[source]
        source: GeometryError,
    },
}
