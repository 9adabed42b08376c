//! Parcel Core
//!
//! Splits a grid of risk-weighted cells among partners in proportion to
//! their resources, then splits each partner's territory among its team
//! leads into contiguous zones:
//! - Geometry adapter (touches, contains, centroid, bounds, intersect)
//! - Bounding-box spatial index
//! - Farthest-point seed selection
//! - Round-robin region growing
//! - Two-level partition orchestration

pub mod cell;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grow;
pub mod index;
pub mod math;
pub mod partition;
pub mod seed;
pub mod summary;

#[cfg(test)]
mod fixtures;

pub use cell::{Cell, CellCollection, CellId, CellSet, SubCollection};
pub use config::{PartitionConfig, PartnerConfig};
pub use error::{GeometryError, InputError, PartitionError};
pub use geometry::{Bounds, Geometry, PlanarGeometry};
pub use grow::{Growth, GrowthState, GrowthStats, RegionGrower, RegionOutcome, RegionSpec};
pub use index::{SpatialIndex, SpatialIndexConfig};
pub use partition::{CellLabels, PartitionOrchestrator, PartitionResult, UNASSIGNED};
pub use seed::{SeedRule, SeedSelector};
pub use summary::{AllocationSummary, PartnerSummary, RegionSummary, SummaryState};

pub use geo;
pub use glam;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
