//! Seeded synthetic risk grids.
//!
//! Risk blobs are scattered inside a circular region, merged into one risk
//! zone and discretized into square cells. Everything random flows through
//! [`DeterministicRng`], so a seed fully determines the grid.

use crate::error::AssetError;
use geo::{BooleanOps, BoundingRect, Contains, Coord, LineString, MultiPolygon, Point, Polygon, Relate};
use parcel_core::geometry::rectangle;
use parcel_core::math::DeterministicRng;
use parcel_core::{Cell, CellCollection, Geometry, PlanarGeometry};
use serde::{Deserialize, Serialize};

/// Kilometres per degree used to express radii in degrees.
const KM_PER_DEGREE: f64 = 111.0;

/// Sampling attempts allowed per requested blob before giving up.
const ATTEMPTS_PER_BLOB: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticParams {
    pub seed: u64,
    /// Region centre as `[lon, lat]`.
    pub center: [f64; 2],
    /// Region radius in degrees.
    pub region_radius: f64,
    /// Blob radius in degrees.
    pub blob_radius: f64,
    pub blob_count: usize,
    /// Cell edge length in degrees.
    pub resolution: f64,
    pub risk_mean: f64,
    pub risk_std_dev: f64,
    /// Emit zero-risk cells for grid squares outside the risk zone.
    pub keep_clear_cells: bool,
    pub circle_segments: usize,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            seed: parcel_core::math::DEFAULT_SEED,
            center: [36.232, 49.988],
            region_radius: 100.0 / KM_PER_DEGREE,
            blob_radius: 7.0 / KM_PER_DEGREE,
            blob_count: 201,
            resolution: 0.01,
            risk_mean: 0.5,
            risk_std_dev: 0.2,
            keep_clear_cells: true,
            circle_segments: 64,
        }
    }
}

impl SyntheticParams {
    fn validate(&self) -> Result<(), AssetError> {
        let reason = if !(self.resolution.is_finite() && self.resolution > 0.0) {
            "resolution must be positive"
        } else if !(self.region_radius.is_finite() && self.region_radius > 0.0) {
            "region_radius must be positive"
        } else if !(self.blob_radius.is_finite() && self.blob_radius > 0.0) {
            "blob_radius must be positive"
        } else if self.circle_segments < 3 {
            "circle_segments must be at least 3"
        } else if !self.risk_std_dev.is_finite() || self.risk_std_dev < 0.0 {
            "risk_std_dev must be non-negative"
        } else {
            return Ok(());
        };
        Err(AssetError::Params {
            reason: reason.to_string(),
        })
    }
}

/// Generate a grid, optionally clipped against `boundary`.
///
/// Cells inside any boundary part are kept whole. Cells straddling it are
/// replaced by their overlapping pieces, each keeping the cell's risk, and
/// cells outside it are dropped.
pub fn generate(
    params: &SyntheticParams,
    boundary: Option<&MultiPolygon<f64>>,
) -> Result<CellCollection, AssetError> {
    params.validate()?;
    let geometry = PlanarGeometry::new();
    let mut rng = DeterministicRng::new(params.seed);

    let center = Coord {
        x: params.center[0],
        y: params.center[1],
    };
    let region = circle(center, params.region_radius, params.circle_segments);
    let zone = risk_zone(params, &region, &mut rng);

    let Some(extent) = zone.bounding_rect() else {
        tracing::warn!("risk zone is empty, no cells generated");
        return Ok(CellCollection::new(Vec::new(), &geometry)?);
    };

    // Neighbouring cells share the exact same edge coordinate, which the
    // touch test relies on.
    let xs = grid_edges(extent.min().x, extent.max().x, params.resolution);
    let ys = grid_edges(extent.min().y, extent.max().y, params.resolution);
    let cols = xs.len() - 1;
    let rows = ys.len() - 1;
    let mut cells = Vec::new();
    let mut risky = 0usize;

    for x in xs.windows(2) {
        for y in ys.windows(2) {
            let polygon = rectangle(x[0], y[0], x[1], y[1]);
            let risk = if zone.relate(&polygon).is_contains() {
                risky += 1;
                rng.gauss(params.risk_mean, params.risk_std_dev).clamp(0.0, 1.0)
            } else if params.keep_clear_cells {
                0.0
            } else {
                continue;
            };

            match boundary {
                None => cells.push(Cell::new(polygon, risk)),
                Some(boundary)
                    if boundary.iter().any(|part| geometry.contains(part, &polygon)) =>
                {
                    cells.push(Cell::new(polygon, risk))
                }
                Some(boundary) => {
                    for part in boundary {
                        if let Some(pieces) = geometry.intersect(part, &polygon) {
                            cells.extend(pieces.into_iter().map(|piece| Cell::new(piece, risk)));
                        }
                    }
                }
            }
        }
    }

    tracing::info!(
        seed = params.seed,
        cols,
        rows,
        risky,
        cells = cells.len(),
        "synthetic grid generated"
    );
    Ok(CellCollection::new(cells, &geometry)?)
}

/// Cell edges from `min`, stepping by `step` until `max` is covered.
///
/// Each edge is the previous one plus `step`, so a cell's far edge is
/// bit-identical to its neighbour's near edge.
fn grid_edges(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut edges = vec![min];
    let mut edge = min;
    while edge < max {
        let next = edge + step;
        if next <= edge {
            break;
        }
        edges.push(next);
        edge = next;
    }
    if edges.len() == 1 {
        edges.push(min + step);
    }
    edges
}

/// Union of blobs whose centres fall inside `region`.
fn risk_zone(
    params: &SyntheticParams,
    region: &Polygon<f64>,
    rng: &mut DeterministicRng,
) -> MultiPolygon<f64> {
    let Some(rect) = region.bounding_rect() else {
        return MultiPolygon::new(Vec::new());
    };

    let mut zone = MultiPolygon::new(Vec::new());
    let mut placed = 0usize;
    let mut attempts = 0usize;
    let max_attempts = params.blob_count.saturating_mul(ATTEMPTS_PER_BLOB);

    while placed < params.blob_count {
        if attempts >= max_attempts {
            tracing::warn!(placed, requested = params.blob_count, "blob sampling gave up");
            break;
        }
        attempts += 1;

        let x = rng.uniform(rect.min().x, rect.max().x);
        let y = rng.uniform(rect.min().y, rect.max().y);
        if !region.contains(&Point::new(x, y)) {
            continue;
        }
        let blob = circle(Coord { x, y }, params.blob_radius, params.circle_segments);
        zone = zone.union(&MultiPolygon::new(vec![blob]));
        placed += 1;
    }

    tracing::debug!(placed, attempts, parts = zone.0.len(), "risk zone built");
    zone
}

fn circle(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let step = std::f64::consts::TAU / segments as f64;
    let ring: Vec<Coord<f64>> = (0..segments)
        .map(|k| {
            let angle = k as f64 * step;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(ring), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::{
        CellSet, PartitionConfig, PartitionOrchestrator, PartnerConfig, RegionGrower, RegionSpec,
        SpatialIndex,
    };

    fn small() -> SyntheticParams {
        SyntheticParams {
            seed: 7,
            center: [0.0, 0.0],
            region_radius: 0.1,
            blob_radius: 0.03,
            blob_count: 4,
            resolution: 0.01,
            circle_segments: 16,
            ..SyntheticParams::default()
        }
    }

    #[test]
    fn same_seed_same_grid() {
        let a = generate(&small(), None).unwrap();
        let b = generate(&small(), None).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn different_seed_different_grid() {
        let a = generate(&small(), None).unwrap();
        let b = generate(&SyntheticParams { seed: 8, ..small() }, None).unwrap();
        assert_ne!(a.cells(), b.cells());
    }

    #[test]
    fn risks_stay_in_unit_interval() {
        let cells = generate(&small(), None).unwrap();
        assert!(cells.ids().all(|id| (0.0..=1.0).contains(&cells.risk(id))));
        assert!(cells.ids().any(|id| cells.risk(id) > 0.0));
    }

    #[test]
    fn dropping_clear_cells_keeps_risky_ones() {
        let kept = generate(&small(), None).unwrap();
        let dropped = generate(
            &SyntheticParams {
                keep_clear_cells: false,
                ..small()
            },
            None,
        )
        .unwrap();

        assert!(dropped.len() < kept.len());
        let risky = |c: &CellCollection| -> Vec<f64> {
            c.ids().map(|id| c.risk(id)).filter(|r| *r > 0.0).collect()
        };
        assert_eq!(risky(&kept), risky(&dropped));
    }

    #[test]
    fn boundary_clips_cells() {
        let full = generate(&small(), None).unwrap();
        let extent = full.extent().unwrap();
        let cut = (extent.min.x + extent.max.x) / 2.0;

        let boundary = MultiPolygon::new(vec![rectangle(cut, -1.0, 1.0, 1.0)]);
        let cells = generate(&small(), Some(&boundary)).unwrap();
        assert!(!cells.is_empty());
        assert!(cells.len() < full.len());
        assert!(cells.ids().all(|id| cells.bounds(id).min.x >= cut - 1e-9));
    }

    #[test]
    fn edges_are_shared_exactly() {
        let edges = grid_edges(36.1, 36.2, 0.01);
        assert!(edges.len() >= 11);
        assert!(*edges.last().unwrap() >= 36.2);
        for pair in edges.windows(2) {
            assert_eq!(pair[1], pair[0] + 0.01);
        }
    }

    #[test]
    fn neighbouring_cells_touch() {
        let params = SyntheticParams {
            seed: 42,
            center: [36.232, 49.988],
            blob_count: 6,
            ..small()
        };
        let cells = generate(&params, None).unwrap();
        let index = SpatialIndex::build(&cells);
        let geometry = PlanarGeometry::new();

        // Clear cells fill the zone's bounding box, so one flood fill from
        // any cell must reach the whole grid.
        let everything = [RegionSpec::new(parcel_core::CellId::new(0), f64::INFINITY)];
        let growth = RegionGrower::new(&cells, &index, &geometry).grow(&everything, |_| 1.0);
        assert_eq!(growth.unassigned(), 0);
        assert_eq!(growth.regions()[0].cells, cells.len());
    }

    #[test]
    fn generated_grid_partitions_almost_completely() {
        // A single blob gives one connected risk zone.
        let params = SyntheticParams {
            seed: 42,
            center: [36.232, 49.988],
            blob_count: 1,
            blob_radius: 0.04,
            resolution: 0.005,
            keep_clear_cells: false,
            circle_segments: 32,
            ..small()
        };
        let cells = generate(&params, None).unwrap();
        assert!(cells.len() > 50);

        let config = PartitionConfig {
            partners: vec![PartnerConfig::new("A", 1.0, &["A1", "A2"])],
        };
        let result = PartitionOrchestrator::new(&config).unwrap().run(&cells).unwrap();

        // Only trailing zero-risk cells may be left once the target is met.
        assert!(result.unassigned() * 20 <= cells.len(), "{}", result.summary());
        let leaders = result.cells_of_leader("A1").len() + result.cells_of_leader("A2").len();
        assert!(leaders * 10 >= cells.len() * 9);
    }

    #[test]
    fn rejects_bad_params() {
        let bad = SyntheticParams {
            resolution: 0.0,
            ..small()
        };
        assert!(matches!(generate(&bad, None), Err(AssetError::Params { .. })));
    }

    #[test]
    fn zero_blobs_give_empty_grid() {
        let none = SyntheticParams {
            blob_count: 0,
            ..small()
        };
        assert!(generate(&none, None).unwrap().is_empty());
    }
}
