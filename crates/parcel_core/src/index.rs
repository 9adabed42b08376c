//! Bounding-box spatial hash over a cell set.
//!
//! Each cell is registered in every bucket its bounding box overlaps. A
//! query gathers the buckets covering the search box and returns the ids
//! whose boxes intersect it. This is only a coarse pre-filter; callers
//! confirm real adjacency with [`Geometry::touches`](crate::geometry::Geometry::touches).

use crate::cell::{CellId, CellSet};
use crate::error::InputError;
use crate::geometry::Bounds;
use std::collections::HashMap;

/// Configuration for the bucket grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialIndexConfig {
    bucket_size: f64,
}

impl SpatialIndexConfig {
    /// `bucket_size` is the bucket edge length in coordinate units and must
    /// be finite and positive.
    pub fn new(bucket_size: f64) -> Result<Self, InputError> {
        if bucket_size.is_finite() && bucket_size > 0.0 {
            Ok(Self { bucket_size })
        } else {
            Err(InputError::InvalidBucketSize { value: bucket_size })
        }
    }

    pub fn bucket_size(&self) -> f64 {
        self.bucket_size
    }

    /// Bucket size equal to the mean cell extent, so a typical cell spans
    /// one or two buckets per axis.
    pub fn auto<C: CellSet + ?Sized>(cells: &C) -> Self {
        let fallback = Self { bucket_size: 1.0 };
        if cells.is_empty() {
            return fallback;
        }
        let total: f64 = cells
            .ids()
            .map(|id| {
                let b = cells.bounds(id);
                b.width().max(b.height())
            })
            .sum();
        Self::new(total / cells.len() as f64).unwrap_or(fallback)
    }
}

/// Bucket coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BucketCoord {
    x: i64,
    y: i64,
}

impl BucketCoord {
    fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Spatial hash over one id space.
///
/// Built once per [`CellSet`]; a sub-collection with renumbered ids needs
/// its own index.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    config: SpatialIndexConfig,
    buckets: HashMap<BucketCoord, Vec<CellId>>,
    boxes: Vec<Bounds>,
    /// Inclusive range of occupied buckets, used to clamp oversized queries.
    occupied: Option<(BucketCoord, BucketCoord)>,
}

impl SpatialIndex {
    pub fn build<C: CellSet + ?Sized>(cells: &C) -> Self {
        Self::with_config(cells, SpatialIndexConfig::auto(cells))
    }

    pub fn with_config<C: CellSet + ?Sized>(cells: &C, config: SpatialIndexConfig) -> Self {
        let mut index = Self {
            config,
            buckets: HashMap::new(),
            boxes: Vec::with_capacity(cells.len()),
            occupied: None,
        };
        for id in cells.ids() {
            let bounds = cells.bounds(id);
            index.insert(id, bounds);
        }
        tracing::trace!(
            cells = cells.len(),
            buckets = index.buckets.len(),
            bucket_size = config.bucket_size,
            "spatial index built"
        );
        index
    }

    /// Ids whose bounding boxes intersect `bounds` (closed boxes), ascending.
    pub fn query(&self, bounds: &Bounds) -> Vec<CellId> {
        let Some((lo, hi)) = self.bucket_range(bounds) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        for by in lo.y..=hi.y {
            for bx in lo.x..=hi.x {
                if let Some(entries) = self.buckets.get(&BucketCoord::new(bx, by)) {
                    result.extend(
                        entries
                            .iter()
                            .copied()
                            .filter(|id| self.boxes[id.index()].intersects(bounds)),
                    );
                }
            }
        }

        // Cells spanning several buckets show up more than once.
        result.sort_unstable();
        result.dedup();
        result
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn config(&self) -> SpatialIndexConfig {
        self.config
    }

    fn insert(&mut self, id: CellId, bounds: Bounds) {
        debug_assert_eq!(id.index(), self.boxes.len());
        self.boxes.push(bounds);

        let lo = self.pos_to_bucket(bounds.min.x, bounds.min.y);
        let hi = self.pos_to_bucket(bounds.max.x, bounds.max.y);
        for by in lo.y..=hi.y {
            for bx in lo.x..=hi.x {
                self.buckets
                    .entry(BucketCoord::new(bx, by))
                    .or_default()
                    .push(id);
            }
        }

        self.occupied = Some(match self.occupied {
            None => (lo, hi),
            Some((olo, ohi)) => (
                BucketCoord::new(olo.x.min(lo.x), olo.y.min(lo.y)),
                BucketCoord::new(ohi.x.max(hi.x), ohi.y.max(hi.y)),
            ),
        });
    }

    fn bucket_range(&self, bounds: &Bounds) -> Option<(BucketCoord, BucketCoord)> {
        let (olo, ohi) = self.occupied?;
        let lo = self.pos_to_bucket(bounds.min.x, bounds.min.y);
        let hi = self.pos_to_bucket(bounds.max.x, bounds.max.y);
        let lo = BucketCoord::new(lo.x.max(olo.x), lo.y.max(olo.y));
        let hi = BucketCoord::new(hi.x.min(ohi.x), hi.y.min(ohi.y));
        if lo.x > hi.x || lo.y > hi.y {
            None
        } else {
            Some((lo, hi))
        }
    }

    /// Convert a position to a bucket coordinate.
    fn pos_to_bucket(&self, x: f64, y: f64) -> BucketCoord {
        BucketCoord::new(
            (x / self.config.bucket_size).floor() as i64,
            (y / self.config.bucket_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use glam::DVec2;

    fn ids(raw: &[u32]) -> Vec<CellId> {
        raw.iter().copied().map(CellId::new).collect()
    }

    #[test]
    fn query_returns_touching_boxes_in_ascending_order() {
        let cells = fixtures::grid(3, 3, |_, _| 0.0);
        let index = SpatialIndex::build(&cells);

        // Centre cell's box touches every other box in a 3x3 grid.
        let all = index.query(&cells.bounds(CellId::new(4)));
        assert_eq!(all, ids(&[0, 1, 2, 3, 4, 5, 6, 7, 8]));

        let corner = index.query(&cells.bounds(CellId::new(0)));
        assert_eq!(corner, ids(&[0, 1, 3, 4]));
    }

    #[test]
    fn bucket_size_does_not_change_results() {
        let cells = fixtures::grid(5, 4, |_, _| 0.0);
        let coarse = SpatialIndex::with_config(&cells, SpatialIndexConfig::new(3.7).unwrap());
        let fine = SpatialIndex::with_config(&cells, SpatialIndexConfig::new(0.3).unwrap());

        for id in cells.ids() {
            let b = cells.bounds(id);
            assert_eq!(coarse.query(&b), fine.query(&b), "cell {id}");
        }
        assert!(fine.bucket_count() > coarse.bucket_count());
    }

    #[test]
    fn query_outside_extent_is_empty() {
        let cells = fixtures::grid(2, 2, |_, _| 0.0);
        let index = SpatialIndex::build(&cells);
        let far = Bounds::new(DVec2::new(50.0, 50.0), DVec2::new(51.0, 51.0));
        assert!(index.query(&far).is_empty());

        let huge = Bounds::new(DVec2::splat(-1e9), DVec2::splat(1e9));
        assert_eq!(index.query(&huge).len(), 4);
    }

    #[test]
    fn auto_config_uses_mean_extent() {
        let cells = fixtures::grid(2, 2, |_, _| 0.0);
        assert_eq!(SpatialIndexConfig::auto(&cells).bucket_size(), 1.0);
    }

    #[test]
    fn rejects_unusable_bucket_sizes() {
        for size in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SpatialIndexConfig::new(size),
                Err(InputError::InvalidBucketSize { .. })
            ));
        }

        // A valid explicit size answers like the automatic one.
        let cells = fixtures::grid(3, 3, |_, _| 0.0);
        let index = SpatialIndex::with_config(&cells, SpatialIndexConfig::new(0.5).unwrap());
        assert_eq!(index.query(&cells.bounds(CellId::new(4))).len(), 9);
    }

    #[test]
    fn sub_collection_index_speaks_local_ids() {
        let cells = fixtures::grid(4, 1, |_, _| 0.0);
        let sub = cells.subset(ids(&[3, 2]));
        let index = SpatialIndex::build(&sub);

        assert_eq!(index.len(), 2);
        assert_eq!(index.query(&sub.bounds(CellId::new(0))), ids(&[0, 1]));
    }
}
