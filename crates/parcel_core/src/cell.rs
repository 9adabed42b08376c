//! Cell storage.
//!
//! A [`CellCollection`] owns every polygon and risk value; everything else
//! refers to cells by [`CellId`]. Centroids and bounding boxes are computed
//! once at construction through the geometry backend.

use crate::error::{InputError, PartitionError};
use crate::geometry::{Bounds, Geometry};
use geo::Polygon;
use glam::DVec2;
use std::fmt;

/// Dense index of a cell within its containing collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u32);

impl CellId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable grid polygon with its risk scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    polygon: Polygon<f64>,
    risk: f64,
}

impl Cell {
    pub fn new(polygon: Polygon<f64>, risk: f64) -> Self {
        Self { polygon, risk }
    }

    #[inline]
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    #[inline]
    pub fn risk(&self) -> f64 {
        self.risk
    }
}

/// Read-only view over a set of cells addressed by dense ids `0..len()`.
pub trait CellSet {
    fn len(&self) -> usize;

    fn polygon(&self, id: CellId) -> &Polygon<f64>;

    fn risk(&self, id: CellId) -> f64;

    fn centroid(&self, id: CellId) -> DVec2;

    fn bounds(&self, id: CellId) -> Bounds;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ids(&self) -> CellIds {
        CellIds {
            next: 0,
            end: self.len(),
        }
    }
}

/// Ascending iterator over the ids of a [`CellSet`].
#[derive(Debug, Clone)]
pub struct CellIds {
    next: usize,
    end: usize,
}

impl Iterator for CellIds {
    type Item = CellId;

    fn next(&mut self) -> Option<CellId> {
        if self.next >= self.end {
            return None;
        }
        let id = CellId::from_index(self.next);
        self.next += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellIds {}

/// Ordered, validated owner of all cell data.
#[derive(Debug, Clone)]
pub struct CellCollection {
    cells: Vec<Cell>,
    centroids: Vec<DVec2>,
    bounds: Vec<Bounds>,
}

impl CellCollection {
    /// Validate every cell and precompute its centroid and bounding box.
    ///
    /// Ids are assigned in input order.
    pub fn new<G: Geometry>(cells: Vec<Cell>, geometry: &G) -> Result<Self, PartitionError> {
        let mut centroids = Vec::with_capacity(cells.len());
        let mut bounds = Vec::with_capacity(cells.len());

        for (index, cell) in cells.iter().enumerate() {
            let id = CellId::from_index(index);
            if !cell.risk.is_finite() || !(0.0..=1.0).contains(&cell.risk) {
                return Err(InputError::InvalidRisk {
                    id,
                    risk: cell.risk,
                }
                .into());
            }
            let wrap = |source| PartitionError::Cell { id, source };
            geometry.validate(&cell.polygon).map_err(wrap)?;
            centroids.push(geometry.centroid(&cell.polygon).map_err(wrap)?);
            bounds.push(geometry.bounds(&cell.polygon).map_err(wrap)?);
        }

        Ok(Self {
            cells,
            centroids,
            bounds,
        })
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn total_risk(&self) -> f64 {
        self.cells.iter().map(Cell::risk).sum()
    }

    /// Bounding box of the whole collection, `None` when empty.
    pub fn extent(&self) -> Option<Bounds> {
        self.bounds.iter().copied().reduce(|acc, b| acc.union(&b))
    }

    /// Borrowed view over `members` with local ids renumbered `0..members.len()`.
    ///
    /// Member order is preserved, so local id `i` maps to `members[i]`.
    pub fn subset(&self, members: Vec<CellId>) -> SubCollection<'_> {
        debug_assert!(members.iter().all(|id| id.index() < self.cells.len()));
        SubCollection {
            parent: self,
            members,
        }
    }
}

impl CellSet for CellCollection {
    #[inline]
    fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn polygon(&self, id: CellId) -> &Polygon<f64> {
        &self.cells[id.index()].polygon
    }

    #[inline]
    fn risk(&self, id: CellId) -> f64 {
        self.cells[id.index()].risk
    }

    #[inline]
    fn centroid(&self, id: CellId) -> DVec2 {
        self.centroids[id.index()]
    }

    #[inline]
    fn bounds(&self, id: CellId) -> Bounds {
        self.bounds[id.index()]
    }
}

/// Renumbered view over part of a [`CellCollection`].
///
/// Indexes built over a sub-collection speak local ids and must never be
/// mixed with the parent's id space.
#[derive(Debug, Clone)]
pub struct SubCollection<'a> {
    parent: &'a CellCollection,
    members: Vec<CellId>,
}

impl<'a> SubCollection<'a> {
    #[inline]
    pub fn to_parent(&self, local: CellId) -> CellId {
        self.members[local.index()]
    }

    pub fn members(&self) -> &[CellId] {
        &self.members
    }
}

impl CellSet for SubCollection<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    fn polygon(&self, id: CellId) -> &Polygon<f64> {
        self.parent.polygon(self.to_parent(id))
    }

    #[inline]
    fn risk(&self, id: CellId) -> f64 {
        self.parent.risk(self.to_parent(id))
    }

    #[inline]
    fn centroid(&self, id: CellId) -> DVec2 {
        self.parent.centroid(self.to_parent(id))
    }

    #[inline]
    fn bounds(&self, id: CellId) -> Bounds {
        self.parent.bounds(self.to_parent(id))
    }
}
