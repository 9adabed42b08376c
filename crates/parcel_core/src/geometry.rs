//! Polygon capability interface used by every other component.
//!
//! Cells are treated as closed regions. The distinction that matters most
//! for region growth is [`Geometry::touches`]: two cells are neighbours only
//! when their boundaries meet and their interiors do not overlap.

use crate::error::GeometryError;
use geo::algorithm::line_intersection::line_intersection;
use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Contains, MultiPolygon, Polygon, Relate,
    RemoveRepeatedPoints,
};
use glam::DVec2;

/// Closed axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Closed-interval overlap: boxes sharing only an edge or a corner intersect.
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// `(minx, miny, maxx, maxy)`
    pub fn to_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min.x, self.min.y, self.max.x, self.max.y)
    }
}

/// Fixed set of polygon operations the partitioner relies on.
///
/// Implementations must be side-effect free.
pub trait Geometry {
    /// Reject polygons the partitioner cannot reason about.
    fn validate(&self, polygon: &Polygon<f64>) -> Result<(), GeometryError>;

    /// True when `cell` lies entirely inside `region`.
    fn contains(&self, region: &Polygon<f64>, cell: &Polygon<f64>) -> bool;

    /// True only for boundary-adjacent polygons with disjoint interiors.
    fn touches(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool;

    fn centroid(&self, polygon: &Polygon<f64>) -> Result<DVec2, GeometryError>;

    fn bounds(&self, polygon: &Polygon<f64>) -> Result<Bounds, GeometryError>;

    /// Overlap of two polygons, or `None` when they share no area.
    fn intersect(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> Option<MultiPolygon<f64>>;
}

/// Planar backend built on the `geo` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarGeometry;

impl PlanarGeometry {
    pub fn new() -> Self {
        Self
    }
}

impl Geometry for PlanarGeometry {
    fn validate(&self, polygon: &Polygon<f64>) -> Result<(), GeometryError> {
        // Repeated vertices add zero-length edges that would otherwise
        // look like crossings.
        let ring = polygon.exterior().remove_repeated_points();
        if ring.0.len() < 4 {
            return Err(GeometryError::EmptyRing {
                points: ring.0.len(),
            });
        }
        // Any two non-adjacent edges meeting means the ring crosses itself.
        let edges: Vec<_> = ring.lines().collect();
        let n = edges.len();
        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if line_intersection(edges[i], edges[j]).is_some() {
                    return Err(GeometryError::SelfIntersecting);
                }
            }
        }
        if polygon.unsigned_area() <= 0.0 {
            return Err(GeometryError::ZeroArea);
        }
        Ok(())
    }

    fn contains(&self, region: &Polygon<f64>, cell: &Polygon<f64>) -> bool {
        region.contains(cell)
    }

    fn touches(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
        a.relate(b).is_touches()
    }

    fn centroid(&self, polygon: &Polygon<f64>) -> Result<DVec2, GeometryError> {
        polygon
            .centroid()
            .map(|p| DVec2::new(p.x(), p.y()))
            .ok_or(GeometryError::NoCentroid)
    }

    fn bounds(&self, polygon: &Polygon<f64>) -> Result<Bounds, GeometryError> {
        let rect = polygon
            .bounding_rect()
            .ok_or(GeometryError::EmptyRing { points: 0 })?;
        Ok(Bounds::new(
            DVec2::new(rect.min().x, rect.min().y),
            DVec2::new(rect.max().x, rect.max().y),
        ))
    }

    fn intersect(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> Option<MultiPolygon<f64>> {
        let overlap = a.intersection(b);
        let parts: Vec<Polygon<f64>> = overlap
            .into_iter()
            .filter(|part| part.unsigned_area() > 0.0)
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(MultiPolygon::new(parts))
        }
    }
}

/// Axis-aligned square polygon, the shape every grid producer emits.
pub fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
    rectangle(x, y, x + size, y + size)
}

pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    geo::Rect::new(
        geo::Coord { x: min_x, y: min_y },
        geo::Coord { x: max_x, y: max_y },
    )
    .to_polygon()
}
