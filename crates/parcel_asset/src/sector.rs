//! Flat per-cell records for persistence consumers.

use crate::error::AssetError;
use geo::{Area, Polygon};
use parcel_core::{CellCollection, CellSet, PartitionResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;

const KM_PER_DEGREE: f64 = 111.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorStatus {
    Clear,
    Probable,
}

impl SectorStatus {
    pub fn from_risk(risk: f64) -> Self {
        if risk == 0.0 {
            SectorStatus::Clear
        } else {
            SectorStatus::Probable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRecord {
    pub cell: u32,
    pub wkt: String,
    pub area_km2: f64,
    pub risk: f64,
    pub status: SectorStatus,
    pub partner: String,
    pub leader: String,
}

/// One record per cell, in id order.
pub fn sector_records(cells: &CellCollection, result: &PartitionResult) -> Vec<SectorRecord> {
    cells
        .ids()
        .map(|id| {
            let polygon = cells.polygon(id);
            let risk = cells.risk(id);
            let labels = result.label(id);
            SectorRecord {
                cell: id.raw(),
                wkt: wkt(polygon),
                area_km2: area_km2(polygon, cells.centroid(id).y),
                risk,
                status: SectorStatus::from_risk(risk),
                partner: labels.partner_label().to_string(),
                leader: labels.leader_label().to_string(),
            }
        })
        .collect()
}

/// Serialize records as a JSON array.
pub fn write_sectors<W: Write>(writer: W, records: &[SectorRecord]) -> Result<(), AssetError> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// `POLYGON((x y, ...), (hole...))`, exterior ring first.
fn wkt(polygon: &Polygon<f64>) -> String {
    let mut out = String::from("POLYGON(");
    let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
    for (r, ring) in rings.enumerate() {
        if r > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for (i, c) in ring.coords().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{} {}", c.x, c.y);
        }
        out.push(')');
    }
    out.push(')');
    out
}

/// Planar area in km², with longitude degrees shrunk by cos(latitude).
fn area_km2(polygon: &Polygon<f64>, latitude: f64) -> f64 {
    polygon.unsigned_area() * KM_PER_DEGREE * KM_PER_DEGREE * latitude.to_radians().cos()
}
