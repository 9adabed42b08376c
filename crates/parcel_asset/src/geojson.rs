//! GeoJSON FeatureCollection reading and writing.
//!
//! Input features carry a polygon geometry and a numeric `risk` property.
//! Output features add `partner` and `leader`, written as "Unassigned" for
//! cells no region reached.

use crate::error::AssetError;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use parcel_core::{Cell, CellCollection, CellSet, Geometry, PartitionResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{Read, Write};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Option<FeatureGeometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// Geometry variants the partitioner understands; anything else is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeatureGeometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

/// Read a FeatureCollection into a validated cell collection.
///
/// MultiPolygon parts become separate cells sharing the feature's risk.
/// Features without polygon geometry are skipped.
pub fn read_cells<R: Read, G: Geometry>(
    reader: R,
    geometry: &G,
) -> Result<CellCollection, AssetError> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;
    let mut cells = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for (index, feature) in collection.features.iter().enumerate() {
        let Some(polygons) = feature_polygons(index, feature)? else {
            skipped += 1;
            continue;
        };

        let risk = feature
            .properties
            .as_ref()
            .and_then(|props| props.get("risk"))
            .and_then(Value::as_f64)
            .ok_or_else(|| AssetError::Feature {
                index,
                reason: "missing numeric 'risk' property".to_string(),
            })?;

        cells.extend(polygons.into_iter().map(|polygon| Cell::new(polygon, risk)));
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped features without polygon geometry");
    }
    tracing::info!(cells = cells.len(), "grid loaded");
    Ok(CellCollection::new(cells, geometry)?)
}

/// Read every polygon of a FeatureCollection as one clipping boundary.
///
/// Properties are ignored; a collection without polygons is an error.
pub fn read_boundary<R: Read>(reader: R) -> Result<MultiPolygon<f64>, AssetError> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;
    let mut parts = Vec::new();
    for (index, feature) in collection.features.iter().enumerate() {
        if let Some(polygons) = feature_polygons(index, feature)? {
            parts.extend(polygons);
        }
    }
    if parts.is_empty() {
        return Err(AssetError::Feature {
            index: 0,
            reason: "boundary contains no polygon features".to_string(),
        });
    }
    tracing::info!(parts = parts.len(), "boundary loaded");
    Ok(MultiPolygon::new(parts))
}

/// Write the bare grid with its risk values.
pub fn write_cells<W: Write>(writer: W, cells: &CellCollection) -> Result<(), AssetError> {
    let features = cells
        .ids()
        .map(|id| {
            let mut properties = Map::new();
            properties.insert("risk".into(), Value::from(cells.risk(id)));
            feature(cells.polygon(id), properties)
        })
        .collect();
    write_collection(writer, features)
}

/// Write the labelled grid with `risk`, `partner` and `leader` properties.
pub fn write_partition<W: Write>(
    writer: W,
    cells: &CellCollection,
    result: &PartitionResult,
) -> Result<(), AssetError> {
    let features = cells
        .ids()
        .map(|id| {
            let labels = result.label(id);
            let mut properties = Map::new();
            properties.insert("risk".into(), Value::from(cells.risk(id)));
            properties.insert("partner".into(), Value::from(labels.partner_label()));
            properties.insert("leader".into(), Value::from(labels.leader_label()));
            feature(cells.polygon(id), properties)
        })
        .collect();
    write_collection(writer, features)
}

fn write_collection<W: Write>(writer: W, features: Vec<Feature>) -> Result<(), AssetError> {
    let collection = FeatureCollection {
        kind: "FeatureCollection".to_string(),
        features,
    };
    serde_json::to_writer(writer, &collection)?;
    Ok(())
}

fn feature(polygon: &Polygon<f64>, properties: Map<String, Value>) -> Feature {
    let ring = |line: &LineString<f64>| line.coords().map(|c| vec![c.x, c.y]).collect();
    let mut coordinates = vec![ring(polygon.exterior())];
    coordinates.extend(polygon.interiors().iter().map(ring));
    Feature {
        kind: "Feature".to_string(),
        geometry: Some(FeatureGeometry::Polygon { coordinates }),
        properties: Some(properties),
    }
}

/// Polygons of one feature, `None` for non-polygon geometry.
fn feature_polygons(
    index: usize,
    feature: &Feature,
) -> Result<Option<Vec<Polygon<f64>>>, AssetError> {
    match &feature.geometry {
        Some(FeatureGeometry::Polygon { coordinates }) => {
            Ok(Some(vec![polygon_from_rings(index, coordinates)?]))
        }
        Some(FeatureGeometry::MultiPolygon { coordinates }) => coordinates
            .iter()
            .map(|rings| polygon_from_rings(index, rings))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(FeatureGeometry::Unsupported) | None => Ok(None),
    }
}

fn polygon_from_rings(index: usize, rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, AssetError> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .map(|position| match position.as_slice() {
                [x, y, ..] => Ok(Coord { x: *x, y: *y }),
                _ => Err(AssetError::Feature {
                    index,
                    reason: "position with fewer than two coordinates".to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(LineString::new)
    });

    let exterior = rings.next().ok_or_else(|| AssetError::Feature {
        index,
        reason: "polygon without rings".to_string(),
    })??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::{CellId, PartitionConfig, PartitionOrchestrator, PartnerConfig, PlanarGeometry};

    const GRID: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"risk": 0.4},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type": "Feature", "properties": {"risk": 0.6, "name": "b"},
             "geometry": {"type": "Polygon", "coordinates": [[[1,0,5],[2,0,5],[2,1,5],[1,1,5],[1,0,5]]]}},
            {"type": "Feature", "properties": {"risk": 0.0},
             "geometry": {"type": "Point", "coordinates": [9, 9]}},
            {"type": "Feature", "properties": {"risk": 0.2},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0,1],[1,1],[1,2],[0,2],[0,1]]],
                [[[1,1],[2,1],[2,2],[1,2],[1,1]]]
             ]}},
            {"type": "Feature", "properties": {}, "geometry": null}
        ]
    }"#;

    #[test]
    fn reads_polygons_and_multipolygon_parts() {
        let cells = read_cells(GRID.as_bytes(), &PlanarGeometry::new()).unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells.risk(CellId::new(1)), 0.6);
        assert_eq!(cells.risk(CellId::new(2)), 0.2);
        assert_eq!(cells.risk(CellId::new(3)), 0.2);
        assert_eq!(cells.bounds(CellId::new(3)).to_tuple(), (1.0, 1.0, 2.0, 2.0));
    }

    #[test]
    fn missing_risk_is_reported_with_feature_index() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"risk":"high"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}]}"#;
        let err = read_cells(json.as_bytes(), &PlanarGeometry::new()).unwrap_err();
        assert!(matches!(err, AssetError::Feature { index: 0, .. }));
    }

    #[test]
    fn degenerate_polygon_surfaces_geometry_error() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"risk":0.1},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[2,0],[0,0]]]}}]}"#;
        let err = read_cells(json.as_bytes(), &PlanarGeometry::new()).unwrap_err();
        assert!(matches!(err, AssetError::Partition(_)));
    }

    #[test]
    fn writes_labels_and_reruns_byte_identical() {
        let cells = read_cells(GRID.as_bytes(), &PlanarGeometry::new()).unwrap();
        let config = PartitionConfig {
            partners: vec![
                PartnerConfig::new("A", 1.0, &["A1"]),
                PartnerConfig::new("B", 1.0, &["B1"]),
            ],
        };
        let orchestrator = PartitionOrchestrator::new(&config).unwrap();

        let mut first = Vec::new();
        write_partition(&mut first, &cells, &orchestrator.run(&cells).unwrap()).unwrap();
        let mut second = Vec::new();
        write_partition(&mut second, &cells, &orchestrator.run(&cells).unwrap()).unwrap();
        assert_eq!(first, second);

        let written: FeatureCollection = serde_json::from_slice(&first).unwrap();
        assert_eq!(written.features.len(), 4);
        for feature in &written.features {
            let props = feature.properties.as_ref().unwrap();
            assert!(props.contains_key("risk"));
            let partner = props["partner"].as_str().unwrap();
            let leader = props["leader"].as_str().unwrap();
            assert!(["A", "B", "Unassigned"].contains(&partner));
            assert!(["A1", "B1", "Unassigned"].contains(&leader));
        }
    }

    #[test]
    fn boundary_collects_all_polygon_parts() {
        let boundary = read_boundary(GRID.as_bytes()).unwrap();
        assert_eq!(boundary.0.len(), 4);

        let empty = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[0,0]}}]}"#;
        assert!(matches!(
            read_boundary(empty.as_bytes()),
            Err(AssetError::Feature { .. })
        ));
    }

    #[test]
    fn bare_grid_reads_back() {
        let cells = read_cells(GRID.as_bytes(), &PlanarGeometry::new()).unwrap();
        let mut out = Vec::new();
        write_cells(&mut out, &cells).unwrap();

        let again = read_cells(out.as_slice(), &PlanarGeometry::new()).unwrap();
        assert_eq!(again.len(), cells.len());
        assert_eq!(again.total_risk(), cells.total_risk());
    }
}
