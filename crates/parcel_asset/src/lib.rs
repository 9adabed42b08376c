//! Parcel Asset Pipeline
//!
//! Grid loading, generation and export around the partitioner:
//! - GeoJSON FeatureCollection reading and writing
//! - Seeded synthetic risk grids
//! - Sector records for persistence consumers

pub mod error;
pub mod geojson;
pub mod sector;
pub mod synthetic;

pub use error::AssetError;
pub use geojson::{read_boundary, read_cells, write_cells, write_partition};
pub use sector::{sector_records, write_sectors, SectorRecord, SectorStatus};
pub use synthetic::{generate, SyntheticParams};
