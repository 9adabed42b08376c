//! Parcel Runtime
//!
//! Command-line entry point:
//!   parcel synth --out grid.geojson [--boundary country.geojson]
//!   parcel partition --input grid.geojson --out labeled.geojson

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parcel_core::{CellSet, PartitionOrchestrator, PlanarGeometry};
use parcel_services::Settings;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Filter used until settings are loaded.
const BOOT_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "parcel", version, about = "Risk-weighted territory partitioning")]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a seeded synthetic risk grid
    Synth {
        #[arg(long)]
        out: PathBuf,
        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,
        /// Clip cells to the polygons of this GeoJSON file
        #[arg(long)]
        boundary: Option<PathBuf>,
    },
    /// Split a grid among partners and their leaders
    Partition {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Also write per-cell sector records as JSON
        #[arg(long)]
        sectors: Option<PathBuf>,
        /// Also write the allocation summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise boot at info and switch to the configured
    // filter once settings are known.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(BOOT_FILTER)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Parcel v{}", parcel_core::VERSION);

    let settings = parcel_services::init_services(cli.config.as_deref())
        .context("failed to load settings")?;
    if !from_env {
        apply_filter(&filter_handle, &settings.logging.filter)?;
    }

    run(cli.command, &settings)
}

fn apply_filter(handle: &reload::Handle<EnvFilter, Registry>, directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("invalid logging filter '{directive}'"))?;
    handle
        .reload(filter)
        .context("failed to apply logging filter")
}

fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Synth {
            out,
            seed,
            boundary,
        } => cmd_synth(settings, &out, seed, boundary.as_deref()),
        Commands::Partition {
            input,
            out,
            sectors,
            summary,
        } => cmd_partition(
            settings,
            &input,
            &out,
            sectors.as_deref(),
            summary.as_deref(),
        ),
    }
}

fn cmd_synth(
    settings: &Settings,
    out: &Path,
    seed: Option<u64>,
    boundary: Option<&Path>,
) -> Result<()> {
    let mut params = settings.synthetic.clone();
    if let Some(seed) = seed {
        params.seed = seed;
    }

    let boundary = match boundary {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let polygons = parcel_asset::read_boundary(BufReader::new(file))
                .with_context(|| format!("failed to read boundary from {}", path.display()))?;
            Some(polygons)
        }
        None => None,
    };

    let cells = parcel_asset::generate(&params, boundary.as_ref())
        .context("failed to generate grid")?;
    let mut writer = create(out)?;
    parcel_asset::write_cells(&mut writer, &cells)
        .with_context(|| format!("failed to write {}", out.display()))?;
    writer.flush()?;

    tracing::info!(cells = cells.len(), out = %out.display(), "grid written");
    Ok(())
}

fn cmd_partition(
    settings: &Settings,
    input: &Path,
    out: &Path,
    sectors: Option<&Path>,
    summary: Option<&Path>,
) -> Result<()> {
    let geometry = PlanarGeometry::new();
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let cells = parcel_asset::read_cells(BufReader::new(file), &geometry)
        .with_context(|| format!("failed to read grid from {}", input.display()))?;

    let orchestrator = PartitionOrchestrator::with_geometry(&settings.partition, geometry)
        .context("invalid partition configuration")?;
    let result = orchestrator.run(&cells).context("partition failed")?;

    let mut writer = create(out)?;
    parcel_asset::write_partition(&mut writer, &cells, &result)
        .with_context(|| format!("failed to write {}", out.display()))?;
    writer.flush()?;

    let report = result.summary();
    for line in report.to_string().lines() {
        tracing::info!("{line}");
    }

    if let Some(path) = sectors {
        let records = parcel_asset::sector_records(&cells, &result);
        let mut writer = create(path)?;
        parcel_asset::write_sectors(&mut writer, &records)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writer.flush()?;
        tracing::info!(records = records.len(), out = %path.display(), "sectors written");
    }

    if let Some(path) = summary {
        let mut writer = create(path)?;
        serde_json::to_writer_pretty(&mut writer, &report)
            .with_context(|| format!("failed to write {}", path.display()))?;
        writer.flush()?;
    }

    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parcel_core::PartnerConfig;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("parcel-cli-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_settings() -> Settings {
        let mut settings = Settings::default();
        settings.synthetic.center = [0.0, 0.0];
        settings.synthetic.region_radius = 0.1;
        settings.synthetic.blob_radius = 0.03;
        settings.synthetic.blob_count = 3;
        settings.synthetic.circle_segments = 16;
        settings.partition.partners = vec![
            PartnerConfig::new("A", 2.0, &["A1", "A2"]),
            PartnerConfig::new("B", 1.0, &["B1"]),
        ];
        settings
    }

    #[test]
    fn parses_synth_with_boundary_and_global_config() {
        let cli = Cli::try_parse_from([
            "parcel",
            "synth",
            "--out",
            "grid.geojson",
            "--boundary",
            "ua.json",
            "--config",
            "parcel.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("parcel.toml")));
        match cli.command {
            Commands::Synth { boundary, seed, .. } => {
                assert_eq!(boundary, Some(PathBuf::from("ua.json")));
                assert_eq!(seed, None);
            }
            Commands::Partition { .. } => panic!("expected synth"),
        }
    }

    #[test]
    fn synth_then_partition_writes_every_output() {
        let dir = scratch("pipeline");
        let settings = small_settings();
        let boundary = dir.join("boundary.geojson");
        std::fs::write(
            &boundary,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},
                "geometry":{"type":"Polygon","coordinates":[[[-0.5,-1],[1,-1],[1,1],[-0.5,1],[-0.5,-1]]]}}]}"#,
        )
        .unwrap();

        let grid = dir.join("grid.geojson");
        cmd_synth(&settings, &grid, Some(5), Some(&boundary)).unwrap();

        let labeled = dir.join("labeled.geojson");
        let sectors = dir.join("sectors.json");
        let summary = dir.join("summary.json");
        cmd_partition(&settings, &grid, &labeled, Some(&sectors), Some(&summary)).unwrap();

        let cells =
            parcel_asset::read_cells(File::open(&labeled).unwrap(), &PlanarGeometry::new())
                .unwrap();
        assert!(!cells.is_empty());
        assert!(cells.ids().all(|id| cells.bounds(id).min.x >= -0.5));

        let records: Vec<parcel_asset::SectorRecord> =
            serde_json::from_reader(File::open(&sectors).unwrap()).unwrap();
        assert_eq!(records.len(), cells.len());
        let report: serde_json::Value =
            serde_json::from_reader(File::open(&summary).unwrap()).unwrap();
        assert_eq!(report["partners"].as_array().unwrap().len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_bad_logging_filter() {
        let (layer, handle) =
            reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new(BOOT_FILTER));
        assert!(apply_filter(&handle, "parcel_core=debug").is_ok());
        assert!(apply_filter(&handle, "parcel_core=loud").is_err());
        drop(layer);
    }
}
