#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the crash map toolchain.
//!
//! Loads the configured crash sources from a local data directory and
//! prints statistics, hotspot tables or `GeoJSON` without starting the
//! server.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use crash_map_analytics::summarize_cluster;
use crash_map_crash_models::CrashQuery;
use crash_map_hotspot::{DEFAULT_CELL_SIZE_KM, DEFAULT_RADIUS_KM, Hotspot};
use crash_map_server_models::CrashQueryParams;
use crash_map_source::SourceDefinition;
use crash_map_source::registry::{all_sources, source_by_id};
use crash_map_store::CrashStore;

#[derive(Parser)]
#[command(name = "crash_map_cli", about = "Crash hotspot toolchain")]
struct Cli {
    /// Directory that file sources are resolved against
    #[arg(long, env = "CRASH_MAP_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,
    /// Comma-separated list of source IDs to load (default: all)
    #[arg(long, global = true)]
    sources: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all configured data sources
    Sources,
    /// Print dataset statistics as JSON
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Rank grid cells by crash density
    Grid {
        #[command(flatten)]
        filter: FilterArgs,
        /// Grid cell edge length in kilometers
        #[arg(long, default_value_t = DEFAULT_CELL_SIZE_KM)]
        cell_size_km: f64,
        /// Maximum number of hotspots to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// List neighbor hotspots, largest first
    Overview {
        #[command(flatten)]
        filter: FilterArgs,
        /// Neighbor search radius in kilometers
        #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
        radius_km: f64,
        /// Maximum number of hotspots to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Write the filtered crashes (or hotspot outlines) as `GeoJSON`
    Geojson {
        #[command(flatten)]
        filter: FilterArgs,
        /// Emit neighbor hotspot outlines instead of crash points
        #[arg(long)]
        outlines: bool,
        /// Keep only crashes whose contributing factors mention speed
        #[arg(long, conflicts_with = "outlines")]
        speed_related: bool,
        /// Neighbor search radius in kilometers, used with `--outlines`
        #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
        radius_km: f64,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Crash filters, each `all`, a single value, or a comma-separated list.
#[derive(Args)]
struct FilterArgs {
    /// Road user: `pedestrian`, `cyclist`
    #[arg(long = "type")]
    kind: Option<String>,
    /// Severity codes: `K`, `A`, `B`, `C`, `U`
    #[arg(long)]
    severity: Option<String>,
    /// Calendar years
    #[arg(long)]
    year: Option<String>,
}

impl FilterArgs {
    fn to_query(&self) -> Result<CrashQuery, crash_map_server_models::InvalidFilter> {
        CrashQueryParams {
            kind: self.kind.clone(),
            severity: self.severity.clone(),
            year: self.year.clone(),
            ..CrashQueryParams::default()
        }
        .to_query()
    }
}

/// Resolves `--sources` against the registry.
fn selected_sources(
    ids: Option<&str>,
) -> Result<Vec<SourceDefinition>, crash_map_source::SourceError> {
    let Some(ids) = ids else {
        return Ok(all_sources());
    };
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(source_by_id)
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let sources = selected_sources(cli.sources.as_deref())?;

    if matches!(cli.command, Commands::Sources) {
        println!("{:<20} {:<12} NAME", "ID", "TYPE");
        println!("{}", "-".repeat(60));
        for source in &sources {
            println!("{:<20} {:<12} {}", source.id(), source.kind, source.name());
        }
        return Ok(());
    }

    let start = std::time::Instant::now();
    let store = CrashStore::load(&sources, &cli.data_dir).await?;
    log::info!(
        "Loaded {} records in {:.1}s",
        store.len(),
        start.elapsed().as_secs_f64()
    );

    match cli.command {
        Commands::Sources => {}
        Commands::Stats { filter } => {
            let stats = store.statistics(&filter.to_query()?);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Grid {
            filter,
            cell_size_km,
            limit,
        } => {
            let mut hotspots = crash_map_hotspot::detect_grid_hotspots(
                store.query(&filter.to_query()?),
                cell_size_km,
            );
            crash_map_hotspot::rank_by_density(&mut hotspots);

            println!("{:<4} {:<18} {:>6} {:>10}  LOCATION", "#", "CELL", "COUNT", "PER KM2");
            println!("{}", "-".repeat(72));
            for (rank, hotspot) in hotspots.iter().take(limit).enumerate() {
                let summary = summarize_cluster(hotspot.points());
                println!(
                    "{:<4} {:<18} {:>6} {:>10.1}  {}",
                    rank + 1,
                    hotspot.id(),
                    hotspot.count(),
                    hotspot.density,
                    summary.location_label
                );
            }
            println!("{} grid hotspots", hotspots.len());
        }
        Commands::Overview {
            filter,
            radius_km,
            limit,
        } => {
            let mut hotspots = crash_map_hotspot::detect_neighbor_hotspots(
                store.query(&filter.to_query()?),
                radius_km,
            );
            crash_map_hotspot::sort_by_size(&mut hotspots);

            println!("{:<14} {:>6} {:>6} {:>8}  LOCATION", "ID", "COUNT", "FATAL", "INJURED");
            println!("{}", "-".repeat(72));
            for hotspot in hotspots.iter().take(limit) {
                let summary = summarize_cluster(hotspot.points());
                println!(
                    "{:<14} {:>6} {:>6} {:>8}  {}",
                    hotspot.id,
                    summary.total,
                    summary.fatalities,
                    summary.injuries,
                    summary.location_label
                );
            }
            println!("{} neighbor hotspots", hotspots.len());
        }
        Commands::Geojson {
            filter,
            outlines,
            speed_related,
            radius_km,
            output,
        } => {
            let query = filter.to_query()?;
            let collection = if outlines {
                let mut hotspots =
                    crash_map_hotspot::detect_neighbor_hotspots(store.query(&query), radius_km);
                crash_map_hotspot::sort_by_size(&mut hotspots);
                crash_map_hotspot::outlines(&hotspots)
            } else if speed_related {
                store.speed_related_geojson(&query)
            } else {
                store.to_geojson(&query)
            };

            let json = serde_json::to_string(&collection)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    log::info!(
                        "Wrote {} features to {}",
                        collection.features.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}
