use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use cellstream_assets::{
    DirectorySource, MANIFEST_FILE, ManifestSource, MemorySource, PartitionManifest,
};
use cellstream_common::CellCoord;
use cellstream_stream::{ActiveSet, PartitionSource, RefreshPolicy, StreamConfig, StreamingCache};
use cellstream_tools::RegistryInspector;
use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellstream-cli", about = "CLI tool for cellstream operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Walk a tracked position through the world and stream partitions around it
    Simulate {
        /// YAML stream config; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory of partition files; a synthetic world is used when omitted
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Resolve partitions through {data}/{namespace}/manifest.json
        #[arg(long, requires = "data")]
        manifest: bool,
        /// File extension of partition files in the data directory
        #[arg(long, default_value = "bin")]
        extension: String,
        /// Number of host ticks to simulate
        #[arg(short, long, default_value = "300")]
        ticks: u32,
        /// Host tick length in milliseconds
        #[arg(long, default_value = "16")]
        tick_ms: u64,
        /// Walking speed in world units per second
        #[arg(long, default_value = "40")]
        speed: f32,
        /// Walking heading in degrees, 0 = +x, 90 = +z
        #[arg(long, default_value = "30")]
        heading: f32,
        /// Print a map of the active cells after each refresh
        #[arg(long)]
        map: bool,
    },
    /// Write a manifest for the partition files in a directory
    Index {
        /// Directory holding Chunk_{x}_{z}.* files
        dir: PathBuf,
        /// Namespace the partitions belong to
        #[arg(short, long)]
        namespace: String,
        /// Cell size the partitions were authored with
        #[arg(long, default_value = "50")]
        cell_size: f32,
    },
}

struct Walk {
    ticks: u32,
    dt: Duration,
    velocity: Vec3,
    map: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("cellstream-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("stream: {}", cellstream_stream::crate_info());
            println!("assets: {}", cellstream_assets::crate_info());
            println!("tools: {}", cellstream_tools::crate_info());
            let defaults = StreamConfig::default();
            println!(
                "defaults: cell_size={} radius={} interval={}s namespace={}",
                defaults.cell_size,
                defaults.load_radius_cells,
                defaults.refresh_interval_seconds,
                defaults.partition_namespace
            );
        }
        Commands::Simulate {
            config,
            data,
            manifest,
            extension,
            ticks,
            tick_ms,
            speed,
            heading,
            map,
        } => {
            let config = match config {
                Some(path) => StreamConfig::from_yaml_file(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => StreamConfig::default(),
            };
            let angle = heading.to_radians();
            let walk = Walk {
                ticks,
                dt: Duration::from_millis(tick_ms),
                velocity: Vec3::new(angle.cos(), 0.0, angle.sin()) * speed,
                map,
            };

            match data {
                Some(dir) if manifest => {
                    let ns_dir = dir.join(&config.partition_namespace);
                    let source = ManifestSource::open(&ns_dir)
                        .with_context(|| format!("opening manifest in {}", ns_dir.display()))?;
                    if source.manifest().cell_size != config.cell_size {
                        tracing::warn!(
                            manifest = source.manifest().cell_size,
                            config = config.cell_size,
                            "cell size differs from the one partitions were authored with"
                        );
                    }
                    simulate(config, source, walk)?;
                }
                Some(dir) => simulate(config, DirectorySource::new(dir, extension), walk)?,
                None => {
                    let source = synthetic_world(&config.partition_namespace, 12);
                    simulate(config, source, walk)?;
                }
            }
        }
        Commands::Index {
            dir,
            namespace,
            cell_size,
        } => {
            let manifest = PartitionManifest::build(&dir, &namespace, cell_size)
                .with_context(|| format!("indexing {}", dir.display()))?;
            let path = dir.join(MANIFEST_FILE);
            manifest.save(&path)?;
            println!(
                "Indexed {} partitions for namespace {namespace} into {}",
                manifest.len(),
                path.display()
            );
        }
    }

    Ok(())
}

/// A square world of `half_extent` cells around the origin with a few cells
/// left unauthored.
fn synthetic_world(namespace: &str, half_extent: i32) -> MemorySource<String> {
    let mut source = MemorySource::new();
    for x in -half_extent..=half_extent {
        for z in -half_extent..=half_extent {
            if (x + 2 * z).rem_euclid(7) == 3 {
                continue;
            }
            source.insert(namespace, CellCoord::new(x, z), format!("navmesh {x},{z}"));
        }
    }
    source
}

fn simulate<S: PartitionSource>(config: StreamConfig, source: S, walk: Walk) -> anyhow::Result<()> {
    println!(
        "Simulating {} ticks: cell_size={} radius={} interval={}s policy={:?}",
        walk.ticks,
        config.cell_size,
        config.load_radius_cells,
        config.refresh_interval_seconds,
        config.refresh_policy
    );
    let radius = config.load_radius_cells;
    let mut sink = ActiveSet::new(config.cell_size);
    let pos = Rc::new(Cell::new(Vec3::ZERO));
    let reader = pos.clone();

    let mut cache = StreamingCache::start(config, source, &mut sink, Some(move || reader.get()))?;
    print_report("start", &cache, walk.map, radius);

    let mut refreshes = 1;
    for tick in 1..=walk.ticks {
        pos.set(pos.get() + walk.velocity * walk.dt.as_secs_f32());
        if cache.tick(walk.dt).is_some() {
            refreshes += 1;
            print_report(&format!("tick {tick}"), &cache, walk.map, radius);
        }
    }

    if cache.config().refresh_policy == RefreshPolicy::OnCellChange {
        // Missing cells are only retried on cell change; give them one last try.
        let missing = cache.refresh().missing.len();
        println!("Final refresh: {missing} cells still missing");
    }

    let timer = cache.timer();
    println!(
        "Refreshes: {refreshes}, avg {:?}, min {:?}, max {:?}",
        timer.average(),
        timer.min(),
        timer.max()
    );
    let released = cache.shutdown();
    println!(
        "Shutdown: released {released} partitions, sink registered={} deregistered={} live={}",
        sink.registered_total(),
        sink.deregistered_total(),
        sink.len()
    );
    Ok(())
}

fn print_report<S, T>(
    label: &str,
    cache: &StreamingCache<S, &mut ActiveSet<S::Data>, T>,
    map: bool,
    radius: u32,
) where
    S: PartitionSource,
    T: cellstream_stream::PositionProvider,
{
    let report = cache.last_report();
    println!(
        "[{label}] center={} +{} -{} missing={} active={} ({:?})",
        report.center,
        report.loaded.len(),
        report.unloaded.len(),
        report.missing.len(),
        report.total_active,
        report.elapsed
    );
    println!(
        "  {}",
        RegistryInspector::summary(cache.registry(), cache.center())
    );
    if map {
        print!(
            "{}",
            RegistryInspector::ascii_map(cache.registry(), report.center, radius + 1)
        );
    }
}
