//! HydroNav CLI - flow network navigation and basin delineation

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::Point;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hydronav_core::io::read_network;
use hydronav_core::{NavigationMode, NavigationRequest, NetworkPosition, SegmentId, SourceFeatureRef};
use hydronav_engine::{BasinDelineator, EngineConfig, MemoryNetwork, NavigationEngine};
use hydronav_snap::{HttpSnapService, SnapClientOptions};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hydronav")]
#[command(author, version, about = "Flow network navigation and basin delineation", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (JSON); defaults apply to missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate upstream or downstream from a segment
    Navigate {
        /// Network document (JSON)
        #[arg(short, long)]
        network: PathBuf,
        /// Seed segment COMID
        #[arg(long)]
        comid: u64,
        /// Navigation mode: UM, UT, DM, DD
        #[arg(short, long, default_value = "DM")]
        mode: String,
        /// Maximum distance in km
        #[arg(short, long, default_value = "10")]
        distance: f64,
        /// Return flowlines, trimming the seed at this measure
        #[arg(long)]
        trim_measure: Option<f64>,
        /// Return features of this source found along the way
        #[arg(long)]
        features: Option<String>,
    },
    /// Locate a coordinate on the network
    Position {
        /// Network document (JSON)
        #[arg(short, long)]
        network: PathBuf,
        /// X (longitude)
        #[arg(short, long, allow_hyphen_values = true)]
        x: f64,
        /// Y (latitude)
        #[arg(short, long, allow_hyphen_values = true)]
        y: f64,
    },
    /// Delineate the basin upstream of a feature
    Basin {
        /// Network document (JSON)
        #[arg(short, long)]
        network: PathBuf,
        /// Feature source, or "comid" for a network segment
        #[arg(short, long, default_value = "comid")]
        source: String,
        /// Feature identifier within the source
        #[arg(long)]
        id: String,
        /// Simplify the basin outline
        #[arg(long)]
        simplify: bool,
        /// Split the local catchment at point features
        #[arg(long)]
        split: bool,
        /// Root URL of the hydrologic snap service
        #[arg(long)]
        snap_url: Option<String>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn load_network(path: &Path) -> Result<Arc<MemoryNetwork>> {
    let pb = spinner("Reading network...");
    let doc = read_network(path)
        .with_context(|| format!("Failed to read network {}", path.display()))?;
    pb.finish_and_clear();
    info!(
        "Network: {} segments, {} features",
        doc.segments.len(),
        doc.features.len()
    );
    Ok(Arc::new(MemoryNetwork::from_document(doc)))
}

fn emit(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn done(name: &str, elapsed: Duration) {
    info!("{} finished in {:.2?}", name, elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Navigate {
            network,
            comid,
            mode,
            distance,
            trim_measure,
            features,
        } => {
            let mode: NavigationMode = mode.parse()?;
            let net = load_network(&network)?;
            let engine = NavigationEngine::new(net.clone(), net, &config);
            let seed = SegmentId(comid);
            let start = Instant::now();

            let value = if let Some(source) = features {
                let found = engine
                    .navigate_features(seed, mode, distance, &source)
                    .await
                    .context("Navigation failed")?;
                output::features_json(&found)
            } else if let Some(measure) = trim_measure {
                let flowlines = engine
                    .navigate_flowlines(NetworkPosition::new(seed, measure), mode, distance, true)
                    .await
                    .context("Navigation failed")?;
                output::flowlines_json(&flowlines)
            } else {
                let result = engine
                    .navigate_request(&NavigationRequest::new(seed, mode, distance))
                    .await
                    .context("Navigation failed")?;
                output::navigation_json(&result, distance)
            };
            done("Navigation", start.elapsed());
            emit(&value)?;
        }

        Commands::Position { network, x, y } => {
            let net = load_network(&network)?;
            let engine = NavigationEngine::new(net.clone(), net, &config);
            let position = engine
                .resolve_position(Point::new(x, y))
                .await
                .context("Failed to locate point")?;
            emit(&output::position_json(&position))?;
        }

        Commands::Basin {
            network,
            source,
            id,
            simplify,
            split,
            snap_url,
        } => {
            let net = load_network(&network)?;
            let options = match snap_url {
                Some(url) => SnapClientOptions::new(url),
                None => SnapClientOptions::default(),
            }
            .with_timeout(config.timeouts.snap());
            let snap = HttpSnapService::new(options).context("Failed to build snap client")?;
            let delineator = BasinDelineator::new(net.clone(), net, Arc::new(snap), &config);

            let reference = SourceFeatureRef::new(source, id);
            let start = Instant::now();
            let (basin, pour_point) = delineator
                .delineate_detailed(&reference, simplify, split)
                .await
                .with_context(|| format!("Failed to delineate basin for {}", reference))?;
            done("Delineation", start.elapsed());
            emit(&output::basin_json(&basin, pour_point.as_ref()))?;
        }
    }

    Ok(())
}
