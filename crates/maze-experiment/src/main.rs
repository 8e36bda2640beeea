//! Maze Exploration Experiment CLI.
//!
//! Commands:
//! - run: Explore a labyrinth with N cooperating crawlers
//! - check: Validate a labyrinth file without running anything

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use maze_experiment::{ExperimentRunner, Labyrinth};
use maze_kernel::ExplorationConfig;

/// Generate a timestamped output path from the given path.
/// e.g., "results.json" -> "results-20260108-010530.json"
fn timestamped_path(path: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("results");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}-{}.{}", stem, timestamp, ext))
}

#[derive(Parser)]
#[command(name = "maze-experiment")]
#[command(version)]
#[command(about = "Cooperative maze exploration experiments")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore a labyrinth with cooperating crawlers
    Run {
        /// Number of agents (one crawler each)
        #[arg(long)]
        agents: Option<usize>,

        /// Run duration in seconds
        #[arg(long)]
        seconds: Option<u64>,

        /// Labyrinth file (ASCII). Default: built-in demo maze
        #[arg(long, env = "MAZE_FILE")]
        maze: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file for results (a timestamp is appended)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Base seed for the agents' random turns
        #[arg(long)]
        seed: Option<u64>,

        /// Simulated latency per crawler call (milliseconds)
        #[arg(long)]
        latency_ms: Option<u64>,
    },

    /// Parse a labyrinth file and print its dimensions
    Check {
        /// Labyrinth file (ASCII)
        #[arg(long)]
        maze: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<ExplorationConfig> {
    let Some(path) = path else {
        return Ok(ExplorationConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing config {}", path.display()))
}

fn load_labyrinth(path: Option<&Path>) -> Result<(Labyrinth, String)> {
    let Some(path) = path else {
        return Ok((Labyrinth::demo()?, "demo".to_string()));
    };
    let ascii = std::fs::read_to_string(path)
        .with_context(|| format!("reading maze {}", path.display()))?;
    let labyrinth =
        Labyrinth::parse(&ascii).with_context(|| format!("parsing maze {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("maze")
        .to_string();
    Ok((labyrinth, name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Commands::Run {
            agents,
            seconds,
            maze,
            config,
            output,
            seed,
            latency_ms,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(agents) = agents {
                config.run.agents = agents;
            }
            if let Some(seconds) = seconds {
                config.run.duration_secs = seconds;
            }
            if let Some(latency_ms) = latency_ms {
                config.run.crawler_latency_ms = latency_ms;
            }
            if seed.is_some() {
                config.agent.seed = seed;
            }

            let (labyrinth, maze_name) = load_labyrinth(maze.as_deref())?;
            info!(
                maze = %maze_name,
                width = labyrinth.width(),
                height = labyrinth.height(),
                start = %labyrinth.start(),
                "Labyrinth loaded"
            );

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-C received, stopping agents");
                    on_ctrl_c.cancel();
                }
            });

            let runner = ExperimentRunner::new(labyrinth, maze_name, config);
            let result = runner.run(cancel).await?;

            println!("\n=== Exploration Result ===");
            println!("Run: {}", result.run_id);
            println!("Maze: {}", result.maze);
            println!("Agents: {}", result.config.run.agents);
            println!("Duration: {:.2}s", result.duration_ms as f64 / 1000.0);
            println!("Known cells: {}", result.known_cells);
            println!(
                "Open cells: {}/{} ({:.1}%)",
                result.open_cells_discovered,
                result.open_cells_total,
                result.coverage * 100.0
            );
            println!("Frontiers remaining: {}", result.frontiers_remaining);
            if result.contradictions > 0 {
                println!("Contradictions: {}", result.contradictions);
            }

            println!("\nCoordinator:");
            println!("  Observations published: {}", result.coordinator.published);
            println!("  Observations applied: {}", result.coordinator.applied);
            println!("  Cells changed: {}", result.coordinator.cells_changed);
            println!(
                "  Reservations granted/denied: {}/{}",
                result.coordinator.reservations_granted, result.coordinator.reservations_denied
            );

            println!("\nPer-Agent:");
            println!(
                "  {:>10} {:>6} {:>6} {:>6} {:>6} {:>8} {:>10}",
                "Agent", "Iters", "Walks", "Failed", "Items", "Targets", "Final"
            );
            for report in &result.agents {
                println!(
                    "  {:>10} {:>6} {:>6} {:>6} {:>6} {:>8} {:>10}",
                    report.agent.as_str(),
                    report.iterations,
                    report.walks,
                    report.failed_walks,
                    report.items_collected,
                    report.frontiers_targeted,
                    report.final_position.to_string()
                );
            }
            for failure in &result.agent_errors {
                warn!(agent = %failure.agent, error = %failure.error, "Agent failed");
            }

            if let Some(output) = output {
                let output_path = timestamped_path(&output);
                result.save(&output_path)?;
                println!("\nResults saved to: {}", output_path.display());
            }
        }

        Commands::Check { maze } => {
            let (labyrinth, name) = load_labyrinth(Some(&maze))?;
            println!("{}: {}x{}", name, labyrinth.width(), labyrinth.height());
            println!("Start: {}", labyrinth.start());
            println!("Open cells: {}", labyrinth.open_cells());
        }
    }

    Ok(())
}
