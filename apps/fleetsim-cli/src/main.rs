use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fleetsim_common::{DeterministicRng, init_logging};
use fleetsim_kernel::{EventQueue, SimConfig, Simulation, World};
use fleetsim_persist::{Snapshot, SnapshotStore};
use fleetsim_tools::FleetInspector;

mod demo;

use demo::DemoParams;

#[derive(Parser)]
#[command(name = "fleetsim-cli", about = "Headless runner for fleetsim scenarios")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default configuration
    Info,
    /// Generate a seeded demo scenario and run it
    Run {
        #[arg(long, default_value = "12")]
        customers: u32,
        #[arg(long, default_value = "3")]
        trucks: u32,
        #[arg(long, default_value = "200")]
        ticks: u32,
        /// Seconds per tick
        #[arg(long, default_value = "0.5")]
        dt: f32,
        /// Overrides the seed from the config file
        #[arg(long)]
        seed: Option<u64>,
        /// Give trucks batteries and add charging stations
        #[arg(long)]
        electric: bool,
        /// Send the depot to a second stop at the start of the run
        #[arg(long)]
        moving_depot: bool,
        /// JSON run configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write a snapshot file when the run ends
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
        /// Save the final snapshot into a snapshot store directory
        #[arg(long)]
        store: Option<PathBuf>,
        /// Print the event log after the run
        #[arg(long)]
        print_events: bool,
    },
    /// Continue a run from a snapshot file or the latest stored snapshot
    Resume {
        #[arg(long, conflicts_with = "store", required_unless_present = "store")]
        snapshot: Option<PathBuf>,
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long, default_value = "100")]
        ticks: u32,
        #[arg(long, default_value = "0.5")]
        dt: f32,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },
    /// Check the hash chain of a snapshot store
    Verify {
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, None);

    match cli.command {
        Commands::Info => {
            println!("fleetsim-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("snapshot format: v{}", fleetsim_persist::SNAPSHOT_VERSION);
            println!(
                "default config: {}",
                serde_json::to_string_pretty(&SimConfig::default())?
            );
        }
        Commands::Run {
            customers,
            trucks,
            ticks,
            dt,
            seed,
            electric,
            moving_depot,
            config,
            snapshot_out,
            store,
            print_events,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(seed) = seed {
                config.seed = seed;
            }

            let params = DemoParams {
                customers,
                trucks,
                electric,
                moving_depot,
            };
            let mut rng = DeterministicRng::new(config.seed);
            let problem = demo::generate_problem(params, &mut rng);
            let world = demo::build_demo_world(&problem, &config, trucks)
                .context("building demo world")?;
            tracing::info!(
                seed = config.seed,
                kind = %problem.features,
                customers,
                trucks,
                "starting run"
            );

            let sim = run_ticks(Simulation::new(world, config.engine_options()), ticks, dt);
            report(sim.world(), sim.queue(), print_events);
            finish(&sim, config.seed, snapshot_out, store)?;
        }
        Commands::Resume {
            snapshot,
            store,
            ticks,
            dt,
            config,
            snapshot_out,
        } => {
            let config = load_config(config.as_ref())?;
            let snap = match (&snapshot, &store) {
                (Some(path), _) => Snapshot::read_from_file(path)
                    .with_context(|| format!("reading snapshot {}", path.display()))?,
                (None, Some(dir)) => SnapshotStore::open(dir)?.load_latest()?,
                (None, None) => anyhow::bail!("either --snapshot or --store is required"),
            };
            let (world, queue) = snap.restore();
            tracing::info!(time = world.time(), events = queue.len(), "resuming run");

            let sim = run_ticks(
                Simulation::resume(world, queue, config.engine_options()),
                ticks,
                dt,
            );
            report(sim.world(), sim.queue(), false);
            finish(&sim, snap.seed, snapshot_out, store)?;
        }
        Commands::Verify { store } => {
            let store = SnapshotStore::open(&store)?;
            store.verify_integrity()?;
            println!(
                "store {}: {} snapshots, chain OK",
                store.root().display(),
                store.meta().snapshot_count
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    let config = match path {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run_ticks(mut sim: Simulation, ticks: u32, dt: f32) -> Simulation {
    for _ in 0..ticks {
        sim.step(dt);
    }
    sim
}

fn report(world: &World, queue: &EventQueue, print_events: bool) {
    if print_events {
        for event in queue.iter() {
            println!("{event}");
        }
    }
    println!("{}", FleetInspector::summary(world, queue));
    for id in FleetInspector::list_trucks(world) {
        if let Some(info) = FleetInspector::inspect_truck(world, id) {
            println!("  {info}");
        }
    }
    println!("state_hash={:#018x}", world.state_hash());
}

fn finish(
    sim: &Simulation,
    seed: u64,
    snapshot_out: Option<PathBuf>,
    store: Option<PathBuf>,
) -> anyhow::Result<()> {
    if snapshot_out.is_none() && store.is_none() {
        return Ok(());
    }
    let snap = Snapshot::capture(sim.world(), sim.queue(), seed);
    if let Some(path) = snapshot_out {
        snap.write_to_file(&path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        println!("snapshot written to {}", path.display());
    }
    if let Some(dir) = store {
        let index = SnapshotStore::open(&dir)?.save(&snap)?;
        println!("snapshot {index} saved to {}", dir.display());
    }
    Ok(())
}
