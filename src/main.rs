use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use traffic_schedule::generator::{self, GeneratorConfig};
use traffic_schedule::hashcode;
use traffic_schedule::simulation::{
    CostMode, EngineConfig, LightPolicy, LoopConfig, NetworkModel, OptimizationLoop,
    SimulationEngine,
};

#[derive(Parser)]
#[command(name = "traffic_schedule")]
#[command(about = "Simulate traffic light schedules and search for better ones")]
struct Cli {
    /// Scenario file; a random scenario is generated when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the optimized schedule to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of simulate / optimize rounds
    #[arg(long, default_value = "10")]
    rounds: usize,

    /// Wait estimate used by the optimizer
    #[arg(long, value_enum, default_value_t = CostMode::Approximate)]
    mode: CostMode,

    /// Keep the best scoring schedule instead of the last one
    #[arg(long)]
    keep_best: bool,

    /// Also report the score when every light is treated as green
    #[arg(long)]
    ignore_lights: bool,

    /// Seed of the generated scenario
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Intersections of the generated scenario
    #[arg(long, default_value = "20")]
    intersections: usize,

    /// Chord streets per intersection of the generated scenario
    #[arg(long, default_value = "2")]
    streets_per_intersection: usize,

    /// Vehicles of the generated scenario
    #[arg(long, default_value = "200")]
    vehicles: usize,

    /// Horizon of the generated scenario in ticks
    #[arg(long, default_value = "200")]
    horizon: u32,

    /// Bonus points per arrival of the generated scenario
    #[arg(long, default_value = "100")]
    bonus: u64,
}

fn load_network(cli: &Cli) -> Result<NetworkModel> {
    match &cli.input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            hashcode::parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
        }
        None => {
            let config = GeneratorConfig {
                intersections: cli.intersections,
                extra_streets_per_intersection: cli.streets_per_intersection,
                vehicles: cli.vehicles,
                horizon: cli.horizon,
                bonus: cli.bonus,
                ..GeneratorConfig::default()
            };
            generator::generate(&config, cli.seed)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,traffic_schedule=info"),
    )
    .init();

    let cli = Cli::parse();
    let network = load_network(&cli)?;

    info!("Horizon:       {}", network.horizon());
    info!("Intersections: {}", network.intersection_count());
    info!("Streets:       {}", network.street_count());
    info!("Vehicles:      {}", network.vehicle_count());
    info!("Bonus points:  {}", network.bonus());

    let mut optimization = OptimizationLoop::new(&network);

    if cli.ignore_lights {
        optimization.initialize()?;
        let mut engine = SimulationEngine::with_config(
            &network,
            EngineConfig {
                light_policy: LightPolicy::IgnoreLights,
                ..EngineConfig::default()
            },
        );
        let bound = engine.run(optimization.schedules());
        info!(
            "Ignoring lights: score {} ({}/{} vehicles arrived)",
            bound.score,
            bound.arrived,
            network.vehicle_count()
        );
    }

    let outcome = optimization.run(LoopConfig {
        rounds: cli.rounds,
        mode: cli.mode,
        keep_best: cli.keep_best,
    })?;
    info!(
        "Best score: {} (round {})",
        outcome.best_score,
        outcome.best_round + 1
    );

    if let Some(path) = &cli.output {
        let text = hashcode::write_schedule(&network, optimization.schedules());
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Schedule written to {}", path.display());
    }

    Ok(())
}
