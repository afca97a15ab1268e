#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line harness that forecasts attacks from recorded turn documents.

mod forecast;
mod settings;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use siege_sim_core::{Deployment, Owner, TrajectoryEnd, UnitKind};
use siege_sim_system_attack_planner::Ranking;
use siege_sim_system_path_simulation::SimulationOptions;

#[derive(Debug, Parser)]
#[command(
    name = "siege-sim",
    version,
    about = "Predictive attack planner for diamond-arena matches"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank spawn cells for an attack against the last turn document.
    Plan(PlanArgs),
}

#[derive(Debug, Args)]
struct PlanArgs {
    /// Arena settings document; the bundled stock table is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Turn documents and action frames in match order; the last turn is planned against.
    #[arg(long = "snapshot", required = true)]
    snapshots: Vec<PathBuf>,
    /// Mobile unit kind to deploy.
    #[arg(long, value_enum)]
    unit: MobileUnit,
    /// Number of units stacked on the spawn cell.
    #[arg(long, default_value_t = 1)]
    count: u32,
    /// Side launching the attack.
    #[arg(long, value_enum, default_value_t = Side::Ally)]
    side: Side,
    /// Ranking priority.
    #[arg(long, value_enum, default_value_t = RankingArg::LeastDamageTaken)]
    ranking: RankingArg,
    /// Number of ranked spawns to print.
    #[arg(long, default_value_t = 1)]
    top: usize,
    /// Rebuild the pathing field whenever a structure falls.
    #[arg(long)]
    recompute_on_destruction: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MobileUnit {
    Scout,
    Demolisher,
    Interceptor,
}

impl From<MobileUnit> for UnitKind {
    fn from(unit: MobileUnit) -> Self {
        match unit {
            MobileUnit::Scout => UnitKind::Scout,
            MobileUnit::Demolisher => UnitKind::Demolisher,
            MobileUnit::Interceptor => UnitKind::Interceptor,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Side {
    Ally,
    Opponent,
}

impl From<Side> for Owner {
    fn from(side: Side) -> Self {
        match side {
            Side::Ally => Owner::Ally,
            Side::Opponent => Owner::Opponent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RankingArg {
    LeastDamageTaken,
    MostDamageDealt,
    MostSurvivors,
}

impl From<RankingArg> for Ranking {
    fn from(ranking: RankingArg) -> Self {
        match ranking {
            RankingArg::LeastDamageTaken => Ranking::LeastDamageTaken,
            RankingArg::MostDamageDealt => Ranking::MostDamageDealt,
            RankingArg::MostSurvivors => Ranking::MostSurvivors,
        }
    }
}

/// Entry point for the siege-sim command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Plan(args) => plan(args),
    }
}

fn init_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("failed to initialise logging")
}

fn plan(args: PlanArgs) -> Result<()> {
    let config = settings::load(args.config.as_deref())?;
    let documents = args
        .snapshots
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))
                .map(|contents| (path.display().to_string(), contents))
        })
        .collect::<Result<Vec<_>>>()?;

    let request = forecast::Request {
        deployment: Deployment::new(args.unit.into(), args.count, args.side.into()),
        ranking: args.ranking.into(),
        options: SimulationOptions {
            recompute_on_destruction: args.recompute_on_destruction,
            ..SimulationOptions::default()
        },
        top: args.top,
    };
    let forecast = forecast::run(&config, &documents, request)?;

    println!(
        "turn {}: {} predicted rebuilds, {} x {}",
        forecast.turn,
        forecast.predicted_rebuilds.len(),
        args.count,
        UnitKind::from(args.unit).name()
    );
    if forecast.ranked.is_empty() {
        println!("no viable attack");
        return Ok(());
    }
    for (rank, result) in forecast.ranked.iter().enumerate() {
        let end = match result.end {
            TrajectoryEnd::EdgeReached => "edge reached",
            TrajectoryEnd::Drained => "drained",
            TrajectoryEnd::Stuck => "stuck",
        };
        println!(
            "{:>2}. spawn ({:>2}, {:>2})  dealt {:>6.1}  suffered {:>6.1}  survivors {}/{}  {end}",
            rank + 1,
            result.spawn.x(),
            result.spawn.y(),
            result.damage_dealt,
            result.damage_suffered,
            result.survivors,
            args.count,
        );
    }
    Ok(())
}
