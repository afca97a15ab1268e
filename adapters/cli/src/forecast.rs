use anyhow::{Context, Result};
use log::{debug, info, warn};
use siege_sim_core::{ArenaConfig, Deployment, Owner, Placement, TrajectoryResult};
use siege_sim_snapshot::{parse_document, Document, TurnSnapshot};
use siege_sim_system_attack_planner::{AttackPlanner, Ranking};
use siege_sim_system_opponent_prediction::OpponentPredictor;
use siege_sim_system_path_simulation::SimulationOptions;

/// Attack to evaluate against the final turn document.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Request {
    pub(crate) deployment: Deployment,
    pub(crate) ranking: Ranking,
    pub(crate) options: SimulationOptions,
    pub(crate) top: usize,
}

/// Ranked trajectories for the final turn, best first.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Forecast {
    pub(crate) turn: u32,
    pub(crate) predicted_rebuilds: Vec<Placement>,
    pub(crate) ranked: Vec<TrajectoryResult>,
}

/// Replays `documents` through the predictor and ranks spawns on the last turn.
///
/// Rebuilds are predicted at every turn document, so each prediction only
/// sees the losses reported since the previous turn.
pub(crate) fn run(
    config: &ArenaConfig,
    documents: &[(String, String)],
    request: Request,
) -> Result<Forecast> {
    let mut predictor = OpponentPredictor::new();
    let mut last: Option<(TurnSnapshot, Vec<Placement>)> = None;

    for (name, contents) in documents {
        let document = parse_document(contents, config)
            .with_context(|| format!("failed to read match document {name}"))?;
        let snapshot = match document {
            Document::Frame(events) => {
                predictor.observe_events(&events);
                continue;
            }
            Document::Turn(snapshot) => snapshot,
        };

        let _ = predictor.observe_structures(&snapshot.grid);
        predictor.observe_events(&snapshot.events);
        let budget = snapshot.grid.player(Owner::Opponent).structure_points;
        let predicted = predictor.predict(budget, config.units());
        debug!(
            "turn {}: {} rebuilds predicted from {name}",
            snapshot.grid.turn(),
            predicted.len()
        );
        last = Some((snapshot, predicted));
    }
    let (snapshot, predicted) = last.context("at least one turn document is required")?;

    let predicted = if request.deployment.owner == Owner::Ally {
        predicted
    } else {
        Vec::new()
    };
    info!(
        "turn {}: {} predicted rebuilds",
        snapshot.grid.turn(),
        predicted.len()
    );

    let planner = AttackPlanner::with_ranking(config, request.options, request.ranking);
    let mut ranked = planner
        .rank(&snapshot.grid, &predicted, request.deployment)
        .context("trajectory simulation failed")?;
    if ranked.is_empty() {
        warn!("no viable attack on turn {}", snapshot.grid.turn());
    }
    ranked.truncate(request.top.max(1));

    Ok(Forecast {
        turn: snapshot.grid.turn(),
        predicted_rebuilds: predicted,
        ranked,
    })
}
