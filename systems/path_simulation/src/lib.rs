#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Forward simulation of one stack from spawn until it drains, gets stuck or
//! reaches the far edge.
//!
//! Every trajectory runs on a private clone of the caller's snapshot. The
//! clone receives the pending build stack and the predicted opponent
//! placements before the stack is spawned, and is dropped when the
//! trajectory ends.

use log::{debug, trace};
use siege_sim_core::{
    ArenaConfig, Axis, CellCoord, Deployment, Placement, TrajectoryEnd, TrajectoryResult,
};
use siege_sim_system_combat::CombatResolver;
use siege_sim_system_pathfinding::{NextStep, Pathfinder};
use siege_sim_world::{GridSnapshot, PlacementError};
use thiserror::Error;

/// Knobs controlling a trajectory simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationOptions {
    /// Rebuild the idealness field whenever the stack destroys a structure.
    pub recompute_on_destruction: bool,
    /// Upper bound on moves; defaults to the number of cells in the arena.
    pub max_steps: Option<usize>,
}

/// Failures that abort a trajectory simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The spawn cell is not part of any arena edge.
    #[error("spawn cell {0:?} is not on an arena edge")]
    NotAnEdge(CellCoord),
    /// The stack could not be placed on the spawn cell.
    #[error("failed to spawn the stack: {0}")]
    Spawn(#[from] PlacementError),
    /// The stack kept moving past the step limit.
    #[error("trajectory from {spawn:?} exceeded {limit} steps")]
    StepLimitExceeded {
        /// Spawn cell of the runaway trajectory.
        spawn: CellCoord,
        /// Limit that was exceeded.
        limit: usize,
    },
}

/// Simulates trajectories against a borrowed configuration.
#[derive(Clone, Copy, Debug)]
pub struct PathSimulator<'a> {
    config: &'a ArenaConfig,
    pathfinder: Pathfinder,
    options: SimulationOptions,
}

impl<'a> PathSimulator<'a> {
    /// Creates a simulator with default options.
    #[must_use]
    pub fn new(config: &'a ArenaConfig) -> Self {
        Self::with_options(config, SimulationOptions::default())
    }

    /// Creates a simulator with explicit options.
    #[must_use]
    pub fn with_options(config: &'a ArenaConfig, options: SimulationOptions) -> Self {
        Self {
            config,
            pathfinder: Pathfinder::from_config(config),
            options,
        }
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> SimulationOptions {
        self.options
    }

    /// Configuration the simulator reads unit stats from.
    #[must_use]
    pub const fn config(&self) -> &'a ArenaConfig {
        self.config
    }

    /// Simulates `deployment` spawning on `spawn`.
    ///
    /// Returns `Ok(None)` when the spawn cell is blocked or has no route to
    /// the opposite edge once pending and predicted builds are applied.
    pub fn simulate(
        &self,
        grid: &GridSnapshot,
        predicted: &[Placement],
        spawn: CellCoord,
        deployment: Deployment,
    ) -> Result<Option<TrajectoryResult>, SimulationError> {
        let target = grid
            .target_edge(spawn)
            .ok_or(SimulationError::NotAnEdge(spawn))?;
        let units = self.config.units();
        let mover = deployment.owner;

        let mut work = grid.clone();
        let _ = work.apply_build_stack(units);
        let _ = work.apply_placements(predicted, units);
        if !work.is_passable(spawn) {
            debug!("spawn {spawn:?} is blocked after pending builds");
            return Ok(None);
        }

        let mut field = self.pathfinder.compute_field(&work, target, mover);
        if !field.reaches_target(spawn) {
            debug!("spawn {spawn:?} has no route to {target:?}");
            return Ok(None);
        }

        work.spawn_stack(spawn, deployment.kind, mover, deployment.count, units)?;

        let limit = self
            .options
            .max_steps
            .unwrap_or_else(|| work.arena().cell_count());
        let mut resolver = CombatResolver::new();
        let mut current = spawn;
        let mut previous_axis: Option<Axis> = None;
        let mut path = vec![spawn];
        let mut damage_dealt = 0.0;
        let mut damage_suffered = 0.0;

        let end = loop {
            if work.stack_len(current, mover) == 0 {
                break TrajectoryEnd::Drained;
            }

            let outcome = resolver.resolve(&mut work, current, mover);
            damage_dealt += outcome.damage_to_target;
            damage_suffered += outcome.suffered();

            if self.options.recompute_on_destruction && !outcome.structures_destroyed.is_empty() {
                trace!(
                    "rebuilding field after destroying {:?}",
                    outcome.structures_destroyed
                );
                field = self.pathfinder.compute_field(&work, target, mover);
            }

            if work.stack_len(current, mover) == 0 {
                break TrajectoryEnd::Drained;
            }

            match self.pathfinder.next_step(&work, &field, current, previous_axis) {
                NextStep::Arrived => break TrajectoryEnd::EdgeReached,
                NextStep::Stuck => break TrajectoryEnd::Stuck,
                NextStep::Move { cell, axis } => {
                    if path.len() > limit {
                        return Err(SimulationError::StepLimitExceeded { spawn, limit });
                    }
                    work.move_stack(current, cell, mover);
                    path.push(cell);
                    current = cell;
                    previous_axis = Some(axis);
                }
            }
        };

        debug!(
            "trajectory from {spawn:?} ended {end:?} with {} supports credited",
            resolver.credited_supports().count()
        );
        let remaining = work.stack_len(current, mover);
        let survivors = match end {
            TrajectoryEnd::EdgeReached => u32::try_from(remaining).unwrap_or(u32::MAX),
            TrajectoryEnd::Drained | TrajectoryEnd::Stuck => 0,
        };

        Ok(Some(TrajectoryResult {
            spawn,
            damage_dealt,
            damage_suffered,
            survivors,
            end,
            path,
        }))
    }
}
