#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Evaluates every legal spawn cell and ranks the simulated trajectories.
//!
//! Ranking is a policy object rather than a fixed ordering: the stock
//! [`Ranking`] variants cover the usual priorities and any comparator
//! closure can be supplied instead. Whatever the policy, ties are finally
//! broken by spawn coordinate so the order is total and deterministic.

use std::cmp::Ordering;

use log::debug;
use siege_sim_core::{ArenaConfig, CellCoord, Deployment, Edge, Owner, Placement, TrajectoryResult};
use siege_sim_system_path_simulation::{PathSimulator, SimulationError, SimulationOptions};
use siege_sim_world::GridSnapshot;

/// Orders two trajectories; `Ordering::Less` means `a` is preferred.
pub trait RankingPolicy {
    /// Compares two simulated trajectories.
    fn compare(&self, a: &TrajectoryResult, b: &TrajectoryResult) -> Ordering;
}

impl<F> RankingPolicy for F
where
    F: Fn(&TrajectoryResult, &TrajectoryResult) -> Ordering,
{
    fn compare(&self, a: &TrajectoryResult, b: &TrajectoryResult) -> Ordering {
        self(a, b)
    }
}

/// Stock ranking priorities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Ranking {
    /// Least net damage suffered, then most damage dealt, then most survivors.
    #[default]
    LeastDamageTaken,
    /// Most damage dealt, then least damage suffered, then most survivors.
    MostDamageDealt,
    /// Most survivors, then least damage suffered, then most damage dealt.
    MostSurvivors,
}

impl RankingPolicy for Ranking {
    fn compare(&self, a: &TrajectoryResult, b: &TrajectoryResult) -> Ordering {
        let suffered = a.damage_suffered.total_cmp(&b.damage_suffered);
        let dealt = b.damage_dealt.total_cmp(&a.damage_dealt);
        let survivors = b.survivors.cmp(&a.survivors);
        match self {
            Self::LeastDamageTaken => suffered.then(dealt).then(survivors),
            Self::MostDamageDealt => dealt.then(suffered).then(survivors),
            Self::MostSurvivors => survivors.then(suffered).then(dealt),
        }
    }
}

/// Outcome handed to the decision layer.
#[derive(Clone, Debug, PartialEq)]
pub enum AttackPlan {
    /// Every entry cell is blocked or cut off from the far edge.
    NoViableAttack,
    /// Top-ranked trajectory.
    Best(TrajectoryResult),
}

impl AttackPlan {
    /// Top-ranked trajectory, if any.
    #[must_use]
    pub fn best(&self) -> Option<&TrajectoryResult> {
        match self {
            Self::NoViableAttack => None,
            Self::Best(result) => Some(result),
        }
    }
}

/// Ranks spawn candidates for one side.
#[derive(Clone, Copy, Debug)]
pub struct AttackPlanner<'a, R = Ranking> {
    simulator: PathSimulator<'a>,
    ranking: R,
}

impl<'a> AttackPlanner<'a, Ranking> {
    /// Creates a planner with default simulation options and ranking.
    #[must_use]
    pub fn new(config: &'a ArenaConfig) -> Self {
        Self::with_ranking(config, SimulationOptions::default(), Ranking::default())
    }
}

impl<'a, R: RankingPolicy> AttackPlanner<'a, R> {
    /// Creates a planner with explicit options and ranking policy.
    #[must_use]
    pub fn with_ranking(config: &'a ArenaConfig, options: SimulationOptions, ranking: R) -> Self {
        Self {
            simulator: PathSimulator::with_options(config, options),
            ranking,
        }
    }

    /// Ranking policy in effect.
    #[must_use]
    pub const fn ranking(&self) -> &R {
        &self.ranking
    }

    /// Entry cells of `owner` not currently holding a structure.
    #[must_use]
    pub fn candidates(&self, grid: &GridSnapshot, owner: Owner) -> Vec<CellCoord> {
        Edge::entry_edges(owner)
            .into_iter()
            .flat_map(|edge| grid.edge_cells(edge))
            .filter(|cell| !grid.contains_stationary(*cell))
            .collect()
    }

    /// Simulates every candidate and returns the viable ones, best first.
    pub fn rank(
        &self,
        grid: &GridSnapshot,
        predicted: &[Placement],
        deployment: Deployment,
    ) -> Result<Vec<TrajectoryResult>, SimulationError> {
        let mut results = Vec::new();
        for spawn in self.candidates(grid, deployment.owner) {
            match self.simulator.simulate(grid, predicted, spawn, deployment)? {
                Some(result) => {
                    debug!(
                        "candidate {spawn:?}: dealt {:.1}, suffered {:.1}, survivors {}, {:?}",
                        result.damage_dealt, result.damage_suffered, result.survivors, result.end
                    );
                    results.push(result);
                }
                None => debug!("candidate {spawn:?} is unreachable"),
            }
        }

        results.sort_by(|a, b| {
            self.ranking
                .compare(a, b)
                .then_with(|| a.spawn.cmp(&b.spawn))
        });
        Ok(results)
    }

    /// Returns the top-ranked trajectory for `deployment`.
    pub fn plan(
        &self,
        grid: &GridSnapshot,
        predicted: &[Placement],
        deployment: Deployment,
    ) -> Result<AttackPlan, SimulationError> {
        let plan = self
            .rank(grid, predicted, deployment)?
            .into_iter()
            .next()
            .map_or(AttackPlan::NoViableAttack, AttackPlan::Best);
        if let AttackPlan::Best(best) = &plan {
            debug!(
                "best spawn {:?} for {} x {}",
                best.spawn,
                deployment.count,
                deployment.kind.name()
            );
        }
        Ok(plan)
    }
}
