#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Idealness field construction and deterministic next-step selection.
//!
//! The field is seeded from every passable cell of the target edge and
//! expanded inward with a uniform-cost search. Entering a cell costs one step
//! plus the configured penalty for each opposing attacker covering it, so the
//! stored value is the cheapest cost-to-go from a cell to the edge. Following
//! [`Pathfinder::next_step`] therefore visits strictly decreasing values and
//! always terminates.

use std::{cmp::Reverse, collections::BinaryHeap};

use siege_sim_core::{ArenaConfig, Axis, CellCoord, Edge, Owner, PathingPolicy};
use siege_sim_world::{query, Arena, GridSnapshot};

/// Idealness stored on every target edge cell.
pub const TERMINAL_IDEALNESS: u32 = 0;

const UNREACHABLE: u32 = u32::MAX;
const STEP_COST: u32 = 1;

/// Dense cost-to-go field toward one edge.
///
/// Values are `u32::MAX` for structures, cells outside the arena and cells
/// with no route to the edge; [`IdealnessField::idealness`] reports those as
/// `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdealnessField {
    arena: Arena,
    target: Edge,
    values: Vec<u32>,
}

impl IdealnessField {
    /// Edge the field leads toward.
    #[must_use]
    pub const fn target(&self) -> Edge {
        self.target
    }

    /// Cost-to-go from `cell`, if the edge is reachable from it.
    #[must_use]
    pub fn idealness(&self, cell: CellCoord) -> Option<u32> {
        let index = self.arena.index(cell)?;
        self.values
            .get(index)
            .copied()
            .filter(|value| *value != UNREACHABLE)
    }

    /// Reports whether `cell` is a reachable target edge cell.
    #[must_use]
    pub fn is_terminal(&self, cell: CellCoord) -> bool {
        self.idealness(cell) == Some(TERMINAL_IDEALNESS)
    }

    /// Reports whether a unit standing on `cell` can reach the target edge.
    #[must_use]
    pub fn reaches_target(&self, cell: CellCoord) -> bool {
        self.idealness(cell).is_some()
    }
}

/// Decision taken for a unit standing on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextStep {
    /// The unit already stands on a target edge cell.
    Arrived,
    /// The unit should advance to `cell` along `axis`.
    Move {
        /// Destination cell.
        cell: CellCoord,
        /// Axis of the move.
        axis: Axis,
    },
    /// No neighbour improves on the current cell.
    Stuck,
}

/// Stateless pathfinder configured with a pathing policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pathfinder {
    policy: PathingPolicy,
}

impl Pathfinder {
    /// Creates a pathfinder using `policy`.
    #[must_use]
    pub const fn new(policy: PathingPolicy) -> Self {
        Self { policy }
    }

    /// Creates a pathfinder using the configured pathing policy.
    #[must_use]
    pub const fn from_config(config: &ArenaConfig) -> Self {
        Self::new(config.pathing())
    }

    /// Builds the idealness field toward `target` for mobile units of `mover`.
    #[must_use]
    pub fn compute_field(
        &self,
        grid: &GridSnapshot,
        target: Edge,
        mover: Owner,
    ) -> IdealnessField {
        let arena = *grid.arena();
        let mut values = vec![UNREACHABLE; arena.cell_count()];
        let penalties = self.penalties(grid, mover);
        let mut frontier = BinaryHeap::new();

        for exit in grid.edge_cells(target) {
            if !grid.is_passable(exit) {
                continue;
            }
            let Some(index) = arena.index(exit) else {
                continue;
            };
            values[index] = TERMINAL_IDEALNESS;
            frontier.push(Reverse((TERMINAL_IDEALNESS, index)));
        }

        while let Some(Reverse((value, index))) = frontier.pop() {
            if value > values[index] {
                continue;
            }
            let Some(cell) = arena.coord(index) else {
                continue;
            };

            let penalty = penalties.get(index).copied().unwrap_or(0);
            let entry_cost = STEP_COST.saturating_add(penalty);
            let next_value = value.saturating_add(entry_cost);
            if next_value == UNREACHABLE {
                continue;
            }

            for neighbor in arena.neighbors(cell) {
                if !grid.is_passable(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = arena.index(neighbor) else {
                    continue;
                };
                if values[neighbor_index] <= next_value {
                    continue;
                }
                values[neighbor_index] = next_value;
                frontier.push(Reverse((next_value, neighbor_index)));
            }
        }

        IdealnessField {
            arena,
            target,
            values,
        }
    }

    /// Chooses the move for a unit standing on `current`.
    ///
    /// Only orthogonal neighbours with the lowest idealness strictly below the
    /// current cell qualify. Ties prefer switching axis relative to
    /// `previous_axis` (vertical when there is no previous move), then the
    /// direction heading toward the target edge, then the lower coordinate.
    #[must_use]
    pub fn next_step(
        &self,
        grid: &GridSnapshot,
        field: &IdealnessField,
        current: CellCoord,
        previous_axis: Option<Axis>,
    ) -> NextStep {
        let Some(current_value) = field.idealness(current) else {
            return NextStep::Stuck;
        };
        if current_value == TERMINAL_IDEALNESS {
            return NextStep::Arrived;
        }

        let heading = field.target().heading();
        let mut best: Option<Candidate> = None;

        for neighbor in grid.arena().neighbors(current) {
            if !grid.is_passable(neighbor) {
                continue;
            }
            let Some(value) = field.idealness(neighbor) else {
                continue;
            };
            if value >= current_value {
                continue;
            }
            let Some(axis) = Axis::between(current, neighbor) else {
                continue;
            };

            let candidate = Candidate {
                cell: neighbor,
                axis,
                value,
                keeps_axis: match previous_axis {
                    Some(previous) => previous == axis,
                    None => axis == Axis::Horizontal,
                },
                against_heading: !follows_heading(current, neighbor, heading),
            };
            best = Some(match best {
                Some(existing) if !candidate.is_better_than(&existing) => existing,
                _ => candidate,
            });
        }

        best.map_or(NextStep::Stuck, |candidate| NextStep::Move {
            cell: candidate.cell,
            axis: candidate.axis,
        })
    }

    /// Follows [`Pathfinder::next_step`] from `spawn` until the edge.
    ///
    /// Returns `None` when the edge is unreachable or the walk gets stuck.
    #[must_use]
    pub fn trace(
        &self,
        grid: &GridSnapshot,
        field: &IdealnessField,
        spawn: CellCoord,
    ) -> Option<Vec<CellCoord>> {
        let mut path = vec![spawn];
        let mut current = spawn;
        let mut previous_axis = None;

        loop {
            match self.next_step(grid, field, current, previous_axis) {
                NextStep::Arrived => return Some(path),
                NextStep::Stuck => return None,
                NextStep::Move { cell, axis } => {
                    path.push(cell);
                    current = cell;
                    previous_axis = Some(axis);
                }
            }
        }
    }

    fn penalties(&self, grid: &GridSnapshot, mover: Owner) -> Vec<u32> {
        let arena = grid.arena();
        let mut penalties = vec![0; arena.cell_count()];
        if self.policy.threat_penalty == 0 {
            return penalties;
        }

        for cell in arena.cells() {
            let threats = query::threat_count(grid, cell, mover);
            if threats == 0 {
                continue;
            }
            if let Some(index) = arena.index(cell) {
                penalties[index] = threats.saturating_mul(self.policy.threat_penalty);
            }
        }
        penalties
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cell: CellCoord,
    axis: Axis,
    value: u32,
    keeps_axis: bool,
    against_heading: bool,
}

impl Candidate {
    fn is_better_than(&self, other: &Candidate) -> bool {
        let rank = (
            self.value,
            self.keeps_axis,
            self.against_heading,
            self.cell.y(),
            self.cell.x(),
        );
        let other_rank = (
            other.value,
            other.keeps_axis,
            other.against_heading,
            other.cell.y(),
            other.cell.x(),
        );
        rank < other_rank
    }
}

fn follows_heading(from: CellCoord, to: CellCoord, heading: (i8, i8)) -> bool {
    let (dx, dy) = heading;
    if to.x() > from.x() {
        dx > 0
    } else if to.x() < from.x() {
        dx < 0
    } else if to.y() > from.y() {
        dy > 0
    } else {
        dy < 0
    }
}
