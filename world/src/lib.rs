#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid snapshot of the arena used as the simulation substrate.
//!
//! Cells are array slots keyed by coordinate and units are stored by value
//! inside their cell, so cloning a [`GridSnapshot`] produces a fully
//! independent copy. Simulations always work on such a copy; the canonical
//! snapshot owned by the decision layer is only ever borrowed immutably.

mod arena;
mod units;

use log::{debug, warn};
use siege_sim_core::{
    ArenaConfig, BuildIntent, CellCoord, Edge, Owner, Placement, PlayerStats, UnitKind, UnitTable,
};
use thiserror::Error;

pub use arena::Arena;
pub use units::Unit;

/// Reasons a unit cannot be added to or changed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The cell lies outside the diamond arena.
    #[error("cell {0:?} is outside the arena")]
    OutOfBounds(CellCoord),
    /// A structure already stands on the cell, or a structure was requested on a busy cell.
    #[error("cell {0:?} is already occupied")]
    Occupied(CellCoord),
    /// An upgrade targeted a cell without a structure.
    #[error("no structure stands on cell {0:?}")]
    NoStructure(CellCoord),
    /// A stack was requested for a structure kind.
    #[error("{0:?} cannot be spawned as a mobile stack")]
    NotMobile(UnitKind),
    /// A structure placement was requested for a mobile kind.
    #[error("{0:?} cannot be placed as a structure")]
    NotStationary(UnitKind),
}

/// Outcome of applying incoming fire to a mobile stack.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StackDamage {
    /// Health actually removed from the stack.
    pub absorbed: f32,
    /// Units removed because their health reached zero.
    pub destroyed: u32,
}

/// Outcome of firing at a structure.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StructureHit {
    /// Damage absorbed by the structure.
    pub applied: f32,
    /// Whether the structure was destroyed and removed.
    pub destroyed: bool,
}

/// Occupancy, resources and pending builds for one moment of the match.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSnapshot {
    arena: Arena,
    cells: Vec<Vec<Unit>>,
    players: [PlayerStats; 2],
    build_stack: Vec<BuildIntent>,
    turn: u32,
}

impl GridSnapshot {
    /// Creates an empty snapshot with the provided arena size.
    #[must_use]
    pub fn new(size: u32) -> Self {
        let arena = Arena::new(size);
        Self {
            arena,
            cells: vec![Vec::new(); arena.cell_count()],
            players: [PlayerStats::default(); 2],
            build_stack: Vec::new(),
            turn: 0,
        }
    }

    /// Creates an empty snapshot sized for `config`.
    #[must_use]
    pub fn for_config(config: &ArenaConfig) -> Self {
        Self::new(config.size())
    }

    /// Arena geometry.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Turn number the snapshot was captured on.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Records the turn number.
    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    /// Reports whether `cell` lies inside the arena.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        self.arena.contains(cell)
    }

    /// Cells of `edge`.
    #[must_use]
    pub fn edge_cells(&self, edge: Edge) -> Vec<CellCoord> {
        self.arena.edge_cells(edge)
    }

    /// Edge a stack spawned on `spawn` travels toward.
    #[must_use]
    pub fn target_edge(&self, spawn: CellCoord) -> Option<Edge> {
        self.arena.edge_of(spawn).map(Edge::opposite)
    }

    /// Resource pools of `owner`.
    #[must_use]
    pub const fn player(&self, owner: Owner) -> &PlayerStats {
        &self.players[owner.index()]
    }

    /// Replaces the resource pools of `owner`.
    pub fn set_player(&mut self, owner: Owner, stats: PlayerStats) {
        self.players[owner.index()] = stats;
    }

    /// Units standing on `cell`; empty outside the arena.
    #[must_use]
    pub fn units_at(&self, cell: CellCoord) -> &[Unit] {
        match self.slot(cell) {
            Some(index) => &self.cells[index],
            None => &[],
        }
    }

    /// Structure standing on `cell`, if any.
    #[must_use]
    pub fn stationary_at(&self, cell: CellCoord) -> Option<&Unit> {
        self.units_at(cell)
            .iter()
            .find(|unit| unit.kind().is_stationary())
    }

    /// Reports whether a structure stands on `cell`.
    #[must_use]
    pub fn contains_stationary(&self, cell: CellCoord) -> bool {
        self.stationary_at(cell).is_some()
    }

    /// Reports whether a mobile unit may stand on `cell`.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord) -> bool {
        self.in_bounds(cell) && !self.contains_stationary(cell)
    }

    /// Every structure on the grid, with its cell.
    pub fn structures(&self) -> impl Iterator<Item = (CellCoord, &Unit)> + '_ {
        self.arena
            .cells()
            .filter_map(move |cell| self.stationary_at(cell).map(|unit| (cell, unit)))
    }

    /// Adds `unit` to `cell`.
    ///
    /// Structures require an empty cell; mobile units only require that no
    /// structure stands there.
    pub fn place_unit(&mut self, cell: CellCoord, unit: Unit) -> Result<(), PlacementError> {
        let index = self.slot(cell).ok_or(PlacementError::OutOfBounds(cell))?;
        let occupants = &mut self.cells[index];
        let blocked = if unit.kind().is_stationary() {
            !occupants.is_empty()
        } else {
            occupants.iter().any(|other| other.kind().is_stationary())
        };
        if blocked {
            return Err(PlacementError::Occupied(cell));
        }
        occupants.push(unit);
        Ok(())
    }

    /// Places a structure described by `placement`.
    pub fn place_structure(
        &mut self,
        placement: &Placement,
        table: &UnitTable,
    ) -> Result<(), PlacementError> {
        if !placement.kind.is_stationary() {
            return Err(PlacementError::NotStationary(placement.kind));
        }
        let unit = if placement.upgraded {
            Unit::new_upgraded(placement.kind, placement.owner, table)
        } else {
            Unit::new(placement.kind, placement.owner, table)
        };
        self.place_unit(placement.cell, unit)
    }

    /// Stacks `count` fresh mobile units of `kind` on `cell`.
    pub fn spawn_stack(
        &mut self,
        cell: CellCoord,
        kind: UnitKind,
        owner: Owner,
        count: u32,
        table: &UnitTable,
    ) -> Result<(), PlacementError> {
        if !kind.is_mobile() {
            return Err(PlacementError::NotMobile(kind));
        }
        for _ in 0..count {
            self.place_unit(cell, Unit::new(kind, owner, table))?;
        }
        Ok(())
    }

    /// Upgrades the structure on `cell`.
    pub fn upgrade_at(
        &mut self,
        cell: CellCoord,
        table: &UnitTable,
    ) -> Result<(), PlacementError> {
        let index = self.slot(cell).ok_or(PlacementError::OutOfBounds(cell))?;
        let structure = self.cells[index]
            .iter_mut()
            .find(|unit| unit.kind().is_stationary())
            .ok_or(PlacementError::NoStructure(cell))?;
        let _ = structure.upgrade(table);
        Ok(())
    }

    /// Removes and returns the structure on `cell`.
    pub fn remove_stationary(&mut self, cell: CellCoord) -> Option<Unit> {
        let index = self.slot(cell)?;
        let occupants = &mut self.cells[index];
        let position = occupants
            .iter()
            .position(|unit| unit.kind().is_stationary())?;
        Some(occupants.remove(position))
    }

    /// Pending build intents in submission order.
    #[must_use]
    pub fn build_stack(&self) -> &[BuildIntent] {
        &self.build_stack
    }

    /// Appends a build intent to the pending stack.
    pub fn queue_build(&mut self, intent: BuildIntent) {
        self.build_stack.push(intent);
    }

    /// Drains the build stack into the grid and returns the number applied.
    ///
    /// Rejected intents are dropped; the match engine would refuse them too.
    pub fn apply_build_stack(&mut self, table: &UnitTable) -> usize {
        let intents = std::mem::take(&mut self.build_stack);
        let mut applied = 0;
        for intent in intents {
            let result = match intent {
                BuildIntent::Place { kind, cell, owner } => {
                    self.place_unit(cell, Unit::new(kind, owner, table))
                }
                BuildIntent::Upgrade { cell } => self.upgrade_at(cell, table),
            };
            match result {
                Ok(()) => applied += 1,
                Err(error) => warn!("dropping build intent {intent:?}: {error}"),
            }
        }
        applied
    }

    /// Places predicted structures, skipping cells that are no longer free.
    pub fn apply_placements(&mut self, placements: &[Placement], table: &UnitTable) -> usize {
        let mut applied = 0;
        for placement in placements {
            match self.place_structure(placement, table) {
                Ok(()) => applied += 1,
                Err(error) => debug!("skipping predicted placement {placement:?}: {error}"),
            }
        }
        applied
    }

    /// Number of mobile units owned by `owner` on `cell`.
    #[must_use]
    pub fn stack_len(&self, cell: CellCoord, owner: Owner) -> usize {
        self.stack(cell, owner).count()
    }

    /// Mobile units owned by `owner` on `cell`, oldest first.
    pub fn stack(&self, cell: CellCoord, owner: Owner) -> impl Iterator<Item = &Unit> + '_ {
        self.units_at(cell)
            .iter()
            .filter(move |unit| unit.kind().is_mobile() && unit.owner() == owner)
    }

    /// Moves every mobile unit owned by `owner` from `from` to `to`, keeping order.
    pub fn move_stack(&mut self, from: CellCoord, to: CellCoord, owner: Owner) {
        let (Some(source), Some(destination)) = (self.slot(from), self.slot(to)) else {
            return;
        };
        if source == destination {
            return;
        }

        let mut moving = Vec::new();
        self.cells[source].retain(|unit| {
            let is_mover = unit.kind().is_mobile() && unit.owner() == owner;
            if is_mover {
                moving.push(*unit);
            }
            !is_mover
        });
        self.cells[destination].extend(moving);
    }

    /// Adds `amount` of shield to every unit in `owner`'s stack on `cell`.
    ///
    /// Returns the number of units shielded.
    pub fn shield_stack(&mut self, cell: CellCoord, owner: Owner, amount: f32) -> u32 {
        let Some(index) = self.slot(cell) else {
            return 0;
        };
        let mut shielded = 0;
        for unit in self.cells[index]
            .iter_mut()
            .filter(|unit| unit.kind().is_mobile() && unit.owner() == owner)
        {
            unit.add_shield(amount);
            shielded += 1;
        }
        shielded
    }

    /// Applies `damage` to `owner`'s stack on `cell`, newest unit first.
    ///
    /// Destroyed units are removed immediately and excess damage carries over
    /// to the next unit in the stack.
    pub fn damage_stack_rear_first(
        &mut self,
        cell: CellCoord,
        owner: Owner,
        damage: f32,
    ) -> StackDamage {
        let mut outcome = StackDamage::default();
        let Some(index) = self.slot(cell) else {
            return outcome;
        };

        let occupants = &mut self.cells[index];
        let mut remaining = damage.max(0.0);
        while remaining > 0.0 {
            let Some(position) = occupants
                .iter()
                .rposition(|unit| unit.kind().is_mobile() && unit.owner() == owner)
            else {
                break;
            };
            let unit = &mut occupants[position];
            let applied = unit.take_damage(remaining);
            remaining -= applied;
            outcome.absorbed += applied;
            if unit.is_destroyed() {
                let _ = occupants.remove(position);
                outcome.destroyed += 1;
            }
        }
        outcome
    }

    /// Applies `damage` to the structure on `cell`, removing it when destroyed.
    pub fn damage_structure(&mut self, cell: CellCoord, damage: f32) -> StructureHit {
        let Some(index) = self.slot(cell) else {
            return StructureHit::default();
        };
        let occupants = &mut self.cells[index];
        let Some(position) = occupants
            .iter()
            .position(|unit| unit.kind().is_stationary())
        else {
            return StructureHit::default();
        };

        let applied = occupants[position].take_damage(damage);
        let destroyed = occupants[position].is_destroyed();
        if destroyed {
            let _ = occupants.remove(position);
        }
        StructureHit { applied, destroyed }
    }

    fn slot(&self, cell: CellCoord) -> Option<usize> {
        if !self.arena.contains(cell) {
            return None;
        }
        self.arena.index(cell)
    }
}

/// Range queries that provide read-only access to the snapshot.
pub mod query {
    use siege_sim_core::{CellCoord, Owner};

    use super::{GridSnapshot, Unit};

    /// Opposing structures able to fire at a mobile unit of `mover` on `cell`.
    pub fn attackers(
        grid: &GridSnapshot,
        cell: CellCoord,
        mover: Owner,
    ) -> impl Iterator<Item = (CellCoord, &Unit)> + '_ {
        grid.structures().filter(move |(position, unit)| {
            unit.owner() != mover
                && unit.profile().damage_to_mobile > 0.0
                && position.within_range(cell, unit.profile().attack_range)
        })
    }

    /// Total per-shot damage aimed at a mobile unit of `mover` on `cell`.
    #[must_use]
    pub fn incoming_damage(grid: &GridSnapshot, cell: CellCoord, mover: Owner) -> f32 {
        attackers(grid, cell, mover)
            .map(|(_, unit)| unit.profile().damage_to_mobile)
            .sum()
    }

    /// Number of opposing attackers covering `cell`.
    #[must_use]
    pub fn threat_count(grid: &GridSnapshot, cell: CellCoord, mover: Owner) -> u32 {
        let count = attackers(grid, cell, mover).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Friendly supports whose shield range covers `cell`.
    pub fn shielders(
        grid: &GridSnapshot,
        cell: CellCoord,
        owner: Owner,
    ) -> impl Iterator<Item = (CellCoord, &Unit)> + '_ {
        grid.structures().filter(move |(position, unit)| {
            unit.owner() == owner
                && shield_amount(grid, *position, unit) > 0.0
                && position.within_range(cell, unit.profile().shield_range)
        })
    }

    /// Shield a support on `position` grants to each unit it covers.
    #[must_use]
    pub fn shield_amount(grid: &GridSnapshot, position: CellCoord, support: &Unit) -> f32 {
        let profile = support.profile();
        let row = grid.arena().row_from_owner(position, support.owner());
        profile.shield_per_unit + profile.shield_bonus_per_row * row as f32
    }

    /// Opposing structures within `range` of `cell`.
    pub fn targets_in_range(
        grid: &GridSnapshot,
        cell: CellCoord,
        mover: Owner,
        range: f32,
    ) -> impl Iterator<Item = (CellCoord, &Unit)> + '_ {
        grid.structures().filter(move |(position, unit)| {
            unit.owner() != mover && cell.within_range(*position, range)
        })
    }
}
