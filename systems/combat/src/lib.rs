#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-cell combat resolution for a moving stack.
//!
//! A resolution runs in a fixed order: friendly supports shield the stack,
//! opposing structures in range pick their shots, the stack fires at the
//! opposing structure nearest by straight-line distance and finally the
//! incoming shots land on the stack from the rear. Supports are credited at
//! most once per trajectory, so a resolver instance must live exactly as
//! long as one trajectory.

use std::collections::BTreeSet;

use log::trace;
use siege_sim_core::{CellCoord, Owner};
use siege_sim_world::{query, GridSnapshot};

/// What happened during one resolution step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombatOutcome {
    /// Damage the stack applied to opposing structures this step.
    pub damage_to_target: f32,
    /// Incoming damage minus shielding; negative when shields exceed damage.
    pub net_damage: f32,
    /// Sum of the per-shot damage of every opposing structure in range.
    pub incoming: f32,
    /// Health actually removed from the stack by incoming fire.
    pub absorbed: f32,
    /// Total shield health granted to the stack this step.
    pub shield_credit: f32,
    /// Units removed from the stack.
    pub units_lost: u32,
    /// Structures destroyed by the stack, in the order they fell.
    pub structures_destroyed: Vec<CellCoord>,
}

impl CombatOutcome {
    /// Net damage clipped at zero.
    #[must_use]
    pub fn suffered(&self) -> f32 {
        self.net_damage.max(0.0)
    }
}

/// Resolves combat for one stack along one trajectory.
#[derive(Debug, Default)]
pub struct CombatResolver {
    credited: BTreeSet<CellCoord>,
    targets: Vec<Target>,
}

#[derive(Clone, Copy, Debug)]
struct Target {
    cell: CellCoord,
    distance_squared: u64,
    health: f32,
}

impl CombatResolver {
    /// Creates a resolver with no supports credited.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether the support standing on `cell` already shielded this trajectory.
    #[must_use]
    pub fn is_credited(&self, cell: CellCoord) -> bool {
        self.credited.contains(&cell)
    }

    /// Supports credited so far, in coordinate order.
    pub fn credited_supports(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.credited.iter().copied()
    }

    /// Resolves one combat step for `mover`'s stack standing on `cell`.
    ///
    /// An empty stack yields the default outcome and leaves the grid untouched.
    pub fn resolve(
        &mut self,
        grid: &mut GridSnapshot,
        cell: CellCoord,
        mover: Owner,
    ) -> CombatOutcome {
        let mut outcome = CombatOutcome::default();
        if grid.stack_len(cell, mover) == 0 {
            return outcome;
        }

        outcome.shield_credit = self.apply_shields(grid, cell, mover);
        outcome.incoming = query::incoming_damage(grid, cell, mover);
        outcome.net_damage = outcome.incoming - outcome.shield_credit;

        self.fire(grid, cell, mover, &mut outcome);

        let hit = grid.damage_stack_rear_first(cell, mover, outcome.incoming);
        outcome.absorbed = hit.absorbed;
        outcome.units_lost = hit.destroyed;

        trace!(
            "combat at {cell:?}: incoming {:.1}, shields {:.1}, dealt {:.1}, lost {}",
            outcome.incoming, outcome.shield_credit, outcome.damage_to_target, outcome.units_lost
        );
        outcome
    }

    fn apply_shields(&mut self, grid: &mut GridSnapshot, cell: CellCoord, mover: Owner) -> f32 {
        let fresh: Vec<(CellCoord, f32)> = query::shielders(grid, cell, mover)
            .filter(|(position, _)| !self.credited.contains(position))
            .map(|(position, support)| {
                let amount = query::shield_amount(grid, position, support);
                (position, amount)
            })
            .collect();

        let mut credit = 0.0;
        for (position, amount) in fresh {
            let shielded = grid.shield_stack(cell, mover, amount);
            credit += amount * shielded as f32;
            let _ = self.credited.insert(position);
        }
        credit
    }

    /// Spends the stack's structure damage on opposing structures in range.
    ///
    /// Targets are ordered by Euclidean distance from `cell`, not by path
    /// cost, then by lowest health, lowest y and lowest x. Damage left over
    /// after a structure falls carries on to the next target.
    fn fire(
        &mut self,
        grid: &mut GridSnapshot,
        cell: CellCoord,
        mover: Owner,
        outcome: &mut CombatOutcome,
    ) {
        let Some(lead) = grid.stack(cell, mover).next().copied() else {
            return;
        };
        let per_unit = lead.profile().damage_to_structures;
        if per_unit <= 0.0 {
            return;
        }
        let mut remaining = per_unit * grid.stack_len(cell, mover) as f32;
        let range = lead.profile().attack_range;

        self.targets.clear();
        for (position, unit) in query::targets_in_range(grid, cell, mover, range) {
            self.targets.push(Target {
                cell: position,
                distance_squared: cell.distance_squared(position),
                health: unit.health(),
            });
        }
        self.targets.sort_by(|a, b| {
            a.distance_squared
                .cmp(&b.distance_squared)
                .then(a.health.total_cmp(&b.health))
                .then(a.cell.y().cmp(&b.cell.y()))
                .then(a.cell.x().cmp(&b.cell.x()))
        });

        for target in &self.targets {
            if remaining <= 0.0 {
                break;
            }
            let hit = grid.damage_structure(target.cell, remaining);
            remaining -= hit.applied;
            outcome.damage_to_target += hit.applied;
            if !hit.destroyed {
                break;
            }
            outcome.structures_destroyed.push(target.cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_sim_core::{ArenaConfig, Placement, UnitKind};

    fn setup() -> (GridSnapshot, ArenaConfig) {
        let config = ArenaConfig::standard();
        (GridSnapshot::for_config(&config), config)
    }

    fn structure(kind: UnitKind, owner: Owner, x: u32, y: u32) -> Placement {
        Placement {
            kind,
            cell: CellCoord::new(x, y),
            owner,
            upgraded: false,
        }
    }

    fn opposing(kind: UnitKind, x: u32, y: u32) -> Placement {
        structure(kind, Owner::Opponent, x, y)
    }

    fn allied(kind: UnitKind, x: u32, y: u32) -> Placement {
        structure(kind, Owner::Ally, x, y)
    }

    fn place(grid: &mut GridSnapshot, config: &ArenaConfig, placement: Placement) {
        grid.place_structure(&placement, config.units())
            .expect("placement succeeds");
    }

    fn health_at(grid: &GridSnapshot, x: u32, y: u32) -> Option<f32> {
        grid.stationary_at(CellCoord::new(x, y))
            .map(|unit| unit.health())
    }

    #[test]
    fn empty_stack_is_a_no_op() {
        let (mut grid, config) = setup();
        let turret = opposing(UnitKind::Turret, 13, 11);
        place(&mut grid, &config, turret);
        let before = grid.clone();

        let cell = CellCoord::new(13, 10);
        let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

        assert_eq!(outcome, CombatOutcome::default());
        assert_eq!(grid, before);
    }

    #[test]
    fn lone_turret_hits_the_rear_scout() {
        let (mut grid, config) = setup();
        let cell = CellCoord::new(13, 10);
        let turret = opposing(UnitKind::Turret, 13, 11);
        place(&mut grid, &config, turret);
        grid.spawn_stack(cell, UnitKind::Interceptor, Owner::Ally, 2, config.units())
            .expect("spawn");

        let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

        assert_eq!(outcome.incoming, 5.0);
        assert_eq!(outcome.net_damage, 5.0);
        assert_eq!(outcome.damage_to_target, 0.0, "interceptors miss walls");
        let healths: Vec<f32> = grid
            .stack(cell, Owner::Ally)
            .map(|unit| unit.health())
            .collect();
        assert_eq!(healths, vec![40.0, 35.0]);
    }

    #[test]
    fn shields_offset_net_damage_and_may_go_negative() {
        let (mut grid, config) = setup();
        let cell = CellCoord::new(13, 5);
        let support = allied(UnitKind::Support, 13, 6);
        place(&mut grid, &config, support);
        grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 2, config.units())
            .expect("spawn");

        let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

        assert_eq!(outcome.shield_credit, 6.0);
        assert_eq!(outcome.net_damage, -6.0);
        assert_eq!(outcome.suffered(), 0.0);
        let mut stack = grid.stack(cell, Owner::Ally);
        assert!(stack.all(|unit| unit.health() == 18.0));
    }

    #[test]
    fn stack_fire_prefers_nearest_then_weakest() {
        let (mut grid, config) = setup();
        let cell = CellCoord::new(13, 10);
        place(&mut grid, &config, opposing(UnitKind::Wall, 12, 12));
        place(&mut grid, &config, opposing(UnitKind::Wall, 14, 12));
        let _ = grid.damage_structure(CellCoord::new(14, 12), 10.0);
        place(&mut grid, &config, opposing(UnitKind::Wall, 13, 13));
        grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 3, config.units())
            .expect("spawn");

        let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

        assert_eq!(outcome.damage_to_target, 6.0);
        assert_eq!(health_at(&grid, 14, 12), Some(44.0));
        assert_eq!(health_at(&grid, 12, 12), Some(60.0));
    }

    #[test]
    fn nearest_is_measured_in_a_straight_line() {
        let (mut grid, config) = setup();
        let cell = CellCoord::new(13, 10);
        place(&mut grid, &config, opposing(UnitKind::Wall, 14, 12));
        place(&mut grid, &config, opposing(UnitKind::Wall, 13, 13));
        grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 1, config.units())
            .expect("spawn");

        let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

        assert_eq!(outcome.damage_to_target, 2.0);
        assert_eq!(health_at(&grid, 14, 12), Some(58.0), "sqrt(5) beats 3");
        assert_eq!(health_at(&grid, 13, 13), Some(60.0));
    }

    #[test]
    fn own_structures_are_never_targeted() {
        let (mut grid, config) = setup();
        let cell = CellCoord::new(13, 5);
        place(&mut grid, &config, allied(UnitKind::Wall, 13, 6));
        grid.spawn_stack(cell, UnitKind::Demolisher, Owner::Ally, 1, config.units())
            .expect("spawn");

        let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

        assert_eq!(outcome.damage_to_target, 0.0);
        assert_eq!(health_at(&grid, 13, 6), Some(60.0));
    }

    #[test]
    fn supports_shield_once_per_resolver() {
        let (mut grid, config) = setup();
        let cell = CellCoord::new(13, 5);
        let support = allied(UnitKind::Support, 13, 6);
        place(&mut grid, &config, support);
        grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 1, config.units())
            .expect("spawn");
        let mut resolver = CombatResolver::new();

        let first = resolver.resolve(&mut grid, cell, Owner::Ally);
        let second = resolver.resolve(&mut grid, cell, Owner::Ally);
        assert_eq!(first.shield_credit, 3.0);
        assert_eq!(second.shield_credit, 0.0);
        assert!(resolver.is_credited(support.cell));
        let credited: Vec<CellCoord> = resolver.credited_supports().collect();
        assert_eq!(credited, vec![support.cell]);

        let mut fresh = CombatResolver::new();
        let again = fresh.resolve(&mut grid, cell, Owner::Ally);
        assert_eq!(again.shield_credit, 3.0, "a new trajectory is shielded again");
    }
}
