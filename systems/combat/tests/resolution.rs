use siege_sim_core::{ArenaConfig, CellCoord, Owner, Placement, UnitKind};
use siege_sim_system_combat::CombatResolver;
use siege_sim_world::GridSnapshot;

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

fn ally_healths(grid: &GridSnapshot, cell: CellCoord) -> Vec<f32> {
    grid.stack(cell, Owner::Ally)
        .map(|unit| unit.health())
        .collect()
}

fn stack_health(grid: &GridSnapshot, cell: CellCoord) -> f32 {
    ally_healths(grid, cell).iter().sum()
}

#[test]
fn health_removed_equals_incoming_minus_shields() {
    let (mut grid, config) = setup();
    let cell = CellCoord::new(13, 8);
    place(&mut grid, &config, allied(UnitKind::Support, 13, 6));
    place(&mut grid, &config, opposing(UnitKind::Turret, 13, 11));
    place(&mut grid, &config, opposing(UnitKind::Turret, 14, 10));
    grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 3, config.units())
        .expect("spawn");
    let before = stack_health(&grid, cell);

    let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

    assert_eq!(outcome.incoming, 10.0);
    assert_eq!(outcome.shield_credit, 9.0);
    assert_eq!(outcome.net_damage, 1.0);
    assert_eq!(before - stack_health(&grid, cell), outcome.net_damage);
    assert_eq!(outcome.units_lost, 0);
}

#[test]
fn surplus_shields_clip_to_zero_suffered() {
    let (mut grid, config) = setup();
    let cell = CellCoord::new(13, 8);
    place(&mut grid, &config, allied(UnitKind::Support, 13, 6));
    place(&mut grid, &config, opposing(UnitKind::Turret, 13, 11));
    grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 3, config.units())
        .expect("spawn");
    let before = stack_health(&grid, cell);

    let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

    assert_eq!(outcome.net_damage, -4.0);
    assert_eq!(outcome.suffered(), 0.0);
    assert_eq!(stack_health(&grid, cell) - before, 4.0);
}

#[test]
fn each_support_is_credited_once_per_trajectory() {
    let (mut grid, config) = setup();
    place(&mut grid, &config, allied(UnitKind::Support, 12, 7));
    let first = CellCoord::new(13, 5);
    let second = CellCoord::new(13, 6);
    grid.spawn_stack(first, UnitKind::Scout, Owner::Ally, 2, config.units())
        .expect("spawn");
    let mut resolver = CombatResolver::new();

    let opening = resolver.resolve(&mut grid, first, Owner::Ally);
    grid.move_stack(first, second, Owner::Ally);
    let follow_up = resolver.resolve(&mut grid, second, Owner::Ally);

    assert_eq!(opening.shield_credit, 6.0);
    assert_eq!(follow_up.shield_credit, 0.0, "support already credited");
    assert_eq!(ally_healths(&grid, second), vec![18.0, 18.0]);
}

#[test]
fn fire_carries_over_to_the_next_target() {
    let (mut grid, config) = setup();
    let cell = CellCoord::new(13, 10);
    place(&mut grid, &config, opposing(UnitKind::Wall, 13, 11));
    place(&mut grid, &config, opposing(UnitKind::Wall, 13, 12));
    let _ = grid.damage_structure(CellCoord::new(13, 11), 58.0);
    grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 5, config.units())
        .expect("spawn");

    let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

    assert_eq!(outcome.damage_to_target, 10.0, "no fire is wasted");
    assert_eq!(outcome.structures_destroyed, vec![CellCoord::new(13, 11)]);
    assert!(grid.is_passable(CellCoord::new(13, 11)));
    let survivor = grid.stationary_at(CellCoord::new(13, 12));
    assert_eq!(survivor.map(|unit| unit.health()), Some(52.0));
}

#[test]
fn heavy_fire_drains_the_stack_from_the_rear() {
    let (mut grid, config) = setup();
    let cell = CellCoord::new(13, 10);
    let upgraded = Placement {
        upgraded: true,
        ..opposing(UnitKind::Turret, 13, 12)
    };
    place(&mut grid, &config, upgraded);
    place(&mut grid, &config, opposing(UnitKind::Turret, 12, 11));
    grid.spawn_stack(cell, UnitKind::Scout, Owner::Ally, 2, config.units())
        .expect("spawn");

    let outcome = CombatResolver::new().resolve(&mut grid, cell, Owner::Ally);

    assert_eq!(outcome.incoming, 20.0);
    assert_eq!(outcome.units_lost, 1);
    assert_eq!(ally_healths(&grid, cell), vec![10.0]);
}
