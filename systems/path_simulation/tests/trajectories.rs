use siege_sim_core::{
    ArenaConfig, CellCoord, Deployment, Owner, PathingPolicy, Placement, TrajectoryEnd, UnitKind,
};
use siege_sim_system_path_simulation::{PathSimulator, SimulationOptions};
use siege_sim_world::GridSnapshot;

const SPAWN: CellCoord = CellCoord::new(13, 0);

fn plain_config() -> ArenaConfig {
    ArenaConfig::standard().with_pathing(PathingPolicy { threat_penalty: 0 })
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

fn scouts(count: u32) -> Deployment {
    Deployment::new(UnitKind::Scout, count, Owner::Ally)
}

#[test]
fn open_arena_lets_every_unit_through() {
    let config = ArenaConfig::standard();
    let grid = GridSnapshot::for_config(&config);

    for count in [1, 4, 9] {
        let result = PathSimulator::new(&config)
            .simulate(&grid, &[], SPAWN, scouts(count))
            .expect("simulation runs")
            .expect("open arena is reachable");

        assert_eq!(result.end, TrajectoryEnd::EdgeReached);
        assert_eq!(result.survivors, count);
        assert_eq!(result.damage_dealt, 0.0);
        assert_eq!(result.damage_suffered, 0.0);
        assert_eq!(
            result.path.len(),
            29,
            "28 moves from the bottom tip to the top-right edge"
        );
    }
}

#[test]
fn turret_beside_the_lane_costs_scouts() {
    let config = plain_config();
    let mut grid = GridSnapshot::for_config(&config);
    let turret = CellCoord::new(13, 11);
    place(&mut grid, &config, opposing(UnitKind::Turret, 13, 11));
    for y in 1..=14 {
        if y != 11 {
            place(&mut grid, &config, allied(UnitKind::Wall, 13, y));
        }
        place(&mut grid, &config, allied(UnitKind::Wall, 15, y));
    }
    let before = grid.clone();

    let result = PathSimulator::new(&config)
        .simulate(&grid, &[], SPAWN, scouts(3))
        .expect("simulation runs")
        .expect("lane is open");

    let turret_profile = config.units().profile(UnitKind::Turret, false);
    let scout_health = config.units().profile(UnitKind::Scout, false).health;
    let reach = turret_profile.attack_range;
    let exposed = result
        .path
        .iter()
        .filter(|cell| turret.within_range(**cell, reach))
        .count();
    let expected_suffered = exposed as f32 * turret_profile.damage_to_mobile;
    let expected_lost = (expected_suffered / scout_health).floor() as u32;

    assert_eq!(exposed, 5, "lane passes the turret for five steps");
    assert_eq!(result.end, TrajectoryEnd::EdgeReached);
    assert_eq!(result.damage_suffered, expected_suffered);
    assert!(result.damage_suffered >= 15.0);
    assert_eq!(result.survivors, 3 - expected_lost);
    assert!(result.survivors < 3);
    assert!(result.damage_dealt > 0.0, "scouts fire back");
    assert_eq!(grid, before, "caller snapshot is never touched");
}

#[test]
fn overwhelming_fire_drains_the_stack() {
    let config = plain_config();
    let mut grid = GridSnapshot::for_config(&config);
    for (x, y) in [(12, 3), (15, 3), (12, 5), (16, 5)] {
        let turret = Placement {
            upgraded: true,
            ..opposing(UnitKind::Turret, x, y)
        };
        place(&mut grid, &config, turret);
    }

    let result = PathSimulator::new(&config)
        .simulate(&grid, &[], SPAWN, scouts(2))
        .expect("simulation runs")
        .expect("route exists");

    assert_eq!(result.end, TrajectoryEnd::Drained);
    assert_eq!(result.survivors, 0);
    assert!(result.path.len() < 29);
}

#[test]
fn predicted_placements_can_block_a_spawn() {
    let config = ArenaConfig::standard();
    let grid = GridSnapshot::for_config(&config);
    let spawn = CellCoord::new(14, 0);
    let predicted = [opposing(UnitKind::Wall, 14, 0)];

    let blocked = PathSimulator::new(&config)
        .simulate(&grid, &predicted, spawn, scouts(1))
        .expect("simulation runs");

    assert_eq!(blocked, None);
    assert!(grid.is_passable(spawn));
}

#[test]
fn rebuilding_the_field_uses_freshly_destroyed_cells() {
    let config = plain_config();
    let mut grid = GridSnapshot::for_config(&config);
    for x in [11, 13, 14, 15, 16] {
        place(&mut grid, &config, opposing(UnitKind::Wall, x, 2));
    }
    let _ = grid.damage_structure(CellCoord::new(13, 2), 59.0);
    let deployment = Deployment::new(UnitKind::Demolisher, 1, Owner::Ally);
    let options = SimulationOptions {
        recompute_on_destruction: true,
        ..SimulationOptions::default()
    };

    let stale = PathSimulator::new(&config)
        .simulate(&grid, &[], SPAWN, deployment)
        .expect("simulation runs")
        .expect("gap at x = 12 is reachable");
    let fresh = PathSimulator::with_options(&config, options)
        .simulate(&grid, &[], SPAWN, deployment)
        .expect("simulation runs")
        .expect("gap at x = 12 is reachable");

    assert_eq!(stale.end, TrajectoryEnd::EdgeReached);
    assert_eq!(fresh.end, TrajectoryEnd::EdgeReached);
    assert_eq!(stale.path.len(), 31, "detour through the gap");
    assert_eq!(fresh.path.len(), 29, "straight through the destroyed wall");
    assert_eq!(fresh.path[2], CellCoord::new(13, 2));
}
