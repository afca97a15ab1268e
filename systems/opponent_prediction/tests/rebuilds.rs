use siege_sim_core::{ArenaConfig, CellCoord, DeathEvent, Owner, Placement, TurnEvents, UnitKind};
use siege_sim_system_opponent_prediction::OpponentPredictor;
use siege_sim_world::GridSnapshot;

fn structure(kind: UnitKind, x: u32, y: u32, upgraded: bool) -> Placement {
    Placement {
        kind,
        cell: CellCoord::new(x, y),
        owner: Owner::Opponent,
        upgraded,
    }
}

fn lost(kind: UnitKind, x: u32, y: u32) -> DeathEvent {
    DeathEvent {
        cell: CellCoord::new(x, y),
        kind,
        owner: Owner::Opponent,
        intentional_removal: false,
    }
}

fn grid_with(config: &ArenaConfig, placements: &[Placement]) -> GridSnapshot {
    let mut grid = GridSnapshot::for_config(config);
    let applied = grid.apply_placements(placements, config.units());
    assert_eq!(applied, placements.len());
    grid
}

#[test]
fn membership_never_shrinks_across_turns() {
    let config = ArenaConfig::standard();
    let mut predictor = OpponentPredictor::new();
    let turns = [
        vec![
            structure(UnitKind::Wall, 4, 14, false),
            structure(UnitKind::Turret, 3, 14, false),
        ],
        vec![structure(UnitKind::Turret, 3, 14, true)],
        Vec::new(),
        vec![structure(UnitKind::Support, 13, 20, false)],
    ];

    let mut seen = Vec::new();
    for placements in &turns {
        let grid = grid_with(&config, placements);
        let _ = predictor.observe_structures(&grid);
        for placement in placements {
            seen.push((placement.kind, placement.cell));
        }
        for (kind, cell) in &seen {
            let known = predictor.is_recorded(*kind, *cell);
            assert!(known, "{kind:?} at {cell:?} was forgotten");
        }
    }

    assert_eq!(predictor.records().len(), 3);
    let turret = predictor
        .records()
        .iter()
        .find(|record| record.kind == UnitKind::Turret)
        .expect("turret recorded");
    assert!(turret.upgraded, "upgrade flag is sticky");
}

#[test]
fn destroyed_structures_are_predicted_in_first_seen_order_within_budget() {
    let config = ArenaConfig::standard();
    let mut predictor = OpponentPredictor::new();
    let fielded = [
        structure(UnitKind::Turret, 3, 14, true),
        structure(UnitKind::Wall, 4, 14, false),
        structure(UnitKind::Turret, 24, 14, false),
    ];
    let _ = predictor.observe_structures(&grid_with(&config, &fielded));

    predictor.observe_events(&TurnEvents {
        breaches: Vec::new(),
        deaths: vec![
            lost(UnitKind::Turret, 24, 14),
            lost(UnitKind::Wall, 4, 14),
            lost(UnitKind::Turret, 3, 14),
        ],
    });
    let predictions = predictor.predict(10.0, config.units());

    assert_eq!(
        predictions,
        vec![
            structure(UnitKind::Turret, 3, 14, true),
            structure(UnitKind::Wall, 4, 14, false),
        ],
        "upgraded turret (8) and wall (2) exhaust the budget"
    );
    assert!(predictor.destroyed().is_empty());
}

#[test]
fn unknown_destroyed_cells_are_not_predicted() {
    let config = ArenaConfig::standard();
    let mut predictor = OpponentPredictor::new();
    let wall = structure(UnitKind::Wall, 4, 14, false);
    let _ = predictor.observe_structures(&grid_with(&config, &[wall]));
    predictor.observe_events(&TurnEvents {
        breaches: Vec::new(),
        deaths: vec![lost(UnitKind::Turret, 4, 14), lost(UnitKind::Wall, 9, 14)],
    });

    assert!(predictor.predict(30.0, config.units()).is_empty());
}

#[test]
fn predictions_feed_a_cloned_snapshot_only() {
    let config = ArenaConfig::standard();
    let mut predictor = OpponentPredictor::new();
    let wall = structure(UnitKind::Wall, 4, 14, false);
    let _ = predictor.observe_structures(&grid_with(&config, &[wall]));
    predictor.observe_events(&TurnEvents {
        breaches: Vec::new(),
        deaths: vec![lost(UnitKind::Wall, 4, 14)],
    });

    let real = GridSnapshot::for_config(&config);
    let predictions = predictor.predict(5.0, config.units());
    let mut forecast = real.clone();
    assert_eq!(forecast.apply_placements(&predictions, config.units()), 1);

    assert!(forecast.contains_stationary(wall.cell));
    assert!(real.is_passable(wall.cell));
}

#[test]
fn each_turn_only_predicts_its_own_losses() {
    let config = ArenaConfig::standard();
    let mut predictor = OpponentPredictor::new();
    let first = structure(UnitKind::Turret, 13, 14, false);
    let second = structure(UnitKind::Turret, 14, 14, false);
    let fielded = grid_with(&config, &[first, second]);
    let _ = predictor.observe_structures(&fielded);

    predictor.observe_events(&TurnEvents {
        breaches: Vec::new(),
        deaths: vec![lost(UnitKind::Turret, 13, 14)],
    });
    assert_eq!(predictor.predict(20.0, config.units()), vec![first]);

    let _ = predictor.observe_structures(&grid_with(&config, &[first]));
    predictor.observe_events(&TurnEvents {
        breaches: Vec::new(),
        deaths: vec![lost(UnitKind::Turret, 14, 14)],
    });
    assert_eq!(
        predictor.predict(3.0, config.units()),
        vec![second],
        "the previous turn's loss was already rebuilt"
    );
}
