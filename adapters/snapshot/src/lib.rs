#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reader for the match engine's per-turn JSON state.
//!
//! Each player's unit block is a list of lists. The first six lists hold
//! units by kind index, list [`REMOVAL_LIST`] holds structures queued for
//! removal and list [`UPGRADE_LIST`] holds the cells of upgraded structures.
//! Player `1` in event records is the reading side, player `2` its opponent.

use std::collections::BTreeSet;

use log::debug;
use serde::{de::IgnoredAny, Deserialize};
use siege_sim_core::{
    ArenaConfig, BreachEvent, CellCoord, DeathEvent, Owner, PlayerStats, TurnEvents, UnitKind,
};
use siege_sim_world::{GridSnapshot, PlacementError, Unit};
use thiserror::Error;

/// Unit list holding structures their owner asked to remove.
pub const REMOVAL_LIST: usize = 6;
/// Unit list holding the cells of upgraded structures.
pub const UPGRADE_LIST: usize = 7;

const ACTION_FRAME_PHASE: i64 = 1;
const SELF_PLAYER: u8 = 1;
const OPPONENT_PLAYER: u8 = 2;

/// Failures while reading a turn document.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The document is not valid JSON or does not match the schema.
    #[error("malformed turn document: {0}")]
    Json(#[from] serde_json::Error),
    /// A unit list or event used a kind index the unit table does not know.
    #[error("unknown unit kind index {0}")]
    UnknownUnitKind(usize),
    /// An event named a player other than `1` or `2`.
    #[error("unknown player number {0}")]
    UnknownPlayer(u8),
    /// The turn number was absent from `turnInfo`.
    #[error("turn number missing from turnInfo")]
    MissingTurnNumber,
    /// A reported unit could not be placed on the grid.
    #[error("cannot place reported {kind:?} at {cell:?}: {source}")]
    Placement {
        /// Kind of the offending unit.
        kind: UnitKind,
        /// Cell the unit was reported on.
        cell: CellCoord,
        /// Underlying grid error.
        source: PlacementError,
    },
}

/// Grid, resources and events decoded from one turn document.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnSnapshot {
    /// Grid populated with every reported unit.
    pub grid: GridSnapshot,
    /// Breach and death events reported for the turn.
    pub events: TurnEvents,
    /// Structures their owner has queued for removal.
    pub pending_removals: Vec<(Owner, CellCoord)>,
}

/// A decoded document from the match log.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    /// Start-of-turn state.
    Turn(TurnSnapshot),
    /// Events reported by an action-phase frame.
    Frame(TurnEvents),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHeader {
    #[serde(default)]
    turn_info: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTurn {
    p1_units: Vec<Vec<RawUnit>>,
    p2_units: Vec<Vec<RawUnit>>,
    p1_stats: RawStats,
    p2_stats: RawStats,
    turn_info: Vec<i64>,
    #[serde(default)]
    events: RawEvents,
}

#[derive(Debug, Deserialize)]
struct RawUnit {
    x: u32,
    y: u32,
    health: f32,
    _id: IgnoredAny,
}

#[derive(Debug, Deserialize)]
struct RawStats {
    health: f32,
    structure_points: f32,
    mobile_points: f32,
    _time: IgnoredAny,
}

#[derive(Debug, Default, Deserialize)]
struct RawEvents {
    #[serde(default)]
    breach: Vec<RawBreach>,
    #[serde(default)]
    death: Vec<RawDeath>,
}

#[derive(Debug, Deserialize)]
struct RawBreach {
    cell: (u32, u32),
    damage: f32,
    kind: usize,
    _id: IgnoredAny,
    player: u8,
}

#[derive(Debug, Deserialize)]
struct RawDeath {
    cell: (u32, u32),
    kind: usize,
    _id: IgnoredAny,
    player: u8,
    removed_by_owner: bool,
}

/// Decodes either kind of match-log document.
///
/// `turnInfo[0]` selects the kind: phase `1` is an action frame, anything
/// else is read as a turn document.
pub fn parse_document(json: &str, config: &ArenaConfig) -> Result<Document, SnapshotError> {
    let header: RawHeader = serde_json::from_str(json)?;
    if header.turn_info.first() == Some(&ACTION_FRAME_PHASE) {
        parse_events(json).map(Document::Frame)
    } else {
        parse_turn(json, config).map(Document::Turn)
    }
}

/// Decodes a full turn document into a populated snapshot.
pub fn parse_turn(json: &str, config: &ArenaConfig) -> Result<TurnSnapshot, SnapshotError> {
    let raw: RawTurn = serde_json::from_str(json)?;

    let mut grid = GridSnapshot::for_config(config);
    let turn = raw
        .turn_info
        .get(1)
        .and_then(|turn| u32::try_from(*turn).ok())
        .ok_or(SnapshotError::MissingTurnNumber)?;
    grid.set_turn(turn);
    grid.set_player(Owner::Ally, stats(&raw.p1_stats));
    grid.set_player(Owner::Opponent, stats(&raw.p2_stats));

    let mut pending_removals = Vec::new();
    for (owner, lists) in [(Owner::Ally, &raw.p1_units), (Owner::Opponent, &raw.p2_units)] {
        populate(&mut grid, config, owner, lists)?;
        if let Some(removals) = lists.get(REMOVAL_LIST) {
            let queued = removals.iter().map(|unit| (owner, cell(unit)));
            pending_removals.extend(queued);
        }
    }

    let events = convert_events(&raw.events)?;
    debug!(
        "turn {turn}: {} structures, {} breaches, {} deaths",
        grid.structures().count(),
        events.breaches.len(),
        events.deaths.len()
    );

    Ok(TurnSnapshot {
        grid,
        events,
        pending_removals,
    })
}

/// Decodes only the event block of an action-frame document.
pub fn parse_events(json: &str) -> Result<TurnEvents, SnapshotError> {
    #[derive(Deserialize)]
    struct Frame {
        #[serde(default)]
        events: RawEvents,
    }

    let frame: Frame = serde_json::from_str(json)?;
    convert_events(&frame.events)
}

fn populate(
    grid: &mut GridSnapshot,
    config: &ArenaConfig,
    owner: Owner,
    lists: &[Vec<RawUnit>],
) -> Result<(), SnapshotError> {
    let upgraded: BTreeSet<CellCoord> = lists
        .get(UPGRADE_LIST)
        .map(|units| units.iter().map(cell).collect())
        .unwrap_or_default();

    let mut ordered: Vec<(UnitKind, &RawUnit)> = Vec::new();
    for (index, units) in lists.iter().enumerate() {
        if index == REMOVAL_LIST || index == UPGRADE_LIST {
            continue;
        }
        let kind = kind_of(index)?;
        ordered.extend(units.iter().map(|unit| (kind, unit)));
    }
    ordered.sort_by_key(|(kind, _)| kind.is_mobile());

    for (kind, raw) in ordered {
        let position = cell(raw);
        let unit = if kind.is_stationary() && upgraded.contains(&position) {
            Unit::new_upgraded(kind, owner, config.units())
        } else {
            Unit::new(kind, owner, config.units())
        };
        grid.place_unit(position, unit.with_health(raw.health))
            .map_err(|source| SnapshotError::Placement {
                kind,
                cell: position,
                source,
            })?;
    }
    Ok(())
}

fn convert_events(raw: &RawEvents) -> Result<TurnEvents, SnapshotError> {
    let breaches = raw
        .breach
        .iter()
        .map(|breach| {
            Ok(BreachEvent {
                cell: CellCoord::new(breach.cell.0, breach.cell.1),
                damage: breach.damage,
                kind: kind_of(breach.kind)?,
                owner: owner_of(breach.player)?,
            })
        })
        .collect::<Result<Vec<_>, SnapshotError>>()?;

    let deaths = raw
        .death
        .iter()
        .map(|death| {
            Ok(DeathEvent {
                cell: CellCoord::new(death.cell.0, death.cell.1),
                kind: kind_of(death.kind)?,
                owner: owner_of(death.player)?,
                intentional_removal: death.removed_by_owner,
            })
        })
        .collect::<Result<Vec<_>, SnapshotError>>()?;

    Ok(TurnEvents { breaches, deaths })
}

fn kind_of(index: usize) -> Result<UnitKind, SnapshotError> {
    UnitKind::from_index(index).ok_or(SnapshotError::UnknownUnitKind(index))
}

fn owner_of(player: u8) -> Result<Owner, SnapshotError> {
    match player {
        SELF_PLAYER => Ok(Owner::Ally),
        OPPONENT_PLAYER => Ok(Owner::Opponent),
        other => Err(SnapshotError::UnknownPlayer(other)),
    }
}

fn cell(unit: &RawUnit) -> CellCoord {
    CellCoord::new(unit.x, unit.y)
}

fn stats(raw: &RawStats) -> PlayerStats {
    PlayerStats::new(raw.health, raw.structure_points, raw.mobile_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_numbers_map_to_owners() {
        assert_eq!(owner_of(1).expect("self"), Owner::Ally);
        assert_eq!(owner_of(2).expect("opponent"), Owner::Opponent);
        assert!(matches!(owner_of(0), Err(SnapshotError::UnknownPlayer(0))));
    }

    #[test]
    fn list_indices_beyond_the_unit_kinds_are_reserved() {
        assert_eq!(UnitKind::from_index(REMOVAL_LIST), None);
        assert_eq!(UnitKind::from_index(UPGRADE_LIST), None);
        assert!(matches!(kind_of(9), Err(SnapshotError::UnknownUnitKind(9))));
    }

    #[test]
    fn action_frames_without_events_are_empty() {
        let frame = r#"{"turnInfo": [1, 4, 12, 0]}"#;
        let events = parse_events(frame).expect("frame parses");
        assert_eq!(events, TurnEvents::default());
    }
}
