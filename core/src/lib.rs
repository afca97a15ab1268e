#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the siege simulator.
//!
//! This crate defines the vocabulary that connects the grid snapshot, the
//! pure simulation systems, and the adapters that talk to the match host.
//! Adapters decode turn snapshots into these types, systems consume them by
//! reference, and the decision layer receives [`TrajectoryResult`] values
//! describing the forecast outcome of a candidate attack.

pub mod config;

use serde::{Deserialize, Serialize};

pub use config::{
    ArenaConfig, ArenaDimensions, ArenaSettings, ConfigError, Cost, PathingPolicy, UnitProfile,
    UnitRule, UnitRules, UnitTable, UnitUpgrade,
};

/// Extra reach added to every range check to mirror the match engine's rounding.
pub const RANGE_TOLERANCE: f32 = 0.51;

/// Location of a single arena cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new arena cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Squared Euclidean distance between two cells.
    #[must_use]
    pub fn distance_squared(self, other: CellCoord) -> u64 {
        let dx = u64::from(self.x.abs_diff(other.x));
        let dy = u64::from(self.y.abs_diff(other.y));
        dx * dx + dy * dy
    }

    /// Euclidean distance between two cells.
    #[must_use]
    pub fn distance(self, other: CellCoord) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }

    /// Reports whether `other` lies within `range` of this cell.
    ///
    /// The comparison adds [`RANGE_TOLERANCE`] so that a range of `2.5`
    /// covers exactly the cells the match engine considers reachable.
    #[must_use]
    pub fn within_range(self, other: CellCoord, range: f32) -> bool {
        if range <= 0.0 {
            return false;
        }
        self.distance(other) < range + RANGE_TOLERANCE
    }
}

/// Side of the match that owns a unit or resource pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Owner {
    /// The player the simulator is advising.
    Ally,
    /// The opposing player.
    Opponent,
}

impl Owner {
    /// Both owners in canonical order.
    pub const ALL: [Owner; 2] = [Owner::Ally, Owner::Opponent];

    /// Returns the other side of the match.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Ally => Self::Opponent,
            Self::Opponent => Self::Ally,
        }
    }

    /// Dense index used for per-owner tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Ally => 0,
            Self::Opponent => 1,
        }
    }
}

/// Every unit variant known to the match engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Cheap blocking structure.
    Wall,
    /// Structure that shields friendly mobile units passing through its range.
    Support,
    /// Structure that fires at opposing mobile units.
    Turret,
    /// Fast, fragile mobile unit.
    Scout,
    /// Slow mobile unit with long range and heavy structure damage.
    Demolisher,
    /// Mobile unit that only engages other mobile units.
    Interceptor,
}

impl UnitKind {
    /// All unit kinds ordered by their schema index.
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Wall,
        UnitKind::Support,
        UnitKind::Turret,
        UnitKind::Scout,
        UnitKind::Demolisher,
        UnitKind::Interceptor,
    ];

    /// Structure kinds ordered by their schema index.
    pub const STRUCTURES: [UnitKind; 3] = [UnitKind::Wall, UnitKind::Support, UnitKind::Turret];

    /// Index of the kind within the match engine's unit tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Wall => 0,
            Self::Support => 1,
            Self::Turret => 2,
            Self::Scout => 3,
            Self::Demolisher => 4,
            Self::Interceptor => 5,
        }
    }

    /// Resolves a schema index back into a unit kind.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Wall),
            1 => Some(Self::Support),
            2 => Some(Self::Turret),
            3 => Some(Self::Scout),
            4 => Some(Self::Demolisher),
            5 => Some(Self::Interceptor),
            _ => None,
        }
    }

    /// Reports whether the kind occupies a fixed cell.
    #[must_use]
    pub const fn is_stationary(self) -> bool {
        matches!(self, Self::Wall | Self::Support | Self::Turret)
    }

    /// Reports whether the kind advances along a path.
    #[must_use]
    pub const fn is_mobile(self) -> bool {
        !self.is_stationary()
    }

    /// Lower-case name used by configuration files and the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wall => "wall",
            Self::Support => "support",
            Self::Turret => "turret",
            Self::Scout => "scout",
            Self::Demolisher => "demolisher",
            Self::Interceptor => "interceptor",
        }
    }
}

/// One of the four boundary cell sets of the diamond arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edge {
    /// Upper-right boundary, an opponent entry edge.
    TopRight,
    /// Upper-left boundary, an opponent entry edge.
    TopLeft,
    /// Lower-left boundary, an ally entry edge.
    BottomLeft,
    /// Lower-right boundary, an ally entry edge.
    BottomRight,
}

impl Edge {
    /// All edges in canonical order.
    pub const ALL: [Edge; 4] = [
        Edge::TopRight,
        Edge::TopLeft,
        Edge::BottomLeft,
        Edge::BottomRight,
    ];

    /// Edge a unit spawned on this edge travels toward.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::TopRight => Self::BottomLeft,
            Self::TopLeft => Self::BottomRight,
            Self::BottomLeft => Self::TopRight,
            Self::BottomRight => Self::TopLeft,
        }
    }

    /// Owner that may deploy mobile units from this edge.
    #[must_use]
    pub const fn entry_owner(self) -> Owner {
        match self {
            Self::TopRight | Self::TopLeft => Owner::Opponent,
            Self::BottomLeft | Self::BottomRight => Owner::Ally,
        }
    }

    /// The two legal entry edges for `owner`.
    #[must_use]
    pub const fn entry_edges(owner: Owner) -> [Edge; 2] {
        match owner {
            Owner::Ally => [Self::BottomLeft, Self::BottomRight],
            Owner::Opponent => [Self::TopRight, Self::TopLeft],
        }
    }

    /// Unit direction, as `(dx, dy)` signs, that heads toward this edge.
    #[must_use]
    pub const fn heading(self) -> (i8, i8) {
        match self {
            Self::TopRight => (1, 1),
            Self::TopLeft => (-1, 1),
            Self::BottomLeft => (-1, -1),
            Self::BottomRight => (1, -1),
        }
    }
}

/// Movement axis of a single orthogonal step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Step that changes the column.
    Horizontal,
    /// Step that changes the row.
    Vertical,
}

impl Axis {
    /// Axis of the orthogonal step from `from` to `to`, if they are neighbours.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        match (from.x().abs_diff(to.x()), from.y().abs_diff(to.y())) {
            (1, 0) => Some(Self::Horizontal),
            (0, 1) => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// Health and resource pools tracked for one side of the match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Remaining player health; breaches subtract from it.
    pub health: f32,
    /// Currency spent on structures.
    pub structure_points: f32,
    /// Currency spent on mobile units.
    pub mobile_points: f32,
}

impl PlayerStats {
    /// Creates a stats block, clamping every pool at zero.
    #[must_use]
    pub fn new(health: f32, structure_points: f32, mobile_points: f32) -> Self {
        Self {
            health: health.max(0.0),
            structure_points: structure_points.max(0.0),
            mobile_points: mobile_points.max(0.0),
        }
    }
}

/// Structure placement that has not yet been applied to the canonical grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Placement {
    /// Kind of structure to place.
    pub kind: UnitKind,
    /// Cell the structure occupies.
    pub cell: CellCoord,
    /// Side that owns the structure.
    pub owner: Owner,
    /// Whether the structure is upgraded immediately after placement.
    pub upgraded: bool,
}

/// Opponent structure seen on the grid at least once during the match.
///
/// Records are keyed by `(kind, cell)`; the upgraded flag only ever turns on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Kind of structure observed.
    pub kind: UnitKind,
    /// Cell the structure occupied.
    pub cell: CellCoord,
    /// Whether the structure was ever observed upgraded.
    pub upgraded: bool,
}

impl BuildRecord {
    /// Placement that would rebuild this record for `owner`.
    #[must_use]
    pub const fn rebuild(&self, owner: Owner, upgraded: bool) -> Placement {
        Placement {
            kind: self.kind,
            cell: self.cell,
            owner,
            upgraded,
        }
    }
}

/// Pending build-stack entry queued by the decision layer this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildIntent {
    /// Places a new unit on the grid.
    Place {
        /// Kind of unit requested.
        kind: UnitKind,
        /// Cell the unit should occupy.
        cell: CellCoord,
        /// Side that owns the new unit.
        owner: Owner,
    },
    /// Upgrades the structure currently standing on `cell`.
    Upgrade {
        /// Cell hosting the structure to upgrade.
        cell: CellCoord,
    },
}

/// A mobile unit reached the far edge and damaged the defending player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreachEvent {
    /// Edge cell where the breach happened.
    pub cell: CellCoord,
    /// Player health removed by the breach.
    pub damage: f32,
    /// Kind of the breaching unit.
    pub kind: UnitKind,
    /// Owner of the breaching unit.
    pub owner: Owner,
}

/// A unit was destroyed or removed during the previous action phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeathEvent {
    /// Cell the unit occupied when it died.
    pub cell: CellCoord,
    /// Kind of the destroyed unit.
    pub kind: UnitKind,
    /// Owner of the destroyed unit.
    pub owner: Owner,
    /// Whether the owner removed the unit on purpose.
    pub intentional_removal: bool,
}

/// Event log reported by the match host for a single turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnEvents {
    /// Breaches recorded during the turn.
    pub breaches: Vec<BreachEvent>,
    /// Deaths recorded during the turn.
    pub deaths: Vec<DeathEvent>,
}

/// Mobile units committed to a single simulated attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Deployment {
    /// Kind of mobile unit to spawn.
    pub kind: UnitKind,
    /// Number of units stacked on the spawn cell.
    pub count: u32,
    /// Side launching the attack.
    pub owner: Owner,
}

impl Deployment {
    /// Creates a new deployment descriptor.
    #[must_use]
    pub const fn new(kind: UnitKind, count: u32, owner: Owner) -> Self {
        Self { kind, count, owner }
    }
}

/// Terminal state of a simulated trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrajectoryEnd {
    /// The stack stood on a target edge cell with at least one survivor.
    EdgeReached,
    /// Every unit in the stack was destroyed en route.
    Drained,
    /// The stack had no legal move before reaching the edge.
    Stuck,
}

/// Forecast outcome of deploying a stack from one spawn cell.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryResult {
    /// Entry cell the stack spawned on.
    pub spawn: CellCoord,
    /// Damage applied to opposing structures across the trajectory.
    pub damage_dealt: f32,
    /// Net damage absorbed by the stack, floored at zero per step.
    pub damage_suffered: f32,
    /// Units standing on the target edge at the end of the trajectory.
    pub survivors: u32,
    /// State the trajectory terminated in.
    pub end: TrajectoryEnd,
    /// Cells visited by the stack, starting with the spawn cell.
    pub path: Vec<CellCoord>,
}
