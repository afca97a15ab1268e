//! Static unit configuration resolved once at startup.
//!
//! [`ArenaSettings`] mirrors the on-disk configuration document. It is
//! validated and resolved into an [`ArenaConfig`] whose [`UnitTable`] answers
//! per-kind lookups by array indexing, so systems never re-parse or re-merge
//! upgrade overrides while simulating.

use std::ops::Add;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UnitKind;

const STANDARD_ARENA_SIZE: u32 = 28;

/// Resource cost expressed in both currencies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cost {
    /// Structure points spent.
    pub structure: f32,
    /// Mobile points spent.
    pub mobile: f32,
}

impl Cost {
    /// Creates a cost from both currency amounts.
    #[must_use]
    pub const fn new(structure: f32, mobile: f32) -> Self {
        Self { structure, mobile }
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Self) -> Self::Output {
        Cost::new(self.structure + rhs.structure, self.mobile + rhs.mobile)
    }
}

/// Complete stat block for one unit kind at one upgrade level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitProfile {
    /// Total cost to field a unit at this level.
    pub cost: Cost,
    /// Starting (and maximum) health.
    pub health: f32,
    /// Damage per shot against stationary structures.
    pub damage_to_structures: f32,
    /// Damage per shot against mobile units.
    pub damage_to_mobile: f32,
    /// Attack range measured in cells.
    pub attack_range: f32,
    /// Flat shield granted to each unit passing through the shield range.
    pub shield_per_unit: f32,
    /// Additional shield granted per row the support sits from its owner's edge.
    pub shield_bonus_per_row: f32,
    /// Shield range measured in cells.
    pub shield_range: f32,
    /// Cells travelled per simulation frame.
    pub speed: f32,
}

impl UnitProfile {
    fn stats(&self) -> [(&'static str, f32); 10] {
        [
            ("cost.structure", self.cost.structure),
            ("cost.mobile", self.cost.mobile),
            ("health", self.health),
            ("damage_to_structures", self.damage_to_structures),
            ("damage_to_mobile", self.damage_to_mobile),
            ("attack_range", self.attack_range),
            ("shield_per_unit", self.shield_per_unit),
            ("shield_bonus_per_row", self.shield_bonus_per_row),
            ("shield_range", self.shield_range),
            ("speed", self.speed),
        ]
    }
}

/// Stat overrides applied when a unit is upgraded.
///
/// Absent fields inherit the base value; `cost` is the incremental price of
/// the upgrade on top of the base placement cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitUpgrade {
    /// Incremental upgrade cost.
    pub cost: Cost,
    /// Replacement maximum health.
    pub health: Option<f32>,
    /// Replacement structure damage.
    pub damage_to_structures: Option<f32>,
    /// Replacement mobile-unit damage.
    pub damage_to_mobile: Option<f32>,
    /// Replacement attack range.
    pub attack_range: Option<f32>,
    /// Replacement flat shield amount.
    pub shield_per_unit: Option<f32>,
    /// Replacement per-row shield bonus.
    pub shield_bonus_per_row: Option<f32>,
    /// Replacement shield range.
    pub shield_range: Option<f32>,
    /// Replacement speed.
    pub speed: Option<f32>,
}

impl UnitUpgrade {
    fn apply(&self, base: &UnitProfile) -> UnitProfile {
        UnitProfile {
            cost: base.cost + self.cost,
            health: self.health.unwrap_or(base.health),
            damage_to_structures: self
                .damage_to_structures
                .unwrap_or(base.damage_to_structures),
            damage_to_mobile: self.damage_to_mobile.unwrap_or(base.damage_to_mobile),
            attack_range: self.attack_range.unwrap_or(base.attack_range),
            shield_per_unit: self.shield_per_unit.unwrap_or(base.shield_per_unit),
            shield_bonus_per_row: self
                .shield_bonus_per_row
                .unwrap_or(base.shield_bonus_per_row),
            shield_range: self.shield_range.unwrap_or(base.shield_range),
            speed: self.speed.unwrap_or(base.speed),
        }
    }
}

/// Configuration of one unit kind as written in the settings document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitRule {
    /// Stats of a freshly placed unit.
    #[serde(flatten)]
    pub base: UnitProfile,
    /// Overrides applied by an upgrade, if the kind can be upgraded.
    #[serde(default)]
    pub upgrade: Option<UnitUpgrade>,
}

impl UnitRule {
    fn upgraded(&self) -> UnitProfile {
        self.upgrade
            .map_or(self.base, |upgrade| upgrade.apply(&self.base))
    }
}

/// Per-kind rules; every kind must be present.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRules {
    /// Wall rules.
    pub wall: UnitRule,
    /// Support rules.
    pub support: UnitRule,
    /// Turret rules.
    pub turret: UnitRule,
    /// Scout rules.
    pub scout: UnitRule,
    /// Demolisher rules.
    pub demolisher: UnitRule,
    /// Interceptor rules.
    pub interceptor: UnitRule,
}

impl UnitRules {
    /// Rule configured for `kind`.
    #[must_use]
    pub const fn rule(&self, kind: UnitKind) -> &UnitRule {
        match kind {
            UnitKind::Wall => &self.wall,
            UnitKind::Support => &self.support,
            UnitKind::Turret => &self.turret,
            UnitKind::Scout => &self.scout,
            UnitKind::Demolisher => &self.demolisher,
            UnitKind::Interceptor => &self.interceptor,
        }
    }
}

/// Arena dimensions shared by both players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaDimensions {
    /// Width and height of the square bounding box around the diamond arena.
    pub size: u32,
}

/// Tuning knobs for idealness field construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathingPolicy {
    /// Extra cost per opposing attacker whose range covers a cell.
    ///
    /// Zero reproduces the match engine's plain shortest path.
    pub threat_penalty: u32,
}

/// Settings document describing the arena and the unit table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaSettings {
    /// Arena dimensions.
    pub arena: ArenaDimensions,
    /// Pathing tuning.
    #[serde(default)]
    pub pathing: PathingPolicy,
    /// Unit table.
    pub units: UnitRules,
}

impl ArenaSettings {
    /// Stock settings for the standard 28x28 arena.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            arena: ArenaDimensions {
                size: STANDARD_ARENA_SIZE,
            },
            pathing: PathingPolicy { threat_penalty: 1 },
            units: UnitRules {
                wall: UnitRule {
                    base: UnitProfile {
                        cost: Cost::new(2.0, 0.0),
                        health: 60.0,
                        ..UnitProfile::default()
                    },
                    upgrade: Some(UnitUpgrade {
                        cost: Cost::new(2.0, 0.0),
                        health: Some(120.0),
                        ..UnitUpgrade::default()
                    }),
                },
                support: UnitRule {
                    base: UnitProfile {
                        cost: Cost::new(4.0, 0.0),
                        health: 30.0,
                        shield_per_unit: 3.0,
                        shield_range: 3.5,
                        ..UnitProfile::default()
                    },
                    upgrade: Some(UnitUpgrade {
                        cost: Cost::new(4.0, 0.0),
                        shield_per_unit: Some(4.0),
                        shield_bonus_per_row: Some(0.3),
                        shield_range: Some(7.0),
                        ..UnitUpgrade::default()
                    }),
                },
                turret: UnitRule {
                    base: UnitProfile {
                        cost: Cost::new(3.0, 0.0),
                        health: 75.0,
                        damage_to_mobile: 5.0,
                        attack_range: 2.5,
                        ..UnitProfile::default()
                    },
                    upgrade: Some(UnitUpgrade {
                        cost: Cost::new(5.0, 0.0),
                        damage_to_mobile: Some(15.0),
                        attack_range: Some(3.5),
                        ..UnitUpgrade::default()
                    }),
                },
                scout: UnitRule {
                    base: UnitProfile {
                        cost: Cost::new(0.0, 1.0),
                        health: 15.0,
                        damage_to_structures: 2.0,
                        damage_to_mobile: 2.0,
                        attack_range: 3.5,
                        speed: 1.0,
                        ..UnitProfile::default()
                    },
                    upgrade: None,
                },
                demolisher: UnitRule {
                    base: UnitProfile {
                        cost: Cost::new(0.0, 3.0),
                        health: 5.0,
                        damage_to_structures: 8.0,
                        damage_to_mobile: 8.0,
                        attack_range: 4.5,
                        speed: 0.5,
                        ..UnitProfile::default()
                    },
                    upgrade: None,
                },
                interceptor: UnitRule {
                    base: UnitProfile {
                        cost: Cost::new(0.0, 1.0),
                        health: 40.0,
                        damage_to_mobile: 20.0,
                        attack_range: 4.5,
                        speed: 0.25,
                        ..UnitProfile::default()
                    },
                    upgrade: None,
                },
            },
        }
    }
}

/// Reasons a settings document is rejected at startup.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The arena size was zero or odd.
    #[error("arena size {0} must be a non-zero even number")]
    InvalidArenaSize(u32),
    /// A unit kind had zero or negative health.
    #[error("{kind:?} (upgraded: {upgraded}) must have positive health")]
    NonPositiveHealth {
        /// Offending kind.
        kind: UnitKind,
        /// Whether the upgraded profile was at fault.
        upgraded: bool,
    },
    /// A stat was negative or not a finite number.
    #[error("{kind:?} (upgraded: {upgraded}) has invalid {stat} value {value}")]
    InvalidStat {
        /// Offending kind.
        kind: UnitKind,
        /// Whether the upgraded profile was at fault.
        upgraded: bool,
        /// Name of the stat.
        stat: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Dense per-kind lookup of resolved unit profiles.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitTable {
    profiles: [[UnitProfile; 2]; 6],
}

impl UnitTable {
    /// Resolves upgrade overrides for every kind.
    #[must_use]
    pub fn resolve(rules: &UnitRules) -> Self {
        let profiles = UnitKind::ALL.map(|kind| {
            let rule = rules.rule(kind);
            [rule.base, rule.upgraded()]
        });
        Self { profiles }
    }

    /// Profile for `kind` at the requested upgrade level.
    #[must_use]
    pub fn profile(&self, kind: UnitKind, upgraded: bool) -> &UnitProfile {
        &self.profiles[kind.index()][usize::from(upgraded)]
    }

    /// Total cost of placing `kind`, including the upgrade when requested.
    #[must_use]
    pub fn placement_cost(&self, kind: UnitKind, upgraded: bool) -> Cost {
        self.profile(kind, upgraded).cost
    }

    /// Cost of upgrading an already placed unit of `kind`.
    #[must_use]
    pub fn upgrade_cost(&self, kind: UnitKind) -> Cost {
        let base = self.profile(kind, false).cost;
        let upgraded = self.profile(kind, true).cost;
        Cost::new(
            (upgraded.structure - base.structure).max(0.0),
            (upgraded.mobile - base.mobile).max(0.0),
        )
    }

    /// Cheapest structure-point price among all structure kinds.
    #[must_use]
    pub fn cheapest_structure_cost(&self) -> f32 {
        UnitKind::STRUCTURES
            .iter()
            .map(|kind| self.placement_cost(*kind, false).structure)
            .fold(f32::INFINITY, f32::min)
    }
}

/// Validated, resolved configuration handed to every system.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaConfig {
    size: u32,
    pathing: PathingPolicy,
    units: UnitTable,
}

impl ArenaConfig {
    /// Validates `settings` and resolves the unit table.
    pub fn from_settings(settings: &ArenaSettings) -> Result<Self, ConfigError> {
        let size = settings.arena.size;
        if size == 0 || size % 2 != 0 {
            return Err(ConfigError::InvalidArenaSize(size));
        }

        let units = UnitTable::resolve(&settings.units);
        for kind in UnitKind::ALL {
            for upgraded in [false, true] {
                let profile = units.profile(kind, upgraded);
                for (stat, value) in profile.stats() {
                    if !value.is_finite() || value < 0.0 {
                        return Err(ConfigError::InvalidStat {
                            kind,
                            upgraded,
                            stat,
                            value,
                        });
                    }
                }
                if profile.health <= 0.0 {
                    return Err(ConfigError::NonPositiveHealth { kind, upgraded });
                }
            }
        }

        Ok(Self {
            size,
            pathing: settings.pathing,
            units,
        })
    }

    /// Stock configuration for the standard arena.
    #[must_use]
    pub fn standard() -> Self {
        let settings = ArenaSettings::standard();
        Self {
            size: settings.arena.size,
            pathing: settings.pathing,
            units: UnitTable::resolve(&settings.units),
        }
    }

    /// Returns a copy using a different pathing policy.
    #[must_use]
    pub fn with_pathing(mut self, pathing: PathingPolicy) -> Self {
        self.pathing = pathing;
        self
    }

    /// Side length of the arena bounding box.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Pathing tuning.
    #[must_use]
    pub const fn pathing(&self) -> PathingPolicy {
        self.pathing
    }

    /// Resolved unit table.
    #[must_use]
    pub const fn units(&self) -> &UnitTable {
        &self.units
    }
}

impl TryFrom<&ArenaSettings> for ArenaConfig {
    type Error = ConfigError;

    fn try_from(settings: &ArenaSettings) -> Result<Self, Self::Error> {
        Self::from_settings(settings)
    }
}
