//! Unit state stored by value inside arena cells.

use siege_sim_core::{Owner, UnitKind, UnitProfile, UnitTable};

/// A single unit occupying a cell.
///
/// Units carry a copy of their resolved profile so combat never has to look
/// stats up again, and they hold no reference back to the cell they occupy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit {
    kind: UnitKind,
    owner: Owner,
    health: f32,
    upgraded: bool,
    profile: UnitProfile,
}

impl Unit {
    /// Creates a unit at full health.
    #[must_use]
    pub fn new(kind: UnitKind, owner: Owner, table: &UnitTable) -> Self {
        let profile = *table.profile(kind, false);
        Self {
            kind,
            owner,
            health: profile.health,
            upgraded: false,
            profile,
        }
    }

    /// Creates an upgraded unit at full health.
    #[must_use]
    pub fn new_upgraded(kind: UnitKind, owner: Owner, table: &UnitTable) -> Self {
        let profile = *table.profile(kind, true);
        Self {
            kind,
            owner,
            health: profile.health,
            upgraded: true,
            profile,
        }
    }

    /// Replaces the current health, clamping at zero.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health.max(0.0);
        self
    }

    /// Kind of the unit.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Side that owns the unit.
    #[must_use]
    pub const fn owner(&self) -> Owner {
        self.owner
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Whether the unit has been upgraded.
    #[must_use]
    pub const fn upgraded(&self) -> bool {
        self.upgraded
    }

    /// Stats the unit fights with.
    #[must_use]
    pub const fn profile(&self) -> &UnitProfile {
        &self.profile
    }

    /// Reports whether the unit has no health left.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Swaps in the upgraded profile, growing health by the gained maximum.
    ///
    /// Returns `false` when the unit was already upgraded.
    pub fn upgrade(&mut self, table: &UnitTable) -> bool {
        if self.upgraded {
            return false;
        }
        let upgraded = *table.profile(self.kind, true);
        let gained = (upgraded.health - self.profile.health).max(0.0);
        self.health += gained;
        self.profile = upgraded;
        self.upgraded = true;
        true
    }

    /// Removes up to `amount` health and returns the health actually removed.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0).min(self.health);
        self.health = (self.health - applied).max(0.0);
        applied
    }

    /// Adds a temporary shield on top of the current health.
    pub fn add_shield(&mut self, amount: f32) {
        self.health += amount.max(0.0);
    }
}
