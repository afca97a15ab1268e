#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rebuild forecasting from the opponent's observed build history.
//!
//! The predictor keeps every `(kind, cell)` the opponent has ever fielded a
//! structure on. When such a structure is destroyed, the opponent is assumed
//! to rebuild it on the next turn, as far as its structure points allow.

use std::collections::BTreeMap;

use log::debug;
use siege_sim_core::{BuildRecord, CellCoord, Owner, Placement, TurnEvents, UnitKind, UnitTable};
use siege_sim_world::GridSnapshot;

/// Per-match memory of the opponent's structures and breaches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpponentPredictor {
    records: Vec<BuildRecord>,
    destroyed: Vec<(UnitKind, CellCoord)>,
    breaches: BTreeMap<CellCoord, u32>,
}

impl OpponentPredictor {
    /// Creates a predictor with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a predictor from persisted build records.
    #[must_use]
    pub fn from_records(records: Vec<BuildRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Build records in the order they were first observed.
    #[must_use]
    pub fn records(&self) -> &[BuildRecord] {
        &self.records
    }

    /// Reports whether `kind` was ever observed on `cell`.
    #[must_use]
    pub fn is_recorded(&self, kind: UnitKind, cell: CellCoord) -> bool {
        self.record(kind, cell).is_some()
    }

    /// Opponent structures destroyed this turn and not yet consumed by a prediction.
    #[must_use]
    pub fn destroyed(&self) -> &[(UnitKind, CellCoord)] {
        &self.destroyed
    }

    /// Number of opponent breaches recorded per edge cell.
    #[must_use]
    pub fn breaches(&self) -> &BTreeMap<CellCoord, u32> {
        &self.breaches
    }

    /// Merges the opponent's current structures into the build records.
    ///
    /// Returns the number of new records.
    pub fn observe_structures(&mut self, grid: &GridSnapshot) -> usize {
        let mut added = 0;
        for (cell, unit) in grid.structures() {
            if unit.owner() != Owner::Opponent {
                continue;
            }
            if let Some(index) = self.record(unit.kind(), cell) {
                self.records[index].upgraded |= unit.upgraded();
                continue;
            }
            self.records.push(BuildRecord {
                kind: unit.kind(),
                cell,
                upgraded: unit.upgraded(),
            });
            added += 1;
        }
        if added > 0 {
            debug!(
                "recorded {added} new opponent structures ({} total)",
                self.records.len()
            );
        }
        added
    }

    /// Collects destroyed opponent structures and opponent breaches from `events`.
    pub fn observe_events(&mut self, events: &TurnEvents) {
        for death in &events.deaths {
            if death.owner != Owner::Opponent
                || death.intentional_removal
                || !death.kind.is_stationary()
            {
                continue;
            }
            let entry = (death.kind, death.cell);
            if !self.destroyed.contains(&entry) {
                self.destroyed.push(entry);
            }
        }

        for breach in &events.breaches {
            if breach.owner == Owner::Opponent {
                *self.breaches.entry(breach.cell).or_insert(0) += 1;
            }
        }
    }

    /// Predicts this turn's rebuilds within `budget` structure points.
    ///
    /// Records are walked in first-seen order. An upgraded record is rebuilt
    /// upgraded when affordable and as a base structure otherwise. The
    /// destroyed set is always empty afterwards, so calling this once per
    /// turn keeps earlier deaths from leaking into later forecasts.
    pub fn predict(&mut self, budget: f32, table: &UnitTable) -> Vec<Placement> {
        let mut remaining = budget.max(0.0);
        let floor = table.cheapest_structure_cost();
        let mut predictions = Vec::new();

        for record in &self.records {
            if self.destroyed.is_empty() || remaining < floor {
                break;
            }
            let key = (record.kind, record.cell);
            let Some(position) = self.destroyed.iter().position(|entry| *entry == key) else {
                continue;
            };
            let _ = self.destroyed.remove(position);

            let base_cost = table.placement_cost(record.kind, false).structure;
            let upgraded_cost = base_cost + table.upgrade_cost(record.kind).structure;
            let (upgraded, cost) = if record.upgraded && remaining >= upgraded_cost {
                (true, upgraded_cost)
            } else if remaining >= base_cost {
                (false, base_cost)
            } else {
                debug!(
                    "cannot afford to rebuild {:?} at {:?}",
                    record.kind, record.cell
                );
                continue;
            };

            remaining -= cost;
            predictions.push(record.rebuild(Owner::Opponent, upgraded));
        }

        if !self.destroyed.is_empty() {
            debug!(
                "dropping {} destroyed structures without a prediction",
                self.destroyed.len()
            );
        }
        self.destroyed.clear();
        debug!(
            "predicted {} rebuilds, {remaining:.1} points left",
            predictions.len()
        );
        predictions
    }

    fn record(&self, kind: UnitKind, cell: CellCoord) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.kind == kind && record.cell == cell)
    }
}
