//! Leaderboard ordering and ranking overlay
//!
//! A ranking snapshot is produced for every tick batch: the latest tick of
//! every driver, sorted by a [`RankingOrder`], then augmented by
//! [`RankingOverlay`] with positions, grid positions and refuel state.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::{DriverId, DriverMeta, DriverTick, RaceMode, RankingEntry, SessionOptions};

type Comparator = dyn Fn(&DriverTick, &DriverTick) -> Ordering + Send + Sync;

/// Pluggable comparator that sorts ticks into leaderboard order.
#[derive(Clone)]
pub struct RankingOrder {
    name: &'static str,
    compare: Arc<Comparator>,
}

impl RankingOrder {
    /// Wrap a custom comparator.
    pub fn custom<F>(name: &'static str, compare: F) -> Self
    where
        F: Fn(&DriverTick, &DriverTick) -> Ordering + Send + Sync + 'static,
    {
        Self { name, compare: Arc::new(compare) }
    }

    /// Default order for the given session options.
    pub fn for_options(options: &SessionOptions) -> Self {
        if options.fixed_order {
            return Self::by_number();
        }
        match options.mode {
            RaceMode::Race => Self::by_race_position(),
            RaceMode::Practice | RaceMode::Qualifying => Self::by_best_lap(),
        }
    }

    /// Controller number.
    pub fn by_number() -> Self {
        Self::custom("number", |a, b| a.id.cmp(&b.id))
    }

    /// Most laps first, then earliest crossing; cars without a time go last.
    pub fn by_race_position() -> Self {
        Self::custom("position", |a, b| {
            b.laps
                .cmp(&a.laps)
                .then_with(|| cmp_defined_first(a.time, b.time))
                .then_with(|| a.id.cmp(&b.id))
        })
    }

    /// Fastest lap first; cars without a lap go last.
    pub fn by_best_lap() -> Self {
        Self::custom("bestlap", |a, b| {
            cmp_defined_first(a.best_lap(), b.best_lap()).then_with(|| a.id.cmp(&b.id))
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn sort(&self, ticks: &mut [DriverTick]) {
        ticks.sort_by(|a, b| (self.compare)(a, b));
    }
}

impl fmt::Debug for RankingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankingOrder").field("name", &self.name).finish()
    }
}

fn cmp_defined_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Augments ranking snapshots with grid positions and refuel detection.
///
/// Owned by a single session; both maps start empty with the session.
#[derive(Debug)]
pub struct RankingOverlay {
    mode: RaceMode,
    grid_pos: HashMap<DriverId, usize>,
    pit_fuel_low_water: HashMap<DriverId, u8>,
}

impl RankingOverlay {
    pub fn new(mode: RaceMode) -> Self {
        Self { mode, grid_pos: HashMap::new(), pit_fuel_low_water: HashMap::new() }
    }

    /// Build leaderboard rows for a snapshot already in ranking order.
    pub fn apply(&mut self, snapshot: &[DriverTick], roster: &[DriverMeta]) -> Vec<RankingEntry> {
        snapshot
            .iter()
            .enumerate()
            .map(|(position, tick)| {
                let id = tick.id;
                if self.mode == RaceMode::Race && tick.time.is_some() {
                    self.grid_pos.entry(id).or_insert(position);
                }

                let low_water = self.pit_fuel_low_water.get(&id).copied();
                let refueling = match (tick.fuel, low_water) {
                    (Some(fuel), Some(mark)) => tick.pit && fuel > mark,
                    _ => false,
                };
                if let Some(fuel) = tick.fuel {
                    // A car first seen in the pit lane gets its mark on the way out.
                    if !tick.pit || low_water.is_some_and(|mark| fuel < mark) {
                        self.pit_fuel_low_water.insert(id, fuel);
                    }
                }

                RankingEntry {
                    tick: tick.clone(),
                    position,
                    grid_position: self.grid_pos.get(&id).copied(),
                    refueling,
                    driver: roster
                        .get(id.index())
                        .cloned()
                        .unwrap_or_else(|| DriverMeta::anonymous(id)),
                }
            })
            .collect()
    }
}
