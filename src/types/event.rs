//! Race events and their notification keys

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DriverId;
use crate::RaceError;

/// Discrete race event detected from telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RaceEvent {
    /// New personal best lap (lap 3 onwards).
    BestLap { driver: DriverId },
    /// New personal best in sector 1..=3 (lap 3 onwards).
    BestSector { driver: DriverId, sector: u8 },
    /// Fuel gauge dropped to `level`.
    FuelLevel { driver: DriverId, level: u8 },
    PitEnter { driver: DriverId },
    PitExit { driver: DriverId },
    FalseStart,
    FinalLap,
    YellowFlag,
    GreenFlag,
    Finished,
}

impl RaceEvent {
    /// Notification key of this event.
    pub fn kind(&self) -> EventKind {
        match *self {
            RaceEvent::BestLap { .. } => EventKind::BestLap,
            RaceEvent::BestSector { sector, .. } => EventKind::BestSector(sector),
            RaceEvent::FuelLevel { level, .. } => EventKind::FuelLevel(level),
            RaceEvent::PitEnter { .. } => EventKind::PitEnter,
            RaceEvent::PitExit { .. } => EventKind::PitExit,
            RaceEvent::FalseStart => EventKind::FalseStart,
            RaceEvent::FinalLap => EventKind::FinalLap,
            RaceEvent::YellowFlag => EventKind::YellowFlag,
            RaceEvent::GreenFlag => EventKind::GreenFlag,
            RaceEvent::Finished => EventKind::Finished,
        }
    }

    /// Driver the event belongs to, `None` for session-level events.
    pub fn driver(&self) -> Option<DriverId> {
        match *self {
            RaceEvent::BestLap { driver }
            | RaceEvent::BestSector { driver, .. }
            | RaceEvent::FuelLevel { driver, .. }
            | RaceEvent::PitEnter { driver }
            | RaceEvent::PitExit { driver } => Some(driver),
            _ => None,
        }
    }
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.driver() {
            Some(driver) => write!(f, "{} {}", self.kind(), driver),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Event kind used to key notification settings and message catalogs.
///
/// Serialized as a short stable key: `bestlap`, `bests1`..`bests3`,
/// `fuel<N>`, `pitenter`, `pitexit`, `falsestart`, `finallap`,
/// `yellowflag`, `greenflag`, `finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventKind {
    BestLap,
    BestSector(u8),
    FuelLevel(u8),
    PitEnter,
    PitExit,
    FalseStart,
    FinalLap,
    YellowFlag,
    GreenFlag,
    Finished,
}

impl EventKind {
    /// Highest fuel gauge level the control unit reports.
    pub const MAX_FUEL_LEVEL: u8 = 15;

    /// Every kind with a fixed key plus the low fuel levels 0..=5.
    ///
    /// Higher fuel levels are valid keys but have no default message.
    pub fn defaults() -> Vec<EventKind> {
        let mut kinds = vec![EventKind::BestLap];
        kinds.extend((1..=3).map(EventKind::BestSector));
        kinds.extend((0..=5).map(EventKind::FuelLevel));
        kinds.extend([
            EventKind::PitEnter,
            EventKind::PitExit,
            EventKind::FalseStart,
            EventKind::FinalLap,
            EventKind::YellowFlag,
            EventKind::GreenFlag,
            EventKind::Finished,
        ]);
        kinds
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::BestLap => f.write_str("bestlap"),
            EventKind::BestSector(n) => write!(f, "bests{}", n),
            EventKind::FuelLevel(n) => write!(f, "fuel{}", n),
            EventKind::PitEnter => f.write_str("pitenter"),
            EventKind::PitExit => f.write_str("pitexit"),
            EventKind::FalseStart => f.write_str("falsestart"),
            EventKind::FinalLap => f.write_str("finallap"),
            EventKind::YellowFlag => f.write_str("yellowflag"),
            EventKind::GreenFlag => f.write_str("greenflag"),
            EventKind::Finished => f.write_str("finished"),
        }
    }
}

impl FromStr for EventKind {
    type Err = RaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "bestlap" => EventKind::BestLap,
            "pitenter" => EventKind::PitEnter,
            "pitexit" => EventKind::PitExit,
            "falsestart" => EventKind::FalseStart,
            "finallap" => EventKind::FinalLap,
            "yellowflag" => EventKind::YellowFlag,
            "greenflag" => EventKind::GreenFlag,
            "finished" => EventKind::Finished,
            _ => {
                if let Some(n) = s.strip_prefix("bests").and_then(|n| n.parse::<u8>().ok()) {
                    if (1..=3).contains(&n) {
                        return Ok(EventKind::BestSector(n));
                    }
                } else if let Some(n) = s.strip_prefix("fuel").and_then(|n| n.parse::<u8>().ok()) {
                    if n <= Self::MAX_FUEL_LEVEL {
                        return Ok(EventKind::FuelLevel(n));
                    }
                }
                return Err(RaceError::config(format!("unknown event kind '{}'", s)));
            }
        };
        Ok(kind)
    }
}

impl TryFrom<String> for EventKind {
    type Error = RaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.to_string()
    }
}
