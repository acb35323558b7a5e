//! Race event detection
//!
//! [`EventDetector`] turns the telemetry of one session into [`RaceEvent`]s.
//! It is a synchronous state machine fed by the session task in arrival
//! order, so the events it returns are already in the order their source
//! signals changed; within one tick batch, drivers keep slot order.
//!
//! Per driver, consecutive ticks are paired `(prev, curr)`. The first tick
//! seen for a driver only primes the pair and never produces events.

use std::collections::HashMap;
use tracing::trace;

use crate::types::{BEST_SLOTS, DriverId, DriverTick, LapCount, LapTime, RaceEvent, start_light};

/// Best lap and sector events are suppressed before this lap to ignore
/// warm-up timing noise.
pub const MIN_LAPS_FOR_BEST: u32 = 3;

/// Running minimum of `[lap, sector1, sector2, sector3]`; `None` is unset.
pub type BestTimes = [Option<LapTime>; BEST_SLOTS];

/// Per-session event detection state.
#[derive(Debug, Default)]
pub struct EventDetector {
    laps_target: Option<u32>,
    best: HashMap<DriverId, BestTimes>,
    previous: HashMap<DriverId, DriverTick>,
    start_light: Option<u8>,
    lap: Option<u32>,
    /// `None` until the flag has been observed raised once.
    yellow_flag: Option<bool>,
    finished: Option<bool>,
    finished_emitted: bool,
}

impl EventDetector {
    /// Create a detector for a session running `laps_target` laps.
    pub fn new(laps_target: Option<u32>) -> Self {
        Self { laps_target: laps_target.filter(|&laps| laps > 0), ..Self::default() }
    }

    /// Best times recorded so far for `driver`.
    pub fn best_times(&self, driver: DriverId) -> Option<&BestTimes> {
        self.best.get(&driver)
    }

    /// Process a batch of driver ticks in slot order.
    pub fn on_ticks(&mut self, ticks: &[DriverTick]) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        for curr in ticks {
            if let Some(prev) = self.previous.insert(curr.id, curr.clone()) {
                self.on_pair(&prev, curr, &mut events);
            }
        }
        events
    }

    fn on_pair(&mut self, prev: &DriverTick, curr: &DriverTick, events: &mut Vec<RaceEvent>) {
        let driver = curr.id;
        let best = self.best.entry(driver).or_insert([None; BEST_SLOTS]);

        for (index, time) in curr.best.iter().enumerate() {
            let Some(time) = *time else { continue };
            if best[index].is_some_and(|b| time >= b) {
                continue;
            }
            best[index] = Some(time);
            trace!(driver = %driver, slot = index, %time, "New best time");
            if curr.laps >= MIN_LAPS_FOR_BEST {
                events.push(match index {
                    0 => RaceEvent::BestLap { driver },
                    n => RaceEvent::BestSector { driver, sector: n as u8 },
                });
            }
        }

        // Stopped cars keep reporting stale values; only live cars count.
        if curr.finished || curr.time.is_none() {
            return;
        }
        if let (Some(level), Some(before)) = (curr.fuel, prev.fuel) {
            if level < before {
                events.push(RaceEvent::FuelLevel { driver, level });
            }
        }
        if curr.pit && !prev.pit {
            events.push(RaceEvent::PitEnter { driver });
        }
        if !curr.pit && prev.pit {
            events.push(RaceEvent::PitExit { driver });
        }
    }

    /// Process a start light value.
    pub fn on_start_light(&mut self, value: u8) -> Option<RaceEvent> {
        if self.start_light.replace(value) == Some(value) {
            return None;
        }
        start_light::is_false_start(value).then_some(RaceEvent::FalseStart)
    }

    /// Process the current lap of the session.
    ///
    /// `session_finished` is the session's own finished flag; the final lap is
    /// not announced once the session is over.
    pub fn on_lap(&mut self, lap: u32, session_finished: bool) -> Option<RaceEvent> {
        if self.lap.replace(lap) == Some(lap) {
            return None;
        }
        let is_final = LapCount { count: lap, total: self.laps_target }.is_final();
        (is_final && !session_finished).then_some(RaceEvent::FinalLap)
    }

    /// Process the yellow flag state.
    pub fn on_yellow_flag(&mut self, raised: bool) -> Option<RaceEvent> {
        match self.yellow_flag {
            Some(current) if current == raised => None,
            None if !raised => None,
            _ => {
                self.yellow_flag = Some(raised);
                Some(if raised { RaceEvent::YellowFlag } else { RaceEvent::GreenFlag })
            }
        }
    }

    /// Process the session finished state. Emits at most once per session.
    pub fn on_finished(&mut self, finished: bool) -> Option<RaceEvent> {
        if self.finished.replace(finished) == Some(finished) || !finished {
            return None;
        }
        if self.finished_emitted {
            return None;
        }
        self.finished_emitted = true;
        Some(RaceEvent::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TickBuilder;
    use proptest::prelude::*;

    const A: DriverId = DriverId(0);
    const B: DriverId = DriverId(1);

    #[test]
    fn best_lap_suppressed_before_third_lap() {
        let mut detector = EventDetector::new(None);
        let t1 = TickBuilder::new(A).laps(1).best_lap(12_000).build();
        let t2 = TickBuilder::new(A).laps(1).best_lap(11_500).build();
        let t3 = TickBuilder::new(A).laps(3).best_lap(11_000).build();

        assert!(detector.on_ticks(&[t1]).is_empty());
        assert!(detector.on_ticks(&[t2]).is_empty());
        assert_eq!(detector.best_times(A).unwrap()[0], Some(LapTime(11_500)));
        assert_eq!(detector.on_ticks(&[t3]), vec![RaceEvent::BestLap { driver: A }]);
    }

    #[test]
    fn slower_or_equal_times_do_not_trigger() {
        let mut detector = EventDetector::new(None);
        detector.on_ticks(&[TickBuilder::new(A).laps(3).best_lap(11_000).build()]);
        assert_eq!(
            detector.on_ticks(&[TickBuilder::new(A).laps(3).best_lap(10_900).build()]),
            vec![RaceEvent::BestLap { driver: A }]
        );
        assert!(detector.on_ticks(&[TickBuilder::new(A).laps(4).best_lap(10_900).build()]).is_empty());
        assert!(detector.on_ticks(&[TickBuilder::new(A).laps(5).best_lap(11_200).build()]).is_empty());
    }

    #[test]
    fn sector_bests_emit_in_slot_order() {
        let mut detector = EventDetector::new(None);
        detector.on_ticks(&[TickBuilder::new(A).laps(3).build()]);
        let tick = TickBuilder::new(A)
            .laps(3)
            .best_lap(10_000)
            .sector(1, 3_000)
            .sector(3, 3_500)
            .build();
        assert_eq!(
            detector.on_ticks(&[tick]),
            vec![
                RaceEvent::BestLap { driver: A },
                RaceEvent::BestSector { driver: A, sector: 1 },
                RaceEvent::BestSector { driver: A, sector: 3 },
            ]
        );
    }

    #[test]
    fn fuel_and_pit_edges() {
        let mut detector = EventDetector::new(None);
        let base = TickBuilder::new(A).time(1_000).fuel(8);
        detector.on_ticks(&[base.clone().build()]);

        assert_eq!(
            detector.on_ticks(&[base.clone().time(2_000).fuel(7).build()]),
            vec![RaceEvent::FuelLevel { driver: A, level: 7 }]
        );
        assert_eq!(
            detector.on_ticks(&[base.clone().time(3_000).fuel(7).pit(true).build()]),
            vec![RaceEvent::PitEnter { driver: A }]
        );
        // refuelling raises the gauge: no fuel event
        assert!(detector.on_ticks(&[base.clone().time(4_000).fuel(9).pit(true).build()]).is_empty());
        assert_eq!(
            detector.on_ticks(&[base.clone().time(5_000).fuel(9).build()]),
            vec![RaceEvent::PitExit { driver: A }]
        );
    }

    #[test]
    fn stopped_cars_produce_no_fuel_or_pit_events() {
        let mut detector = EventDetector::new(None);
        detector.on_ticks(&[TickBuilder::new(A).fuel(8).build()]);
        // no time yet
        assert!(detector.on_ticks(&[TickBuilder::new(A).fuel(6).pit(true).build()]).is_empty());

        detector.on_ticks(&[TickBuilder::new(B).time(100).fuel(8).build()]);
        let finished = TickBuilder::new(B).time(200).fuel(2).pit(true).finished(true).build();
        assert!(detector.on_ticks(&[finished]).is_empty());
    }

    #[test]
    fn missing_fuel_reading_is_not_a_drop() {
        let mut detector = EventDetector::new(None);
        detector.on_ticks(&[TickBuilder::new(A).time(100).fuel(8).build()]);
        assert!(detector.on_ticks(&[TickBuilder::new(A).time(200).build()]).is_empty());
        assert!(detector.on_ticks(&[TickBuilder::new(A).time(300).fuel(8).build()]).is_empty());
    }

    #[test]
    fn batch_keeps_driver_order() {
        let mut detector = EventDetector::new(None);
        detector.on_ticks(&[
            TickBuilder::new(A).time(0).fuel(5).build(),
            TickBuilder::new(B).time(0).fuel(5).build(),
        ]);
        let events = detector.on_ticks(&[
            TickBuilder::new(A).time(10).fuel(4).build(),
            TickBuilder::new(B).time(10).fuel(3).build(),
        ]);
        assert_eq!(
            events,
            vec![
                RaceEvent::FuelLevel { driver: A, level: 4 },
                RaceEvent::FuelLevel { driver: B, level: 3 },
            ]
        );
    }

    #[test]
    fn false_start_is_deduplicated() {
        let mut detector = EventDetector::new(None);
        let values = [0, 5, 4, 9, 9, 0, 9];
        let events: Vec<_> = values.iter().filter_map(|&v| detector.on_start_light(v)).collect();
        assert_eq!(events, vec![RaceEvent::FalseStart, RaceEvent::FalseStart]);
    }

    #[test]
    fn final_lap_once_while_running() {
        let mut detector = EventDetector::new(Some(10));
        assert_eq!(detector.on_lap(9, false), None);
        assert_eq!(detector.on_lap(10, false), Some(RaceEvent::FinalLap));
        assert_eq!(detector.on_lap(10, false), None);

        let mut finished = EventDetector::new(Some(10));
        assert_eq!(finished.on_lap(10, true), None);

        let mut open = EventDetector::new(None);
        assert_eq!(open.on_lap(10, false), None);
    }

    #[test]
    fn leading_green_is_ignored() {
        let mut detector = EventDetector::new(None);
        let events: Vec<_> = [false, false, true, false]
            .iter()
            .filter_map(|&v| detector.on_yellow_flag(v))
            .collect();
        assert_eq!(events, vec![RaceEvent::YellowFlag, RaceEvent::GreenFlag]);
    }

    #[test]
    fn finished_emits_at_most_once() {
        let mut detector = EventDetector::new(None);
        let events: Vec<_> = [false, true, true, false, true]
            .iter()
            .filter_map(|&v| detector.on_finished(v))
            .collect();
        assert_eq!(events, vec![RaceEvent::Finished]);
    }

    proptest! {
        #[test]
        fn best_times_never_increase(
            laps in prop::collection::vec((0u32..10, prop::option::of(5_000u64..20_000)), 1..40)
        ) {
            let mut detector = EventDetector::new(None);
            let mut last: Option<LapTime> = None;
            for (lap, time) in laps {
                let mut builder = TickBuilder::new(A).laps(lap);
                if let Some(ms) = time {
                    builder = builder.best_lap(ms);
                }
                let events = detector.on_ticks(&[builder.build()]);
                if lap < MIN_LAPS_FOR_BEST {
                    prop_assert!(events.is_empty());
                }
                let current = detector.best_times(A).and_then(|b| b[0]);
                if let (Some(before), Some(now)) = (last, current) {
                    prop_assert!(now <= before);
                }
                if current.is_some() {
                    last = current;
                }
            }
        }
    }
}
