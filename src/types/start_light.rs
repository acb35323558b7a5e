//! Start light codes reported by the control unit
//!
//! The start light value is a small integer: `0` while armed or off, a
//! countdown stage while the lights run, and a reserved code when a car
//! moves before lights-out.

/// Lights armed or off.
pub const ARMED: u8 = 0;

/// Reserved code signalling a false start.
pub const FALSE_START: u8 = 9;

/// Transition from a running countdown to off marks the start.
pub fn is_lights_out(prev: u8, curr: u8) -> bool {
    prev != ARMED && curr == ARMED
}

pub fn is_false_start(value: u8) -> bool {
    value == FALSE_START
}
