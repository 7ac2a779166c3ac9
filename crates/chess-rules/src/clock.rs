//! Per-move clock recording for timed games.
//!
//! The game never reads the clock to decide legality; it only reports how
//! long each move took and writes the remaining time into the move comments.

use std::fmt;

use chess_core::Color;

/// Receives the time spent on each move.
pub trait MoveClock: fmt::Debug + Send {
    /// Records `seconds_elapsed` for `color` and returns the time left, if
    /// the clock tracks it.
    fn record(&mut self, color: Color, seconds_elapsed: f64) -> Option<f64>;
}

/// Fischer clock: a fixed budget plus an increment after every move.
#[derive(Debug, Clone, PartialEq)]
pub struct IncrementalClock {
    remaining: [f64; 2],
    increment: f64,
}

impl IncrementalClock {
    pub fn new(initial_seconds: f64, increment_seconds: f64) -> Self {
        IncrementalClock {
            remaining: [initial_seconds; 2],
            increment: increment_seconds,
        }
    }

    pub fn remaining(&self, color: Color) -> f64 {
        self.remaining[color.index()]
    }

    pub fn is_flagged(&self, color: Color) -> bool {
        self.remaining(color) <= 0.0
    }
}

impl MoveClock for IncrementalClock {
    fn record(&mut self, color: Color, seconds_elapsed: f64) -> Option<f64> {
        let left = &mut self.remaining[color.index()];
        *left -= seconds_elapsed;
        if *left > 0.0 {
            *left += self.increment;
        }
        Some(*left)
    }
}

/// PGN clock comment, e.g. `[%clk 0:04:58]`.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!(
        "[%clk {}:{:02}:{:02}]",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_added_after_move() {
        let mut clock = IncrementalClock::new(300.0, 2.0);
        assert_eq!(clock.record(Color::White, 10.0), Some(292.0));
        assert_eq!(clock.remaining(Color::Black), 300.0);
        assert_eq!(clock.record(Color::Black, 0.5), Some(301.5));
    }

    #[test]
    fn flag_fall_skips_increment() {
        let mut clock = IncrementalClock::new(5.0, 3.0);
        assert_eq!(clock.record(Color::White, 6.0), Some(-1.0));
        assert!(clock.is_flagged(Color::White));
    }

    #[test]
    fn clock_comment_format() {
        assert_eq!(format_clock(298.4), "[%clk 0:04:58]");
        assert_eq!(format_clock(3725.0), "[%clk 1:02:05]");
        assert_eq!(format_clock(-3.0), "[%clk 0:00:00]");
    }
}
