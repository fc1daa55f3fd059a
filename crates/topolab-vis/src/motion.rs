//! Marker motion along a link.
//!
//! A marker first waits out its approach (stagger offset plus the hidden move
//! to the link's start), then travels in a straight line to the link's end.
//! Time only passes through [`Motion::advance`], so a motion that is not
//! advanced stays frozen at its exact position.

use std::time::Duration;

use topolab_topology::Point;

/// Where a motion is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Hidden, not yet at the start point
    Approach,
    /// Visible, travelling
    Transit,
    /// Reached the end point
    Landed,
}

/// One marker travelling one link.
#[derive(Debug, Clone)]
pub struct Motion {
    pub marker: u64,
    pub start: Point,
    pub end: Point,
    approach: Duration,
    transit: Duration,
    elapsed: Duration,
    started: bool,
}

impl Motion {
    /// Create a motion that waits `approach` and then travels for `transit`.
    pub fn new(marker: u64, start: Point, end: Point, approach: Duration, transit: Duration) -> Self {
        Self {
            marker,
            start,
            end,
            approach,
            transit,
            elapsed: Duration::ZERO,
            started: false,
        }
    }

    /// Current phase. A motion that was never advanced is still approaching.
    pub fn phase(&self) -> Phase {
        if !self.started || self.elapsed < self.approach {
            Phase::Approach
        } else if self.elapsed < self.approach + self.transit {
            Phase::Transit
        } else {
            Phase::Landed
        }
    }

    /// Progress along the link (0.0 = start, 1.0 = end).
    pub fn progress(&self) -> f64 {
        if self.elapsed <= self.approach {
            return 0.0;
        }
        if self.transit.is_zero() {
            return 1.0;
        }
        let travelled = self.elapsed - self.approach;
        (travelled.as_secs_f64() / self.transit.as_secs_f64()).min(1.0)
    }

    /// Current marker position.
    pub fn position(&self) -> Point {
        self.start.lerp(&self.end, self.progress())
    }

    /// Let `dt` pass. Returns the phase before and after.
    pub fn advance(&mut self, dt: Duration) -> (Phase, Phase) {
        let before = self.phase();
        self.started = true;
        self.elapsed = (self.elapsed + dt).min(self.approach + self.transit);
        (before, self.phase())
    }

    /// Whether the marker has reached the end.
    pub fn landed(&self) -> bool {
        self.phase() == Phase::Landed
    }
}
