//! Timer-driven reveal animation.

use std::time::{Duration, Instant};

/// Cooperative scroll animation from one first-line to another over a fixed
/// number of ticks. The animation owns no timer; the runtime calls `advance`
/// on every tick and the animation decides whether a step is due.
#[derive(Debug, Clone)]
pub struct RevealAnimation {
    generation: u64,
    from: usize,
    to: usize,
    steps: u32,
    step: u32,
    interval: Duration,
    next_due: Instant,
}

impl RevealAnimation {
    pub(crate) fn new(
        generation: u64,
        from: usize,
        to: usize,
        steps: u32,
        interval: Duration,
        now: Instant,
    ) -> Self {
        Self {
            generation,
            from,
            to,
            steps: steps.max(1),
            step: 0,
            interval,
            next_due: now + interval,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn target(&self) -> usize {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.steps
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Perform one step if due, returning the new first line.
    pub(crate) fn advance(&mut self, now: Instant) -> Option<usize> {
        if self.is_finished() || now < self.next_due {
            return None;
        }
        self.step += 1;
        self.next_due += self.interval;
        Some(self.position())
    }

    fn position(&self) -> usize {
        if self.is_finished() {
            return self.to;
        }
        let from = self.from as i64;
        let span = self.to as i64 - from;
        let offset = span * i64::from(self.step) / i64::from(self.steps);
        (from + offset).max(0) as usize
    }
}
