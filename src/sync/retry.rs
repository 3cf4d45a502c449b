//! Bounded schedule of direct scroll attempts.
//!
//! A scroll request is tried at most three times: right away, at the next paint, and
//! after a fixed delay. Each attempt is consumed when it runs, so the schedule always
//! drains.

use std::collections::VecDeque;
use std::time::Duration;

/// When a scheduled attempt becomes runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptTrigger {
    /// On the next wake of any kind
    Immediate,
    /// On the next paint
    NextPaint,
    /// Once the clock reaches this time
    At(Duration),
}

/// What woke the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// A request was just made
    Now,
    /// The surface painted a frame
    Paint,
    /// Timer check at the given time
    Tick(Duration),
}

impl AttemptTrigger {
    fn is_due(&self, wake: Wake) -> bool {
        match (self, wake) {
            (AttemptTrigger::Immediate, _) => true,
            (AttemptTrigger::NextPaint, Wake::Paint) => true,
            (AttemptTrigger::At(deadline), Wake::Tick(now)) => now >= *deadline,
            _ => false,
        }
    }
}

/// Pending attempts for one target.
#[derive(Debug, Clone, Default)]
pub struct RetryQueue {
    target: Option<String>,
    attempts: VecDeque<AttemptTrigger>,
}

impl RetryQueue {
    /// Attempts per scheduled request.
    pub const MAX_ATTEMPTS: usize = 3;

    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending schedule with a fresh one for `target`.
    pub fn schedule(&mut self, target: &str, now: Duration, delay: Duration) {
        self.target = Some(target.to_string());
        self.attempts = VecDeque::from([
            AttemptTrigger::Immediate,
            AttemptTrigger::NextPaint,
            AttemptTrigger::At(now + delay),
        ]);
    }

    /// Drop the schedule.
    pub fn clear(&mut self) {
        self.target = None;
        self.attempts.clear();
    }

    /// Target of the current schedule.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Attempts not yet run.
    pub fn remaining(&self) -> usize {
        self.attempts.len()
    }

    /// Consume every attempt due for this wake. Returns the target if any was due;
    /// several due attempts collapse into one run.
    pub fn take_due(&mut self, wake: Wake) -> Option<String> {
        let before = self.attempts.len();
        self.attempts.retain(|attempt| !attempt.is_due(wake));
        if self.attempts.len() == before {
            return None;
        }
        let target = self.target.clone();
        if self.attempts.is_empty() {
            self.target = None;
        }
        target
    }
}
