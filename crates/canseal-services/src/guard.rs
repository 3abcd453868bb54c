//! Replay and duplicate filtering for authenticated frames.
//!
//! Runs only on frames the codec has already authenticated, in a fixed
//! order: duplicate suppression first (silent), then the optional
//! counter re-baseline, then monotonic replay rejection. Only an
//! acceptance advances the trusted counter; the caller persists it
//! immediately afterwards.
//!
//! State is global, matching the one-logical-sender scope of the bus.
//! Running multiple independent senders through one guard conflates
//! their counters; partition per sender identity before doing that.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use canseal_core::codec::DecodedFrame;

/// Tuning knobs for the guard, surfaced in daemon config.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    /// Accept a large backward counter jump near zero as a sender
    /// restart. Exploitable by a patient attacker holding an old
    /// low-counter frame, so this is a policy, not a constant.
    pub rebaseline: bool,
    /// Window within which an identical (frame_id, payload) pair is
    /// considered the same physical delivery.
    pub duplicate_window: Duration,
    /// Entries kept for duplicate suppression, oldest evicted first.
    pub recent_capacity: usize,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            rebaseline: true,
            duplicate_window: Duration::from_millis(300),
            recent_capacity: 20,
        }
    }
}

/// Outcome of filtering one authenticated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Fresh frame; the guard has advanced its counter and the caller
    /// must persist it.
    Accept,
    /// Same (frame_id, payload) seen inside the duplicate window.
    /// Silent: no state change, no notification.
    Duplicate,
    /// Counter did not advance past the last accepted value.
    Replay { last_accepted: u16 },
}

/// Backward jump beyond this, combined with a near-zero counter,
/// reads as a sender restart rather than a replay.
const REBASELINE_GAP: u16 = 100;
const REBASELINE_CEILING: u16 = 20;

pub struct ReplayGuard {
    policy: GuardPolicy,
    last_accepted: Option<u16>,
    recent: VecDeque<((u16, Vec<u8>), Instant)>,
}

impl ReplayGuard {
    /// `last_accepted` is the persisted counter loaded at startup;
    /// `None` means no history (accept any counter).
    pub fn new(policy: GuardPolicy, last_accepted: Option<u16>) -> Self {
        let capacity = policy.recent_capacity;
        Self {
            policy,
            last_accepted,
            recent: VecDeque::with_capacity(capacity),
        }
    }

    pub fn last_accepted(&self) -> Option<u16> {
        self.last_accepted
    }

    /// Filter one authenticated frame against wall-clock now.
    pub fn evaluate(&mut self, frame: &DecodedFrame) -> Verdict {
        self.evaluate_at(frame, Instant::now())
    }

    fn evaluate_at(&mut self, frame: &DecodedFrame, now: Instant) -> Verdict {
        let key = (frame.frame_id, frame.payload.clone());

        if self.seen_within_window(&key, now) {
            return Verdict::Duplicate;
        }
        self.record(key, now);

        if self.policy.rebaseline {
            if let Some(last) = self.last_accepted {
                let gap = i32::from(last) - i32::from(frame.counter);
                if gap > i32::from(REBASELINE_GAP) && frame.counter < REBASELINE_CEILING {
                    // Counter 0 re-baselines to "no history".
                    self.last_accepted = frame.counter.checked_sub(1);
                    tracing::info!(
                        from = last,
                        to = ?self.last_accepted,
                        counter = frame.counter,
                        "re-baselining last accepted counter after sender restart"
                    );
                }
            }
        }

        if let Some(last) = self.last_accepted {
            if frame.counter <= last {
                return Verdict::Replay {
                    last_accepted: last,
                };
            }
        }

        self.last_accepted = Some(frame.counter);
        Verdict::Accept
    }

    fn seen_within_window(&self, key: &(u16, Vec<u8>), now: Instant) -> bool {
        self.recent.iter().any(|(k, t)| {
            k == key && now.saturating_duration_since(*t) < self.policy.duplicate_window
        })
    }

    fn record(&mut self, key: (u16, Vec<u8>), now: Instant) {
        self.recent.push_back((key, now));
        while self.recent.len() > self.policy.recent_capacity {
            self.recent.pop_front();
        }
    }
}
