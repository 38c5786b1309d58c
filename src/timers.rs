// Copyright 2023 the Sill Authors
// SPDX-License-Identifier: Apache-2.0

//! One-shot timers driven by the host event loop.
//!
//! The core never blocks: anything time-based (grab promotion, menu
//! show-now debouncing) posts a timer here and reacts when the host pumps
//! [`TimerQueue::run_timers`]. Cancellation is just forgetting the token.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{self, AtomicU64};
use std::time::Instant;

/// Identifies a posted timer. Tokens are process-unique and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    /// A token that no timer will ever fire with.
    pub const INVALID: TimerToken = TimerToken(0);

    pub fn next() -> TimerToken {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        TimerToken(COUNTER.fetch_add(1, atomic::Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Timer {
    deadline: Instant,
    token: TimerToken,
}

impl Ord for Timer {
    /// Earliest deadline sorts first, so the binary heap keeps the next
    /// timer at its head.
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .reverse()
            .then_with(|| self.token.0.cmp(&other.token.0))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A deadline min-heap of one-shot timers.
///
/// Cancelled timers stay in the heap until their deadline passes; the owner
/// of a cancelled token simply no longer recognizes it when it fires.
#[derive(Default)]
pub struct TimerQueue {
    timers: BinaryHeap<Timer>,
}

impl TimerQueue {
    pub fn new() -> TimerQueue {
        TimerQueue::default()
    }

    pub fn schedule(&mut self, deadline: Instant) -> TimerToken {
        let token = TimerToken::next();
        self.timers.push(Timer { deadline, token });
        token
    }

    pub fn schedule_in(&mut self, delay: std::time::Duration) -> TimerToken {
        self.schedule(Instant::now() + delay)
    }

    /// When the host's poll should wake up next, if any timer is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.peek().map(|t| t.deadline)
    }

    /// Pops every timer whose deadline has passed.
    pub fn run_timers(&mut self, now: Instant) -> Vec<TimerToken> {
        let mut fired = Vec::new();
        while let Some(timer) = self.timers.peek() {
            if timer.deadline > now {
                break;
            }
            fired.push(self.timers.pop().map(|t| t.token).unwrap_or(TimerToken::INVALID));
        }
        fired
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
