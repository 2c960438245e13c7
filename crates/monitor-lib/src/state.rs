//! Debounced two-state machine over classified samples
//!
//! Tracks the most recently *published* health state. A classification
//! only yields a transition when it differs from that state, and the state
//! only advances once the caller confirms the transition was published.

use crate::models::{HealthState, Transition};

#[derive(Debug, Default)]
pub struct DebouncedStateMachine {
    published: HealthState,
    transitions: u64,
}

impl DebouncedStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently published state
    pub fn published(&self) -> HealthState {
        self.published
    }

    /// Number of committed transitions
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Pending transition for `next`, or `None` when nothing changed.
    ///
    /// Does not mutate; call [`commit`](Self::commit) after a successful publish.
    pub fn decide(&self, next: HealthState, percent: f64) -> Option<Transition> {
        if next == self.published {
            return None;
        }
        Some(Transition {
            from: self.published,
            to: next,
            percent,
        })
    }

    pub fn commit(&mut self, transition: &Transition) {
        self.published = transition.to;
        self.transitions += 1;
    }
}
