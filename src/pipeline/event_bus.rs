// src/pipeline/event_bus.rs
//
// Bounded queue of session events. Unlike the single-slot completion edge,
// every rep boundary lands here until drained; only overflow drops events,
// oldest first.

use crate::analysis::RepOutcome;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    RepStarted {
        frame_id: u64,
        knee_angle: f32,
    },
    RepCompleted {
        frame_id: u64,
        outcome: RepOutcome,
        cue: String,
    },
}

pub struct EventBus {
    events: VecDeque<SessionEvent>,
    max_pending: usize,
    dropped: u64,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
            dropped: 0,
        }
    }

    pub fn publish(&mut self, event: SessionEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Session event queue full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Events lost to overflow since construction.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}
