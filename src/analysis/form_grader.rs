// src/analysis/form_grader.rs
//
// Per-frame criteria evaluation and the per-rep tally. The grader holds no
// session-wide state; folding tallies into session totals happens at rep
// completion in the state machine.

use crate::types::{JointAngles, RepCriteria, SquatThresholds};

/// Counters for the repetition currently in progress.
///
/// Created zeroed on Standing → Squatting and consumed on the matching
/// Squatting → Standing transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepTally {
    pub frames: u32,
    pub knee_frames: u32,
    /// Frames with the hip angle in range and enough depth
    pub hip_frames: u32,
    pub back_frames: u32,
    pub min_knee_angle: f32,
    /// Latched once any frame of this rep had perfect lower-body form
    pub best_form_seen: bool,
}

impl RepTally {
    pub fn start(knee_angle: f32) -> Self {
        Self {
            frames: 0,
            knee_frames: 0,
            hip_frames: 0,
            back_frames: 0,
            min_knee_angle: knee_angle,
            best_form_seen: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormGrader {
    thresholds: SquatThresholds,
}

impl FormGrader {
    pub fn new(thresholds: SquatThresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate every criterion for one frame.
    pub fn evaluate(&self, angles: &JointAngles) -> RepCriteria {
        let t = &self.thresholds;
        RepCriteria {
            knee_good: t.knee_in_range(angles.knee),
            hip_good: t.hip_in_range(angles.hip),
            depth_good: t.depth_sufficient(angles.hip_depth_ratio),
            back_good: angles.back_lean.is_some_and(|lean| t.back_in_range(lean)),
        }
    }

    /// Fold one squatting frame into the active tally.
    pub fn record(&self, tally: &mut RepTally, criteria: &RepCriteria, knee_angle: f32) {
        tally.frames += 1;
        if criteria.knee_good {
            tally.knee_frames += 1;
        }
        if criteria.hip_good && criteria.depth_good {
            tally.hip_frames += 1;
        }
        if criteria.back_good {
            tally.back_frames += 1;
        }

        if knee_angle < tally.min_knee_angle {
            tally.min_knee_angle = knee_angle;
        }

        if criteria.perfect_lower_body() {
            tally.best_form_seen = true;
        }
    }
}

impl Default for FormGrader {
    fn default() -> Self {
        Self::new(SquatThresholds::default())
    }
}
