// src/analysis/state_machine.rs
//
// Two-state squat repetition detector over the averaged knee angle.
//
//   STANDING ──knee < enter──▶ SQUATTING ──knee > exit──▶ STANDING (+1 attempt)
//
// enter < exit, and angles inside the band [enter, exit] never move the
// state in either direction. Collapsing the band double counts reps when the
// knee hovers around a single boundary.
//
// The rep tally lives inside the Squatting phase so it cannot outlive the
// rep. On completion it is folded into the session totals only if the rep
// was correct; a missed rep's frames are dropped.

use super::form_grader::RepTally;
use crate::types::{JointAngles, RepState, SessionStats, SquatThresholds};
use serde::Serialize;
use tracing::info;

// ============================================================================
// SESSION TOTALS
// ============================================================================

/// Session-wide counters. Frame counters only ever receive contributions
/// from correct reps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub squat_count: u32,
    pub total_attempts: u32,
    pub correct_squats: u32,
    pub missed_squats: u32,
    pub knee_correct_frames: u64,
    pub hip_correct_frames: u64,
    pub back_correct_frames: u64,
    pub total_frames_in_correct_squats: u64,
}

impl SessionTotals {
    fn fold_correct(&mut self, tally: &RepTally) {
        self.squat_count += 1;
        self.correct_squats += 1;
        self.total_frames_in_correct_squats += u64::from(tally.frames);
        self.knee_correct_frames += u64::from(tally.knee_frames);
        self.hip_correct_frames += u64::from(tally.hip_frames);
        self.back_correct_frames += u64::from(tally.back_frames);
    }

    /// `floor(100 * part / total_frames_in_correct_squats)`, 0 with no data.
    pub fn percentage(&self, part: u64) -> u32 {
        if self.total_frames_in_correct_squats == 0 {
            return 0;
        }
        let pct = part.saturating_mul(100) / self.total_frames_in_correct_squats;
        pct.min(100) as u32
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            squat_count: self.squat_count,
            total_attempts: self.total_attempts,
            correct_squats: self.correct_squats,
            missed_squats: self.missed_squats,
            knee_percentage: self.percentage(self.knee_correct_frames),
            hip_percentage: self.percentage(self.hip_correct_frames),
            back_percentage: self.percentage(self.back_correct_frames),
            knee_correct_frames: self.knee_correct_frames,
            hip_correct_frames: self.hip_correct_frames,
            back_correct_frames: self.back_correct_frames,
            total_frames_in_correct_squats: self.total_frames_in_correct_squats,
        }
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Classification of one finished rep plus what feedback needs to explain it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepOutcome {
    /// 1-based attempt number within the session
    pub attempt: u32,
    pub perfect: bool,
    /// Correct reps so far, including this one if it counted
    pub squat_count: u32,
    pub min_knee_angle: f32,
    pub frames: u32,
    pub best_form_seen: bool,
    /// Angles of the frame that closed the rep
    pub final_angles: JointAngles,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepTransition {
    Started { knee_angle: f32 },
    Completed(RepOutcome),
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Standing,
    Squatting(RepTally),
}

pub struct RepStateMachine {
    thresholds: SquatThresholds,
    phase: Phase,
}

impl RepStateMachine {
    pub fn new(thresholds: SquatThresholds) -> Self {
        Self {
            thresholds,
            phase: Phase::Standing,
        }
    }

    pub fn state(&self) -> RepState {
        match self.phase {
            Phase::Standing => RepState::Standing,
            Phase::Squatting(_) => RepState::Squatting,
        }
    }

    pub fn active_tally_mut(&mut self) -> Option<&mut RepTally> {
        match &mut self.phase {
            Phase::Squatting(tally) => Some(tally),
            Phase::Standing => None,
        }
    }

    /// Advance on one frame's angles. Completion folds into `totals`.
    pub fn update(
        &mut self,
        angles: &JointAngles,
        totals: &mut SessionTotals,
    ) -> Option<RepTransition> {
        let knee = angles.knee;

        match self.phase {
            Phase::Standing if knee < self.thresholds.squat_enter_knee => {
                self.phase = Phase::Squatting(RepTally::start(knee));
                info!("🔽 Squat started | knee {:.0}°", knee);
                Some(RepTransition::Started { knee_angle: knee })
            }
            Phase::Squatting(tally) if knee > self.thresholds.stand_exit_knee => {
                self.phase = Phase::Standing;
                Some(RepTransition::Completed(self.complete(&tally, angles, totals)))
            }
            _ => None,
        }
    }

    fn complete(
        &self,
        tally: &RepTally,
        final_angles: &JointAngles,
        totals: &mut SessionTotals,
    ) -> RepOutcome {
        totals.total_attempts += 1;

        let deep_enough = tally.min_knee_angle < self.thresholds.sufficient_depth_knee;
        let perfect = tally.best_form_seen && deep_enough;

        if perfect {
            totals.fold_correct(tally);
            info!(
                "✅ Squat #{} counted | lowest knee {:.0}° over {} frames",
                totals.squat_count, tally.min_knee_angle, tally.frames
            );
        } else {
            totals.missed_squats += 1;
            info!(
                "❌ Squat not counted | lowest knee {:.0}° (need <{:.0}°), best form seen: {}",
                tally.min_knee_angle, self.thresholds.sufficient_depth_knee, tally.best_form_seen
            );
        }
        info!(
            "   Totals: attempts={} correct={} missed={}",
            totals.total_attempts, totals.correct_squats, totals.missed_squats
        );

        RepOutcome {
            attempt: totals.total_attempts,
            perfect,
            squat_count: totals.squat_count,
            min_knee_angle: tally.min_knee_angle,
            frames: tally.frames,
            best_form_seen: tally.best_form_seen,
            final_angles: *final_angles,
        }
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Standing;
    }
}
