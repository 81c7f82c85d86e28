// src/analysis/session.rs
//
// Per-session facade over the squat core.
//
// Frame flow:
//   landmarks → geometry → form_grader ─┬→ state_machine → feedback → FrameAnalysis
//                                       └→ active rep tally
//
// Callers must serialize `intake` calls; a session is a plain value with no
// interior locking, and independent sessions share nothing.

use super::feedback::{FeedbackComposer, PhraseSource, SeededPhrases, ADJUST_FORM};
use super::form_grader::FormGrader;
use super::geometry;
use super::state_machine::{RepOutcome, RepStateMachine, RepTransition, SessionTotals};
use crate::pipeline::{EventBus, SessionEvent};
use crate::types::{
    CheckpointMap, Config, FrameAnalysis, Landmark, RepState, SessionConfig, SessionStats,
    SquatThresholds, LANDMARK_COUNT,
};
use tracing::{debug, info};

pub struct DetectorSession {
    config: SessionConfig,
    grader: FormGrader,
    machine: RepStateMachine,
    feedback: FeedbackComposer,
    totals: SessionTotals,
    events: EventBus,

    // Single-slot completion signal, cleared on read
    completion_pending: bool,
    last_outcome: Option<RepOutcome>,
    last_cue: Option<String>,

    frames_processed: u64,
}

impl DetectorSession {
    /// Session whose celebration phrases come from `session.phrase_seed`,
    /// or from entropy when no seed is configured.
    pub fn new(thresholds: SquatThresholds, session: SessionConfig) -> Self {
        let phrases: Box<dyn PhraseSource> = match session.phrase_seed {
            Some(seed) => Box::new(SeededPhrases::from_seed(seed)),
            None => Box::new(SeededPhrases::from_entropy()),
        };
        Self::with_phrase_source(thresholds, session, phrases)
    }

    pub fn with_phrase_source(
        thresholds: SquatThresholds,
        session: SessionConfig,
        phrases: Box<dyn PhraseSource>,
    ) -> Self {
        let events = EventBus::new(session.event_queue_capacity);
        Self {
            config: session,
            grader: FormGrader::new(thresholds),
            machine: RepStateMachine::new(thresholds),
            feedback: FeedbackComposer::new(thresholds, phrases),
            totals: SessionTotals::default(),
            events,
            completion_pending: false,
            last_outcome: None,
            last_cue: None,
            frames_processed: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.detection, config.session.clone())
    }

    /// Analyze one frame. Frames with fewer than 33 landmarks yield the
    /// "no detection" sentinel and leave the session untouched.
    pub fn intake(&mut self, frame: &[Landmark]) -> FrameAnalysis {
        if frame.len() < LANDMARK_COUNT {
            return FrameAnalysis::no_detection();
        }

        self.frames_processed += 1;
        let frame_id = self.frames_processed;

        let angles = geometry::joint_angles(frame);
        let criteria = self.grader.evaluate(&angles);

        // Tally against the state this frame arrived in, before transitions
        if let Some(tally) = self.machine.active_tally_mut() {
            self.grader.record(tally, &criteria, angles.knee);
        }

        self.log_snapshot(frame_id, &angles);

        let transition = self.machine.update(&angles, &mut self.totals);
        match transition {
            Some(RepTransition::Started { knee_angle }) => {
                self.events.publish(SessionEvent::RepStarted {
                    frame_id,
                    knee_angle,
                });
            }
            Some(RepTransition::Completed(outcome)) => {
                let cue = self.feedback.completion_cue(&outcome);
                info!("🔼 Rep {} finished: \"{}\"", outcome.attempt, cue);

                self.completion_pending = true;
                self.last_outcome = Some(outcome);
                self.last_cue = Some(cue.clone());
                self.events.publish(SessionEvent::RepCompleted {
                    frame_id,
                    outcome,
                    cue,
                });
            }
            None => {}
        }

        FrameAnalysis {
            knee_angle: angles.knee,
            hip_angle: angles.hip,
            back_lean_angle: angles.back_lean.unwrap_or(0.0),
            hip_depth_ratio: angles.hip_depth_ratio,
            perfect_lower_body: criteria.perfect_lower_body(),
            criteria_fail_map: CheckpointMap::from_criteria(&criteria),
            feedback_text: self.feedback.frame_cue(self.machine.state(), &criteria),
        }
    }

    fn log_snapshot(&self, frame_id: u64, angles: &crate::types::JointAngles) {
        let interval = self.config.log_interval_frames;
        if interval == 0 || frame_id % interval != 0 {
            return;
        }
        debug!(
            "📊 Frame {} | knee {:.0}° | hip {:.0}° | back {:.0}° | depth {:.2} | {} | attempts={} correct={} missed={}",
            frame_id,
            angles.knee,
            angles.hip,
            angles.back_lean.unwrap_or(0.0),
            angles.hip_depth_ratio,
            self.machine.state().as_str(),
            self.totals.total_attempts,
            self.totals.correct_squats,
            self.totals.missed_squats
        );
    }

    /// True at most once per completed rep. Reading clears it; a second
    /// completion before the next poll overwrites the first.
    pub fn poll_completion_edge(&mut self) -> bool {
        std::mem::take(&mut self.completion_pending)
    }

    pub fn was_last_rep_perfect(&self) -> bool {
        self.last_outcome.map(|o| o.perfect).unwrap_or(false)
    }

    /// Cue composed when the most recent rep finished.
    pub fn completion_feedback(&self) -> &str {
        self.last_cue.as_deref().unwrap_or(ADJUST_FORM)
    }

    pub fn rep_count(&self) -> u32 {
        self.totals.squat_count
    }

    pub fn session_stats(&self) -> SessionStats {
        self.totals.stats()
    }

    pub fn state(&self) -> RepState {
        self.machine.state()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// All rep boundaries since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain()
    }

    pub fn dropped_events(&self) -> u64 {
        self.events.dropped_count()
    }

    /// Back to the state of a freshly constructed session. A configured
    /// `phrase_seed` restarts the celebration sequence; entropy-backed and
    /// caller-supplied phrase sources carry on where they were.
    pub fn reset(&mut self) {
        if let Some(seed) = self.config.phrase_seed {
            self.feedback
                .replace_phrases(Box::new(SeededPhrases::from_seed(seed)));
        }
        self.machine.reset();
        self.totals = SessionTotals::default();
        self.events = EventBus::new(self.config.event_queue_capacity);
        self.completion_pending = false;
        self.last_outcome = None;
        self.last_cue = None;
        self.frames_processed = 0;
        info!("✨ Session reset, all counters zeroed");
    }
}
