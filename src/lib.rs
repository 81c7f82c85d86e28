//! Squat repetition counting and form grading over pose landmark streams.
//!
//! Frames of 33 body landmarks (produced by an external pose model) go in
//! through [`DetectorSession::intake`]; per-frame angles, pass/fail flags and
//! a short cue come out, while the session keeps rep counts and per-criterion
//! accuracy for correct reps.
//!
//! ```ignore
//! use squat_detector::{Config, DetectorSession};
//!
//! let mut session = DetectorSession::from_config(&Config::default());
//! let analysis = session.intake(&landmarks);
//! if session.poll_completion_edge() {
//!     println!("{}", session.completion_feedback());
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod pipeline;
pub mod replay;
pub mod types;

pub use analysis::{DetectorSession, PhraseSource, RepOutcome, SeededPhrases};
pub use pipeline::SessionEvent;
pub use types::{
    CheckpointMap, Config, FrameAnalysis, Joint, JointAngles, Landmark, RepCriteria, RepState,
    SessionStats, SquatThresholds, LANDMARK_COUNT,
};
