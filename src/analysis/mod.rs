// src/analysis/mod.rs
//
// Squat repetition core.
//
// Signal flow per frame:
//   33 landmarks → geometry → form_grader ─┬→ state_machine ─→ feedback
//                                          └→ rep tally (while squatting)
//
// Orchestrated by session::DetectorSession.

pub mod feedback;
pub mod form_grader;
pub mod geometry;
pub mod session;
pub mod state_machine;

#[cfg(test)]
pub(crate) mod testing;

pub use feedback::{FeedbackComposer, PhraseSource, SeededPhrases};
pub use form_grader::{FormGrader, RepTally};
pub use session::DetectorSession;
pub use state_machine::{RepOutcome, RepStateMachine, RepTransition, SessionTotals};
