// src/analysis/feedback.rs
//
// User-facing cues. Per-frame cues come from the current state and criteria;
// completion cues either celebrate a counted rep or diagnose a missed one in
// a fixed priority order (first match wins):
//
//   1. lowest knee angle never got deep enough
//   2. closing-frame knee angle out of range
//   3. closing-frame hip angle out of range
//   4. closing-frame depth ratio too shallow
//   5. generic

use super::state_machine::RepOutcome;
use crate::types::{RepCriteria, RepState, SquatThresholds};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const PERFECT_FORM: &str = "Perfect form!";
pub const KEEP_GOING: &str = "Keep going";
pub const READY: &str = "Ready to squat";
pub const ADJUST_FORM: &str = "Please adjust your form";

const CELEBRATIONS: [&str; 5] = [
    "Great job! Perfect squat! {n}",
    "Nice form! Keep going! {n}",
    "Excellent squat, well done! {n}",
    "Perfect! That's {n}",
    "Amazing form! {n} squats",
];

/// Chooses which celebration template to use.
pub trait PhraseSource: Send {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform selection backed by a seedable RNG.
pub struct SeededPhrases {
    rng: StdRng,
}

impl SeededPhrases {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl PhraseSource for SeededPhrases {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

pub struct FeedbackComposer {
    thresholds: SquatThresholds,
    phrases: Box<dyn PhraseSource>,
}

impl FeedbackComposer {
    pub fn new(thresholds: SquatThresholds, phrases: Box<dyn PhraseSource>) -> Self {
        Self {
            thresholds,
            phrases,
        }
    }

    pub fn replace_phrases(&mut self, phrases: Box<dyn PhraseSource>) {
        self.phrases = phrases;
    }

    pub fn celebration_count() -> usize {
        CELEBRATIONS.len()
    }

    /// Cue for a frame that did not close a rep.
    pub fn frame_cue(&self, state: RepState, criteria: &RepCriteria) -> String {
        if state == RepState::Standing {
            return READY.to_string();
        }
        if criteria.perfect_lower_body() {
            return PERFECT_FORM.to_string();
        }

        let issues: Vec<&str> = [
            (!criteria.hip_good, "Hips"),
            (!criteria.knee_good, "Knees"),
            (!criteria.depth_good, "Depth"),
        ]
        .into_iter()
        .filter_map(|(failing, name)| failing.then_some(name))
        .take(2)
        .collect();

        if issues.is_empty() {
            KEEP_GOING.to_string()
        } else {
            format!("Fix: {}", issues.join(", "))
        }
    }

    /// Cue for a finished rep.
    pub fn completion_cue(&mut self, outcome: &RepOutcome) -> String {
        if outcome.perfect {
            let idx = self.phrases.pick(CELEBRATIONS.len()) % CELEBRATIONS.len();
            return CELEBRATIONS[idx].replace("{n}", &outcome.squat_count.to_string());
        }
        self.diagnose(outcome).to_string()
    }

    fn diagnose(&self, outcome: &RepOutcome) -> &'static str {
        let t = &self.thresholds;
        let last = &outcome.final_angles;

        if outcome.min_knee_angle >= t.sufficient_depth_knee {
            "Go deeper. Bend your knees more"
        } else if !t.knee_in_range(last.knee) {
            "Please adjust your form. Check your knee position"
        } else if !t.hip_in_range(last.hip) {
            "Please adjust your form. Push your hips back"
        } else if !t.depth_sufficient(last.hip_depth_ratio) {
            "Please adjust your form. Go deeper"
        } else {
            ADJUST_FORM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JointAngles;

    /// Hands out indices in order, wrapping.
    struct Cycle(usize);

    impl PhraseSource for Cycle {
        fn pick(&mut self, len: usize) -> usize {
            let idx = self.0 % len;
            self.0 += 1;
            idx
        }
    }

    fn composer() -> FeedbackComposer {
        FeedbackComposer::new(SquatThresholds::default(), Box::new(Cycle(0)))
    }

    fn outcome(perfect: bool, min_knee: f32, last: JointAngles) -> RepOutcome {
        RepOutcome {
            attempt: 1,
            perfect,
            squat_count: if perfect { 3 } else { 2 },
            min_knee_angle: min_knee,
            frames: 10,
            best_form_seen: perfect,
            final_angles: last,
        }
    }

    fn last(knee: f32, hip: f32, depth: f32) -> JointAngles {
        JointAngles {
            knee,
            hip,
            back_lean: Some(5.0),
            hip_depth_ratio: depth,
        }
    }

    fn criteria(knee: bool, hip: bool, depth: bool) -> RepCriteria {
        RepCriteria {
            knee_good: knee,
            hip_good: hip,
            depth_good: depth,
            back_good: true,
        }
    }

    #[test]
    fn test_standing_cue() {
        let c = composer();
        assert_eq!(c.frame_cue(RepState::Standing, &criteria(true, true, true)), READY);
    }

    #[test]
    fn test_squatting_cues() {
        let c = composer();
        assert_eq!(
            c.frame_cue(RepState::Squatting, &criteria(true, true, true)),
            PERFECT_FORM
        );
        assert_eq!(
            c.frame_cue(RepState::Squatting, &criteria(true, false, true)),
            "Fix: Hips"
        );
        // at most two issues, hips before knees before depth
        assert_eq!(
            c.frame_cue(RepState::Squatting, &criteria(false, false, false)),
            "Fix: Hips, Knees"
        );
        assert_eq!(
            c.frame_cue(RepState::Squatting, &criteria(false, true, false)),
            "Fix: Knees, Depth"
        );
    }

    #[test]
    fn test_celebration_embeds_count() {
        let mut c = composer();
        let o = outcome(true, 90.0, last(150.0, 150.0, 0.7));
        let cues: Vec<String> = (0..FeedbackComposer::celebration_count())
            .map(|_| c.completion_cue(&o))
            .collect();

        assert_eq!(cues[0], "Great job! Perfect squat! 3");
        assert_eq!(cues[4], "Amazing form! 3 squats");
        assert!(cues.iter().all(|cue| cue.contains('3')));
        let mut unique = cues.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_diagnosis_priority() {
        let mut c = composer();

        let shallow = outcome(false, 112.0, last(90.0, 100.0, 0.9));
        assert_eq!(c.completion_cue(&shallow), "Go deeper. Bend your knees more");

        let knee = outcome(false, 95.0, last(140.0, 40.0, 0.5));
        assert_eq!(
            c.completion_cue(&knee),
            "Please adjust your form. Check your knee position"
        );

        let hip = outcome(false, 95.0, last(100.0, 40.0, 0.5));
        assert_eq!(
            c.completion_cue(&hip),
            "Please adjust your form. Push your hips back"
        );

        let depth = outcome(false, 95.0, last(100.0, 100.0, 0.5));
        assert_eq!(c.completion_cue(&depth), "Please adjust your form. Go deeper");

        let generic = outcome(false, 95.0, last(100.0, 100.0, 0.9));
        assert_eq!(c.completion_cue(&generic), ADJUST_FORM);
    }

    #[test]
    fn test_seeded_phrases_are_reproducible() {
        let mut a = SeededPhrases::from_seed(7);
        let mut b = SeededPhrases::from_seed(7);
        let left: Vec<usize> = (0..20).map(|_| a.pick(5)).collect();
        let right: Vec<usize> = (0..20).map(|_| b.pick(5)).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|&i| i < 5));
    }
}
