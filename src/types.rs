use serde::{Deserialize, Serialize};

/// Number of landmarks in a full-body pose frame.
pub const LANDMARK_COUNT: usize = 33;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: SquatThresholds,
    pub session: SessionConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

/// Angle and ratio thresholds used for grading and repetition boundaries.
/// Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatThresholds {
    /// Standing → Squatting when the knee angle drops below this
    pub squat_enter_knee: f32,
    /// Squatting → Standing when the knee angle rises above this
    pub stand_exit_knee: f32,
    pub knee_min: f32,
    pub knee_max: f32,
    pub hip_min: f32,
    pub hip_max: f32,
    pub min_hip_depth_ratio: f32,
    /// Back lean is reported but never affects correctness
    pub back_lean_min: f32,
    pub back_lean_max: f32,
    /// A rep only counts if the lowest knee angle went below this
    pub sufficient_depth_knee: f32,
}

impl Default for SquatThresholds {
    fn default() -> Self {
        Self {
            squat_enter_knee: 120.0,
            stand_exit_knee: 130.0,
            knee_min: 50.0,
            knee_max: 110.0,
            hip_min: 60.0,
            hip_max: 120.0,
            min_hip_depth_ratio: 0.85,
            back_lean_min: 0.0,
            back_lean_max: 45.0,
            sufficient_depth_knee: 110.0,
        }
    }
}

impl SquatThresholds {
    pub fn knee_in_range(&self, knee: f32) -> bool {
        (self.knee_min..=self.knee_max).contains(&knee)
    }

    pub fn hip_in_range(&self, hip: f32) -> bool {
        (self.hip_min..=self.hip_max).contains(&hip)
    }

    pub fn depth_sufficient(&self, ratio: f32) -> bool {
        ratio >= self.min_hip_depth_ratio
    }

    pub fn back_in_range(&self, lean: f32) -> bool {
        (self.back_lean_min..=self.back_lean_max).contains(&lean)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Emit a debug snapshot every N processed frames (0 disables)
    pub log_interval_frames: u64,
    /// Pending session events kept before the oldest is dropped
    pub event_queue_capacity: usize,
    /// Fixed seed for celebration phrase selection; entropy when absent
    pub phrase_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_interval_frames: 30,
            event_queue_capacity: 32,
            phrase_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub input_dir: String,
    pub output_dir: String,
    /// Used for session duration when recordings carry no timestamps
    pub target_fps: u32,
    pub write_frame_log: bool,
    pub kcal_per_squat: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            input_dir: "recordings".to_string(),
            output_dir: "output".to_string(),
            target_fps: 30,
            write_frame_log: false,
            kcal_per_squat: 0.12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "squat_detector=info,squat_replay=info".to_string(),
        }
    }
}

// ============================================================================
// LANDMARKS
// ============================================================================

/// One body keypoint in normalized image coordinates. `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default)]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }
}

/// The joints the grader looks at, with their fixed pose-model indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 8] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Index into a 33-landmark frame.
    pub fn landmark_index(self) -> usize {
        match self {
            Self::LeftShoulder => 11,
            Self::RightShoulder => 12,
            Self::LeftHip => 23,
            Self::RightHip => 24,
            Self::LeftKnee => 25,
            Self::RightKnee => 26,
            Self::LeftAnkle => 27,
            Self::RightAnkle => 28,
        }
    }

    /// Slot in a [`CheckpointMap`].
    pub fn slot(self) -> usize {
        self as usize
    }
}

// ============================================================================
// PER-FRAME ANALYSIS
// ============================================================================

/// Angles derived from one frame. Degrees, except the dimensionless ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub knee: f32,
    pub hip: f32,
    /// Unset when shoulders and hips give no usable torso direction
    pub back_lean: Option<f32>,
    pub hip_depth_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepState {
    Standing,
    Squatting,
}

impl RepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standing => "STANDING",
            Self::Squatting => "SQUATTING",
        }
    }
}

/// Per-frame pass/fail for each tracked criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepCriteria {
    pub knee_good: bool,
    pub hip_good: bool,
    pub depth_good: bool,
    pub back_good: bool,
}

impl RepCriteria {
    /// Knee, hip and depth together. Back is informational only.
    pub fn perfect_lower_body(&self) -> bool {
        self.knee_good && self.hip_good && self.depth_good
    }
}

/// Failing joints for overlay drawing, one slot per [`Joint`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointMap {
    failing: [bool; 8],
}

impl CheckpointMap {
    pub fn from_criteria(criteria: &RepCriteria) -> Self {
        let mut map = Self::default();
        let hips_placed = criteria.hip_good && criteria.depth_good;
        for joint in Joint::ALL {
            map.failing[joint.slot()] = match joint {
                Joint::LeftShoulder | Joint::RightShoulder => !criteria.back_good,
                Joint::LeftHip | Joint::RightHip => !hips_placed,
                Joint::LeftKnee | Joint::RightKnee => !criteria.knee_good,
                Joint::LeftAnkle | Joint::RightAnkle => !criteria.depth_good,
            };
        }
        map
    }

    pub fn is_failing(&self, joint: Joint) -> bool {
        self.failing[joint.slot()]
    }

    pub fn failing_joints(&self) -> impl Iterator<Item = Joint> + '_ {
        Joint::ALL.into_iter().filter(move |j| self.is_failing(*j))
    }
}

impl Serialize for CheckpointMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Joint::ALL.len()))?;
        for joint in Joint::ALL {
            map.serialize_entry(&joint.landmark_index(), &self.is_failing(joint))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAnalysis {
    pub knee_angle: f32,
    pub hip_angle: f32,
    pub back_lean_angle: f32,
    pub hip_depth_ratio: f32,
    pub perfect_lower_body: bool,
    pub criteria_fail_map: CheckpointMap,
    pub feedback_text: String,
}

impl FrameAnalysis {
    pub const NO_DETECTION: &'static str = "no detection";

    /// Returned for frames that do not carry a full skeleton.
    pub fn no_detection() -> Self {
        Self {
            knee_angle: 0.0,
            hip_angle: 0.0,
            back_lean_angle: 0.0,
            hip_depth_ratio: 0.0,
            perfect_lower_body: false,
            criteria_fail_map: CheckpointMap::default(),
            feedback_text: Self::NO_DETECTION.to_string(),
        }
    }

    pub fn is_detection(&self) -> bool {
        self.feedback_text != Self::NO_DETECTION
    }
}

// ============================================================================
// SESSION STATISTICS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(rename = "squatCount")]
    pub squat_count: u32,
    #[serde(rename = "total")]
    pub total_attempts: u32,
    #[serde(rename = "correct")]
    pub correct_squats: u32,
    #[serde(rename = "missed")]
    pub missed_squats: u32,
    #[serde(rename = "kneePercentage")]
    pub knee_percentage: u32,
    #[serde(rename = "hipPercentage")]
    pub hip_percentage: u32,
    #[serde(rename = "backPercentage")]
    pub back_percentage: u32,
    #[serde(rename = "kneeCorrectFrames")]
    pub knee_correct_frames: u64,
    #[serde(rename = "hipCorrectFrames")]
    pub hip_correct_frames: u64,
    #[serde(rename = "backCorrectFrames")]
    pub back_correct_frames: u64,
    #[serde(rename = "totalFramesInCorrectSquats")]
    pub total_frames_in_correct_squats: u64,
}
