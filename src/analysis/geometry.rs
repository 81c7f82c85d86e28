// src/analysis/geometry.rs
//
// Pure joint geometry over normalized image coordinates (y grows downward).
// Degenerate input never panics: angles and ratios resolve to 0.0, back lean
// to `None`.

use crate::types::{Joint, JointAngles, Landmark};

/// Angle at vertex `b` between rays b→a and b→c, in degrees within [0, 180].
///
/// Returns 0.0 when either ray has zero length or any coordinate is not finite.
pub fn angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let (ax, ay) = (a.x - b.x, a.y - b.y);
    let (cx, cy) = (c.x - b.x, c.y - b.y);
    if (ax == 0.0 && ay == 0.0) || (cx == 0.0 && cy == 0.0) {
        return 0.0;
    }

    let radians = cy.atan2(cx) - ay.atan2(ax);
    let mut degrees = radians.to_degrees();
    if degrees < 0.0 {
        degrees += 360.0;
    }
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }

    if degrees.is_finite() {
        degrees.clamp(0.0, 180.0)
    } else {
        0.0
    }
}

/// Absolute angle between the upward vertical and the hip-mid → shoulder-mid
/// vector. 0° is an upright torso, 90° a horizontal one.
///
/// `None` when the midpoints coincide or any coordinate is not finite.
pub fn back_lean(
    left_shoulder: &Landmark,
    right_shoulder: &Landmark,
    left_hip: &Landmark,
    right_hip: &Landmark,
) -> Option<f32> {
    let shoulder_x = (left_shoulder.x + right_shoulder.x) / 2.0;
    let shoulder_y = (left_shoulder.y + right_shoulder.y) / 2.0;
    let hip_x = (left_hip.x + right_hip.x) / 2.0;
    let hip_y = (left_hip.y + right_hip.y) / 2.0;

    let dx = shoulder_x - hip_x;
    // flip so that "up" in the image is positive
    let up = hip_y - shoulder_y;
    if dx == 0.0 && up == 0.0 {
        return None;
    }

    let lean = dx.atan2(up).to_degrees().abs();
    lean.is_finite().then_some(lean)
}

/// Mean hip y over mean knee y. Values near or above 1.0 mean the hips are
/// at or below knee height.
pub fn hip_depth_ratio(
    left_hip: &Landmark,
    right_hip: &Landmark,
    left_knee: &Landmark,
    right_knee: &Landmark,
) -> f32 {
    let hip_y = (left_hip.y + right_hip.y) / 2.0;
    let knee_y = (left_knee.y + right_knee.y) / 2.0;

    if knee_y == 0.0 {
        return 0.0;
    }

    let ratio = hip_y / knee_y;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Derive all joint angles from a full frame, averaging left and right sides.
///
/// The caller guarantees the frame holds every [`Joint`] index.
pub fn joint_angles(frame: &[Landmark]) -> JointAngles {
    let lm = |joint: Joint| &frame[joint.landmark_index()];

    let left_knee = angle(lm(Joint::LeftHip), lm(Joint::LeftKnee), lm(Joint::LeftAnkle));
    let right_knee = angle(
        lm(Joint::RightHip),
        lm(Joint::RightKnee),
        lm(Joint::RightAnkle),
    );

    let left_hip = angle(
        lm(Joint::LeftShoulder),
        lm(Joint::LeftHip),
        lm(Joint::LeftKnee),
    );
    let right_hip = angle(
        lm(Joint::RightShoulder),
        lm(Joint::RightHip),
        lm(Joint::RightKnee),
    );

    JointAngles {
        knee: (left_knee + right_knee) / 2.0,
        hip: (left_hip + right_hip) / 2.0,
        back_lean: back_lean(
            lm(Joint::LeftShoulder),
            lm(Joint::RightShoulder),
            lm(Joint::LeftHip),
            lm(Joint::RightHip),
        ),
        hip_depth_ratio: hip_depth_ratio(
            lm(Joint::LeftHip),
            lm(Joint::RightHip),
            lm(Joint::LeftKnee),
            lm(Joint::RightKnee),
        ),
    }
}
