// src/analysis/testing.rs
//
// Synthetic pose frames for tests. Both body sides share the same points, so
// averaged angles equal the requested ones.

use crate::types::{Joint, Landmark, LANDMARK_COUNT};

const KNEE: (f32, f32) = (0.5, 0.6);
const HIP_X: f32 = 0.35;
const SHIN: f32 = 0.2;
const TORSO: f32 = 0.25;

fn rotate(v: (f32, f32), degrees: f32) -> (f32, f32) {
    let (s, c) = degrees.to_radians().sin_cos();
    (v.0 * c - v.1 * s, v.0 * s + v.1 * c)
}

fn unit(from: (f32, f32), to: (f32, f32)) -> (f32, f32) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    (dx / len, dy / len)
}

/// A full 33-landmark frame whose knee angle, hip angle and hip-depth ratio
/// match the arguments.
pub fn squat_frame(knee_angle: f32, hip_angle: f32, depth_ratio: f32) -> Vec<Landmark> {
    let hip = (HIP_X, depth_ratio * KNEE.1);

    // ankle: rotate the knee→hip ray by the knee angle
    let shin_dir = rotate(unit(KNEE, hip), -knee_angle);
    let ankle = (KNEE.0 + SHIN * shin_dir.0, KNEE.1 + SHIN * shin_dir.1);

    // shoulder: rotate the hip→knee ray by the hip angle
    let torso_dir = rotate(unit(hip, KNEE), -hip_angle);
    let shoulder = (hip.0 + TORSO * torso_dir.0, hip.1 + TORSO * torso_dir.1);

    let mut frame = vec![Landmark::new(0.5, 0.1); LANDMARK_COUNT];
    for (joint, point) in [
        (Joint::LeftShoulder, shoulder),
        (Joint::RightShoulder, shoulder),
        (Joint::LeftHip, hip),
        (Joint::RightHip, hip),
        (Joint::LeftKnee, KNEE),
        (Joint::RightKnee, KNEE),
        (Joint::LeftAnkle, ankle),
        (Joint::RightAnkle, ankle),
    ] {
        frame[joint.landmark_index()] = Landmark::new(point.0, point.1);
    }
    frame
}

/// Linear ramp from `from` to `to` in `steps` equal increments, inclusive.
pub fn ramp(from: f32, to: f32, steps: usize) -> Vec<f32> {
    (0..=steps)
        .map(|i| from + (to - from) * i as f32 / steps as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::geometry::joint_angles;

    #[test]
    fn test_synthetic_frame_realizes_targets() {
        for (knee, hip, depth) in [(170.0, 150.0, 0.75), (90.0, 100.0, 0.9), (115.0, 130.0, 0.8)] {
            let a = joint_angles(&squat_frame(knee, hip, depth));
            assert!((a.knee - knee).abs() < 0.01, "knee {} vs {}", a.knee, knee);
            assert!((a.hip - hip).abs() < 0.01, "hip {} vs {}", a.hip, hip);
            assert!((a.hip_depth_ratio - depth).abs() < 1e-4);
        }
    }

    #[test]
    fn test_bottom_frame_keeps_torso_upright_enough() {
        let a = joint_angles(&squat_frame(90.0, 100.0, 0.9));
        let lean = a.back_lean.unwrap();
        assert!(lean <= 45.0, "lean {}", lean);
    }

    #[test]
    fn test_ramp_is_inclusive() {
        assert_eq!(ramp(170.0, 90.0, 8), vec![170.0, 160.0, 150.0, 140.0, 130.0, 120.0, 110.0, 100.0, 90.0]);
    }
}
