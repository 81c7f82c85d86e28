use crate::types::{Config, SquatThresholds};
use anyhow::{bail, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        let config: Config =
            serde_yaml::from_str(&contents).with_context(|| format!("parsing config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        if self.session.event_queue_capacity == 0 {
            bail!("session.event_queue_capacity must be at least 1");
        }
        if self.replay.target_fps == 0 {
            bail!("replay.target_fps must be at least 1");
        }
        Ok(())
    }
}

impl SquatThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.squat_enter_knee >= self.stand_exit_knee {
            bail!(
                "squat_enter_knee ({:.1}) must be below stand_exit_knee ({:.1}) to keep a dead band",
                self.squat_enter_knee,
                self.stand_exit_knee
            );
        }
        for (name, lo, hi) in [
            ("knee", self.knee_min, self.knee_max),
            ("hip", self.hip_min, self.hip_max),
            ("back_lean", self.back_lean_min, self.back_lean_max),
        ] {
            if lo > hi {
                bail!("{}_min ({:.1}) exceeds {}_max ({:.1})", name, lo, name, hi);
            }
        }
        if self.min_hip_depth_ratio.is_nan() || self.min_hip_depth_ratio <= 0.0 {
            bail!("min_hip_depth_ratio must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("squat-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let path = scratch_file(
            "partial.yaml",
            "detection:\n  knee_max: 105.0\nreplay:\n  input_dir: clips\n",
        );
        let config = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.detection.knee_max, 105.0);
        assert_eq!(config.detection.squat_enter_knee, 120.0);
        assert_eq!(config.replay.input_dir, "clips");
        assert_eq!(config.session.log_interval_frames, 30);
    }

    #[test]
    fn test_collapsed_dead_band_is_rejected() {
        let path = scratch_file(
            "collapsed.yaml",
            "detection:\n  squat_enter_knee: 130.0\n  stand_exit_knee: 130.0\n",
        );
        let err = Config::load(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("dead band"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let mut thresholds = SquatThresholds::default();
        thresholds.hip_min = 130.0;
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Config::load("/nonexistent/squat.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/squat.yaml"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
