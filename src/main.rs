// src/main.rs
//
// Replays recorded landmark streams through the squat detector and writes a
// session summary per recording.

use anyhow::Result;
use squat_detector::replay::{ReplayProcessor, SessionSummary};
use squat_detector::{Config, DetectorSession};
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};

const CONFIG_PATH: &str = "config.yaml";

fn main() -> Result<()> {
    let config = if Path::new(CONFIG_PATH).exists() {
        Config::load(CONFIG_PATH)?
    } else {
        Config::default()
    };

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🏋️ Squat replay starting");
    info!(
        "Thresholds: enter<{:.0}° exit>{:.0}° knee {:.0}-{:.0}° hip {:.0}-{:.0}° depth≥{:.2}",
        config.detection.squat_enter_knee,
        config.detection.stand_exit_knee,
        config.detection.knee_min,
        config.detection.knee_max,
        config.detection.hip_min,
        config.detection.hip_max,
        config.detection.min_hip_depth_ratio
    );

    let processor = ReplayProcessor::new(config.replay.clone());
    let recordings = processor.find_recordings()?;

    if recordings.is_empty() {
        error!("No recordings found in {}", config.replay.input_dir);
        return Ok(());
    }

    for (idx, recording) in recordings.iter().enumerate() {
        info!("========================================");
        info!(
            "Replaying {}/{}: {}",
            idx + 1,
            recordings.len(),
            recording.display()
        );

        match replay_one(&processor, recording, &config) {
            Ok(summary) => log_summary(&summary),
            Err(e) => error!("Failed to replay {}: {:#}", recording.display(), e),
        }
    }

    Ok(())
}

fn replay_one(processor: &ReplayProcessor, recording: &Path, config: &Config) -> Result<SessionSummary> {
    let mut session = DetectorSession::from_config(config);

    let mut frame_log = processor.create_frame_log(recording)?;
    let summary = processor.run(
        recording,
        &mut session,
        frame_log.as_mut().map(|w| w as &mut dyn Write),
    )?;

    if session.dropped_events() > 0 {
        warn!("{} session events dropped", session.dropped_events());
    }

    let path = processor.write_summary(recording, &summary)?;
    info!("Summary written to {}", path.display());
    Ok(summary)
}

fn log_summary(summary: &SessionSummary) {
    info!("========== WORKOUT SUMMARY ==========");
    info!("  Total attempts: {}", summary.total_attempts);
    info!("  ✅ Perfect squats: {}", summary.correct_squats);
    info!("  ❌ Imperfect squats: {}", summary.missed_squats);
    info!(
        "  Accuracy: knee={}% | hip={}% | back={}%",
        summary.accuracy.knee, summary.accuracy.hip, summary.accuracy.back
    );
    info!(
        "  Duration: {:.1}s | Calories: {:.1} kcal",
        summary.duration_seconds, summary.calories
    );
    info!(
        "  Frames: {} ({} without detection, {} malformed lines)",
        summary.frame_count, summary.metrics.frames_without_detection, summary.metrics.malformed_lines
    );
    info!("  Intake: {:.1} µs/frame", summary.metrics.avg_intake_us);
}
