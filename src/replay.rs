// src/replay.rs
//
// Landmark recordings: one JSON message per line, in the same shape a live
// pose socket delivers them.
//
//   {"type":"frame","landmarks":[{"x":..,"y":..,"z":..,"visibility":..}, ...],"timestamp_ms":1200.0}
//   {"type":"reset"}
//   {"type":"ping"}

use crate::analysis::DetectorSession;
use crate::pipeline::{MetricsSummary, ReplayMetrics};
use crate::types::{FrameAnalysis, Landmark, ReplayConfig, SessionStats};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayMessage {
    Frame {
        landmarks: Vec<Landmark>,
        #[serde(default)]
        timestamp_ms: Option<f64>,
    },
    Reset,
    Ping,
}

pub struct ReplayProcessor {
    config: ReplayConfig,
}

impl ReplayProcessor {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    pub fn find_recordings(&self) -> Result<Vec<PathBuf>> {
        let mut recordings = Vec::new();

        for entry in WalkDir::new(&self.config.input_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_recording = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_recording {
                recordings.push(path.to_path_buf());
            }
        }

        info!("Found {} recording(s)", recordings.len());
        Ok(recordings)
    }

    pub fn open_recording(&self, path: &Path) -> Result<RecordingReader> {
        info!("Opening recording: {}", path.display());
        let file =
            File::open(path).with_context(|| format!("opening recording {}", path.display()))?;
        Ok(RecordingReader {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }

    fn output_path(&self, recording: &Path, suffix: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("creating output dir {}", self.config.output_dir))?;
        let stem = recording
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("recording");
        Ok(Path::new(&self.config.output_dir).join(format!("{}_{}", stem, suffix)))
    }

    pub fn create_frame_log(&self, recording: &Path) -> Result<Option<BufWriter<File>>> {
        if !self.config.write_frame_log {
            return Ok(None);
        }
        let path = self.output_path(recording, "frames.jsonl")?;
        let file = File::create(&path)
            .with_context(|| format!("creating frame log {}", path.display()))?;
        info!("Writing frame log: {}", path.display());
        Ok(Some(BufWriter::new(file)))
    }

    pub fn write_summary(&self, recording: &Path, summary: &SessionSummary) -> Result<PathBuf> {
        let path = self.output_path(recording, "summary.json")?;
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json).with_context(|| format!("writing summary {}", path.display()))?;
        Ok(path)
    }

    /// Feed one recording through `session` and summarize the result.
    pub fn run(
        &self,
        recording: &Path,
        session: &mut DetectorSession,
        frame_log: Option<&mut dyn Write>,
    ) -> Result<SessionSummary> {
        let reader = self.open_recording(recording)?;
        let mut metrics = ReplayMetrics::new();
        let mut frame_log = frame_log;
        let mut first_ts: Option<f64> = None;
        let mut last_ts: Option<f64> = None;

        for (line_no, message) in reader {
            metrics.lines_read += 1;
            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    metrics.malformed_lines += 1;
                    warn!("Skipping line {} of {}: {:#}", line_no, recording.display(), e);
                    continue;
                }
            };

            match message {
                ReplayMessage::Frame {
                    landmarks,
                    timestamp_ms,
                } => {
                    if let Some(ts) = timestamp_ms {
                        first_ts.get_or_insert(ts);
                        last_ts = Some(ts);
                    }

                    let started = Instant::now();
                    let analysis = session.intake(&landmarks);
                    metrics.record_intake(started.elapsed(), analysis.is_detection());

                    let voice_feedback = if session.poll_completion_edge() {
                        metrics.completions += 1;
                        let cue = session.completion_feedback().to_string();
                        info!("🗣️  {}", cue);
                        Some(cue)
                    } else {
                        None
                    };

                    if let Some(log) = frame_log.as_mut() {
                        let entry = FrameLogEntry {
                            frame: metrics.frames,
                            timestamp_ms,
                            analysis: &analysis,
                            squat_count: session.rep_count(),
                            voice_feedback,
                        };
                        serde_json::to_writer(&mut **log, &entry)?;
                        writeln!(log)?;
                    }
                }
                ReplayMessage::Reset => {
                    metrics.resets += 1;
                    session.reset();
                }
                ReplayMessage::Ping => debug!("ping at line {}", line_no),
            }
        }

        if let Some(log) = frame_log.as_mut() {
            log.flush()?;
        }

        let duration_seconds = match (first_ts, last_ts) {
            (Some(first), Some(last)) if last > first => (last - first) / 1000.0,
            _ => metrics.frames as f64 / f64::from(self.config.target_fps.max(1)),
        };

        Ok(SessionSummary::new(
            recording,
            session.session_stats(),
            duration_seconds,
            self.config.kcal_per_squat,
            metrics.summary(),
        ))
    }
}

/// Line-numbered messages from a recording. Blank lines are skipped.
pub struct RecordingReader {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl Iterator for RecordingReader {
    type Item = (usize, Result<ReplayMessage>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let parsed = match line {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => serde_json::from_str(&text).context("parsing message"),
                Err(e) => Err(e).context("reading line"),
            };
            return Some((self.line_no, parsed));
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameLogEntry<'a> {
    frame: u64,
    timestamp_ms: Option<f64>,
    analysis: &'a FrameAnalysis,
    squat_count: u32,
    voice_feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Accuracy {
    pub knee: u32,
    pub hip: u32,
    pub back: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub recording: String,
    pub duration_seconds: f64,
    pub squat_count: u32,
    pub calories: f64,
    pub total_attempts: u32,
    pub correct_squats: u32,
    pub missed_squats: u32,
    pub accuracy: Accuracy,
    pub frame_count: u64,
    pub statistics: SessionStats,
    pub metrics: MetricsSummary,
    pub generated_at: String,
}

impl SessionSummary {
    pub fn new(
        recording: &Path,
        stats: SessionStats,
        duration_seconds: f64,
        kcal_per_squat: f64,
        metrics: MetricsSummary,
    ) -> Self {
        let calories = (f64::from(stats.squat_count) * kcal_per_squat * 10.0).round() / 10.0;
        Self {
            recording: recording.display().to_string(),
            duration_seconds,
            squat_count: stats.squat_count,
            calories,
            total_attempts: stats.total_attempts,
            correct_squats: stats.correct_squats,
            missed_squats: stats.missed_squats,
            accuracy: Accuracy {
                knee: stats.knee_percentage,
                hip: stats.hip_percentage,
                back: stats.back_percentage,
            },
            frame_count: metrics.frames,
            statistics: stats,
            metrics,
            generated_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{ramp, squat_frame};
    use crate::types::{SessionConfig, SquatThresholds};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("squat-replay-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn frame_line(knee: f32, hip: f32, depth: f32, ts: f64) -> String {
        serde_json::to_string(&ReplayMessage::Frame {
            landmarks: squat_frame(knee, hip, depth),
            timestamp_ms: Some(ts),
        })
        .unwrap()
    }

    fn perfect_rep_lines(start_ts: f64) -> Vec<String> {
        let knees = ramp(170.0, 90.0, 8);
        let hips = ramp(150.0, 100.0, 8);
        let depths = ramp(0.75, 0.9, 8);
        let mut idx: Vec<usize> = (0..knees.len()).collect();
        idx.extend((0..knees.len() - 1).rev());
        idx.iter()
            .enumerate()
            .map(|(n, &i)| frame_line(knees[i], hips[i], depths[i], start_ts + n as f64 * 100.0))
            .collect()
    }

    fn session() -> DetectorSession {
        let config = SessionConfig {
            phrase_seed: Some(1),
            ..SessionConfig::default()
        };
        DetectorSession::new(SquatThresholds::default(), config)
    }

    fn processor(dir: &Path) -> ReplayProcessor {
        ReplayProcessor::new(ReplayConfig {
            input_dir: dir.join("in").display().to_string(),
            output_dir: dir.join("out").display().to_string(),
            write_frame_log: true,
            ..ReplayConfig::default()
        })
    }

    #[test]
    fn test_messages_parse() {
        let reset: ReplayMessage = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(reset, ReplayMessage::Reset);

        let frame: ReplayMessage =
            serde_json::from_str(r#"{"type":"frame","landmarks":[{"x":0.1,"y":0.2}]}"#).unwrap();
        match frame {
            ReplayMessage::Frame {
                landmarks,
                timestamp_ms,
            } => {
                assert_eq!(landmarks.len(), 1);
                assert_eq!(landmarks[0].visibility, 0.0);
                assert!(timestamp_ms.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_find_recordings_filters_extension() {
        let dir = scratch_dir("find");
        let input = dir.join("in");
        fs::create_dir_all(input.join("nested")).unwrap();
        fs::write(input.join("a.jsonl"), "").unwrap();
        fs::write(input.join("nested").join("b.JSONL"), "").unwrap();
        fs::write(input.join("notes.txt"), "").unwrap();

        let found = processor(&dir).find_recordings().unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_run_counts_reps_and_skips_bad_lines() {
        let dir = scratch_dir("run");
        fs::create_dir_all(dir.join("in")).unwrap();
        let recording = dir.join("in").join("session.jsonl");

        let mut lines = perfect_rep_lines(0.0);
        lines.insert(3, "{not json".to_string());
        lines.insert(4, String::new());
        lines.push(r#"{"type":"ping"}"#.to_string());
        lines.push(r#"{"type":"frame","landmarks":[]}"#.to_string());
        fs::write(&recording, lines.join("\n")).unwrap();

        let proc = processor(&dir);
        let mut log = Vec::new();
        let mut s = session();
        let summary = proc
            .run(&recording, &mut s, Some(&mut log as &mut dyn Write))
            .unwrap();

        assert_eq!(summary.squat_count, 1);
        assert_eq!(summary.total_attempts, 1);
        assert_eq!(summary.metrics.malformed_lines, 1);
        assert_eq!(summary.metrics.completions, 1);
        assert_eq!(summary.metrics.frames_without_detection, 1);
        assert_eq!(summary.frame_count, 18);
        assert!((summary.duration_seconds - 1.6).abs() < 1e-9);
        assert_eq!(summary.calories, 0.1);

        let logged = String::from_utf8(log).unwrap();
        assert_eq!(logged.lines().count(), 18);
        assert_eq!(
            logged
                .lines()
                .filter(|l| l.contains("\"voice_feedback\":\""))
                .count(),
            1
        );

        let path = proc.write_summary(&recording, &summary).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["statistics"]["squatCount"], 1);
        assert_eq!(written["accuracy"]["knee"], summary.accuracy.knee);
    }

    #[test]
    fn test_reset_message_clears_session() {
        let dir = scratch_dir("reset");
        fs::create_dir_all(dir.join("in")).unwrap();
        let recording = dir.join("in").join("reset.jsonl");

        let mut lines = perfect_rep_lines(0.0);
        lines.push(r#"{"type":"reset"}"#.to_string());
        fs::write(&recording, lines.join("\n")).unwrap();

        let mut s = session();
        let summary = processor(&dir).run(&recording, &mut s, None).unwrap();

        assert_eq!(summary.metrics.resets, 1);
        assert_eq!(summary.squat_count, 0);
        assert_eq!(summary.metrics.completions, 1);
    }

    #[test]
    fn test_duration_falls_back_to_fps() {
        let dir = scratch_dir("fps");
        fs::create_dir_all(dir.join("in")).unwrap();
        let recording = dir.join("in").join("untimed.jsonl");
        let line = serde_json::to_string(&ReplayMessage::Frame {
            landmarks: squat_frame(170.0, 150.0, 0.75),
            timestamp_ms: None,
        })
        .unwrap();
        fs::write(&recording, vec![line; 60].join("\n")).unwrap();

        let mut s = session();
        let summary = processor(&dir).run(&recording, &mut s, None).unwrap();

        assert!((summary.duration_seconds - 2.0).abs() < 1e-9);
    }
}
