// src/pipeline/metrics.rs
//
// Counters and timing for one replayed recording.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ReplayMetrics {
    pub lines_read: u64,
    pub frames: u64,
    pub frames_without_detection: u64,
    pub malformed_lines: u64,
    pub resets: u64,
    pub completions: u64,
    intake_time: Duration,
    pub started_at: Instant,
}

impl ReplayMetrics {
    pub fn new() -> Self {
        Self {
            lines_read: 0,
            frames: 0,
            frames_without_detection: 0,
            malformed_lines: 0,
            resets: 0,
            completions: 0,
            intake_time: Duration::ZERO,
            started_at: Instant::now(),
        }
    }

    pub fn record_intake(&mut self, elapsed: Duration, detected: bool) {
        self.frames += 1;
        self.intake_time += elapsed;
        if !detected {
            self.frames_without_detection += 1;
        }
    }

    pub fn avg_intake_us(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.intake_time.as_secs_f64() * 1e6 / self.frames as f64
    }

    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            lines_read: self.lines_read,
            frames: self.frames,
            frames_without_detection: self.frames_without_detection,
            malformed_lines: self.malformed_lines,
            resets: self.resets,
            completions: self.completions,
            avg_intake_us: self.avg_intake_us(),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for ReplayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub lines_read: u64,
    pub frames: u64,
    pub frames_without_detection: u64,
    pub malformed_lines: u64,
    pub resets: u64,
    pub completions: u64,
    pub avg_intake_us: f64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
