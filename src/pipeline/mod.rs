// src/pipeline/mod.rs

pub mod event_bus;
pub mod metrics;

pub use event_bus::{EventBus, SessionEvent};
pub use metrics::{MetricsSummary, ReplayMetrics};
