//! Prometheus text rendering of probe outcomes

use crate::probe::ProbeOutcome;
use std::fmt::{Display, Write};

/// Prometheus metrics in text format
#[derive(Debug, Clone, Default)]
pub struct PrometheusMetrics {
    /// Metrics content in Prometheus text format
    pub content: String,
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a gauge
    pub fn add_gauge(&mut self, name: &str, value: impl Display, help: &str) {
        self.add_header(name, "gauge", help);
        let _ = writeln!(self.content, "{} {}", name, value);
    }

    fn add_header(&mut self, name: &str, kind: &str, help: &str) {
        let _ = writeln!(self.content, "# HELP {} {}", name, help);
        let _ = writeln!(self.content, "# TYPE {} {}", name, kind);
    }
}

/// The gauges a single probe scrape exposes
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeMetrics {
    pub success: bool,
    pub response_code: u8,
    pub duration_seconds: f64,
}

impl ProbeMetrics {
    pub fn from_outcome(outcome: &ProbeOutcome) -> Self {
        ProbeMetrics {
            success: outcome.success,
            response_code: outcome.response_code_value(),
            duration_seconds: outcome.duration.as_secs_f64(),
        }
    }

    /// Render all three gauges, whether or not the probe succeeded
    pub fn render(&self) -> String {
        let mut metrics = PrometheusMetrics::new();
        metrics.add_gauge(
            "radius_success",
            u8::from(self.success),
            "Displays whether or not the probe was a success",
        );
        metrics.add_gauge(
            "radius_response_code",
            self.response_code,
            "RADIUS response code of the probe, 0 when no response",
        );
        metrics.add_gauge(
            "radius_scrape_duration_seconds",
            self.duration_seconds,
            "Returns how long the probe took to complete in seconds",
        );
        metrics.content
    }
}
