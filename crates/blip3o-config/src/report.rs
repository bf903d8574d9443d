// crates/blip3o-config/src/report.rs
// ============================================================================
// Module: Config Validation Events
// Description: Structured status events for configuration checks.
// Purpose: Emit validation outcomes without hard logging dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Validation outcomes are reported as JSON-serializable [`ConfigEvent`]
//! payloads routed through a [`ConfigEventSink`]. The stderr sink writes one
//! JSON line per event so callers can pipe it into their own log pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of a configuration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOutcome {
    /// Check passed.
    Validated,
    /// Check failed.
    Rejected,
}

/// Configuration check event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Check outcome.
    pub outcome: ConfigOutcome,
    /// Human-readable status message.
    pub message: String,
    /// Model summary (`dim`, layers, heads).
    pub model: String,
    /// Flow-matching summary (prediction and schedule).
    pub flow: String,
}

/// Inputs required to construct a config event.
pub struct ConfigEventParams {
    /// Event identifier.
    pub event: &'static str,
    /// Check outcome.
    pub outcome: ConfigOutcome,
    /// Human-readable status message.
    pub message: String,
    /// Model summary.
    pub model: String,
    /// Flow-matching summary.
    pub flow: String,
}

impl ConfigEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(params: ConfigEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: params.event,
            timestamp_ms,
            outcome: params.outcome,
            message: params.message,
            model: params.model,
            flow: params.flow,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for configuration check events.
pub trait ConfigEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &ConfigEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl ConfigEventSink for StderrEventSink {
    fn record(&self, event: &ConfigEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl ConfigEventSink for NoopEventSink {
    fn record(&self, _event: &ConfigEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
