// crates/blip3o-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for blip3o-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Mutex;

use blip3o_config::ConfigError;
use blip3o_config::ConfigEvent;
use blip3o_config::ConfigEventSink;
use blip3o_config::RunConfig;

/// Result alias used by integration tests.
pub type TestResult = Result<(), String>;

/// Decodes and validates a run configuration for tests.
pub fn run_config_from_toml(toml_str: &str) -> Result<RunConfig, ConfigError> {
    RunConfig::from_toml_str(toml_str)
}

/// Asserts that a result failed with an error message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Ok(_) => Err(format!("expected error containing '{needle}'")),
        Err(err) => {
            let message = err.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
    }
}

/// Event sink that keeps every recorded event in memory.
#[derive(Default)]
pub struct CollectingSink {
    /// Events recorded so far.
    events: Mutex<Vec<ConfigEvent>>,
}

impl CollectingSink {
    /// Returns a snapshot of the recorded events.
    pub fn events(&self) -> Vec<ConfigEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl ConfigEventSink for CollectingSink {
    fn record(&self, event: &ConfigEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
