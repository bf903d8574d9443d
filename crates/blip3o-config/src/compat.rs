// crates/blip3o-config/src/compat.rs
// ============================================================================
// Module: Config Compatibility
// Description: Cross-record checks between the model and flow-matching configs.
// Purpose: Reject model/objective pairs that disagree on feature widths.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The transformer consumes CLIP features of width `in_channels` and is
//! conditioned on EVA-CLIP features of width `eva_embedding_size`; the
//! flow-matching loss must agree on both widths and the model must not learn
//! its noise variance. The first mismatch fails with both values quoted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::config::ConfigError;
use crate::flow::FlowMatchingConfig;
use crate::model::DitConfig;
use crate::report::ConfigEvent;
use crate::report::ConfigEventParams;
use crate::report::ConfigEventSink;
use crate::report::ConfigOutcome;
use crate::report::StderrEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Event identifier for compatibility checks.
const COMPATIBILITY_EVENT: &str = "config_compatibility";

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Validates model/flow compatibility and reports the outcome to stderr.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] on the first incompatible pair.
pub fn validate_config_compatibility(
    model: &DitConfig,
    flow: &FlowMatchingConfig,
) -> Result<(), ConfigError> {
    validate_config_compatibility_with(model, flow, &StderrEventSink)
}

/// Validates model/flow compatibility and reports the outcome to `sink`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] on the first incompatible pair.
pub fn validate_config_compatibility_with(
    model: &DitConfig,
    flow: &FlowMatchingConfig,
    sink: &dyn ConfigEventSink,
) -> Result<(), ConfigError> {
    let result = check_compatibility(model, flow);
    let (outcome, message) = match &result {
        Ok(()) => (ConfigOutcome::Validated, "configuration compatibility validated".to_string()),
        Err(err) => (ConfigOutcome::Rejected, err.to_string()),
    };
    sink.record(&ConfigEvent::new(ConfigEventParams {
        event: COMPATIBILITY_EVENT,
        outcome,
        message,
        model: model.to_string(),
        flow: flow.to_string(),
    }));
    result
}

/// Compares the records without reporting.
pub(crate) fn check_compatibility(
    model: &DitConfig,
    flow: &FlowMatchingConfig,
) -> Result<(), ConfigError> {
    if model.in_channels != flow.clip_dim {
        return Err(ConfigError::Invalid(format!(
            "model.in_channels ({}) must match flow.clip_dim ({})",
            model.in_channels, flow.clip_dim
        )));
    }
    if model.eva_embedding_size != flow.eva_dim {
        return Err(ConfigError::Invalid(format!(
            "model.eva_embedding_size ({}) must match flow.eva_dim ({})",
            model.eva_embedding_size, flow.eva_dim
        )));
    }
    if model.learn_sigma {
        return Err(ConfigError::Invalid(
            "model must use flow matching (learn_sigma=false)".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
