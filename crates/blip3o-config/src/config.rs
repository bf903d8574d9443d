// crates/blip3o-config/src/config.rs
// ============================================================================
// Module: BLIP3-o Run Configuration
// Description: Run-level config document, errors, and shared validators.
// Purpose: Decode in-memory TOML documents into validated config records.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! A run configuration bundles the three records needed to train the BLIP3-o
//! DiT: `[model]`, `[flow]`, and `[training]`. Documents are decoded from
//! in-memory TOML; the `[model]` section may name a base preset which the
//! remaining keys override. Every record is validated and the model and flow
//! records are checked for compatibility before a [`RunConfig`] is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use thiserror::Error;

use crate::compat::check_compatibility;
use crate::flow::FlowMatchingConfig;
use crate::model::DitConfig;
use crate::model::DitOverrides;
use crate::presets::get_preset_config;
use crate::training::TrainingConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Key in the `[model]` section selecting a base preset.
pub(crate) const MODEL_PRESET_KEY: &str = "preset";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Fully resolved and validated BLIP3-o run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Diffusion transformer architecture.
    pub model: DitConfig,
    /// Flow-matching objective.
    pub flow: FlowMatchingConfig,
    /// Training hyperparameters.
    pub training: TrainingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: DitConfig::default(),
            flow: FlowMatchingConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Decodes and validates a run configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document cannot be decoded,
    /// [`ConfigError::UnknownPreset`] when `model.preset` is unrecognized,
    /// and [`ConfigError::Invalid`] when any record fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let document: RunConfigDocument =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let config = Self {
            model: resolve_model_section(document.model)?,
            flow: document.flow,
            training: document.training,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates every record and the model/flow compatibility.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()?;
        self.flow.validate()?;
        self.training.validate()?;
        check_compatibility(&self.model, &self.flow)
    }
}

/// Raw TOML document prior to preset resolution.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RunConfigDocument {
    /// Model section; kept as a table so the preset key can be split off.
    model: toml::Table,
    /// Flow-matching section.
    flow: FlowMatchingConfig,
    /// Training section.
    training: TrainingConfig,
}

/// Resolves the `[model]` section into a validated architecture record.
fn resolve_model_section(mut section: toml::Table) -> Result<DitConfig, ConfigError> {
    let base = match section.remove(MODEL_PRESET_KEY) {
        None => None,
        Some(toml::Value::String(name)) => Some(get_preset_config(&name)?),
        Some(_) => {
            return Err(ConfigError::Invalid("model.preset must be a string".to_string()));
        }
    };
    let overrides: DitOverrides = toml::Value::Table(section)
        .try_into()
        .map_err(|err| ConfigError::Parse(format!("model: {err}")))?;
    let start = base.map(DitOverrides::from).unwrap_or_default();
    DitConfig::new(start.merge(overrides))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration decoding or validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Preset lookup with an unrecognized identifier.
    #[error("unknown preset '{name}'; available: {available}")]
    UnknownPreset {
        /// Identifier supplied by the caller.
        name: String,
        /// Comma-separated list of valid identifiers.
        available: String,
    },
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Requires a size or count field to be strictly positive.
pub(crate) fn require_positive(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be positive (got {value})")));
    }
    Ok(())
}

/// Requires a rate to lie within `[0, 1]`.
pub(crate) fn require_unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0 ..= 1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!("{field} must be between 0 and 1 (got {value})")));
    }
    Ok(())
}

/// Requires a float to be finite and strictly positive.
pub(crate) fn require_positive_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{field} must be a finite positive number (got {value})"
        )));
    }
    Ok(())
}

/// Requires a float to be finite and non-negative.
pub(crate) fn require_non_negative_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{field} must be a finite non-negative number (got {value})"
        )));
    }
    Ok(())
}

/// Requires a field to equal the value fixed by the upstream feature extractor.
pub(crate) fn require_pinned(
    field: &str,
    value: usize,
    expected: usize,
    reason: &str,
) -> Result<(), ConfigError> {
    if value != expected {
        return Err(ConfigError::Invalid(format!(
            "{field} must be {expected} ({reason}); got {value}"
        )));
    }
    Ok(())
}

/// Builds the error for a categorical value outside its enumeration.
pub(crate) fn unknown_variant(field: &str, value: &str, allowed: &[&str]) -> ConfigError {
    ConfigError::Invalid(format!(
        "unknown {field} '{value}' (expected one of: {})",
        allowed.join(", ")
    ))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn require_positive_rejects_zero() {
        let err = require_positive("model.dim", 0).unwrap_err();
        assert!(err.to_string().contains("model.dim"));
        assert!(require_positive("model.dim", 1).is_ok());
    }

    #[test]
    fn require_unit_interval_accepts_exact_boundaries() {
        assert!(require_unit_interval("rate", 0.0).is_ok());
        assert!(require_unit_interval("rate", 1.0).is_ok());
        assert!(require_unit_interval("rate", -0.000_1).is_err());
        assert!(require_unit_interval("rate", 1.000_1).is_err());
        assert!(require_unit_interval("rate", f64::NAN).is_err());
    }

    #[test]
    fn require_positive_finite_rejects_non_finite() {
        assert!(require_positive_finite("eps", f64::INFINITY).is_err());
        assert!(require_positive_finite("eps", f64::NAN).is_err());
        assert!(require_positive_finite("eps", 0.0).is_err());
        assert!(require_positive_finite("eps", 1e-12).is_ok());
    }

    #[test]
    fn require_non_negative_finite_accepts_zero() {
        assert!(require_non_negative_finite("weight", 0.0).is_ok());
        assert!(require_non_negative_finite("weight", -1e-9).is_err());
    }

    #[test]
    fn require_pinned_reports_expected_and_actual() {
        let err = require_pinned("model.in_channels", 768, 1024, "CLIP width").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1024"));
        assert!(message.contains("768"));
    }

    #[test]
    fn unknown_variant_lists_allowed_values() {
        let err = unknown_variant("mlp_activation", "tanh", &["gelu", "relu", "silu"]);
        assert_eq!(
            err.to_string(),
            "invalid config: unknown mlp_activation 'tanh' (expected one of: gelu, relu, silu)"
        );
    }

    #[test]
    fn empty_document_resolves_to_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn non_string_preset_is_rejected() {
        let err = RunConfig::from_toml_str("[model]\npreset = 3\n").unwrap_err();
        assert!(err.to_string().contains("model.preset must be a string"));
    }
}
