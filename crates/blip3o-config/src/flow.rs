// crates/blip3o-config/src/flow.rs
// ============================================================================
// Module: Flow-Matching Configuration
// Description: Noise schedule, prediction target, and loss weights.
// Purpose: Validate the flow-matching objective consumed by the loss.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`FlowMatchingConfig`] carries the noise-schedule bounds, the prediction
//! target, the auxiliary loss weights, and the progressive timestep window.
//! Records are plain structs built with struct-update syntax or decoded from
//! the `[flow]` table and then validated explicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;
use crate::config::require_non_negative_finite;
use crate::config::require_positive;
use crate::config::unknown_variant;
use crate::model::CLIP_EMBEDDING_DIM;
use crate::model::EVA_EMBEDDING_DIM;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Upper bound accepted for `sigma_max`.
pub const MAX_SIGMA: f64 = 10.0;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Quantity the transformer is trained to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    /// Velocity field between noise and data.
    #[default]
    VPrediction,
    /// Injected noise.
    Epsilon,
}

impl PredictionType {
    /// Every supported prediction target, in canonical order.
    pub const ALL: [Self; 2] = [Self::VPrediction, Self::Epsilon];

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VPrediction => "v_prediction",
            Self::Epsilon => "epsilon",
        }
    }
}

impl FromStr for PredictionType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| unknown_variant("flow.prediction_type", value, &Self::ALL.map(Self::as_str)))
    }
}

impl fmt::Display for PredictionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the noise schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Linear interpolation between noise and data.
    #[default]
    Linear,
    /// Cosine schedule.
    Cosine,
    /// Sigmoid schedule.
    Sigmoid,
}

impl ScheduleType {
    /// Every supported schedule, in canonical order.
    pub const ALL: [Self; 3] = [Self::Linear, Self::Cosine, Self::Sigmoid];

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Cosine => "cosine",
            Self::Sigmoid => "sigmoid",
        }
    }
}

impl FromStr for ScheduleType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| unknown_variant("flow.schedule_type", value, &Self::ALL.map(Self::as_str)))
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Flow-matching loss configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowMatchingConfig {
    /// Minimum noise level.
    pub sigma_min: f64,
    /// Maximum noise level.
    pub sigma_max: f64,
    /// Prediction target.
    pub prediction_type: PredictionType,
    /// Noise schedule shape.
    pub schedule_type: ScheduleType,
    /// CLIP embedding width of the target features.
    pub clip_dim: usize,
    /// EVA-CLIP embedding width of the conditioning features.
    pub eva_dim: usize,
    /// Regularization loss weight.
    pub regularization_weight: f64,
    /// Alignment loss weight.
    pub alignment_loss_weight: f64,
    /// Temporal consistency loss weight.
    pub temporal_loss_weight: f64,
    /// Progressive timestep training toggle.
    pub use_progressive_training: bool,
    /// Lower bound of the sampled timestep window.
    pub min_timestep: f64,
    /// Upper bound of the sampled timestep window.
    pub max_timestep: f64,
}

impl Default for FlowMatchingConfig {
    fn default() -> Self {
        Self {
            sigma_min: 1e-4,
            sigma_max: 1.0,
            prediction_type: PredictionType::VPrediction,
            schedule_type: ScheduleType::Linear,
            clip_dim: CLIP_EMBEDDING_DIM,
            eva_dim: EVA_EMBEDDING_DIM,
            regularization_weight: 0.01,
            alignment_loss_weight: 0.1,
            temporal_loss_weight: 0.05,
            use_progressive_training: true,
            min_timestep: 0.001,
            max_timestep: 0.999,
        }
    }
}

impl FlowMatchingConfig {
    /// Validates the flow-matching record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0 <= self.sigma_min && self.sigma_min < self.sigma_max && self.sigma_max <= MAX_SIGMA)
        {
            return Err(ConfigError::Invalid(format!(
                "flow sigma range [{}, {}] must satisfy 0 <= sigma_min < sigma_max <= {MAX_SIGMA}",
                self.sigma_min, self.sigma_max
            )));
        }
        require_positive("flow.clip_dim", self.clip_dim)?;
        require_positive("flow.eva_dim", self.eva_dim)?;
        if !(0.0 <= self.min_timestep
            && self.min_timestep < self.max_timestep
            && self.max_timestep <= 1.0)
        {
            return Err(ConfigError::Invalid(format!(
                "flow timestep range [{}, {}] must satisfy 0 <= min_timestep < max_timestep <= 1",
                self.min_timestep, self.max_timestep
            )));
        }
        require_non_negative_finite("flow.regularization_weight", self.regularization_weight)?;
        require_non_negative_finite("flow.alignment_loss_weight", self.alignment_loss_weight)?;
        require_non_negative_finite("flow.temporal_loss_weight", self.temporal_loss_weight)?;
        Ok(())
    }

    /// Validates and returns the record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first violated invariant.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}

impl fmt::Display for FlowMatchingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.prediction_type, self.schedule_type)
    }
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
    fn default_config_passes_validation() {
        assert!(FlowMatchingConfig::default().validate().is_ok());
    }

    #[test]
    fn sigma_min_must_be_below_sigma_max() {
        let config = FlowMatchingConfig { sigma_min: 1.0, sigma_max: 1.0, ..FlowMatchingConfig::default() };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[1, 1]"));
    }

    #[test]
    fn sigma_bounds_are_enforced() {
        let negative = FlowMatchingConfig { sigma_min: -0.1, ..FlowMatchingConfig::default() };
        assert!(negative.validate().is_err());
        let too_large = FlowMatchingConfig { sigma_max: 10.5, ..FlowMatchingConfig::default() };
        assert!(too_large.validate().is_err());
        let at_limit = FlowMatchingConfig { sigma_max: MAX_SIGMA, ..FlowMatchingConfig::default() };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn nan_sigma_is_rejected() {
        let config = FlowMatchingConfig { sigma_min: f64::NAN, ..FlowMatchingConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn timestep_window_must_be_ordered() {
        let config = FlowMatchingConfig {
            min_timestep: 0.9,
            max_timestep: 0.1,
            ..FlowMatchingConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timestep range"));
    }

    #[test]
    fn timestep_window_is_checked_without_progressive_training() {
        let config = FlowMatchingConfig {
            use_progressive_training: false,
            max_timestep: 1.5,
            ..FlowMatchingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn full_unit_timestep_window_is_accepted() {
        let config = FlowMatchingConfig {
            min_timestep: 0.0,
            max_timestep: 1.0,
            ..FlowMatchingConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_dims_are_rejected() {
        let clip = FlowMatchingConfig { clip_dim: 0, ..FlowMatchingConfig::default() };
        assert!(clip.validate().unwrap_err().to_string().contains("flow.clip_dim"));
        let eva = FlowMatchingConfig { eva_dim: 0, ..FlowMatchingConfig::default() };
        assert!(eva.validate().unwrap_err().to_string().contains("flow.eva_dim"));
    }

    #[test]
    fn negative_loss_weight_is_rejected() {
        let config =
            FlowMatchingConfig { alignment_loss_weight: -0.1, ..FlowMatchingConfig::default() };
        assert!(config.validate().unwrap_err().to_string().contains("alignment_loss_weight"));
    }

    #[test]
    fn categorical_fields_parse_and_reject() {
        assert_eq!("epsilon".parse::<PredictionType>().unwrap(), PredictionType::Epsilon);
        assert_eq!("sigmoid".parse::<ScheduleType>().unwrap(), ScheduleType::Sigmoid);
        let err = "x_prediction".parse::<PredictionType>().unwrap_err();
        assert!(err.to_string().contains("v_prediction, epsilon"));
        let err = "exponential".parse::<ScheduleType>().unwrap_err();
        assert!(err.to_string().contains("linear, cosine, sigmoid"));
    }

    #[test]
    fn validated_returns_record_unchanged() {
        let config = FlowMatchingConfig::default();
        assert_eq!(config.clone().validated().unwrap(), config);
    }

    #[test]
    fn display_summarizes_objective() {
        assert_eq!(FlowMatchingConfig::default().to_string(), "v_prediction, linear");
    }
}
