// crates/blip3o-config/src/presets.rs
// ============================================================================
// Module: Config Presets
// Description: Factory functions and named preset singletons.
// Purpose: Provide the canonical small/default/large/dual-supervision shapes.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Presets are built lazily on first use and shared read-only afterwards.
//! [`get_preset_config`] resolves a preset identifier and fails with
//! [`ConfigError::UnknownPreset`] listing every valid identifier.
//!
//! Override precedence for [`dual_supervision_config`]: caller overrides win
//! over the dual-supervision parameters, which win over the base record,
//! which wins over the architecture defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::config::ConfigError;
use crate::flow::FlowMatchingConfig;
use crate::flow::PredictionType;
use crate::flow::ScheduleType;
use crate::model::DitConfig;
use crate::model::DitOverrides;
use crate::model::FFN_EXPANSION;
use crate::training::DEFAULT_BEST_MODEL_METRIC;
use crate::training::TrainingConfig;

// ============================================================================
// SECTION: Preset Singletons
// ============================================================================

/// Small architecture for tests and quick experiments.
static BLIP3O_SMALL: LazyLock<DitConfig> = LazyLock::new(DitConfig::small);
/// Default architecture.
static BLIP3O_DEFAULT: LazyLock<DitConfig> = LazyLock::new(DitConfig::default);
/// Large architecture for production runs.
static BLIP3O_LARGE: LazyLock<DitConfig> = LazyLock::new(DitConfig::large);
/// Architecture tuned for dual supervision.
static BLIP3O_DUAL_SUPERVISION: LazyLock<DitConfig> = LazyLock::new(DitConfig::dual_supervision);
/// Flow-matching objective tuned for dual supervision.
static FLOW_MATCHING_DUAL_SUPERVISION: LazyLock<FlowMatchingConfig> =
    LazyLock::new(FlowMatchingConfig::dual_supervision);
/// Flow-matching objective with a cosine schedule.
static FLOW_MATCHING_ENHANCED: LazyLock<FlowMatchingConfig> =
    LazyLock::new(FlowMatchingConfig::enhanced);

// ============================================================================
// SECTION: Preset Identifiers
// ============================================================================

/// Named architecture presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// 512-wide, 8-layer model.
    Small,
    /// 768-wide, 16-layer model.
    Default,
    /// 1024-wide, 24-layer model.
    Large,
    /// Default shape with the dual-supervision adaptation MLP.
    DualSupervision,
}

impl Preset {
    /// Every preset, in canonical order.
    pub const ALL: [Self; 4] = [Self::Small, Self::Default, Self::Large, Self::DualSupervision];

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Default => "default",
            Self::Large => "large",
            Self::DualSupervision => "dual_supervision",
        }
    }

    /// Returns the shared configuration for this preset.
    #[must_use]
    pub fn config(self) -> &'static DitConfig {
        match self {
            Self::Small => LazyLock::force(&BLIP3O_SMALL),
            Self::Default => LazyLock::force(&BLIP3O_DEFAULT),
            Self::Large => LazyLock::force(&BLIP3O_LARGE),
            Self::DualSupervision => LazyLock::force(&BLIP3O_DUAL_SUPERVISION),
        }
    }

    /// Returns the valid identifiers joined by `", "`.
    #[must_use]
    pub fn available() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|preset| preset.as_str() == value).ok_or_else(|| {
            ConfigError::UnknownPreset {
                name: value.to_string(),
                available: Self::available(),
            }
        })
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a preset identifier to its shared configuration.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownPreset`] when `name` is not one of
/// `small`, `default`, `large`, or `dual_supervision`.
pub fn get_preset_config(name: &str) -> Result<&'static DitConfig, ConfigError> {
    Ok(name.parse::<Preset>()?.config())
}

/// Returns the shared dual-supervision flow-matching preset.
#[must_use]
pub fn flow_matching_dual_supervision() -> &'static FlowMatchingConfig {
    LazyLock::force(&FLOW_MATCHING_DUAL_SUPERVISION)
}

/// Returns the shared enhanced flow-matching preset.
#[must_use]
pub fn flow_matching_enhanced() -> &'static FlowMatchingConfig {
    LazyLock::force(&FLOW_MATCHING_ENHANCED)
}

// ============================================================================
// SECTION: Architecture Factories
// ============================================================================

impl DitConfig {
    /// Small architecture for tests and quick experiments.
    #[must_use]
    pub fn small() -> Self {
        Self {
            dim: 512,
            n_layers: 8,
            n_heads: 8,
            n_kv_heads: 8,
            intermediate_size: FFN_EXPANSION * 512,
            mlp_hidden_dim: 1024,
            mlp_num_layers: 2,
            ..Self::default()
        }
    }

    /// Large architecture for production runs.
    #[must_use]
    pub fn large() -> Self {
        Self {
            dim: 1024,
            n_layers: 24,
            n_heads: 16,
            n_kv_heads: 16,
            intermediate_size: FFN_EXPANSION * 1024,
            mlp_hidden_dim: 4096,
            mlp_num_layers: 4,
            ..Self::default()
        }
    }

    /// Default shape with the dual-supervision adaptation MLP.
    #[must_use]
    pub fn dual_supervision() -> Self {
        Self {
            mlp_hidden_dim: 2048,
            mlp_num_layers: 3,
            mlp_dropout: 0.1,
            gradient_checkpointing: true,
            ..Self::default()
        }
    }
}

/// Parameters applied on top of any base for dual-supervision training.
fn dual_supervision_overrides() -> DitOverrides {
    DitOverrides {
        mlp_hidden_dim: Some(2048),
        mlp_num_layers: Some(3),
        mlp_dropout: Some(0.1),
        gradient_checkpointing: Some(true),
        ..DitOverrides::default()
    }
}

/// Builds a dual-supervision architecture from an optional base.
///
/// With a base, every base field is carried over, including its resolved
/// `n_kv_heads` and `intermediate_size`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the merged record fails validation.
pub fn dual_supervision_config(
    base: Option<&DitConfig>,
    overrides: DitOverrides,
) -> Result<DitConfig, ConfigError> {
    let start = base.map(DitOverrides::from).unwrap_or_default();
    DitConfig::new(start.merge(dual_supervision_overrides()).merge(overrides))
}

// ============================================================================
// SECTION: Flow and Training Factories
// ============================================================================

impl FlowMatchingConfig {
    /// Flow-matching objective with a cosine schedule and progressive timesteps.
    #[must_use]
    pub fn enhanced() -> Self {
        Self {
            alignment_loss_weight: 0.1,
            temporal_loss_weight: 0.05,
            use_progressive_training: true,
            schedule_type: ScheduleType::Cosine,
            ..Self::default()
        }
    }

    /// Flow-matching objective tuned for dual supervision.
    #[must_use]
    pub fn dual_supervision() -> Self {
        Self {
            sigma_min: 1e-4,
            sigma_max: 1.0,
            prediction_type: PredictionType::VPrediction,
            schedule_type: ScheduleType::Linear,
            alignment_loss_weight: 0.15,
            temporal_loss_weight: 0.05,
            use_progressive_training: true,
            regularization_weight: 0.01,
            ..Self::default()
        }
    }
}

impl TrainingConfig {
    /// Training run tuned for dual supervision.
    #[must_use]
    pub fn dual_supervision() -> Self {
        Self {
            learning_rate: 5e-5,
            gradient_accumulation_steps: 6,
            global_loss_weight: 2.0,
            patch_loss_weight: 1.0,
            flow_matching_loss_weight: 1.0,
            metric_for_best_model: DEFAULT_BEST_MODEL_METRIC.to_string(),
            ..Self::default()
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
