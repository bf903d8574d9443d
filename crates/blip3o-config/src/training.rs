// crates/blip3o-config/src/training.rs
// ============================================================================
// Module: Training Configuration
// Description: Optimizer, scheduler, batching, and loss-weight settings.
// Purpose: Validate the training-run record handed to the trainer.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`TrainingConfig`] mirrors the trainer arguments used for BLIP3-o dual
//! supervision runs, plus the patch / global / flow-matching loss weights.

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
use crate::config::require_positive_finite;
use crate::config::require_unit_interval;
use crate::config::unknown_variant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Metric used to select the best checkpoint by default.
pub const DEFAULT_BEST_MODEL_METRIC: &str = "eval_global_cosine_mean";

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Learning-rate scheduler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LrSchedulerType {
    /// Linear decay after warmup.
    Linear,
    /// Cosine decay after warmup.
    #[default]
    Cosine,
    /// Cosine decay with hard restarts.
    CosineWithRestarts,
    /// Polynomial decay.
    Polynomial,
    /// Constant rate.
    Constant,
    /// Constant rate after warmup.
    ConstantWithWarmup,
}

impl LrSchedulerType {
    /// Every supported scheduler, in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Linear,
        Self::Cosine,
        Self::CosineWithRestarts,
        Self::Polynomial,
        Self::Constant,
        Self::ConstantWithWarmup,
    ];

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Cosine => "cosine",
            Self::CosineWithRestarts => "cosine_with_restarts",
            Self::Polynomial => "polynomial",
            Self::Constant => "constant",
            Self::ConstantWithWarmup => "constant_with_warmup",
        }
    }
}

impl FromStr for LrSchedulerType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value).ok_or_else(|| {
            unknown_variant("training.lr_scheduler_type", value, &Self::ALL.map(Self::as_str))
        })
    }
}

impl fmt::Display for LrSchedulerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Training-run hyperparameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools, reason = "Mirrors the trainer's flag-style arguments.")]
pub struct TrainingConfig {
    /// Number of training epochs.
    pub num_train_epochs: usize,
    /// Per-device training batch size.
    pub per_device_train_batch_size: usize,
    /// Per-device evaluation batch size.
    pub per_device_eval_batch_size: usize,
    /// Peak learning rate.
    pub learning_rate: f64,
    /// Decoupled weight decay.
    pub weight_decay: f64,
    /// Learning-rate scheduler.
    pub lr_scheduler_type: LrSchedulerType,
    /// Fraction of steps spent warming up.
    pub warmup_ratio: f64,
    /// Absolute warmup steps.
    pub warmup_steps: usize,
    /// Micro-batches accumulated per optimizer step.
    pub gradient_accumulation_steps: usize,
    /// Gradient clipping norm.
    pub max_grad_norm: f64,
    /// Half-precision training.
    pub fp16: bool,
    /// Bfloat16 training.
    pub bf16: bool,
    /// Steps between log records.
    pub logging_steps: usize,
    /// Steps between evaluations.
    pub eval_steps: usize,
    /// Steps between checkpoints.
    pub save_steps: usize,
    /// Data loader worker count.
    pub dataloader_num_workers: usize,
    /// Pin host memory in the data loader.
    pub dataloader_pin_memory: bool,
    /// Drop dataset columns unused by the model.
    pub remove_unused_columns: bool,
    /// Reload the best checkpoint once training ends.
    pub load_best_model_at_end: bool,
    /// Metric used to rank checkpoints.
    pub metric_for_best_model: String,
    /// Whether larger metric values are better.
    pub greater_is_better: bool,
    /// Patch-level (token) supervision weight.
    pub patch_loss_weight: f64,
    /// Global (pooled) supervision weight.
    pub global_loss_weight: f64,
    /// Flow-matching loss weight.
    pub flow_matching_loss_weight: f64,
    /// Use cosine similarity for the supervision losses.
    pub use_cosine_similarity: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_train_epochs: 8,
            per_device_train_batch_size: 6,
            per_device_eval_batch_size: 4,
            learning_rate: 5e-5,
            weight_decay: 0.01,
            lr_scheduler_type: LrSchedulerType::Cosine,
            warmup_ratio: 0.05,
            warmup_steps: 100,
            gradient_accumulation_steps: 6,
            max_grad_norm: 1.0,
            fp16: true,
            bf16: false,
            logging_steps: 50,
            eval_steps: 250,
            save_steps: 500,
            dataloader_num_workers: 4,
            dataloader_pin_memory: true,
            remove_unused_columns: false,
            load_best_model_at_end: true,
            metric_for_best_model: DEFAULT_BEST_MODEL_METRIC.to_string(),
            greater_is_better: true,
            patch_loss_weight: 1.0,
            global_loss_weight: 2.0,
            flow_matching_loss_weight: 1.0,
            use_cosine_similarity: false,
        }
    }
}

impl TrainingConfig {
    /// Validates the training record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("training.num_train_epochs", self.num_train_epochs)?;
        require_positive("training.per_device_train_batch_size", self.per_device_train_batch_size)?;
        require_positive("training.per_device_eval_batch_size", self.per_device_eval_batch_size)?;
        require_positive_finite("training.learning_rate", self.learning_rate)?;
        require_unit_interval("training.weight_decay", self.weight_decay)?;
        require_positive("training.gradient_accumulation_steps", self.gradient_accumulation_steps)?;

        require_unit_interval("training.warmup_ratio", self.warmup_ratio)?;
        require_positive_finite("training.max_grad_norm", self.max_grad_norm)?;
        if self.fp16 && self.bf16 {
            return Err(ConfigError::Invalid(
                "training.fp16 and training.bf16 are mutually exclusive".to_string(),
            ));
        }
        require_positive("training.logging_steps", self.logging_steps)?;
        require_positive("training.eval_steps", self.eval_steps)?;
        require_positive("training.save_steps", self.save_steps)?;
        if self.metric_for_best_model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "training.metric_for_best_model must be non-empty".to_string(),
            ));
        }
        require_non_negative_finite("training.patch_loss_weight", self.patch_loss_weight)?;
        require_non_negative_finite("training.global_loss_weight", self.global_loss_weight)?;
        require_non_negative_finite(
            "training.flow_matching_loss_weight",
            self.flow_matching_loss_weight,
        )?;
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

    /// Returns the number of samples consumed per optimizer step on one device.
    #[must_use]
    pub const fn effective_batch_size(&self) -> usize {
        self.per_device_train_batch_size.saturating_mul(self.gradient_accumulation_steps)
    }
}

impl fmt::Display for TrainingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} LR, {} epochs", self.learning_rate, self.num_train_epochs)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
