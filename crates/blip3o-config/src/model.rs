// crates/blip3o-config/src/model.rs
// ============================================================================
// Module: DiT Architecture Configuration
// Description: Transformer shape, attention, and adaptation-MLP settings.
// Purpose: Construct and validate the BLIP3-o diffusion transformer record.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`DitConfig`] describes the shape of the BLIP3-o diffusion transformer.
//! Construction goes through [`DitConfig::new`], which applies a
//! [`DitOverrides`] map onto the defaults, derives the dependent fields, and
//! validates the result. The input-side widths are pinned to the upstream
//! CLIP / EVA-CLIP feature extractors and are checked against named
//! constants rather than hidden from callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;
use crate::config::require_non_negative_finite;
use crate::config::require_pinned;
use crate::config::require_positive;
use crate::config::require_positive_finite;
use crate::config::require_unit_interval;
use crate::config::unknown_variant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Token grid side length (16 x 16 = 256 tokens).
pub const GRID_SIZE: usize = 16;
/// Patch size; features arrive pre-tokenized.
pub const PATCH_SIZE: usize = 1;
/// CLIP embedding width fed to the transformer.
pub const CLIP_EMBEDDING_DIM: usize = 1024;
/// EVA-CLIP conditioning width injected via cross-attention.
pub const EVA_EMBEDDING_DIM: usize = 4096;
/// Feed-forward expansion factor applied when `intermediate_size` is unset.
pub const FFN_EXPANSION: usize = 4;

/// Default hidden dimension.
const DEFAULT_DIM: usize = 768;
/// Default attention head count.
const DEFAULT_N_HEADS: usize = 12;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Activation used by the global adaptation MLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MlpActivation {
    /// Gaussian error linear unit.
    #[default]
    Gelu,
    /// Rectified linear unit.
    Relu,
    /// Sigmoid linear unit.
    Silu,
}

impl MlpActivation {
    /// Every supported activation, in canonical order.
    pub const ALL: [Self; 3] = [Self::Gelu, Self::Relu, Self::Silu];

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gelu => "gelu",
            Self::Relu => "relu",
            Self::Silu => "silu",
        }
    }
}

impl FromStr for MlpActivation {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|activation| activation.as_str() == value)
            .ok_or_else(|| {
                unknown_variant("model.mlp_activation", value, &Self::ALL.map(Self::as_str))
            })
    }
}

impl fmt::Display for MlpActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RoPE scaling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RopeScalingKind {
    /// Positions are divided by the scaling factor.
    Linear,
    /// NTK-aware scaling that adapts to the sequence length.
    Dynamic,
}

impl RopeScalingKind {
    /// Every supported scaling strategy, in canonical order.
    pub const ALL: [Self; 2] = [Self::Linear, Self::Dynamic];

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Dynamic => "dynamic",
        }
    }
}

/// RoPE scaling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RopeScaling {
    /// Scaling strategy.
    #[serde(rename = "type")]
    pub kind: RopeScalingKind,
    /// Context extension factor; must be at least 1.
    pub factor: f64,
}

impl RopeScaling {
    /// Validates the scaling factor.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "model.rope_scaling.factor must be finite and >= 1 (got {})",
                self.factor
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// BLIP3-o diffusion transformer architecture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DitConfig {
    /// Token grid side length.
    pub input_size: usize,
    /// Patch size.
    pub patch_size: usize,
    /// CLIP embedding width.
    pub in_channels: usize,
    /// Hidden dimension.
    pub dim: usize,
    /// Transformer layer count.
    pub n_layers: usize,
    /// Attention head count.
    pub n_heads: usize,
    /// Key-value head count (defaults to `n_heads`).
    pub n_kv_heads: usize,
    /// Query-key normalization.
    pub qk_norm: bool,
    /// Layer norm epsilon.
    pub norm_eps: f64,
    /// EVA-CLIP conditioning width.
    pub eva_embedding_size: usize,
    /// Hidden width of the global adaptation MLP.
    pub mlp_hidden_dim: usize,
    /// Layer count of the global adaptation MLP.
    pub mlp_num_layers: usize,
    /// Dropout of the global adaptation MLP.
    pub mlp_dropout: f64,
    /// Activation of the global adaptation MLP.
    pub mlp_activation: MlpActivation,
    /// Whether the noise variance is learned; always false under flow matching.
    pub learn_sigma: bool,
    /// Gradient checkpointing toggle.
    pub gradient_checkpointing: bool,
    /// RoPE base frequency.
    pub rope_base: f64,
    /// Optional RoPE scaling.
    pub rope_scaling: Option<RopeScaling>,
    /// Standard deviation for weight initialization.
    pub initializer_range: f64,
    /// Flash attention toggle.
    pub use_flash_attention: bool,
    /// Attention dropout.
    pub attention_dropout: f64,
    /// Feed-forward width (defaults to `4 * dim`).
    pub intermediate_size: usize,
    /// Hidden-layer dropout.
    pub hidden_dropout: f64,
    /// Maximum sequence length.
    pub max_position_embeddings: usize,
}

impl Default for DitConfig {
    fn default() -> Self {
        Self {
            input_size: GRID_SIZE,
            patch_size: PATCH_SIZE,
            in_channels: CLIP_EMBEDDING_DIM,
            dim: DEFAULT_DIM,
            n_layers: 16,
            n_heads: DEFAULT_N_HEADS,
            n_kv_heads: DEFAULT_N_HEADS,
            qk_norm: true,
            norm_eps: 1e-5,
            eva_embedding_size: EVA_EMBEDDING_DIM,
            mlp_hidden_dim: 2048,
            mlp_num_layers: 3,
            mlp_dropout: 0.1,
            mlp_activation: MlpActivation::Gelu,
            learn_sigma: false,
            gradient_checkpointing: true,
            rope_base: 10_000.0,
            rope_scaling: None,
            initializer_range: 0.02,
            use_flash_attention: false,
            attention_dropout: 0.0,
            intermediate_size: FFN_EXPANSION * DEFAULT_DIM,
            hidden_dropout: 0.0,
            max_position_embeddings: 1024,
        }
    }
}

impl DitConfig {
    /// Builds a configuration by applying `overrides` onto the defaults.
    ///
    /// Unset `n_kv_heads` follows `n_heads`; unset `intermediate_size` is
    /// `4 * dim`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first violated invariant.
    pub fn new(overrides: DitOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let dim = overrides.dim.unwrap_or(defaults.dim);
        let n_heads = overrides.n_heads.unwrap_or(defaults.n_heads);
        let intermediate_size = match overrides.intermediate_size {
            Some(size) => size,
            None => dim.checked_mul(FFN_EXPANSION).ok_or_else(|| {
                ConfigError::Invalid(format!("model.dim ({dim}) too large to derive intermediate_size"))
            })?,
        };
        let config = Self {
            input_size: overrides.input_size.unwrap_or(defaults.input_size),
            patch_size: overrides.patch_size.unwrap_or(defaults.patch_size),
            in_channels: overrides.in_channels.unwrap_or(defaults.in_channels),
            dim,
            n_layers: overrides.n_layers.unwrap_or(defaults.n_layers),
            n_heads,
            n_kv_heads: overrides.n_kv_heads.unwrap_or(n_heads),
            qk_norm: overrides.qk_norm.unwrap_or(defaults.qk_norm),
            norm_eps: overrides.norm_eps.unwrap_or(defaults.norm_eps),
            eva_embedding_size: overrides.eva_embedding_size.unwrap_or(defaults.eva_embedding_size),
            mlp_hidden_dim: overrides.mlp_hidden_dim.unwrap_or(defaults.mlp_hidden_dim),
            mlp_num_layers: overrides.mlp_num_layers.unwrap_or(defaults.mlp_num_layers),
            mlp_dropout: overrides.mlp_dropout.unwrap_or(defaults.mlp_dropout),
            mlp_activation: overrides.mlp_activation.unwrap_or(defaults.mlp_activation),
            learn_sigma: overrides.learn_sigma.unwrap_or(defaults.learn_sigma),
            gradient_checkpointing: overrides
                .gradient_checkpointing
                .unwrap_or(defaults.gradient_checkpointing),
            rope_base: overrides.rope_base.unwrap_or(defaults.rope_base),
            rope_scaling: overrides.rope_scaling.or(defaults.rope_scaling),
            initializer_range: overrides.initializer_range.unwrap_or(defaults.initializer_range),
            use_flash_attention: overrides
                .use_flash_attention
                .unwrap_or(defaults.use_flash_attention),
            attention_dropout: overrides.attention_dropout.unwrap_or(defaults.attention_dropout),
            intermediate_size,
            hidden_dropout: overrides.hidden_dropout.unwrap_or(defaults.hidden_dropout),
            max_position_embeddings: overrides
                .max_position_embeddings
                .unwrap_or(defaults.max_position_embeddings),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the architecture record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("model.dim", self.dim)?;
        require_positive("model.n_layers", self.n_layers)?;
        require_positive("model.n_heads", self.n_heads)?;
        require_positive("model.n_kv_heads", self.n_kv_heads)?;
        if self.dim % self.n_heads != 0 {
            return Err(ConfigError::Invalid(format!(
                "model.dim ({}) must be divisible by model.n_heads ({})",
                self.dim, self.n_heads
            )));
        }

        require_positive("model.input_size", self.input_size)?;
        require_positive("model.patch_size", self.patch_size)?;
        require_positive("model.in_channels", self.in_channels)?;
        require_positive("model.eva_embedding_size", self.eva_embedding_size)?;
        require_positive("model.intermediate_size", self.intermediate_size)?;
        require_positive("model.max_position_embeddings", self.max_position_embeddings)?;

        require_positive("model.mlp_hidden_dim", self.mlp_hidden_dim)?;
        require_positive("model.mlp_num_layers", self.mlp_num_layers)?;
        require_unit_interval("model.mlp_dropout", self.mlp_dropout)?;
        require_unit_interval("model.attention_dropout", self.attention_dropout)?;
        require_unit_interval("model.hidden_dropout", self.hidden_dropout)?;

        require_positive_finite("model.norm_eps", self.norm_eps)?;
        require_positive_finite("model.rope_base", self.rope_base)?;
        require_non_negative_finite("model.initializer_range", self.initializer_range)?;
        if let Some(scaling) = &self.rope_scaling {
            scaling.validate()?;
        }

        if self.learn_sigma {
            return Err(ConfigError::Invalid(
                "model.learn_sigma must be false; BLIP3-o uses flow matching".to_string(),
            ));
        }

        require_pinned("model.in_channels", self.in_channels, CLIP_EMBEDDING_DIM, "CLIP width")?;
        require_pinned(
            "model.eva_embedding_size",
            self.eva_embedding_size,
            EVA_EMBEDDING_DIM,
            "EVA-CLIP width",
        )?;
        require_pinned("model.patch_size", self.patch_size, PATCH_SIZE, "features are pre-tokenized")?;
        require_pinned("model.input_size", self.input_size, GRID_SIZE, "16x16 token grid")?;
        Ok(())
    }

    /// Returns the total number of tokens (`input_size` squared).
    ///
    /// Saturates at `usize::MAX` on records that skipped validation.
    #[must_use]
    pub const fn num_tokens(&self) -> usize {
        self.input_size.saturating_mul(self.input_size)
    }

    /// Returns the per-head attention dimension.
    ///
    /// Returns 0 when `n_heads` is 0; call [`DitConfig::validate`] first.
    #[must_use]
    pub const fn head_dim(&self) -> usize {
        match self.dim.checked_div(self.n_heads) {
            Some(head_dim) => head_dim,
            None => 0,
        }
    }
}

impl fmt::Display for DitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D, {}L, {}H", self.dim, self.n_layers, self.n_heads)
    }
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Partial architecture settings; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DitOverrides {
    /// Token grid side length.
    pub input_size: Option<usize>,
    /// Patch size.
    pub patch_size: Option<usize>,
    /// CLIP embedding width.
    pub in_channels: Option<usize>,
    /// Hidden dimension.
    pub dim: Option<usize>,
    /// Transformer layer count.
    pub n_layers: Option<usize>,
    /// Attention head count.
    pub n_heads: Option<usize>,
    /// Key-value head count.
    pub n_kv_heads: Option<usize>,
    /// Query-key normalization.
    pub qk_norm: Option<bool>,
    /// Layer norm epsilon.
    pub norm_eps: Option<f64>,
    /// EVA-CLIP conditioning width.
    pub eva_embedding_size: Option<usize>,
    /// Hidden width of the global adaptation MLP.
    pub mlp_hidden_dim: Option<usize>,
    /// Layer count of the global adaptation MLP.
    pub mlp_num_layers: Option<usize>,
    /// Dropout of the global adaptation MLP.
    pub mlp_dropout: Option<f64>,
    /// Activation of the global adaptation MLP.
    pub mlp_activation: Option<MlpActivation>,
    /// Whether the noise variance is learned.
    pub learn_sigma: Option<bool>,
    /// Gradient checkpointing toggle.
    pub gradient_checkpointing: Option<bool>,
    /// RoPE base frequency.
    pub rope_base: Option<f64>,
    /// RoPE scaling.
    pub rope_scaling: Option<RopeScaling>,
    /// Standard deviation for weight initialization.
    pub initializer_range: Option<f64>,
    /// Flash attention toggle.
    pub use_flash_attention: Option<bool>,
    /// Attention dropout.
    pub attention_dropout: Option<f64>,
    /// Feed-forward width.
    pub intermediate_size: Option<usize>,
    /// Hidden-layer dropout.
    pub hidden_dropout: Option<f64>,
    /// Maximum sequence length.
    pub max_position_embeddings: Option<usize>,
}

impl DitOverrides {
    /// Layers `overrides` on top of `self`; keys set in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            input_size: overrides.input_size.or(self.input_size),
            patch_size: overrides.patch_size.or(self.patch_size),
            in_channels: overrides.in_channels.or(self.in_channels),
            dim: overrides.dim.or(self.dim),
            n_layers: overrides.n_layers.or(self.n_layers),
            n_heads: overrides.n_heads.or(self.n_heads),
            n_kv_heads: overrides.n_kv_heads.or(self.n_kv_heads),
            qk_norm: overrides.qk_norm.or(self.qk_norm),
            norm_eps: overrides.norm_eps.or(self.norm_eps),
            eva_embedding_size: overrides.eva_embedding_size.or(self.eva_embedding_size),
            mlp_hidden_dim: overrides.mlp_hidden_dim.or(self.mlp_hidden_dim),
            mlp_num_layers: overrides.mlp_num_layers.or(self.mlp_num_layers),
            mlp_dropout: overrides.mlp_dropout.or(self.mlp_dropout),
            mlp_activation: overrides.mlp_activation.or(self.mlp_activation),
            learn_sigma: overrides.learn_sigma.or(self.learn_sigma),
            gradient_checkpointing: overrides.gradient_checkpointing.or(self.gradient_checkpointing),
            rope_base: overrides.rope_base.or(self.rope_base),
            rope_scaling: overrides.rope_scaling.or(self.rope_scaling),
            initializer_range: overrides.initializer_range.or(self.initializer_range),
            use_flash_attention: overrides.use_flash_attention.or(self.use_flash_attention),
            attention_dropout: overrides.attention_dropout.or(self.attention_dropout),
            intermediate_size: overrides.intermediate_size.or(self.intermediate_size),
            hidden_dropout: overrides.hidden_dropout.or(self.hidden_dropout),
            max_position_embeddings: overrides
                .max_position_embeddings
                .or(self.max_position_embeddings),
        }
    }
}

impl From<&DitConfig> for DitOverrides {
    fn from(config: &DitConfig) -> Self {
        Self {
            input_size: Some(config.input_size),
            patch_size: Some(config.patch_size),
            in_channels: Some(config.in_channels),
            dim: Some(config.dim),
            n_layers: Some(config.n_layers),
            n_heads: Some(config.n_heads),
            n_kv_heads: Some(config.n_kv_heads),
            qk_norm: Some(config.qk_norm),
            norm_eps: Some(config.norm_eps),
            eva_embedding_size: Some(config.eva_embedding_size),
            mlp_hidden_dim: Some(config.mlp_hidden_dim),
            mlp_num_layers: Some(config.mlp_num_layers),
            mlp_dropout: Some(config.mlp_dropout),
            mlp_activation: Some(config.mlp_activation),
            learn_sigma: Some(config.learn_sigma),
            gradient_checkpointing: Some(config.gradient_checkpointing),
            rope_base: Some(config.rope_base),
            rope_scaling: config.rope_scaling,
            initializer_range: Some(config.initializer_range),
            use_flash_attention: Some(config.use_flash_attention),
            attention_dropout: Some(config.attention_dropout),
            intermediate_size: Some(config.intermediate_size),
            hidden_dropout: Some(config.hidden_dropout),
            max_position_embeddings: Some(config.max_position_embeddings),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
