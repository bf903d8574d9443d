// crates/blip3o-config/src/schema.rs
// ============================================================================
// Module: Config Schemas
// Description: JSON schema builders for BLIP3-o run configuration documents.
// Purpose: Provide canonical validation schema for config artifacts.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! This module defines the JSON Schema for the `[model]`, `[flow]`, and
//! `[training]` TOML document. Defaults are read from the runtime `Default`
//! implementations and enumerations from the Rust enums, so the schema cannot
//! drift from the config model.

use serde_json::Value;
use serde_json::json;

use crate::config::MODEL_PRESET_KEY;
use crate::flow::FlowMatchingConfig;
use crate::flow::MAX_SIGMA;
use crate::flow::PredictionType;
use crate::flow::ScheduleType;
use crate::model::CLIP_EMBEDDING_DIM;
use crate::model::DitConfig;
use crate::model::EVA_EMBEDDING_DIM;
use crate::model::GRID_SIZE;
use crate::model::MlpActivation;
use crate::model::PATCH_SIZE;
use crate::model::RopeScalingKind;
use crate::presets::Preset;
use crate::training::LrSchedulerType;
use crate::training::TrainingConfig;

/// Returns the JSON schema for a BLIP3-o run configuration document.
#[must_use]
pub fn config_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "blip3o://contract/schemas/config.schema.json",
        "title": "BLIP3-o Run Configuration",
        "description": "Model architecture, flow-matching objective, and training settings.",
        "type": "object",
        "properties": {
            "model": model_config_schema(),
            "flow": flow_config_schema(),
            "training": training_config_schema()
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Model Configuration
// ============================================================================

/// Schema for the `[model]` section.
fn model_config_schema() -> Value {
    let defaults = DitConfig::default();
    let mut properties = serde_json::Map::new();
    properties.insert(
        MODEL_PRESET_KEY.to_string(),
        json!({
            "type": "string",
            "enum": Preset::ALL.map(Preset::as_str),
            "description": "Base preset; remaining keys override it."
        }),
    );
    let fields = [
        ("input_size", schema_for_pinned(GRID_SIZE, "Token grid side length (16x16 = 256 tokens).")),
        ("patch_size", schema_for_pinned(PATCH_SIZE, "Patch size; features are pre-tokenized.")),
        ("in_channels", schema_for_pinned(CLIP_EMBEDDING_DIM, "CLIP embedding width.")),
        ("dim", schema_for_count(Some(defaults.dim), "Hidden dimension; divisible by n_heads.")),
        ("n_layers", schema_for_count(Some(defaults.n_layers), "Transformer layer count.")),
        ("n_heads", schema_for_count(Some(defaults.n_heads), "Attention head count.")),
        ("n_kv_heads", schema_for_count(None, "Key-value head count; defaults to n_heads.")),
        ("qk_norm", schema_for_bool(defaults.qk_norm, "Query-key normalization.")),
        ("norm_eps", schema_for_positive_number(defaults.norm_eps, "Layer norm epsilon.")),
        (
            "eva_embedding_size",
            schema_for_pinned(EVA_EMBEDDING_DIM, "EVA-CLIP conditioning width."),
        ),
        (
            "mlp_hidden_dim",
            schema_for_count(Some(defaults.mlp_hidden_dim), "Adaptation MLP hidden width."),
        ),
        (
            "mlp_num_layers",
            schema_for_count(Some(defaults.mlp_num_layers), "Adaptation MLP layer count."),
        ),
        ("mlp_dropout", schema_for_rate(defaults.mlp_dropout, "Adaptation MLP dropout.")),
        (
            "mlp_activation",
            schema_for_enum(
                &MlpActivation::ALL.map(MlpActivation::as_str),
                defaults.mlp_activation.as_str(),
                "Adaptation MLP activation.",
            ),
        ),
        (
            "learn_sigma",
            json!({
                "type": "boolean",
                "const": false,
                "default": defaults.learn_sigma,
                "description": "Learned noise variance; must be false under flow matching."
            }),
        ),
        (
            "gradient_checkpointing",
            schema_for_bool(defaults.gradient_checkpointing, "Gradient checkpointing toggle."),
        ),
        ("rope_base", schema_for_positive_number(defaults.rope_base, "RoPE base frequency.")),
        ("rope_scaling", rope_scaling_schema()),
        (
            "initializer_range",
            schema_for_weight(defaults.initializer_range, "Weight initialization std."),
        ),
        (
            "use_flash_attention",
            schema_for_bool(defaults.use_flash_attention, "Flash attention toggle."),
        ),
        ("attention_dropout", schema_for_rate(defaults.attention_dropout, "Attention dropout.")),
        (
            "intermediate_size",
            schema_for_count(None, "Feed-forward width; defaults to 4 * dim."),
        ),
        ("hidden_dropout", schema_for_rate(defaults.hidden_dropout, "Hidden-layer dropout.")),
        (
            "max_position_embeddings",
            schema_for_count(Some(defaults.max_position_embeddings), "Maximum sequence length."),
        ),
    ];
    for (name, schema) in fields {
        properties.insert(name.to_string(), schema);
    }
    json!({
        "type": "object",
        "description": "Diffusion transformer architecture.",
        "properties": properties,
        "additionalProperties": false
    })
}

/// Schema for RoPE scaling.
fn rope_scaling_schema() -> Value {
    json!({
        "type": "object",
        "description": "Optional RoPE scaling.",
        "properties": {
            "type": {
                "type": "string",
                "enum": RopeScalingKind::ALL.map(RopeScalingKind::as_str),
                "description": "Scaling strategy."
            },
            "factor": {
                "type": "number",
                "minimum": 1,
                "description": "Context extension factor."
            }
        },
        "required": ["type", "factor"],
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Flow Configuration
// ============================================================================

/// Schema for the `[flow]` section.
fn flow_config_schema() -> Value {
    let defaults = FlowMatchingConfig::default();
    json!({
        "type": "object",
        "description": "Flow-matching objective.",
        "properties": {
            "sigma_min": {
                "type": "number",
                "minimum": 0,
                "default": defaults.sigma_min,
                "description": "Minimum noise level; below sigma_max."
            },
            "sigma_max": {
                "type": "number",
                "exclusiveMinimum": 0,
                "maximum": MAX_SIGMA,
                "default": defaults.sigma_max,
                "description": "Maximum noise level."
            },
            "prediction_type": schema_for_enum(
                &PredictionType::ALL.map(PredictionType::as_str),
                defaults.prediction_type.as_str(),
                "Prediction target."
            ),
            "schedule_type": schema_for_enum(
                &ScheduleType::ALL.map(ScheduleType::as_str),
                defaults.schedule_type.as_str(),
                "Noise schedule shape."
            ),
            "clip_dim": schema_for_count(Some(defaults.clip_dim), "CLIP embedding width."),
            "eva_dim": schema_for_count(Some(defaults.eva_dim), "EVA-CLIP embedding width."),
            "regularization_weight": schema_for_weight(
                defaults.regularization_weight,
                "Regularization loss weight."
            ),
            "alignment_loss_weight": schema_for_weight(
                defaults.alignment_loss_weight,
                "Alignment loss weight."
            ),
            "temporal_loss_weight": schema_for_weight(
                defaults.temporal_loss_weight,
                "Temporal consistency loss weight."
            ),
            "use_progressive_training": schema_for_bool(
                defaults.use_progressive_training,
                "Progressive timestep training toggle."
            ),
            "min_timestep": schema_for_rate(defaults.min_timestep, "Timestep window lower bound."),
            "max_timestep": schema_for_rate(defaults.max_timestep, "Timestep window upper bound.")
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Training Configuration
// ============================================================================

/// Schema for the `[training]` section.
fn training_config_schema() -> Value {
    let defaults = TrainingConfig::default();
    json!({
        "type": "object",
        "description": "Training hyperparameters.",
        "properties": {
            "num_train_epochs": schema_for_count(Some(defaults.num_train_epochs), "Training epochs."),
            "per_device_train_batch_size": schema_for_count(
                Some(defaults.per_device_train_batch_size),
                "Per-device training batch size."
            ),
            "per_device_eval_batch_size": schema_for_count(
                Some(defaults.per_device_eval_batch_size),
                "Per-device evaluation batch size."
            ),
            "learning_rate": schema_for_positive_number(defaults.learning_rate, "Peak learning rate."),
            "weight_decay": schema_for_rate(defaults.weight_decay, "Decoupled weight decay."),
            "lr_scheduler_type": schema_for_enum(
                &LrSchedulerType::ALL.map(LrSchedulerType::as_str),
                defaults.lr_scheduler_type.as_str(),
                "Learning-rate scheduler."
            ),
            "warmup_ratio": schema_for_rate(defaults.warmup_ratio, "Fraction of steps spent warming up."),
            "warmup_steps": schema_for_non_negative_integer(defaults.warmup_steps, "Warmup steps."),
            "gradient_accumulation_steps": schema_for_count(
                Some(defaults.gradient_accumulation_steps),
                "Micro-batches per optimizer step."
            ),
            "max_grad_norm": schema_for_positive_number(defaults.max_grad_norm, "Gradient clipping norm."),
            "fp16": schema_for_bool(defaults.fp16, "Half-precision training; exclusive with bf16."),
            "bf16": schema_for_bool(defaults.bf16, "Bfloat16 training; exclusive with fp16."),
            "logging_steps": schema_for_count(Some(defaults.logging_steps), "Steps between logs."),
            "eval_steps": schema_for_count(Some(defaults.eval_steps), "Steps between evaluations."),
            "save_steps": schema_for_count(Some(defaults.save_steps), "Steps between checkpoints."),
            "dataloader_num_workers": schema_for_non_negative_integer(
                defaults.dataloader_num_workers,
                "Data loader worker count."
            ),
            "dataloader_pin_memory": schema_for_bool(
                defaults.dataloader_pin_memory,
                "Pin host memory in the data loader."
            ),
            "remove_unused_columns": schema_for_bool(
                defaults.remove_unused_columns,
                "Drop dataset columns unused by the model."
            ),
            "load_best_model_at_end": schema_for_bool(
                defaults.load_best_model_at_end,
                "Reload the best checkpoint at the end."
            ),
            "metric_for_best_model": {
                "type": "string",
                "minLength": 1,
                "default": defaults.metric_for_best_model,
                "description": "Metric used to rank checkpoints."
            },
            "greater_is_better": schema_for_bool(
                defaults.greater_is_better,
                "Whether larger metric values are better."
            ),
            "patch_loss_weight": schema_for_weight(defaults.patch_loss_weight, "Patch-level loss weight."),
            "global_loss_weight": schema_for_weight(defaults.global_loss_weight, "Global loss weight."),
            "flow_matching_loss_weight": schema_for_weight(
                defaults.flow_matching_loss_weight,
                "Flow-matching loss weight."
            ),
            "use_cosine_similarity": schema_for_bool(
                defaults.use_cosine_similarity,
                "Use cosine similarity for supervision losses."
            )
        },
        "not": {
            "properties": {
                "fp16": { "const": true },
                "bf16": { "const": true }
            },
            "required": ["fp16", "bf16"]
        },
        "additionalProperties": false
    })
}

// ============================================================================
// SECTION: Schema Helpers
// ============================================================================

/// Schema for a strictly positive count, optionally with a default.
fn schema_for_count(default: Option<usize>, description: &str) -> Value {
    let mut schema = json!({
        "type": "integer",
        "minimum": 1,
        "description": description
    });
    if let (Some(value), Some(object)) = (default, schema.as_object_mut()) {
        object.insert("default".to_string(), json!(value));
    }
    schema
}

/// Schema for a non-negative integer.
fn schema_for_non_negative_integer(default: usize, description: &str) -> Value {
    json!({
        "type": "integer",
        "minimum": 0,
        "default": default,
        "description": description
    })
}

/// Schema for an integer fixed by the upstream feature extractor.
fn schema_for_pinned(value: usize, description: &str) -> Value {
    json!({
        "type": "integer",
        "const": value,
        "default": value,
        "description": description
    })
}

/// Schema for a rate within `[0, 1]`.
fn schema_for_rate(default: f64, description: &str) -> Value {
    json!({
        "type": "number",
        "minimum": 0,
        "maximum": 1,
        "default": default,
        "description": description
    })
}

/// Schema for a non-negative weight.
fn schema_for_weight(default: f64, description: &str) -> Value {
    json!({
        "type": "number",
        "minimum": 0,
        "default": default,
        "description": description
    })
}

/// Schema for a strictly positive number.
fn schema_for_positive_number(default: f64, description: &str) -> Value {
    json!({
        "type": "number",
        "exclusiveMinimum": 0,
        "default": default,
        "description": description
    })
}

/// Schema for a boolean flag.
fn schema_for_bool(default: bool, description: &str) -> Value {
    json!({
        "type": "boolean",
        "default": default,
        "description": description
    })
}

/// Schema for a string drawn from a fixed enumeration.
fn schema_for_enum(names: &[&str], default: &str, description: &str) -> Value {
    json!({
        "type": "string",
        "enum": names,
        "default": default,
        "description": description
    })
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
    fn derived_fields_have_no_default() {
        let schema = config_schema();
        let model = &schema["properties"]["model"]["properties"];
        assert!(model["n_kv_heads"].get("default").is_none());
        assert!(model["intermediate_size"].get("default").is_none());
        assert_eq!(model["dim"]["default"], json!(768));
    }

    #[test]
    fn preset_enum_lists_every_preset() {
        let schema = config_schema();
        assert_eq!(
            schema["properties"]["model"]["properties"]["preset"]["enum"],
            json!(["small", "default", "large", "dual_supervision"])
        );
    }
}
