// crates/blip3o-config/src/docs.rs
// ============================================================================
// Module: Config Docs Generator
// Description: Markdown reference generator for BLIP3-o run configuration.
// Purpose: Keep config docs in sync with schema and validation.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Renders the configuration reference from the canonical schema. Every
//! schema property must be listed in a section and every listed field must
//! exist in the schema, so adding a field without documenting it fails.
//! Output is deterministic and returned in memory; callers decide where to
//! write it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Write;

use serde_json::Value;
use thiserror::Error;

use crate::schema::config_schema;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when generating config docs.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Schema traversal or rendering error.
    #[error("docs schema error: {0}")]
    Schema(String),
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Generates the configuration markdown documentation.
///
/// # Errors
///
/// Returns [`DocsError`] when schema traversal fails or a schema field is
/// left undocumented.
pub fn config_docs_markdown() -> Result<String, DocsError> {
    let schema = config_schema();
    let mut out = String::new();

    out.push_str("# BLIP3-o Run Configuration\n\n");
    out.push_str("## Overview\n\n");
    out.push_str("A run configuration has three optional sections. Omitted fields take the\n");
    out.push_str("defaults listed below, unknown fields are rejected, and the model and flow\n");
    out.push_str("sections must agree on embedding widths.\n\n");

    out.push_str("## Sections\n\n");

    for section in build_sections() {
        out.push_str("### ");
        out.push_str(section.heading);
        out.push_str("\n\n");
        out.push_str(section.description);
        out.push_str("\n\n");
        let table = render_table(&schema, &section).map_err(DocsError::Schema)?;
        out.push_str(&table);
        if let Some(extra) = section.extra {
            out.push('\n');
            out.push_str(extra);
            out.push('\n');
        }
        out.push('\n');
    }

    Ok(out)
}

// ============================================================================
// SECTION: Section Specs
// ============================================================================

/// Specification for one rendered documentation section.
struct SectionSpec {
    /// Section heading, including TOML table name.
    heading: &'static str,
    /// Section description displayed beneath the heading.
    description: &'static str,
    /// Property names leading from the root schema to the section.
    path: &'static [&'static str],
    /// Ordered field list rendered in the docs table.
    fields: &'static [&'static str],
    /// Default values that override schema defaults for docs.
    default_overrides: &'static [FieldOverride],
    /// Optional additional text appended after the table.
    extra: Option<&'static str>,
}

/// Overrides for schema defaults shown in docs tables.
#[derive(Clone, Copy)]
struct FieldOverride {
    /// Field name to override.
    field: &'static str,
    /// Replacement default value string.
    default_value: &'static str,
}

// ============================================================================
// SECTION: Section Registry
// ============================================================================

/// Builds the ordered list of configuration sections to render.
#[allow(
    clippy::too_many_lines,
    reason = "Keeping the full section list inline keeps the documented field order auditable."
)]
fn build_sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec {
            heading: "[model]",
            description: "Diffusion transformer architecture.",
            path: &["model"],
            fields: &[
                "preset",
                "input_size",
                "patch_size",
                "in_channels",
                "dim",
                "n_layers",
                "n_heads",
                "n_kv_heads",
                "qk_norm",
                "norm_eps",
                "eva_embedding_size",
                "mlp_hidden_dim",
                "mlp_num_layers",
                "mlp_dropout",
                "mlp_activation",
                "learn_sigma",
                "gradient_checkpointing",
                "rope_base",
                "rope_scaling",
                "initializer_range",
                "use_flash_attention",
                "attention_dropout",
                "intermediate_size",
                "hidden_dropout",
                "max_position_embeddings",
            ],
            default_overrides: &[
                FieldOverride { field: "preset", default_value: "none" },
                FieldOverride { field: "n_kv_heads", default_value: "n_heads" },
                FieldOverride { field: "intermediate_size", default_value: "4 * dim" },
                FieldOverride { field: "rope_scaling", default_value: "none" },
            ],
            extra: Some(
                "`input_size`, `patch_size`, `in_channels`, and `eva_embedding_size` are fixed by \
the feature extractors and only accept their defaults. With a `preset`, the remaining keys \
override the preset, including its derived `n_kv_heads` and `intermediate_size`.\n\n\
Preset example:\n\n```toml\n[model]\npreset = \"large\"\nmlp_dropout = 0.2\n```",
            ),
        },
        SectionSpec {
            heading: "[model.rope_scaling]",
            description: "Optional rotary position embedding scaling.",
            path: &["model", "rope_scaling"],
            fields: &["type", "factor"],
            default_overrides: &[],
            extra: None,
        },
        SectionSpec {
            heading: "[flow]",
            description: "Flow-matching objective.",
            path: &["flow"],
            fields: &[
                "sigma_min",
                "sigma_max",
                "prediction_type",
                "schedule_type",
                "clip_dim",
                "eva_dim",
                "regularization_weight",
                "alignment_loss_weight",
                "temporal_loss_weight",
                "use_progressive_training",
                "min_timestep",
                "max_timestep",
            ],
            default_overrides: &[],
            extra: Some(
                "Requires `0 <= sigma_min < sigma_max <= 10` and \
`0 <= min_timestep < max_timestep <= 1`. `clip_dim` and `eva_dim` must equal the model's \
`in_channels` and `eva_embedding_size`.",
            ),
        },
        SectionSpec {
            heading: "[training]",
            description: "Training hyperparameters.",
            path: &["training"],
            fields: &[
                "num_train_epochs",
                "per_device_train_batch_size",
                "per_device_eval_batch_size",
                "learning_rate",
                "weight_decay",
                "lr_scheduler_type",
                "warmup_ratio",
                "warmup_steps",
                "gradient_accumulation_steps",
                "max_grad_norm",
                "fp16",
                "bf16",
                "logging_steps",
                "eval_steps",
                "save_steps",
                "dataloader_num_workers",
                "dataloader_pin_memory",
                "remove_unused_columns",
                "load_best_model_at_end",
                "metric_for_best_model",
                "greater_is_better",
                "patch_loss_weight",
                "global_loss_weight",
                "flow_matching_loss_weight",
                "use_cosine_similarity",
            ],
            default_overrides: &[],
            extra: Some("`fp16` and `bf16` cannot both be enabled."),
        },
    ]
}

// ============================================================================
// SECTION: Rendering Helpers
// ============================================================================

/// Renders the markdown table for a configuration section.
fn render_table(schema: &Value, section: &SectionSpec) -> Result<String, String> {
    let section_schema = schema_at(schema, section.path)?;
    let props = section_schema
        .get("properties")
        .and_then(|value| value.as_object())
        .ok_or_else(|| "schema properties missing".to_string())?;

    let mut seen = BTreeSet::new();
    for field in section.fields {
        if !props.contains_key(*field) {
            return Err(format!("missing field in schema: {field}"));
        }
        seen.insert(*field);
    }
    for key in props.keys() {
        if !seen.contains(key.as_str()) {
            return Err(format!("field not documented: {key}"));
        }
    }

    let overrides = overrides_map(section.default_overrides);

    let mut table = String::new();
    table.push_str("| Field | Type | Default | Notes |\n");
    table.push_str("| --- | --- | --- | --- |\n");

    for field in section.fields {
        let prop_schema =
            props.get(*field).ok_or_else(|| format!("missing field schema: {field}"))?;
        let field_type = format_schema_type(prop_schema);
        let default_value = overrides
            .get(*field)
            .map(|value| (*value).to_string())
            .or_else(|| prop_schema.get("default").map(format_default_value))
            .unwrap_or_else(|| "n/a".to_string());
        let notes = prop_schema.get("description").and_then(|value| value.as_str()).unwrap_or("");
        let _ = writeln!(&mut table, "| `{field}` | {field_type} | {default_value} | {notes} |");
    }

    Ok(table)
}

/// Builds a lookup table for default overrides.
fn overrides_map(overrides: &[FieldOverride]) -> BTreeMap<&str, &str> {
    overrides.iter().map(|entry| (entry.field, entry.default_value)).collect()
}

/// Resolves a schema node by walking a path of property names.
fn schema_at<'a>(schema: &'a Value, path: &[&str]) -> Result<&'a Value, String> {
    let mut current = schema;
    for name in path {
        let props = current
            .get("properties")
            .and_then(|value| value.as_object())
            .ok_or_else(|| format!("properties missing while seeking {name}"))?;
        current = props.get(*name).ok_or_else(|| format!("property not found: {name}"))?;
    }
    Ok(current)
}

/// Formats a schema type for markdown tables.
fn format_schema_type(schema: &Value) -> String {
    let raw = format_schema_type_raw(schema);
    escape_table_cell(&raw)
}

/// Formats a schema type without markdown escaping.
fn format_schema_type_raw(schema: &Value) -> String {
    if let Some(enum_vals) = schema.get("enum").and_then(|val| val.as_array()) {
        let items = enum_vals.iter().map(format_enum_value).collect::<Vec<String>>();
        return items.join(" | ");
    }
    if let Some(fixed) = schema.get("const") {
        return format!("{} (fixed)", format_default_value(fixed));
    }
    match schema.get("type").and_then(|val| val.as_str()) {
        Some("boolean") => "bool".to_string(),
        Some("object") => "table".to_string(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}

/// Escapes pipe characters for markdown table cells.
fn escape_table_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Formats enum values as TOML-compatible strings.
fn format_enum_value(value: &Value) -> String {
    value.as_str().map_or_else(|| value.to_string(), |text| format!("\"{text}\""))
}

/// Formats schema defaults for display in docs.
fn format_default_value(value: &Value) -> String {
    match value {
        Value::String(val) => format!("\"{val}\""),
        Value::Object(_) => "{...}".to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
