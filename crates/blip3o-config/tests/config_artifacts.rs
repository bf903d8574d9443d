//! Config artifact tests for blip3o-config.
// crates/blip3o-config/tests/config_artifacts.rs
// =============================================================================
// Module: Config Artifact Tests
// Description: Validate the example, schema, and docs against each other.
// Purpose: Ensure generated artifacts match the runtime config model.
// =============================================================================

#![allow(
    clippy::panic_in_result_fn,
    reason = "Test-only assertions inside result-returning tests are permitted."
)]

use blip3o_config::RunConfig;
use blip3o_config::config_docs_markdown;
use blip3o_config::config_schema;
use blip3o_config::config_toml_example;
use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;
use serde_json::json;

mod common;

use common::TestResult;

fn compile_schema() -> Result<Validator, String> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&config_schema())
        .map_err(|err| format!("failed to compile schema: {err}"))
}

fn toml_to_json(content: &str) -> Result<Value, String> {
    let toml_value: toml::Value =
        toml::from_str(content).map_err(|err| format!("failed to parse TOML: {err}"))?;
    serde_json::to_value(&toml_value).map_err(|err| format!("failed to convert to JSON: {err}"))
}

// ============================================================================
// SECTION: Example
// ============================================================================

#[test]
fn example_validates_against_config_model() -> TestResult {
    let config = RunConfig::from_toml_str(&config_toml_example())
        .map_err(|err| format!("example config does not validate: {err}"))?;
    assert_eq!(config.model.n_layers, 20);
    assert_eq!((config.model.mlp_hidden_dim, config.model.mlp_num_layers), (2048, 3));
    assert!(config.training.bf16);
    Ok(())
}

#[test]
fn example_validates_against_json_schema() -> TestResult {
    let validator = compile_schema()?;
    let json_value = toml_to_json(&config_toml_example())?;
    if !validator.is_valid(&json_value) {
        let errors = validator
            .iter_errors(&json_value)
            .map(|err| err.to_string())
            .collect::<Vec<String>>();
        return Err(format!("example does not validate against schema: {}", errors.join(", ")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Schema
// ============================================================================

#[test]
fn empty_document_validates_against_schema() -> TestResult {
    let validator = compile_schema()?;
    if !validator.is_valid(&json!({})) {
        return Err("empty document should validate".to_string());
    }
    Ok(())
}

#[test]
fn schema_rejects_what_the_model_rejects() -> TestResult {
    let validator = compile_schema()?;
    let cases = [
        json!({ "model": { "width": 768 } }),
        json!({ "model": { "preset": "huge" } }),
        json!({ "model": { "in_channels": 768 } }),
        json!({ "model": { "mlp_activation": "tanh" } }),
        json!({ "flow": { "sigma_max": 11.0 } }),
        json!({ "training": { "weight_decay": 1.5 } }),
        json!({ "training": { "fp16": true, "bf16": true } }),
    ];
    for case in cases {
        if validator.is_valid(&case) {
            return Err(format!("schema accepted invalid document: {case}"));
        }
        let toml_text = toml::to_string(&case).map_err(|err| err.to_string())?;
        if RunConfig::from_toml_str(&toml_text).is_ok() {
            return Err(format!("config model accepted invalid document: {case}"));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Docs
// ============================================================================

#[test]
fn docs_render_title_and_tables() -> TestResult {
    let docs = config_docs_markdown().map_err(|err| err.to_string())?;
    if !docs.starts_with("# BLIP3-o Run Configuration") {
        return Err("docs missing title".to_string());
    }
    for needle in ["| Field | Type | Default | Notes |", "`metric_for_best_model`", "`eva_dim`"] {
        if !docs.contains(needle) {
            return Err(format!("docs missing {needle}"));
        }
    }
    Ok(())
}

#[test]
fn docs_are_deterministic() -> TestResult {
    let first = config_docs_markdown().map_err(|err| err.to_string())?;
    let second = config_docs_markdown().map_err(|err| err.to_string())?;
    if first != second {
        return Err("docs output is not deterministic".to_string());
    }
    Ok(())
}
