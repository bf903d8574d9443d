//! Schema default alignment tests for blip3o-config.
// crates/blip3o-config/tests/schema_defaults.rs
// =============================================================================
// Module: Schema Defaults Alignment Tests
// Description: Ensure schema defaults match runtime defaults.
// Purpose: Prevent drift between config defaults and generated schema/docs.
// =============================================================================
use blip3o_config::DitConfig;
use blip3o_config::FlowMatchingConfig;
use blip3o_config::TrainingConfig;
use blip3o_config::config_schema;
use serde_json::Value;

mod common;

use common::TestResult;

fn schema_default<'a>(schema: &'a Value, pointer: &str) -> Result<&'a Value, String> {
    schema.pointer(pointer).ok_or_else(|| format!("missing schema default at {pointer}"))
}

/// Checks every serialized runtime field against the schema default.
fn assert_section_defaults(schema: &Value, section: &str, runtime: &Value) -> TestResult {
    let fields = runtime.as_object().ok_or_else(|| format!("{section} is not an object"))?;
    for (field, expected) in fields {
        let pointer = format!("/properties/{section}/properties/{field}/default");
        let actual = schema_default(schema, &pointer)?;
        if actual != expected {
            return Err(format!("schema default mismatch at {pointer}: {actual} vs {expected}"));
        }
    }
    Ok(())
}

#[test]
fn flow_schema_defaults_match_runtime_defaults() -> TestResult {
    let runtime =
        serde_json::to_value(FlowMatchingConfig::default()).map_err(|err| err.to_string())?;
    assert_section_defaults(&config_schema(), "flow", &runtime)
}

#[test]
fn training_schema_defaults_match_runtime_defaults() -> TestResult {
    let runtime = serde_json::to_value(TrainingConfig::default()).map_err(|err| err.to_string())?;
    assert_section_defaults(&config_schema(), "training", &runtime)
}

#[test]
fn model_schema_defaults_match_runtime_defaults() -> TestResult {
    let mut runtime = serde_json::to_value(DitConfig::default()).map_err(|err| err.to_string())?;
    let fields = runtime.as_object_mut().ok_or("model is not an object")?;
    for derived in ["n_kv_heads", "intermediate_size", "rope_scaling"] {
        fields.remove(derived);
    }
    assert_section_defaults(&config_schema(), "model", &runtime)
}

#[test]
fn schema_sections_reject_unknown_fields() -> TestResult {
    let schema = config_schema();
    for pointer in [
        "/additionalProperties",
        "/properties/model/additionalProperties",
        "/properties/model/properties/rope_scaling/additionalProperties",
        "/properties/flow/additionalProperties",
        "/properties/training/additionalProperties",
    ] {
        if schema.pointer(pointer) != Some(&Value::Bool(false)) {
            return Err(format!("{pointer} should be false"));
        }
    }
    Ok(())
}
