//! Run document validation tests for blip3o-config.
// crates/blip3o-config/tests/document_validation.rs
// =============================================================================
// Module: Document Validation Tests
// Description: Verify TOML decoding, preset resolution, and rejection paths.
// Purpose: Ensure documents fail closed on unknown keys and invalid values.
// =============================================================================

#![allow(
    clippy::panic_in_result_fn,
    reason = "Test-only assertions inside result-returning tests are permitted."
)]

use blip3o_config::ConfigError;
use blip3o_config::DitConfig;
use blip3o_config::LrSchedulerType;
use blip3o_config::RopeScalingKind;
use blip3o_config::ScheduleType;

mod common;

use common::TestResult;
use common::assert_invalid;
use common::run_config_from_toml;

// ============================================================================
// SECTION: Decoding
// ============================================================================

#[test]
fn empty_document_uses_defaults() -> TestResult {
    let config = run_config_from_toml("").map_err(|err| err.to_string())?;
    if config.model != DitConfig::default() {
        return Err("empty document should yield the default model".to_string());
    }
    Ok(())
}

#[test]
fn preset_with_overrides_resolves() -> TestResult {
    let config = run_config_from_toml(
        r#"
[model]
preset = "large"
mlp_dropout = 0.2

[flow]
schedule_type = "cosine"

[training]
lr_scheduler_type = "constant_with_warmup"
"#,
    )
    .map_err(|err| err.to_string())?;
    assert_eq!(config.model.dim, 1024);
    assert_eq!(config.model.intermediate_size, 4096);
    assert!((config.model.mlp_dropout - 0.2).abs() < f64::EPSILON);
    assert_eq!(config.flow.schedule_type, ScheduleType::Cosine);
    assert_eq!(config.training.lr_scheduler_type, LrSchedulerType::ConstantWithWarmup);
    Ok(())
}

#[test]
fn overrides_without_preset_derive_fields() -> TestResult {
    let config = run_config_from_toml("[model]\ndim = 512\nn_heads = 8\n")
        .map_err(|err| err.to_string())?;
    assert_eq!(config.model.intermediate_size, 2048);
    assert_eq!(config.model.n_kv_heads, 8);
    Ok(())
}

#[test]
fn rope_scaling_table_decodes() -> TestResult {
    let config = run_config_from_toml(
        "[model]\nrope_scaling = { type = \"dynamic\", factor = 2.0 }\n",
    )
    .map_err(|err| err.to_string())?;
    let scaling = config.model.rope_scaling.ok_or("rope_scaling missing")?;
    assert_eq!(scaling.kind, RopeScalingKind::Dynamic);
    assert!((scaling.factor - 2.0).abs() < f64::EPSILON);
    Ok(())
}

// ============================================================================
// SECTION: Rejections
// ============================================================================

#[test]
fn unknown_preset_is_rejected() -> TestResult {
    let result = run_config_from_toml("[model]\npreset = \"huge\"\n");
    if !matches!(result, Err(ConfigError::UnknownPreset { .. })) {
        return Err("expected UnknownPreset".to_string());
    }
    Ok(())
}

#[test]
fn non_string_preset_is_rejected() -> TestResult {
    assert_invalid(run_config_from_toml("[model]\npreset = 3\n"), "model.preset must be a string")
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    assert_invalid(run_config_from_toml("[model]\nwidth = 768\n"), "width")?;
    assert_invalid(run_config_from_toml("[flow]\nsigma = 1.0\n"), "sigma")?;
    assert_invalid(run_config_from_toml("[training]\nepochs = 3\n"), "epochs")?;
    assert_invalid(run_config_from_toml("[optimizer]\nname = \"adamw\"\n"), "optimizer")
}

#[test]
fn unknown_enum_values_are_parse_errors() -> TestResult {
    let cases = [
        "[model]\nmlp_activation = \"tanh\"\n",
        "[flow]\nprediction_type = \"x0\"\n",
        "[flow]\nschedule_type = \"exponential\"\n",
        "[training]\nlr_scheduler_type = \"step\"\n",
    ];
    for case in cases {
        if !matches!(run_config_from_toml(case), Err(ConfigError::Parse(_))) {
            return Err(format!("expected parse error for: {case}"));
        }
    }
    Ok(())
}

#[test]
fn indivisible_width_is_rejected() -> TestResult {
    assert_invalid(
        run_config_from_toml("[model]\ndim = 770\n"),
        "model.dim (770) must be divisible by model.n_heads (12)",
    )
}

#[test]
fn pinned_fields_reject_other_values() -> TestResult {
    assert_invalid(run_config_from_toml("[model]\nin_channels = 768\n"), "model.in_channels")?;
    assert_invalid(run_config_from_toml("[model]\ninput_size = 32\n"), "model.input_size")?;
    Ok(())
}

#[test]
fn learned_sigma_is_rejected() -> TestResult {
    assert_invalid(run_config_from_toml("[model]\nlearn_sigma = true\n"), "learn_sigma")
}

#[test]
fn flow_ranges_are_enforced() -> TestResult {
    assert_invalid(
        run_config_from_toml("[flow]\nsigma_min = 2.0\nsigma_max = 1.0\n"),
        "sigma_min < sigma_max",
    )?;
    assert_invalid(run_config_from_toml("[flow]\nsigma_max = 11.0\n"), "sigma_max <= 10")?;
    assert_invalid(
        run_config_from_toml("[flow]\nmin_timestep = 0.5\nmax_timestep = 0.5\n"),
        "min_timestep < max_timestep",
    )
}

#[test]
fn flow_width_mismatch_is_rejected() -> TestResult {
    assert_invalid(
        run_config_from_toml("[flow]\neva_dim = 2048\n"),
        "model.eva_embedding_size (4096) must match flow.eva_dim (2048)",
    )
}

#[test]
fn training_bounds_are_enforced() -> TestResult {
    assert_invalid(run_config_from_toml("[training]\nweight_decay = 1.5\n"), "weight_decay")?;
    assert_invalid(run_config_from_toml("[training]\nnum_train_epochs = 0\n"), "num_train_epochs")?;
    assert_invalid(run_config_from_toml("[training]\nbf16 = true\n"), "mutually exclusive")
}

#[test]
fn negative_counts_are_parse_errors() -> TestResult {
    if !matches!(run_config_from_toml("[model]\nn_layers = -1\n"), Err(ConfigError::Parse(_))) {
        return Err("negative count should fail to decode".to_string());
    }
    Ok(())
}
