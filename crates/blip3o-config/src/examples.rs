// crates/blip3o-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example run configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for a BLIP3-o dual-supervision run. The output is
//! deterministic and kept in sync with the schema and docs.

/// Returns a canonical example run configuration in TOML.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[model]
preset = "dual_supervision"
n_layers = 20
use_flash_attention = true
# rope_scaling = { type = "linear", factor = 2.0 }

[flow]
sigma_min = 0.0001
sigma_max = 1.0
prediction_type = "v_prediction"
schedule_type = "linear"
regularization_weight = 0.01
alignment_loss_weight = 0.15
temporal_loss_weight = 0.05
use_progressive_training = true

[training]
num_train_epochs = 8
per_device_train_batch_size = 6
gradient_accumulation_steps = 6
learning_rate = 0.00005
lr_scheduler_type = "cosine"
warmup_ratio = 0.05
fp16 = false
bf16 = true
metric_for_best_model = "eval_global_cosine_mean"
patch_loss_weight = 1.0
global_loss_weight = 2.0
flow_matching_loss_weight = 1.0
"#,
    )
}
