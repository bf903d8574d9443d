// crates/blip3o-config/src/lib.rs
// ============================================================================
// Module: BLIP3-o Config Library
// Description: Canonical DiT, flow-matching, and training config model.
// Purpose: Single source of truth for BLIP3-o configuration semantics.
// Dependencies: serde, serde_json, thiserror, toml
// ============================================================================

//! ## Overview
//! `blip3o-config` defines the configuration records consumed by the BLIP3-o
//! diffusion transformer: the model architecture ([`DitConfig`]), the
//! flow-matching objective ([`FlowMatchingConfig`]), and the training run
//! ([`TrainingConfig`]). Every record validates fail-closed and returns
//! [`ConfigError`] on the first violated invariant.
//!
//! Presets are exposed as lazily built read-only singletons through
//! [`get_preset_config`]. Cross-record compatibility is checked by
//! [`validate_config_compatibility`], which reports its outcome through a
//! [`ConfigEventSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compat;
pub mod config;
pub mod docs;
pub mod examples;
pub mod flow;
pub mod model;
pub mod presets;
pub mod report;
pub mod schema;
pub mod training;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use compat::validate_config_compatibility;
pub use compat::validate_config_compatibility_with;
pub use config::*;
pub use docs::config_docs_markdown;
pub use examples::config_toml_example;
pub use flow::*;
pub use model::*;
pub use presets::*;
pub use report::*;
pub use schema::config_schema;
pub use training::*;
