//! Specshot Common Library
//!
//! Artifact storage for browser test runs: timestamped run directories,
//! accepted screenshot baselines, pixel comparison, failure bundles and
//! repair suggestions. Everything lives under one artifact root on disk.

pub mod baseline;
pub mod bundle;
pub mod config;
pub mod error;
pub mod layout;
pub mod repair;
pub mod run_store;
pub mod types;
pub mod visual;

// Re-export commonly used types
pub use baseline::{hash_file, AcceptOptions, BaselineStore};
pub use bundle::{generate_failure_bundle, load_failure_bundle, FailureReport};
pub use config::{CompareSettings, SpecshotConfig};
pub use error::{Error, Result};
pub use layout::ArtifactLayout;
pub use repair::{
    classify_error, generate_repair_plan, generate_repair_suggestions, plan_for_run,
    AUTO_APPLY_THRESHOLD,
};
pub use run_store::{RunId, RunStore};
pub use types::*;
pub use visual::{compare_images, CompareOptions};

/// Specshot version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
