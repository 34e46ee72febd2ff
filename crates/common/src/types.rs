//! Core types for Specshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Where and how the failing step was executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub url: String,
    pub viewport: Viewport,
    pub browser: String,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            url: String::new(),
            viewport: Viewport::default(),
            browser: "chromium".to_string(),
        }
    }
}

/// Closed classification of a failure's root cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    LocatorNotFound,
    Timeout,
    AssertionFailed,
    ScreenshotDiff,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::LocatorNotFound => "locator_not_found",
            ErrorType::Timeout => "timeout",
            ErrorType::AssertionFailed => "assertion_failed",
            ErrorType::ScreenshotDiff => "screenshot_diff",
            ErrorType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ErrorType::LocatorNotFound,
            ErrorType::Timeout,
            ErrorType::AssertionFailed,
            ErrorType::ScreenshotDiff,
            ErrorType::Unknown,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| format!("unknown error type '{}'", s))
    }
}

/// Kind of remediation a suggestion proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    UpdateLocator,
    IncreaseTimeout,
    FixAssertion,
    UpdateBaseline,
    AddMask,
    Investigate,
}

impl std::fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionType::UpdateLocator => write!(f, "update_locator"),
            SuggestionType::IncreaseTimeout => write!(f, "increase_timeout"),
            SuggestionType::FixAssertion => write!(f, "fix_assertion"),
            SuggestionType::UpdateBaseline => write!(f, "update_baseline"),
            SuggestionType::AddMask => write!(f, "add_mask"),
            SuggestionType::Investigate => write!(f, "investigate"),
        }
    }
}

/// A confidence-scored candidate fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairSuggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub description: String,
    /// In `[0, 1]`
    pub confidence: f64,
}

/// Suggestions ranked for an interactive repair flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairPlan {
    /// Sorted by confidence, highest first
    pub suggestions: Vec<RepairSuggestion>,
    pub primary_suggestion: Option<RepairSuggestion>,
    pub auto_applicable: bool,
    pub requires_confirmation: bool,
}

/// The failed step as recorded in a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDescriptor {
    pub step_id: String,
    pub action: String,
    pub error_message: String,
    pub error_type: ErrorType,
}

/// Expected/actual/diff image trio of a screenshot assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffArtifacts {
    pub baseline: String,
    pub actual: String,
    pub diff: String,
}

/// Copied artifacts, as paths relative to the run directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffArtifacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_log: Option<String>,
}

/// Self-contained record of one failed run, stored as `failure.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBundle {
    pub run_id: String,
    pub spec_name: String,
    pub failed_at: DateTime<Utc>,
    pub failure: FailureDescriptor,
    pub context: ExecutionContext,
    pub artifacts: BundleArtifacts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<RepairSuggestion>,
}

/// Metadata written beside a baseline each time it is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceRecord {
    pub accepted_at: DateTime<Utc>,
    pub accepted_by: String,
    pub run_id: String,
    /// `None` on first acceptance
    pub previous_hash: Option<String>,
    pub current_hash: String,
}

/// Outcome of comparing two images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(rename = "match")]
    pub matches: bool,
    /// Percentage of mismatched pixels, 0 to 100
    pub diff_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_path: Option<PathBuf>,
}

impl ComparisonResult {
    pub(crate) fn failed() -> Self {
        Self {
            matches: false,
            diff_percent: 0.0,
            diff_path: None,
        }
    }
}

/// A screenshot file addressed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub name: String,
    pub path: PathBuf,
}

/// An accepted baseline image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineInfo {
    pub name: String,
    pub path: PathBuf,
    pub acceptance: Option<AcceptanceRecord>,
}

/// Result of checking one baseline against the latest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineState {
    Match,
    Diff,
    Missing,
}

impl std::fmt::Display for BaselineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineState::Match => write!(f, "match"),
            BaselineState::Diff => write!(f, "diff"),
            BaselineState::Missing => write!(f, "missing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub name: String,
    pub baseline_path: PathBuf,
    pub actual_path: Option<PathBuf>,
    pub status: BaselineState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_percent: Option<f64>,
}

/// Baselines cross-referenced with the latest run's screenshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineStatus {
    /// Run the actuals were taken from, if the spec has any run
    pub run_id: Option<String>,
    pub baselines: Vec<BaselineEntry>,
    pub new_screenshots: Vec<ScreenshotRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptFailure {
    pub name: String,
    pub reason: String,
}

/// Per-item results of an accept batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptOutcome {
    pub run_id: String,
    pub accepted: Vec<String>,
    pub failed: Vec<AcceptFailure>,
}
