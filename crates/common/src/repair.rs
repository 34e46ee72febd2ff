//! Failure classification and repair suggestions
//!
//! Classification is a first-match scan over a fixed, ordered list of
//! patterns; suggestions come from a fixed table keyed by [`ErrorType`].
//! Nothing here touches state, so the same input always yields the same plan.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::bundle::load_failure_bundle;
use crate::types::{ErrorType, FailureDescriptor, RepairPlan, RepairSuggestion, SuggestionType};
use crate::Result;

/// Minimum confidence for a primary suggestion to be applied without asking
pub const AUTO_APPLY_THRESHOLD: f64 = 0.9;

/// Ordered classification rules; the first matching pattern wins
static CLASSIFIERS: Lazy<Vec<(Regex, ErrorType)>> = Lazy::new(|| {
    [
        (r"(?i)resolved\s+to\s+\d+\s+elements?", ErrorType::LocatorNotFound),
        (r"(?i)timeout", ErrorType::Timeout),
        (r"(?i)expect|received:|assertion\s*error", ErrorType::AssertionFailed),
        (
            r"(?i)screenshot|snapshot|visual|pixels?\s+(are\s+)?differ|images?\s+differ|image\s+comparison",
            ErrorType::ScreenshotDiff,
        ),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("valid classifier pattern"), kind))
    .collect()
});

/// One row entry of the repair table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionTemplate {
    pub kind: SuggestionType,
    pub description: &'static str,
    pub confidence: f64,
}

impl SuggestionTemplate {
    const fn new(kind: SuggestionType, description: &'static str, confidence: f64) -> Self {
        Self {
            kind,
            description,
            confidence,
        }
    }

    pub fn to_suggestion(&self) -> RepairSuggestion {
        RepairSuggestion {
            kind: self.kind,
            description: self.description.to_string(),
            confidence: self.confidence,
        }
    }
}

/// Error type to ordered suggestions, with fixed confidences
pub static REPAIR_TABLE: &[(ErrorType, &[SuggestionTemplate])] = &[
    (
        ErrorType::LocatorNotFound,
        &[
            SuggestionTemplate::new(
                SuggestionType::UpdateLocator,
                "Update the locator to match the element's current role, label or test id",
                0.8,
            ),
            SuggestionTemplate::new(
                SuggestionType::Investigate,
                "Check whether the page structure changed or the element renders conditionally",
                0.4,
            ),
        ],
    ),
    (
        ErrorType::Timeout,
        &[
            SuggestionTemplate::new(
                SuggestionType::IncreaseTimeout,
                "Increase the step timeout or wait for a more specific ready condition",
                0.8,
            ),
            SuggestionTemplate::new(
                SuggestionType::Investigate,
                "Check for slow network requests or an element that never becomes ready",
                0.4,
            ),
        ],
    ),
    (
        ErrorType::AssertionFailed,
        &[SuggestionTemplate::new(
            SuggestionType::FixAssertion,
            "Review the expected value; update the assertion if the new behaviour is intended",
            0.5,
        )],
    ),
    (
        ErrorType::ScreenshotDiff,
        &[
            SuggestionTemplate::new(
                SuggestionType::UpdateBaseline,
                "Accept the new screenshot as the baseline if the visual change is intended",
                0.6,
            ),
            SuggestionTemplate::new(
                SuggestionType::AddMask,
                "Mask dynamic regions such as timestamps, avatars or animations",
                0.7,
            ),
            SuggestionTemplate::new(
                SuggestionType::Investigate,
                "Inspect the diff image for an unintended layout or style regression",
                0.5,
            ),
        ],
    ),
    (
        ErrorType::Unknown,
        &[SuggestionTemplate::new(
            SuggestionType::Investigate,
            "Inspect the trace, screenshot and logs to find the root cause",
            0.3,
        )],
    ),
];

/// Classify a raw error message.
///
/// Precedence: locator_not_found > timeout > assertion_failed >
/// screenshot_diff > unknown.
pub fn classify_error(message: &str) -> ErrorType {
    CLASSIFIERS
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorType::Unknown)
}

/// Table row for an error type
pub fn suggestions_for(error_type: ErrorType) -> &'static [SuggestionTemplate] {
    REPAIR_TABLE
        .iter()
        .find(|(kind, _)| *kind == error_type)
        .map(|(_, templates)| *templates)
        .unwrap_or(&[])
}

/// Suggestions for a failure, in table order
pub fn generate_repair_suggestions(failure: &FailureDescriptor) -> Vec<RepairSuggestion> {
    suggestions_for(failure.error_type)
        .iter()
        .map(SuggestionTemplate::to_suggestion)
        .collect()
}

/// Rank suggestions and decide whether the best one may be auto-applied.
///
/// Sorting is stable, so equal confidences keep their table order.
pub fn generate_repair_plan(mut suggestions: Vec<RepairSuggestion>) -> RepairPlan {
    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let primary_suggestion = suggestions.first().cloned();
    let auto_applicable = primary_suggestion
        .as_ref()
        .map(|s| s.confidence >= AUTO_APPLY_THRESHOLD)
        .unwrap_or(false);

    RepairPlan {
        suggestions,
        primary_suggestion,
        auto_applicable,
        requires_confirmation: !auto_applicable,
    }
}

/// Repair plan for a run's failure bundle, `None` if the run has no bundle
pub fn plan_for_run(run_dir: &Path) -> Result<Option<RepairPlan>> {
    let Some(bundle) = load_failure_bundle(run_dir)? else {
        return Ok(None);
    };

    let suggestions = if bundle.suggestions.is_empty() {
        generate_repair_suggestions(&bundle.failure)
    } else {
        bundle.suggestions
    };
    Ok(Some(generate_repair_plan(suggestions)))
}
