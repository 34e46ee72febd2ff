//! Failure bundles
//!
//! A failure bundle gathers whatever the test executor left behind (trace,
//! screenshots, logs, screenshot-assertion images) into a fixed layout inside
//! the run directory and writes a single `failure.json` describing the failure
//! and the ranked repair suggestions for it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::layout::{self, FAILURE_FILE};
use crate::repair::{classify_error, generate_repair_suggestions};
use crate::types::{
    BundleArtifacts, DiffArtifacts, ErrorType, ExecutionContext, FailureBundle, FailureDescriptor,
};
use crate::{Error, Result};

// Bundle-local destinations, relative to the run directory
const TRACE_DEST: &str = "artifacts/trace.zip";
const VIDEO_DEST: &str = "artifacts/video.webm";
const SCREENSHOT_DEST: &str = "artifacts/screenshots/failure.png";
const DIFF_BASELINE_DEST: &str = "artifacts/diff/baseline.png";
const DIFF_ACTUAL_DEST: &str = "artifacts/diff/actual.png";
const DIFF_IMAGE_DEST: &str = "artifacts/diff/diff.png";
const CONSOLE_LOG_DEST: &str = "artifacts/logs/console.json";
const NETWORK_LOG_DEST: &str = "artifacts/logs/network.json";

/// Content of a log file when the executor captured nothing
const EMPTY_LOG: &[u8] = b"[]";

/// A failed step as reported by the test executor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureReport {
    pub step_id: String,
    pub action: String,
    pub error_message: String,

    /// Classified from `error_message` when absent
    #[serde(default)]
    pub error_type: Option<ErrorType>,

    #[serde(default)]
    pub context: ExecutionContext,
}

impl FailureReport {
    pub fn descriptor(&self) -> FailureDescriptor {
        FailureDescriptor {
            step_id: self.step_id.clone(),
            action: self.action.clone(),
            error_message: self.error_message.clone(),
            error_type: self
                .error_type
                .unwrap_or_else(|| classify_error(&self.error_message)),
        }
    }
}

/// Artifacts found in a raw executor output tree
#[derive(Debug, Default)]
struct DiscoveredArtifacts {
    trace: Option<PathBuf>,
    video: Option<PathBuf>,
    screenshot: Option<PathBuf>,
    expected: Option<PathBuf>,
    actual: Option<PathBuf>,
    diff: Option<PathBuf>,
    console_log: Option<PathBuf>,
    network_log: Option<PathBuf>,
}

impl DiscoveredArtifacts {
    /// Walk `dir` recursively; the first match per kind wins, in file-name order
    fn scan(dir: &Path) -> Self {
        let mut found = Self::default();
        if !dir.is_dir() {
            debug!("Raw artifacts directory {:?} does not exist", dir);
            return found;
        }

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            let path = entry.path();
            let slot = if name.ends_with("-expected.png") {
                &mut found.expected
            } else if name.ends_with("-actual.png") {
                &mut found.actual
            } else if name.ends_with("-diff.png") {
                &mut found.diff
            } else if name.ends_with(".png") && (name.contains("failed") || name.contains("failure")) {
                &mut found.screenshot
            } else if name.ends_with(".zip") && name.contains("trace") {
                &mut found.trace
            } else if name.ends_with(".webm") {
                &mut found.video
            } else if name.starts_with("console") && has_ext(&name, &["json", "log", "txt"]) {
                &mut found.console_log
            } else if name.starts_with("network") && has_ext(&name, &["json", "har"]) {
                &mut found.network_log
            } else {
                continue;
            };

            if slot.is_none() {
                debug!("Found raw artifact {:?}", path);
                *slot = Some(path.to_path_buf());
            }
        }

        found
    }
}

fn has_ext(name: &str, exts: &[&str]) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| exts.contains(&ext))
        .unwrap_or(false)
}

/// Copy `src` to `run_dir/dest`, skipping the copy when both are the same file
fn copy_artifact(run_dir: &Path, src: &Path, dest: &str) -> Result<String> {
    let dest_path = run_dir.join(dest);

    if let (Ok(a), Ok(b)) = (src.canonicalize(), dest_path.canonicalize()) {
        if a == b {
            debug!("Artifact {:?} already in place", dest_path);
            return Ok(dest.to_string());
        }
    }

    if let Some(parent) = dest_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(src, &dest_path)?;
    Ok(dest.to_string())
}

/// Copy a captured log, or leave an empty one so the bundle schema is stable
fn place_log(run_dir: &Path, src: Option<&Path>, dest: &str) -> Result<String> {
    if let Some(src) = src {
        return copy_artifact(run_dir, src, dest);
    }

    let dest_path = run_dir.join(dest);
    if !dest_path.exists() {
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&dest_path, EMPTY_LOG)?;
    }
    Ok(dest.to_string())
}

fn dir_name(path: Option<&Path>) -> Option<String> {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
}

/// Build the failure bundle for a run from the executor's raw artifacts.
///
/// Missing artifacts are simply left out of the bundle. Running it again for
/// the same run replaces the previous `failure.json`.
pub fn generate_failure_bundle(
    run_dir: &Path,
    failure: &FailureReport,
    raw_artifacts_dir: &Path,
) -> Result<PathBuf> {
    let run_id = dir_name(Some(run_dir)).ok_or_else(|| Error::NotFound {
        kind: "run".to_string(),
        id: run_dir.display().to_string(),
    })?;
    if !run_dir.is_dir() {
        return Err(Error::NotFound {
            kind: "run".to_string(),
            id: run_dir.display().to_string(),
        });
    }
    let spec_name = dir_name(run_dir.parent()).unwrap_or_default();

    let descriptor = failure.descriptor();
    let found = DiscoveredArtifacts::scan(raw_artifacts_dir);
    let mut artifacts = BundleArtifacts::default();

    if let Some(src) = &found.trace {
        artifacts.trace = Some(copy_artifact(run_dir, src, TRACE_DEST)?);
    }
    if let Some(src) = &found.video {
        artifacts.video = Some(copy_artifact(run_dir, src, VIDEO_DEST)?);
    }
    if let Some(src) = &found.screenshot {
        artifacts.screenshot = Some(copy_artifact(run_dir, src, SCREENSHOT_DEST)?);
    }

    if descriptor.error_type == ErrorType::ScreenshotDiff {
        match (&found.expected, &found.actual, &found.diff) {
            (Some(expected), Some(actual), Some(diff)) => {
                artifacts.diff = Some(DiffArtifacts {
                    baseline: copy_artifact(run_dir, expected, DIFF_BASELINE_DEST)?,
                    actual: copy_artifact(run_dir, actual, DIFF_ACTUAL_DEST)?,
                    diff: copy_artifact(run_dir, diff, DIFF_IMAGE_DEST)?,
                });
            }
            _ => debug!("Incomplete screenshot diff images for {}", run_id),
        }
    }

    artifacts.console_log = Some(place_log(
        run_dir,
        found.console_log.as_deref(),
        CONSOLE_LOG_DEST,
    )?);
    artifacts.network_log = Some(place_log(
        run_dir,
        found.network_log.as_deref(),
        NETWORK_LOG_DEST,
    )?);

    if artifacts.trace.is_none() {
        warn!("No trace found for failed run {}", run_id);
    }

    let suggestions = generate_repair_suggestions(&descriptor);
    let bundle = FailureBundle {
        run_id: run_id.clone(),
        spec_name,
        failed_at: Utc::now(),
        failure: descriptor,
        context: failure.context.clone(),
        artifacts,
        suggestions,
    };

    let path = run_dir.join(FAILURE_FILE);
    let json = serde_json::to_string_pretty(&bundle)?;
    layout::write_atomic(&path, json.as_bytes())?;

    info!(
        "Wrote failure bundle for {} ({})",
        run_id, bundle.failure.error_type
    );
    Ok(path)
}

/// Failure bundle of a run, `None` if the run did not fail
pub fn load_failure_bundle(run_dir: &Path) -> Result<Option<FailureBundle>> {
    let path = run_dir.join(FAILURE_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}
