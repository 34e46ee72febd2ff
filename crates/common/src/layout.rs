//! On-disk layout of the artifact root
//!
//! ```text
//! <root>/runs/<spec>/run-<timestamp>-<hex>/
//!     artifacts/screenshots/*.png
//!     artifacts/logs/{console,network}.json
//!     artifacts/trace.zip
//!     failure.json
//! <root>/runs/<spec>/latest
//! <root>/baselines/<spec>/<name>.png
//! <root>/baselines/<spec>/<name>.meta.json
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Run-local artifact directory
pub const ARTIFACTS_DIR: &str = "artifacts";
/// Screenshots directory inside `artifacts/`
pub const SCREENSHOTS_DIR: &str = "screenshots";
/// Logs directory inside `artifacts/`
pub const LOGS_DIR: &str = "logs";
/// Failure descriptor file, one per run
pub const FAILURE_FILE: &str = "failure.json";
/// Screenshot name the failure bundle reserves in `artifacts/screenshots/`
pub const FAILURE_SCREENSHOT: &str = "failure";
/// Latest-run pointer file inside a spec's runs directory
pub const LATEST_POINTER: &str = "latest";

const PNG_EXT: &str = "png";
const META_SUFFIX: &str = ".meta.json";

/// Path composition for everything under one artifact root
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the artifact root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory holding every spec's runs
    pub fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    pub fn spec_runs_dir(&self, spec: &str) -> PathBuf {
        self.runs_dir().join(spec)
    }

    pub fn latest_pointer(&self, spec: &str) -> PathBuf {
        self.spec_runs_dir(spec).join(LATEST_POINTER)
    }

    pub fn run_dir(&self, spec: &str, run_id: &str) -> PathBuf {
        self.spec_runs_dir(spec).join(run_id)
    }

    /// Get the directory holding every spec's baselines
    pub fn baselines_root(&self) -> PathBuf {
        self.root.join("baselines")
    }

    pub fn baselines_dir(&self, spec: &str) -> PathBuf {
        self.baselines_root().join(spec)
    }

    pub fn baseline_image(&self, spec: &str, name: &str) -> PathBuf {
        self.baselines_dir(spec).join(format!("{}.{}", name, PNG_EXT))
    }

    pub fn baseline_meta(&self, spec: &str, name: &str) -> PathBuf {
        self.baselines_dir(spec).join(format!("{}{}", name, META_SUFFIX))
    }
}

/// Screenshots directory of a run
pub fn run_screenshots_dir(run_dir: &Path) -> PathBuf {
    run_dir.join(ARTIFACTS_DIR).join(SCREENSHOTS_DIR)
}

/// Logs directory of a run
pub fn run_logs_dir(run_dir: &Path) -> PathBuf {
    run_dir.join(ARTIFACTS_DIR).join(LOGS_DIR)
}

/// Returns the screenshot name for a `*.png` path, `None` for anything else
pub fn png_stem(path: &Path) -> Option<String> {
    let is_png = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(PNG_EXT))
        .unwrap_or(false);
    if !is_png {
        return None;
    }
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

/// Reject names that would escape their directory once joined onto a path
pub fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Replace `path` with `data` in a single rename.
///
/// The bytes land in a temp file beside the destination first, so readers see
/// either the previous contents or the new ones.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
