//! Visual baselines and the accept workflow
//!
//! Baselines live in `<root>/baselines/<spec>/<name>.png`. Each acceptance
//! writes `<name>.meta.json` beside the image, recording the hash of the image
//! it replaced and the hash of the new one, so the acceptance chain can be
//! replayed without keeping old images around.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::{default_identity, CompareSettings, SpecshotConfig};
use crate::layout::{self, png_stem, validate_name, ArtifactLayout, FAILURE_SCREENSHOT};
use crate::run_store::RunStore;
use crate::types::{
    AcceptFailure, AcceptOutcome, AcceptanceRecord, BaselineEntry, BaselineInfo, BaselineState,
    BaselineStatus, ScreenshotRef,
};
use crate::visual::{compare_images, CompareOptions};
use crate::{Error, Result};

/// Hex characters kept from the SHA-256 digest
const SHORT_HASH_LEN: usize = 16;

/// Which screenshots to promote, and from which run
#[derive(Debug, Clone, Default)]
pub struct AcceptOptions {
    /// Source run; the latest run when `None`
    pub run_id: Option<String>,

    /// Accept only this screenshot
    pub screenshot: Option<String>,

    /// Accept every screenshot of the run
    pub all: bool,

    /// Identity for the acceptance records; the store's identity when `None`
    pub accepted_by: Option<String>,
}

impl AcceptOptions {
    pub fn screenshot(name: impl Into<String>) -> Self {
        Self {
            screenshot: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    pub fn from_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Short content fingerprint of a file.
///
/// Truncated SHA-256; good for change detection and display, not collision
/// resistant.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(SHORT_HASH_LEN);
    Ok(digest)
}

/// Accepted baselines for every spec under one artifact root
#[derive(Debug, Clone)]
pub struct BaselineStore {
    runs: RunStore,
    compare: CompareSettings,
    identity: String,
}

impl BaselineStore {
    pub fn new(runs: RunStore, compare: CompareSettings) -> Self {
        Self {
            runs,
            compare,
            identity: default_identity(),
        }
    }

    pub fn from_config(config: &SpecshotConfig) -> Self {
        Self {
            runs: RunStore::new(config.layout()),
            compare: config.compare.clone(),
            identity: config.accepted_by(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    fn layout(&self) -> &ArtifactLayout {
        self.runs.layout()
    }

    /// Accepted baselines of a spec, sorted by name
    pub fn baselines_for_spec(&self, spec: &str) -> Result<Vec<BaselineInfo>> {
        validate_name("spec", spec)?;
        let dir = self.layout().baselines_dir(spec);
        let mut baselines = Vec::new();

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(baselines),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            let Some(name) = png_stem(&path) else {
                continue;
            };

            let acceptance = match self.read_acceptance(spec, &name) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping corrupt acceptance record for '{}/{}': {}", spec, name, e);
                    None
                }
            };

            baselines.push(BaselineInfo {
                name,
                path,
                acceptance,
            });
        }

        baselines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(baselines)
    }

    /// Screenshots captured by a run, sorted by name
    pub fn actuals_from_run(&self, run_dir: &Path) -> Result<Vec<ScreenshotRef>> {
        let dir = layout::run_screenshots_dir(run_dir);
        let mut actuals = Vec::new();

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(actuals),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            match png_stem(&path) {
                // Written by the failure bundle, not by the spec
                Some(name) if name == FAILURE_SCREENSHOT => {
                    debug!("Skipping failure screenshot {:?}", path);
                }
                Some(name) => actuals.push(ScreenshotRef { name, path }),
                None => {}
            }
        }

        actuals.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(actuals)
    }

    /// Most recent run of a spec, resolved the same way the run store does
    pub fn latest_run(&self, spec: &str) -> Result<Option<PathBuf>> {
        self.runs.get_latest_run(spec)
    }

    /// Cross-reference baselines with the latest run's screenshots
    pub fn baseline_status(&self, spec: &str) -> Result<BaselineStatus> {
        let baselines = self.baselines_for_spec(spec)?;
        let latest = self.runs.resolve_latest(spec)?;

        let actuals = match &latest {
            Some(run_id) => self.actuals_from_run(&self.runs.get_run_dir(spec, run_id.as_str()))?,
            None => Vec::new(),
        };

        let options = CompareOptions::from(&self.compare);
        let mut entries = Vec::with_capacity(baselines.len());

        for baseline in &baselines {
            let actual = actuals.iter().find(|a| a.name == baseline.name);

            let entry = match actual {
                None => BaselineEntry {
                    name: baseline.name.clone(),
                    baseline_path: baseline.path.clone(),
                    actual_path: None,
                    status: BaselineState::Missing,
                    diff_percent: None,
                },
                Some(actual) => {
                    let result = compare_images(&baseline.path, &actual.path, &options);
                    BaselineEntry {
                        name: baseline.name.clone(),
                        baseline_path: baseline.path.clone(),
                        actual_path: Some(actual.path.clone()),
                        status: if result.matches {
                            BaselineState::Match
                        } else {
                            BaselineState::Diff
                        },
                        diff_percent: Some(result.diff_percent),
                    }
                }
            };
            debug!("Baseline '{}/{}': {}", spec, entry.name, entry.status);
            entries.push(entry);
        }

        let new_screenshots = actuals
            .into_iter()
            .filter(|a| !baselines.iter().any(|b| b.name == a.name))
            .collect();

        Ok(BaselineStatus {
            run_id: latest.map(|id| id.to_string()),
            baselines: entries,
            new_screenshots,
        })
    }

    /// Copy `source` into the spec's baselines as `<name>.png`, replacing any
    /// existing baseline of that name in a single rename
    pub fn copy_to_baselines(&self, spec: &str, name: &str, source: &Path) -> Result<PathBuf> {
        let (staged, _) = self.stage_baseline(spec, name, source)?;
        let dest = self.layout().baseline_image(spec, name);
        staged.persist(&dest)?;
        Ok(dest)
    }

    /// Copy `source` to a temp file in the spec's baselines directory and hash
    /// the staged bytes
    fn stage_baseline(
        &self,
        spec: &str,
        name: &str,
        source: &Path,
    ) -> Result<(NamedTempFile, String)> {
        validate_name("spec", spec)?;
        validate_name("screenshot", name)?;

        let dir = self.layout().baselines_dir(spec);
        std::fs::create_dir_all(&dir)?;

        let mut staged = tempfile::Builder::new().prefix(".tmp-").tempfile_in(&dir)?;
        let mut reader = std::fs::File::open(source)?;
        std::io::copy(&mut reader, staged.as_file_mut())?;
        staged.as_file_mut().flush()?;
        staged.as_file().sync_all()?;

        let hash = hash_file(staged.path())?;
        Ok((staged, hash))
    }

    /// Hash of the current baseline image, `None` before the first acceptance
    pub fn existing_baseline_hash(&self, spec: &str, name: &str) -> Result<Option<String>> {
        validate_name("spec", spec)?;
        validate_name("screenshot", name)?;

        let path = self.layout().baseline_image(spec, name);
        if !path.is_file() {
            return Ok(None);
        }
        hash_file(&path).map(Some)
    }

    /// Acceptance record of a baseline, `None` if it was never accepted
    pub fn read_acceptance(&self, spec: &str, name: &str) -> Result<Option<AcceptanceRecord>> {
        validate_name("spec", spec)?;
        validate_name("screenshot", name)?;

        let path = self.layout().baseline_meta(spec, name);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write the acceptance record for a baseline, replacing the previous one
    pub fn record_acceptance(&self, spec: &str, name: &str, record: &AcceptanceRecord) -> Result<()> {
        validate_name("spec", spec)?;
        validate_name("screenshot", name)?;

        let path = self.layout().baseline_meta(spec, name);
        let json = serde_json::to_string_pretty(record)?;
        layout::write_atomic(&path, json.as_bytes())?;
        Ok(())
    }

    /// Promote screenshots of a run to baselines.
    ///
    /// Each screenshot is accepted independently; a failing item lands in
    /// `failed` and the rest of the batch carries on.
    pub fn accept_baselines(&self, spec: &str, options: &AcceptOptions) -> Result<AcceptOutcome> {
        validate_name("spec", spec)?;

        if options.screenshot.is_none() && !options.all {
            return Err(Error::InvalidRequest(
                "specify a screenshot name or accept all screenshots".to_string(),
            ));
        }

        let run_id = match &options.run_id {
            Some(id) => {
                if !self.runs.run_exists(spec, id) {
                    return Err(Error::NotFound {
                        kind: "run".to_string(),
                        id: format!("{}/{}", spec, id),
                    });
                }
                id.clone()
            }
            None => self
                .runs
                .resolve_latest(spec)?
                .ok_or_else(|| Error::NoRuns(spec.to_string()))?
                .to_string(),
        };
        let run_dir = self.runs.get_run_dir(spec, &run_id);

        let candidates = match &options.screenshot {
            Some(name) => vec![ScreenshotRef {
                name: name.clone(),
                path: layout::run_screenshots_dir(&run_dir).join(format!("{}.png", name)),
            }],
            None => self.actuals_from_run(&run_dir)?,
        };

        let accepted_by = options
            .accepted_by
            .clone()
            .unwrap_or_else(|| self.identity.clone());

        let mut outcome = AcceptOutcome {
            run_id: run_id.clone(),
            ..Default::default()
        };

        for candidate in candidates {
            match self.accept_one(spec, &run_id, &candidate, &accepted_by) {
                Ok(record) => {
                    info!(
                        "Accepted baseline '{}/{}' ({} -> {})",
                        spec,
                        candidate.name,
                        record.previous_hash.as_deref().unwrap_or("none"),
                        record.current_hash
                    );
                    outcome.accepted.push(candidate.name);
                }
                Err(e) => {
                    warn!("Failed to accept '{}/{}': {}", spec, candidate.name, e);
                    outcome.failed.push(AcceptFailure {
                        name: candidate.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    fn accept_one(
        &self,
        spec: &str,
        run_id: &str,
        candidate: &ScreenshotRef,
        accepted_by: &str,
    ) -> Result<AcceptanceRecord> {
        validate_name("screenshot", &candidate.name)?;

        if !candidate.path.is_file() {
            return Err(Error::NotFound {
                kind: "screenshot".to_string(),
                id: candidate.path.display().to_string(),
            });
        }

        let previous_hash = self.existing_baseline_hash(spec, &candidate.name)?;
        let previous_record = self.read_acceptance(spec, &candidate.name).ok().flatten();
        let (staged, current_hash) = self.stage_baseline(spec, &candidate.name, &candidate.path)?;

        let record = AcceptanceRecord {
            accepted_at: Utc::now(),
            accepted_by: accepted_by.to_string(),
            run_id: run_id.to_string(),
            previous_hash,
            current_hash,
        };

        // Record first: if it cannot be written the image stays untouched
        self.record_acceptance(spec, &candidate.name, &record)?;

        let dest = self.layout().baseline_image(spec, &candidate.name);
        if let Err(e) = staged.persist(&dest) {
            self.restore_acceptance(spec, &candidate.name, previous_record.as_ref());
            return Err(e.into());
        }
        Ok(record)
    }

    /// Put back the record an aborted accept replaced
    fn restore_acceptance(&self, spec: &str, name: &str, previous: Option<&AcceptanceRecord>) {
        let result = match previous {
            Some(record) => self.record_acceptance(spec, name, record),
            None => std::fs::remove_file(self.layout().baseline_meta(spec, name))
                .map_err(Into::into),
        };
        if let Err(e) = result {
            warn!("Failed to restore acceptance record for '{}/{}': {}", spec, name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RunStore, BaselineStore) {
        let tmp = TempDir::new().unwrap();
        let runs = RunStore::new(ArtifactLayout::new(tmp.path()));
        let store = BaselineStore::new(runs.clone(), CompareSettings::default())
            .with_identity("tester@ci");
        (tmp, runs, store)
    }

    fn write_png(path: &Path, color: [u8; 4]) {
        RgbaImage::from_pixel(10, 10, image::Rgba(color))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_hash_file_is_short_and_stable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.bin");
        std::fs::write(&path, b"hello world").unwrap();

        let hash = hash_file(&path).unwrap();
        assert_eq!(hash.len(), SHORT_HASH_LEN);
        // sha256("hello world") = b94d27b9934d3e08...
        assert_eq!(hash, "b94d27b9934d3e08");
        assert_eq!(hash, hash_file(&path).unwrap());
    }

    #[test]
    fn test_no_baseline_dir_is_empty() {
        let (_tmp, _runs, store) = setup();
        assert!(store.baselines_for_spec("login").unwrap().is_empty());
        assert_eq!(store.existing_baseline_hash("login", "home").unwrap(), None);
        assert_eq!(store.read_acceptance("login", "home").unwrap(), None);
    }

    #[test]
    fn test_accept_single_first_time() {
        let (_tmp, runs, store) = setup();
        let run_dir = runs.create_run("login").unwrap();
        let source = layout::run_screenshots_dir(&run_dir).join("s1.png");
        write_png(&source, [1, 2, 3, 255]);

        let outcome = store
            .accept_baselines("login", &AcceptOptions::screenshot("s1"))
            .unwrap();
        assert_eq!(outcome.accepted, vec!["s1"]);
        assert!(outcome.failed.is_empty());

        let record = store.read_acceptance("login", "s1").unwrap().unwrap();
        assert_eq!(record.previous_hash, None);
        assert_eq!(record.current_hash, hash_file(&source).unwrap());
        assert_eq!(record.accepted_by, "tester@ci");
        assert_eq!(record.run_id, outcome.run_id);

        let baseline = store.layout().baseline_image("login", "s1");
        assert_eq!(std::fs::read(&baseline).unwrap(), std::fs::read(&source).unwrap());
    }

    #[test]
    fn test_reaccept_chains_hashes() {
        let (_tmp, runs, store) = setup();
        let first = runs.create_run("login").unwrap();
        write_png(&layout::run_screenshots_dir(&first).join("s1.png"), [0, 0, 0, 255]);
        store.accept_baselines("login", &AcceptOptions::screenshot("s1")).unwrap();
        let first_record = store.read_acceptance("login", "s1").unwrap().unwrap();

        let second = runs.create_run("login").unwrap();
        write_png(&layout::run_screenshots_dir(&second).join("s1.png"), [255, 255, 255, 255]);
        store.accept_baselines("login", &AcceptOptions::screenshot("s1")).unwrap();
        let second_record = store.read_acceptance("login", "s1").unwrap().unwrap();

        assert_eq!(second_record.previous_hash, Some(first_record.current_hash.clone()));
        assert_ne!(second_record.current_hash, first_record.current_hash);
    }

    #[test]
    fn test_accept_all_isolates_failures() {
        let (_tmp, runs, store) = setup();
        let run_dir = runs.create_run("cart").unwrap();
        let shots = layout::run_screenshots_dir(&run_dir);
        write_png(&shots.join("good.png"), [9, 9, 9, 255]);
        // listed as a screenshot but cannot be read as a file
        std::fs::create_dir(shots.join("broken.png")).unwrap();

        let outcome = store.accept_baselines("cart", &AcceptOptions::all()).unwrap();
        assert_eq!(outcome.accepted, vec!["good"]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].name, "broken");
        assert!(store.layout().baseline_image("cart", "good").is_file());
    }

    #[test]
    fn test_accept_missing_named_screenshot_fails_item() {
        let (_tmp, runs, store) = setup();
        runs.create_run("cart").unwrap();

        let outcome = store
            .accept_baselines("cart", &AcceptOptions::screenshot("nope"))
            .unwrap();
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.failed[0].name, "nope");
    }

    #[test]
    fn test_accept_without_runs() {
        let (_tmp, _runs, store) = setup();
        let err = store
            .accept_baselines("empty", &AcceptOptions::all())
            .unwrap_err();
        assert!(matches!(err, Error::NoRuns(_)));
        assert!(err.to_string().contains("no runs found"));
    }

    #[test]
    fn test_accept_requires_selection() {
        let (_tmp, runs, store) = setup();
        runs.create_run("cart").unwrap();
        assert!(matches!(
            store.accept_baselines("cart", &AcceptOptions::default()),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_accept_from_explicit_run() {
        let (_tmp, runs, store) = setup();
        let older = runs.create_run("cart").unwrap();
        write_png(&layout::run_screenshots_dir(&older).join("s1.png"), [5, 5, 5, 255]);
        runs.create_run("cart").unwrap();

        let older_id = older.file_name().unwrap().to_string_lossy().to_string();
        let outcome = store
            .accept_baselines("cart", &AcceptOptions::screenshot("s1").from_run(&older_id))
            .unwrap();
        assert_eq!(outcome.run_id, older_id);
        assert_eq!(outcome.accepted, vec!["s1"]);

        let missing = AcceptOptions::all().from_run("run-20000101000000-000000");
        assert!(matches!(
            store.accept_baselines("cart", &missing),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_corrupt_meta_does_not_abort_listing() {
        let (_tmp, _runs, store) = setup();
        let dir = store.layout().baselines_dir("login");
        std::fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("a.png"), [0, 0, 0, 255]);
        write_png(&dir.join("b.png"), [0, 0, 0, 255]);
        std::fs::write(dir.join("a.meta.json"), "{ not json").unwrap();

        let baselines = store.baselines_for_spec("login").unwrap();
        let names: Vec<_> = baselines.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(baselines[0].acceptance.is_none());
    }

    #[test]
    fn test_status_reports_every_state() {
        let (_tmp, runs, store) = setup();
        let dir = store.layout().baselines_dir("home");
        std::fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("same.png"), [10, 10, 10, 255]);
        write_png(&dir.join("changed.png"), [255, 0, 0, 255]);
        write_png(&dir.join("gone.png"), [0, 0, 0, 255]);

        let run_dir = runs.create_run("home").unwrap();
        let shots = layout::run_screenshots_dir(&run_dir);
        write_png(&shots.join("same.png"), [10, 10, 10, 255]);
        write_png(&shots.join("changed.png"), [0, 0, 255, 255]);
        write_png(&shots.join("fresh.png"), [1, 1, 1, 255]);

        let status = store.baseline_status("home").unwrap();
        let by_name = |n: &str| status.baselines.iter().find(|e| e.name == n).unwrap();

        assert_eq!(by_name("same").status, BaselineState::Match);
        assert_eq!(by_name("changed").status, BaselineState::Diff);
        assert!(by_name("changed").diff_percent.unwrap() > 0.0);
        assert_eq!(by_name("gone").status, BaselineState::Missing);
        assert_eq!(status.baselines.len(), 3);

        let new_names: Vec<_> = status.new_screenshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(new_names, vec!["fresh"]);
        assert_eq!(
            status.run_id.as_deref(),
            run_dir.file_name().and_then(|n| n.to_str())
        );
    }

    #[test]
    fn test_status_without_runs_marks_missing() {
        let (_tmp, _runs, store) = setup();
        let dir = store.layout().baselines_dir("home");
        std::fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("only.png"), [0, 0, 0, 255]);

        let status = store.baseline_status("home").unwrap();
        assert_eq!(status.run_id, None);
        assert_eq!(status.baselines[0].status, BaselineState::Missing);
        assert!(status.new_screenshots.is_empty());
    }

    #[test]
    fn test_baseline_swap_is_never_torn() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let (tmp, _runs, store) = setup();
        let small = tmp.path().join("small.png");
        let large = tmp.path().join("large.png");
        std::fs::write(&small, vec![1u8; 1024]).unwrap();
        std::fs::write(&large, vec![2u8; 8 * 1024 * 1024]).unwrap();

        let dest = store.copy_to_baselines("home", "hero", &small).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let done = done.clone();
            let dest = dest.clone();
            std::thread::spawn(move || {
                let mut torn = Vec::new();
                while !done.load(Ordering::Relaxed) {
                    match std::fs::metadata(&dest) {
                        Ok(m) if m.len() == 1024 || m.len() == 8 * 1024 * 1024 => {}
                        Ok(m) => torn.push(m.len()),
                        Err(e) => panic!("baseline vanished during swap: {}", e),
                    }
                }
                torn
            })
        };

        for i in 0..10 {
            let source = if i % 2 == 0 { &large } else { &small };
            store.copy_to_baselines("home", "hero", source).unwrap();
        }
        done.store(true, Ordering::Relaxed);

        let torn = reader.join().unwrap();
        assert!(torn.is_empty(), "reader saw partial sizes {:?}", &torn[..torn.len().min(5)]);

        let leftovers: Vec<_> = std::fs::read_dir(store.layout().baselines_dir("home"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(leftovers, vec!["hero.png"]);
    }

    #[test]
    fn test_unwritable_record_keeps_previous_image() {
        let (_tmp, runs, store) = setup();
        let first = runs.create_run("login").unwrap();
        write_png(&layout::run_screenshots_dir(&first).join("s1.png"), [0, 0, 0, 255]);
        store.accept_baselines("login", &AcceptOptions::screenshot("s1")).unwrap();
        let baseline = store.layout().baseline_image("login", "s1");
        let accepted_bytes = std::fs::read(&baseline).unwrap();

        // A directory where the record goes makes the rename fail
        let meta = store.layout().baseline_meta("login", "s1");
        std::fs::remove_file(&meta).unwrap();
        std::fs::create_dir(&meta).unwrap();

        let second = runs.create_run("login").unwrap();
        write_png(&layout::run_screenshots_dir(&second).join("s1.png"), [255, 255, 255, 255]);
        let outcome = store
            .accept_baselines("login", &AcceptOptions::screenshot("s1"))
            .unwrap();

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(std::fs::read(&baseline).unwrap(), accepted_bytes);
    }

    #[test]
    fn test_failure_screenshot_is_not_an_actual() {
        use crate::bundle::{generate_failure_bundle, FailureReport};

        let (tmp, runs, store) = setup();
        let run_dir = runs.create_run("cart").unwrap();
        write_png(&layout::run_screenshots_dir(&run_dir).join("header.png"), [5, 5, 5, 255]);

        let raw = tmp.path().join("raw");
        std::fs::create_dir_all(&raw).unwrap();
        write_png(&raw.join("test-failed-1.png"), [200, 0, 0, 255]);
        let report = FailureReport {
            step_id: "step-2".to_string(),
            action: "click".to_string(),
            error_message: "Timeout 5000ms exceeded".to_string(),
            ..Default::default()
        };
        generate_failure_bundle(&run_dir, &report, &raw).unwrap();
        assert!(layout::run_screenshots_dir(&run_dir).join("failure.png").is_file());

        let names: Vec<_> = store
            .actuals_from_run(&run_dir)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["header"]);

        let outcome = store.accept_baselines("cart", &AcceptOptions::all()).unwrap();
        assert_eq!(outcome.accepted, vec!["header"]);
        assert!(!store.layout().baseline_image("cart", "failure").exists());
    }
}
