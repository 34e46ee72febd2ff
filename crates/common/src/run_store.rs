//! Immutable per-spec run directories with a "latest" pointer
//!
//! Every execution of a spec gets a fresh directory named after a [`RunId`].
//! Existing run directories are never reused or overwritten; the only mutable
//! piece of state is the `latest` pointer file, which is replaced atomically
//! and therefore always names a run that exists (or is absent).

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::layout::{self, validate_name, ArtifactLayout};
use crate::Result;

static RUN_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^run-(\d{14})-([0-9a-f]{6})$").expect("valid run id pattern"));

/// Attempts before giving up on finding an unused run id
const MAX_CREATE_ATTEMPTS: usize = 8;

/// Identifier of one run: `run-<YYYYMMDDHHMMSS>-<6 hex>`
///
/// The fixed-width UTC timestamp comes first so lexical order is creation
/// order down to the second; the random suffix keeps runs started within the
/// same second apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh id for the current instant
    pub fn generate() -> Self {
        let suffix: [u8; 3] = rand::random();
        Self(format!(
            "run-{}-{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            hex::encode(suffix)
        ))
    }

    /// Parse a directory name, `None` if it is not a run id
    pub fn parse(s: &str) -> Option<Self> {
        RUN_ID_RE.is_match(s).then(|| Self(s.to_string()))
    }

    /// The 14-digit timestamp portion
    pub fn timestamp(&self) -> &str {
        &self.0[4..18]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store of run directories under `<root>/runs/<spec>/`
#[derive(Debug, Clone)]
pub struct RunStore {
    layout: ArtifactLayout,
}

impl RunStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Create a new, empty run directory and point `latest` at it
    pub fn create_run(&self, spec: &str) -> Result<PathBuf> {
        validate_name("spec", spec)?;
        std::fs::create_dir_all(self.layout.spec_runs_dir(spec))?;

        let mut attempt = 0;
        let (run_id, run_dir) = loop {
            let run_id = RunId::generate();
            let run_dir = self.layout.run_dir(spec, run_id.as_str());
            // create_dir (not create_dir_all) so an existing run is never adopted
            match std::fs::create_dir(&run_dir) {
                Ok(()) => break (run_id, run_dir),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists
                    && attempt + 1 < MAX_CREATE_ATTEMPTS =>
                {
                    debug!("Run id {} already taken, retrying", run_id);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        std::fs::create_dir_all(layout::run_screenshots_dir(&run_dir))?;
        std::fs::create_dir_all(layout::run_logs_dir(&run_dir))?;

        // The run is complete on disk; a failed pointer update only leaves
        // `latest` lagging behind, it can never dangle.
        if let Err(e) = self.update_latest(spec, &run_id) {
            warn!("Failed to update latest pointer for '{}': {}", spec, e);
        }

        info!("Created run {} for spec '{}'", run_id, spec);
        Ok(run_dir)
    }

    fn update_latest(&self, spec: &str, run_id: &RunId) -> Result<()> {
        let pointer = self.layout.latest_pointer(spec);
        layout::write_atomic(&pointer, run_id.as_str().as_bytes())?;
        debug!("Pointed {:?} at {}", pointer, run_id);
        Ok(())
    }

    /// Run id the `latest` pointer names, if it is present and valid
    pub fn read_latest_pointer(&self, spec: &str) -> Result<Option<RunId>> {
        validate_name("spec", spec)?;
        let pointer = self.layout.latest_pointer(spec);

        let content = match std::fs::read_to_string(&pointer) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!("Unreadable latest pointer {:?}: {}", pointer, e);
                return Ok(None);
            }
        };

        let Some(run_id) = RunId::parse(content.trim()) else {
            warn!("Ignoring malformed latest pointer {:?}", pointer);
            return Ok(None);
        };

        if !self.run_exists(spec, run_id.as_str()) {
            warn!("Latest pointer for '{}' names missing run {}", spec, run_id);
            return Ok(None);
        }

        Ok(Some(run_id))
    }

    /// The single notion of "most recent run" shared by every component.
    ///
    /// A valid pointer wins; otherwise the greatest run id on disk.
    pub fn resolve_latest(&self, spec: &str) -> Result<Option<RunId>> {
        if let Some(run_id) = self.read_latest_pointer(spec)? {
            return Ok(Some(run_id));
        }
        Ok(self.scan_run_ids(spec)?.into_iter().max())
    }

    /// Directory of the most recent run, `None` if the spec has no runs
    pub fn get_latest_run(&self, spec: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .resolve_latest(spec)?
            .map(|id| self.layout.run_dir(spec, id.as_str())))
    }

    /// Run ids for a spec, newest first by embedded timestamp
    pub fn list_run_ids(&self, spec: &str) -> Result<Vec<RunId>> {
        let mut ids = self.scan_run_ids(spec)?;
        let latest = self.read_latest_pointer(spec)?;

        ids.sort_by(|a, b| {
            b.timestamp().cmp(a.timestamp()).then_with(|| {
                // Same second: the pointer target was created last.
                match (Some(a) == latest.as_ref(), Some(b) == latest.as_ref()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => b.cmp(a),
                }
            })
        });

        Ok(ids)
    }

    /// Run directories for a spec, newest first
    pub fn list_runs(&self, spec: &str) -> Result<Vec<PathBuf>> {
        Ok(self
            .list_run_ids(spec)?
            .into_iter()
            .map(|id| self.layout.run_dir(spec, id.as_str()))
            .collect())
    }

    pub fn get_run_dir(&self, spec: &str, run_id: &str) -> PathBuf {
        self.layout.run_dir(spec, run_id)
    }

    pub fn run_exists(&self, spec: &str, run_id: &str) -> bool {
        validate_name("spec", spec).is_ok()
            && validate_name("run", run_id).is_ok()
            && self.get_run_dir(spec, run_id).is_dir()
    }

    /// Spec names that have a runs directory
    pub fn list_specs(&self) -> Result<Vec<String>> {
        let runs_dir = self.layout.runs_dir();
        let mut specs = Vec::new();

        let entries = match std::fs::read_dir(&runs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(specs),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    specs.push(name.to_string());
                }
            }
        }

        specs.sort();
        Ok(specs)
    }

    fn scan_run_ids(&self, spec: &str) -> Result<Vec<RunId>> {
        validate_name("spec", spec)?;
        let spec_dir = self.layout.spec_runs_dir(spec);
        let mut ids = Vec::new();

        let entries = match std::fs::read_dir(&spec_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().to_str().and_then(RunId::parse) {
                Some(id) => ids.push(id),
                None => debug!("Skipping non-run entry {:?}", entry.path()),
            }
        }

        Ok(ids)
    }
}
