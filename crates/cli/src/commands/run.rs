//! Run Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::{Path, PathBuf};

use specshot_common::layout::FAILURE_FILE;
use specshot_common::{RunId, RunStore, SpecshotConfig};

use crate::output::{
    print_item, print_list, print_message, print_success, OutputFormat, TableDisplay,
};

#[derive(Subcommand)]
pub enum RunCommands {
    /// Create a new run directory for a spec
    Create {
        /// Spec name
        spec: String,
    },

    /// List runs of a spec, newest first
    List {
        /// Spec name; lists specs when omitted
        spec: Option<String>,
    },

    /// Show the latest run of a spec
    Latest {
        /// Spec name
        spec: String,
    },
}

/// Run display wrapper for serialization
#[derive(Serialize)]
pub struct RunDisplay {
    pub spec: String,
    pub run_id: String,
    pub started: String,
    pub failed: bool,
    pub path: PathBuf,
}

impl RunDisplay {
    fn from_dir(spec: &str, run_dir: &Path) -> Self {
        let run_id = run_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let started = RunId::parse(&run_id)
            .and_then(|id| {
                chrono::NaiveDateTime::parse_from_str(id.timestamp(), "%Y%m%d%H%M%S").ok()
            })
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        Self {
            spec: spec.to_string(),
            run_id,
            started,
            failed: run_dir.join(FAILURE_FILE).is_file(),
            path: run_dir.to_path_buf(),
        }
    }
}

impl TableDisplay for RunDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Spec", "Run ID", "Started (UTC)", "Failed", "Path"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.spec.clone(),
            self.run_id.clone(),
            self.started.clone(),
            if self.failed { "yes" } else { "no" }.to_string(),
            self.path.display().to_string(),
        ]
    }
}

#[derive(Serialize)]
pub struct SpecDisplay {
    pub spec: String,
    pub runs: usize,
}

impl TableDisplay for SpecDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Spec", "Runs"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.spec.clone(), self.runs.to_string()]
    }
}

pub fn execute(cmd: RunCommands, config: &SpecshotConfig, format: OutputFormat) -> Result<()> {
    let store = RunStore::new(config.layout());

    match cmd {
        RunCommands::Create { spec } => {
            let run_dir = store.create_run(&spec)?;
            let display = RunDisplay::from_dir(&spec, &run_dir);
            if format != OutputFormat::Json {
                print_success(&format!("Run '{}' created for spec '{}'", display.run_id, spec));
            }
            print_item(&display, format);
        }

        RunCommands::List { spec: Some(spec) } => {
            let displays: Vec<RunDisplay> = store
                .list_runs(&spec)?
                .iter()
                .map(|dir| RunDisplay::from_dir(&spec, dir))
                .collect();
            print_list(&displays, format);
        }

        RunCommands::List { spec: None } => {
            let mut displays = Vec::new();
            for spec in store.list_specs()? {
                let runs = store.list_run_ids(&spec)?.len();
                displays.push(SpecDisplay { spec, runs });
            }
            print_list(&displays, format);
        }

        RunCommands::Latest { spec } => match store.get_latest_run(&spec)? {
            Some(run_dir) => print_item(&RunDisplay::from_dir(&spec, &run_dir), format),
            None => print_message(&format!("No runs found for spec '{}'", spec), format),
        },
    }

    Ok(())
}
