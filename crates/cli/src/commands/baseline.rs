//! Baseline Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use specshot_common::{
    AcceptOptions, BaselineEntry, BaselineInfo, BaselineStore, ScreenshotRef, SpecshotConfig,
};

use crate::output::{
    or_dash, print_error, print_info, print_json, print_list, print_success, print_warning,
    OutputFormat, TableDisplay,
};

#[derive(Subcommand)]
pub enum BaselineCommands {
    /// List accepted baselines of a spec
    List {
        /// Spec name
        spec: String,
    },

    /// Compare baselines against the latest run
    Status {
        /// Spec name
        spec: String,
    },

    /// Accept screenshots of a run as the new baselines
    Accept {
        /// Spec name
        spec: String,

        /// Source run ID (defaults to the latest run)
        #[arg(long)]
        run: Option<String>,

        /// Accept a single screenshot by name
        #[arg(short, long, conflicts_with = "all")]
        screenshot: Option<String>,

        /// Accept every screenshot of the run
        #[arg(long)]
        all: bool,

        /// Identity recorded as the acceptor
        #[arg(long)]
        by: Option<String>,
    },
}

#[derive(Serialize)]
pub struct BaselineDisplay {
    pub name: String,
    pub hash: Option<String>,
    pub accepted_at: Option<String>,
    pub accepted_by: Option<String>,
    pub run_id: Option<String>,
}

impl From<BaselineInfo> for BaselineDisplay {
    fn from(info: BaselineInfo) -> Self {
        let acceptance = info.acceptance;
        Self {
            name: info.name,
            hash: acceptance.as_ref().map(|a| a.current_hash.clone()),
            accepted_at: acceptance
                .as_ref()
                .map(|a| a.accepted_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            accepted_by: acceptance.as_ref().map(|a| a.accepted_by.clone()),
            run_id: acceptance.map(|a| a.run_id),
        }
    }
}

impl TableDisplay for BaselineDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Hash", "Accepted", "By", "Run ID"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(self.hash.as_ref()),
            or_dash(self.accepted_at.as_ref()),
            or_dash(self.accepted_by.as_ref()),
            or_dash(self.run_id.as_ref()),
        ]
    }
}

impl TableDisplay for BaselineEntry {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Status", "Diff %", "Actual"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.status.to_string(),
            or_dash(self.diff_percent.map(|p| format!("{:.2}", p))),
            or_dash(self.actual_path.as_ref().map(|p| p.display())),
        ]
    }
}

impl TableDisplay for ScreenshotRef {
    fn headers() -> Vec<&'static str> {
        vec!["New Screenshot", "Path"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.path.display().to_string()]
    }
}

pub fn execute(cmd: BaselineCommands, config: &SpecshotConfig, format: OutputFormat) -> Result<()> {
    let store = BaselineStore::from_config(config);

    match cmd {
        BaselineCommands::List { spec } => {
            let displays: Vec<BaselineDisplay> = store
                .baselines_for_spec(&spec)?
                .into_iter()
                .map(BaselineDisplay::from)
                .collect();
            print_list(&displays, format);
        }

        BaselineCommands::Status { spec } => {
            let status = store.baseline_status(&spec)?;
            if format == OutputFormat::Json {
                print_json(&status);
                return Ok(());
            }

            match &status.run_id {
                Some(run_id) => print_info(&format!("Comparing against run '{}'", run_id)),
                None => print_warning(&format!("No runs found for spec '{}'", spec)),
            }
            print_list(&status.baselines, format);
            if !status.new_screenshots.is_empty() {
                print_list(&status.new_screenshots, format);
            }
        }

        BaselineCommands::Accept {
            spec,
            run,
            screenshot,
            all,
            by,
        } => {
            let options = AcceptOptions {
                run_id: run,
                screenshot,
                all,
                accepted_by: by,
            };
            let outcome = store.accept_baselines(&spec, &options)?;

            if format == OutputFormat::Json {
                print_json(&outcome);
            } else {
                for name in &outcome.accepted {
                    print_success(&format!(
                        "Accepted '{}' from run '{}'",
                        name, outcome.run_id
                    ));
                }
                for failure in &outcome.failed {
                    print_error(&format!("Failed to accept '{}': {}", failure.name, failure.reason));
                }
                if outcome.accepted.is_empty() && outcome.failed.is_empty() {
                    print_info(&format!("Run '{}' has no screenshots", outcome.run_id));
                }
            }

            if !outcome.failed.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
