//! Failure bundle commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

use specshot_common::{
    generate_failure_bundle, load_failure_bundle, ErrorType, ExecutionContext, FailureBundle,
    FailureReport, Viewport,
};

use crate::output::{or_dash, print_item, print_message, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum FailureCommands {
    /// Collect a failed run's artifacts into a bundle
    Bundle {
        /// Run directory of the failed run
        #[arg(long)]
        run_dir: PathBuf,

        /// Directory the test executor wrote its raw artifacts to
        #[arg(long)]
        raw: PathBuf,

        /// ID of the failing step
        #[arg(long)]
        step_id: String,

        /// Action the step performed
        #[arg(long)]
        action: String,

        /// Error message reported by the executor
        #[arg(long)]
        error: String,

        /// Skip classification and use this error type
        #[arg(long)]
        error_type: Option<ErrorType>,

        /// Page URL at the time of failure
        #[arg(long, default_value = "")]
        url: String,

        /// Viewport width
        #[arg(long, default_value_t = 1280)]
        width: u32,

        /// Viewport height
        #[arg(long, default_value_t = 720)]
        height: u32,

        /// Browser name
        #[arg(long, default_value = "chromium")]
        browser: String,
    },

    /// Show the failure bundle of a run
    Show {
        /// Run directory
        run_dir: PathBuf,
    },
}

/// Bundle display wrapper for serialization
#[derive(Serialize)]
pub struct BundleDisplay {
    #[serde(flatten)]
    pub bundle: FailureBundle,
}

impl TableDisplay for BundleDisplay {
    fn headers() -> Vec<&'static str> {
        vec![
            "Spec", "Run ID", "Failed", "Step", "Action", "Error Type", "Trace", "Screenshot",
        ]
    }

    fn row(&self) -> Vec<String> {
        let b = &self.bundle;
        vec![
            b.spec_name.clone(),
            b.run_id.clone(),
            b.failed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            b.failure.step_id.clone(),
            b.failure.action.clone(),
            b.failure.error_type.to_string(),
            or_dash(b.artifacts.trace.as_ref()),
            or_dash(b.artifacts.screenshot.as_ref()),
        ]
    }
}

pub fn execute(cmd: FailureCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        FailureCommands::Bundle {
            run_dir,
            raw,
            step_id,
            action,
            error,
            error_type,
            url,
            width,
            height,
            browser,
        } => {
            let report = FailureReport {
                step_id,
                action,
                error_message: error,
                error_type,
                context: ExecutionContext {
                    url,
                    viewport: Viewport { width, height },
                    browser,
                },
            };

            let path = generate_failure_bundle(&run_dir, &report, &raw)?;
            if format != OutputFormat::Json {
                print_success(&format!("Failure bundle written to {}", path.display()));
            }
            if let Some(bundle) = load_failure_bundle(&run_dir)? {
                print_item(&BundleDisplay { bundle }, format);
            }
        }

        FailureCommands::Show { run_dir } => match load_failure_bundle(&run_dir)? {
            Some(bundle) => {
                let message = bundle.failure.error_message.clone();
                print_item(&BundleDisplay { bundle }, format);
                if format != OutputFormat::Json {
                    println!("{}", message);
                }
            }
            None => print_message(
                &format!("No failure bundle in {}", run_dir.display()),
                format,
            ),
        },
    }

    Ok(())
}
