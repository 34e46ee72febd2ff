//! Image comparison command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use specshot_common::{compare_images, CompareOptions, ComparisonResult, SpecshotConfig};

use crate::output::{or_dash, print_item, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct CompareArgs {
    /// Reference image
    pub expected: PathBuf,

    /// Image to check
    pub actual: PathBuf,

    /// Per-channel tolerance, 0.0 - 1.0 (defaults to the configured value)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Write a diff image here when the images differ
    #[arg(long)]
    pub diff: Option<PathBuf>,
}

#[derive(Serialize)]
pub struct ComparisonDisplay {
    #[serde(flatten)]
    pub result: ComparisonResult,
    pub threshold: f64,
}

impl TableDisplay for ComparisonDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Match", "Diff %", "Threshold", "Diff Image"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            if self.result.matches { "yes" } else { "no" }.to_string(),
            format!("{:.2}", self.result.diff_percent),
            format!("{}", self.threshold),
            or_dash(self.result.diff_path.as_ref().map(|p| p.display())),
        ]
    }
}

pub fn execute(args: CompareArgs, config: &SpecshotConfig, format: OutputFormat) -> Result<()> {
    let mut options = CompareOptions::from(&config.compare);
    if let Some(threshold) = args.threshold {
        options.threshold = threshold;
    }
    if let Some(diff) = args.diff {
        options = options.with_diff_path(diff);
    }

    let result = compare_images(&args.expected, &args.actual, &options);
    print_item(
        &ComparisonDisplay {
            result,
            threshold: options.threshold,
        },
        format,
    );
    Ok(())
}
