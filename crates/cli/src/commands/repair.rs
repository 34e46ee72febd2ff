//! Repair Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

use specshot_common::{
    classify_error, generate_repair_plan, generate_repair_suggestions, plan_for_run,
    ErrorType, FailureDescriptor, RepairPlan, RepairSuggestion,
};

use crate::output::{print_info, print_json, print_list, print_message, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum RepairCommands {
    /// Classify an error message and list suggested fixes
    Classify {
        /// Error message
        message: String,
    },

    /// Ranked repair plan for a failed run
    Plan {
        /// Run directory
        run_dir: PathBuf,
    },
}

impl TableDisplay for RepairSuggestion {
    fn headers() -> Vec<&'static str> {
        vec!["Type", "Confidence", "Description"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.kind.to_string(),
            format!("{:.2}", self.confidence),
            self.description.clone(),
        ]
    }
}

#[derive(Serialize)]
struct Classification {
    error_type: ErrorType,
    #[serde(flatten)]
    plan: RepairPlan,
}

fn print_plan_summary(plan: &RepairPlan) {
    match &plan.primary_suggestion {
        Some(primary) if plan.auto_applicable => {
            print_info(&format!("Primary: {} (auto-applicable)", primary.kind))
        }
        Some(primary) => print_info(&format!("Primary: {} (needs confirmation)", primary.kind)),
        None => print_info("No suggestions"),
    }
}

pub fn execute(cmd: RepairCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        RepairCommands::Classify { message } => {
            let error_type = classify_error(&message);
            let descriptor = FailureDescriptor {
                step_id: String::new(),
                action: String::new(),
                error_message: message,
                error_type,
            };
            let plan = generate_repair_plan(generate_repair_suggestions(&descriptor));

            if format == OutputFormat::Json {
                print_json(&Classification { error_type, plan });
            } else {
                print_info(&format!("Error type: {}", error_type));
                print_list(&plan.suggestions, format);
            }
        }

        RepairCommands::Plan { run_dir } => match plan_for_run(&run_dir)? {
            Some(plan) if format == OutputFormat::Json => print_json(&plan),
            Some(plan) => {
                print_list(&plan.suggestions, format);
                print_plan_summary(&plan);
            }
            None => print_message(
                &format!("No failure bundle in {}", run_dir.display()),
                format,
            ),
        },
    }

    Ok(())
}
