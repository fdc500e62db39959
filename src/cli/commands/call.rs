//! Call command - run one tool from the command line.

use crate::cli::{display_value, Output};
use crate::config::Settings;
use crate::dispatch::{Dispatcher, InvocationOutcome};
use anyhow::{Context, Result};
use serde_json::Value;

/// Invoke `tool` with JSON `args` and print the outcome.
pub async fn run_call(tool: &str, args: &str, settings: Settings) -> Result<()> {
    let arguments: Value =
        serde_json::from_str(args).context("Tool arguments must be valid JSON")?;

    let dispatcher = Dispatcher::from_settings(&settings)?;

    let spinner = Output::spinner(&format!("Running {}...", tool));
    let outcome = dispatcher.dispatch(tool, Some(&arguments)).await;
    spinner.finish_and_clear();

    match outcome {
        InvocationOutcome::Success { payload, metadata } => {
            println!("{}", payload);
            Output::header("Metadata");
            for (key, value) in &metadata {
                Output::kv(key, &display_value(value));
            }
            Ok(())
        }
        InvocationOutcome::Failure { kind, message } => {
            Output::error(&message);
            anyhow::bail!("{} failed ({})", tool, kind)
        }
    }
}
