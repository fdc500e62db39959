//! Tools command - list the tool catalogue.

use crate::cli::{display_value, Output};
use crate::config::Settings;
use crate::registry::Registry;
use anyhow::Result;

/// Print every tool with its parameters.
pub fn run_tools(settings: &Settings) -> Result<()> {
    let registry = Registry::new(&settings.output_dir().display().to_string());

    Output::header(&format!("{} tools", registry.list().len()));

    for descriptor in registry.list() {
        println!();
        Output::info(&descriptor.name);
        println!("    {}", descriptor.description);

        for field in descriptor.parameter_schema.fields() {
            let description = match &field.default {
                Some(default) => format!(
                    "{} [default: {}]",
                    field.description,
                    display_value(default)
                ),
                None => field.description.clone(),
            };
            Output::param(
                &field.name,
                field.field_type.json_name(),
                field.required,
                &description,
            );
        }
    }

    println!();
    Output::kv("Required parameters are marked with", "*");
    Ok(())
}
