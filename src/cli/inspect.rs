//! Scenario inspection command implementation.

use super::output::{JsonScenario, format_scenario};
use super::{CliError, OutputFormat};
use armada::{CompileOptions, ScenarioPackage, compile};
use std::path::Path;

/// Execute the inspect command.
///
/// # Errors
///
/// Returns an error if the package cannot be read or does not compile.
pub(crate) fn execute(package: &Path, format: OutputFormat) -> Result<(), CliError> {
    let package = ScenarioPackage::from_dir(package)?;
    // Seeded so inspection never touches OS entropy.
    let options = CompileOptions {
        seed: Some(0),
        ..CompileOptions::default()
    };
    let scenario = compile(&package, options)?;

    match format {
        OutputFormat::Text => print!("{}", format_scenario(&scenario)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonScenario::from_scenario(&scenario))?;
            println!("{json}");
        }
    }
    Ok(())
}
