//! Package validation command implementation.

use super::output::JsonValidation;
use super::{CliError, OutputFormat};
use armada::{CompileOptions, ScenarioPackage, compile};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if any package fails to load or compile; every failure
/// is reported before the command exits.
pub(crate) fn execute(
    packages: Vec<PathBuf>,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    let pb = if progress {
        let pb = ProgressBar::new(packages.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} packages")
                .expect("valid template")
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Each package compiles independently, so they check in parallel.
    let reports: Vec<(PathBuf, Result<(), String>)> = packages
        .into_par_iter()
        .map(|path| {
            let outcome = check(&path);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            (path, outcome)
        })
        .collect();

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let failed = reports
        .iter()
        .filter(|(_, outcome)| outcome.is_err())
        .count();

    match format {
        OutputFormat::Text => {
            for (path, outcome) in &reports {
                match outcome {
                    Ok(()) => println!("  ✓ {}: OK", path.display()),
                    Err(message) => println!("  ✗ {}: {message}", path.display()),
                }
            }
            println!();
            println!(
                "{} of {} packages valid",
                reports.len() - failed,
                reports.len()
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonValidation::from_reports(&reports))?;
            println!("{json}");
        }
    }

    if failed > 0 {
        return Err(CliError::new(format!("{failed} invalid package(s)")));
    }
    Ok(())
}

fn check(path: &Path) -> Result<(), String> {
    let package = ScenarioPackage::from_dir(path).map_err(|e| e.to_string())?;
    // Seeded so validation never touches OS entropy.
    let options = CompileOptions {
        seed: Some(0),
        ..CompileOptions::default()
    };
    compile(&package, options)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
