//! CLI commands for applying and checking signature manifests
//!
//! Implements `imasig apply|check`.

use crate::cli::{ApplyArgs, CheckArgs, Commands};
use crate::error::{CliError, Result};
use colored::Colorize;
use imasig::ima::{
    self, ApplyReport, AttributeOutcome, DecodedManifest, FileOutcome, XattrWriter,
};
use std::process::ExitCode;

/// Run a subcommand.
pub fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Apply(args) => run_apply(args),
        Commands::Check(args) => run_check(args),
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

fn run_apply(args: ApplyArgs) -> Result<ExitCode> {
    let source = args.manifest.source()?;
    let options = args.manifest.options();
    tracing::debug!(manifest = %source.describe(), ?options, "applying signature manifest");

    let report = ima::apply_manifest_for(source.as_ref(), XattrWriter, &options)?;

    if args.manifest.json {
        println!("{}", to_json(&report.manifest, &report)?);
    } else {
        print_report(&report);
    }

    if args.strict && report.failed_count() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &ApplyReport) {
    if report.files.is_empty() {
        eprintln!("No signatures to apply from {}.", report.manifest);
        return;
    }

    for file in &report.files {
        eprintln!("  {}", format_outcome(file));
    }

    let applied = report.applied_count();
    let failed = report.failed_count();
    eprintln!();
    if failed == 0 {
        eprintln!(
            "{}",
            format!(
                "Applied {applied} signature(s) ({} bytes each).",
                report.signature_len
            )
            .green()
        );
    } else {
        eprintln!("{}", format!("Applied {applied}, failed {failed}.").yellow());
    }
}

fn format_outcome(file: &FileOutcome) -> String {
    match &file.outcome {
        AttributeOutcome::Applied { len } => {
            format!("{} {} ({len} bytes)", "SET".green(), file.path.display())
        }
        AttributeOutcome::Failed { reason } => {
            format!("{} {}: {reason}", "FAILED".red(), file.path.display())
        }
    }
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn run_check(args: CheckArgs) -> Result<ExitCode> {
    let source = args.manifest.source()?;
    let options = args.manifest.options();
    tracing::debug!(manifest = %source.describe(), ?options, "checking signature manifest");

    let decoded = ima::check_manifest(source.as_ref(), &options)?;

    let manifest = source.describe();
    if args.manifest.json {
        println!("{}", to_json(&manifest, &decoded)?);
    } else {
        print_decoded(&manifest, &decoded);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_decoded(manifest: &str, decoded: &DecodedManifest) {
    if decoded.targets.is_empty() {
        eprintln!("No signatures in {manifest}.");
        return;
    }

    eprintln!(
        "  {:<40} {:<6} {}",
        "File".bold(),
        "Bytes".bold(),
        "Signature".bold()
    );
    eprintln!("  {}", "-".repeat(70));
    for target in &decoded.targets {
        eprintln!(
            "  {:<40} {:<6} {}",
            target.path.display(),
            target.signature.len(),
            target.signature.to_hex()
        );
    }
    eprintln!();
    eprintln!(
        "{}",
        format!(
            "{} signature(s) decoded, signature size {} bytes.",
            decoded.targets.len(),
            decoded.signature_len
        )
        .green()
    );
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn to_json<T: serde::Serialize>(manifest: &str, value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|source| CliError::Json {
        manifest: manifest.to_string(),
        source,
    })
}
