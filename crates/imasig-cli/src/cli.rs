//! Command-line arguments for `imasig`.

use crate::error::{CliError, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use imasig::ima::{
    ApplyOptions, LengthPolicy, LinePolicy, ManifestFile, ManifestSource, PackageInfoDb,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "imasig",
    version,
    about = "Apply IMA signatures from a package signature manifest"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write each manifest signature into the file's security.ima attribute
    Apply(ApplyArgs),
    /// Parse and decode a manifest without writing anything
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Exit with failure if any attribute write fails
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

/// Which manifest to read.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Path to a signature manifest
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Installed package whose sig_shasums control file to read
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Package database directory used with --package
    #[arg(
        long,
        value_name = "DIR",
        env = "IMASIG_ADMINDIR",
        default_value = PackageInfoDb::DEFAULT_ADMINDIR
    )]
    pub admindir: PathBuf,

    /// Directory the manifest's filenames are relative to
    #[arg(long, value_name = "DIR", env = "IMASIG_ROOT", default_value = "/")]
    pub root: PathBuf,

    /// Skip malformed manifest lines instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,

    /// Reject signatures whose length differs from the first one
    #[arg(long)]
    pub uniform_length: bool,

    /// Print results as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl ManifestArgs {
    pub fn options(&self) -> ApplyOptions {
        ApplyOptions {
            root: self.root.clone(),
            line_policy: if self.skip_malformed {
                LinePolicy::Skip
            } else {
                LinePolicy::Reject
            },
            length_policy: if self.uniform_length {
                LengthPolicy::Uniform
            } else {
                LengthPolicy::Report
            },
        }
    }

    /// The manifest selected by `--manifest` or `--package`.
    pub fn source(&self) -> Result<Box<dyn ManifestSource>> {
        if let Some(path) = &self.source.manifest {
            return Ok(Box::new(ManifestFile::new(path)));
        }
        if let Some(package) = &self.source.package {
            return Ok(Box::new(PackageInfoDb::new(&self.admindir, package)));
        }
        Err(CliError::MissingSource)
    }
}
