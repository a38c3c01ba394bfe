//! Errors raised by the `imasig` command line front end.

use imasig::ImasigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Imasig(#[from] ImasigError),

    /// Neither `--manifest` nor `--package` was given.
    #[error("no signature manifest given: pass --manifest or --package")]
    MissingSource,

    #[error("cannot render results for signature manifest '{manifest}' as JSON: {source}")]
    Json {
        manifest: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CliError>;
