//! Error types for the imasig library
//!
//! Every fatal error names the manifest it came from. Line-scoped errors also
//! carry the 1-based line number, and decode errors the target path, so the
//! offending record can be located without re-reading the manifest.

use crate::ima::hex::DecodeError;
use crate::ima::manifest::LineError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading and applying a signature manifest.
#[derive(Debug, Error)]
pub enum ImasigError {
    /// The manifest exists but could not be opened, stat'ed or read.
    #[error("cannot read signature manifest '{manifest}': {source}")]
    ManifestUnreadable {
        manifest: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest path resolves to something other than a regular file.
    #[error("signature manifest '{manifest}' is not a regular file")]
    ManifestNotRegular { manifest: String },

    /// A manifest line does not have the `<tag> <filename> <signature>` shape.
    #[error("signature manifest '{manifest}' line {line}: {reason}")]
    MalformedLine {
        manifest: String,
        line: usize,
        reason: LineError,
    },

    /// A signature token could not be decoded.
    #[error("wrong signature for '{}' in manifest '{manifest}' line {line}: {source}", .path.display())]
    Decode {
        manifest: String,
        line: usize,
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// A signature differs in length from the first record's signature.
    #[error(
        "signature manifest '{manifest}' line {line}: signature is {actual} bytes, expected {expected}"
    )]
    SignatureLengthMismatch {
        manifest: String,
        line: usize,
        expected: usize,
        actual: usize,
    },
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ImasigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ima::hex::Malformed;

    #[test]
    fn decode_error_names_manifest_line_and_path() {
        let err = ImasigError::Decode {
            manifest: "/var/lib/dpkg/info/foo.sig_shasums".to_string(),
            line: 3,
            path: PathBuf::from("/usr/bin/foo"),
            source: DecodeError::Malformed(Malformed::OddDigitCount),
        };
        let msg = err.to_string();
        assert!(msg.contains("/usr/bin/foo"), "{msg}");
        assert!(msg.contains("foo.sig_shasums"), "{msg}");
        assert!(msg.contains("line 3"), "{msg}");
    }

    #[test]
    fn malformed_line_includes_reason() {
        let err = ImasigError::MalformedLine {
            manifest: "sig_shasums".to_string(),
            line: 7,
            reason: LineError::MissingSeparator,
        };
        assert_eq!(
            err.to_string(),
            "signature manifest 'sig_shasums' line 7: line contains no space separator"
        );
    }
}
