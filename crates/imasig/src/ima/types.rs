//! Core types for signature manifest processing
//!
//! Defines the records produced by the manifest parser, the decoded
//! signatures and their target paths, the per-file outcomes of applying
//! them, and the options that control the pipeline.

use super::hex::encode_hex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// One line of a signature manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// 1-based line number within the manifest
    pub line: usize,
    /// Filename relative to the root of the managed file tree
    pub filename: PathBuf,
    /// Hex-encoded signature exactly as it appears in the manifest
    pub signature_token: String,
}

impl ManifestRecord {
    /// Absolute target path for this record: `"/" + filename`.
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        Path::new("/").join(&self.filename)
    }
}

/// A binary signature value decoded from a signature token.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedSignature(Vec<u8>);

impl DecodedSignature {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hex rendering, for diagnostics.
    #[must_use]
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }
}

impl fmt::Debug for DecodedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecodedSignature({})", self.to_hex())
    }
}

impl Serialize for DecodedSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// A decoded signature paired with the absolute path it labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSignature {
    /// Manifest line the signature came from
    pub line: usize,
    /// Absolute path (`"/" + filename`)
    pub path: PathBuf,
    /// Signature bytes to store in the security attribute
    pub signature: DecodedSignature,
}

/// Result of writing the security attribute on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AttributeOutcome {
    /// The attribute write reported no error
    Applied {
        /// Number of signature bytes written
        len: usize,
    },
    /// The attribute write failed; processing continued with the next target
    Failed {
        /// Error reported by the filesystem
        reason: String,
    },
}

impl AttributeOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Outcome for a single target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: AttributeOutcome,
}

/// Summary of one manifest application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Description of the manifest source
    pub manifest: String,
    /// Signature length reported by the first record (0 when nothing was applied)
    pub signature_len: usize,
    /// Per-target outcomes in manifest order
    pub files: Vec<FileOutcome>,
}

impl ApplyReport {
    /// An empty report for a manifest that was absent or empty.
    #[must_use]
    pub fn empty(manifest: impl Into<String>) -> Self {
        Self {
            manifest: manifest.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_applied()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.files.len() - self.applied_count()
    }

    /// Paths whose attribute write failed, in manifest order.
    #[must_use]
    pub fn failures(&self) -> Vec<&FileOutcome> {
        self.files
            .iter()
            .filter(|f| !f.outcome.is_applied())
            .collect()
    }
}

/// What to do with a manifest line that lacks the `<tag> <filename> <signature>` shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinePolicy {
    /// Abort the whole invocation on the first malformed line
    #[default]
    Reject,
    /// Drop the line with a warning and keep parsing
    Skip,
}

/// How the first record's signature length constrains later records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Report the first record's length; warn on differing lengths
    #[default]
    Report,
    /// Treat a differing length as fatal
    Uniform,
}

/// Options for [`apply_manifest_for`](super::loader::apply_manifest_for).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Directory the manifest's filenames are relative to
    pub root: PathBuf,
    pub line_policy: LinePolicy,
    pub length_policy: LengthPolicy,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            line_policy: LinePolicy::default(),
            length_policy: LengthPolicy::default(),
        }
    }
}
