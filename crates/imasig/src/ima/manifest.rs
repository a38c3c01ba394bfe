//! Signature manifest parsing
//!
//! A manifest is a newline-terminated text file with one record per line:
//!
//! ```text
//! <tag> <filename> <hex-signature>
//! ```
//!
//! The tag (historically a hash algorithm name) ends at the first space and
//! the signature starts after the last space, so filenames cannot contain
//! spaces. The run of spaces after the tag is skipped, which also accepts the
//! two-space separator used by dpkg checksum files.
//!
//! Parsing works on raw bytes: filenames are kept as OS bytes and never
//! lossily converted. Content after the final newline is not a record.

use super::types::{LinePolicy, ManifestRecord};
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Why a single manifest line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line contains no space separator")]
    MissingSeparator,
    #[error("line has no filename between the tag and the signature")]
    MissingFilename,
    #[error("line has an empty signature")]
    MissingSignature,
    #[error("line contains a NUL byte")]
    EmbeddedNul,
    #[error("filename '{0}' escapes the target root")]
    ParentComponent(String),
    #[error("signature is not valid UTF-8")]
    NonUtf8Signature,
}

/// A [`LineError`] tagged with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct LineFault {
    pub line: usize,
    pub reason: LineError,
}

/// Splits a manifest buffer into [`ManifestRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser {
    policy: LinePolicy,
}

impl ManifestParser {
    #[must_use]
    pub fn new(policy: LinePolicy) -> Self {
        Self { policy }
    }

    /// Parse every newline-terminated line of `buffer`, in order.
    ///
    /// Blank lines are ignored. Malformed lines either abort parsing or are
    /// skipped with a warning, depending on the parser's [`LinePolicy`].
    ///
    /// # Errors
    ///
    /// Returns a [`LineFault`] for the first malformed line under
    /// `LinePolicy::Reject`. Never fails under `LinePolicy::Skip`.
    pub fn parse(&self, buffer: &[u8]) -> Result<Vec<ManifestRecord>, LineFault> {
        let mut records = Vec::new();

        let Some(end) = buffer.iter().rposition(|&b| b == b'\n') else {
            return Ok(records);
        };

        for (index, line) in buffer[..end].split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let line_no = index + 1;
            match parse_line(line_no, line) {
                Ok(record) => records.push(record),
                Err(reason) => match self.policy {
                    LinePolicy::Reject => {
                        return Err(LineFault {
                            line: line_no,
                            reason,
                        })
                    }
                    LinePolicy::Skip => {
                        tracing::warn!(line = line_no, %reason, "skipping malformed manifest line");
                    }
                },
            }
        }

        Ok(records)
    }
}

/// Parse a manifest buffer, rejecting the first malformed line.
///
/// # Errors
///
/// Returns a [`LineFault`] naming the first malformed line.
pub fn parse(buffer: &[u8]) -> Result<Vec<ManifestRecord>, LineFault> {
    ManifestParser::default().parse(buffer)
}

/// Parse a single manifest line (without its trailing newline).
///
/// # Errors
///
/// Returns a [`LineError`] if the line lacks the
/// `<tag> <filename> <signature>` shape.
pub fn parse_line(line_no: usize, line: &[u8]) -> Result<ManifestRecord, LineError> {
    if line.contains(&0) {
        return Err(LineError::EmbeddedNul);
    }

    let tag_end = line
        .iter()
        .position(|&b| b == b' ')
        .ok_or(LineError::MissingSeparator)?;
    let name_start = line[tag_end..]
        .iter()
        .position(|&b| b != b' ')
        .map_or(line.len(), |skip| tag_end + skip);

    // The separator run was found above, so a last space always exists.
    let sig_sep = line
        .iter()
        .rposition(|&b| b == b' ')
        .ok_or(LineError::MissingSeparator)?;
    if sig_sep < name_start {
        return Err(LineError::MissingFilename);
    }

    let filename = trim_trailing_spaces(&line[name_start..sig_sep]);
    if filename.is_empty() {
        return Err(LineError::MissingFilename);
    }

    let token = &line[sig_sep + 1..];
    if token.is_empty() {
        return Err(LineError::MissingSignature);
    }

    let filename = Path::new(OsStr::from_bytes(filename));
    if filename
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(LineError::ParentComponent(
            filename.to_string_lossy().into_owned(),
        ));
    }

    let signature_token =
        String::from_utf8(token.to_vec()).map_err(|_| LineError::NonUtf8Signature)?;

    Ok(ManifestRecord {
        line: line_no,
        filename: PathBuf::from(filename),
        signature_token,
    })
}

fn trim_trailing_spaces(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |last| last + 1);
    &bytes[..end]
}
