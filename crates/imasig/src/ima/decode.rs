//! Signature decoding
//!
//! Turns parsed [`ManifestRecord`]s into [`TargetSignature`]s: the filename
//! becomes an absolute path and the signature token becomes raw bytes.
//!
//! The first decoded record establishes the manifest's signature length.
//! That length is reported, not enforced here; callers decide what a
//! differing length means (see [`LengthPolicy`](super::types::LengthPolicy)).

use super::hex::{decode_hex, DecodeError};
use super::types::{DecodedSignature, ManifestRecord, TargetSignature};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// A [`DecodeError`] tagged with the record it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line} ({}): {source}", .path.display())]
pub struct RecordDecodeError {
    pub line: usize,
    pub path: PathBuf,
    #[source]
    pub source: DecodeError,
}

/// Decodes records one at a time, remembering the first signature length.
#[derive(Debug, Clone, Default)]
pub struct SignatureDecoder {
    signature_len: Option<usize>,
}

impl SignatureDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one record into its target path and signature bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordDecodeError`] if the signature token is malformed.
    pub fn decode(&mut self, record: &ManifestRecord) -> Result<TargetSignature, RecordDecodeError> {
        let path = record.target_path();
        let bytes = match decode_hex(&record.signature_token) {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(RecordDecodeError {
                    line: record.line,
                    path,
                    source,
                })
            }
        };

        if self.signature_len.is_none() {
            self.signature_len = Some(bytes.len());
        }

        Ok(TargetSignature {
            line: record.line,
            path,
            signature: DecodedSignature::new(bytes),
        })
    }

    /// Length of the first successfully decoded signature, if any.
    #[must_use]
    pub fn signature_len(&self) -> Option<usize> {
        self.signature_len
    }
}

/// Every record of a manifest, decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedManifest {
    /// Byte length of the first record's signature (0 for an empty manifest)
    pub signature_len: usize,
    pub targets: Vec<TargetSignature>,
}

/// Decode all records, stopping at the first malformed signature.
///
/// # Errors
///
/// Returns a [`RecordDecodeError`] for the first record whose token fails to
/// decode.
pub fn decode_all(records: &[ManifestRecord]) -> Result<DecodedManifest, RecordDecodeError> {
    let mut decoder = SignatureDecoder::new();
    let targets = records
        .iter()
        .map(|record| decoder.decode(record))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedManifest {
        signature_len: decoder.signature_len().unwrap_or(0),
        targets,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ima::hex::Malformed;

    fn record(line: usize, filename: &str, token: &str) -> ManifestRecord {
        ManifestRecord {
            line,
            filename: PathBuf::from(filename),
            signature_token: token.to_string(),
        }
    }

    #[test]
    fn decodes_path_and_signature() {
        let decoded = decode_all(&[record(1, "etc/foo.conf", "deadbeef")]).unwrap();
        assert_eq!(decoded.signature_len, 4);
        assert_eq!(decoded.targets.len(), 1);
        let target = &decoded.targets[0];
        assert_eq!(target.path, PathBuf::from("/etc/foo.conf"));
        assert_eq!(target.signature.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn empty_manifest_has_zero_length() {
        let decoded = decode_all(&[]).unwrap();
        assert_eq!(decoded, DecodedManifest::default());
    }

    #[test]
    fn reported_length_comes_from_first_record() {
        let decoded = decode_all(&[record(1, "a", "0001"), record(2, "b", "000102")]).unwrap();
        assert_eq!(decoded.signature_len, 2);
        // Each signature keeps its own decoded length.
        assert_eq!(decoded.targets[1].signature.len(), 3);
    }

    #[test]
    fn stops_at_first_bad_token() {
        let err = decode_all(&[
            record(1, "a", "00"),
            record(2, "b", "0"),
            record(3, "c", "zz"),
        ])
        .unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.path, PathBuf::from("/b"));
        assert_eq!(err.source, DecodeError::Malformed(Malformed::OddDigitCount));
    }

    #[test]
    fn failed_first_record_does_not_set_length() {
        let mut decoder = SignatureDecoder::new();
        assert!(decoder.decode(&record(1, "a", "xyz")).is_err());
        assert_eq!(decoder.signature_len(), None);
        decoder.decode(&record(2, "b", "aabb")).unwrap();
        assert_eq!(decoder.signature_len(), Some(2));
    }
}
