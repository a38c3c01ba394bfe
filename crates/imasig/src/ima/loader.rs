//! Manifest application entry points
//!
//! [`apply_manifest_for`] drives load → parse → decode → apply for one
//! manifest. Decoding and applying are interleaved record by record, so when
//! a signature fails to decode, the attributes already written for earlier
//! records stay in place. Nothing is rolled back.

use super::apply::{AttributeApplier, AttributeWriter};
use super::decode::{decode_all, DecodedManifest, RecordDecodeError, SignatureDecoder};
use super::manifest::{LineFault, ManifestParser};
use super::source::ManifestSource;
use super::types::{ApplyOptions, ApplyReport, LengthPolicy, ManifestRecord};
use crate::error::{ImasigError, Result};

/// Apply every signature in `source` as a `security.ima` attribute.
///
/// A missing or empty manifest is a successful no-op. Per-file write
/// failures do not fail the call; they are logged and listed in the
/// returned report.
///
/// # Errors
///
/// Returns `ImasigError::ManifestUnreadable` or
/// `ImasigError::ManifestNotRegular` if the manifest cannot be loaded,
/// `ImasigError::MalformedLine` for a malformed line (unless skipping),
/// `ImasigError::Decode` for the first undecodable signature, and
/// `ImasigError::SignatureLengthMismatch` under `LengthPolicy::Uniform`.
pub fn apply_manifest_for<S, W>(source: &S, writer: W, options: &ApplyOptions) -> Result<ApplyReport>
where
    S: ManifestSource + ?Sized,
    W: AttributeWriter,
{
    let manifest = source.describe();
    let Some(records) = load_records(source, options)? else {
        return Ok(ApplyReport::empty(manifest));
    };

    let applier = AttributeApplier::with_root(writer, &options.root);
    let mut decoder = SignatureDecoder::new();
    let mut report = ApplyReport::empty(manifest.as_str());

    for record in &records {
        let target = decoder
            .decode(record)
            .map_err(|e| decode_error(&manifest, e))?;

        let actual = target.signature.len();
        let expected = decoder.signature_len().unwrap_or(actual);
        check_signature_len(&manifest, record.line, expected, actual, options.length_policy)?;

        tracing::debug!(
            path = %target.path.display(),
            len = actual,
            signature = %target.signature.to_hex(),
            "decoded signature"
        );

        report.files.push(applier.apply_one(&target));
    }

    report.signature_len = decoder.signature_len().unwrap_or(0);
    tracing::info!(
        manifest = %report.manifest,
        signature_len = report.signature_len,
        applied = report.applied_count(),
        failed = report.failed_count(),
        "applied signature manifest"
    );

    Ok(report)
}

/// Parse and decode `source` without writing any attribute.
///
/// # Errors
///
/// Fails under the same conditions as [`apply_manifest_for`], except that
/// no attribute writes are attempted.
pub fn check_manifest<S>(source: &S, options: &ApplyOptions) -> Result<DecodedManifest>
where
    S: ManifestSource + ?Sized,
{
    let manifest = source.describe();
    let Some(records) = load_records(source, options)? else {
        return Ok(DecodedManifest::default());
    };

    let decoded = decode_all(&records).map_err(|e| decode_error(&manifest, e))?;

    for target in &decoded.targets {
        check_signature_len(
            &manifest,
            target.line,
            decoded.signature_len,
            target.signature.len(),
            options.length_policy,
        )?;
    }

    Ok(decoded)
}

/// Compare a record's signature length with the first record's. A
/// difference is a warning under `LengthPolicy::Report` and an error under
/// `LengthPolicy::Uniform`.
fn check_signature_len(
    manifest: &str,
    line: usize,
    expected: usize,
    actual: usize,
    policy: LengthPolicy,
) -> Result<()> {
    if actual == expected {
        return Ok(());
    }
    match policy {
        LengthPolicy::Report => {
            tracing::warn!(
                manifest = %manifest,
                line,
                expected,
                actual,
                "signature length differs from first record"
            );
            Ok(())
        }
        LengthPolicy::Uniform => Err(ImasigError::SignatureLengthMismatch {
            manifest: manifest.to_string(),
            line,
            expected,
            actual,
        }),
    }
}

/// Load and parse a manifest. `None` means there is nothing to do.
fn load_records<S>(source: &S, options: &ApplyOptions) -> Result<Option<Vec<ManifestRecord>>>
where
    S: ManifestSource + ?Sized,
{
    let manifest = source.describe();
    let buf = match source.load()? {
        Some(buf) if !buf.is_empty() => buf,
        _ => {
            tracing::debug!(manifest = %manifest, "no signatures to apply");
            return Ok(None);
        }
    };

    ManifestParser::new(options.line_policy)
        .parse(&buf)
        .map(Some)
        .map_err(|LineFault { line, reason }| ImasigError::MalformedLine {
            manifest,
            line,
            reason,
        })
}

fn decode_error(manifest: &str, e: RecordDecodeError) -> ImasigError {
    ImasigError::Decode {
        manifest: manifest.to_string(),
        line: e.line,
        path: e.path,
        source: e.source,
    }
}
