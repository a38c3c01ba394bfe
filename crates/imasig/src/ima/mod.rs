//! IMA signature labelling of installed files
//!
//! A package may ship a signature manifest listing, for each installed file,
//! a hex-encoded signature. This module decodes those signatures and stores
//! each one in the file's `security.ima` extended attribute, where the
//! kernel's integrity subsystem appraises it on later access.
//!
//! # Architecture
//!
//! ```text
//! manifest bytes --> parse --> decode --> setxattr(security.ima) --> report
//! ```
//!
//! Verification is not done here: the library only decodes and attaches
//! signature blobs.
//!
//! # Components
//!
//! - **Hex** ([`hex`]): whitespace-tolerant hex decoding of signature tokens
//! - **Manifest** ([`manifest`]): line tokenizer and malformed-line policy
//! - **Decode** ([`decode`]): records to absolute paths and signature bytes
//! - **Apply** ([`apply`]): attribute writes with continue-on-error semantics
//! - **Source** ([`source`]): manifest files and dpkg-style info databases
//! - **Loader** ([`loader`]): the end-to-end entry points
//!
//! # Failure semantics
//!
//! - Missing or empty manifest: success, nothing applied
//! - Unreadable or non-regular manifest, malformed line, bad signature: fatal
//! - Failed attribute write: logged, reported, processing continues
//! - No rollback: a fatal error leaves earlier attribute writes in place

pub mod apply;
pub mod decode;
pub mod hex;
pub mod loader;
pub mod manifest;
pub mod source;
pub mod types;

/// Extended attribute holding a file's IMA signature.
pub const IMA_XATTR: &str = "security.ima";

/// Name of the package control file carrying the signature manifest.
pub const MANIFEST_FILE: &str = "sig_shasums";

#[cfg(any(test, feature = "test-util"))]
pub use apply::MemoryWriter;
pub use apply::{AttributeApplier, AttributeWriter, XattrWriter};
pub use decode::{decode_all, DecodedManifest, RecordDecodeError, SignatureDecoder};
pub use hex::{decode_hex, encode_hex, DecodeError, Malformed};
pub use loader::{apply_manifest_for, check_manifest};
pub use manifest::{parse, parse_line, LineError, LineFault, ManifestParser};
pub use source::{ManifestFile, ManifestSource, PackageInfoDb};
pub use types::{
    ApplyOptions, ApplyReport, AttributeOutcome, DecodedSignature, FileOutcome, LengthPolicy,
    LinePolicy, ManifestRecord, TargetSignature,
};
