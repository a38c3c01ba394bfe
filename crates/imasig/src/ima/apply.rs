//! Writing signatures into the `security.ima` attribute
//!
//! The [`AttributeApplier`] is the only stage of the pipeline that keeps
//! going after an error: a failed write is recorded for that path and the
//! next target is attempted. Writes are create-or-replace, so re-applying
//! the same signature is harmless.

use super::types::{AttributeOutcome, FileOutcome, TargetSignature};
use super::IMA_XATTR;
use std::io;
use std::path::{Path, PathBuf};

/// Sets a named extended attribute on a filesystem object.
pub trait AttributeWriter {
    /// Create or replace attribute `name` on `path` with `value`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the write is rejected.
    fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()>;
}

impl<W: AttributeWriter + ?Sized> AttributeWriter for &W {
    fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        (**self).set(path, name, value)
    }
}

/// Writes attributes with `setxattr(2)`. A symlink target path labels the
/// file the link points to, not the link itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct XattrWriter;

impl AttributeWriter for XattrWriter {
    fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
        xattr::set_deref(path, name, value)
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryWriter;

#[cfg(any(test, feature = "test-util"))]
mod memory {
    use super::AttributeWriter;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashSet};
    use std::io;
    use std::path::{Path, PathBuf};

    /// In-memory attribute store for exercising the pipeline without touching
    /// real extended attributes.
    ///
    /// Paths registered with [`MemoryWriter::fail_on`] reject every write with
    /// `ENOTSUP`, like a filesystem without xattr support.
    #[derive(Debug, Default)]
    pub struct MemoryWriter {
        attrs: RefCell<BTreeMap<(PathBuf, String), Vec<u8>>>,
        unsupported: RefCell<HashSet<PathBuf>>,
    }

    impl MemoryWriter {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every write to `path` fail.
        pub fn fail_on(&self, path: impl Into<PathBuf>) {
            self.unsupported.borrow_mut().insert(path.into());
        }

        /// Current value of attribute `name` on `path`.
        #[must_use]
        pub fn get(&self, path: impl AsRef<Path>, name: &str) -> Option<Vec<u8>> {
            self.attrs
                .borrow()
                .get(&(path.as_ref().to_path_buf(), name.to_string()))
                .cloned()
        }

        /// Number of attributes currently stored.
        #[must_use]
        pub fn len(&self) -> usize {
            self.attrs.borrow().len()
        }

        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.attrs.borrow().is_empty()
        }
    }

    impl AttributeWriter for MemoryWriter {
        fn set(&self, path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
            if self.unsupported.borrow().contains(path) {
                return Err(io::Error::from(io::ErrorKind::Unsupported));
            }
            self.attrs
                .borrow_mut()
                .insert((path.to_path_buf(), name.to_string()), value.to_vec());
            Ok(())
        }
    }
}

/// Applies decoded signatures to files beneath a root directory.
#[derive(Debug, Clone)]
pub struct AttributeApplier<W> {
    writer: W,
    root: PathBuf,
}

impl<W: AttributeWriter> AttributeApplier<W> {
    /// Apply beneath `/`.
    pub fn new(writer: W) -> Self {
        Self::with_root(writer, "/")
    }

    /// Apply beneath `root`, e.g. a package manager's alternate install root.
    pub fn with_root(writer: W, root: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an absolute target path onto the applier's root.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }

    /// Write one signature. A failure is logged and returned as an outcome,
    /// never as an error.
    pub fn apply_one(&self, target: &TargetSignature) -> FileOutcome {
        let path = self.resolve(&target.path);
        let value = target.signature.as_bytes();

        let outcome = match self.writer.set(&path, IMA_XATTR, value) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), len = value.len(), "set {IMA_XATTR}");
                AttributeOutcome::Applied { len: value.len() }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "IMA signature set error");
                AttributeOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        FileOutcome { path, outcome }
    }

    /// Write every signature in order, continuing past per-file failures.
    pub fn apply(&self, targets: &[TargetSignature]) -> Vec<FileOutcome> {
        targets.iter().map(|t| self.apply_one(t)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ima::types::DecodedSignature;

    fn target(path: &str, sig: &[u8]) -> TargetSignature {
        TargetSignature {
            line: 1,
            path: PathBuf::from(path),
            signature: DecodedSignature::new(sig.to_vec()),
        }
    }

    #[test]
    fn writes_signature_under_ima_attribute() {
        let writer = MemoryWriter::new();
        let applier = AttributeApplier::new(&writer);
        let outcome = applier.apply_one(&target("/etc/foo.conf", &[0xde, 0xad]));
        assert_eq!(outcome.outcome, AttributeOutcome::Applied { len: 2 });
        assert_eq!(
            writer.get("/etc/foo.conf", "security.ima"),
            Some(vec![0xde, 0xad])
        );
    }

    #[test]
    fn continues_after_failure() {
        let writer = MemoryWriter::new();
        writer.fail_on("/b");
        let applier = AttributeApplier::new(&writer);
        let outcomes = applier.apply(&[target("/a", &[1]), target("/b", &[2]), target("/c", &[3])]);

        assert!(outcomes[0].outcome.is_applied());
        assert!(!outcomes[1].outcome.is_applied());
        assert!(outcomes[2].outcome.is_applied());
        assert_eq!(writer.len(), 2);
        assert_eq!(writer.get("/b", IMA_XATTR), None);
    }

    #[test]
    fn each_write_uses_its_own_length() {
        let writer = MemoryWriter::new();
        let applier = AttributeApplier::new(&writer);
        applier.apply(&[target("/a", &[1, 2]), target("/b", &[1, 2, 3, 4])]);
        assert_eq!(writer.get("/b", IMA_XATTR).unwrap().len(), 4);
    }

    #[test]
    fn reapplying_is_idempotent() {
        let writer = MemoryWriter::new();
        let applier = AttributeApplier::new(&writer);
        let t = target("/usr/bin/foo", &[0x03, 0x02, 0x04]);
        applier.apply_one(&t);
        let first = writer.get("/usr/bin/foo", IMA_XATTR);
        applier.apply_one(&t);
        assert_eq!(writer.get("/usr/bin/foo", IMA_XATTR), first);
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn resolves_beneath_alternate_root() {
        let writer = MemoryWriter::new();
        let applier = AttributeApplier::with_root(&writer, "/srv/chroot");
        let outcome = applier.apply_one(&target("/etc/foo.conf", &[9]));
        assert_eq!(outcome.path, PathBuf::from("/srv/chroot/etc/foo.conf"));
        assert!(writer.get("/srv/chroot/etc/foo.conf", IMA_XATTR).is_some());
    }

    #[test]
    fn xattr_writer_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let applier = AttributeApplier::with_root(XattrWriter, dir.path());
        let outcome = applier.apply_one(&target("/does-not-exist", &[1, 2]));
        assert_eq!(outcome.path, missing);
        assert!(matches!(outcome.outcome, AttributeOutcome::Failed { .. }));
    }

    #[test]
    fn xattr_writer_sets_real_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool");
        std::fs::write(&file, b"#!/bin/sh\n").unwrap();

        XattrWriter
            .set(&file, "user.imasig.test", &[0x03, 0x02, 0x04])
            .unwrap();
        assert_eq!(
            xattr::get(&file, "user.imasig.test").unwrap(),
            Some(vec![0x03, 0x02, 0x04])
        );
    }

    #[test]
    fn xattr_writer_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("libfoo.so.1.2");
        let link = dir.path().join("libfoo.so.1");
        std::fs::write(&file, b"ELF").unwrap();
        std::os::unix::fs::symlink(&file, &link).unwrap();

        XattrWriter
            .set(&link, "user.imasig.test", &[0xde, 0xad])
            .unwrap();
        assert_eq!(
            xattr::get(&file, "user.imasig.test").unwrap(),
            Some(vec![0xde, 0xad])
        );
    }
}
