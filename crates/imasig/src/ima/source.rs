//! Where signature manifests come from
//!
//! The library only needs "open, stat, read" from a manifest source. An
//! absent manifest is not an error: a package without signatures simply has
//! nothing to apply.

use super::MANIFEST_FILE;
use crate::error::{ImasigError, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// A readable signature manifest.
pub trait ManifestSource {
    /// Human-readable identity used in diagnostics and error messages.
    fn describe(&self) -> String;

    /// Read the whole manifest.
    ///
    /// Returns `Ok(None)` when the manifest does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ImasigError::ManifestUnreadable` if the manifest cannot be
    /// opened, stat'ed or read, and `ImasigError::ManifestNotRegular` if it
    /// is not a regular file.
    fn load(&self) -> Result<Option<Vec<u8>>>;
}

/// A manifest at an explicit filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestSource for ManifestFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Option<Vec<u8>>> {
        let unreadable = |source: io::Error| ImasigError::ManifestUnreadable {
            manifest: self.describe(),
            source,
        };

        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(manifest = %self.path.display(), "no signature manifest");
                return Ok(None);
            }
            Err(e) => return Err(unreadable(e)),
        };

        let meta = file.metadata().map_err(unreadable)?;
        if !meta.is_file() {
            return Err(ImasigError::ManifestNotRegular {
                manifest: self.describe(),
            });
        }

        let mut buf = Vec::with_capacity(usize::try_from(meta.len()).unwrap_or(0));
        file.read_to_end(&mut buf).map_err(unreadable)?;
        Ok(Some(buf))
    }
}

/// The manifest a package ships in a dpkg-style administrative directory:
/// `<admindir>/info/<package>.sig_shasums`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfoDb {
    admindir: PathBuf,
    package: String,
}

impl PackageInfoDb {
    /// Default dpkg administrative directory.
    pub const DEFAULT_ADMINDIR: &'static str = "/var/lib/dpkg";

    pub fn new(admindir: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        Self {
            admindir: admindir.into(),
            package: package.into(),
        }
    }

    /// Path of the package's signature manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.admindir
            .join("info")
            .join(format!("{}.{MANIFEST_FILE}", self.package))
    }
}

impl ManifestSource for PackageInfoDb {
    fn describe(&self) -> String {
        format!(
            "{MANIFEST_FILE} of package '{}' ({})",
            self.package,
            self.manifest_path().display()
        )
    }

    fn load(&self) -> Result<Option<Vec<u8>>> {
        ManifestFile::new(self.manifest_path())
            .load()
            .map_err(|e| match e {
                ImasigError::ManifestUnreadable { source, .. } => ImasigError::ManifestUnreadable {
                    manifest: self.describe(),
                    source,
                },
                ImasigError::ManifestNotRegular { .. } => ImasigError::ManifestNotRegular {
                    manifest: self.describe(),
                },
                other => other,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let source = ManifestFile::new(dir.path().join("sig_shasums"));
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn reads_manifest_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sig_shasums");
        std::fs::write(&path, b"sha256 etc/foo.conf deadbeef\n").unwrap();
        let data = ManifestFile::new(&path).load().unwrap().unwrap();
        assert_eq!(data, b"sha256 etc/foo.conf deadbeef\n");
    }

    #[test]
    fn empty_manifest_is_empty_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sig_shasums");
        std::fs::File::create(&path).unwrap();
        assert_eq!(ManifestFile::new(&path).load().unwrap(), Some(Vec::new()));
    }

    #[test]
    fn directory_is_not_regular() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestFile::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ImasigError::ManifestNotRegular { .. }), "{err}");
    }

    #[test]
    fn info_db_path_follows_dpkg_layout() {
        let db = PackageInfoDb::new("/var/lib/dpkg", "coreutils");
        assert_eq!(
            db.manifest_path(),
            PathBuf::from("/var/lib/dpkg/info/coreutils.sig_shasums")
        );
    }

    #[test]
    fn info_db_errors_name_the_package() {
        let admindir = tempfile::tempdir().unwrap();
        let info = admindir.path().join("info");
        std::fs::create_dir_all(info.join("foo.sig_shasums")).unwrap();

        let err = PackageInfoDb::new(admindir.path(), "foo").load().unwrap_err();
        assert!(err.to_string().contains("package 'foo'"), "{err}");
    }

    #[test]
    fn info_db_reads_package_manifest() {
        let admindir = tempfile::tempdir().unwrap();
        let info = admindir.path().join("info");
        std::fs::create_dir_all(&info).unwrap();
        std::fs::write(info.join("foo.sig_shasums"), b"sha256 a 00\n").unwrap();

        let data = PackageInfoDb::new(admindir.path(), "foo").load().unwrap();
        assert_eq!(data.as_deref(), Some(&b"sha256 a 00\n"[..]));
    }
}
