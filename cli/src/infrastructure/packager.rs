//! Artifact packaging
//!
//! Bundles the user's executable into the zip layout the flight runtime
//! expects:
//!
//! ```text
//! main.zip
//! ├── bootstrap        launcher stub, contains the executable entry name
//! ├── main             the executable named by `manifest.name`
//! └── <includes>       every regular file under `manifest.files`
//! ```
//!
//! The archive is written to `.flight/build/main.zip` and read back as the
//! upload payload.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::workdir::WorkDir;
use crate::domain::Manifest;
use crate::error::{ArchiveError, PackageError};

/// Launcher entry name
pub const BOOTSTRAP_ENTRY: &str = "bootstrap";

/// Entry name the executable is stored under
pub const EXECUTABLE_ENTRY: &str = "main";

/// Archive file name inside the build directory
pub const ARCHIVE_FILENAME: &str = "main.zip";

/// A packaged archive ready for upload
#[derive(Debug, Clone)]
pub struct PackagedArtifact {
    pub path: PathBuf,
    pub content: Vec<u8>,
    /// Hex SHA-256 of `content`
    pub sha256: String,
}

pub struct Packager {
    work_dir: WorkDir,
    /// Directory the executable and includes are read from
    source_root: PathBuf,
}

impl Packager {
    /// Packager reading sources from the current directory
    pub fn new(work_dir: WorkDir) -> Self {
        Self::with_source_root(work_dir, ".")
    }

    pub fn with_source_root(work_dir: WorkDir, source_root: impl Into<PathBuf>) -> Self {
        Self {
            work_dir,
            source_root: source_root.into(),
        }
    }

    pub fn package(&self, manifest: &Manifest) -> Result<PackagedArtifact, PackageError> {
        if manifest.name.is_empty() {
            return Err(PackageError::MissingName);
        }

        let build_dir = self
            .work_dir
            .prepare()
            .map_err(|source| PackageError::WorkDir {
                path: self.work_dir.build_dir(),
                source,
            })?;
        let path = build_dir.join(ARCHIVE_FILENAME);

        self.write_archive(&path, manifest)?;

        debug!("reading from {}", path.display());
        let content = std::fs::read(&path).map_err(|source| PackageError::ReadBack {
            path: path.clone(),
            source,
        })?;
        let sha256 = format!("{:x}", Sha256::digest(&content));
        debug!("packaged {} bytes", content.len());

        Ok(PackagedArtifact {
            path,
            content,
            sha256,
        })
    }

    fn write_archive(&self, path: &Path, manifest: &Manifest) -> Result<(), PackageError> {
        debug!("zipping file to {}", path.display());

        let file = File::create(path).map_err(|source| PackageError::WorkDir {
            path: path.to_path_buf(),
            source,
        })?;
        let mut zip = ZipWriter::new(file);

        write_entry(&mut zip, BOOTSTRAP_ENTRY, EXECUTABLE_ENTRY.as_bytes())
            .map_err(PackageError::Bootstrap)?;
        self.write_executable(&mut zip, &manifest.name)
            .map_err(PackageError::Executable)?;
        self.write_includes(&mut zip, manifest.includes())
            .map_err(PackageError::Includes)?;

        zip.finish()
            .map_err(|e| PackageError::Finish(ArchiveError::Zip(e)))?;
        Ok(())
    }

    fn write_executable(
        &self,
        zip: &mut ZipWriter<File>,
        name: &str,
    ) -> Result<(), ArchiveError> {
        let source = self.source_root.join(name);
        let data = read(&source)?;

        // -rwxrwxrwx, Unix creator
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o777);
        zip.start_file(EXECUTABLE_ENTRY, options)?;
        zip.write_all(&data).map_err(|e| io_error(&source, e))?;
        Ok(())
    }

    fn write_includes(
        &self,
        zip: &mut ZipWriter<File>,
        includes: &[String],
    ) -> Result<(), ArchiveError> {
        for include in includes {
            for entry in WalkDir::new(self.source_root.join(include)).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    continue;
                }

                let data = read(entry.path())?;
                let relative = entry
                    .path()
                    .strip_prefix(&self.source_root)
                    .unwrap_or(entry.path());
                let name = entry_name(relative);
                debug!("{}", name);

                write_entry(zip, &name, &data)?;
            }
        }
        Ok(())
    }
}

/// Archive entry name with Unix path separators
pub fn entry_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn write_entry(zip: &mut ZipWriter<File>, name: &str, content: &[u8]) -> Result<(), ArchiveError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(name, options)?;
    zip.write_all(content).map_err(|e| io_error(Path::new(name), e))?;
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, ArchiveError> {
    std::fs::read(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}
