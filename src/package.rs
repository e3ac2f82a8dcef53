//! KMZ packaging and the working directory that feeds it.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{OverlayError, Result};
use crate::kml::DOC_ENTRY_NAME;
use crate::model::ExtractedTile;

/// Scratch directory owned by a single run.
///
/// Removed recursively when dropped, so every early return cleans up.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    /// Create `<system temp>/<prefix>XXXXXX`.
    pub fn create(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        debug!("Created working directory {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn create_in(parent: &Path, prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("Removed working directory {:?}", path);
        Ok(())
    }
}

/// Writes `doc.kml` and tile images into one KMZ archive.
#[derive(Debug, Clone, Default)]
pub struct PackageAssembler {
    keep_sidecars: bool,
}

impl PackageAssembler {
    pub fn new(keep_sidecars: bool) -> Self {
        Self { keep_sidecars }
    }

    /// Build the archive at `output` and release `work_dir`.
    ///
    /// The archive is written next to `output` under a temporary name and
    /// only renamed into place once complete; on failure nothing is left at
    /// `output`. Each tile's files are deleted as soon as they are archived.
    pub fn assemble(
        &self,
        output: &Path,
        document: &str,
        tiles: &[ExtractedTile],
        work_dir: WorkDir,
    ) -> Result<()> {
        info!("Building KMZ {:?} with {} tiles", output, tiles.len());

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let partial = NamedTempFile::new_in(parent).map_err(|e| OverlayError::packaging(output, e))?;

        // Descriptor first, then tiles in grid order
        let mut zip = ZipWriter::new(partial);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        zip.start_file(DOC_ENTRY_NAME, options)
            .map_err(|e| OverlayError::packaging(output, e))?;
        zip.write_all(document.as_bytes())
            .map_err(|e| OverlayError::packaging(output, e))?;

        for tile in tiles {
            let image = fs::read(&tile.image_path)
                .map_err(|e| OverlayError::packaging(&tile.image_path, e))?;
            zip.start_file(tile.image_file_name(), options)
                .map_err(|e| OverlayError::packaging(output, e))?;
            zip.write_all(&image)
                .map_err(|e| OverlayError::packaging(output, e))?;

            if self.keep_sidecars {
                for sidecar in &tile.sidecars {
                    let bytes =
                        fs::read(sidecar).map_err(|e| OverlayError::packaging(sidecar, e))?;
                    zip.start_file(file_name(sidecar), options)
                        .map_err(|e| OverlayError::packaging(output, e))?;
                    zip.write_all(&bytes)
                        .map_err(|e| OverlayError::packaging(output, e))?;
                }
            }

            // Archived files leave the working directory right away
            remove_if_exists(&tile.image_path)?;
            for sidecar in &tile.sidecars {
                remove_if_exists(sidecar)?;
            }
        }

        let partial = zip.finish().map_err(|e| OverlayError::packaging(output, e))?;

        // Temp files are created 0600; the delivered package is world-readable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            partial
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(|e| OverlayError::packaging(output, e))?;
        }

        partial
            .persist(output)
            .map_err(|e| OverlayError::packaging(output, e.error))?;

        work_dir.close()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OverlayError::packaging(path, e)),
    }
}
