//! Zip extraction into a game directory

use crate::error::{InstallerError, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

/// Extract every entry of the zip at `archive_path` into `dest`.
///
/// Existing files are overwritten. Entries whose path is absolute or climbs
/// out of `dest` abort the extraction with [`InstallerError::UnsafeArchiveEntry`];
/// entries written before the offending one are left in place.
///
/// Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    info!("Extracting {} into {}", archive_path.display(), dest.display());

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| InstallerError::UnsafeArchiveEntry(entry.name().to_string()))?;
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        debug!("Extracted {}", relative.display());
        written += 1;
    }

    Ok(written)
}
