use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, StorageError};

/// `.zip` files directly inside `directory`, sorted by name. The extension
/// match is case-sensitive.
pub fn find_archives(directory: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let entries = std::fs::read_dir(directory).map_err(|e| StorageError::ListDirectory {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let mut archives: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| e.file_name().to_string_lossy().ends_with(".zip"))
        .map(|e| e.path())
        .collect();

    archives.sort();
    Ok(archives)
}

/// Extracts every entry of `archive` into `destination` and returns the
/// number of entries. Entry names that would escape `destination` are
/// rejected by the zip reader.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<usize, ArchiveError> {
    let _span = tracing::info_span!(
        "storage.extract_archive",
        archive = %crate::sanitize::redact_path(archive)
    )
    .entered();

    let file = std::fs::File::open(archive).map_err(|e| ArchiveError::Open {
        path: archive.to_path_buf(),
        source: e,
    })?;

    let mut zip = zip::ZipArchive::new(file).map_err(|e| ArchiveError::Corrupt {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;

    let entries = zip.len();
    zip.extract(destination).map_err(|e| ArchiveError::Extract {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::debug!("Extracted {} entries", entries);
    Ok(entries)
}
