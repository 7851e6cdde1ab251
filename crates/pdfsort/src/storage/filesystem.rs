use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use walkdir::WalkDir;

use crate::dates::DateCandidate;
use crate::error::StorageError;

/// Directory under the root receiving documents flagged as non-invoices.
pub const COMMANDE_DIRECTORY: &str = "commande";

/// Directory between the year and the month folders.
pub const INVOICE_DIRECTORY: &str = "Facture fournisseur";

const SUFFIX_LENGTH: usize = 3;
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on same
/// filesystem). Falls back to copy + delete when rename fails, which handles
/// cross-device moves.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LENGTH)
        .map(char::from)
        .collect()
}

/// `invoice.pdf` + `a1B` gives `invoice_a1B.pdf`.
fn suffixed_name(filename: &Path, suffix: &str) -> String {
    let stem = filename
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match filename.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    }
}

/// Filesystem side of sorting: destination layout, collision-safe moves and
/// clean-up of emptied directories, all relative to one root.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn commande_directory(&self) -> PathBuf {
        self.root.join(COMMANDE_DIRECTORY)
    }

    /// `<root>/<YYYY>/Facture fournisseur/<MM>`
    pub fn invoice_directory(&self, date: &DateCandidate) -> PathBuf {
        self.root
            .join(date.year.to_string())
            .join(INVOICE_DIRECTORY)
            .join(date.month_folder())
    }

    /// Where `source` would land in `directory` if nothing was in the way.
    pub fn planned_destination(
        &self,
        source: &Path,
        directory: &Path,
    ) -> Result<PathBuf, StorageError> {
        let filename = source
            .file_name()
            .ok_or_else(|| StorageError::MissingFileName(source.to_path_buf()))?;
        Ok(directory.join(filename))
    }

    /// Moves `source` into `directory`, creating it if needed, and returns
    /// the final path. A taken name gets a random `_xyz` suffix before the
    /// extension.
    pub fn move_into(&self, source: &Path, directory: &Path) -> Result<PathBuf, StorageError> {
        let planned = self.planned_destination(source, directory)?;
        self.ensure_directory(directory)?;

        let destination = self.reserve_destination(&planned)?;
        if let Err(e) = move_file(source, &destination) {
            if let Err(cleanup) = std::fs::remove_file(&destination) {
                log::warn!(
                    "Failed to remove placeholder {}: {}",
                    destination.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        log::debug!("Moved {} to {}", source.display(), destination.display());
        Ok(destination)
    }

    /// Creates an empty placeholder at the first free candidate name so that
    /// concurrent moves into the same directory never pick the same target.
    /// The move then replaces the placeholder.
    fn reserve_destination(&self, planned: &Path) -> Result<PathBuf, StorageError> {
        let directory = planned.parent().unwrap_or(&self.root);
        let filename = Path::new(planned.file_name().unwrap_or_default());

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                planned.to_path_buf()
            } else {
                directory.join(suffixed_name(filename, &random_suffix()))
            };

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    log::debug!("{} is taken, trying another name", candidate.display());
                    continue;
                }
                Err(e) => {
                    return Err(StorageError::CreateFile {
                        path: candidate,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(planned.to_path_buf()))
    }

    /// Idempotent; another worker creating the same directory concurrently
    /// is not an error.
    pub fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        match std::fs::create_dir_all(path) {
            Ok(()) => Ok(()),
            Err(_) if path.is_dir() => Ok(()),
            Err(e) => Err(StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Removes every empty directory below the root, deepest first, so that
    /// parents emptied along the way go too. The root itself is kept.
    /// Directories that cannot be removed are logged and skipped.
    pub fn prune_empty_directories(&self) -> Vec<PathBuf> {
        let mut removed = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir());

        for entry in walker {
            let path = entry.path();
            let is_empty = match std::fs::read_dir(path) {
                Ok(mut entries) => entries.next().is_none(),
                Err(e) => {
                    log::warn!("Cannot list {}: {}", path.display(), e);
                    continue;
                }
            };
            if !is_empty {
                continue;
            }

            match std::fs::remove_dir(path) {
                Ok(()) => {
                    log::info!("Removed empty folder: {}", path.display());
                    removed.push(path.to_path_buf());
                }
                Err(e) => {
                    let error = StorageError::RemoveDirectory {
                        path: path.to_path_buf(),
                        source: e,
                    };
                    log::warn!("{}", error);
                }
            }
        }

        removed
    }
}
