use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::error::WorkerError;
use crate::storage::COMMANDE_DIRECTORY;
use crate::worker::job::Job;

/// Directory levels below the root that are searched by default.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Year folders produced by earlier runs.
static YEAR_DIRECTORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^20\d{2}$").expect("year directory pattern must compile"));

/// Finds candidate PDFs under a root, skipping folders that hold already
/// sorted output.
pub struct DirectoryScanner {
    root: PathBuf,
    max_depth: usize,
}

impl DirectoryScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Number of directory levels below the root to descend into.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Jobs sorted by path. Unreadable entries below the root are logged and
    /// skipped; an unreadable root is an error.
    pub fn scan(&self) -> Result<Vec<Job>, WorkerError> {
        let mut paths = Vec::new();

        // files sit one level deeper than the deepest directory visited
        let walker = WalkDir::new(&self.root)
            .max_depth(self.max_depth + 1)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded_directory(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(WorkerError::ScanFailed {
                        path: self.root.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            if is_pdf(entry.path()) {
                debug!("Found document: {}", entry.path().display());
                paths.push(entry.into_path());
            }
        }

        paths.sort();

        info!("Scanned {} PDF files in {}", paths.len(), self.root.display());
        Ok(paths.into_iter().map(Job::new).collect())
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn is_excluded_directory(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    name.eq_ignore_ascii_case(COMMANDE_DIRECTORY) || YEAR_DIRECTORY.is_match(&name)
}
