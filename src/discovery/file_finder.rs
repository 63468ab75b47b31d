//! Project source discovery
//!
//! Resolves the root package's own autoload declarations into the concrete
//! list of PHP files whose consumed symbols decide dependency usage.
//! Discovery runs entirely up front; the engine consumes a finished file
//! list.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::manifest::{Autoload, ComposerManifest};

/// Finds the PHP files belonging to the project's own source tree.
pub struct FileFinder<'a> {
    manifest: &'a ComposerManifest,
    excluded_dirs: &'a [String],
    extra_files: &'a [PathBuf],
}

impl<'a> FileFinder<'a> {
    pub fn new(
        manifest: &'a ComposerManifest,
        excluded_dirs: &'a [String],
        extra_files: &'a [PathBuf],
    ) -> Self {
        Self {
            manifest,
            excluded_dirs,
            extra_files,
        }
    }

    /// All PHP files reachable from the root autoload and autoload-dev
    /// sections, plus caller-supplied extra files. Missing autoload
    /// targets warn rather than abort.
    pub fn find_php_files(&self) -> (Vec<PathBuf>, Vec<String>) {
        let mut files: BTreeSet<PathBuf> = BTreeSet::new();
        let mut warnings = Vec::new();

        for autoload in [&self.manifest.autoload, &self.manifest.autoload_dev] {
            self.collect_autoload(autoload, &mut files, &mut warnings);
        }

        for extra in self.extra_files {
            if extra.is_file() {
                files.insert(extra.clone());
            } else {
                warnings.push(format!("additional file {} not found", extra.display()));
            }
        }

        debug!("Discovered {} project files", files.len());
        (files.into_iter().collect(), warnings)
    }

    fn collect_autoload(
        &self,
        autoload: &Autoload,
        files: &mut BTreeSet<PathBuf>,
        warnings: &mut Vec<String>,
    ) {
        let dirs = autoload
            .psr4
            .iter()
            .chain(autoload.psr0.iter())
            .flat_map(|(_, dirs)| dirs.iter());

        for dir in dirs {
            if dir.is_dir() {
                self.walk(dir, files);
            } else {
                warnings.push(format!("autoload directory {} does not exist", dir.display()));
            }
        }

        for entry in autoload.files.iter().chain(autoload.classmap.iter()) {
            if entry.is_dir() {
                self.walk(entry, files);
            } else if entry.is_file() {
                files.insert(entry.clone());
            } else {
                warnings.push(format!("autoload entry {} does not exist", entry.display()));
            }
        }
    }

    fn walk(&self, dir: &Path, files: &mut BTreeSet<PathBuf>) {
        let walker = WalkDir::new(dir).follow_links(false).into_iter();
        let entries = walker.filter_entry(|e| {
            if e.file_type().is_dir() {
                let name = e.file_name().to_string_lossy();
                if self.excluded_dirs.iter().any(|ex| ex.as_str() == name) {
                    trace!("excluding directory {}", e.path().display());
                    return false;
                }
            }
            true
        });

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "php") {
                files.insert(path.to_path_buf());
            }
        }
    }
}
