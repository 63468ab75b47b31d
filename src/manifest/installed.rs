//! vendor/composer/installed.json reading
//!
//! The installed tree tells the engine two things: which autoload mappings
//! each declared dependency carries, and which packages are present only
//! because something else pulled them in (zombie candidates).

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::composer_json::Autoload;
use super::{ManifestError, PrefixStyle, SymbolMapping};

/// A package present in the resolved install tree.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub name: String,
    pub mappings: Vec<SymbolMapping>,
}

/// Load the install tree from `<project>/vendor/composer/installed.json`.
///
/// A missing file degrades to an empty tree with a warning; dependency
/// classification then has no provided symbols to match against, which is
/// still a valid (if unhelpful) run. A Composer 1 schema is a hard error.
pub fn load_installed(
    project_root: &Path,
    warnings: &mut Vec<String>,
) -> Result<Vec<InstalledPackage>, ManifestError> {
    let installed_path = project_root.join("vendor").join("composer").join("installed.json");
    if !installed_path.is_file() {
        warnings.push(format!(
            "{} not found; run `composer install` for accurate results",
            installed_path.display()
        ));
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(&installed_path).map_err(|e| ManifestError::Io {
        path: installed_path.clone(),
        message: e.to_string(),
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|e| ManifestError::Parse {
        path: installed_path.clone(),
        message: e.to_string(),
    })?;

    // Composer 1 wrote a bare array; only the Composer 2 schema is supported.
    if value.is_array() {
        return Err(ManifestError::UnsupportedVersion(1));
    }

    let composer_dir = installed_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_root.join("vendor/composer"));
    let vendor_dir = project_root.join("vendor");

    let mut packages = Vec::new();
    for entry in value
        .get("packages")
        .and_then(Value::as_array)
        .map(|a| a.as_slice())
        .unwrap_or_default()
    {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            continue;
        };

        // Composer 2 records the install path relative to vendor/composer/.
        let install_dir = entry
            .get("install-path")
            .and_then(Value::as_str)
            .map(|p| composer_dir.join(p))
            .unwrap_or_else(|| vendor_dir.join(name));

        let mappings = entry
            .get("autoload")
            .map(|v| {
                let autoload = Autoload::from_value(v, &install_dir, &mut Vec::new());
                autoload_mappings(&autoload)
            })
            .unwrap_or_default();

        packages.push(InstalledPackage {
            name: name.to_string(),
            mappings,
        });
    }

    debug!("Loaded {} installed packages", packages.len());
    Ok(packages)
}

/// Convert autoload declarations into the classifier's mapping variants.
pub fn autoload_mappings(autoload: &Autoload) -> Vec<SymbolMapping> {
    let mut mappings = Vec::new();

    for (prefix, dirs) in &autoload.psr4 {
        for dir in dirs {
            mappings.push(SymbolMapping::PrefixDirectory {
                prefix: prefix.clone(),
                base_dir: dir.clone(),
                style: PrefixStyle::Psr4,
            });
        }
    }
    for (prefix, dirs) in &autoload.psr0 {
        for dir in dirs {
            mappings.push(SymbolMapping::PrefixDirectory {
                prefix: prefix.clone(),
                base_dir: dir.clone(),
                style: PrefixStyle::Psr0,
            });
        }
    }

    let mut paths: Vec<PathBuf> = autoload.files.clone();
    paths.extend(autoload.classmap.clone());
    if !paths.is_empty() {
        mappings.push(SymbolMapping::ExplicitFiles { paths });
    }

    mappings
}
