//! composer.json reading
//!
//! Parses the project manifest: package name, the `require` section with
//! declared version constraints, and the autoload declarations for the
//! project's own source. Autoload values tolerate the string-or-array
//! forms Composer accepts.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::ManifestError;

/// A single entry from the `require` section.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: String,
    pub constraint: String,
    /// 1-based line in composer.json where the requirement appears.
    pub line: Option<usize>,
}

/// Autoload declarations, with directories resolved against the
/// manifest's own directory.
#[derive(Debug, Clone, Default)]
pub struct Autoload {
    /// PSR-4 prefix to directories
    pub psr4: Vec<(String, Vec<PathBuf>)>,
    /// PSR-0 prefix to directories
    pub psr0: Vec<(String, Vec<PathBuf>)>,
    /// Files always loaded
    pub files: Vec<PathBuf>,
    /// Classmap entries (files or directories)
    pub classmap: Vec<PathBuf>,
}

impl Autoload {
    /// Parse an `autoload` object. Non-fatal oddities are pushed to
    /// `warnings`.
    pub fn from_value(value: &Value, base: &Path, warnings: &mut Vec<String>) -> Self {
        let mut autoload = Autoload::default();
        let Some(obj) = value.as_object() else {
            return autoload;
        };

        for (section, target) in [("psr-4", &mut autoload.psr4), ("psr-0", &mut autoload.psr0)] {
            if let Some(map) = obj.get(section).and_then(Value::as_object) {
                for (prefix, dirs) in map {
                    if section == "psr-4" && prefix.is_empty() {
                        warnings.push(
                            "composer.json[autoload][psr-4] contains an empty namespace. \
                             It's usually a bad idea for performance, see output of \
                             \"composer validate\" command."
                                .to_string(),
                        );
                    }
                    let resolved = string_or_array(dirs)
                        .into_iter()
                        .map(|d| base.join(d))
                        .collect();
                    target.push((prefix.clone(), resolved));
                }
            }
        }

        if let Some(files) = obj.get("files").and_then(Value::as_array) {
            autoload.files = files
                .iter()
                .filter_map(Value::as_str)
                .map(|f| base.join(f))
                .collect();
        }
        if let Some(classmap) = obj.get("classmap").and_then(Value::as_array) {
            autoload.classmap = classmap
                .iter()
                .filter_map(Value::as_str)
                .map(|f| base.join(f))
                .collect();
        }

        autoload
    }
}

/// The project's composer.json, as far as dependency analysis needs it.
#[derive(Debug)]
pub struct ComposerManifest {
    /// Path to the composer.json file itself
    pub path: PathBuf,

    /// Directory containing the manifest; all autoload paths resolve
    /// against this
    pub root: PathBuf,

    pub name: Option<String>,

    /// Declared requirements, in manifest order
    pub requirements: Vec<Requirement>,

    pub autoload: Autoload,
    pub autoload_dev: Autoload,

    /// Non-fatal conditions noticed while reading
    pub warnings: Vec<String>,
}

impl ComposerManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut warnings = Vec::new();
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        if name.is_none() {
            warnings.push("Missing 'name' property in composer.json".to_string());
        }

        let mut requirements = Vec::new();
        if let Some(require) = value.get("require").and_then(Value::as_object) {
            for (pkg, constraint) in require {
                requirements.push(Requirement {
                    name: pkg.clone(),
                    constraint: constraint.as_str().unwrap_or_default().to_string(),
                    line: find_requirement_line(&raw, pkg),
                });
            }
        }

        let autoload = value
            .get("autoload")
            .map(|v| Autoload::from_value(v, &root, &mut warnings))
            .unwrap_or_default();
        let autoload_dev = value
            .get("autoload-dev")
            .map(|v| Autoload::from_value(v, &root, &mut warnings))
            .unwrap_or_default();

        debug!(
            "Loaded {}: {} requirements",
            path.display(),
            requirements.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            root,
            name,
            requirements,
            autoload,
            autoload_dev,
            warnings,
        })
    }
}

/// Accept both `"src/"` and `["src/", "lib/"]`.
fn string_or_array(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Locate the line a requirement is declared on, for report locations.
/// A plain text scan is enough here; serde_json does not keep spans.
fn find_requirement_line(raw: &str, package: &str) -> Option<usize> {
    let needle = format!("\"{}\"", package);
    raw.lines()
        .position(|line| {
            line.contains(&needle) && line[line.find(&needle).unwrap()..].contains(':')
        })
        .map(|idx| idx + 1)
}
