//! Provided-symbol index
//!
//! Maps symbol names to the dependencies that could provide them. Explicit
//! names (classmaps, symbols defined in autoload files) are indexed up
//! front; prefix mappings are resolved lazily per lookup, because a PSR
//! prefix describes an open set of names and membership is decided by a
//! filesystem existence check on the derived path.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::manifest::{platform_symbol, Dependency, PrefixStyle, SymbolMapping};
use crate::symbol::{normalize, SymbolExtractor};

#[derive(Debug)]
struct PrefixEntry {
    /// Normalized prefix for the case-insensitive match
    prefix: String,
    base_dir: PathBuf,
    style: PrefixStyle,
    package: String,
}

/// Index from symbol name to the set of dependency identities that could
/// provide it. Ambiguous ownership is legal; the classifier treats a
/// symbol as satisfied by any one provider.
#[derive(Debug, Default)]
pub struct ProvidedIndex {
    exact: HashMap<String, BTreeSet<String>>,
    prefixes: Vec<PrefixEntry>,

    /// Partial-data conditions hit while building (missing autoload dirs,
    /// unreadable vendor files). Never fatal.
    pub warnings: Vec<String>,
}

impl ProvidedIndex {
    /// Build the index over every potential provider (declared
    /// dependencies plus installed-but-undeclared packages).
    pub fn build(providers: &[Dependency], extractor: &SymbolExtractor) -> Self {
        let mut index = Self::default();

        for dep in providers {
            if dep.platform {
                index.add_exact(&platform_symbol(&dep.name), &dep.name);
            }

            for mapping in &dep.mappings {
                match mapping {
                    SymbolMapping::PrefixDirectory { prefix, base_dir, style } => {
                        if !base_dir.is_dir() {
                            index.warnings.push(format!(
                                "autoload directory {} declared by {} does not exist",
                                base_dir.display(),
                                dep.name
                            ));
                            continue;
                        }
                        index.prefixes.push(PrefixEntry {
                            prefix: normalize(prefix),
                            base_dir: base_dir.clone(),
                            style: *style,
                            package: dep.name.clone(),
                        });
                    }
                    SymbolMapping::ExplicitFiles { paths } => {
                        index.index_explicit_files(dep, paths, extractor);
                    }
                    SymbolMapping::ClassMap { names } => {
                        for name in names {
                            index.add_exact(name, &dep.name);
                        }
                    }
                }
            }
        }

        debug!(
            "Provided-symbol index: {} exact entries, {} prefix mappings",
            index.exact.len(),
            index.prefixes.len()
        );
        index
    }

    /// Every dependency that could provide `name`. Prefix mappings are
    /// checked against the filesystem here; a missing file just means the
    /// mapping does not provide the symbol.
    pub fn providers_of(&self, name: &str) -> BTreeSet<&str> {
        let trimmed = name.trim_start_matches('\\');
        let normalized = normalize(name);

        let mut providers: BTreeSet<&str> = self
            .exact
            .get(&normalized)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();

        for entry in &self.prefixes {
            if providers.contains(entry.package.as_str()) {
                continue;
            }
            if !normalized.starts_with(&entry.prefix) {
                continue;
            }
            // Path derivation uses the original casing; only the prefix
            // comparison is case-insensitive.
            let candidate = match entry.style {
                PrefixStyle::Psr4 => trimmed
                    .get(entry.prefix.len()..)
                    .and_then(|suffix| psr4_path(&entry.base_dir, suffix)),
                PrefixStyle::Psr0 => psr0_path(&entry.base_dir, trimmed),
            };
            if let Some(path) = candidate {
                trace!("checking {} for {}", path.display(), name);
                if path.is_file() {
                    providers.insert(&entry.package);
                }
            }
        }

        providers
    }

    fn add_exact(&mut self, name: &str, package: &str) {
        self.exact
            .entry(normalize(name))
            .or_default()
            .insert(package.to_string());
    }

    /// Symbols physically defined in explicit autoload files belong to the
    /// dependency regardless of name. Unreadable or missing files degrade
    /// to "provides nothing" with a warning.
    fn index_explicit_files(
        &mut self,
        dep: &Dependency,
        paths: &[PathBuf],
        extractor: &SymbolExtractor,
    ) {
        for path in paths.iter().flat_map(expand_php_files) {
            match extractor.extract(&path) {
                Ok(symbols) => {
                    for defined in symbols.defined {
                        self.add_exact(&defined.name, &dep.name);
                    }
                }
                Err(e) => {
                    self.warnings
                        .push(format!("{} (declared by {})", e, dep.name));
                }
            }
        }
    }
}

/// A classmap entry may be a file or a directory tree.
fn expand_php_files(path: &PathBuf) -> Vec<PathBuf> {
    if path.is_dir() {
        WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "php"))
            .collect()
    } else {
        vec![path.clone()]
    }
}

/// PSR-4: strip the prefix, map namespace separators to directories.
///
/// A prefix declared without its trailing backslash leaves a leading
/// separator on the suffix; that must be trimmed, or the join would
/// escape the base directory entirely.
fn psr4_path(base_dir: &Path, suffix: &str) -> Option<PathBuf> {
    let suffix = suffix.trim_start_matches(['\\', '/']);
    if suffix.is_empty() {
        return None;
    }
    Some(base_dir.join(format!("{}.php", suffix.replace('\\', "/"))))
}

/// PSR-0: the full name maps under the base directory, and underscores in
/// the class basename are directory separators.
fn psr0_path(base_dir: &Path, full_name: &str) -> Option<PathBuf> {
    if full_name.is_empty() {
        return None;
    }
    let (namespace, class) = match full_name.rsplit_once('\\') {
        Some((ns, class)) => (ns.replace('\\', "/"), class),
        None => (String::new(), full_name),
    };
    let class_path = class.replace('_', "/");
    let rel = if namespace.is_empty() {
        format!("{}.php", class_path)
    } else {
        format!("{}/{}.php", namespace, class_path)
    };
    Some(base_dir.join(rel))
}
