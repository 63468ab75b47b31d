//! Resolution pass orchestration
//!
//! Wires manifest reading, the install tree, source discovery, symbol
//! extraction, the provided-symbol index, and the classifier into one
//! pass. Everything is rebuilt fresh per invocation; the engine holds no
//! state across runs, so running twice over the same tree yields the same
//! classification.

use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classify::{classify, Analysis, ClassifyPolicy};
use crate::config::Config;
use crate::discovery::FileFinder;
use crate::filter::FilterPipeline;
use crate::manifest::{
    is_platform_requirement, load_installed, ComposerManifest, Dependency, InstalledPackage,
};
use crate::provider::ProvidedIndex;
use crate::symbol::{SymbolExtractor, SymbolSet};

/// Everything one resolution pass produces.
#[derive(Debug)]
pub struct Resolution {
    pub analysis: Analysis,

    /// Non-fatal conditions gathered across the whole pass
    pub warnings: Vec<String>,

    pub manifest_path: PathBuf,

    /// Number of project files scanned
    pub scanned_files: usize,
}

/// Run a full resolution pass over the project at `manifest_path`.
///
/// `on_file` is invoked once per extracted project file so the caller can
/// drive a progress display; extraction results are fully drained before
/// classification starts.
pub fn resolve(
    manifest_path: &Path,
    config: &Config,
    filters: &FilterPipeline,
    policy: ClassifyPolicy,
    on_file: Option<&(dyn Fn() + Sync)>,
) -> Result<Resolution> {
    let manifest = ComposerManifest::load(manifest_path)
        .into_diagnostic()
        .wrap_err("unable to load composer.json")?;
    let mut warnings = manifest.warnings.clone();

    let installed = load_installed(&manifest.root, &mut warnings).into_diagnostic()?;
    let declared = assemble_declared(&manifest, &installed);

    // The index covers every potential provider: declared dependencies
    // plus installed packages nothing declared, so zombie candidates can
    // be resolved through the same lookup.
    let mut providers = declared.clone();
    for pkg in &installed {
        if !declared.iter().any(|d| d.name == pkg.name) {
            providers
                .push(Dependency::new(pkg.name.clone()).with_mappings(pkg.mappings.clone()));
        }
    }

    let extractor = SymbolExtractor::new();
    let index = ProvidedIndex::build(&providers, &extractor);
    warnings.extend(index.warnings.iter().cloned());

    let finder = FileFinder::new(&manifest, &config.exclude_dirs, &config.extra_files);
    let (files, discovery_warnings) = finder.find_php_files();
    warnings.extend(discovery_warnings);

    let consumed = extract_consumed(&files, &extractor, config.lenient, &mut warnings, on_file)?;

    info!(
        "Scanned {} files, {} distinct consumed symbols",
        files.len(),
        consumed.len()
    );

    let analysis = classify(&declared, &index, &consumed, filters, policy);

    Ok(Resolution {
        analysis,
        warnings,
        manifest_path: manifest.path.clone(),
        scanned_files: files.len(),
    })
}

/// Join the manifest's require section with the install tree to produce
/// the declared dependency list the classifier sees.
fn assemble_declared(
    manifest: &ComposerManifest,
    installed: &[InstalledPackage],
) -> Vec<Dependency> {
    manifest
        .requirements
        .iter()
        .map(|req| {
            if is_platform_requirement(&req.name) {
                return Dependency::platform(req.name.clone(), req.constraint.clone())
                    .with_manifest_line(req.line);
            }
            let mappings = installed
                .iter()
                .find(|pkg| pkg.name == req.name)
                .map(|pkg| pkg.mappings.clone())
                .unwrap_or_default();
            Dependency::new(req.name.clone())
                .with_constraint(req.constraint.clone())
                .with_mappings(mappings)
                .with_manifest_line(req.line)
        })
        .collect()
}

/// Extract consumed symbols from every project file. Fail-closed on the
/// first unparsable file unless lenient mode downgrades it to a warning.
fn extract_consumed(
    files: &[PathBuf],
    extractor: &SymbolExtractor,
    lenient: bool,
    warnings: &mut Vec<String>,
    on_file: Option<&(dyn Fn() + Sync)>,
) -> Result<SymbolSet> {
    let results: Vec<_> = files
        .par_iter()
        .map(|file| {
            let result = extractor.extract(file);
            if let Some(tick) = on_file {
                tick();
            }
            result
        })
        .collect();

    let mut consumed = SymbolSet::new();
    for result in results {
        match result {
            Ok(symbols) => consumed.extend(symbols.consumed),
            Err(e) if lenient => warnings.push(format!("skipped: {}", e)),
            Err(e) => return Err(e).into_diagnostic(),
        }
    }

    debug!("Consumed-symbol set: {} entries", consumed.len());
    Ok(consumed)
}
