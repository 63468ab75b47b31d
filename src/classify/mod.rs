//! Usage classification
//!
//! The decision core: every declared dependency ends up in exactly one of
//! Used, Unused, or Ignored, and consumed symbols whose only providers are
//! installed-but-undeclared packages become zombies. The classifier is a
//! pure function of its inputs and holds no state across runs.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::filter::FilterPipeline;
use crate::manifest::{platform_symbol, Dependency};
use crate::provider::ProvidedIndex;
use crate::symbol::{Symbol, SymbolSet};

/// Final classification for one declared dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Used,
    Unused,
    Ignored(String),
}

/// A package that is present in the install tree and actually consumed,
/// but never declared directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zombie {
    pub package: String,
    /// Representative consumed symbol that triggered the finding
    pub symbol: Symbol,
}

/// One declared dependency with its outcome.
#[derive(Debug, Clone)]
pub struct DependencyOutcome {
    pub dependency: Dependency,
    pub classification: Classification,
}

/// Policy knobs for the edge cases the classifier deliberately does not
/// hard-code.
#[derive(Debug, Clone)]
pub struct ClassifyPolicy {
    /// What to do with a dependency that declares no symbol mappings at
    /// all (e.g. a metapackage).
    pub empty_mapping: EmptyMappingPolicy,

    /// Whether zombie findings alone should fail the run.
    pub fail_on_zombies: bool,
}

impl Default for ClassifyPolicy {
    fn default() -> Self {
        Self {
            empty_mapping: EmptyMappingPolicy::Unused,
            fail_on_zombies: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyMappingPolicy {
    /// Report it as unused; it cannot be proven used by symbol matching.
    #[default]
    Unused,
    /// Exempt it with a dedicated reason instead of flagging it.
    Ignored,
}

/// Counts for the report summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub used: usize,
    pub unused: usize,
    pub ignored: usize,
    pub zombies: usize,
}

/// Result of one resolution pass.
#[derive(Debug)]
pub struct Analysis {
    /// Outcomes in manifest declaration order
    pub outcomes: Vec<DependencyOutcome>,
    pub zombies: Vec<Zombie>,
    pub policy: ClassifyPolicy,
}

impl Analysis {
    pub fn counts(&self) -> Counts {
        let mut counts = Counts {
            zombies: self.zombies.len(),
            ..Counts::default()
        };
        for outcome in &self.outcomes {
            match outcome.classification {
                Classification::Used => counts.used += 1,
                Classification::Unused => counts.unused += 1,
                Classification::Ignored(_) => counts.ignored += 1,
            }
        }
        counts
    }

    /// Failure iff there are unused findings, or zombie findings when the
    /// policy makes zombies hard failures.
    pub fn is_failure(&self) -> bool {
        let counts = self.counts();
        counts.unused > 0 || (self.policy.fail_on_zombies && counts.zombies > 0)
    }
}

/// Classify every declared dependency and sweep for zombies.
///
/// `index` must cover every potential provider: the declared dependencies
/// plus the installed-but-undeclared packages. Filters run first; symbol
/// matching only happens for dependencies no filter claimed.
pub fn classify(
    declared: &[Dependency],
    index: &ProvidedIndex,
    consumed: &SymbolSet,
    filters: &FilterPipeline,
    policy: ClassifyPolicy,
) -> Analysis {
    let declared_names: HashSet<&str> = declared.iter().map(|d| d.name.as_str()).collect();

    // Platform requirements are resolved through the same path as real
    // symbols: their synthetic identity symbol is unconditionally consumed.
    let mut all_consumed: Vec<Symbol> = consumed.iter().cloned().collect();
    for dep in declared.iter().filter(|d| d.platform) {
        all_consumed.push(Symbol::new(platform_symbol(&dep.name), "composer.json", 0));
    }

    // Each lookup is read-only and independent; prefix mappings do
    // filesystem existence checks, so resolve them in parallel.
    let resolutions: Vec<(Symbol, BTreeSet<String>)> = all_consumed
        .par_iter()
        .map(|symbol| {
            let providers = index
                .providers_of(&symbol.name)
                .into_iter()
                .map(str::to_string)
                .collect();
            (symbol.clone(), providers)
        })
        .collect();

    let mut used_packages: HashSet<&str> = HashSet::new();
    for (_, providers) in &resolutions {
        for provider in providers {
            if declared_names.contains(provider.as_str()) {
                used_packages.insert(provider.as_str());
            }
        }
    }

    let outcomes = declared
        .iter()
        .map(|dep| {
            let classification = if let Some(reason) = filters.matched(&dep.name) {
                Classification::Ignored(reason)
            } else if !dep.platform && dep.mappings.is_empty() {
                // Never provably used by symbol matching; policy decides.
                match policy.empty_mapping {
                    EmptyMappingPolicy::Unused => Classification::Unused,
                    EmptyMappingPolicy::Ignored => {
                        Classification::Ignored("no autoload declarations".to_string())
                    }
                }
            } else if used_packages.contains(dep.name.as_str()) {
                Classification::Used
            } else {
                Classification::Unused
            };
            DependencyOutcome {
                dependency: dep.clone(),
                classification,
            }
        })
        .collect();

    // Zombie sweep: symbols whose providers exist but none is declared.
    // A symbol with at least one declared provider is satisfied and can
    // never contribute a zombie, which keeps the zombie set disjoint from
    // the declared list by construction.
    let mut zombies: BTreeMap<String, Symbol> = BTreeMap::new();
    for (symbol, providers) in &resolutions {
        if providers.is_empty() {
            continue;
        }
        if providers.iter().any(|p| declared_names.contains(p.as_str())) {
            continue;
        }
        for provider in providers {
            zombies
                .entry(provider.clone())
                .or_insert_with(|| symbol.clone());
        }
    }

    let zombies: Vec<Zombie> = zombies
        .into_iter()
        .map(|(package, symbol)| Zombie { package, symbol })
        .collect();

    debug!(
        "Classified {} dependencies, {} zombies",
        declared.len(),
        zombies.len()
    );

    Analysis {
        outcomes,
        zombies,
        policy,
    }
}
