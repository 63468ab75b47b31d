//! GitLab Code Quality report
//!
//! Machine-readable JSON in the Code Climate shape GitLab ingests: one
//! entry per non-Used finding with a stable content-derived fingerprint,
//! the requirement's location in composer.json, and a severity tier.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::classify::{Analysis, Classification};

pub struct GitlabReporter {
    manifest_path: String,
}

#[derive(Serialize)]
struct GitlabIssue {
    description: String,
    fingerprint: String,
    location: GitlabLocation,
    severity: &'static str,
}

#[derive(Serialize)]
struct GitlabLocation {
    path: String,
    lines: GitlabLines,
}

#[derive(Serialize)]
struct GitlabLines {
    begin: usize,
}

impl GitlabReporter {
    pub fn new(manifest_path: &Path) -> Self {
        let manifest_path = manifest_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| manifest_path.display().to_string());
        Self { manifest_path }
    }

    pub fn render(&self, analysis: &Analysis, warnings: &[String]) -> Result<String> {
        let mut issues = Vec::new();

        for outcome in &analysis.outcomes {
            let line = outcome.dependency.manifest_line.unwrap_or(1);
            match &outcome.classification {
                Classification::Used => continue,
                Classification::Unused => issues.push(self.issue(
                    format!("{} is unused", outcome.dependency.name),
                    line,
                    "major",
                )),
                Classification::Ignored(_) => issues.push(self.issue(
                    format!("{} was ignored", outcome.dependency.name),
                    line,
                    "info",
                )),
            }
        }

        // Zombies are not declared, so they have no requirement line to
        // point at; they anchor to the top of the manifest. Severity tier
        // follows the failure policy.
        let zombie_severity = if analysis.policy.fail_on_zombies {
            "major"
        } else {
            "minor"
        };
        for zombie in &analysis.zombies {
            issues.push(self.issue(
                format!(
                    "{} is a zombie dependency (used via {})",
                    zombie.package, zombie.symbol.name
                ),
                1,
                zombie_severity,
            ));
        }

        // Non-fatal conditions still have to surface in machine-readable
        // output; they anchor to the top of the manifest like zombies.
        for warning in warnings {
            issues.push(self.issue(warning.clone(), 1, "info"));
        }

        let mut json = serde_json::to_string_pretty(&issues).into_diagnostic()?;
        json.push('\n');
        Ok(json)
    }

    fn issue(&self, description: String, line: usize, severity: &'static str) -> GitlabIssue {
        let fingerprint = fingerprint(&description, &self.manifest_path, line);
        GitlabIssue {
            description,
            fingerprint,
            location: GitlabLocation {
                path: self.manifest_path.clone(),
                lines: GitlabLines { begin: line },
            },
            severity,
        }
    }
}

/// Stable content-derived fingerprint: hash of description + location.
fn fingerprint(description: &str, path: &str, line: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(description.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(line.to_string().as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
