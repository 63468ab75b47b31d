mod gitlab;
mod text;

pub use gitlab::GitlabReporter;
pub use text::TextReporter;

use crate::classify::Analysis;
use miette::{miette, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

/// Output format for reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Gitlab,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "gitlab" => Ok(ReportFormat::Gitlab),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Renders a finished analysis into the requested format and sink.
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
        }
    }

    /// Render the analysis. `warnings` covers every non-fatal condition
    /// collected along the run; `manifest_path` anchors finding locations.
    pub fn report(
        &self,
        analysis: &Analysis,
        warnings: &[String],
        manifest_path: &Path,
    ) -> Result<()> {
        let rendered = match &self.format {
            ReportFormat::Text => {
                let reporter = TextReporter::new(self.output_path.is_none());
                reporter.render(analysis, warnings)
            }
            ReportFormat::Gitlab => {
                let reporter = GitlabReporter::new(manifest_path);
                reporter.render(analysis, warnings)?
            }
        };

        match &self.output_path {
            Some(path) => write_output(path, &rendered),
            None => {
                print!("{}", rendered);
                Ok(())
            }
        }
    }
}

/// Write the report to a file. An unwritable destination is fatal for the
/// sink and must not leave a partial file behind.
fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if !parent.is_dir() {
            return Err(miette!(
                "The directory of the output file {} is not writable.",
                path.display()
            ));
        }
    }
    std::fs::write(path, contents).into_diagnostic()?;
    Ok(())
}
