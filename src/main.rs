use clap::Parser;
use miette::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use deadrequire::config::Config;
use deadrequire::engine;
use deadrequire::filter::{Filter, FilterPipeline};
use deadrequire::report::{ReportFormat, Reporter};

/// deadrequire - Dependency usage resolution for Composer projects
#[derive(Parser, Debug)]
#[command(name = "deadrequire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the composer.json to analyze
    #[arg(default_value = "./composer.json")]
    composer_json: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Packages to exclude by exact name (can be specified multiple times)
    #[arg(long, value_name = "PACKAGE")]
    exclude_package: Vec<String>,

    /// Packages to exclude by glob pattern (can be specified multiple times)
    #[arg(long, value_name = "PATTERN")]
    exclude_pattern: Vec<String>,

    /// Extra PHP files to scan in addition to the autoload sources
    #[arg(long, value_name = "FILE")]
    extra_file: Vec<PathBuf>,

    /// Directory names to skip during source discovery
    #[arg(long, value_name = "DIR")]
    exclude_dir: Vec<String>,

    /// Output format (defaults to the config file's setting, else text)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Always exit with status 0, even on findings or errors
    #[arg(long)]
    ignore_exit_code: bool,

    /// Skip unparsable project files with a warning instead of aborting
    #[arg(long)]
    lenient: bool,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Gitlab,
}

impl OutputFormat {
    fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Gitlab => "gitlab",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let ignore_exit_code = cli.ignore_exit_code;
    match run(cli) {
        Ok(clean) => {
            if clean || ignore_exit_code {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(report) => {
            eprintln!("{:?}", report);
            if ignore_exit_code {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
    }
}

/// Run one resolution pass. Returns whether the run came back clean.
fn run(cli: Cli) -> Result<bool> {
    info!("deadrequire v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    // Reject a bad output format before doing any work.
    let format: ReportFormat = config
        .output
        .format
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;
    let filters = build_filters(&config);
    let policy = config.classify_policy();

    let progress = make_progress(&cli);
    let tick = progress.as_ref().map(|pb| {
        let pb = pb.clone();
        move || pb.inc(1)
    });

    let resolution = engine::resolve(
        &cli.composer_json,
        &config,
        &filters,
        policy,
        tick.as_ref().map(|f| f as &(dyn Fn() + Sync)),
    )?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let reporter = Reporter::new(format, config.output.file.clone());
    reporter.report(
        &resolution.analysis,
        &resolution.warnings,
        &resolution.manifest_path,
    )?;

    Ok(!resolution.analysis.is_failure())
}

fn make_progress(cli: &Cli) -> Option<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    if cli.no_progress || cli.quiet {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} scanning {pos} files")
            .unwrap(),
    );
    Some(pb)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let project_root = cli
        .composer_json
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(&project_root)?
    };

    // Override with CLI arguments
    config.exclude_packages.extend(cli.exclude_package.clone());
    config.exclude_patterns.extend(cli.exclude_pattern.clone());
    config.extra_files.extend(cli.extra_file.clone());
    config.exclude_dirs.extend(cli.exclude_dir.clone());
    if cli.lenient {
        config.lenient = true;
    }
    if let Some(format) = cli.format {
        config.output.format = format.as_str().to_string();
    }
    if cli.output.is_some() {
        config.output.file = cli.output.clone();
    }

    Ok(config)
}

fn build_filters(config: &Config) -> FilterPipeline {
    let mut filters = Vec::new();
    if !config.exclude_packages.is_empty() {
        filters.push(Filter::named(config.exclude_packages.iter().cloned()));
    }
    for pattern in &config.exclude_patterns {
        filters.push(Filter::pattern(pattern.clone()));
    }
    FilterPipeline::with_builtin(filters)
}
