use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use depscan::{
    cache::Cache,
    checker::{CachedSource, GhsaClient},
    config::Config,
    extractor::registry,
    host::{GitHubClient, LocalCheckout},
    model::{RepoRef, Severity},
    output::{
        print_file_summary, print_findings, print_formats, print_json, print_records, read_rows,
        CsvSink, DependencyRow, OutputFormat, RepositoryRow, VulnerabilityRow,
    },
    pipeline,
    version,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const CRITICAL_VULN: u8 = 2;
    pub const HIGH_VULN: u8 = 3;
    pub const MEDIUM_VULN: u8 = 4;
    pub const LOW_VULN: u8 = 5;
    pub const NO_MATCH: u8 = 6;
}

#[derive(Parser)]
#[command(name = "depscan")]
#[command(
    author,
    version,
    about = "Extract dependencies from project manifests and check them against security advisories"
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect metadata for every GitHub repository linked from a README
    Repos {
        /// Repository whose README lists other repositories
        url: String,

        /// CSV file to write
        #[arg(short, long, default_value = "repositories.csv")]
        output: PathBuf,
    },

    /// Extract dependencies from a GitHub repository's manifests
    Deps {
        /// Repository URL or owner/name
        url: String,

        /// CSV file to write
        #[arg(short, long, default_value = "dependencies.csv")]
        output: PathBuf,
    },

    /// Extract dependencies from every manifest in a local directory
    ScanDir {
        /// Checkout to walk
        path: PathBuf,

        /// CSV file to write
        #[arg(short, long, default_value = "dependencies.csv")]
        output: PathBuf,
    },

    /// Parse a single manifest file and print its dependencies
    Extract {
        file: PathBuf,

        /// Manifest identifier to parse as (defaults to the file name)
        #[arg(long = "as")]
        manifest: Option<String>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Check dependency rows against the GitHub advisory database
    Vulns {
        /// Dependency CSV written by `deps` or `scan-dir`
        input: PathBuf,

        /// CSV file to write
        #[arg(short, long, default_value = "vulnerabilities.csv")]
        output: PathBuf,

        /// Output format for the findings summary (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Clear cache before checking
        #[arg(long)]
        clear_cache: bool,

        /// Exit with error if vulnerabilities at or above this severity are found
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,
    },

    /// Test whether a version lies inside a vulnerable range
    Matches {
        version: String,

        /// Range such as ">= 1.0.0, < 2.0.0"
        range: String,
    },

    /// List supported manifest identifiers
    ListManifests,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the advisory cache
    ClearCache,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl FailLevel {
    fn threshold(self) -> Severity {
        match self {
            FailLevel::Critical => Severity::Critical,
            FailLevel::High => Severity::High,
            FailLevel::Medium => Severity::Medium,
            FailLevel::Low => Severity::Low,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("could not load .env: {}", e),
    }

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "depscan=debug,info" } else { "depscan=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("using default config: {:#}", e);
        let mut config = Config::default();
        config.apply_env();
        config
    });

    match cli.command {
        Commands::Repos { url, output } => run_repos(&config, &url, &output).await,
        Commands::Deps { url, output } => run_deps(&config, &url, &output).await,
        Commands::ScanDir { path, output } => run_scan_dir(&path, &output),
        Commands::Extract {
            file,
            manifest,
            format,
        } => run_extract(&file, manifest.as_deref(), &format),
        Commands::Vulns {
            input,
            output,
            format,
            clear_cache,
            fail_on,
        } => {
            if clear_cache {
                Cache::with_ttl_hours(config.cache_ttl_hours).clear()?;
            }
            run_vulns(&config, &input, &output, &format, fail_on).await
        }
        Commands::Matches { version, range } => run_matches(&version, &range),
        Commands::ListManifests => {
            print_formats(registry().formats());
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let removed = Cache::new().clear()?;
            println!("Cache cleared ({} entries).", removed);
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.into());
    pb
}

fn parse_repo(url: &str) -> Result<RepoRef> {
    RepoRef::from_url(url).with_context(|| format!("not a repository URL: {}", url))
}

fn github_client(config: &Config) -> Result<GitHubClient> {
    Ok(GitHubClient::new(
        config.api_url.clone(),
        config.github_token.clone(),
    )?)
}

async fn run_repos(config: &Config, url: &str, output: &Path) -> Result<u8> {
    let seed = parse_repo(url)?;
    let host = github_client(config)?;
    let mut sink = CsvSink::<RepositoryRow>::create(output)?;

    let pb = spinner(format!("Collecting repositories linked from {}...", seed));
    let report = pipeline::collect_repositories(&host, &seed, &mut sink).await;
    pb.finish_and_clear();
    let report = report?;

    println!(
        "Wrote {} of {} repositories to {} ({} failed)",
        report.written,
        report.discovered,
        sink.path().display(),
        report.failed
    );
    Ok(exit_codes::SUCCESS)
}

/// Identifiers to probe: the configured subset, or every registered format.
fn manifest_ids(config: &Config) -> Vec<&str> {
    if config.manifests.is_empty() {
        return registry().identifiers().collect();
    }
    for id in &config.manifests {
        if registry().get(id).is_none() {
            tracing::warn!("unknown manifest identifier in config: {}", id);
        }
    }
    config.manifests.iter().map(String::as_str).collect()
}

async fn run_deps(config: &Config, url: &str, output: &Path) -> Result<u8> {
    let repo = parse_repo(url)?;
    let host = github_client(config)?;
    let ids = manifest_ids(config);
    let mut sink = CsvSink::<DependencyRow>::create(output)?;

    let pb = spinner(format!("Probing {} manifests in {}...", ids.len(), repo));
    let summaries = pipeline::collect_dependencies(
        &host,
        registry(),
        &repo,
        &ids,
        config.effective_concurrency(),
        &mut sink,
    )
    .await;
    pb.finish_and_clear();
    let summaries = summaries?;

    print_file_summary(&summaries);
    println!(
        "Wrote {} dependencies to {}",
        sink.rows(),
        sink.path().display()
    );
    Ok(exit_codes::SUCCESS)
}

fn run_scan_dir(path: &Path, output: &Path) -> Result<u8> {
    anyhow::ensure!(path.is_dir(), "not a directory: {}", path.display());
    let checkout = LocalCheckout::new(path);
    let name = path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "local".to_string());
    let repo = RepoRef::new("local", name);
    let mut sink = CsvSink::<DependencyRow>::create(output)?;

    let summaries = pipeline::collect_from_checkout(&checkout, registry(), &repo, &mut sink)?;

    print_file_summary(&summaries);
    println!(
        "Wrote {} dependencies to {}",
        sink.rows(),
        sink.path().display()
    );
    Ok(exit_codes::SUCCESS)
}

fn run_extract(file: &Path, manifest: Option<&str>, format: &str) -> Result<u8> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;
    let id = match manifest {
        Some(id) => registry()
            .get(id)
            .map(|f| f.id)
            .with_context(|| format!("unknown manifest identifier: {}", id))?,
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| registry().resolve_file_name(n))
            .with_context(|| {
                format!(
                    "cannot tell the format of {}; pass --as <identifier>",
                    file.display()
                )
            })?,
    };

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let records = registry().extract(id, &content);

    match format {
        OutputFormat::Table => print_records(&records),
        OutputFormat::Json => print_json(&records)?,
    }
    Ok(exit_codes::SUCCESS)
}

async fn run_vulns(
    config: &Config,
    input: &Path,
    output: &Path,
    format: &str,
    fail_on: Option<FailLevel>,
) -> Result<u8> {
    let format = OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))?;
    let dependencies: Vec<DependencyRow> = read_rows(input)?;
    if config.github_token.is_none() {
        tracing::warn!("GITHUB_TOKEN is not set; the advisory API requires authentication");
    }

    let client = GhsaClient::new(
        config.github_token.clone(),
        config.graphql_url.clone(),
        config.advisories_per_package,
    )?;
    let source = CachedSource::new(client, Cache::with_ttl_hours(config.cache_ttl_hours));
    let mut sink = CsvSink::<VulnerabilityRow>::create(output)?;

    let pb = (format == OutputFormat::Table).then(|| {
        spinner(format!(
            "Checking {} dependencies for vulnerabilities...",
            dependencies.len()
        ))
    });
    let report = pipeline::check_dependencies(
        &source,
        &dependencies,
        &config.ignore,
        config.effective_concurrency(),
        &mut sink,
    )
    .await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let report = report?;
    drop(sink);

    let findings: Vec<VulnerabilityRow> = read_rows(output)?;
    match format {
        OutputFormat::Table => {
            print_findings(&findings);
            println!(
                "Checked {} dependencies ({} skipped, {} lookups failed, {} ranges rejected)",
                report.checked, report.skipped, report.lookup_failures, report.rejected_ranges
            );
            println!("Results written to: {}", output.display());
        }
        OutputFormat::Json => print_json(&findings)?,
    }

    Ok(determine_exit_code(&findings, fail_on))
}

/// Determine the exit code based on the most severe finding and --fail-on
fn determine_exit_code(findings: &[VulnerabilityRow], fail_on: Option<FailLevel>) -> u8 {
    let Some(fail_on) = fail_on else {
        return exit_codes::SUCCESS;
    };

    let worst = findings
        .iter()
        .map(|f| Severity::from_label(&f.severity))
        .max()
        .unwrap_or(Severity::Unknown);
    if worst < fail_on.threshold() {
        return exit_codes::SUCCESS;
    }

    match worst {
        Severity::Critical => exit_codes::CRITICAL_VULN,
        Severity::High => exit_codes::HIGH_VULN,
        Severity::Medium => exit_codes::MEDIUM_VULN,
        Severity::Low => exit_codes::LOW_VULN,
        Severity::Unknown => exit_codes::SUCCESS,
    }
}

fn run_matches(subject: &str, range: &str) -> Result<u8> {
    let inside = version::evaluate(subject, range)?;
    if inside {
        println!("{} is inside \"{}\"", subject, range);
        Ok(exit_codes::SUCCESS)
    } else {
        println!("{} is outside \"{}\"", subject, range);
        Ok(exit_codes::NO_MATCH)
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        Config::default().save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depscan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
