use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

use migrasafe_core::{risk_label, AnalyzerConfig, ConfigError, ScoreReport, Severity, Verdict};
use migrasafe_engine::{Analyzer, Dialect};

/// MigraSafe - Database migration risk analysis
///
/// Scans migration files for dangerous schema operations, scores the risk,
/// and blocks (non-zero exit) when the total reaches the threshold.
#[derive(Parser)]
#[command(name = "migrasafe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Migration files or directories to analyze
    paths: Vec<PathBuf>,

    /// Block if the total risk score reaches this value
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Disable a rule by id (repeatable)
    #[arg(long = "disable", value_name = "RULE_ID")]
    disabled_rules: Vec<String>,

    /// Disable the declarative-migration rule family (MS1xx)
    #[arg(long)]
    no_declarative: bool,

    /// Path to config file (default: migrasafe.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.paths.is_empty() {
        eprintln!("{}", "Usage: migrasafe <migration files...>".yellow());
        return Ok(());
    }

    // Configuration misuse exits 2; exit 1 is reserved for a blocked migration
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    let analyzer = match Analyzer::new(config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("{} {}", "Configuration error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    let files = discover_files(&cli.paths)?;
    if files.is_empty() {
        eprintln!("{}", "No migration files found".yellow());
        return Ok(());
    }

    let mut reports = Vec::new();
    for path in &files {
        let source = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

        let dialect = dialect_for(path);
        if cli.verbose {
            eprintln!("{} {}", "Analyzing".cyan(), path.display());
        }
        reports.push(analyzer.analyze(&path.display().to_string(), &source, dialect));
    }

    let total_score: u32 = reports.iter().map(|r| r.total_score).sum();
    let threshold = analyzer.config().threshold;
    let verdict = Verdict::decide(total_score, threshold);

    match cli.format {
        OutputFormat::Json => print_json(&reports, total_score, verdict)?,
        OutputFormat::Table => print_table(&reports, total_score, threshold, verdict),
    }

    if verdict == Verdict::Fail {
        std::process::exit(1);
    }

    Ok(())
}

/// Load configuration, with CLI flags overriding file values
fn load_config(cli: &Cli) -> Result<AnalyzerConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config {
        AnalyzerConfig::from_file(config_path)?
    } else if Path::new("migrasafe.toml").exists() {
        AnalyzerConfig::from_file(Path::new("migrasafe.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        AnalyzerConfig::default()
    };

    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    config.disabled_rules.extend(cli.disabled_rules.iter().cloned());
    if cli.no_declarative {
        config.declarative_rules_enabled = false;
    }

    Ok(config)
}

/// Expand directories into migration files (.sql and .py), sorted for
/// deterministic output
fn discover_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && is_migration_file(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

fn is_migration_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("sql") | Some("py")
    )
}

/// Dialect selection is by extension; the SQL and declarative pipelines are
/// disjoint and never auto-detected from content
fn dialect_for(path: &Path) -> Dialect {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py") => Dialect::Declarative,
        _ => Dialect::Sql,
    }
}

fn print_json(reports: &[ScoreReport], total_score: u32, verdict: Verdict) -> Result<()> {
    let payload = serde_json::json!({
        "reports": reports,
        "total_score": total_score,
        "passed": verdict.is_pass(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn severity_cell(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Critical => severity.as_str().red().bold(),
        Severity::High => severity.as_str().yellow().bold(),
        Severity::Medium => severity.as_str().blue(),
        Severity::Low => severity.as_str().green(),
    }
}

fn print_table(reports: &[ScoreReport], total_score: u32, threshold: u32, verdict: Verdict) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "MigraSafe Migration Risk Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());

    let mut any_findings = false;
    for report in reports {
        if report.findings.is_empty() {
            continue;
        }
        any_findings = true;

        println!("\n{}", report.file.bold());
        for finding in &report.findings {
            println!(
                "  [{}] {} ({}, {} pts)",
                severity_cell(finding.severity),
                finding.rule_id.cyan(),
                finding.span,
                finding.points
            );
            println!("    {}", finding.message);
            println!("    {}", finding.snippet.dimmed());
        }
    }

    if !any_findings {
        println!("\n{}", "No risky operations found".green().bold());
    } else {
        println!("\n{}", "Remediations:".dimmed());
        for report in reports {
            for finding in &report.findings {
                println!("  {}: {}", finding.rule_id.cyan(), finding.remediation);
            }
        }
    }

    let label = risk_label(total_score);
    println!(
        "\n  Risk Score: {} ({}) | Threshold: {}",
        total_score.to_string().bold(),
        severity_cell(label),
        threshold
    );

    match verdict {
        Verdict::Fail => {
            println!(
                "  {} score {} >= {}\n",
                "BLOCKED".red().bold(),
                total_score,
                threshold
            );
        }
        Verdict::Pass => {
            println!(
                "  {} score {} < {}\n",
                "PASSED".green().bold(),
                total_score,
                threshold
            );
        }
    }
}
