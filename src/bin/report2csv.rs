use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use weekly_report_extract::{
    ExtractOptions, ExtractionReport, LayoutProfile, PageSelection, extract_report_to_csv,
    parse_report_file, read_fragments_from_path, write_fragments,
};

#[derive(Debug, Parser)]
#[command(
    name = "report2csv",
    version,
    about = "Rebuild the staff table of a weekly capture report PDF"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the report table and write it as CSV or JSON.
    Extract(ExtractArgs),
    /// Print the positioned text fragments as CSV on stdout.
    Fragments(FragmentArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// JSON layout profile overriding the built-in anchors.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Output delimiter character (CSV only).
    #[arg(long, default_value = ",")]
    delimiter: char,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct FragmentArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,
}

fn parse_pages(pages: Option<&str>) -> Result<Option<PageSelection>> {
    pages
        .map(PageSelection::from_str)
        .transpose()
        .context("failed to parse --pages")
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let profile = match &args.profile {
        Some(path) => LayoutProfile::from_json_file(path)
            .with_context(|| format!("failed to load profile '{}'", path.display()))?,
        None => LayoutProfile::default(),
    };

    Ok(ExtractOptions {
        pages: parse_pages(args.pages.as_deref())?,
        profile,
        delimiter: args.delimiter as u8,
    })
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    match report.result.detected_week_number {
        Some(week) => eprintln!("week: {week}, rows: {}", report.row_count()),
        None => eprintln!("week: unknown, rows: {}", report.row_count()),
    }

    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?}: {}",
                warning.code, warning.page, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    match args.format {
        OutputFormat::Csv => extract_report_to_csv(&args.input, &args.output, &options)
            .with_context(|| format!("failed to extract report from '{}'", args.input.display())),
        OutputFormat::Json => {
            let report = parse_report_file(&args.input, &options).with_context(|| {
                format!("failed to extract report from '{}'", args.input.display())
            })?;
            let json = serde_json::to_string_pretty(&report.result)?;
            std::fs::write(&args.output, json)
                .with_context(|| format!("failed to write '{}'", args.output.display()))?;
            Ok(report)
        }
    }
}

fn run_fragments(args: &FragmentArgs) -> Result<()> {
    let pages = parse_pages(args.pages.as_deref())?;
    let fragments = read_fragments_from_path(&args.input, pages.as_ref())
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_fragments(&mut lock, &fragments, b',')?;
    lock.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("weekly_report_extract=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.row_count() > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Fragments(args) => match run_fragments(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
