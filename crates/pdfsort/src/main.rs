mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use pdfsort::config::{discover_config, load_config, SorterConfig};
use pdfsort::{PdfSortError, Pipeline, PipelineConfig, Sorter, WorkerError};

use crate::terminal::ConsoleReporter;

/// Sorts PDF invoices into <year>/Facture fournisseur/<month> folders.
///
/// Every PDF under the folder is read (OCR for scanned pages), classified by
/// keyword and date, then moved. Non-invoices go to `commande`, files without
/// a keyword or date stay where they are.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Log every step
    #[arg(short, long)]
    verbose: bool,

    /// Show what would happen without moving anything
    #[arg(short, long)]
    dry_run: bool,

    /// Print the statistics table
    #[arg(long)]
    stats: bool,

    /// JSON configuration file (defaults to pdfsort.json in the folder)
    #[arg(long, env = "PDFSORT_CONFIG")]
    config: Option<PathBuf>,

    /// Folder to sort (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Tesseract language, repeatable (e.g. --lang fra --lang eng)
    #[arg(long = "lang", value_name = "LANG")]
    languages: Vec<String>,

    /// Optional year, then extra invoice keywords
    #[arg(value_name = "YEAR|KEYWORD")]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if matches!(
                e.downcast_ref::<PdfSortError>(),
                Some(PdfSortError::Worker(WorkerError::Interrupted))
            ) {
                terminal::print_interrupted();
                return ExitCode::from(130);
            }
            eprintln!("{} {:#}", console::style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    tracing_log::LogTracer::init().context("failed to bridge log records")?;

    let default_directive = if verbose { "pdfsort=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .context("invalid log filter")?;

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)
        .context("tracing subscriber already set")?;
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let mut config = match cli.config.or_else(|| discover_config(&root)) {
        Some(path) => load_config(&path)
            .with_context(|| format!("cannot load configuration from {}", path.display()))?,
        None => SorterConfig::default(),
    };
    if !cli.languages.is_empty() {
        config.ocr.languages = cli.languages;
    }

    let (year, keywords) = split_arguments(&cli.args)?;

    let pipeline_config = PipelineConfig::from_config(&config, &root)
        .with_dry_run(cli.dry_run)
        .with_year_filter(year)
        .with_extra_keywords(&keywords);

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))
        .context("cannot install the Ctrl-C handler")?;

    terminal::print_banner(&root, cli.dry_run, year);

    let sorter = Sorter::new(Pipeline::from_config(Arc::new(pipeline_config)))
        .with_worker_count(config.worker_count)
        .with_max_depth(config.max_depth)
        .with_progress(Arc::new(ConsoleReporter::new(cli.verbose, root.clone())))
        .with_shutdown(shutdown);

    let report = sorter.run()?;
    terminal::print_summary(&report, &root, cli.stats || cli.verbose);
    Ok(())
}

/// A leading all-digit argument is the year; everything else is a keyword.
fn split_arguments(args: &[String]) -> anyhow::Result<(Option<i32>, Vec<String>)> {
    match args.split_first() {
        Some((first, rest)) if !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()) => {
            let year = first
                .parse::<i32>()
                .with_context(|| format!("invalid year: {first}"))?;
            Ok((Some(year), rest.to_vec()))
        }
        _ => Ok((None, args.to_vec())),
    }
}
