//! Terminal rendering of progress events and the final report.

use std::path::{Path, PathBuf};

use console::{style, Emoji};

use pdfsort::categorizer::Classification;
use pdfsort::pipeline::progress::percent;
use pdfsort::sanitize::{redact_path, relative_to};
use pdfsort::worker::{JobOutcome, JobResult};
use pdfsort::{ProgressEvent, ProgressReporter, RunReport};

static PAGE: Emoji<'_, '_> = Emoji("📄 ", "");
static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "");
static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[x] ");
static BROOM: Emoji<'_, '_> = Emoji("🧹 ", "");

pub struct ConsoleReporter {
    verbose: bool,
    root: PathBuf,
}

impl ConsoleReporter {
    pub fn new(verbose: bool, root: PathBuf) -> Self {
        Self { verbose, root }
    }

    fn relative(&self, path: &Path) -> String {
        relative_to(path, &self.root)
    }

    fn describe(&self, result: &JobResult) -> String {
        let preview = if result.simulated { " (preview)" } else { "" };
        let ocr = if result.ocr_used { " [OCR]" } else { "" };

        match &result.outcome {
            JobOutcome::Sorted { date, destination } => format!(
                "{} {} {}{}{}",
                style(date).green(),
                style("->").dim(),
                self.relative(destination),
                ocr,
                preview
            ),
            JobOutcome::Commande { destination } => format!(
                "{} {} {}{}{}",
                style("commande").cyan(),
                style("->").dim(),
                self.relative(destination),
                ocr,
                preview
            ),
            JobOutcome::Unsorted { reason } => {
                format!("{} ({}){}", style("unsorted").yellow(), reason, ocr)
            }
            JobOutcome::Failed { error } => format!("{} {}", style("failed:").red(), error),
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ArchiveExtracted { archive, entries } => {
                println!(
                    "{}Extracted {} ({} entries)",
                    PACKAGE,
                    redact_path(&archive),
                    entries
                );
            }
            ProgressEvent::ArchivePending { archive } => {
                println!(
                    "{}Would extract {} {}",
                    PACKAGE,
                    redact_path(&archive),
                    style("(preview)").dim()
                );
            }
            ProgressEvent::ArchiveFailed { archive, error } => {
                eprintln!(
                    "{}{} {}: {}",
                    WARN,
                    style("Could not extract").yellow(),
                    redact_path(&archive),
                    error
                );
            }
            ProgressEvent::ScanCompleted { files } => {
                println!("{}Found {} PDF file(s)", PAGE, style(files).bold());
            }
            ProgressEvent::DocumentStarted { path, pages } if self.verbose => {
                println!("  {} {} page(s)", style(self.relative(&path)).bold(), pages);
            }
            ProgressEvent::PageText { path, page, chars } if self.verbose => {
                println!(
                    "    {} page {}: {} characters of text",
                    redact_path(&path),
                    page,
                    chars
                );
            }
            ProgressEvent::OcrStarted { path, page, images } if self.verbose => {
                println!(
                    "    {} page {}: no text, running OCR on {} image(s)",
                    redact_path(&path),
                    page,
                    images
                );
            }
            ProgressEvent::OcrImage {
                path,
                page,
                index,
                total,
            } if self.verbose => {
                println!(
                    "    {} page {}: image {}/{}",
                    redact_path(&path),
                    page,
                    index,
                    total
                );
            }
            ProgressEvent::OcrSettled {
                path,
                page,
                skipped,
            } if self.verbose => {
                println!(
                    "    {} page {}: keyword and date found, skipped {} image(s)",
                    redact_path(&path),
                    page,
                    skipped
                );
            }
            ProgressEvent::PageRendered { path, page } if self.verbose => {
                println!(
                    "    {} page {}: rendered the whole page for OCR",
                    redact_path(&path),
                    page
                );
            }
            ProgressEvent::ImageSkipped {
                path,
                page,
                image,
                reason,
            } => {
                eprintln!(
                    "{}{} page {}: skipped image {} ({})",
                    WARN,
                    redact_path(&path),
                    page,
                    image,
                    reason
                );
            }
            ProgressEvent::Classified {
                path,
                classification,
            } if self.verbose => {
                let label = match classification {
                    Classification::NonInvoice => "not an invoice".to_string(),
                    Classification::Invoice(date) => format!("invoice dated {}", date),
                    Classification::Unsortable(reason) => reason.to_string(),
                };
                println!("    {} {}", redact_path(&path), style(label).dim());
            }
            ProgressEvent::Failed { path, error } => {
                eprintln!("{}{}: {}", CROSS, self.relative(&path), style(error).red());
            }
            ProgressEvent::FileCompleted {
                completed,
                total,
                result,
            } => {
                println!(
                    "[{}/{} {:>5.1}%] {} {}",
                    completed,
                    total,
                    percent(completed, total),
                    self.relative(&result.source_path),
                    self.describe(&result)
                );
            }
            ProgressEvent::DirectoriesPruned { removed } => {
                if !removed.is_empty() {
                    println!("{}Removed {} empty folder(s)", BROOM, removed.len());
                }
                if self.verbose {
                    for dir in &removed {
                        println!("  {}", style(self.relative(dir)).dim());
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn print_banner(root: &Path, dry_run: bool, year: Option<i32>) {
    println!();
    println!(
        "{} {}",
        style("pdfsort").bold().cyan(),
        style(env!("CARGO_PKG_VERSION")).dim()
    );
    println!("  Folder: {}", style(root.display()).blue());
    if dry_run {
        println!("  Mode:   {}", style("preview, nothing will be moved").yellow());
    }
    if let Some(year) = year {
        println!("  Year:   {}", year);
    }
    println!();
}

pub fn print_summary(report: &RunReport, root: &Path, show_stats: bool) {
    let stats = &report.stats;

    println!();
    if stats.total_files == 0 {
        println!("{}", style("No PDF files to sort.").dim());
        return;
    }

    println!(
        "{}{} of {} file(s) sorted{}",
        CHECK,
        style(stats.sorted_files).green().bold(),
        stats.total_files,
        if report.dry_run { " (preview)" } else { "" }
    );

    if !report.unsorted.is_empty() {
        println!();
        println!("{}", style("Unsorted files:").yellow().bold());
        for path in &report.unsorted {
            println!("  {}", relative_to(path, root));
        }
    }

    if show_stats {
        println!();
        println!("{}", style("Statistics").bold());
        let rows = [
            ("Total files", stats.total_files.to_string()),
            ("Sorted", stats.sorted_files.to_string()),
            ("Unsorted", stats.unsorted_files.to_string()),
            ("Commande", stats.commande_files.to_string()),
            ("OCR processed", stats.ocr_processed.to_string()),
            ("Errors", stats.errors.to_string()),
            ("Archives extracted", stats.zip_extracted.to_string()),
            ("Elapsed", format!("{:.2?}", stats.elapsed())),
            ("Success rate", format!("{:.1}%", stats.success_rate())),
            ("Average per file", format!("{:.2}s", stats.average_seconds())),
        ];
        for (label, value) in rows {
            println!("  {:<20} {}", label, style(value).bold());
        }
    }
}

pub fn print_interrupted() {
    eprintln!();
    eprintln!(
        "{}{}",
        WARN,
        style("Interrupted. Files already moved stay where they are.").yellow()
    );
}
