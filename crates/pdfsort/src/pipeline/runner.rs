use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, info_span};

use crate::categorizer::{Categorizer, Classification};
use crate::error::{ProcessError, StorageError};
use crate::processor::{
    downscale_half, page_lacks_text, DocumentSource, LopdfSource, OcrEngine, OcrProcessor,
    PdfPage,
};
use crate::sanitize;
use crate::storage::FileStorage;
use crate::worker::job::{JobOutcome, JobResult};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::{PipelineError, PipelineWarning};
use super::progress::{ProgressEvent, ProgressReporter};

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    source: Arc<dyn DocumentSource>,
    ocr: Option<Arc<dyn OcrEngine>>,
    categorizer: Categorizer,
    storage: FileStorage,
}

impl Pipeline {
    /// Production constructor: lopdf for documents, Tesseract for OCR when
    /// enabled.
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        let ocr = if config.ocr_enabled {
            Some(Arc::new(OcrProcessor::new(&config.ocr_languages)) as Arc<dyn OcrEngine>)
        } else {
            None
        };
        Self::new(config, Arc::new(LopdfSource::new()), ocr)
    }

    /// Constructor with injected document access, used by tests and
    /// embedders.
    pub fn new(
        config: Arc<PipelineConfig>,
        source: Arc<dyn DocumentSource>,
        ocr: Option<Arc<dyn OcrEngine>>,
    ) -> Self {
        let categorizer = Categorizer::new(
            config.keywords.clone(),
            config.undesired_keywords.clone(),
        );
        let storage = FileStorage::new(&config.root_directory);

        Self {
            config,
            source,
            ocr,
            categorizer,
            storage,
        }
    }

    /// Replaces the categorizer, mainly to pin the date extractor's year.
    pub fn with_categorizer(mut self, categorizer: Categorizer) -> Self {
        self.categorizer = categorizer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Run the full pipeline for a single document.
    /// Returns a (JobResult, PipelineContext) pair.
    pub fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> (JobResult, PipelineContext) {
        let filename = sanitize::redact_path(&ctx.job.source_path);
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.id,
            filename = %filename,
        )
        .entered();

        // Step 1: Extract text
        {
            let _step = info_span!("extract_text").entered();
            if let Err(e) = self.step_extract_text(&mut ctx, progress) {
                return self.fail(ctx, e, false, progress);
            }
        }

        // Step 2: Classify
        let classification = {
            let _step = info_span!("classify").entered();
            self.step_classify(&mut ctx, progress)
        };

        // Step 3: Move, or plan the move in preview mode
        let outcome = {
            let _step = info_span!("relocate").entered();
            match self.step_relocate(&mut ctx, classification) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let ocr_used = ctx.ocr_used;
                    return self.fail(ctx, e, ocr_used, progress);
                }
            }
        };

        let simulated = self.config.dry_run && outcome.destination().is_some();
        let result = JobResult::success(&ctx.job, outcome, ctx.ocr_used, simulated);
        (result, ctx)
    }

    fn fail(
        &self,
        ctx: PipelineContext,
        error: PipelineError,
        ocr_used: bool,
        progress: &dyn ProgressReporter,
    ) -> (JobResult, PipelineContext) {
        // failures reach the user through the reporter
        let err_msg = error.to_string();
        info!("Processing failed: {}", err_msg);
        progress.report(ProgressEvent::Failed {
            path: ctx.job.source_path.clone(),
            error: err_msg.clone(),
        });
        (JobResult::failure(&ctx.job, err_msg, ocr_used), ctx)
    }

    fn step_extract_text(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let pages = self.source.open(&ctx.job.source_path)?;
        progress.report(ProgressEvent::DocumentStarted {
            path: ctx.job.source_path.clone(),
            pages: pages.len(),
        });

        for page in &pages {
            ctx.pages_read += 1;

            if !page_lacks_text(&page.text) {
                ctx.append_text(&page.text);
                progress.report(ProgressEvent::PageText {
                    path: ctx.job.source_path.clone(),
                    page: page.number,
                    chars: page.text.chars().count(),
                });
                continue;
            }

            match &self.ocr {
                Some(ocr) => self.ocr_page(ctx, page, ocr.as_ref(), progress)?,
                None => debug!("Page {} has no text and OCR is disabled", page.number),
            }
        }

        debug!(
            "Extracted {} characters from {} page(s), {} image(s) recognized",
            ctx.text.len(),
            ctx.pages_read,
            ctx.ocr_images
        );
        Ok(())
    }

    /// Recognizes a page's images in order, stopping early once the text
    /// already settles the classification. A page where no image could be
    /// decoded is rendered whole and recognized instead.
    fn ocr_page(
        &self,
        ctx: &mut PipelineContext,
        page: &PdfPage,
        ocr: &dyn OcrEngine,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let total = page.images.len();
        progress.report(ProgressEvent::OcrStarted {
            path: ctx.job.source_path.clone(),
            page: page.number,
            images: total,
        });

        let mut recognized_images = 0;

        for (index, image) in page.images.iter().enumerate() {
            progress.report(ProgressEvent::OcrImage {
                path: ctx.job.source_path.clone(),
                page: page.number,
                index: index + 1,
                total,
            });

            let decoded = match image.decode() {
                Ok(decoded) => decoded,
                Err(ProcessError::UnsupportedImage(reason)) => {
                    info!("Skipping image {} on page {}: {}", image.name, page.number, reason);
                    progress.report(ProgressEvent::ImageSkipped {
                        path: ctx.job.source_path.clone(),
                        page: page.number,
                        image: image.name.clone(),
                        reason: reason.clone(),
                    });
                    ctx.warnings.push(PipelineWarning::ImageSkipped {
                        page: page.number,
                        image: image.name.clone(),
                        reason,
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let recognized = ocr.recognize(&downscale_half(&decoded))?;
            ctx.append_text(&recognized);
            ctx.ocr_images += 1;
            ctx.ocr_used = true;
            recognized_images += 1;

            if self.categorizer.is_settled(&ctx.text) {
                let skipped = total - index - 1;
                if skipped > 0 {
                    debug!(
                        "Date and keyword found on page {}, skipping {} image(s)",
                        page.number, skipped
                    );
                    progress.report(ProgressEvent::OcrSettled {
                        path: ctx.job.source_path.clone(),
                        page: page.number,
                        skipped,
                    });
                }
                break;
            }
        }

        if recognized_images == 0 {
            self.ocr_rendered_page(ctx, page, ocr, progress)?;
        }

        Ok(())
    }

    /// OCR on the whole page rendered at full resolution. A page that cannot
    /// be rendered only adds a warning.
    fn ocr_rendered_page(
        &self,
        ctx: &mut PipelineContext,
        page: &PdfPage,
        ocr: &dyn OcrEngine,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let rendered = match self.source.render_page(&ctx.job.source_path, page.number) {
            Ok(rendered) => rendered,
            Err(e) => {
                info!("Page {} has no readable image: {}", page.number, e);
                ctx.warnings.push(PipelineWarning::PageNotRendered {
                    page: page.number,
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        debug!(
            "Rendered page {} at {}x{}",
            page.number,
            rendered.width(),
            rendered.height()
        );
        progress.report(ProgressEvent::PageRendered {
            path: ctx.job.source_path.clone(),
            page: page.number,
        });

        let recognized = ocr.recognize(&rendered)?;
        ctx.append_text(&recognized);
        ctx.ocr_images += 1;
        ctx.ocr_used = true;
        Ok(())
    }

    fn step_classify(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Classification {
        let classification = self.categorizer.classify(&ctx.text);
        debug!("Classified as {:?}", classification);

        ctx.classification = Some(classification);
        progress.report(ProgressEvent::Classified {
            path: ctx.job.source_path.clone(),
            classification,
        });
        classification
    }

    fn step_relocate(
        &self,
        ctx: &mut PipelineContext,
        classification: Classification,
    ) -> Result<JobOutcome, PipelineError> {
        let source = ctx.job.source_path.clone();

        let outcome = match classification {
            Classification::NonInvoice => JobOutcome::Commande {
                destination: self.place(&source, &self.storage.commande_directory())?,
            },
            Classification::Invoice(date) => JobOutcome::Sorted {
                date,
                destination: self.place(&source, &self.storage.invoice_directory(&date))?,
            },
            Classification::Unsortable(reason) => JobOutcome::Unsorted { reason },
        };

        if let Some(destination) = outcome.destination() {
            debug!(
                "{} {} -> {}",
                if self.config.dry_run { "Planned" } else { "Moved" },
                sanitize::redact_path(&source),
                sanitize::relative_to(destination, self.storage.root())
            );
            ctx.destination = Some(destination.to_path_buf());
        }
        Ok(outcome)
    }

    fn place(&self, source: &Path, directory: &Path) -> Result<PathBuf, StorageError> {
        if self.config.dry_run {
            self.storage.planned_destination(source, directory)
        } else {
            self.storage.move_into(source, directory)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::{KeywordSet, UnsortableReason};
    use crate::config::SorterConfig;
    use crate::dates::{DateCandidate, DateExtractor};
    use crate::pipeline::progress::NoopProgress;
    use crate::processor::EmbeddedImage;
    use crate::worker::job::Job;
    use image::DynamicImage;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Pages keyed by file name; unknown files fail to open. Pages render
    /// to a blank image `rendered_width` wide when set.
    struct FakeSource {
        documents: HashMap<String, Vec<PdfPage>>,
        rendered_width: Option<u32>,
    }

    impl DocumentSource for FakeSource {
        fn open(&self, path: &Path) -> Result<Vec<PdfPage>, ProcessError> {
            let name = sanitize::redact_path(path);
            self.documents
                .get(&name)
                .cloned()
                .ok_or_else(|| ProcessError::PdfProcessing(format!("cannot open {}", name)))
        }

        fn render_page(&self, _path: &Path, page: u32) -> Result<DynamicImage, ProcessError> {
            match self.rendered_width {
                Some(width) => Ok(DynamicImage::ImageLuma8(image::GrayImage::new(width, 8))),
                None => Err(ProcessError::RenderPage {
                    page,
                    reason: "no renderer".to_string(),
                }),
            }
        }
    }

    /// Returns the text registered for the (downscaled) image width.
    struct FakeOcr {
        texts: HashMap<u32, String>,
        calls: AtomicUsize,
    }

    impl FakeOcr {
        fn new(texts: &[(u32, &str)]) -> Self {
            Self {
                texts: texts.iter().map(|(w, t)| (*w, t.to_string())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl OcrEngine for FakeOcr {
        fn recognize(&self, image: &DynamicImage) -> Result<String, ProcessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.texts
                .get(&image.width())
                .cloned()
                .ok_or_else(|| ProcessError::OcrFailed(format!("no text for {}", image.width())))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn text_page(number: u32, text: &str) -> PdfPage {
        PdfPage {
            number,
            text: text.to_string(),
            images: vec![],
        }
    }

    /// Image whose downscaled width is `ocr_width`.
    fn scan(name: &str, ocr_width: u32) -> EmbeddedImage {
        let width = ocr_width * 2;
        EmbeddedImage::gray(name, width, 4, vec![200; (width * 4) as usize])
    }

    fn scanned_page(number: u32, images: Vec<EmbeddedImage>) -> PdfPage {
        PdfPage {
            number,
            text: String::new(),
            images,
        }
    }

    struct Fixture {
        tmp: TempDir,
        ocr: Arc<FakeOcr>,
        pipeline: Pipeline,
    }

    fn fixture(
        documents: Vec<(&str, Vec<PdfPage>)>,
        ocr_texts: &[(u32, &str)],
        dry_run: bool,
    ) -> Fixture {
        rendering_fixture(documents, ocr_texts, dry_run, None)
    }

    fn rendering_fixture(
        documents: Vec<(&str, Vec<PdfPage>)>,
        ocr_texts: &[(u32, &str)],
        dry_run: bool,
        rendered_width: Option<u32>,
    ) -> Fixture {
        let tmp = TempDir::new().unwrap();
        for (name, _) in &documents {
            std::fs::write(tmp.path().join(name), b"%PDF-1.5").unwrap();
        }

        let config = Arc::new(
            PipelineConfig::from_config(&SorterConfig::default(), tmp.path())
                .with_dry_run(dry_run),
        );
        let source = Arc::new(FakeSource {
            documents: documents
                .into_iter()
                .map(|(name, pages)| (name.to_string(), pages))
                .collect(),
            rendered_width,
        });
        let ocr = Arc::new(FakeOcr::new(ocr_texts));
        let categorizer = Categorizer::new(
            config.keywords.clone(),
            config.undesired_keywords.clone(),
        )
        .with_date_extractor(DateExtractor::with_current_year(2026));
        let pipeline = Pipeline::new(config, source, Some(ocr.clone() as Arc<dyn OcrEngine>))
            .with_categorizer(categorizer);

        Fixture { tmp, ocr, pipeline }
    }

    fn run(fx: &Fixture, name: &str) -> (JobResult, PipelineContext) {
        let job = Job::new(fx.tmp.path().join(name));
        fx.pipeline.run(PipelineContext::new(job), &NoopProgress)
    }

    #[test]
    fn test_invoice_with_text_is_filed_by_date() {
        let fx = fixture(
            vec![("a.pdf", vec![text_page(1, "FACTURE n 42\ndu 13/07/2023")])],
            &[],
            false,
        );

        let (result, ctx) = run(&fx, "a.pdf");

        let expected = fx.tmp.path().join("2023/Facture fournisseur/07/a.pdf");
        assert_eq!(
            result.outcome,
            JobOutcome::Sorted {
                date: DateCandidate::new(7, 2023),
                destination: expected.clone(),
            }
        );
        assert!(expected.exists());
        assert!(!fx.tmp.path().join("a.pdf").exists());
        assert!(!result.ocr_used);
        assert_eq!(ctx.text, "facture n 42 du 13/07/2023");
    }

    #[test]
    fn test_non_invoice_goes_to_commande() {
        let fx = fixture(
            vec![(
                "bon.pdf",
                vec![text_page(1, "Facture 13/07/2023 - Ceci n'est pas une facture")],
            )],
            &[],
            false,
        );

        let (result, _ctx) = run(&fx, "bon.pdf");

        assert!(result.is_commande());
        assert!(fx.tmp.path().join("commande/bon.pdf").exists());
    }

    #[test]
    fn test_unsortable_stays_in_place() {
        let fx = fixture(
            vec![
                ("notes.pdf", vec![text_page(1, "meeting notes 13/07/2023")]),
                ("nodate.pdf", vec![text_page(1, "invoice without any date")]),
            ],
            &[],
            false,
        );

        let (result, _) = run(&fx, "notes.pdf");
        assert_eq!(
            result.outcome,
            JobOutcome::Unsorted {
                reason: UnsortableReason::NoKeywordMatch
            }
        );
        assert!(fx.tmp.path().join("notes.pdf").exists());

        let (result, _) = run(&fx, "nodate.pdf");
        assert_eq!(
            result.outcome,
            JobOutcome::Unsorted {
                reason: UnsortableReason::NoDateFound
            }
        );
        assert!(fx.tmp.path().join("nodate.pdf").exists());
    }

    #[test]
    fn test_ocr_stops_early_within_page_only() {
        let fx = fixture(
            vec![(
                "scan.pdf",
                vec![
                    scanned_page(1, vec![scan("Im1", 10), scan("Im2", 11), scan("Im3", 12)]),
                    scanned_page(2, vec![scan("Im4", 13)]),
                ],
            )],
            &[
                (10, "Facture 01/02/2024"),
                (11, "page footer"),
                (12, "more footer"),
                (13, "Total TTC"),
            ],
            false,
        );

        let (result, ctx) = run(&fx, "scan.pdf");

        // Im2 and Im3 skipped, page 2 still recognized
        assert_eq!(fx.ocr.calls.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.ocr_images, 2);
        assert!(result.ocr_used);
        assert_eq!(ctx.text, "facture 01/02/2024 total ttc");
        assert!(matches!(result.outcome, JobOutcome::Sorted { .. }));
    }

    #[test]
    fn test_ocr_continues_until_settled() {
        let fx = fixture(
            vec![(
                "scan.pdf",
                vec![scanned_page(1, vec![scan("Im1", 10), scan("Im2", 11)])],
            )],
            &[(10, "Invoice"), (11, "dated 05.11.2024")],
            false,
        );

        let (result, _ctx) = run(&fx, "scan.pdf");

        assert_eq!(fx.ocr.calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            result.outcome,
            JobOutcome::Sorted { date, .. } if date == DateCandidate::new(11, 2024)
        ));
    }

    #[test]
    fn test_text_pages_do_not_use_ocr() {
        let fx = fixture(
            vec![(
                "mixed.pdf",
                vec![PdfPage {
                    number: 1,
                    text: "Ticket de caisse 12/12/2024".to_string(),
                    images: vec![scan("Logo", 10)],
                }],
            )],
            &[(10, "logo")],
            false,
        );

        let (result, _ctx) = run(&fx, "mixed.pdf");

        assert_eq!(fx.ocr.calls.load(Ordering::SeqCst), 0);
        assert!(!result.ocr_used);
        assert!(result.is_sorted());
    }

    #[test]
    fn test_unsupported_image_is_skipped() {
        let mut unsupported = scan("Fax", 10);
        unsupported.encoding =
            crate::processor::ImageEncoding::Unsupported("CCITTFaxDecode".to_string());
        let fx = fixture(
            vec![(
                "fax.pdf",
                vec![scanned_page(1, vec![unsupported, scan("Im2", 11)])],
            )],
            &[(11, "facture 03-04-2025")],
            false,
        );

        let (result, ctx) = run(&fx, "fax.pdf");

        assert_eq!(fx.ocr.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.warnings.len(), 1);
        assert!(result.is_sorted());
    }

    #[test]
    fn test_ccitt_only_page_is_rendered_for_ocr() {
        let mut fax = scan("Fax", 10);
        fax.encoding = crate::processor::ImageEncoding::Unsupported("CCITTFaxDecode".to_string());
        let fx = rendering_fixture(
            vec![("fax.pdf", vec![scanned_page(1, vec![fax])])],
            &[(10, "unused"), (1700, "Facture 01/02/2024")],
            false,
            Some(1700),
        );

        let progress = RecordingProgress::default();
        let job = Job::new(fx.tmp.path().join("fax.pdf"));
        let (result, ctx) = fx.pipeline.run(PipelineContext::new(job), &progress);

        assert_eq!(fx.ocr.calls.load(Ordering::SeqCst), 1);
        assert!(result.ocr_used);
        assert_eq!(
            result.outcome,
            JobOutcome::Sorted {
                date: DateCandidate::new(2, 2024),
                destination: fx.tmp.path().join("2024/Facture fournisseur/02/fax.pdf"),
            }
        );
        assert!(matches!(
            ctx.warnings.as_slice(),
            [PipelineWarning::ImageSkipped { page: 1, .. }]
        ));
        let events = progress.events.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::PageRendered { page: 1, .. })));
    }

    #[test]
    fn test_unrenderable_page_is_a_warning() {
        let mut jbig2 = scan("Im1", 10);
        jbig2.encoding = crate::processor::ImageEncoding::Unsupported("JBIG2Decode".to_string());
        let fx = fixture(
            vec![("scan.pdf", vec![scanned_page(1, vec![jbig2])])],
            &[],
            false,
        );

        let (result, ctx) = run(&fx, "scan.pdf");

        assert_eq!(fx.ocr.calls.load(Ordering::SeqCst), 0);
        assert!(!result.is_error());
        assert_eq!(
            result.outcome,
            JobOutcome::Unsorted {
                reason: UnsortableReason::NoKeywordMatch
            }
        );
        assert!(matches!(
            ctx.warnings.as_slice(),
            [
                PipelineWarning::ImageSkipped { .. },
                PipelineWarning::PageNotRendered { page: 1, .. }
            ]
        ));
    }

    #[test]
    fn test_ocr_failure_fails_the_file() {
        let fx = fixture(
            vec![("bad.pdf", vec![scanned_page(1, vec![scan("Im1", 99)])])],
            &[],
            false,
        );

        let (result, _ctx) = run(&fx, "bad.pdf");

        assert!(result.is_error());
        assert!(result.error().unwrap().contains("OCR failed"));
        assert!(!result.ocr_used);
        assert!(fx.tmp.path().join("bad.pdf").exists());
    }

    #[test]
    fn test_open_failure_fails_the_file() {
        let fx = fixture(vec![], &[], false);
        std::fs::write(fx.tmp.path().join("corrupt.pdf"), b"garbage").unwrap();

        let progress = RecordingProgress::default();
        let job = Job::new(fx.tmp.path().join("corrupt.pdf"));
        let (result, _ctx) = fx.pipeline.run(PipelineContext::new(job), &progress);

        assert!(result.is_error());
        assert!(fx.tmp.path().join("corrupt.pdf").exists());
        let events = progress.events.lock().unwrap();
        assert!(matches!(events.last(), Some(ProgressEvent::Failed { .. })));
    }

    #[test]
    fn test_dry_run_plans_without_touching_disk() {
        let fx = fixture(
            vec![("a.pdf", vec![text_page(1, "facture 13/07/2023")])],
            &[],
            true,
        );

        let (result, ctx) = run(&fx, "a.pdf");

        let planned = fx.tmp.path().join("2023/Facture fournisseur/07/a.pdf");
        assert_eq!(result.outcome.destination(), Some(planned.as_path()));
        assert_eq!(ctx.destination, Some(planned));
        assert!(result.simulated);
        assert!(fx.tmp.path().join("a.pdf").exists());
        assert!(!fx.tmp.path().join("2023").exists());
    }

    #[test]
    fn test_disabled_ocr_leaves_scans_unsorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("scan.pdf"), b"%PDF-1.5").unwrap();
        let config = Arc::new(PipelineConfig::from_config(
            &SorterConfig::default(),
            tmp.path(),
        ));
        let source = Arc::new(FakeSource {
            documents: HashMap::from([(
                "scan.pdf".to_string(),
                vec![scanned_page(1, vec![scan("Im1", 10)])],
            )]),
            rendered_width: None,
        });
        let pipeline = Pipeline::new(config, source, None);

        let job = Job::new(tmp.path().join("scan.pdf"));
        let (result, _ctx) = pipeline.run(PipelineContext::new(job), &NoopProgress);

        assert!(!result.ocr_used);
        assert_eq!(
            result.outcome,
            JobOutcome::Unsorted {
                reason: UnsortableReason::NoKeywordMatch
            }
        );
    }

    #[test]
    fn test_caller_keywords_flow_into_classification() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("loyer.pdf"), b"%PDF-1.5").unwrap();
        let config = Arc::new(
            PipelineConfig::from_config(&SorterConfig::default(), tmp.path())
                .with_extra_keywords(["Quittance"])
                .with_dry_run(true),
        );
        let source = Arc::new(FakeSource {
            documents: HashMap::from([(
                "loyer.pdf".to_string(),
                vec![text_page(1, "Quittance de loyer 01/05/2025")],
            )]),
            rendered_width: None,
        });
        let categorizer = Categorizer::new(config.keywords.clone(), KeywordSet::default_undesired())
            .with_date_extractor(DateExtractor::with_current_year(2026));
        let pipeline = Pipeline::new(config, source, None).with_categorizer(categorizer);

        let job = Job::new(tmp.path().join("loyer.pdf"));
        let (result, _ctx) = pipeline.run(PipelineContext::new(job), &NoopProgress);

        assert!(result.is_sorted());
    }
}
