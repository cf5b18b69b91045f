//! # Batch Export
//!
//! Renders one labeled code per row of tabular input and packs them into a
//! single archive.
//!
//! ## State machine
//!
//! ```text
//! Idle ──► Validating ──► Processing(1) ──► … ──► Processing(n) ──► Finalizing ──► Done
//!              │                  │                                      │
//!              ▼                  ▼                                      ▼
//!        MissingField        Cancelled                               Assembly
//! ```
//!
//! Rows run strictly in order. A row whose render or compose step fails is
//! recorded and skipped; only validation, cancellation and archive assembly
//! end the batch early.

mod archive;
mod filename;
mod table;

pub use archive::{
    ArchiveAssembler, ArchiveEntry, ArchiveManifest, DuplicatePolicy, ZipAssembler,
};
pub use filename::derive_file_stem;
pub use table::{CsvRecordParser, TabularData, TabularRecordParser};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compose::{Note, render_labeled};
use crate::error::{BatchError, RenderError};
use crate::render::CodeMatrixRenderer;
use crate::resolve::{DATA_FIELD, ItemOverrideRecord, resolve};
use crate::style::{DEFAULT_EXPORT_SIZE, ExportFormat, LabelStyle, StyleConfig, StylePreset};
use crate::text::TextPainter;

// ============================================================================
// JOB
// ============================================================================

/// Cooperative cancellation flag, checked between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything needed to run one batch.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub fields: Vec<String>,
    pub records: Vec<ItemOverrideRecord>,
    pub style: StyleConfig,
    pub label: LabelStyle,
    pub export_size: u32,
    pub format: ExportFormat,
    pub duplicates: DuplicatePolicy,
    pub cancel: Option<CancelToken>,
}

impl BatchJob {
    pub fn new(table: TabularData, style: StyleConfig, label: LabelStyle) -> Self {
        Self {
            fields: table.fields,
            records: table
                .records
                .into_iter()
                .map(ItemOverrideRecord::from_fields)
                .collect(),
            style,
            label,
            export_size: DEFAULT_EXPORT_SIZE,
            format: ExportFormat::Png,
            duplicates: DuplicatePolicy::default(),
            cancel: None,
        }
    }

    /// Job using a preset's style, label, size and format.
    pub fn from_preset(table: TabularData, preset: &StylePreset) -> Self {
        Self::new(table, preset.style.clone(), preset.label.clone())
            .with_export_size(preset.export_size)
            .with_format(preset.format)
    }

    pub fn with_export_size(mut self, size: u32) -> Self {
        self.export_size = size;
        self
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

// ============================================================================
// PROGRESS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the row just handled.
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl Progress {
    fn after_row(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            message: format!("Generating item {} of {}...", current, total),
        }
    }
}

/// Receives a progress update after every row. Cannot influence the batch.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(&Progress) + Send + Sync,
{
    fn report(&self, progress: &Progress) {
        self(progress)
    }
}

/// Sink that writes progress to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, progress: &Progress) {
        log::info!("{}", progress.message);
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Validating,
    Processing(usize),
    Finalizing,
    Done,
    Cancelled,
}

/// A row that produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRow {
    /// 1-based row position.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub archive: Vec<u8>,
    pub mime_type: &'static str,
    pub entries: Vec<String>,
    /// Rows rendered, including ones whose name was later replaced.
    pub produced: usize,
    pub failed: Vec<FailedRow>,
    /// Rows ignored because their `data` value was blank.
    pub empty_rows: Vec<usize>,
    pub notes: Vec<(usize, Note)>,
}

impl BatchOutcome {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(|f| f.index).collect()
    }

    /// One-line result for the user.
    pub fn summary(&self) -> String {
        let mut summary = format!("Generated {} item(s)", self.produced);
        if !self.failed.is_empty() {
            let rows: Vec<String> = self.failed.iter().map(|f| f.index.to_string()).collect();
            summary += &format!(
                ", skipped {} row(s) (rows: {})",
                self.failed.len(),
                rows.join(", ")
            );
        }
        if !self.empty_rows.is_empty() {
            summary += &format!(", ignored {} row(s) without data", self.empty_rows.len());
        }
        summary
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

// ============================================================================
// RUNNER
// ============================================================================

/// Drives a [`BatchJob`] through render, compose and archive steps.
pub struct BatchJobRunner<'a> {
    renderer: &'a dyn CodeMatrixRenderer,
    painter: &'a dyn TextPainter,
    assembler: &'a dyn ArchiveAssembler,
    progress: &'a dyn ProgressSink,
    state: BatchState,
}

impl<'a> BatchJobRunner<'a> {
    pub fn new(
        renderer: &'a dyn CodeMatrixRenderer,
        painter: &'a dyn TextPainter,
        assembler: &'a dyn ArchiveAssembler,
    ) -> Self {
        Self {
            renderer,
            painter,
            assembler,
            progress: &LogProgress,
            state: BatchState::Idle,
        }
    }

    pub fn with_progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = sink;
        self
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    fn transition(&mut self, state: BatchState) {
        log::debug!("Batch {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    pub fn run(&mut self, job: &BatchJob) -> Result<BatchOutcome, BatchError> {
        self.transition(BatchState::Validating);
        if !job.fields.iter().any(|f| f == DATA_FIELD) {
            self.transition(BatchState::Idle);
            return Err(BatchError::MissingField(DATA_FIELD));
        }

        let total = job.records.len();
        let mut manifest = ArchiveManifest::new();
        let mut produced = 0;
        let mut failed = Vec::new();
        let mut empty_rows = Vec::new();
        let mut notes = Vec::new();

        log::info!(
            "Starting batch: {} rows, {}px {}",
            total,
            job.export_size,
            job.format
        );

        for (i, record) in job.records.iter().enumerate() {
            if job.is_cancelled() {
                self.transition(BatchState::Cancelled);
                return Err(BatchError::Cancelled {
                    processed: i,
                    total,
                });
            }
            let index = i + 1;
            self.transition(BatchState::Processing(index));

            match record.data() {
                None => empty_rows.push(index),
                Some(data) => match self.process_row(job, record, data) {
                    Ok((bytes, note)) => {
                        let stem = derive_file_stem(record.label(), index);
                        manifest.insert(&stem, job.format.extension(), bytes, job.duplicates);
                        produced += 1;
                        if let Some(note) = note {
                            notes.push((index, note));
                        }
                    }
                    Err(e) => {
                        log::warn!("Row {} failed: {}", index, e);
                        failed.push(FailedRow {
                            index,
                            reason: e.to_string(),
                        });
                    }
                },
            }

            self.progress.report(&Progress::after_row(index, total));
        }

        self.transition(BatchState::Finalizing);
        let archive = self.assembler.assemble(&manifest)?;
        self.transition(BatchState::Done);

        let outcome = BatchOutcome {
            archive,
            mime_type: self.assembler.mime_type(),
            entries: manifest.names(),
            produced,
            failed,
            empty_rows,
            notes,
        };
        log::info!("{}", outcome.summary());
        Ok(outcome)
    }

    fn process_row(
        &self,
        job: &BatchJob,
        record: &ItemOverrideRecord,
        data: &str,
    ) -> Result<(Vec<u8>, Option<Note>), RenderError> {
        let (style, label) = resolve(&job.style, &job.label, record);
        let outcome = render_labeled(
            self.renderer,
            self.painter,
            &style,
            &label,
            data,
            job.export_size,
            job.format,
        )?;
        let note = outcome.note();
        Ok((outcome.into_bytes(), note))
    }
}

/// Run a batch with the given collaborators.
pub fn run_batch(
    job: &BatchJob,
    renderer: &dyn CodeMatrixRenderer,
    painter: &dyn TextPainter,
    assembler: &dyn ArchiveAssembler,
    progress: &dyn ProgressSink,
) -> Result<BatchOutcome, BatchError> {
    BatchJobRunner::new(renderer, painter, assembler)
        .with_progress(progress)
        .run(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::encode_raster;
    use crate::style::Color;
    use crate::text::BitmapFont;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Renders a flat square, fails for payloads starting with "fail".
    #[derive(Default)]
    struct StubRenderer {
        calls: AtomicUsize,
    }

    impl CodeMatrixRenderer for StubRenderer {
        fn render(
            &self,
            _style: &StyleConfig,
            payload: &str,
            width: u32,
            height: u32,
            format: ExportFormat,
        ) -> Result<Vec<u8>, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if payload.starts_with("fail") {
                return Err(RenderError::Payload("too long".into()));
            }
            if payload == "empty" {
                return Ok(Vec::new());
            }
            let img = RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
            encode_raster(&img, format, Color::WHITE)
        }
    }

    /// Collects every manifest it is asked to assemble.
    #[derive(Default)]
    struct RecordingAssembler {
        names: Mutex<Vec<String>>,
        entries: Mutex<Vec<ArchiveEntry>>,
        fail: bool,
    }

    impl ArchiveAssembler for RecordingAssembler {
        fn assemble(&self, manifest: &ArchiveManifest) -> Result<Vec<u8>, BatchError> {
            if self.fail {
                return Err(BatchError::Assembly("disk full".into()));
            }
            *self.names.lock().unwrap() = manifest.names();
            *self.entries.lock().unwrap() = manifest.entries().to_vec();
            Ok(vec![0xAA])
        }

        fn mime_type(&self) -> &'static str {
            "application/octet-stream"
        }
    }

    fn table(fields: &[&str], rows: &[&[&str]]) -> TabularData {
        TabularData {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            records: rows
                .iter()
                .map(|row| {
                    fields
                        .iter()
                        .zip(row.iter())
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect::<HashMap<_, _>>()
                })
                .collect(),
        }
    }

    fn job(data: TabularData) -> BatchJob {
        BatchJob::new(data, StyleConfig::default(), LabelStyle::default()).with_export_size(60)
    }

    #[test]
    fn test_failed_row_is_isolated() {
        let rows: [&[&str]; 5] = [
            &["one", "One"],
            &["two", "Two"],
            &["fail-three", "Three"],
            &["four", "Four"],
            &["five", "Five"],
        ];
        let renderer = StubRenderer::default();
        let assembler = RecordingAssembler::default();
        let outcome = run_batch(
            &job(table(&["data", "label"], &rows)),
            &renderer,
            &BitmapFont,
            &assembler,
            &LogProgress,
        )
        .unwrap();

        assert_eq!(outcome.entries.len(), 4);
        assert_eq!(outcome.failed_indices(), vec![3]);
        assert_eq!(
            *assembler.names.lock().unwrap(),
            vec!["one.png", "two.png", "four.png", "five.png"]
        );
        assert_eq!(
            outcome.summary(),
            "Generated 4 item(s), skipped 1 row(s) (rows: 3)"
        );

        // The surviving rows match a batch that never saw the failing one
        let healthy = RecordingAssembler::default();
        let without_failure = [rows[0], rows[1], rows[3], rows[4]];
        run_batch(
            &job(table(&["data", "label"], &without_failure)),
            &renderer,
            &BitmapFont,
            &healthy,
            &LogProgress,
        )
        .unwrap();
        assert_eq!(
            *assembler.entries.lock().unwrap(),
            *healthy.entries.lock().unwrap()
        );

        // ...and a standalone render of the same row
        let first = ItemOverrideRecord::new().with("data", "one").with("label", "One");
        let (style, label) = resolve(&StyleConfig::default(), &LabelStyle::default(), &first);
        let standalone = render_labeled(
            &renderer,
            &BitmapFont,
            &style,
            &label,
            "one",
            60,
            ExportFormat::Png,
        )
        .unwrap();
        assert_eq!(
            assembler.entries.lock().unwrap()[0].bytes,
            standalone.into_bytes()
        );
    }

    #[test]
    fn test_oversized_label_row_is_isolated() {
        let data = table(
            &["data", "label", "labelSize"],
            &[
                &["one", "One", ""],
                &["two", "Two", "2000000000"],
                &["three", "Three", ""],
            ],
        );
        let renderer = StubRenderer::default();
        let assembler = RecordingAssembler::default();
        let outcome = run_batch(&job(data), &renderer, &BitmapFont, &assembler, &LogProgress)
            .unwrap();

        assert_eq!(outcome.failed_indices(), vec![2]);
        assert!(outcome.failed[0].reason.contains("exceeds"));
        assert_eq!(
            *assembler.names.lock().unwrap(),
            vec!["one.png", "three.png"]
        );
    }

    #[test]
    fn test_missing_data_field_is_fatal_before_rendering() {
        let data = table(&["url", "label"], &[&["x", "y"]]);
        let renderer = StubRenderer::default();
        let assembler = RecordingAssembler::default();
        let mut runner = BatchJobRunner::new(&renderer, &BitmapFont, &assembler);

        let result = runner.run(&job(data));
        assert!(matches!(result, Err(BatchError::MissingField("data"))));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
        assert!(assembler.names.lock().unwrap().is_empty());
        assert_eq!(runner.state(), BatchState::Idle);
    }

    #[test]
    fn test_blank_data_rows_are_ignored() {
        let data = table(&["data", "label"], &[&["a", "A"], &["", "B"], &["c", "C"]]);
        let renderer = StubRenderer::default();
        let outcome = run_batch(
            &job(data),
            &renderer,
            &BitmapFont,
            &RecordingAssembler::default(),
            &LogProgress,
        )
        .unwrap();
        assert_eq!(outcome.entries, vec!["a.png", "c.png"]);
        assert_eq!(outcome.empty_rows, vec![2]);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_render_counts_as_failure() {
        let data = table(&["data"], &[&["empty"], &["fine"]]);
        let outcome = run_batch(
            &job(data),
            &StubRenderer::default(),
            &BitmapFont,
            &RecordingAssembler::default(),
            &LogProgress,
        )
        .unwrap();
        assert_eq!(outcome.failed_indices(), vec![1]);
        assert_eq!(outcome.entries, vec!["item_2.png"]);
    }

    #[test]
    fn test_progress_after_every_row() {
        let data = table(&["data"], &[&["a"], &["fail"], &[""]]);
        let seen = Mutex::new(Vec::new());
        let sink = |p: &Progress| seen.lock().unwrap().push(p.message.clone());
        run_batch(
            &job(data),
            &StubRenderer::default(),
            &BitmapFont,
            &RecordingAssembler::default(),
            &sink,
        )
        .unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "Generating item 1 of 3...",
                "Generating item 2 of 3...",
                "Generating item 3 of 3...",
            ]
        );
    }

    #[test]
    fn test_cancel_discards_everything() {
        let data = table(&["data"], &[&["a"], &["b"], &["c"]]);
        let token = CancelToken::new();
        let job = job(data).with_cancel(token.clone());
        let renderer = StubRenderer::default();
        let assembler = RecordingAssembler::default();

        // Cancel as soon as the first row reports progress
        let sink = |_: &Progress| token.cancel();
        let mut runner =
            BatchJobRunner::new(&renderer, &BitmapFont, &assembler).with_progress(&sink);
        let result = runner.run(&job);

        assert!(matches!(
            result,
            Err(BatchError::Cancelled {
                processed: 1,
                total: 3
            })
        ));
        assert_eq!(runner.state(), BatchState::Cancelled);
        assert!(assembler.names.lock().unwrap().is_empty());
    }

    #[test]
    fn test_assembly_failure_is_fatal() {
        let data = table(&["data"], &[&["a"]]);
        let assembler = RecordingAssembler {
            fail: true,
            ..Default::default()
        };
        let result = run_batch(
            &job(data),
            &StubRenderer::default(),
            &BitmapFont,
            &assembler,
            &LogProgress,
        );
        assert!(matches!(result, Err(BatchError::Assembly(_))));
    }

    #[test]
    fn test_duplicate_labels() {
        let rows: &[&[&str]] = &[&["a", "Shop"], &["b", "Shop"]];
        let kept = run_batch(
            &job(table(&["data", "label"], rows)),
            &StubRenderer::default(),
            &BitmapFont,
            &RecordingAssembler::default(),
            &LogProgress,
        )
        .unwrap();
        assert_eq!(kept.entries, vec!["shop.png"]);
        assert_eq!(kept.produced, 2);

        let suffixed = run_batch(
            &job(table(&["data", "label"], rows)).with_duplicates(DuplicatePolicy::Suffix),
            &StubRenderer::default(),
            &BitmapFont,
            &RecordingAssembler::default(),
            &LogProgress,
        )
        .unwrap();
        assert_eq!(suffixed.entries, vec!["shop.png", "shop_2.png"]);
    }

    #[test]
    fn test_svg_labels_are_noted() {
        struct SvgRenderer;
        impl CodeMatrixRenderer for SvgRenderer {
            fn render(
                &self,
                _: &StyleConfig,
                _: &str,
                _: u32,
                _: u32,
                _: ExportFormat,
            ) -> Result<Vec<u8>, RenderError> {
                Ok(b"<svg/>".to_vec())
            }
        }

        let data = table(&["data", "label"], &[&["a", "Hello"], &["b", ""]]);
        let outcome = run_batch(
            &job(data).with_format(ExportFormat::Svg),
            &SvgRenderer,
            &BitmapFont,
            &RecordingAssembler::default(),
            &LogProgress,
        )
        .unwrap();
        assert_eq!(outcome.entries, vec!["hello.svg", "item_2.svg"]);
        assert_eq!(outcome.notes, vec![(1, Note::LabelOmittedForVector)]);
    }
}
