//! Batch-wise materialization of tables into the output file
//!
//! Each table moves through `AllocateSheet -> ProcessHeader ->
//! ProcessBatch* -> Finalize`. Under [`CheckpointPolicy::EveryBatch`] the
//! live document is written to the destination and dropped after the header
//! and after every body batch, then read back before the next step, so
//! resident size follows the batch size rather than the table size.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use htmlsheet_markup::Element;
use htmlsheet_xlsx::{XlsxReader, XlsxWriter};

use crate::allocator::SheetAllocator;
use crate::config::{CheckpointPolicy, ConvertOptions};
use crate::error::{ConvertError, Result};
use crate::mapper::LiveDocument;
use crate::walker::{SheetContext, TableRows, TableWalker};

/// Where a table is in its conversion
#[derive(Debug)]
enum Phase {
    AllocateSheet,
    ProcessHeader(SheetContext),
    /// `offset` counts the body rows already written
    ProcessBatch { ctx: SheetContext, offset: usize },
    Finalize,
}

/// Statistics from a conversion run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Destination file
    pub output: PathBuf,
    /// Tables converted, one sheet each
    pub tables: usize,
    /// Header and body rows written
    pub rows: usize,
    /// Body batches processed
    pub batches: usize,
    /// Times the document was written to the destination
    pub checkpoints: usize,
    pub elapsed: Duration,
}

/// Drives table conversion batch by batch and owns the live document
#[derive(Debug, Clone)]
pub struct BatchMaterializer {
    output: PathBuf,
    options: ConvertOptions,
    walker: TableWalker,
    allocator: SheetAllocator,
}

impl BatchMaterializer {
    pub fn new<P: AsRef<Path>>(output: P, options: ConvertOptions) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            walker: TableWalker::new(&options),
            allocator: SheetAllocator::new(),
            options,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `tables` into the destination, `batch_size` body rows at a time
    ///
    /// On failure after a checkpoint the destination is left as written
    /// unless `remove_partial_on_error` is set.
    pub fn run(&self, tables: &[Element<'_>], batch_size: usize) -> Result<RunReport> {
        if batch_size == 0 {
            return Err(ConvertError::Config("batch size must be at least 1".into()));
        }

        let started = Instant::now();
        let mut report = RunReport {
            output: self.output.clone(),
            ..RunReport::default()
        };

        match self.run_tables(tables, batch_size, &mut report) {
            Ok(()) => {
                report.elapsed = started.elapsed();
                log::info!(
                    "wrote {} table(s), {} row(s) to {} in {:.3}s ({} batch(es), {} checkpoint(s))",
                    report.tables,
                    report.rows,
                    self.output.display(),
                    report.elapsed.as_secs_f64(),
                    report.batches,
                    report.checkpoints
                );
                Ok(report)
            }
            Err(err) => {
                if self.options.remove_partial_on_error && report.checkpoints > 0 {
                    match std::fs::remove_file(&self.output) {
                        Ok(()) => log::warn!("removed partial output {}", self.output.display()),
                        Err(e) => log::warn!(
                            "could not remove partial output {}: {}",
                            self.output.display(),
                            e
                        ),
                    }
                }
                Err(err)
            }
        }
    }

    fn run_tables(
        &self,
        tables: &[Element<'_>],
        batch_size: usize,
        report: &mut RunReport,
    ) -> Result<()> {
        let every_batch = self.options.checkpoint == CheckpointPolicy::EveryBatch;
        let mut live = Some(LiveDocument::new());

        for (index, table) in tables.iter().enumerate() {
            let TableRows { mut header, body } = TableRows::collect(*table)?;
            let total = body.len();
            // Rows already written are dropped batch by batch
            let mut pending: VecDeque<Element<'_>> = body.into();
            let mut phase = Phase::AllocateSheet;

            loop {
                phase = match phase {
                    Phase::AllocateSheet => {
                        let doc = self.live_document(&mut live)?;
                        let ctx = self.allocator.allocate(doc.workbook_mut(), *table, index)?;
                        Phase::ProcessHeader(ctx)
                    }
                    Phase::ProcessHeader(mut ctx) => {
                        if !header.is_empty() {
                            let doc = self.live_document(&mut live)?;
                            report.rows += self.walker.process_header(doc, &mut ctx, &header)?;
                            header = Vec::new();
                            if every_batch {
                                self.checkpoint(&mut live, report)?;
                            }
                        }
                        Phase::ProcessBatch { ctx, offset: 0 }
                    }
                    Phase::ProcessBatch { .. } if pending.is_empty() => Phase::Finalize,
                    Phase::ProcessBatch { mut ctx, offset } => {
                        let doc = self.live_document(&mut live)?;
                        let written = self.walker.process_body_batch(
                            doc,
                            &mut ctx,
                            pending.make_contiguous(),
                            0,
                            batch_size,
                        )?;
                        pending.drain(..written);
                        report.rows += written;
                        report.batches += 1;
                        log::debug!(
                            "sheet '{}': rows {}..{} of {}",
                            ctx.name,
                            offset,
                            offset + written,
                            total
                        );
                        if every_batch {
                            self.checkpoint(&mut live, report)?;
                        }
                        Phase::ProcessBatch {
                            ctx,
                            offset: offset + written,
                        }
                    }
                    Phase::Finalize => break,
                };
            }

            report.tables += 1;
        }

        // Whatever is still in memory has not reached disk yet
        if live.is_some() {
            self.checkpoint(&mut live, report)?;
        }
        Ok(())
    }

    /// The live document, reopened from the destination if it was released
    fn live_document<'s>(
        &self,
        slot: &'s mut Option<LiveDocument>,
    ) -> Result<&'s mut LiveDocument> {
        let doc = match slot.take() {
            Some(doc) => doc,
            None => {
                let workbook = XlsxReader::read_file(&self.output).map_err(|source| {
                    ConvertError::Checkpoint {
                        path: self.output.clone(),
                        source,
                    }
                })?;
                log::debug!("reopened {}", self.output.display());
                LiveDocument::from_workbook(workbook)
            }
        };
        Ok(slot.insert(doc))
    }

    /// Write the live document to the destination and release it
    fn checkpoint(&self, slot: &mut Option<LiveDocument>, report: &mut RunReport) -> Result<()> {
        let Some(doc) = slot.take() else {
            return Ok(());
        };
        XlsxWriter::write_file(doc.workbook(), &self.output).map_err(|source| {
            ConvertError::Checkpoint {
                path: self.output.clone(),
                source,
            }
        })?;
        report.checkpoints += 1;
        log::debug!(
            "checkpoint {} written to {}",
            report.checkpoints,
            self.output.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlsheet_core::CellValue;
    use htmlsheet_markup::Document;
    use pretty_assertions::assert_eq;

    const HTML: &str = r#"<table data-name="T">
        <thead><tr><th>H</th></tr></thead>
        <tr><td>1</td></tr><tr><td>2</td></tr><tr><td>3</td></tr>
    </table>"#;

    fn run(
        html: &str,
        options: ConvertOptions,
        batch_size: usize,
    ) -> (RunReport, PathBuf, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let doc = Document::parse(html).unwrap();
        let tables = doc.root().select(".//table").unwrap();
        let report = BatchMaterializer::new(&path, options)
            .run(&tables, batch_size)
            .unwrap();
        (report, path, dir)
    }

    #[test]
    fn test_every_batch_checkpoints() {
        let (report, path, _dir) = run(HTML, ConvertOptions::default(), 2);
        assert_eq!(report.tables, 1);
        assert_eq!(report.rows, 4);
        assert_eq!(report.batches, 2);
        // Header plus two batches
        assert_eq!(report.checkpoints, 3);

        let workbook = XlsxReader::read_file(&path).unwrap();
        let sheet = workbook.worksheet(0).unwrap();
        assert_eq!(sheet.name(), "T");
        assert_eq!(sheet.get_value_at(0, 0), CellValue::string("H"));
        assert_eq!(sheet.get_value_at(3, 0), CellValue::string("3"));
    }

    #[test]
    fn test_rows_stay_in_order_as_batches_are_released() {
        let body: String = (1..=5).map(|i| format!("<tr><td>{}</td></tr>", i)).collect();
        let html = format!("<table>{}</table>", body);
        for policy in [CheckpointPolicy::EveryBatch, CheckpointPolicy::HoldOpen] {
            let options = ConvertOptions::default().with_checkpoint(policy);
            let (report, path, _dir) = run(&html, options, 2);
            assert_eq!(report.rows, 5);
            assert_eq!(report.batches, 3);

            let workbook = XlsxReader::read_file(&path).unwrap();
            let sheet = workbook.worksheet(0).unwrap();
            let values: Vec<CellValue> = (0..5).map(|r| sheet.get_value_at(r, 0)).collect();
            let expected: Vec<CellValue> = (1..=5).map(|i| CellValue::string(i.to_string())).collect();
            assert_eq!(values, expected);
        }
    }

    #[test]
    fn test_hold_open_writes_once() {
        let options = ConvertOptions::default().with_checkpoint(CheckpointPolicy::HoldOpen);
        let (report, path, _dir) = run(HTML, options, 1);
        assert_eq!(report.batches, 3);
        assert_eq!(report.checkpoints, 1);
        assert!(path.exists());
    }

    #[test]
    fn test_no_tables_still_writes_a_sheet() {
        let (report, path, _dir) = run("<p>nothing here</p>", ConvertOptions::default(), 5);
        assert_eq!(report.tables, 0);
        assert_eq!(report.checkpoints, 1);
        let workbook = XlsxReader::read_file(&path).unwrap();
        assert_eq!(workbook.worksheet(0).unwrap().name(), "Sheet1");
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let doc = Document::parse(HTML).unwrap();
        let tables = doc.root().select(".//table").unwrap();
        let err = BatchMaterializer::new("unused.xlsx", ConvertOptions::default())
            .run(&tables, 0)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_failed_checkpoint_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be written as a file
        let doc = Document::parse(HTML).unwrap();
        let tables = doc.root().select(".//table").unwrap();
        let err = BatchMaterializer::new(dir.path(), ConvertOptions::default())
            .run(&tables, 10)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Checkpoint { .. }));
    }
}
