use crate::application::completion::ItemOutcome;
use crate::application::orchestrator::CycleReport;
use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::io::Write;

/// One CSV row per cycle.
#[derive(Debug, Serialize)]
struct CycleRow {
    cycle: u64,
    submitted: usize,
    verified: usize,
    repaired: usize,
    failed_items: usize,
    lost: usize,
    saved: u64,
    processed: u64,
    failed: u64,
    elapsed_ms: u64,
}

impl From<&CycleReport> for CycleRow {
    fn from(report: &CycleReport) -> Self {
        Self {
            cycle: report.cycle,
            submitted: report.submitted,
            verified: report.outcome.count(ItemOutcome::Verified),
            repaired: report.outcome.count(ItemOutcome::Repaired),
            failed_items: report.outcome.failed(),
            lost: report.outcome.lost(),
            saved: report.stats.saved,
            processed: report.stats.processed,
            failed: report.stats.failed,
            elapsed_ms: report.elapsed.as_millis() as u64,
        }
    }
}

/// Writes cycle reports as CSV to any `Write` sink (e.g., stdout).
///
/// The header is written with the first row; every row is flushed immediately so
/// a long-running schedule streams its results.
pub struct CycleReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CycleReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().from_writer(sink),
        }
    }

    pub fn write_report(&mut self, report: &CycleReport) -> Result<()> {
        self.writer.serialize(CycleRow::from(report))?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| PipelineError::IoError(e.into_error()))
    }
}
