use crate::io::OutputFile;
use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::io::Write;

/// The kind of run a summary describes. Decides the stats file header.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Dedup,
    QualityControl,
    Reconcile,
}

impl RunKind {
    /// Column names of the stats file, in order.
    pub fn header(&self) -> [&'static str; 3] {
        match self {
            RunKind::Dedup => ["Total_Sequences", "Unique_Sequences", "Percent_Unique"],
            RunKind::QualityControl => [
                "Total_Sequences",
                "Sequences_Passing_Filter",
                "Percent_Passing_Filter",
            ],
            RunKind::Reconcile => ["Total_Sequences", "Paired_Sequences", "Percent_Paired"],
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            RunKind::Dedup => "unique",
            RunKind::QualityControl => "passing filter",
            RunKind::Reconcile => "paired",
        }
    }
}

/// Counts produced by a completed run.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub kind: RunKind,
    /// records (or mate pairs) read from the input
    pub total: usize,
    /// records (or mate pairs) written to the output
    pub kept: usize,
    pub percent: f64,
}

impl RunSummary {
    /// Percentage is taken against `total` and is `0` when nothing was read.
    pub fn new(kind: RunKind, total: usize, kept: usize) -> Self {
        RunSummary {
            kind,
            total,
            kept,
            percent: percent(kept, total),
        }
    }

    /// The stats file rows: header, then one data row.
    pub fn write_stats<W: Write>(&self, wtr: W) -> csv::Result<()> {
        let mut wtr = tsv_writer(wtr);
        wtr.write_record(self.kind.header())?;
        wtr.write_record([
            self.total.to_string(),
            self.kept.to_string(),
            format_significant(self.percent, 4),
        ])?;
        wtr.flush()?;
        Ok(())
    }

    pub fn write_stats_file(&self, out: &mut OutputFile) -> Result<()> {
        self.write_stats(out.writer())
            .with_context(|| format!("Could not write stats to {}", out.path().display()))
    }

    /// Logs the human-readable result lines.
    pub fn report(&self) {
        info!(
            "Out of: {} sequences, removed: {}.",
            self.total,
            self.total - self.kept
        );
        info!(
            "Percent {} sequences: {}%",
            self.kind.verb(),
            format_significant(self.percent, 4)
        );
    }
}

/// `100 * part / whole`, or `0` for an empty whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Tab-separated writer without quoting, so fields are copied as-is.
/// Headers are written explicitly by the caller.
pub fn tsv_writer<W: Write>(wtr: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(wtr)
}

/// Formats `value` with `digits` significant digits and no trailing zeros,
/// the way `%g` does for values in ordinary range (`33.33`, `100`, `0.5`).
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || value.is_nan() {
        return "0".to_string();
    }
    if value.is_infinite() {
        return value.to_string();
    }

    let magnitude = value.abs().log10().floor() as i32 + 1;
    let decimals = (digits as i32 - magnitude).max(0) as usize;
    let mut s = format!("{value:.decimals$}");

    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Writes the run summary as pretty JSON.
pub fn write_summary_json<T: Serialize>(summary: &T, out: &mut OutputFile) -> Result<()> {
    serde_json::to_writer_pretty(out.writer(), summary)
        .with_context(|| format!("Could not write summary to {}", out.path().display()))?;
    out.flush()?;
    Ok(())
}
