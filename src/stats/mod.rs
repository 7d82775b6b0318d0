use crate::error::PipelineError;
use crate::io::{create_outputs, with_outputs};
use crate::progress::ProgressLog;
use crate::reader::{count_records, open_fastq};
use crate::record::{QualityScoring, Record};
use crate::summary::{format_significant, tsv_writer};
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

const HEADER: [&str; 4] = ["Name", "Length", "GC.Content", "Average.Quality"];

/// One row of the per-read statistics table.
#[derive(Serialize, Debug, PartialEq)]
pub struct ReadStats<'a> {
    pub name: &'a str,
    pub length: usize,
    pub gc_content: String,
    pub average_quality: String,
}

impl<'a> From<&'a Record> for ReadStats<'a> {
    fn from(record: &'a Record) -> Self {
        ReadStats {
            name: record.id(),
            length: record.len(),
            gc_content: format_significant(record.gc_content(), 6),
            average_quality: format_significant(record.average_quality(), 6),
        }
    }
}

/// Totals over a whole statistics run.
#[derive(Serialize, Debug, Default, PartialEq)]
pub struct StatsSummary {
    pub records: usize,
    pub mean_length: f64,
    pub mean_gc_content: f64,
}

impl StatsSummary {
    fn add(&mut self, record: &Record) {
        self.records += 1;
        let n = self.records as f64;
        self.mean_length += (record.len() as f64 - self.mean_length) / n;
        self.mean_gc_content += (record.gc_content() - self.mean_gc_content) / n;
    }
}

/// Writes a `Name  Length  GC.Content  Average.Quality` row for every read.
pub fn read_stats(input: &Path, output: &Path, scoring: QualityScoring) -> Result<StatsSummary> {
    info!("Initializing files and counting the number of sequences");
    let estimate = count_records(input)?;
    let records = open_fastq(input, scoring)?;
    info!("Input fastq file contains {estimate} sequences");

    let mut files = create_outputs([output])?;

    let summary = with_outputs(&mut files, |files| {
        let path = files[0].path().to_path_buf();
        let csv_err = |e: csv::Error| PipelineError::Io {
            path: path.clone(),
            source: e.into(),
        };

        let mut wtr = tsv_writer(files[0].writer());
        wtr.write_record(HEADER).map_err(csv_err)?;

        let mut progress = ProgressLog::new("Read statistics");
        progress.init(estimate);
        let mut summary = StatsSummary::default();

        for record in records {
            let record = record?;
            wtr.serialize(ReadStats::from(&record)).map_err(csv_err)?;
            summary.add(&record);
            progress.increment(1);
        }

        wtr.flush().map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(summary)
    })?;

    info!("Output fastq statistics were written to: {}", output.display());
    Ok(summary)
}
