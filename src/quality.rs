use crate::filter::{filter, filter_pair, FilterOpts};
use crate::io::{create_outputs, with_outputs, MatePaths, SeparatorPolicy};
use crate::progress::ProgressLog;
use crate::reader::{count_records, open_fastq, open_mates};
use crate::record::QualityScoring;
use crate::summary::{RunKind, RunSummary};
use anyhow::Result;
use std::path::Path;

/// Streams a FASTQ file through the quality filter, writing the reads that
/// pass in input order.
pub fn quality_control(
    input: &Path,
    output: &Path,
    stats: &Path,
    opts: &FilterOpts,
    separator: SeparatorPolicy,
    scoring: QualityScoring,
) -> Result<RunSummary> {
    info!("Initializing files and counting the number of sequences");
    let estimate = count_records(input)?;
    let records = open_fastq(input, scoring)?;
    info!("Input fastq file contains {estimate} sequences");

    let mut files = create_outputs([output, stats])?;

    let summary = with_outputs(&mut files, |files| {
        let mut progress = ProgressLog::new("Filtering");
        progress.init(estimate);
        let (mut total, mut kept) = (0, 0);

        for record in records {
            let record = record?;
            total += 1;
            if filter(&record, opts) {
                files[0].write_record(&record, separator)?;
                kept += 1;
            }
            progress.increment(1);
        }

        Ok(RunSummary::new(RunKind::QualityControl, total, kept))
    })?;

    summary.write_stats_file(&mut files[1])?;
    summary.report();
    Ok(summary)
}

/// Paired version of [`quality_control`]. Mates are read in lockstep and a
/// pair is written only when both mates pass.
pub fn quality_control_paired(
    inputs: MatePaths,
    outputs: MatePaths,
    stats: &Path,
    opts: &FilterOpts,
    separator: SeparatorPolicy,
    scoring: QualityScoring,
) -> Result<RunSummary> {
    info!("Initializing files and counting the number of sequences");
    let estimate = count_records(inputs.first)?;
    let pairs = open_mates(inputs.first, inputs.second, scoring)?;
    info!("Input fastq files contain {estimate} pairs");

    let mut files = create_outputs([outputs.first, outputs.second, stats])?;

    let summary = with_outputs(&mut files, |files| {
        let mut progress = ProgressLog::new("Filtering pairs");
        progress.init(estimate);
        let (mut total, mut kept) = (0, 0);

        for pair in pairs {
            let (first, second) = pair?;
            total += 1;
            if filter_pair(&first, &second, opts) {
                files[0].write_record(&first, separator)?;
                files[1].write_record(&second, separator)?;
                kept += 1;
            }
            progress.increment(1);
        }

        Ok(RunSummary::new(RunKind::QualityControl, total, kept))
    })?;

    summary.write_stats_file(&mut files[2])?;
    summary.report();
    Ok(summary)
}
