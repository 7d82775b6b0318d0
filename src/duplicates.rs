use crate::io::{create_outputs, with_outputs, MatePaths, SeparatorPolicy};
use crate::progress::ProgressLog;
use crate::reader::{count_records, open_fastq, open_mates};
use crate::record::{PairedRecord, QualityScoring};
use crate::store::{populate, DedupKey};
use crate::summary::{RunKind, RunSummary};
use anyhow::Result;
use std::path::Path;

/// Removes exact duplicates from a FASTQ file.
///
/// Every record is filed under its `key`; a later record with the same key
/// replaces the earlier one, so the last occurrence of each duplicate is the
/// one written. Output is in ascending key order.
pub fn dedup(
    input: &Path,
    output: &Path,
    stats: &Path,
    key: DedupKey,
    separator: SeparatorPolicy,
    scoring: QualityScoring,
) -> Result<RunSummary> {
    info!("Initializing files and counting the number of sequences");
    let estimate = count_records(input)?;
    let records = open_fastq(input, scoring)?;
    info!("Input fastq file contains {estimate} sequences");

    let mut files = create_outputs([output, stats])?;

    let summary = with_outputs(&mut files, |files| {
        let mut progress = ProgressLog::new("Deduplicating");
        progress.init(estimate);
        let (store, total) = populate(records, key, &mut progress)?;
        if store.is_empty() {
            warn!("{} contains no records", input.display());
        }

        info!("Writing unique sequences to file");
        for record in store.values() {
            files[0].write_record(record, separator)?;
        }

        Ok(RunSummary::new(RunKind::Dedup, total, store.len()))
    })?;

    summary.write_stats_file(&mut files[1])?;
    summary.report();
    Ok(summary)
}

/// Removes duplicate mate pairs from two synchronised FASTQ files.
///
/// With [`DedupKey::Sequence`] a pair is keyed by both mate sequences, so
/// it is a duplicate only when both mates match. With [`DedupKey::Id`] the
/// forward mate's identifier is used.
pub fn dedup_paired(
    inputs: MatePaths,
    outputs: MatePaths,
    stats: &Path,
    key: DedupKey,
    separator: SeparatorPolicy,
    scoring: QualityScoring,
) -> Result<RunSummary> {
    info!("Initializing files and counting the number of sequences");
    let estimate = count_records(inputs.first)?;
    let pairs = open_mates(inputs.first, inputs.second, scoring)?
        .map(|pair| pair.map(|(first, second)| PairedRecord::new(first, second, key)));
    info!("Input fastq files contain {estimate} pairs");

    let mut files = create_outputs([outputs.first, outputs.second, stats])?;

    let summary = with_outputs(&mut files, |files| {
        let mut progress = ProgressLog::new("Deduplicating pairs");
        progress.init(estimate);
        let (store, total) = populate(pairs, key, &mut progress)?;
        if store.is_empty() {
            warn!("{} contains no records", inputs.first.display());
        }

        info!("Writing unique pairs to file");
        for pair in store.values() {
            files[0].write_record(&pair.first, separator)?;
            files[1].write_record(&pair.second, separator)?;
        }

        Ok(RunSummary::new(RunKind::Dedup, total, store.len()))
    })?;

    summary.write_stats_file(&mut files[2])?;
    summary.report();
    Ok(summary)
}
