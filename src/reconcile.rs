use crate::io::{create_outputs, with_outputs, MatePaths, SeparatorPolicy};
use crate::progress::ProgressLog;
use crate::reader::{count_records, open_fastq};
use crate::record::QualityScoring;
use crate::store::{populate, DedupKey, SequenceStore};
use crate::summary::{RunKind, RunSummary};
use anyhow::Result;
use std::cmp::Ordering;
use std::iter::Peekable;
use std::path::Path;

/// Two-pointer merge over two streams sorted by ascending key, yielding
/// only the keys present in both along with both values.
///
/// Keys must be unique within each stream.
pub struct Intersection<I: Iterator, J: Iterator> {
    left: Peekable<I>,
    right: Peekable<J>,
}

impl<I: Iterator, J: Iterator> Intersection<I, J> {
    pub fn new(left: I, right: J) -> Self {
        Intersection {
            left: left.peekable(),
            right: right.peekable(),
        }
    }
}

impl<K, A, B, I, J> Iterator for Intersection<I, J>
where
    K: Ord,
    I: Iterator<Item = (K, A)>,
    J: Iterator<Item = (K, B)>,
{
    type Item = (K, (A, B));

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = {
                let (l, _) = self.left.peek()?;
                let (r, _) = self.right.peek()?;
                l.cmp(r)
            };

            match order {
                Ordering::Less => {
                    self.left.next();
                }
                Ordering::Greater => {
                    self.right.next();
                }
                Ordering::Equal => {
                    let (key, a) = self.left.next()?;
                    let (_, b) = self.right.next()?;
                    return Some((key, (a, b)));
                }
            }
        }
    }
}

/// Pairs up the entries of two stores that share a key.
pub fn intersect<A, B>(left: SequenceStore<A>, right: SequenceStore<B>) -> SequenceStore<(A, B)> {
    Intersection::new(left.into_iter(), right.into_iter()).collect()
}

/// Keeps only the reads whose identifier appears in both mate files, and
/// writes them as two synchronised files.
///
/// The reported percentage is taken against the records read from both
/// files together.
pub fn reconcile(
    inputs: MatePaths,
    outputs: MatePaths,
    stats: &Path,
    separator: SeparatorPolicy,
    scoring: QualityScoring,
) -> Result<RunSummary> {
    info!("Initializing files and counting the number of sequences");
    let estimate_first = count_records(inputs.first)?;
    let estimate_second = count_records(inputs.second)?;
    let forward = open_fastq(inputs.first, scoring)?;
    let reverse = open_fastq(inputs.second, scoring)?;
    info!("Input fastq files contain {estimate_first} and {estimate_second} sequences");

    let mut files = create_outputs([outputs.first, outputs.second, stats])?;

    let summary = with_outputs(&mut files, |files| {
        let mut progress = ProgressLog::new("Forward reads");
        progress.init(estimate_first);
        info!("Analyzing forward reads");
        let (forward, read_first) = populate(forward, DedupKey::Id, &mut progress)?;

        progress = ProgressLog::new("Reverse reads");
        progress.init(estimate_second);
        info!("Analyzing reverse reads");
        let (reverse, read_second) = populate(reverse, DedupKey::Id, &mut progress)?;

        info!("Writing paired sequences to file");
        let paired = intersect(forward, reverse);
        for (first, second) in paired.values() {
            files[0].write_record(first, separator)?;
            files[1].write_record(second, separator)?;
        }

        Ok(RunSummary::new(
            RunKind::Reconcile,
            read_first + read_second,
            paired.len(),
        ))
    })?;

    summary.write_stats_file(&mut files[2])?;
    summary.report();
    Ok(summary)
}
