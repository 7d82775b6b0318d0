use crate::error::MalformedReason;
use crate::store::DedupKey;
use serde::Serialize;

/// Token joining the two mate sequences of a sequence-keyed pair.
pub const PAIR_SEQUENCE_JOIN: &str = "}{";

/// How a read's average quality is summarised.
///
/// `Simple` is the arithmetic mean of the offset-adjusted Phred scores.
/// `Probabilistic` averages the per-base error probabilities `10^(-Q/10)`
/// and converts the mean back to a Phred score.
#[derive(clap::ValueEnum, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeanQuality {
    Simple,
    #[default]
    Probabilistic,
}

/// Quality encoding used when deriving per-read statistics.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityScoring {
    pub phred_offset: u8,
    pub mean: MeanQuality,
}

impl Default for QualityScoring {
    fn default() -> Self {
        Self {
            phred_offset: 33,
            mean: MeanQuality::default(),
        }
    }
}

impl QualityScoring {
    /// Phred score of a single quality character. May be negative when the
    /// data was encoded with a lower offset than the one configured.
    #[inline]
    pub fn score(&self, q: u8) -> i32 {
        q as i32 - self.phred_offset as i32
    }

    /// Average quality of a quality string, `0` for an empty read.
    pub fn average(&self, quality: &[u8]) -> f64 {
        if quality.is_empty() {
            return 0.0;
        }
        let n = quality.len() as f64;

        match self.mean {
            MeanQuality::Simple => {
                let total: i64 = quality.iter().map(|q| self.score(*q) as i64).sum();
                total as f64 / n
            }
            MeanQuality::Probabilistic => {
                let total: f64 = quality
                    .iter()
                    .map(|q| 10f64.powf(-(self.score(*q) as f64) / 10.0))
                    .sum();
                -10.0 * (total / n).log10()
            }
        }
    }
}

/// One FASTQ read. The derived statistics are computed once in `new` and the
/// record is not mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    sequence: String,
    separator: String,
    quality: String,
    gc_content: f64,
    average_quality: f64,
}

impl Record {
    /// Builds a record from its four lines (terminators already removed).
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedReason`] if the identifier is empty or if the
    /// quality string is not the same length as the sequence.
    pub fn new(
        id: String,
        sequence: String,
        separator: String,
        quality: String,
        scoring: &QualityScoring,
    ) -> Result<Self, MalformedReason> {
        if id.is_empty() {
            return Err(MalformedReason::EmptyId);
        }
        if sequence.len() != quality.len() {
            return Err(MalformedReason::LengthMismatch {
                seq: sequence.len(),
                qual: quality.len(),
            });
        }

        let gc_content = gc_percent(sequence.as_bytes());
        let average_quality = scoring.average(quality.as_bytes());

        Ok(Record {
            id,
            sequence,
            separator,
            quality,
            gc_content,
            average_quality,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn gc_content(&self) -> f64 {
        self.gc_content
    }

    pub fn average_quality(&self) -> f64 {
        self.average_quality
    }

    /// Whether the read contains an ambiguous base (`N` or `n`).
    pub fn has_ambiguous_base(&self) -> bool {
        self.sequence.bytes().any(|b| b == b'N' || b == b'n')
    }
}

/// Percentage of uppercase `G`/`C` bases; `0` for an empty sequence.
fn gc_percent(sequence: &[u8]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc = sequence.iter().filter(|b| matches!(b, b'G' | b'C')).count();
    gc as f64 / sequence.len() as f64 * 100.0
}

/// Forward and reverse mates read from the same line group of two files.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRecord {
    pub first: Record,
    pub second: Record,
    pair_key: String,
}

impl PairedRecord {
    pub fn new(first: Record, second: Record, key: DedupKey) -> Self {
        let pair_key = match key {
            DedupKey::Id => first.id().to_string(),
            DedupKey::Sequence => {
                format!("{}{PAIR_SEQUENCE_JOIN}{}", first.sequence(), second.sequence())
            }
        };

        PairedRecord {
            first,
            second,
            pair_key,
        }
    }

    pub fn pair_key(&self) -> &str {
        &self.pair_key
    }
}
