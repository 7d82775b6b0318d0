use crate::error::PipelineError;
use crate::record::Record;
use serde::Serialize;

/// A fraction in `[0, 1]` held exactly as `num / den`, where `den` is a
/// power of ten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proportion {
    num: u128,
    den: u128,
}

impl Proportion {
    const MAX_DECIMALS: usize = 18;

    /// Reads a plain decimal such as `0.07`, `.5` or `1`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (int, frac) = text.split_once('.').unwrap_or((text, ""));
        if int.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > Self::MAX_DECIMALS
            || !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let num: u128 = format!("{int}{frac}").parse().ok()?;
        let den = 10u128.pow(frac.len() as u32);
        (num <= den).then_some(Proportion { num, den })
    }

    /// The decimal `value` prints as, so `0.07` stays exactly seven hundredths.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&value) {
            return None;
        }
        let text = value.to_string();
        match text.split_once('.') {
            Some((_, frac)) if frac.len() > Self::MAX_DECIMALS => {
                Self::parse(&format!("{value:.18}"))
            }
            _ => Self::parse(&text),
        }
    }

    /// `part >= whole * self`, without rounding.
    pub fn reached_by(&self, part: usize, whole: usize) -> bool {
        part as u128 * self.den >= whole as u128 * self.num
    }
}

/// Thresholds for the quality/length filter.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct FilterOpts {
    /// ASCII offset of the quality encoding, 33 or 64
    pub phred_offset: u8,
    /// a base counts as good when its score is at least this
    pub min_quality: i32,
    /// fraction of good bases a read needs, inclusive
    pub min_proportion: f64,
    #[serde(skip)]
    threshold: Proportion,
    /// reads shorter than this are rejected
    pub min_length: usize,
    /// also reject reads containing `N`/`n`
    pub reject_ambiguous: bool,
}

impl FilterOpts {
    /// Validates the thresholds that cannot be expressed in the types.
    pub fn new(
        phred_offset: u8,
        min_quality: i32,
        min_proportion: f64,
        min_length: usize,
        reject_ambiguous: bool,
    ) -> Result<Self, PipelineError> {
        if !matches!(phred_offset, 33 | 64) {
            return Err(PipelineError::invalid_parameter(
                "phred offset",
                phred_offset,
                "must be 33 or 64",
            ));
        }
        let threshold = Proportion::from_f64(min_proportion).ok_or_else(|| {
            PipelineError::invalid_parameter(
                "minimum proportion",
                min_proportion,
                "must lie within [0, 1]",
            )
        })?;

        Ok(FilterOpts {
            phred_offset,
            min_quality,
            min_proportion,
            threshold,
            min_length,
            reject_ambiguous,
        })
    }

    /// Number of bases whose score reaches `min_quality`.
    fn bases_above_threshold(&self, read: &Record) -> usize {
        read.quality()
            .bytes()
            .filter(|q| *q as i32 - self.phred_offset as i32 >= self.min_quality)
            .count()
    }
}

/// Returns true if the read is kept.
pub fn filter(read: &Record, opts: &FilterOpts) -> bool {
    if read.len() < opts.min_length {
        return false;
    }
    if opts.reject_ambiguous && read.has_ambiguous_base() {
        return false;
    }

    let above = opts.bases_above_threshold(read);
    opts.threshold.reached_by(above, read.len())
}

/// A mate pair is kept only if both mates pass on their own.
pub fn filter_pair(first: &Record, second: &Record, opts: &FilterOpts) -> bool {
    filter(first, opts) && filter(second, opts)
}
