use crate::error::PipelineError;
use crate::filter::FilterOpts;
use crate::io::{MatePaths, SeparatorPolicy};
use crate::record::{MeanQuality, QualityScoring};
use crate::store::DedupKey;
use clap::builder::styling::{AnsiColor, Style};
use clap::builder::Styles;
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
🧹 readtidy version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   deduplicate, filter and reconcile FASTQ reads";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

pub const BANNER: Style = AnsiColor::Green.on_default().bold();

/// Wraps `text` in the escape codes for `style` when stdout is a terminal.
pub fn paint(text: &str, style: Style) -> String {
    if std::io::stdout().is_terminal() {
        format!("{}{text}{}", style.render(), style.render_reset())
    } else {
        text.to_string()
    }
}

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    styles = STYLES
)]
pub struct Cli {
    /// also write the run summary as JSON to this file
    #[arg(long, global = true)]
    pub summary_json: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remove exact duplicate reads, keeping the last occurrence of each
    #[command(arg_required_else_help = true)]
    Dedup {
        /// the input .fastq
        input: PathBuf,

        /// the output .fastq
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        common: DedupArgs,
    },

    /// Remove duplicate mate pairs from two synchronised .fastq files
    #[command(arg_required_else_help = true)]
    DedupPaired {
        #[command(flatten)]
        mates: MateArgs,

        #[command(flatten)]
        common: DedupArgs,
    },

    /// Keep reads that pass the length and base quality thresholds
    #[command(arg_required_else_help = true)]
    Qc {
        /// the input .fastq
        input: PathBuf,

        /// the output .fastq
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        common: QcArgs,
    },

    /// Keep mate pairs where both mates pass the quality thresholds
    #[command(arg_required_else_help = true)]
    QcPaired {
        #[command(flatten)]
        mates: MateArgs,

        #[command(flatten)]
        common: QcArgs,
    },

    /// Keep only reads whose identifier line is present in both mate files
    #[command(arg_required_else_help = true)]
    Reconcile {
        #[command(flatten)]
        mates: MateArgs,

        /// the output stats file
        #[arg(short, long, default_value = "stats.tsv")]
        stats: PathBuf,

        /// how to write the third line of each record
        #[arg(long, value_enum, default_value_t = SeparatorPolicy::Verbatim)]
        separator: SeparatorPolicy,
    },

    /// Write length, GC content and average quality for every read
    #[command(arg_required_else_help = true)]
    Stats {
        /// the input .fastq
        input: PathBuf,

        /// the output .tsv
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        scoring: ScoringArgs,
    },
}

#[derive(Args)]
pub struct MateArgs {
    /// the forward (mate 1) .fastq
    pub first: PathBuf,

    /// the reverse (mate 2) .fastq
    pub second: PathBuf,

    /// the forward output .fastq
    #[arg(long)]
    pub out1: PathBuf,

    /// the reverse output .fastq
    #[arg(long)]
    pub out2: PathBuf,
}

impl MateArgs {
    pub fn inputs(&self) -> MatePaths<'_> {
        MatePaths {
            first: &self.first,
            second: &self.second,
        }
    }

    pub fn outputs(&self) -> MatePaths<'_> {
        MatePaths {
            first: &self.out1,
            second: &self.out2,
        }
    }
}

#[derive(Args)]
pub struct ScoringArgs {
    /// ASCII offset of the quality scores, 33 or 64
    #[arg(long, default_value_t = 33, value_parser = parse_phred)]
    pub phred: u8,

    /// how the per-read average quality is computed
    #[arg(long, value_enum, default_value_t = MeanQuality::Probabilistic)]
    pub mean: MeanQuality,
}

impl ScoringArgs {
    pub fn scoring(&self) -> QualityScoring {
        QualityScoring {
            phred_offset: self.phred,
            mean: self.mean,
        }
    }
}

#[derive(Args)]
pub struct DedupArgs {
    /// the output stats file
    #[arg(short, long, default_value = "stats.tsv")]
    pub stats: PathBuf,

    /// the field that decides whether two reads are duplicates
    #[arg(long, value_enum, default_value_t = DedupKey::Sequence)]
    pub key: DedupKey,

    /// how to write the third line of each record
    #[arg(long, value_enum, default_value_t = SeparatorPolicy::Verbatim)]
    pub separator: SeparatorPolicy,
}

#[derive(Args)]
pub struct QcArgs {
    /// the output stats file
    #[arg(short, long, default_value = "stats.tsv")]
    pub stats: PathBuf,

    /// minimum Phred score for a base to count as good
    #[arg(short = 'q', long, default_value_t = 20, allow_negative_numbers = true)]
    pub min_quality: i32,

    /// fraction of bases in a read that must be good, within [0, 1]
    #[arg(short = 'p', long, default_value_t = 0.5, value_parser = parse_proportion)]
    pub min_proportion: f64,

    /// reads shorter than this are dropped
    #[arg(short = 'l', long, default_value_t = 0)]
    pub min_length: usize,

    /// also drop reads containing an ambiguous base (N or n)
    #[arg(long, action)]
    pub reject_ambiguous: bool,

    /// how to write the third line of each record
    #[arg(long, value_enum, default_value_t = SeparatorPolicy::Normalize)]
    pub separator: SeparatorPolicy,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

impl QcArgs {
    pub fn filter_opts(&self) -> Result<FilterOpts, PipelineError> {
        FilterOpts::new(
            self.scoring.phred,
            self.min_quality,
            self.min_proportion,
            self.min_length,
            self.reject_ambiguous,
        )
    }
}

fn parse_phred(arg: &str) -> Result<u8, String> {
    match arg.trim().parse::<u8>() {
        Ok(v @ (33 | 64)) => Ok(v),
        _ => Err(indoc::formatdoc! {"
            {}. Use 33 for Sanger/Illumina 1.8+ data, or 64 for older \
            Illumina data, as in:
              --phred 33
            ",
            PipelineError::invalid_parameter("phred offset", arg, "must be 33 or 64")
        }),
    }
}

fn parse_proportion(arg: &str) -> Result<f64, String> {
    match arg.trim().parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(indoc::formatdoc! {"
            {}. The proportion is a fraction of the read, as in:
              --min-proportion 0.5
              --min-proportion 1
            ",
            PipelineError::invalid_parameter("minimum proportion", arg, "must be a number within [0, 1]")
        }),
    }
}
