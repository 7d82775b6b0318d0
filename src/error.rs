use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a record was rejected by the parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("quality length ({qual}) does not match sequence length ({seq})")]
    LengthMismatch { seq: usize, qual: usize },

    #[error("empty identifier line")]
    EmptyId,

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "truncated record in {}: stream ends at line {line} before the record's four lines were read",
        path.display()
    )]
    TruncatedRecord { path: PathBuf, line: u64 },

    #[error("malformed record in {} at line {line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        reason: MalformedReason,
    },

    #[error(
        "mate files are out of step: {} ends before {}",
        shorter.display(),
        longer.display()
    )]
    MateCountMismatch { shorter: PathBuf, longer: PathBuf },

    #[error("invalid value `{value}` for {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl PipelineError {
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Completed,
    FileError,
    ParseError,
    InvalidParameter,
}

impl Termination {
    /// Classifies a failed run by the first [`PipelineError`] in the chain.
    /// Errors from outside the pipeline (e.g. writing the stats table) are
    /// file errors.
    pub fn of(err: &anyhow::Error) -> Self {
        match err.chain().find_map(|e| e.downcast_ref::<PipelineError>()) {
            Some(PipelineError::TruncatedRecord { .. })
            | Some(PipelineError::MalformedRecord { .. })
            | Some(PipelineError::MateCountMismatch { .. }) => Termination::ParseError,
            Some(PipelineError::InvalidParameter { .. }) => Termination::InvalidParameter,
            Some(PipelineError::FileOpen { .. }) | Some(PipelineError::Io { .. }) | None => {
                Termination::FileError
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Completed => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Termination::Completed => "completed",
            Termination::FileError => "file error",
            Termination::ParseError => "parse error",
            Termination::InvalidParameter => "invalid parameter",
        })
    }
}
