pub mod fastq;

use crate::error::PipelineError;
use crate::record::{QualityScoring, Record};
pub use fastq::FastqRecords;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

const BUFFER_SIZE: usize = 256 * 1024;

pub type FileRecords = FastqRecords<BufReader<File>>;

/// Opens a FASTQ file for streaming.
pub fn open_fastq(path: &Path, scoring: QualityScoring) -> Result<FileRecords, PipelineError> {
    let file = open_input(path)?;
    Ok(FastqRecords::new(
        BufReader::with_capacity(BUFFER_SIZE, file),
        path,
        scoring,
    ))
}

/// Opens an input file, labelling failures with the path.
pub fn open_input(path: &Path) -> Result<File, PipelineError> {
    File::open(path).map_err(|source| PipelineError::FileOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Estimates the number of records in a file from its line count.
///
/// This is a separate pass over the file and assumes no field contains an
/// embedded newline. An unterminated final line still counts as a line.
pub fn count_records(path: &Path) -> Result<usize, PipelineError> {
    let file = open_input(path)?;
    let lines = count_lines(file).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(lines / 4)
}

fn count_lines<R: Read>(reader: R) -> std::io::Result<usize> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, reader);
    let mut lines = 0;
    let mut last = None;

    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            break;
        }
        lines += available.iter().filter(|b| **b == b'\n').count();
        last = available.last().copied();

        let used = available.len();
        reader.consume(used);
    }

    if matches!(last, Some(b) if b != b'\n') {
        lines += 1;
    }
    Ok(lines)
}

/// Reads two mate files in lockstep, yielding one pair per line group.
///
/// Both files must hold the same number of records; if one runs out first
/// the iterator yields [`PipelineError::MateCountMismatch`] and stops.
pub struct MatePairs<R> {
    first: FastqRecords<R>,
    second: FastqRecords<R>,
    first_path: PathBuf,
    second_path: PathBuf,
    done: bool,
}

impl<R: BufRead> MatePairs<R> {
    pub fn new(
        first: FastqRecords<R>,
        second: FastqRecords<R>,
        first_path: impl Into<PathBuf>,
        second_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            first,
            second,
            first_path: first_path.into(),
            second_path: second_path.into(),
            done: false,
        }
    }

    fn next_pair(&mut self) -> Option<Result<(Record, Record), PipelineError>> {
        match (self.first.next(), self.second.next()) {
            (None, None) => None,
            (Some(Err(e)), _) | (_, Some(Err(e))) => Some(Err(e)),
            (Some(Ok(a)), Some(Ok(b))) => Some(Ok((a, b))),
            (Some(Ok(_)), None) => Some(Err(PipelineError::MateCountMismatch {
                shorter: self.second_path.clone(),
                longer: self.first_path.clone(),
            })),
            (None, Some(Ok(_))) => Some(Err(PipelineError::MateCountMismatch {
                shorter: self.first_path.clone(),
                longer: self.second_path.clone(),
            })),
        }
    }
}

impl<R: BufRead> Iterator for MatePairs<R> {
    type Item = Result<(Record, Record), PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_pair();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Opens two mate files for lockstep reading.
pub fn open_mates(
    first: &Path,
    second: &Path,
    scoring: QualityScoring,
) -> Result<MatePairs<BufReader<File>>, PipelineError> {
    Ok(MatePairs::new(
        open_fastq(first, scoring)?,
        open_fastq(second, scoring)?,
        first,
        second,
    ))
}
