use crate::error::{MalformedReason, PipelineError};
use crate::record::{QualityScoring, Record};
use std::io::{BufRead, ErrorKind};
use std::path::PathBuf;

/// Streams four-line FASTQ records from a buffered reader.
///
/// Every record is exactly four lines. `\n` and `\r\n` terminators are
/// stripped, and the last line of the stream may be unterminated. Blank
/// lines are tolerated only at the very end of the stream.
pub struct FastqRecords<R> {
    reader: R,
    path: PathBuf,
    scoring: QualityScoring,
    lines: u64,
    eof: bool,
}

impl<R: BufRead> FastqRecords<R> {
    /// `path` is only used to label errors.
    pub fn new(reader: R, path: impl Into<PathBuf>, scoring: QualityScoring) -> Self {
        Self {
            reader,
            path: path.into(),
            scoring,
            lines: 0,
            eof: false,
        }
    }

    /// Reads one line into `buf`, returning false at end of stream.
    fn read_line_trim_newline(&mut self, buf: &mut String) -> Result<bool, PipelineError> {
        buf.clear();
        let n = self
            .reader
            .read_line(buf)
            .map_err(|source| match source.kind() {
                ErrorKind::InvalidData => PipelineError::MalformedRecord {
                    path: self.path.clone(),
                    line: self.lines + 1,
                    reason: MalformedReason::InvalidUtf8,
                },
                _ => PipelineError::Io {
                    path: self.path.clone(),
                    source,
                },
            })?;
        if n == 0 {
            return Ok(false);
        }

        self.lines += 1;
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(true)
    }

    /// Reads a line that must exist because a record is in progress.
    fn read_required_line(&mut self) -> Result<String, PipelineError> {
        let mut line = String::new();
        if !self.read_line_trim_newline(&mut line)? {
            return Err(PipelineError::TruncatedRecord {
                path: self.path.clone(),
                line: self.lines,
            });
        }
        Ok(line)
    }

    /// Reads the identifier line. `None` means a clean end of stream.
    fn read_header(&mut self) -> Result<Option<String>, PipelineError> {
        let mut id = String::new();
        if !self.read_line_trim_newline(&mut id)? {
            return Ok(None);
        }
        if !id.is_empty() {
            return Ok(Some(id));
        }

        // a blank id line is fine only if nothing but blank lines follow
        let blank_line = self.lines;
        let mut rest = String::new();
        while self.read_line_trim_newline(&mut rest)? {
            if !rest.is_empty() {
                return Err(PipelineError::MalformedRecord {
                    path: self.path.clone(),
                    line: blank_line,
                    reason: MalformedReason::EmptyId,
                });
            }
        }
        Ok(None)
    }

    fn read_record(&mut self) -> Result<Option<Record>, PipelineError> {
        let Some(id) = self.read_header()? else {
            return Ok(None);
        };
        let start_line = self.lines;

        let sequence = self.read_required_line()?;
        let separator = self.read_required_line()?;
        let quality = self.read_required_line()?;

        if !separator.starts_with('+') {
            warn!(
                "{}:{}: separator line does not start with '+'",
                self.path.display(),
                start_line + 2
            );
        }

        Record::new(id, sequence, separator, quality, &self.scoring)
            .map(Some)
            .map_err(|reason| PipelineError::MalformedRecord {
                path: self.path.clone(),
                line: start_line,
                reason,
            })
    }
}

impl<R: BufRead> Iterator for FastqRecords<R> {
    type Item = Result<Record, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            return None;
        }

        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.eof = true;
                None
            }
            Err(e) => {
                // a malformed stream is not resumed
                self.eof = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Result<Record, PipelineError>> {
        FastqRecords::new(input.as_bytes(), "test.fastq", QualityScoring::default()).collect()
    }

    #[test]
    fn parses_records() {
        let records = parse("@r1\nACGT\n+\nIIII\n@r2 extra\nGG\n+r2 extra\n##\n");
        let records: Vec<Record> = records.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "@r1");
        assert_eq!(records[0].sequence(), "ACGT");
        assert_eq!(records[1].id(), "@r2 extra");
        assert_eq!(records[1].separator(), "+r2 extra");
        assert_eq!(records[1].quality(), "##");
    }

    #[test]
    fn accepts_missing_final_newline_and_crlf() {
        let records = parse("@r1\r\nACGT\r\n+\r\nIIII");
        assert_eq!(records.len(), 1);
        let r = records.into_iter().next().unwrap().unwrap();
        assert_eq!(r.quality(), "IIII");
    }

    #[test]
    fn empty_input_has_no_records() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }

    #[test]
    fn trailing_blank_lines_are_ignored() {
        assert_eq!(parse("@r1\nA\n+\nI\n\n\n").len(), 1);
    }

    #[test]
    fn truncated_final_record() {
        let mut records = parse("@r1\nA\n+\nI\n@r2\nAC\n");
        assert!(records.remove(0).is_ok());
        match records.remove(0) {
            Err(PipelineError::TruncatedRecord { line, .. }) => assert_eq!(line, 6),
            other => panic!("expected truncated record, got {other:?}"),
        }
        assert!(records.is_empty());
    }

    #[test]
    fn length_mismatch_stops_the_stream() {
        let records = parse("@r1\nACGT\n+\nIII\n@r2\nA\n+\nI\n");
        assert_eq!(records.len(), 1);
        match &records[0] {
            Err(PipelineError::MalformedRecord { line, reason, .. }) => {
                assert_eq!(*line, 1);
                assert_eq!(*reason, MalformedReason::LengthMismatch { seq: 4, qual: 3 });
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn non_utf8_bytes_are_malformed() {
        let input: &[u8] = b"@r1\nAC\xffT\n+\nIIII\n";
        let records: Vec<_> =
            FastqRecords::new(input, "test.fastq", QualityScoring::default()).collect();

        assert_eq!(records.len(), 1);
        match &records[0] {
            Err(PipelineError::MalformedRecord { line, reason, .. }) => {
                assert_eq!(*line, 2);
                assert_eq!(*reason, MalformedReason::InvalidUtf8);
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn blank_id_before_more_data_is_malformed() {
        let records = parse("@r1\nA\n+\nI\n\nACGT\n+\nIIII\n");
        assert_eq!(records.len(), 2);
        assert!(matches!(
            records[1],
            Err(PipelineError::MalformedRecord {
                reason: MalformedReason::EmptyId,
                line: 5,
                ..
            })
        ));
    }
}
