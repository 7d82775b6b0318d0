use crate::error::PipelineError;
use crate::record::Record;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// What to write on the third line of each output record.
#[derive(clap::ValueEnum, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorPolicy {
    /// copy the input separator line unchanged
    Verbatim,
    /// always write a bare `+`
    Normalize,
}

/// Formats a record as four FASTQ lines and writes it to `writer`.
///
/// With [`SeparatorPolicy::Verbatim`] the output is byte-identical to the
/// parsed input lines.
pub fn write_record(
    writer: &mut impl Write,
    record: &Record,
    separator: SeparatorPolicy,
) -> std::io::Result<()> {
    let line3 = match separator {
        SeparatorPolicy::Verbatim => record.separator(),
        SeparatorPolicy::Normalize => "+",
    };

    writeln!(
        writer,
        "{}\n{}\n{}\n{}",
        record.id(),
        record.sequence(),
        line3,
        record.quality()
    )
}

/// Paths of a forward/reverse file pair.
#[derive(Clone, Copy, Debug)]
pub struct MatePaths<'a> {
    pub first: &'a Path,
    pub second: &'a Path,
}

/// A buffered output file that labels write errors with its path.
pub struct OutputFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl OutputFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_record(
        &mut self,
        record: &Record,
        separator: SeparatorPolicy,
    ) -> Result<(), PipelineError> {
        write_record(&mut self.writer, record, separator).map_err(|e| self.io_err(e))
    }

    pub fn writer(&mut self) -> &mut BufWriter<File> {
        &mut self.writer
    }

    pub fn flush(&mut self) -> Result<(), PipelineError> {
        self.writer.flush().map_err(|e| self.io_err(e))
    }

    fn io_err(&self, source: std::io::Error) -> PipelineError {
        PipelineError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// An output file that has been opened but not yet truncated.
///
/// Discarding it removes the file if this run created it. A file that was
/// already there keeps its contents until [`PendingOutput::commit`].
pub struct PendingOutput {
    path: PathBuf,
    file: File,
    existed: bool,
}

impl PendingOutput {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let existed = path.exists();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| PipelineError::FileOpen {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(PendingOutput {
            path: path.to_path_buf(),
            file,
            existed,
        })
    }

    /// Truncates the file and hands back a writer for it.
    pub fn commit(self) -> Result<OutputFile, PipelineError> {
        self.file.set_len(0).map_err(|source| PipelineError::Io {
            path: self.path.clone(),
            source,
        })?;

        Ok(OutputFile {
            path: self.path,
            writer: BufWriter::new(self.file),
        })
    }

    pub fn discard(self) {
        let PendingOutput { path, file, existed } = self;
        drop(file);
        if !existed {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("could not remove {}: {e}", path.display());
            }
        }
    }
}

/// Creates every output file of a run.
///
/// All files are opened before any of them is truncated. If one cannot be
/// opened, the files this call created are removed again and files that
/// were already there keep their contents.
pub fn create_outputs<const N: usize>(paths: [&Path; N]) -> Result<[OutputFile; N], PipelineError> {
    let mut pending: Vec<PendingOutput> = Vec::with_capacity(N);

    for path in paths {
        match PendingOutput::open(path) {
            Ok(out) => pending.push(out),
            Err(e) => {
                pending.into_iter().for_each(PendingOutput::discard);
                return Err(e);
            }
        }
    }

    let created = pending
        .into_iter()
        .map(PendingOutput::commit)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(created
        .try_into()
        .unwrap_or_else(|_| unreachable!("one output per path")))
}

/// Flushes every output, returning the first error. All outputs are
/// flushed even if an earlier one fails.
pub fn flush_all(outputs: &mut [OutputFile]) -> Result<(), PipelineError> {
    let mut result = Ok(());
    for out in outputs.iter_mut() {
        if let Err(e) = out.flush() {
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    result
}

/// Runs `body` against the outputs and flushes them whether or not it
/// succeeded, so that records written before a failure reach the disk.
pub fn with_outputs<const N: usize, T>(
    outputs: &mut [OutputFile; N],
    body: impl FnOnce(&mut [OutputFile; N]) -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    let result = body(outputs);
    let flushed = flush_all(outputs);
    let value = result?;
    flushed?;
    Ok(value)
}
