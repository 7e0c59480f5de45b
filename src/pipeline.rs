use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use bytes::{BufMut, Bytes, BytesMut};
use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info};

use crate::{eval, scan};

/// Smallest read buffer; the file's reported length only grows it.
const MIN_READ_CAPACITY: usize = 512;

#[derive(Error, Debug, Diagnostic)]
pub enum PipelineError {
    #[error("reading `{}` failed: {source}", .path.display())]
    #[diagnostic(code(line_calc::read_input))]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("creating `{}` failed: {source}", .path.display())]
    #[diagnostic(code(line_calc::create_output))]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writing `{}` failed: {source}", .path.display())]
    #[diagnostic(code(line_calc::write_output))]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("clearing `{}` failed: {source}", .path.display())]
    #[diagnostic(
        code(line_calc::clear_output),
        help("check that the output path is a writable file")
    )]
    ClearOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Line counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub scanned: usize,
    pub written: usize,
    pub skipped: usize,
}

/// Empties `path` if something already exists there. A missing path is left
/// alone.
pub fn clear_output(path: &Path) -> Result<(), PipelineError> {
    if fs::metadata(path).is_err() {
        return Ok(());
    }
    fs::write(path, b"").map_err(|source| PipelineError::ClearOutput {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the whole file. The reported length is only a capacity hint: the
/// buffer keeps growing until EOF.
pub fn read_input(path: &Path) -> io::Result<Bytes> {
    let mut file = File::open(path)?;
    let hint = file
        .metadata()
        .ok()
        .and_then(|metadata| usize::try_from(metadata.len()).ok())
        .unwrap_or(0);

    let capacity = hint.saturating_add(1).max(MIN_READ_CAPACITY);
    let mut buffer = BytesMut::with_capacity(capacity).writer();
    io::copy(&mut file, &mut buffer)?;

    Ok(buffer.into_inner().freeze())
}

/// Evaluates every line of `input` and writes `label=result` for the ones that
/// succeed. Lines that fail to evaluate are skipped.
///
/// Each scanned line loses its last byte before evaluation, and the label
/// loses one more.
pub fn process<W: Write>(input: Bytes, mut out: W) -> io::Result<Report> {
    let mut report = Report::default();

    for (index, line) in scan::Lines::new(input).enumerate() {
        let line_number = index + 1;
        report.scanned += 1;

        let Some(expression) = scan::trim_last(&line) else {
            debug!(line = line_number, "skipping empty line");
            report.skipped += 1;
            continue;
        };

        match eval::calculate(expression) {
            Ok(value) => {
                // a successful match is at least three bytes long
                let label = scan::trim_last(expression).unwrap_or_default();
                out.write_all(label)?;
                writeln!(out, "={value}")?;
                report.written += 1;
            }
            Err(e) => {
                debug!(line = line_number, error = %e, "skipping line");
                report.skipped += 1;
            }
        }
    }

    out.flush()?;
    Ok(report)
}

/// Reads `input`, then truncates or creates `output` and fills it.
///
/// The input is read before the output is opened, so a missing input never
/// creates the output file.
#[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn process_file(input: &Path, output: &Path) -> Result<Report, PipelineError> {
    let buffer = read_input(input).map_err(|source| PipelineError::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;
    debug!(bytes = buffer.len(), "read input");

    let file = File::create(output).map_err(|source| PipelineError::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;

    let report = process(buffer, BufWriter::new(file)).map_err(|source| {
        PipelineError::WriteOutput {
            path: output.to_path_buf(),
            source,
        }
    })?;

    info!(
        scanned = report.scanned,
        written = report.written,
        skipped = report.skipped,
        "processed file"
    );

    Ok(report)
}
