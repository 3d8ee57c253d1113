//!
//! Program file conversion: one session per file, many files in parallel
//!

pub mod error;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::calibration::CorrectionMatrix;
use crate::hardware::AxisLimits;
use crate::settings::Settings;
use crate::transform::Session;
use crate::transform::diagnostics::{CountingSink, DiagnosticsSink, TracingSink};
use error::ConvertError;

/// The directory batch output is written into, next to each input file.
pub const OUTPUT_DIR: &str = "output";

/// Appended to the destination file name while it is being written.
pub const PARTIAL_SUFFIX: &str = ".partial";

///
/// # Fields:
/// - `header`: Whether to write the provenance comment lines (source, destination, date)
/// before the corrected program
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub header: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions { header: true }
    }
}

///
/// The outcome of a completed conversion.
///
/// # Fields:
/// - `source`: The program that was read
/// - `destination`: The corrected program that was written
/// - `lines`: The number of program lines converted, excluding the header
/// - `warnings`: The number of limit violations reported
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub lines: usize,
    pub warnings: usize,
}

///
/// Converts one program file. The output is written to `<dst>.partial` and only renamed to
/// `dst` once every line has been written and flushed, so an interrupted or failed run never
/// leaves something that looks like a finished program.
///
/// # Parameters:
/// - `correction`: The solved correction matrix
/// - `limits`: The travel limits for warnings
/// - `src`: The program to read
/// - `dst`: Where to write the corrected program
/// - `options`: Output options
/// - `sink`: Receives limit violations
///
/// # Returns:
/// - A report of the conversion
/// - A `ConvertError`; if the source cannot be opened nothing has been created
///
pub fn convert_file<S: DiagnosticsSink>(
    correction: &CorrectionMatrix,
    limits: &AxisLimits,
    src: &Path,
    dst: &Path,
    options: &ConvertOptions,
    sink: S,
) -> Result<ConvertReport, ConvertError> {
    let input = match File::open(src) {
        Ok(file) => file,
        Err(source) => return Err(ConvertError::OpenSource { path: src.to_path_buf(), source }),
    };

    if let Some(dir) = dst.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(source) = fs::create_dir_all(dir) {
            return Err(ConvertError::CreateDestination { path: dir.to_path_buf(), source });
        }
    }

    let partial = partial_path(dst);
    let output = match File::create(&partial) {
        Ok(file) => file,
        Err(source) => return Err(ConvertError::CreateDestination { path: partial, source }),
    };

    info!("Opened source file {}, destination file {}", src.display(), dst.display());

    let mut session = Session::open(*correction, limits.clone(), CountingSink::new(sink));
    let result = write_program(BufReader::new(input), BufWriter::new(output), &mut session, src, dst, options)
        .and_then(|()| {
            fs::rename(&partial, dst).map_err(|source| ConvertError::Write { path: dst.to_path_buf(), source })
        });

    let lines = session.lines_processed();
    let warnings = session.close().count();

    match result {
        Ok(()) => {
            info!("Wrote {} lines to {} ({} limit warnings)", lines, dst.display(), warnings);
            Ok(ConvertReport { source: src.to_path_buf(), destination: dst.to_path_buf(), lines, warnings })
        }
        Err(err) => {
            warn!("Conversion of {} failed after {} lines, discarding partial output", src.display(), lines);
            if let Err(remove_err) = fs::remove_file(&partial) {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove incomplete output {}: {}", partial.display(), remove_err);
                }
            }
            Err(err)
        }
    }
}

fn write_program<R: BufRead, W: Write, S: DiagnosticsSink>(
    reader: R,
    mut writer: W,
    session: &mut Session<S>,
    src: &Path,
    dst: &Path,
    options: &ConvertOptions,
) -> Result<(), ConvertError> {
    let write_err = |source: std::io::Error| ConvertError::Write { path: dst.to_path_buf(), source };

    if options.header {
        for line in provenance_header(src, dst) {
            writeln!(writer, "{}", line).map_err(write_err)?;
        }
    }

    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(source) => return Err(ConvertError::Read { path: src.to_path_buf(), line: index + 1, source }),
        };

        writeln!(writer, "{}", session.process_line(&line)).map_err(write_err)?;
    }

    writer.flush().map_err(write_err)
}

///
/// The comment lines written ahead of a corrected program.
///
pub fn provenance_header(src: &Path, dst: &Path) -> [String; 3] {
    let date = Local::now().format("%Y/%m/%d %H:%M:%S");

    [
        format!(";Source file      : {}", src.display()),
        format!(";Created file     : {}", dst.display()),
        format!(";Processing date  : {}", date),
    ]
}

///
/// # Returns:
/// - The temporary name a destination is written under, `<dst>.partial`
///
pub fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

///
/// The batch destination for an input: `<parent>/output/<stem>_<ext>`, e.g.
/// `jobs/part.nc` becomes `jobs/output/part_.nc`.
///
pub fn output_path_in_dir(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new(""));
    parent.join(OUTPUT_DIR).join(marked_file_name(input, "_"))
}

///
/// The single-file destination for an input: `<parent>/<stem>_M_<ext>`, e.g.
/// `jobs/part.nc` becomes `jobs/part_M_.nc`.
///
pub fn sibling_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new(""));
    parent.join(marked_file_name(input, "_M_"))
}

fn marked_file_name(input: &Path, marker: &str) -> OsString {
    let mut name = input.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(marker);

    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    name
}

///
/// Converts many files with one calibration. The matrix is solved once up front; each file
/// then gets its own session, and files are converted in parallel. Warnings go to `tracing`.
///
/// # Parameters:
/// - `settings`: The loaded settings
/// - `files`: The programs to convert
/// - `options`: Output options
///
/// # Returns:
/// - One result per input file, in input order
/// - A `ConvertError` if the calibration cannot be solved, before any file is touched
///
pub fn convert_batch(
    settings: &Settings,
    files: &[PathBuf],
    options: &ConvertOptions,
) -> Result<Vec<Result<ConvertReport, ConvertError>>, ConvertError> {
    let correction = settings.correction()?;

    let results = files
        .par_iter()
        .map(|src| {
            let dst = output_path_in_dir(src);
            info!("Converting {} to {}", src.display(), dst.display());
            convert_file(&correction, settings.limits(), src, &dst, options, TracingSink)
        })
        .collect();

    Ok(results)
}
