use std::path::PathBuf;

use thiserror::Error;

use crate::settings::error::SettingsError;

///
/// All errors emitted while converting program files.
///
/// - `OpenSource`: When the source program cannot be opened. Nothing has been created yet.
///     Parameters:
///     - `path`: The source path
///     - `source`: The underlying I/O error
/// - `CreateDestination`: When the destination (or its directory) cannot be created
///     Parameters:
///     - `path`: The destination path
///     - `source`: The underlying I/O error
/// - `Read`: When reading the source fails part way. The partial output is removed.
///     Parameters:
///     - `path`: The source path
///     - `line`: The 1-based line that could not be read
///     - `source`: The underlying I/O error
/// - `Write`: When writing or finalising the destination fails. The partial output is removed.
///     Parameters:
///     - `path`: The destination path
///     - `source`: The underlying I/O error
/// - `Settings`: When the settings could not be loaded or solved
///
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Could not open source file {}: {}", .path.display(), .source)]
    OpenSource { path: PathBuf, source: std::io::Error },

    #[error("Could not create destination file {}: {}", .path.display(), .source)]
    CreateDestination { path: PathBuf, source: std::io::Error },

    #[error("Could not read line {} of {}: {}", .line, .path.display(), .source)]
    Read { path: PathBuf, line: usize, source: std::io::Error },

    #[error("Could not write destination file {}: {}", .path.display(), .source)]
    Write { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
