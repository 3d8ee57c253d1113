//! Command-line front end for skew correction.
//!
//! Subcommands:
//! - `convert`: Correct many programs into an `output` directory next to each
//! - `run`: Correct a single program
//! - `matrix`: Show the angles and correction matrix derived from the settings

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use skewcorr::calibration::CalibrationReport;
use skewcorr::convert::{self, ConvertOptions};
use skewcorr::settings::{DEFAULT_SETTINGS_FILE, Settings};
use skewcorr::transform::diagnostics::TracingSink;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Skew correction for motion programs
#[derive(Parser, Debug)]
#[command(name = "skewcorr")]
#[command(about = "Corrects motion programs for a machine with non-perpendicular axes")]
#[command(version)]
struct Args {
    /// Append log output to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log every processed line
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct programs into an `output` directory next to each input
    Convert {
        /// Settings document with calibration measurements and limits
        #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
        settings: PathBuf,

        /// Do not write the provenance header
        #[arg(long)]
        no_header: bool,

        /// Programs to correct
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Correct a single program
    Run {
        /// Program to correct
        input: PathBuf,

        /// Destination, defaults to `<stem>_M_.<ext>` next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Settings document with calibration measurements and limits
        #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
        settings: PathBuf,

        /// Do not write the provenance header
        #[arg(long)]
        no_header: bool,
    },

    /// Print the derived inter-axis angles and correction matrix
    Matrix {
        /// Settings document with calibration measurements and limits
        #[arg(short, long, default_value = DEFAULT_SETTINGS_FILE)]
        settings: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load(path).with_context(|| format!("loading settings from {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.verbose)?;

    match args.command {
        Command::Convert { settings, no_header, files } => {
            let settings = load_settings(&settings)?;
            let options = ConvertOptions { header: !no_header };

            let results = convert::convert_batch(&settings, &files, &options)?;
            let mut failed = 0;

            for (src, result) in files.iter().zip(results) {
                match result {
                    Ok(report) => println!(
                        "Converted {} to {} ({} lines, {} limit warnings)",
                        report.source.display(),
                        report.destination.display(),
                        report.lines,
                        report.warnings
                    ),
                    Err(err) => {
                        error!("{}", err);
                        eprintln!("Failed to convert {}: {}", src.display(), err);
                        failed += 1;
                    }
                }
            }

            if failed > 0 {
                bail!("{} of {} files failed to convert", failed, files.len());
            }
        }

        Command::Run { input, output, settings, no_header } => {
            let settings = load_settings(&settings)?;
            let correction = settings.correction()?;
            let output = output.unwrap_or_else(|| convert::sibling_output_path(&input));
            let options = ConvertOptions { header: !no_header };

            println!("Converting {} to {}", input.display(), output.display());
            let report = convert::convert_file(&correction, settings.limits(), &input, &output, &options, TracingSink)?;
            info!("{} lines written, {} limit warnings", report.lines, report.warnings);
        }

        Command::Matrix { settings, json } => {
            let settings = load_settings(&settings)?;
            let report = CalibrationReport::from_input(settings.calibration())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let [ab, ac, bc] = report.angles_deg;
                println!("angle between x and y: {:.4}°", ab);
                println!("angle between x and z: {:.4}°", ac);
                println!("angle between y and z: {:.4}°", bc);
                println!("correction matrix:");
                for row in report.matrix {
                    println!("  [{:>12.8} {:>12.8} {:>12.8}]", row[0], row[1], row[2]);
                }
            }
        }
    }

    Ok(())
}
