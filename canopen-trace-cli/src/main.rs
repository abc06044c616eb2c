//! CANopen Trace Interpreter CLI Application
//!
//! This is the command-line interface for the CANopen trace decoder.
//! It uses the canopen-trace-decoder library and adds:
//! - TOML configuration with command-line overrides
//! - Parallel conversion of many trace files
//! - CSV and JSON report files
//! - Per-trace summary statistics

use anyhow::{bail, Context, Result};
use canopen_trace_decoder::{Decoder, DecoderConfig, ReportConfig, TimeBase};
use clap::Parser;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputFormat};

/// CANopen Trace Interpreter - Interpret CAN traces as CANopen messages
#[derive(Parser, Debug)]
#[command(name = "canopen-trace-cli")]
#[command(about = "Interpret PCAN-View and IXXAT MiniMon traces as CANopen messages", long_about = None)]
#[command(version)]
struct Args {
    /// Trace files to convert (PCAN-View 1.1/2.1, IXXAT MiniMon V3)
    #[arg(value_name = "SOURCES")]
    sources: Vec<PathBuf>,

    /// Output file (only with a single source; default: <source>.csv)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to EDS file(s) used to name SDO objects (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    eds: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Decimal separator for timestamps
    #[arg(long, value_name = "CHAR")]
    decimal_separator: Option<char>,

    /// Timestamp reference for wall-clock traces
    #[arg(long, value_name = "BASE", value_parser = parse_time_base)]
    time_base: Option<TimeBase>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// Effective settings after merging config file and flags
struct Settings {
    sources: Vec<PathBuf>,
    eds_files: Vec<PathBuf>,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
    decoder: DecoderConfig,
    report: ReportConfig,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CANopen Trace Interpreter CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", canopen_trace_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let settings = merge_settings(args, app_config)?;

    // Create decoder and load object dictionaries
    let mut decoder = Decoder::new();
    for eds in &settings.eds_files {
        decoder
            .add_eds(eds)
            .with_context(|| format!("Failed to load EDS file {:?}", eds))?;
    }
    let stats = decoder.dictionary_stats();
    if stats.num_entries > 0 {
        log::info!(
            "Object dictionary: {} objects, {} entries",
            stats.num_objects,
            stats.num_entries
        );
    }

    let results: Vec<(&PathBuf, Result<()>)> = settings
        .sources
        .par_iter()
        .map(|source| (source, convert(&decoder, source, &settings)))
        .collect();

    let mut converted = 0usize;
    for (source, result) in &results {
        match result {
            Ok(()) => converted += 1,
            Err(e) => log::error!("{:?}: {:#}", source, e),
        }
    }

    log::info!("Converted {} of {} trace files", converted, results.len());
    if converted == 0 {
        bail!("No trace file could be converted");
    }

    Ok(())
}

impl Settings {
    /// Report file written for one source
    fn destination(&self, source: &Path) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => report::output_path(source, self.output_dir.as_deref(), self.format),
        }
    }

    /// Every source must get its own report, and no report may replace a source
    fn check_destinations(&self) -> Result<()> {
        let sources: HashSet<PathBuf> = self.sources.iter().map(|s| resolve(s)).collect();
        let mut seen = HashSet::new();
        for source in &self.sources {
            let destination = self.destination(source);
            let resolved = resolve(&destination);
            if sources.contains(&resolved) {
                bail!("Report file {:?} would overwrite a trace file", destination);
            }
            if !seen.insert(resolved) {
                bail!("Several trace files would be written to {:?}", destination);
            }
        }
        Ok(())
    }
}

/// Absolute form of a path whose file may not exist yet
fn resolve(path: &Path) -> PathBuf {
    if let Ok(full) = path.canonicalize() {
        return full;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Apply command-line flags on top of the configuration file
fn merge_settings(args: Args, config: AppConfig) -> Result<Settings> {
    let sources = if args.sources.is_empty() {
        config.input.files
    } else {
        args.sources
    };
    if sources.is_empty() {
        bail!("No trace files given (pass SOURCES or set [input] files in the config)");
    }
    if args.output.is_some() && sources.len() > 1 {
        bail!("--output can only be used with a single source");
    }

    let mut eds_files = config.input.eds_files;
    eds_files.extend(args.eds);

    let mut decoder = config.decoder;
    if let Some(time_base) = args.time_base {
        decoder = decoder.with_time_base(time_base);
    }

    let mut report = config.report;
    if let Some(separator) = args.decimal_separator {
        report = report.with_decimal_separator(separator);
    }

    let settings = Settings {
        sources,
        eds_files,
        output: args.output,
        output_dir: config.output.output_dir,
        format: args.format.unwrap_or(config.output.format),
        decoder,
        report,
    };
    settings.check_destinations()?;
    Ok(settings)
}

/// Convert one trace file into a report file
fn convert(decoder: &Decoder, source: &Path, settings: &Settings) -> Result<()> {
    let trace = decoder
        .read_file(source, &settings.decoder)
        .with_context(|| format!("Failed to read trace {:?}", source))?;

    for diagnostic in &trace.diagnostics {
        log::debug!("{:?} {}", source, diagnostic);
    }

    let destination = settings.destination(source);
    if resolve(&destination) == resolve(source) {
        bail!("Report file {:?} is the trace itself", destination);
    }

    let file = File::create(&destination)
        .with_context(|| format!("Failed to create report file {:?}", destination))?;
    let summary = report::write_report(
        decoder,
        &trace,
        &settings.report,
        settings.format,
        BufWriter::new(file),
    )
    .with_context(|| format!("Failed to write report file {:?}", destination))?;

    summary.log(source, &destination);
    Ok(())
}

fn parse_time_base(value: &str) -> std::result::Result<TimeBase, String> {
    match value.to_ascii_lowercase().as_str() {
        "midnight" => Ok(TimeBase::Midnight),
        "first" => Ok(TimeBase::First),
        other => Err(format!("unknown time base '{}' (midnight, first)", other)),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
