//! Report sinks (CSV, JSON) and per-trace summary statistics

use crate::config::OutputFormat;
use anyhow::Result;
use canopen_trace_decoder::report::HEADER;
use canopen_trace_decoder::{Decoder, ParsedTrace, ReportConfig, ReportRow, TraceFormat};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Counts collected while a trace is written
#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    pub format: TraceFormat,
    pub frames: usize,
    pub skipped_lines: usize,
    /// CANopen messages whose payload did not fit their object
    pub malformed: usize,
    /// Frames per CANopen function code name
    pub per_function: BTreeMap<&'static str, usize>,
}

impl TraceSummary {
    fn new(trace: &ParsedTrace) -> Self {
        Self {
            format: trace.format,
            frames: 0,
            skipped_lines: trace.skipped_lines,
            malformed: 0,
            per_function: BTreeMap::new(),
        }
    }

    /// Log the summary of one converted trace
    pub fn log(&self, source: &Path, destination: &Path) {
        log::info!(
            "{:?} ({}) -> {:?}: {} frames, {} skipped lines, {} malformed",
            source,
            self.format,
            destination,
            self.frames,
            self.skipped_lines,
            self.malformed
        );
        for (function, count) in &self.per_function {
            log::debug!("  {:<8} {}", function, count);
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a TraceSummary,
    rows: &'a [ReportRow],
}

/// Interpret a parsed trace and write its report
pub fn write_report<W: Write>(
    decoder: &Decoder,
    trace: &ParsedTrace,
    config: &ReportConfig,
    format: OutputFormat,
    writer: W,
) -> Result<TraceSummary> {
    let mut summary = TraceSummary::new(trace);

    let rows = decoder.interpret_all(trace).map(|(frame, message)| {
        summary.frames += 1;
        if message.malformed {
            summary.malformed += 1;
        }
        *summary.per_function.entry(message.function.name()).or_insert(0) += 1;
        ReportRow::new(frame, &message, config)
    });

    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::WriterBuilder::new()
                .delimiter(b';')
                .quote(b'\'')
                .has_headers(false)
                .from_writer(writer);

            csv_writer.write_record(HEADER)?;
            for row in rows {
                csv_writer.write_record(row.fields())?;
            }
            csv_writer.flush()?;
        }
        OutputFormat::Json => {
            let rows: Vec<ReportRow> = rows.collect();
            serde_json::to_writer_pretty(
                writer,
                &JsonReport {
                    summary: &summary,
                    rows: &rows,
                },
            )?;
        }
    }

    Ok(summary)
}

/// Report file for a trace: `trace.trc` becomes `trace.trc.csv` next to it or in `output_dir`
///
/// The extension is appended to the full file name, so a `.csv` trace never maps onto itself.
pub fn output_path(source: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let mut name = source.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(format.extension());
    match output_dir {
        Some(dir) => dir.join(name),
        None => source.with_file_name(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopen_trace_decoder::DecoderConfig;

    const TRACE: &str = ";$FILEVERSION=1.1
;$STARTTIME=43787.6003871181
;   Generated by PCAN-View v4.2.1.533
     1)         0.0  Tx         0000  2  01 00
     2)         1.5  Rx         0705  2  05 00
     3)         2.0  Rx         0605  8  40 18 10 01 00 00 00 00
     4)         2.5  Rx         0705  1  X5
";

    fn parse(decoder: &Decoder) -> ParsedTrace {
        decoder.parse_str(TRACE, &DecoderConfig::new()).unwrap()
    }

    #[test]
    fn test_csv_report() {
        let decoder = Decoder::new();
        let trace = parse(&decoder);
        let config = ReportConfig::new().with_decimal_separator(',');

        let mut out = Vec::new();
        let summary = write_report(&decoder, &trace, &config, OutputFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Message Number;Time [ms];ID;DLC;Data Bytes;CANopen"));
        assert_eq!(lines[1], "1;0,000;0x0000;2;[0x01 0x00];NMT;-;-;-;NMT Start all nodes;;;");
        assert!(lines[3].contains(";SDO_R;5;0x1018;1;client: initiate upload request;"));

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.per_function.get("ERR_CTRL"), Some(&1));
    }

    #[test]
    fn test_json_report() {
        let decoder = Decoder::new();
        let trace = parse(&decoder);

        let mut out = Vec::new();
        write_report(&decoder, &trace, &ReportConfig::default(), OutputFormat::Json, &mut out)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["summary"]["frames"], 3);
        assert_eq!(value["summary"]["format"], "PcanView11");
        assert_eq!(value["rows"][0]["Interpretation"], "NMT Start all nodes");
        assert_eq!(value["rows"][2]["Index"], "0x1018");
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("logs/trace.trc"), None, OutputFormat::Csv),
            PathBuf::from("logs/trace.trc.csv")
        );
        assert_eq!(
            output_path(Path::new("logs/trace.trc"), Some(Path::new("out")), OutputFormat::Json),
            PathBuf::from("out/trace.trc.json")
        );
        assert_eq!(
            output_path(Path::new("minimon"), None, OutputFormat::Csv),
            PathBuf::from("minimon.csv")
        );
        // IXXAT traces are CSV files themselves
        assert_eq!(
            output_path(Path::new("logs/minimon.csv"), None, OutputFormat::Csv),
            PathBuf::from("logs/minimon.csv.csv")
        );
    }
}
