//! Trace file format detection and parsers (PCAN-View, IXXAT MiniMon)
//!
//! Each supported vendor format is a variant of the closed [`TraceFormat`] enum with one
//! pure parse function behind it. The detector picks the variant once from the lead-in
//! lines of a document; the chosen parser then turns the whole text into frame records.

use crate::config::DecoderConfig;
use crate::types::{DecoderError, FrameRecord, Result};
use serde::Serialize;
use std::fmt;

pub mod detect;
pub mod ixxat;
pub mod pcan;

pub use detect::{detect_format, read_lead_in};

/// Recognized trace formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TraceFormat {
    /// PEAK PCAN-View trace, file version 1.1
    PcanView11,
    /// PEAK PCAN-View trace, file version 2.1
    PcanView21,
    /// IXXAT MiniMon V3 ASCII trace (quoted CSV)
    IxxatMiniMon3,
}

impl TraceFormat {
    /// Human-readable format name
    pub fn name(&self) -> &'static str {
        match self {
            TraceFormat::PcanView11 => "PCAN-View 1.1",
            TraceFormat::PcanView21 => "PCAN-View 2.1",
            TraceFormat::IxxatMiniMon3 => "IXXAT MiniMon V3",
        }
    }

    /// Parse a complete document with the parser of this format
    pub fn parse(&self, text: &str, config: &DecoderConfig) -> ParsedTrace {
        match self {
            TraceFormat::PcanView11 => pcan::parse_v1_1(text, config),
            TraceFormat::PcanView21 => pcan::parse_v2_1(text, config),
            TraceFormat::IxxatMiniMon3 => ixxat::parse(text, config),
        }
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A record line that matched a format's pattern but failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiagnostic {
    /// 1-based line number in the source document
    pub line: usize,
    /// Why the line was skipped
    pub reason: String,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Outcome of parsing one document
///
/// A trace with no frames is a valid result; an unknown format never produces one.
#[derive(Debug, Clone)]
pub struct ParsedTrace {
    /// Format the document was parsed with
    pub format: TraceFormat,
    /// Frame records in document order
    pub frames: Vec<FrameRecord>,
    /// Skipped record lines (empty if diagnostics are disabled)
    pub diagnostics: Vec<LineDiagnostic>,
    /// Number of skipped record lines
    pub skipped_lines: usize,
}

impl ParsedTrace {
    /// True if the document contained no frame records
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Collects records and diagnostics while a parser walks a document
pub(crate) struct TraceBuilder {
    format: TraceFormat,
    frames: Vec<FrameRecord>,
    diagnostics: Vec<LineDiagnostic>,
    skipped_lines: usize,
    record_diagnostics: bool,
}

impl TraceBuilder {
    pub(crate) fn new(format: TraceFormat, config: &DecoderConfig) -> Self {
        Self {
            format,
            frames: Vec::new(),
            diagnostics: Vec::new(),
            skipped_lines: 0,
            record_diagnostics: config.record_diagnostics,
        }
    }

    /// Number of frames accepted so far
    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// Accept a record, or skip the line if it could not be built
    pub(crate) fn push(&mut self, line: usize, record: Result<FrameRecord>) {
        match record {
            Ok(frame) => {
                log::trace!("line {}: {:?}", line, frame);
                self.frames.push(frame);
            }
            Err(DecoderError::InvalidFrame(reason)) => self.skip(line, reason),
            Err(e) => self.skip(line, e.to_string()),
        }
    }

    pub(crate) fn skip(&mut self, line: usize, reason: String) {
        log::debug!("{}: skipping line {}: {}", self.format, line, reason);
        self.skipped_lines += 1;
        if self.record_diagnostics {
            self.diagnostics.push(LineDiagnostic { line, reason });
        }
    }

    pub(crate) fn finish(self) -> ParsedTrace {
        if self.skipped_lines > 0 {
            log::warn!(
                "{}: skipped {} malformed record line(s)",
                self.format,
                self.skipped_lines
            );
        }
        log::info!("{}: parsed {} frame(s)", self.format, self.frames.len());

        ParsedTrace {
            format: self.format,
            frames: self.frames,
            diagnostics: self.diagnostics,
            skipped_lines: self.skipped_lines,
        }
    }
}

/// Parse a run of whitespace separated 2-digit hex byte tokens
pub(crate) fn parse_data_bytes(load: &str) -> Result<Vec<u8>> {
    load.split_whitespace()
        .map(|token| {
            if token.len() != 2 {
                return Err(DecoderError::InvalidFrame(format!(
                    "malformed data byte '{}'",
                    token
                )));
            }
            u8::from_str_radix(token, 16).map_err(|_| {
                DecoderError::InvalidFrame(format!("malformed data byte '{}'", token))
            })
        })
        .collect()
}

/// Parse a hexadecimal CAN id
pub(crate) fn parse_can_id(text: &str) -> Result<u32> {
    u32::from_str_radix(text, 16)
        .map_err(|_| DecoderError::InvalidFrame(format!("malformed CAN id '{}'", text)))
}

/// Parse a decimal data length code
pub(crate) fn parse_dlc(text: &str) -> Result<u8> {
    text.parse::<u8>()
        .map_err(|_| DecoderError::InvalidFrame(format!("malformed DLC '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_bytes() {
        assert_eq!(parse_data_bytes("05 7F a0").unwrap(), vec![0x05, 0x7F, 0xA0]);
        assert_eq!(parse_data_bytes("   ").unwrap(), Vec::<u8>::new());
        assert!(parse_data_bytes("0G").is_err());
        assert!(parse_data_bytes("123").is_err());
    }

    #[test]
    fn test_builder_records_diagnostics() {
        let config = DecoderConfig::new();
        let mut builder = TraceBuilder::new(TraceFormat::PcanView11, &config);
        builder.push(3, FrameRecord::new(1, 0.0, 0x181, 1, Some(vec![0x01])));
        builder.push(4, FrameRecord::new(2, 0.0, 0x181, 2, Some(vec![0x01])));
        let trace = builder.finish();

        assert_eq!(trace.frames.len(), 1);
        assert_eq!(trace.skipped_lines, 1);
        assert_eq!(trace.diagnostics[0].line, 4);
        assert_eq!(trace.diagnostics[0].reason, "1 data bytes for DLC 2");
    }

    #[test]
    fn test_builder_without_diagnostics_still_counts() {
        let config = DecoderConfig::new().with_diagnostics(false);
        let mut builder = TraceBuilder::new(TraceFormat::IxxatMiniMon3, &config);
        builder.skip(1, "bad".to_string());
        let trace = builder.finish();

        assert!(trace.diagnostics.is_empty());
        assert_eq!(trace.skipped_lines, 1);
        assert!(trace.is_empty());
    }
}
