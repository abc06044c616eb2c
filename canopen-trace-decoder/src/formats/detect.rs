//! Trace format detection
//!
//! Detection looks only at the lead-in of a document (the first few lines joined
//! together) and matches it against one anchored signature per format. Signatures are
//! built from header tokens that only one vendor/version writes, so at most one can
//! match.

use super::TraceFormat;
use crate::types::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

lazy_static! {
    static ref SIGNATURES: Vec<(Regex, TraceFormat)> = vec![
        (
            Regex::new(r"^;\$FILEVERSION=1\.1[\s\S]*\$STARTTIME[\s\S]*Generated by").unwrap(),
            TraceFormat::PcanView11,
        ),
        (
            Regex::new(r"^;\$FILEVERSION=2\.1[\s\S]*\$STARTTIME[\s\S]*\$COLUMNS[\s\S]*Generated by")
                .unwrap(),
            TraceFormat::PcanView21,
        ),
        (
            Regex::new(r#"^"?ASCII Trace IXXAT MiniMon V3\s*"?[;\s]*"?Version:"#).unwrap(),
            TraceFormat::IxxatMiniMon3,
        ),
    ];
}

/// Select the trace format from the lead-in text of a document
///
/// # Returns
/// * `Some(format)` for the first signature that matches
/// * `None` if the document is not a recognized trace
pub fn detect_format(lead_in: &str) -> Option<TraceFormat> {
    let lead_in = lead_in.trim_start_matches('\u{feff}');
    SIGNATURES
        .iter()
        .find(|(signature, _)| signature.is_match(lead_in))
        .map(|(_, format)| *format)
}

/// Read the first `lines` lines of a file for detection
///
/// Invalid UTF-8 is replaced rather than rejected; the signatures are plain ASCII.
pub fn read_lead_in(path: &Path, lines: usize) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut lead_in = String::new();
    let mut buf = Vec::new();

    for _ in 0..lines {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        lead_in.push_str(&String::from_utf8_lossy(&buf));
    }

    Ok(lead_in)
}
