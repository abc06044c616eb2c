//! PCAN-View trace parsers (`.trc`, file versions 1.1 and 2.1)
//!
//! ## Version 1.1
//! ```text
//!      1)      1059.8  Rx         0701  1  05
//!      2)      1060.2  Rx         0705  1  RTR
//! ```
//! Columns: message number followed by `)`, time offset in ms, direction, hex id, DLC
//! and either the data bytes or `RTR`.
//!
//! ## Version 2.1
//! ```text
//!       1         0.000 DT 1      0701 Rx -  1    05
//!       2        10.000 RR 1      0705 Rx -  1
//! ```
//! Columns (`$COLUMNS=N,O,T,B,I,d,R,L,D`): message number, time offset, message type,
//! bus, hex id, direction, reserved, DLC, data bytes.

use super::{parse_can_id, parse_data_bytes, parse_dlc, ParsedTrace, TraceBuilder, TraceFormat};
use crate::config::DecoderConfig;
use crate::types::{DecoderError, FrameRecord, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref RE_V1_1: Regex =
        Regex::new(r"^\s*(\d+)\)\s*(\d+(?:\.\d*)?)\s+(Rx|Tx)\s+(\S+)\s+(\d+)\s*(.*)$").unwrap();
    static ref RE_V2_1: Regex = Regex::new(
        r"^\s*(\d+)\s+(\d+(?:\.\d*)?)\s+([A-Z]{2})\s+(\d+)\s+(\S+)\s+(Rx|Tx)\s+-\s+(\d+)\s*(.*)$"
    )
    .unwrap();
}

/// Parse a PCAN-View 1.1 trace
pub fn parse_v1_1(text: &str, config: &DecoderConfig) -> ParsedTrace {
    let mut builder = TraceBuilder::new(TraceFormat::PcanView11, config);

    for (idx, line) in text.lines().enumerate() {
        if let Some(caps) = RE_V1_1.captures(line) {
            builder.push(idx + 1, record_v1_1(&caps));
        }
    }

    builder.finish()
}

fn record_v1_1(caps: &Captures) -> Result<FrameRecord> {
    let sequence = parse_sequence(&caps[1])?;
    let timestamp_ms = parse_timestamp(&caps[2])?;
    let can_id = parse_can_id(&caps[4])?;
    let dlc = parse_dlc(&caps[5])?;
    let load = caps[6].trim();

    let payload = if load.starts_with("RTR") {
        None
    } else {
        Some(parse_data_bytes(load)?)
    };

    FrameRecord::new(sequence, timestamp_ms, can_id, dlc, payload)
}

/// Parse a PCAN-View 2.1 trace
///
/// Only data (`DT`) and remote request (`RR`) messages become frame records; other
/// message types (error and status events) are skipped with a diagnostic.
pub fn parse_v2_1(text: &str, config: &DecoderConfig) -> ParsedTrace {
    let mut builder = TraceBuilder::new(TraceFormat::PcanView21, config);

    for (idx, line) in text.lines().enumerate() {
        if let Some(caps) = RE_V2_1.captures(line) {
            builder.push(idx + 1, record_v2_1(&caps));
        }
    }

    builder.finish()
}

fn record_v2_1(caps: &Captures) -> Result<FrameRecord> {
    let sequence = parse_sequence(&caps[1])?;
    let timestamp_ms = parse_timestamp(&caps[2])?;
    let can_id = parse_can_id(&caps[5])?;
    let dlc = parse_dlc(&caps[7])?;
    let load = caps[8].trim();

    let payload = match &caps[3] {
        "DT" => Some(parse_data_bytes(load)?),
        "RR" => None,
        other => {
            return Err(DecoderError::InvalidFrame(format!(
                "unsupported message type '{}'",
                other
            )))
        }
    };

    FrameRecord::new(sequence, timestamp_ms, can_id, dlc, payload)
}

fn parse_sequence(text: &str) -> Result<u64> {
    text.parse::<u64>()
        .map_err(|_| DecoderError::InvalidFrame(format!("malformed message number '{}'", text)))
}

fn parse_timestamp(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| DecoderError::InvalidFrame(format!("malformed timestamp '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE_1_1: &str = ";$FILEVERSION=1.1
;$STARTTIME=43787.6003871181
;
;   Generated by PCAN-View v4.2.1.533
;
;   Message Number
;   |         Time Offset (ms)
;   |         |        Type
;   |         |        |        ID (hex)
;   |         |        |        |     Data Length Code
;   |         |        |        |     |   Data Bytes (hex) ...
;   |         |        |        |     |   |
;---+--   ----+----  --+--  ----+---  +  -+ -- -- -- -- -- -- --
     1)      1059.8  Rx         0701  1  00
     2)      1060.2  Rx         0705  1  RTR
     3)      1061.0  Tx         0601  8  40 18 10 01 00 00 00 00
     4)      1062.5  Rx         0581  8  43 18 10 01 91 01 00 00
";

    #[test]
    fn test_parse_v1_1() {
        let trace = parse_v1_1(TRACE_1_1, &DecoderConfig::new());
        assert_eq!(trace.format, TraceFormat::PcanView11);
        assert_eq!(trace.frames.len(), 4);
        assert_eq!(trace.skipped_lines, 0);

        let first = &trace.frames[0];
        assert_eq!(first.sequence(), 1);
        assert_eq!(first.timestamp_ms(), 1059.8);
        assert_eq!(first.can_id(), 0x701);
        assert_eq!(first.payload(), Some(&[0x00u8][..]));

        let rtr = &trace.frames[1];
        assert!(rtr.is_remote_request());
        assert_eq!(rtr.dlc(), 1);

        assert_eq!(
            trace.frames[3].payload(),
            Some(&[0x43, 0x18, 0x10, 0x01, 0x91, 0x01, 0x00, 0x00][..])
        );
    }

    #[test]
    fn test_v1_1_byte_count_must_match_dlc() {
        let text = concat!(
            "     1)      1.0  Rx         0181  3  01 02\n",
            "     2)      2.0  Rx         0181  2  01 02\n",
        );
        let trace = parse_v1_1(text, &DecoderConfig::new());
        assert_eq!(trace.frames.len(), 1);
        assert_eq!(trace.frames[0].sequence(), 2);
        assert_eq!(trace.skipped_lines, 1);
        assert_eq!(trace.diagnostics[0].line, 1);
    }

    #[test]
    fn test_v1_1_malformed_lines_do_not_abort() {
        let text = "     1)      1.0  Rx         0G81  1  01
     2)      2.0  Rx         0181  9  01 02 03 04 05 06 07 08 09
     3)      3.0  Rx         1CFFFFFF  1  01
     4)      4.0  Rx         0181  1  0x
     5)      5.0  Rx         0181  1  01
";
        let trace = parse_v1_1(text, &DecoderConfig::new());
        assert_eq!(trace.frames.len(), 1);
        assert_eq!(trace.frames[0].sequence(), 5);
        assert_eq!(trace.skipped_lines, 4);
    }

    #[test]
    fn test_v1_1_zero_dlc() {
        let text = "     7)      3.5  Rx         0080  0  \n";
        let trace = parse_v1_1(text, &DecoderConfig::new());
        assert_eq!(trace.frames.len(), 1);
        assert_eq!(trace.frames[0].payload(), Some(&[][..]));
    }

    const TRACE_2_1: &str = ";$FILEVERSION=2.1
;$STARTTIME=43787.6003871181
;$COLUMNS=N,O,T,B,I,d,R,L,D
;
;   Generated by PCAN-View v5.0.0.814
;-------------------------------------------------------------------------------
      1         0.000 DT 1      0000 Tx -  2    01 00
      2        10.000 RR 1      0705 Rx -  1
      3        12.125 DT 1      0185 Rx -  8    11 22 33 44 55 66 77 88
      4        13.000 ER 1      0000 Rx -  5    00 00 00 00 00
";

    #[test]
    fn test_parse_v2_1() {
        let trace = parse_v2_1(TRACE_2_1, &DecoderConfig::new());
        assert_eq!(trace.format, TraceFormat::PcanView21);
        assert_eq!(trace.frames.len(), 3);

        assert_eq!(trace.frames[0].payload(), Some(&[0x01, 0x00][..]));
        assert!(trace.frames[1].is_remote_request());
        assert_eq!(trace.frames[1].can_id(), 0x705);
        assert_eq!(trace.frames[2].timestamp_ms(), 12.125);

        assert_eq!(trace.skipped_lines, 1);
        assert_eq!(trace.diagnostics[0].line, 10);
        assert!(trace.diagnostics[0].reason.contains("ER"));
    }

    #[test]
    fn test_v2_1_header_only_is_empty() {
        let header: String = TRACE_2_1.lines().take(6).collect::<Vec<_>>().join("\n");
        let trace = parse_v2_1(&header, &DecoderConfig::new());
        assert!(trace.is_empty());
        assert_eq!(trace.skipped_lines, 0);
    }
}
