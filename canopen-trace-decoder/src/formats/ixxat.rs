//! IXXAT MiniMon V3 ASCII trace parser (quoted CSV)
//!
//! ```text
//! "14:24:33.447";"701";"Std";"";"05"
//! "14:24:33.500";"705";"Std";"Rtr";"Remote request DLC=1"
//! ```
//! Columns: wall-clock time, hex id, frame format, flags, data bytes or remote request
//! information. The trace has no message numbers or DLC column; both are derived.

use super::{parse_can_id, parse_data_bytes, ParsedTrace, TraceBuilder, TraceFormat};
use crate::config::{DecoderConfig, TimeBase};
use crate::types::{DecoderError, FrameRecord, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

const MS_PER_DAY: f64 = 86_400_000.0;

lazy_static! {
    static ref RE_ENTRY: Regex = Regex::new(
        r#"^\s*"(\d{1,2}):(\d{2}):(\d{2}(?:\.\d*)?)";"([^"]*)";"(\w*)";"([\w\s]*)";"([\w\s=]*)""#
    )
    .unwrap();
    static ref RE_RTR: Regex = Regex::new(r"Remote request\s*DLC\s*=\s*(\d+)").unwrap();
}

/// Fields of one record line, before sequence numbers and time base are applied
struct Entry {
    time_of_day_ms: f64,
    can_id: u32,
    dlc: u8,
    payload: Option<Vec<u8>>,
}

/// Parse an IXXAT MiniMon V3 trace
///
/// Sequence numbers count the emitted records starting at 1. Timestamps are
/// milliseconds since midnight, or since the first record with [`TimeBase::First`];
/// a trace running past midnight keeps counting up in the latter case.
pub fn parse(text: &str, config: &DecoderConfig) -> ParsedTrace {
    let mut builder = TraceBuilder::new(TraceFormat::IxxatMiniMon3, config);
    let mut origin: Option<f64> = None;

    for (idx, line) in text.lines().enumerate() {
        let Some(caps) = RE_ENTRY.captures(line) else {
            continue;
        };

        let entry = match parse_entry(&caps) {
            Ok(entry) => entry,
            Err(e) => {
                builder.push(idx + 1, Err(e));
                continue;
            }
        };

        // The origin is only fixed once a record has been accepted
        let start = origin.unwrap_or(entry.time_of_day_ms);
        let timestamp_ms = match config.time_base {
            TimeBase::Midnight => entry.time_of_day_ms,
            TimeBase::First => {
                let elapsed = entry.time_of_day_ms - start;
                if elapsed < 0.0 {
                    elapsed + MS_PER_DAY
                } else {
                    elapsed
                }
            }
        };

        let sequence = builder.len() as u64 + 1;
        let record =
            FrameRecord::new(sequence, timestamp_ms, entry.can_id, entry.dlc, entry.payload);
        if record.is_ok() && origin.is_none() {
            origin = Some(start);
        }
        builder.push(idx + 1, record);
    }

    builder.finish()
}

fn parse_entry(caps: &Captures) -> Result<Entry> {
    let hours: u32 = caps[1]
        .parse()
        .map_err(|_| DecoderError::InvalidFrame(format!("malformed time '{}'", &caps[1])))?;
    let minutes: u32 = caps[2]
        .parse()
        .map_err(|_| DecoderError::InvalidFrame(format!("malformed time '{}'", &caps[2])))?;
    let seconds: f64 = caps[3]
        .parse()
        .map_err(|_| DecoderError::InvalidFrame(format!("malformed time '{}'", &caps[3])))?;
    let time_of_day_ms = ((hours * 3600 + minutes * 60) as f64 + seconds) * 1000.0;

    let can_id = parse_can_id(caps[4].trim())?;

    if caps[5].eq_ignore_ascii_case("Ext") {
        return Err(DecoderError::InvalidFrame(
            "extended frame format is not CANopen".to_string(),
        ));
    }

    let load = &caps[7];
    if caps[6].contains("Rtr") {
        let dlc = RE_RTR
            .captures(load)
            .and_then(|rtr| rtr[1].parse::<u8>().ok())
            .ok_or_else(|| {
                DecoderError::InvalidFrame(format!("malformed remote request '{}'", load))
            })?;

        Ok(Entry {
            time_of_day_ms,
            can_id,
            dlc,
            payload: None,
        })
    } else {
        let data = parse_data_bytes(load)?;
        let dlc = u8::try_from(data.len())
            .map_err(|_| DecoderError::InvalidFrame(format!("{} data bytes", data.len())))?;

        Ok(Entry {
            time_of_day_ms,
            can_id,
            dlc,
            payload: Some(data),
        })
    }
}
