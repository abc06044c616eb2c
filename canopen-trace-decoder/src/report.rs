//! Report row model
//!
//! A [`ReportRow`] is the flat, already formatted view of one frame record and its
//! interpretation. Sinks (CSV, JSON) serialize rows as they are; all number formatting
//! happens here so every sink renders the same text.

use crate::config::ReportConfig;
use crate::types::{FrameRecord, InterpretedMessage};
use serde::Serialize;

/// Column titles in row order
pub const HEADER: [&str; 13] = [
    "Message Number",
    "Time [ms]",
    "ID",
    "DLC",
    "Data Bytes",
    "CANopen",
    "Node",
    "Index",
    "Subindex",
    "Interpretation",
    "Object Name",
    "Value",
    "Hex Value",
];

/// One output row per frame record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Message Number")]
    pub sequence: u64,
    #[serde(rename = "Time [ms]")]
    pub timestamp: String,
    #[serde(rename = "ID")]
    pub can_id: String,
    #[serde(rename = "DLC")]
    pub dlc: u8,
    #[serde(rename = "Data Bytes")]
    pub data: String,
    #[serde(rename = "CANopen")]
    pub canopen: String,
    #[serde(rename = "Node")]
    pub node: String,
    #[serde(rename = "Index")]
    pub index: String,
    #[serde(rename = "Subindex")]
    pub subindex: String,
    #[serde(rename = "Interpretation")]
    pub interpretation: String,
    #[serde(rename = "Object Name")]
    pub object_name: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Hex Value")]
    pub hex_value: String,
}

impl ReportRow {
    /// Build the row for a frame record and its interpretation
    pub fn new(frame: &FrameRecord, message: &InterpretedMessage, config: &ReportConfig) -> Self {
        let placeholder = || config.placeholder.clone();
        let has_index = message.index != 0;

        let (value, hex_value) = match &message.resolved_value {
            Some(resolved) => (resolved.value.to_string(), resolved.hex.clone()),
            None => (String::new(), String::new()),
        };

        Self {
            sequence: frame.sequence(),
            timestamp: format_timestamp(frame.timestamp_ms(), config.decimal_separator),
            can_id: format!("{:#06x}", frame.can_id()),
            dlc: frame.dlc(),
            data: format_payload(frame.payload()),
            canopen: message.function.name().to_string(),
            node: if message.node > 0 {
                message.node.to_string()
            } else {
                placeholder()
            },
            index: if has_index {
                format!("{:#06x}", message.index)
            } else {
                placeholder()
            },
            subindex: if has_index {
                message.subindex.to_string()
            } else {
                placeholder()
            },
            interpretation: message.text.clone(),
            object_name: message.resolved_name.clone().unwrap_or_default(),
            value,
            hex_value,
        }
    }

    /// Row fields in [`HEADER`] order
    pub fn fields(&self) -> [String; 13] {
        [
            self.sequence.to_string(),
            self.timestamp.clone(),
            self.can_id.clone(),
            self.dlc.to_string(),
            self.data.clone(),
            self.canopen.clone(),
            self.node.clone(),
            self.index.clone(),
            self.subindex.clone(),
            self.interpretation.clone(),
            self.object_name.clone(),
            self.value.clone(),
            self.hex_value.clone(),
        ]
    }
}

/// Milliseconds with three decimals and the given decimal separator
pub fn format_timestamp(timestamp_ms: f64, decimal_separator: char) -> String {
    let text = format!("{:.3}", timestamp_ms);
    if decimal_separator == '.' {
        text
    } else {
        text.replacen('.', &decimal_separator.to_string(), 1)
    }
}

/// Payload as bracketed `0xNN` tokens; empty for remote requests
pub fn format_payload(payload: Option<&[u8]>) -> String {
    match payload {
        Some(bytes) => {
            let tokens: Vec<String> = bytes.iter().map(|b| format!("{:#04x}", b)).collect();
            format!("[{}]", tokens.join(" "))
        }
        None => String::new(),
    }
}
