//! Core types for the CANopen trace decoder library
//!
//! This module defines the fundamental values that flow through the pipeline: the raw
//! frame records produced by the trace parsers and the interpreted messages produced by
//! the CANopen decoder. Interpreted messages are never stored; they are recomputed from
//! a frame record whenever a report row is built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Highest identifier representable in an 11-bit (base format) CAN id
pub const MAX_STANDARD_ID: u16 = 0x7FF;

/// Maximum payload length of a classic CAN frame
pub const MAX_DLC: u8 = 8;

/// One CAN frame as read from a trace file
///
/// Constructed once per parsed line through [`FrameRecord::new`], which enforces the
/// record invariants, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    sequence: u64,
    timestamp_ms: f64,
    can_id: u16,
    dlc: u8,
    payload: Option<Vec<u8>>,
}

impl FrameRecord {
    /// Create a validated frame record
    ///
    /// # Arguments
    /// * `sequence` - Message number from the trace, starting at 1
    /// * `timestamp_ms` - Timestamp in milliseconds (non-negative)
    /// * `can_id` - 11-bit CAN identifier
    /// * `dlc` - Data length code (0-8)
    /// * `payload` - Data bytes, or `None` for a remote-transmission-request
    ///
    /// # Returns
    /// * `Err(DecoderError::InvalidFrame)` if any invariant is violated
    pub fn new(
        sequence: u64,
        timestamp_ms: f64,
        can_id: u32,
        dlc: u8,
        payload: Option<Vec<u8>>,
    ) -> Result<Self> {
        if sequence == 0 {
            return Err(DecoderError::InvalidFrame(
                "sequence number must start at 1".to_string(),
            ));
        }
        if !timestamp_ms.is_finite() || timestamp_ms < 0.0 {
            return Err(DecoderError::InvalidFrame(format!(
                "invalid timestamp {}",
                timestamp_ms
            )));
        }
        if can_id > MAX_STANDARD_ID as u32 {
            return Err(DecoderError::InvalidFrame(format!(
                "CAN id 0x{:X} exceeds 11 bits",
                can_id
            )));
        }
        if dlc > MAX_DLC {
            return Err(DecoderError::InvalidFrame(format!("DLC {} out of range", dlc)));
        }
        if let Some(bytes) = &payload {
            if bytes.len() != dlc as usize {
                return Err(DecoderError::InvalidFrame(format!(
                    "{} data bytes for DLC {}",
                    bytes.len(),
                    dlc
                )));
            }
        }

        Ok(Self {
            sequence,
            timestamp_ms,
            can_id: can_id as u16,
            dlc,
            payload,
        })
    }

    /// Message number within the trace
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Timestamp in milliseconds
    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    /// 11-bit CAN identifier
    pub fn can_id(&self) -> u16 {
        self.can_id
    }

    /// Data length code
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Payload bytes, `None` for remote requests
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// True if this is a remote-transmission-request frame
    pub fn is_remote_request(&self) -> bool {
        self.payload.is_none()
    }
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Unrecognized trace format: {0}")]
    UnrecognizedFormat(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Failed to parse EDS file: {0}")]
    EdsParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// CANopen function code (bits 7-10 of the CAN id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FunctionCode {
    Nmt,
    /// SYNC when the node id is 0, EMCY otherwise
    SyncEmcy,
    Time,
    Pdo1Tx,
    Pdo1Rx,
    Pdo2Tx,
    Pdo2Rx,
    Pdo3Tx,
    Pdo3Rx,
    Pdo4Tx,
    Pdo4Rx,
    /// Server to client SDO
    SdoTx,
    /// Client to server SDO
    SdoRx,
    ErrorControl,
    /// Not a recognized CANopen object
    None,
}

impl FunctionCode {
    /// Map the 4-bit function code field to its object
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            0b0000 => FunctionCode::Nmt,
            0b0001 => FunctionCode::SyncEmcy,
            0b0010 => FunctionCode::Time,
            0b0011 => FunctionCode::Pdo1Tx,
            0b0100 => FunctionCode::Pdo1Rx,
            0b0101 => FunctionCode::Pdo2Tx,
            0b0110 => FunctionCode::Pdo2Rx,
            0b0111 => FunctionCode::Pdo3Tx,
            0b1000 => FunctionCode::Pdo3Rx,
            0b1001 => FunctionCode::Pdo4Tx,
            0b1010 => FunctionCode::Pdo4Rx,
            0b1011 => FunctionCode::SdoTx,
            0b1100 => FunctionCode::SdoRx,
            0b1110 => FunctionCode::ErrorControl,
            _ => FunctionCode::None,
        }
    }

    /// Short name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            FunctionCode::Nmt => "NMT",
            FunctionCode::SyncEmcy => "EMCY",
            FunctionCode::Time => "TIME",
            FunctionCode::Pdo1Tx => "PDO1_T",
            FunctionCode::Pdo1Rx => "PDO1_R",
            FunctionCode::Pdo2Tx => "PDO2_T",
            FunctionCode::Pdo2Rx => "PDO2_R",
            FunctionCode::Pdo3Tx => "PDO3_T",
            FunctionCode::Pdo3Rx => "PDO3_R",
            FunctionCode::Pdo4Tx => "PDO4_T",
            FunctionCode::Pdo4Rx => "PDO4_R",
            FunctionCode::SdoTx => "SDO_T",
            FunctionCode::SdoRx => "SDO_R",
            FunctionCode::ErrorControl => "ERR_CTRL",
            FunctionCode::None => "NONE",
        }
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The CANopen meaning of a single frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretedMessage {
    /// Object class derived from the CAN id
    pub function: FunctionCode,
    /// Node id (target node for NMT commands)
    pub node: u8,
    /// Object dictionary index (0 if not applicable)
    pub index: u16,
    /// Object dictionary subindex (0 if not applicable)
    pub subindex: u8,
    /// Human-readable description
    pub text: String,
    /// Object name from the dictionary (if resolved)
    pub resolved_name: Option<String>,
    /// Inline value decoded with the dictionary data type (if resolved)
    pub resolved_value: Option<ResolvedValue>,
    /// True if the payload did not fit the layout of its object
    pub malformed: bool,
}

impl InterpretedMessage {
    /// A message that is not a recognized CANopen object
    pub fn unrecognized(node: u8) -> Self {
        Self::with_text(FunctionCode::None, node, String::new())
    }

    pub(crate) fn with_text(function: FunctionCode, node: u8, text: String) -> Self {
        Self {
            function,
            node,
            index: 0,
            subindex: 0,
            text,
            resolved_name: None,
            resolved_value: None,
            malformed: false,
        }
    }

    pub(crate) fn wrong(function: FunctionCode, node: u8, what: &str) -> Self {
        let mut message = Self::with_text(function, node, format!("wrong {}", what));
        message.malformed = true;
        message
    }
}

impl fmt::Display for InterpretedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A value decoded from SDO inline data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    /// Raw bytes as a little-endian hex number, e.g. `0x00000191`
    pub hex: String,
    /// Value interpreted with the declared data type
    pub value: Value,
}

/// Numeric (or textual) value of an object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{}", v),
            Value::Signed(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_record_validation() {
        let frame = FrameRecord::new(1, 0.5, 0x701, 1, Some(vec![0x05])).unwrap();
        assert_eq!(frame.can_id(), 0x701);
        assert_eq!(frame.payload(), Some(&[0x05u8][..]));
        assert!(!frame.is_remote_request());

        assert!(FrameRecord::new(0, 0.0, 0x100, 0, Some(vec![])).is_err());
        assert!(FrameRecord::new(1, -1.0, 0x100, 0, Some(vec![])).is_err());
        assert!(FrameRecord::new(1, 0.0, 0x800, 0, Some(vec![])).is_err());
        assert!(FrameRecord::new(1, 0.0, 0x100, 9, None).is_err());
        assert!(FrameRecord::new(1, 0.0, 0x100, 2, Some(vec![0x01])).is_err());
    }

    #[test]
    fn test_remote_request_ignores_dlc() {
        let frame = FrameRecord::new(3, 12.0, 0x705, 1, None).unwrap();
        assert!(frame.is_remote_request());
        assert_eq!(frame.dlc(), 1);
        assert_eq!(frame.payload(), None);
    }

    #[test]
    fn test_function_code_bits() {
        assert_eq!(FunctionCode::from_bits(0b1011), FunctionCode::SdoTx);
        assert_eq!(FunctionCode::from_bits(0b1100), FunctionCode::SdoRx);
        assert_eq!(FunctionCode::from_bits(0b1101), FunctionCode::None);
        assert_eq!(FunctionCode::from_bits(0b1111), FunctionCode::None);
        assert_eq!(format!("{}", FunctionCode::Pdo3Rx), "PDO3_R");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Unsigned(401)), "401");
        assert_eq!(format!("{}", Value::Signed(-2)), "-2");
        assert_eq!(format!("{}", Value::Text("abc".into())), "abc");
    }
}
