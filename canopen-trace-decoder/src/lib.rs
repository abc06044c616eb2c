//! CANopen Trace Decoder Library
//!
//! A stateless, reusable library for reading recorded CAN traces (PCAN-View, IXXAT
//! MiniMon) and interpreting every frame as a CANopen object, optionally naming SDO
//! objects from an EDS object dictionary.
//!
//! # Architecture
//!
//! Decoding is a two-stage pipeline:
//! - Format detection and parsing turn vendor log lines into [`FrameRecord`]s
//! - The CANopen decoder classifies each record by function code and node id and
//!   reconstructs NMT, EMCY, TIME, heartbeat and SDO (including block transfer) meaning
//!
//! The library does NOT:
//! - Capture live bus traffic
//! - Track SDO transfers across frames
//! - Write report files
//!
//! Report sinks live in the application layer (canopen-trace-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use canopen_trace_decoder::{Decoder, DecoderConfig, ReportConfig};
//! use std::path::Path;
//!
//! // Create decoder and load the device description
//! let mut decoder = Decoder::new();
//! decoder.add_eds(Path::new("drive.eds")).unwrap();
//!
//! // Parse the trace
//! let config = DecoderConfig::new();
//! let trace = decoder.read_file(Path::new("trace.trc"), &config).unwrap();
//!
//! // Interpret and format every frame
//! let report = ReportConfig::new().with_decimal_separator(',');
//! for row in decoder.report_rows(&trace, &report) {
//!     println!("{} {} {}", row.sequence, row.canopen, row.interpretation);
//! }
//! ```

// Public modules
pub mod canopen;
pub mod config;
pub mod decoder;
pub mod dictionary;
pub mod formats;
pub mod report;
pub mod types;

// Re-export main types for convenience
pub use config::{DecoderConfig, ReportConfig, TimeBase};
pub use decoder::{Decoder, InterpretingIterator};
pub use dictionary::{DictionaryEntry, DictionaryStats, EdsDictionary, ObjectDictionary};
pub use formats::{LineDiagnostic, ParsedTrace, TraceFormat};
pub use report::ReportRow;
pub use types::{
    DecoderError, FrameRecord, FunctionCode, InterpretedMessage, ResolvedValue, Result, Value,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
