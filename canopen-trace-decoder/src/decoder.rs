//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for loading object dictionaries,
//! parsing trace files and interpreting their frames.

use crate::canopen;
use crate::config::{DecoderConfig, ReportConfig};
use crate::dictionary::{DictionaryStats, EdsDictionary, ObjectDictionary};
use crate::formats::{self, ParsedTrace, TraceFormat};
use crate::report::ReportRow;
use crate::types::{DecoderError, FrameRecord, InterpretedMessage, Result};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    /// Object dictionary (loaded from EDS files)
    dictionary: EdsDictionary,
}

impl Decoder {
    /// Create a new decoder instance without an object dictionary
    pub fn new() -> Self {
        Self {
            dictionary: EdsDictionary::new(),
        }
    }

    /// Create a decoder around an already built dictionary
    pub fn with_dictionary(dictionary: EdsDictionary) -> Self {
        Self { dictionary }
    }

    /// Load an EDS file and add its objects to the dictionary
    ///
    /// # Arguments
    /// * `path` - Path to the EDS file
    ///
    /// # Returns
    /// * `Result<()>` - Ok if loaded successfully, Err if parsing failed
    ///
    /// # Example
    /// ```no_run
    /// use canopen_trace_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_eds(Path::new("drive.eds")).unwrap();
    /// ```
    pub fn add_eds(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading EDS file: {:?}", path);

        let dictionary = crate::dictionary::eds::parse_eds_file(path)?;
        self.dictionary.merge(dictionary);

        log::info!("EDS file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Get statistics about the loaded object dictionary
    pub fn dictionary_stats(&self) -> DictionaryStats {
        self.dictionary.stats()
    }

    /// Detect the trace format of a file from its first lines
    ///
    /// # Returns
    /// * `Ok(None)` if the file is readable but not a recognized trace
    pub fn detect_file(&self, path: &Path, config: &DecoderConfig) -> Result<Option<TraceFormat>> {
        let lead_in = formats::read_lead_in(path, config.detect_lines)?;
        Ok(formats::detect_format(&lead_in))
    }

    /// Read and parse a trace file
    ///
    /// # Arguments
    /// * `path` - Path to the trace file (PCAN-View or IXXAT MiniMon)
    /// * `config` - Decoder configuration
    ///
    /// # Returns
    /// * `Err(DecoderError::UnrecognizedFormat)` if no header signature matches
    ///
    /// # Example
    /// ```no_run
    /// use canopen_trace_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new();
    /// let trace = decoder.read_file(Path::new("trace.trc"), &DecoderConfig::new()).unwrap();
    ///
    /// for (frame, message) in decoder.interpret_all(&trace) {
    ///     println!("{} {:#05x} {}", frame.sequence(), frame.can_id(), message);
    /// }
    /// ```
    pub fn read_file(&self, path: &Path, config: &DecoderConfig) -> Result<ParsedTrace> {
        log::info!("Reading trace file: {:?}", path);

        // Vendor tools write ANSI code pages; decode lossily instead of failing
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);

        self.parse_str(&text, config).map_err(|e| match e {
            DecoderError::UnrecognizedFormat(_) => {
                DecoderError::UnrecognizedFormat(format!("{:?}", path))
            }
            other => other,
        })
    }

    /// Detect the format of trace text and parse it
    pub fn parse_str(&self, text: &str, config: &DecoderConfig) -> Result<ParsedTrace> {
        let lead_in: String = text
            .split_inclusive('\n')
            .take(config.detect_lines)
            .collect();

        let format = formats::detect_format(&lead_in).ok_or_else(|| {
            DecoderError::UnrecognizedFormat("no known header signature".to_string())
        })?;
        log::debug!("Detected trace format: {}", format);

        Ok(format.parse(text, config))
    }

    /// Interpret a single frame record
    pub fn interpret(&self, frame: &FrameRecord) -> InterpretedMessage {
        let dictionary: Option<&dyn ObjectDictionary> = if self.dictionary.is_empty() {
            None
        } else {
            Some(&self.dictionary)
        };
        canopen::decode(frame, dictionary)
    }

    /// Interpret every frame of a parsed trace, in document order
    pub fn interpret_all<'a>(&'a self, trace: &'a ParsedTrace) -> InterpretingIterator<'a> {
        InterpretingIterator::new(trace.frames.iter(), self)
    }

    /// Build the report rows of a parsed trace
    pub fn report_rows<'a>(
        &'a self,
        trace: &'a ParsedTrace,
        config: &'a ReportConfig,
    ) -> impl Iterator<Item = ReportRow> + 'a {
        self.interpret_all(trace)
            .map(move |(frame, message)| ReportRow::new(frame, &message, config))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that pairs each frame record with its interpretation
///
/// Messages are computed lazily and never cached; iterating twice decodes twice.
pub struct InterpretingIterator<'a> {
    frames: std::slice::Iter<'a, FrameRecord>,
    decoder: &'a Decoder,
}

impl<'a> InterpretingIterator<'a> {
    fn new(frames: std::slice::Iter<'a, FrameRecord>, decoder: &'a Decoder) -> Self {
        Self { frames, decoder }
    }
}

impl<'a> Iterator for InterpretingIterator<'a> {
    type Item = (&'a FrameRecord, InterpretedMessage);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.next()?;
        let message = self.decoder.interpret(frame);
        log::trace!(
            "#{} {:#05x} {} {}",
            frame.sequence(),
            frame.can_id(),
            message.function,
            message.text
        );
        Some((frame, message))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}

impl ExactSizeIterator for InterpretingIterator<'_> {}
