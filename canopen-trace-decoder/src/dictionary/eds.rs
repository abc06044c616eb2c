//! EDS (Electronic Data Sheet) file parser
//!
//! Reads the object sections of a CiA 306 EDS file into an [`EdsDictionary`]. Only the
//! fields the trace decoder uses are kept: parameter name, data type and access type.
//!
//! ```text
//! [1018]
//! ParameterName=Identity object
//! ObjectType=0x9
//! SubNumber=2
//!
//! [1018sub1]
//! ParameterName=Vendor-ID
//! DataType=0x0007
//! AccessType=ro
//! ```

use super::database::{DataType, DictionaryEntry, EdsDictionary};
use crate::types::{DecoderError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// CiA 306 object types that group sub-entries
const OBJECT_TYPE_ARRAY: u16 = 0x8;
const OBJECT_TYPE_RECORD: u16 = 0x9;

lazy_static! {
    static ref RE_OBJECT_SECTION: Regex =
        Regex::new(r"^(?i)([0-9a-f]{4})(?:sub([0-9a-f]{1,2}))?$").unwrap();
}

/// One `[section]` with its keys lower-cased
struct Section {
    name: String,
    line: usize,
    keys: HashMap<String, String>,
}

/// Parse an EDS file and return its object dictionary
pub fn parse_eds_file(path: &Path) -> Result<EdsDictionary> {
    log::info!("Parsing EDS file: {:?}", path);

    // Read the EDS file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        DecoderError::EdsParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            // Latin-1 maps every byte to the code point of the same value
            log::warn!("EDS file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.eds")
        .to_string();

    let dictionary = parse_eds_str(&content, source_filename)?;

    log::info!(
        "Parsed {} object dictionary entries from {:?}",
        dictionary.len(),
        path
    );

    Ok(dictionary)
}

/// Parse EDS text
///
/// # Returns
/// * `Err(DecoderError::EdsParseError)` if the text has no object sections at all
pub fn parse_eds_str(content: &str, source: impl Into<String>) -> Result<EdsDictionary> {
    let sections = split_sections(content);
    let mut dictionary = EdsDictionary::with_source(source);

    // Object names first, so sub-entries can refer to their parent
    let mut parents: HashMap<u16, String> = HashMap::new();
    let mut object_sections = 0usize;

    for section in &sections {
        let Some((index, None)) = object_address(&section.name) else {
            continue;
        };
        object_sections += 1;

        let Some(name) = section.keys.get("parametername") else {
            log::warn!(
                "EDS section [{}] (line {}) has no ParameterName",
                section.name,
                section.line
            );
            continue;
        };

        let has_subs = section
            .keys
            .get("subnumber")
            .and_then(|v| parse_number(v))
            .is_some_and(|n| n > 0);
        let object_type = section.keys.get("objecttype").and_then(|v| parse_number(v));
        let is_container = has_subs
            || matches!(object_type, Some(OBJECT_TYPE_ARRAY) | Some(OBJECT_TYPE_RECORD));

        if is_container {
            parents.insert(index, name.clone());
        } else {
            dictionary.add_entry(index, 0, entry_from(section, name, None));
        }
    }

    for section in &sections {
        let Some((index, Some(subindex))) = object_address(&section.name) else {
            continue;
        };
        object_sections += 1;

        let Some(name) = section.keys.get("parametername") else {
            log::warn!(
                "EDS section [{}] (line {}) has no ParameterName",
                section.name,
                section.line
            );
            continue;
        };

        let parent = parents.get(&index).cloned();
        dictionary.add_entry(index, subindex, entry_from(section, name, parent));
    }

    if object_sections == 0 {
        return Err(DecoderError::EdsParseError(format!(
            "no object sections found in {}",
            dictionary.source().unwrap_or("EDS text")
        )));
    }

    Ok(dictionary)
}

fn entry_from(section: &Section, name: &str, parent: Option<String>) -> DictionaryEntry {
    DictionaryEntry {
        name: name.to_string(),
        parent,
        data_type: section
            .keys
            .get("datatype")
            .and_then(|v| parse_number(v))
            .map(DataType::from_code),
        access_type: section.keys.get("accesstype").map(|v| v.to_lowercase()),
    }
}

/// Split INI text into sections; keys before the first section are ignored
fn split_sections(content: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            sections.push(Section {
                name: name.trim().to_string(),
                line: idx + 1,
                keys: HashMap::new(),
            });
        } else if let Some((key, value)) = line.split_once('=') {
            if let Some(section) = sections.last_mut() {
                section
                    .keys
                    .insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }
    }

    sections
}

/// Index and optional subindex of an object section name (`1018`, `1018sub1`)
fn object_address(name: &str) -> Option<(u16, Option<u8>)> {
    let caps = RE_OBJECT_SECTION.captures(name)?;
    let index = u16::from_str_radix(&caps[1], 16).ok()?;
    match caps.get(2) {
        Some(sub) => Some((index, Some(u8::from_str_radix(sub.as_str(), 16).ok()?))),
        None => Some((index, None)),
    }
}

/// Parse an EDS number (`0x` prefixed hex or decimal)
fn parse_number(value: &str) -> Option<u16> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}
