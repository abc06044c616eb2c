//! In-memory object dictionary
//!
//! Holds the object descriptions loaded from an EDS file, keyed by index and subindex.

use super::ObjectDictionary;
use crate::types::Value;
use byteorder::{ByteOrder, LittleEndian};
use std::collections::HashMap;

/// CiA 301 basic data types (object 0x0001 - 0x001B)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Boolean,
    Integer8,
    Integer16,
    Integer32,
    Integer64,
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Real32,
    Real64,
    VisibleString,
    OctetString,
    UnicodeString,
    Domain,
    /// Any other (complex or vendor specific) type code
    Other(u16),
}

impl DataType {
    /// Map a data type code from an EDS `DataType` entry
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0001 => DataType::Boolean,
            0x0002 => DataType::Integer8,
            0x0003 => DataType::Integer16,
            0x0004 => DataType::Integer32,
            0x0005 => DataType::Unsigned8,
            0x0006 => DataType::Unsigned16,
            0x0007 => DataType::Unsigned32,
            0x0008 => DataType::Real32,
            0x0009 => DataType::VisibleString,
            0x000A => DataType::OctetString,
            0x000B => DataType::UnicodeString,
            0x000F => DataType::Domain,
            0x0011 => DataType::Real64,
            0x0015 => DataType::Integer64,
            0x001B => DataType::Unsigned64,
            other => DataType::Other(other),
        }
    }

    /// Interpret little-endian object data with this type
    ///
    /// Data that does not fit the type (e.g. a 2 byte REAL32) falls back to an
    /// unsigned reading of the bytes.
    pub fn decode(&self, data: &[u8]) -> Value {
        match self {
            DataType::Boolean => Value::Unsigned(u64::from(data.first().is_some_and(|b| *b != 0))),
            DataType::Integer8 | DataType::Integer16 | DataType::Integer32 | DataType::Integer64
                if !data.is_empty() && data.len() <= 8 =>
            {
                Value::Signed(LittleEndian::read_int(data, data.len()))
            }
            DataType::Real32 if data.len() == 4 => {
                Value::Real(f64::from(LittleEndian::read_f32(data)))
            }
            DataType::Real64 if data.len() == 8 => Value::Real(LittleEndian::read_f64(data)),
            DataType::VisibleString | DataType::UnicodeString => Value::Text(
                String::from_utf8_lossy(data)
                    .trim_end_matches('\0')
                    .to_string(),
            ),
            _ => Value::Unsigned(read_unsigned(data)),
        }
    }
}

/// Little-endian unsigned value of up to 8 bytes (0 for empty data)
pub(crate) fn read_unsigned(data: &[u8]) -> u64 {
    if data.is_empty() {
        return 0;
    }
    let len = data.len().min(8);
    LittleEndian::read_uint(&data[..len], len)
}

/// Description of one object dictionary entry
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryEntry {
    /// Parameter name
    pub name: String,
    /// Name of the enclosing record/array (for sub-entries)
    pub parent: Option<String>,
    /// Declared data type
    pub data_type: Option<DataType>,
    /// Access type (`ro`, `rw`, `const`, ...)
    pub access_type: Option<String>,
}

impl DictionaryEntry {
    /// Create an entry with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            data_type: None,
            access_type: None,
        }
    }

    /// Builder method: set the declared data type
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Full name including the parent object, e.g. `Identity object.Vendor-ID`
    pub fn full_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

/// Object dictionary loaded from an EDS file
#[derive(Debug, Clone, Default)]
pub struct EdsDictionary {
    /// Entries by (index, subindex)
    entries: HashMap<(u16, u8), DictionaryEntry>,
    /// Source file name (if loaded from disk)
    source: Option<String>,
}

impl EdsDictionary {
    /// Create a new empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty dictionary remembering where its entries come from
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            source: Some(source.into()),
        }
    }

    /// Add or replace the entry at `index`/`subindex`
    pub fn add_entry(&mut self, index: u16, subindex: u8, entry: DictionaryEntry) {
        self.entries.insert((index, subindex), entry);
    }

    /// Move all entries of `other` into this dictionary, replacing duplicates
    pub fn merge(&mut self, other: EdsDictionary) {
        self.entries.extend(other.entries);
        if self.source.is_none() {
            self.source = other.source;
        }
    }

    /// True if an entry exists at `index`/`subindex`
    pub fn contains(&self, index: u16, subindex: u8) -> bool {
        self.entries.contains_key(&(index, subindex))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the dictionary has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source file name (if any)
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Get dictionary statistics
    pub fn stats(&self) -> DictionaryStats {
        let mut objects: Vec<u16> = self.entries.keys().map(|(index, _)| *index).collect();
        objects.sort_unstable();
        objects.dedup();

        DictionaryStats {
            num_objects: objects.len(),
            num_entries: self.entries.len(),
        }
    }
}

impl ObjectDictionary for EdsDictionary {
    fn lookup(&self, index: u16, subindex: u8) -> Option<&DictionaryEntry> {
        self.entries.get(&(index, subindex))
    }
}

/// Dictionary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DictionaryStats {
    /// Number of distinct indexes
    pub num_objects: usize,
    /// Number of (index, subindex) entries
    pub num_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dictionary() {
        let dict = EdsDictionary::new();
        assert!(dict.is_empty());
        assert_eq!(dict.stats(), DictionaryStats::default());
        assert!(dict.lookup(0x1000, 0).is_none());
    }

    #[test]
    fn test_add_and_lookup() {
        let mut dict = EdsDictionary::with_source("device.eds");
        dict.add_entry(
            0x1018,
            1,
            DictionaryEntry {
                name: "Vendor-ID".to_string(),
                parent: Some("Identity object".to_string()),
                data_type: Some(DataType::Unsigned32),
                access_type: Some("ro".to_string()),
            },
        );
        dict.add_entry(0x1018, 2, DictionaryEntry::new("Product code"));
        dict.add_entry(0x1000, 0, DictionaryEntry::new("Device type"));

        let entry = dict.lookup(0x1018, 1).unwrap();
        assert_eq!(entry.full_name(), "Identity object.Vendor-ID");
        assert!(dict.lookup(0x1018, 3).is_none());
        assert_eq!(dict.source(), Some("device.eds"));

        let stats = dict.stats();
        assert_eq!(stats.num_objects, 2);
        assert_eq!(stats.num_entries, 3);
    }

    #[test]
    fn test_merge() {
        let mut first = EdsDictionary::with_source("a.eds");
        first.add_entry(0x1000, 0, DictionaryEntry::new("Device type"));
        let mut second = EdsDictionary::with_source("b.eds");
        second.add_entry(0x1000, 0, DictionaryEntry::new("Device type (b)"));
        second.add_entry(0x1001, 0, DictionaryEntry::new("Error register"));

        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.lookup(0x1000, 0).unwrap().name, "Device type (b)");
        assert_eq!(first.source(), Some("a.eds"));
    }

    #[test]
    fn test_decode_values() {
        assert_eq!(DataType::Unsigned16.decode(&[0x91, 0x01]), Value::Unsigned(401));
        assert_eq!(DataType::Integer16.decode(&[0xFE, 0xFF]), Value::Signed(-2));
        assert_eq!(DataType::Integer8.decode(&[0x7F]), Value::Signed(127));
        assert_eq!(DataType::Boolean.decode(&[0x01]), Value::Unsigned(1));
        assert_eq!(
            DataType::Real32.decode(&1.5f32.to_le_bytes()),
            Value::Real(1.5)
        );
        assert_eq!(
            DataType::VisibleString.decode(b"ab\0\0"),
            Value::Text("ab".to_string())
        );
        // Wrong width falls back to unsigned
        assert_eq!(DataType::Real32.decode(&[0x01, 0x02]), Value::Unsigned(0x0201));
        assert_eq!(DataType::Other(0x20).decode(&[0x01]), Value::Unsigned(1));
    }

    #[test]
    fn test_data_type_codes() {
        assert_eq!(DataType::from_code(0x0007), DataType::Unsigned32);
        assert_eq!(DataType::from_code(0x001B), DataType::Unsigned64);
        assert_eq!(DataType::from_code(0x0023), DataType::Other(0x23));
    }
}
