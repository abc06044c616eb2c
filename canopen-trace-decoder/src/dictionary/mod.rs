//! Object dictionary adapter and EDS loader
//!
//! The decoder only ever reads from an object dictionary, through the
//! [`ObjectDictionary`] trait. [`EdsDictionary`] is the bundled implementation, filled
//! from an Electronic Data Sheet by [`eds::parse_eds_file`].

pub mod database;
pub mod eds;

// Re-export key types for convenience
pub use database::{DataType, DictionaryEntry, DictionaryStats, EdsDictionary};

/// Read-only lookup from (index, subindex) to an object description
///
/// Implementations must not change while a trace is being decoded; a miss is a normal
/// outcome and simply leaves the decoded message unenriched.
pub trait ObjectDictionary: Send + Sync {
    /// Look up the entry at `index`/`subindex`
    fn lookup(&self, index: u16, subindex: u8) -> Option<&DictionaryEntry>;
}
