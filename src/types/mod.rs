#![forbid(unsafe_code)]
//! Shared error type and result alias.

/// Errors raised while reading, building, or routing pages.
#[derive(thiserror::Error, Debug)]
pub enum PageError {
    /// A page buffer failed structural validation.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// The caller supplied an argument the operation cannot accept.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// A slot index past the end of the slot directory.
    #[error("slot {index} out of range (page has {slots} slots)")]
    SlotOutOfRange {
        /// Requested directory index.
        index: usize,
        /// Number of slots on the page.
        slots: usize,
    },
    /// An access of `len` bytes at `offset` would leave the data section.
    #[error("access of {len} bytes at offset {offset} exceeds data section of {limit} bytes")]
    OutOfBounds {
        /// Start of the access.
        offset: usize,
        /// Length of the access.
        len: usize,
        /// Size of the data section.
        limit: usize,
    },
    /// A value does not fit the configured width of a page field.
    #[error("value {value} does not fit in {field}")]
    WidthOverflow {
        /// Name of the field being written.
        field: &'static str,
        /// Offending value.
        value: u64,
    },
    /// A vertex id is not covered by the routing table.
    #[error("vertex {0} is outside the routing table")]
    VertexOutOfRange(u64),
    /// A page id has no routing entry.
    #[error("page {0} has no routing entry")]
    UnknownPage(u64),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PageError>;
