#![forbid(unsafe_code)]

//! Command-line interface utilities for the `slotgraph` binary.

/// Loading edge lists from CSV into pages, and geometry reports.
///
/// Produces serializable reports the binary prints as text or JSON.
pub mod load;
