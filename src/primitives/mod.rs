//! Low-level primitives for building pages.

/// Byte-level utilities and encoding/decoding.
///
/// Fixed-width little-endian field codecs and a slice cursor.
pub mod bytes;
