//! Slotted-page storage for graph vertices and their adjacency lists.
//!
//! Small vertices share a page; a vertex whose list does not fit one page
//! spreads it over a head page and continuation pages. A sparse routing
//! table maps global vertex ids to `(page id, slot offset)` addresses.

#![warn(missing_docs)]

pub mod cli;
pub mod primitives;
pub mod storage;
pub mod types;
