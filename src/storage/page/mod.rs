//! Slotted pages for vertices and their adjacency lists.
//!
//! A page is a fixed-size buffer whose data section holds adjacency lists
//! growing upward and a slot directory growing downward, followed by a
//! footer with the role flags and both allocation pointers. Vertices whose
//! lists fit share a small page (SP); a vertex with a longer list gets a
//! large-page chain: one LP-head page followed by LP-extended pages.

mod builder;
mod layout;
mod slotted;

pub use builder::{PageBuilder, Scan};
pub use layout::{
    flags, size_of_or_zero, AdjListElement, DefaultFormat, PageFormat, PageLayout, PageRole,
    Payload, Slot, FOOTER_FLAGS_LEN, FOOTER_RESERVED_LEN,
};
pub use slotted::{AdjList, AdjListIter, SlottedPage};
