//! Page storage for vertex adjacency.
//!
//! Implements the slotted page layout, the vertex-id routing table, record
//! adapters for user vertices and edges, and a bulk loader tying them
//! together.

/// Slotted page format, read accessors and builder.
///
/// Page geometry is fixed per [`page::PageFormat`] instantiation.
pub mod page;

/// Vertex-id to page address routing.
pub mod routing;

mod loader;
mod options;
mod record;

pub use loader::{BulkLoader, LoadedGraph, LoaderStats};
pub use options::LoaderOptions;
pub use record::{Edge, Vertex};
pub use routing::{get_slot_offset, vid_to_pid, RouteEntry, RoutingTable};
