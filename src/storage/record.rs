//! User-level vertex and edge records and their physical encodings.

use crate::storage::page::{AdjListElement, PageBuilder, PageFormat, PageLayout};
use crate::storage::routing::RoutingTable;
use crate::types::Result;

/// A vertex as supplied by the loader's caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vertex<F: PageFormat> {
    /// Global vertex id.
    pub id: F::VertexId,
    /// Vertex payload, `()` when the format has none.
    pub payload: F::VertexPayload,
}

impl<F: PageLayout> Vertex<F> {
    /// Builds a vertex record.
    pub fn new(id: F::VertexId, payload: F::VertexPayload) -> Self {
        Self { id, payload }
    }

    /// Appends this vertex as an SP slot with a reserved list header.
    pub fn to_slot(&self, page: &mut PageBuilder<'_, F>) -> Result<usize> {
        page.add_slot(self.id, self.payload)
    }

    /// Appends this vertex as an LP slot without a reserved list header.
    pub fn to_slot_ext(&self, page: &mut PageBuilder<'_, F>) -> Result<usize> {
        page.add_slot_ext(self.id, self.payload)
    }
}

impl<F: PageLayout<VertexPayload = ()>> Vertex<F> {
    /// Builds a payload-free vertex.
    pub fn bare(id: F::VertexId) -> Self {
        Self::new(id, ())
    }
}

/// A directed edge as supplied by the loader's caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge<F: PageFormat> {
    /// Source vertex; selects the adjacency list the edge lands in.
    pub src: F::VertexId,
    /// Destination vertex; resolved to a page address.
    pub dst: F::VertexId,
    /// Edge payload, `()` when the format has none.
    pub payload: F::EdgePayload,
}

impl<F: PageLayout> Edge<F> {
    /// Builds an edge record.
    pub fn new(src: F::VertexId, dst: F::VertexId, payload: F::EdgePayload) -> Self {
        Self { src, dst, payload }
    }

    /// Resolves `dst` through `table` and returns the adjacency element.
    pub fn to_adj_elem(&self, table: &RoutingTable<F>) -> Result<AdjListElement<F>> {
        let (page_id, slot_offset) = table.locate(self.dst)?;
        Ok(AdjListElement::new(page_id, slot_offset, self.payload))
    }
}

impl<F: PageLayout<EdgePayload = ()>> Edge<F> {
    /// Builds a payload-free edge.
    pub fn bare(src: F::VertexId, dst: F::VertexId) -> Self {
        Self::new(src, dst, ())
    }
}
