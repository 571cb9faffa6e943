//! Vertex-id routing: global vertex id to `(page id, slot offset)`.
//!
//! The routing table is a sparse ascending index with one entry per page
//! that starts a vertex range (SP and LP-head pages). Vertex ids inside a
//! page are consecutive, so a vertex's slot is its distance from the
//! page's first id. That invariant belongs to whoever built the pages and
//! is not checked here.

use rustc_hash::FxHashMap;

use crate::primitives::bytes::le::FixedWidth;
use crate::storage::page::PageFormat;
use crate::types::{PageError, Result};

/// One routing entry: page `page_id` holds vertices from `start_vid` on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteEntry<F: PageFormat> {
    /// First vertex id stored on the page.
    pub start_vid: F::VertexId,
    /// Page holding the range.
    pub page_id: F::PageId,
}

impl<F: PageFormat> RouteEntry<F> {
    /// Builds an entry.
    pub fn new(start_vid: F::VertexId, page_id: F::PageId) -> Self {
        Self { start_vid, page_id }
    }
}

/// Ascending routing table, read-only once built.
#[derive(Clone, Debug)]
pub struct RoutingTable<F: PageFormat> {
    entries: Vec<RouteEntry<F>>,
    by_page: FxHashMap<F::PageId, usize>,
}

impl<F: PageFormat> RoutingTable<F> {
    /// Builds a table from entries sorted strictly ascending by `start_vid`.
    pub fn new(entries: Vec<RouteEntry<F>>) -> Result<Self> {
        if entries.windows(2).any(|w| w[0].start_vid >= w[1].start_vid) {
            return Err(PageError::Invalid(
                "routing table start ids must be strictly ascending",
            ));
        }
        let mut by_page = FxHashMap::default();
        by_page.reserve(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if by_page.insert(entry.page_id, idx).is_some() {
                return Err(PageError::Invalid("routing table repeats a page id"));
            }
        }
        Ok(Self { entries, by_page })
    }

    /// Entries in ascending order.
    pub fn entries(&self) -> &[RouteEntry<F>] {
        &self.entries
    }

    /// Number of routed pages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no page is routed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First vertex id of `page_id`, if routed.
    pub fn start_vid(&self, page_id: F::PageId) -> Option<F::VertexId> {
        self.by_page
            .get(&page_id)
            .map(|idx| self.entries[*idx].start_vid)
    }

    /// Page of the last entry whose `start_vid <= vid`.
    ///
    /// Ids past the last entry map to the last page. Ids before the first
    /// entry, or any id on an empty table, are out of range.
    pub fn vid_to_pid(&self, vid: F::VertexId) -> Result<F::PageId> {
        Ok(self.entry_for(vid)?.page_id)
    }

    /// Slot of `vid` inside `page_id`: `vid - start_vid`.
    pub fn get_slot_offset(&self, page_id: F::PageId, vid: F::VertexId) -> Result<F::SlotOffset> {
        let start = self
            .start_vid(page_id)
            .ok_or(PageError::UnknownPage(page_id.to_u64()))?;
        Self::distance(start, vid)
    }

    /// Both halves of `vid`'s address with a single lookup.
    pub fn locate(&self, vid: F::VertexId) -> Result<(F::PageId, F::SlotOffset)> {
        let entry = self.entry_for(vid)?;
        Ok((entry.page_id, Self::distance(entry.start_vid, vid)?))
    }

    /// Vertex stored at `slot_offset` of `page_id`; inverse of [`locate`](Self::locate).
    pub fn vertex_at(&self, page_id: F::PageId, slot_offset: F::SlotOffset) -> Result<F::VertexId> {
        let start = self
            .start_vid(page_id)
            .ok_or(PageError::UnknownPage(page_id.to_u64()))?;
        let vid = start.to_u64().checked_add(slot_offset.to_u64());
        vid.and_then(F::VertexId::from_u64)
            .ok_or(PageError::WidthOverflow {
                field: "vertex_id",
                value: slot_offset.to_u64(),
            })
    }

    fn entry_for(&self, vid: F::VertexId) -> Result<&RouteEntry<F>> {
        let idx = self.entries.partition_point(|e| e.start_vid <= vid);
        match idx.checked_sub(1) {
            Some(found) => Ok(&self.entries[found]),
            None => Err(PageError::VertexOutOfRange(vid.to_u64())),
        }
    }

    fn distance(start: F::VertexId, vid: F::VertexId) -> Result<F::SlotOffset> {
        let diff = vid
            .to_u64()
            .checked_sub(start.to_u64())
            .ok_or(PageError::VertexOutOfRange(vid.to_u64()))?;
        F::SlotOffset::from_u64(diff).ok_or(PageError::WidthOverflow {
            field: "slot_offset",
            value: diff,
        })
    }
}

/// Page holding `vid` according to `table`.
pub fn vid_to_pid<F: PageFormat>(vid: F::VertexId, table: &RoutingTable<F>) -> Result<F::PageId> {
    table.vid_to_pid(vid)
}

/// Slot offset of `vid` inside `page_id` according to `table`.
pub fn get_slot_offset<F: PageFormat>(
    page_id: F::PageId,
    vid: F::VertexId,
    table: &RoutingTable<F>,
) -> Result<F::SlotOffset> {
    table.get_slot_offset(page_id, vid)
}
