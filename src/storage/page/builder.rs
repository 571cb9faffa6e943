use core::ops::Deref;

use tracing::trace;

use crate::primitives::bytes::le::{narrow, FixedWidth};
use crate::types::{PageError, Result};

use super::layout::{AdjListElement, PageFormat, PageLayout, Slot};
use super::slotted::SlottedPage;

/// Outcome of a [`PageBuilder::scan`] or [`PageBuilder::scan_ext`] probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scan {
    /// Whether a new slot (and, for `scan`, its list header) fits.
    pub has_capacity: bool,
    /// Adjacency elements that fit next to that slot; zero without capacity.
    pub available_edges: usize,
}

impl Scan {
    /// True when a slot with `edges` elements fits.
    #[inline]
    pub fn fits(&self, edges: usize) -> bool {
        self.has_capacity && self.available_edges >= edges
    }
}

/// Mutating view over a [`SlottedPage`].
///
/// Lists grow upward from `front`, slots downward from `rear`. The builder
/// never compares the two: call [`scan`](Self::scan) or
/// [`scan_ext`](Self::scan_ext) first and only insert what it reported.
/// Inserting more overwrites the opposite region. Errors are returned only
/// when a write would leave the data section or a value overflows its field.
pub struct PageBuilder<'p, F: PageFormat> {
    page: &'p mut SlottedPage<F>,
}

impl<'p, F: PageLayout> PageBuilder<'p, F> {
    /// Borrows `page` for building.
    pub fn new(page: &'p mut SlottedPage<F>) -> Self {
        Self { page }
    }

    /// Capacity for a new SP or LP-head slot with its list header.
    pub fn scan(&self) -> Scan {
        self.probe(F::SLOT_SIZE + F::LIST_SIZE_LEN)
    }

    /// Capacity for a new LP-extended slot; no list header is reserved.
    pub fn scan_ext(&self) -> Scan {
        self.probe(F::SLOT_SIZE)
    }

    /// Appends a slot and reserves its list header. Returns the slot index.
    pub fn add_slot(&mut self, vertex_id: F::VertexId, payload: F::VertexPayload) -> Result<usize> {
        self.push_slot(Some((vertex_id, payload)), true)
    }

    /// Appends a slot without reserving a list header. Returns the slot index.
    pub fn add_slot_ext(
        &mut self,
        vertex_id: F::VertexId,
        payload: F::VertexPayload,
    ) -> Result<usize> {
        self.push_slot(Some((vertex_id, payload)), false)
    }

    /// Reserves a slot and its list header without a vertex.
    ///
    /// Only the record offset is written, so a later dummy list can place
    /// its header.
    pub fn add_dummy_slot(&mut self) -> Result<usize> {
        self.push_slot(None, true)
    }

    /// Reserves a slot without a vertex or list header.
    pub fn add_dummy_slot_ext(&mut self) -> Result<usize> {
        self.push_slot(None, false)
    }

    /// Writes the complete list of the slot at `slot_index`.
    ///
    /// The header must already be reserved by [`add_slot`](Self::add_slot).
    /// A failed call leaves the page unchanged.
    pub fn add_list_sp(&mut self, slot_index: usize, elems: &[AdjListElement<F>]) -> Result<()> {
        let slot = self.page.slot(slot_index)?;
        let start = slot.record_pos() + F::LIST_SIZE_LEN;
        let len = self.list_bytes(start, elems.len())?;
        let front = self.front_after(len)?;
        self.write_header(&slot, elems.len())?;
        self.write_elems(start, elems)?;
        self.set_front(front)
    }

    /// Writes the head of a large list into slot 0.
    ///
    /// The header records `list_size`, the length of the whole chain, while
    /// only `elems` are stored here. `front` ends after the written elements,
    /// whether the slot came from [`add_slot`](Self::add_slot) or
    /// [`add_slot_ext`](Self::add_slot_ext).
    pub fn add_list_lp_head(&mut self, list_size: usize, elems: &[AdjListElement<F>]) -> Result<()> {
        let slot = self.page.slot(0)?;
        let start = slot.record_pos() + F::LIST_SIZE_LEN;
        let len = self.list_bytes(start, elems.len())?;
        self.write_header(&slot, list_size)?;
        self.write_elems(start, elems)?;
        self.set_front(start + len)
    }

    /// Appends continuation elements at `front`; no header is written.
    pub fn add_list_lp_ext(&mut self, elems: &[AdjListElement<F>]) -> Result<()> {
        let start = self.page.front();
        let len = self.list_bytes(start, elems.len())?;
        self.write_elems(start, elems)?;
        self.set_front(start + len)
    }

    /// Writes the header of the slot at `slot_index` and reserves its elements.
    pub fn add_dummy_list_sp(&mut self, slot_index: usize, list_size: usize) -> Result<()> {
        let slot = self.page.slot(slot_index)?;
        let start = slot.record_pos() + F::LIST_SIZE_LEN;
        let len = self.list_bytes(start, list_size)?;
        let front = self.front_after(len)?;
        self.write_header(&slot, list_size)?;
        self.set_front(front)
    }

    /// Writes slot 0's chain length and reserves `in_page` elements.
    pub fn add_dummy_list_lp_head(&mut self, list_size: usize, in_page: usize) -> Result<()> {
        let slot = self.page.slot(0)?;
        let start = slot.record_pos() + F::LIST_SIZE_LEN;
        let len = self.list_bytes(start, in_page)?;
        self.write_header(&slot, list_size)?;
        self.set_front(start + len)
    }

    /// Reserves `in_page` continuation elements.
    pub fn add_dummy_list_lp_ext(&mut self, in_page: usize) -> Result<()> {
        let start = self.page.front();
        let len = self.list_bytes(start, in_page)?;
        self.set_front(start + len)
    }

    /// Zeroes the data section and resets both pointers. Flags are kept.
    pub fn clear(&mut self) {
        self.page.zero_section();
        self.page.write_pointer(F::FRONT_OFFSET, 0);
        self.page.write_pointer(F::REAR_OFFSET, F::DATA_SECTION_SIZE);
        trace!(flags = self.page.flags(), "page.clear");
    }

    /// Replaces the footer flag word.
    pub fn set_flags(&mut self, flags: u32) {
        self.page.write_flags(flags);
    }

    /// Page being built.
    pub fn page(&self) -> &SlottedPage<F> {
        self.page
    }

    fn probe(&self, reserve: usize) -> Scan {
        let free = self.page.free_space();
        if free < reserve {
            return Scan::default();
        }
        Scan {
            has_capacity: true,
            available_edges: (free - reserve) / F::ADJ_ELEM_SIZE,
        }
    }

    fn push_slot(
        &mut self,
        vertex: Option<(F::VertexId, F::VertexPayload)>,
        reserve_header: bool,
    ) -> Result<usize> {
        let front = self.page.front();
        let rear = self
            .page
            .rear()
            .checked_sub(F::SLOT_SIZE)
            .ok_or(PageError::Invalid("slot directory would underflow the data section"))?;
        let record_offset = narrow::<F::RecordOffset>(front).ok_or(PageError::WidthOverflow {
            field: "record_offset",
            value: front as u64,
        })?;
        if reserve_header {
            self.page.section_range(front, F::LIST_SIZE_LEN)?;
        }
        let range = self.page.section_range(rear, F::SLOT_SIZE)?;
        let dst = self.page.section_mut(range);
        match vertex {
            Some((vertex_id, payload)) => Slot::<F> {
                vertex_id,
                record_offset,
                payload,
            }
            .encode(dst),
            None => {
                let at = <F::VertexId as FixedWidth>::WIDTH;
                record_offset.put(&mut dst[at..]);
            }
        }
        self.page.write_pointer(F::REAR_OFFSET, rear);
        if reserve_header {
            self.page
                .write_pointer(F::FRONT_OFFSET, front + F::LIST_SIZE_LEN);
        }
        Ok(self.page.number_of_slots() - 1)
    }

    /// Writes a list header at `slot`'s record offset and returns where its
    /// elements begin.
    fn write_header(&mut self, slot: &Slot<F>, list_size: usize) -> Result<usize> {
        let value = narrow::<F::ListSize>(list_size).ok_or(PageError::WidthOverflow {
            field: "list_size",
            value: list_size as u64,
        })?;
        let at = slot.record_pos();
        let range = self.page.section_range(at, F::LIST_SIZE_LEN)?;
        value.put(self.page.section_mut(range));
        Ok(at + F::LIST_SIZE_LEN)
    }

    fn write_elems(&mut self, start: usize, elems: &[AdjListElement<F>]) -> Result<()> {
        let range = self
            .page
            .section_range(start, elems.len() * F::ADJ_ELEM_SIZE)?;
        let dst = self.page.section_mut(range);
        for (elem, chunk) in elems.iter().zip(dst.chunks_exact_mut(F::ADJ_ELEM_SIZE)) {
            elem.encode(chunk);
        }
        Ok(())
    }

    /// Byte length of `count` elements stored from `start`, if they stay
    /// inside the data section.
    fn list_bytes(&self, start: usize, count: usize) -> Result<usize> {
        let len = count
            .checked_mul(F::ADJ_ELEM_SIZE)
            .ok_or(PageError::OutOfBounds {
                offset: start,
                len: usize::MAX,
                limit: F::DATA_SECTION_SIZE,
            })?;
        self.page.section_range(start, len)?;
        Ok(len)
    }

    /// `front` advanced by `len`, if it stays inside the data section.
    fn front_after(&self, len: usize) -> Result<usize> {
        Ok(self.page.section_range(self.page.front(), len)?.end)
    }

    fn set_front(&mut self, front: usize) -> Result<()> {
        if front > F::DATA_SECTION_SIZE {
            return Err(PageError::OutOfBounds {
                offset: self.page.front(),
                len: front.saturating_sub(self.page.front()),
                limit: F::DATA_SECTION_SIZE,
            });
        }
        self.page.write_pointer(F::FRONT_OFFSET, front);
        Ok(())
    }
}

impl<'p, F: PageLayout<VertexPayload = ()>> PageBuilder<'p, F> {
    /// [`add_slot`](Self::add_slot) for formats without a vertex payload.
    pub fn add_slot_bare(&mut self, vertex_id: F::VertexId) -> Result<usize> {
        self.add_slot(vertex_id, ())
    }

    /// [`add_slot_ext`](Self::add_slot_ext) for formats without a vertex payload.
    pub fn add_slot_ext_bare(&mut self, vertex_id: F::VertexId) -> Result<usize> {
        self.add_slot_ext(vertex_id, ())
    }
}

impl<'p, F: PageLayout> Deref for PageBuilder<'p, F> {
    type Target = SlottedPage<F>;

    fn deref(&self) -> &Self::Target {
        self.page
    }
}
