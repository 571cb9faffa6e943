//! Page geometry and the fixed-width records stored in a page.
//!
//! # Page Layout
//!
//! ```text
//! +----------------------------------------------------------------+
//! | S0 list_size | S0 elem #0 | S0 elem #1 | ... | S1 list_size | ...|  <- front grows up
//! |                                                                |
//! |                              ... | slot #1 | slot #0 | footer   |  <- rear grows down
//! +----------------------------------------------------------------+
//! ```
//!
//! Footer: `reserved:4 | flags:u32 | front:Offset | rear:Offset`.
//! Slot: `vertex_id | record_offset | [vertex_payload]`.
//! Adjacency element: `page_id | slot_offset | [edge_payload]`.
//!
//! Every field is little-endian and byte-packed.

use core::fmt::Debug;

use crate::primitives::bytes::le::FixedWidth;

/// Page role bits stored in the footer `flags` word.
pub mod flags {
    /// Small page: complete adjacency lists for one or more vertices.
    pub const SP: u32 = 0x0001;
    /// Head of a large-page chain.
    pub const LP_HEAD: u32 = SP << 1;
    /// Continuation of a large-page chain.
    pub const LP_EXTENDED: u32 = SP << 2;
    /// All role bits.
    pub const ROLE_MASK: u32 = SP | LP_HEAD | LP_EXTENDED;
}

/// Width of the reserved footer word.
pub const FOOTER_RESERVED_LEN: usize = 4;
/// Width of the footer flags word.
pub const FOOTER_FLAGS_LEN: usize = 4;

/// A fixed-width value attached to a slot or an adjacency element.
///
/// `()` is the absent payload and occupies zero bytes.
pub trait Payload: Copy + Debug + Eq + Send + Sync + 'static {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Writes the payload into the first `SIZE` bytes of `dst`.
    fn encode(&self, dst: &mut [u8]);

    /// Reads a payload from the first `SIZE` bytes of `src`.
    fn decode(src: &[u8]) -> Self;
}

impl Payload for () {
    const SIZE: usize = 0;

    #[inline]
    fn encode(&self, _dst: &mut [u8]) {}

    #[inline]
    fn decode(_src: &[u8]) -> Self {}
}

impl<T: FixedWidth> Payload for T {
    const SIZE: usize = T::WIDTH;

    #[inline]
    fn encode(&self, dst: &mut [u8]) {
        self.put(dst);
    }

    #[inline]
    fn decode(src: &[u8]) -> Self {
        T::get(src)
    }
}

impl<const N: usize> Payload for [u8; N] {
    const SIZE: usize = N;

    #[inline]
    fn encode(&self, dst: &mut [u8]) {
        dst[..N].copy_from_slice(self);
    }

    #[inline]
    fn decode(src: &[u8]) -> Self {
        let mut out = [0u8; N];
        out.copy_from_slice(&src[..N]);
        out
    }
}

/// Returns the encoded width of `P`, zero for the absent payload.
pub const fn size_of_or_zero<P: Payload>() -> usize {
    P::SIZE
}

/// Field widths and page size of one page-format instantiation.
///
/// Writers and readers of a page must agree on every choice made here.
pub trait PageFormat: Copy + Clone + Debug + Default + Eq + Send + Sync + 'static {
    /// Global vertex identifier.
    type VertexId: FixedWidth;
    /// Page identifier stored in adjacency elements.
    type PageId: FixedWidth;
    /// Offset of a slot's list header inside the data section.
    type RecordOffset: FixedWidth;
    /// Destination slot index stored in adjacency elements.
    type SlotOffset: FixedWidth;
    /// Adjacency-list length header.
    type ListSize: FixedWidth;
    /// Width of the footer `front`/`rear` pointers.
    type Offset: FixedWidth;
    /// Per-vertex payload, `()` when absent.
    type VertexPayload: Payload;
    /// Per-edge payload, `()` when absent.
    type EdgePayload: Payload;

    /// Total page size in bytes, footer included.
    const PAGE_SIZE: usize;
}

/// Constants derived from a [`PageFormat`].
pub trait PageLayout: PageFormat {
    /// Size of the page footer.
    const FOOTER_SIZE: usize =
        FOOTER_RESERVED_LEN + FOOTER_FLAGS_LEN + 2 * <Self::Offset as FixedWidth>::WIDTH;
    /// Width of the vertex payload, zero when absent.
    const VERTEX_PAYLOAD_SIZE: usize = size_of_or_zero::<Self::VertexPayload>();
    /// Width of the edge payload, zero when absent.
    const EDGE_PAYLOAD_SIZE: usize = size_of_or_zero::<Self::EdgePayload>();
    /// Width of the adjacency-list header.
    const LIST_SIZE_LEN: usize = <Self::ListSize as FixedWidth>::WIDTH;
    /// Size of one slot directory entry.
    const SLOT_SIZE: usize = <Self::VertexId as FixedWidth>::WIDTH
        + <Self::RecordOffset as FixedWidth>::WIDTH
        + Self::VERTEX_PAYLOAD_SIZE;
    /// Size of one adjacency-list element.
    const ADJ_ELEM_SIZE: usize = <Self::PageId as FixedWidth>::WIDTH
        + <Self::SlotOffset as FixedWidth>::WIDTH
        + Self::EDGE_PAYLOAD_SIZE;
    /// Bytes available to lists and slots.
    const DATA_SECTION_SIZE: usize = Self::PAGE_SIZE - Self::FOOTER_SIZE;
    /// Elements that fit in an LP-head page next to its slot and header.
    const MAX_EDGES_IN_HEAD_PAGE: usize =
        (Self::DATA_SECTION_SIZE - Self::SLOT_SIZE - Self::LIST_SIZE_LEN) / Self::ADJ_ELEM_SIZE;
    /// Elements that fit in an LP-extended page next to its slot.
    const MAX_EDGES_IN_EXT_PAGE: usize =
        (Self::DATA_SECTION_SIZE - Self::SLOT_SIZE) / Self::ADJ_ELEM_SIZE;

    /// Compile-time rejection of formats whose pointers cannot address the page.
    const LAYOUT_OK: () = {
        assert!(
            Self::PAGE_SIZE
                > Self::FOOTER_SIZE + Self::SLOT_SIZE + Self::LIST_SIZE_LEN + Self::ADJ_ELEM_SIZE,
            "page too small for one slot, one header and one adjacency element"
        );
        assert!(
            Self::DATA_SECTION_SIZE as u64 <= <Self::Offset as FixedWidth>::MAX,
            "footer offset type cannot address the data section"
        );
        assert!(
            Self::DATA_SECTION_SIZE as u64 <= <Self::RecordOffset as FixedWidth>::MAX,
            "record offset type cannot address the data section"
        );
    };

    /// Offset of the footer flags word.
    const FLAGS_OFFSET: usize = Self::DATA_SECTION_SIZE + FOOTER_RESERVED_LEN;
    /// Offset of the footer `front` pointer.
    const FRONT_OFFSET: usize = Self::FLAGS_OFFSET + FOOTER_FLAGS_LEN;
    /// Offset of the footer `rear` pointer.
    const REAR_OFFSET: usize = Self::FRONT_OFFSET + <Self::Offset as FixedWidth>::WIDTH;
}

impl<F: PageFormat> PageLayout for F {}

/// Default instantiation: 4 KiB pages, 64-bit vertex ids, 32-bit everything else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultFormat;

impl PageFormat for DefaultFormat {
    type VertexId = u64;
    type PageId = u32;
    type RecordOffset = u32;
    type SlotOffset = u32;
    type ListSize = u32;
    type Offset = u32;
    type VertexPayload = ();
    type EdgePayload = ();

    const PAGE_SIZE: usize = 4096;
}

/// One slot directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot<F: PageFormat> {
    /// Vertex stored in this slot.
    pub vertex_id: F::VertexId,
    /// Data-section offset of this vertex's list header.
    pub record_offset: F::RecordOffset,
    /// Vertex payload, `()` when the format has none.
    pub payload: F::VertexPayload,
}

impl<F: PageLayout> Slot<F> {
    /// Data-section offset of the list header as `usize`.
    #[inline]
    pub fn record_pos(&self) -> usize {
        self.record_offset.to_u64() as usize
    }

    pub(crate) fn encode(&self, dst: &mut [u8]) {
        let id_len = <F::VertexId as FixedWidth>::WIDTH;
        let off_len = <F::RecordOffset as FixedWidth>::WIDTH;
        self.vertex_id.put(&mut dst[..id_len]);
        self.record_offset.put(&mut dst[id_len..id_len + off_len]);
        self.payload.encode(&mut dst[id_len + off_len..F::SLOT_SIZE]);
    }

    pub(crate) fn decode(src: &[u8]) -> Self {
        let id_len = <F::VertexId as FixedWidth>::WIDTH;
        let off_len = <F::RecordOffset as FixedWidth>::WIDTH;
        Self {
            vertex_id: F::VertexId::get(&src[..id_len]),
            record_offset: F::RecordOffset::get(&src[id_len..id_len + off_len]),
            payload: F::VertexPayload::decode(&src[id_len + off_len..F::SLOT_SIZE]),
        }
    }
}

/// One adjacency-list element: the physical address of an edge's target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdjListElement<F: PageFormat> {
    /// Page holding the destination vertex.
    pub page_id: F::PageId,
    /// Slot of the destination vertex inside that page.
    pub slot_offset: F::SlotOffset,
    /// Edge payload, `()` when the format has none.
    pub payload: F::EdgePayload,
}

impl<F: PageLayout> AdjListElement<F> {
    /// Builds an element from its parts.
    pub fn new(page_id: F::PageId, slot_offset: F::SlotOffset, payload: F::EdgePayload) -> Self {
        Self {
            page_id,
            slot_offset,
            payload,
        }
    }

    pub(crate) fn encode(&self, dst: &mut [u8]) {
        let pid_len = <F::PageId as FixedWidth>::WIDTH;
        let so_len = <F::SlotOffset as FixedWidth>::WIDTH;
        self.page_id.put(&mut dst[..pid_len]);
        self.slot_offset.put(&mut dst[pid_len..pid_len + so_len]);
        self.payload
            .encode(&mut dst[pid_len + so_len..F::ADJ_ELEM_SIZE]);
    }

    pub(crate) fn decode(src: &[u8]) -> Self {
        let pid_len = <F::PageId as FixedWidth>::WIDTH;
        let so_len = <F::SlotOffset as FixedWidth>::WIDTH;
        Self {
            page_id: F::PageId::get(&src[..pid_len]),
            slot_offset: F::SlotOffset::get(&src[pid_len..pid_len + so_len]),
            payload: F::EdgePayload::decode(&src[pid_len + so_len..F::ADJ_ELEM_SIZE]),
        }
    }
}

impl<F: PageLayout<EdgePayload = ()>> AdjListElement<F> {
    /// Builds a payload-free element.
    pub fn bare(page_id: F::PageId, slot_offset: F::SlotOffset) -> Self {
        Self::new(page_id, slot_offset, ())
    }
}

/// Role of a page, decoded from its flag bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageRole {
    /// Small page.
    Small,
    /// Large-page chain head.
    LargeHead,
    /// Large-page chain continuation.
    LargeExtended,
}

impl PageRole {
    /// Flag word for this role.
    pub const fn flags(self) -> u32 {
        match self {
            Self::Small => flags::SP,
            Self::LargeHead => flags::LP_HEAD,
            Self::LargeExtended => flags::LP_EXTENDED,
        }
    }

    /// Decodes a flag word carrying exactly one role bit.
    pub fn from_flags(value: u32) -> Option<Self> {
        match value & flags::ROLE_MASK {
            flags::SP => Some(Self::Small),
            flags::LP_HEAD => Some(Self::LargeHead),
            flags::LP_EXTENDED => Some(Self::LargeExtended),
            _ => None,
        }
    }
}
