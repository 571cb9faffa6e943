use core::fmt;
use core::marker::PhantomData;
use core::ops::Range;

use crate::primitives::bytes::buf::Cursor;
use crate::primitives::bytes::le::FixedWidth;
use crate::types::{PageError, Result};

use super::layout::{flags, AdjListElement, PageFormat, PageLayout, PageRole, Slot};

/// A fixed-size page buffer and its read-only accessors.
///
/// Cloning duplicates the whole buffer; two pages never share storage.
/// Equality compares every byte of the page, footer included.
#[derive(Clone)]
pub struct SlottedPage<F: PageFormat> {
    buf: Box<[u8]>,
    _format: PhantomData<F>,
}

impl<F: PageLayout> SlottedPage<F> {
    /// Creates an empty page carrying `flags`.
    pub fn new(flags: u32) -> Self {
        let () = F::LAYOUT_OK;
        let mut page = Self {
            buf: vec![0u8; F::PAGE_SIZE].into_boxed_slice(),
            _format: PhantomData,
        };
        page.write_flags(flags);
        page.write_pointer(F::FRONT_OFFSET, 0);
        page.write_pointer(F::REAR_OFFSET, F::DATA_SECTION_SIZE);
        page
    }

    /// Creates an empty page for `role`.
    pub fn with_role(role: PageRole) -> Self {
        Self::new(role.flags())
    }

    /// Copies a page handed back by the storage layer, validating its footer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let () = F::LAYOUT_OK;
        if bytes.len() != F::PAGE_SIZE {
            return Err(PageError::Corruption("page buffer length differs from page size"));
        }
        let page = Self {
            buf: bytes.to_vec().into_boxed_slice(),
            _format: PhantomData,
        };
        page.validate()?;
        Ok(page)
    }

    /// Checks the footer pointers, the slot directory and the role flags.
    pub fn validate(&self) -> Result<()> {
        let front = self.front();
        let rear = self.rear();
        if rear > F::DATA_SECTION_SIZE || front > rear {
            return Err(PageError::Corruption("page front/rear pointers out of range"));
        }
        if (F::DATA_SECTION_SIZE - rear) % F::SLOT_SIZE != 0 {
            return Err(PageError::Corruption("slot directory is not slot-aligned"));
        }
        if (self.flags() & flags::ROLE_MASK).count_ones() > 1 {
            return Err(PageError::Corruption("page carries more than one role flag"));
        }
        for index in 0..self.number_of_slots() {
            if self.slot(index)?.record_pos() > front {
                return Err(PageError::Corruption("slot record offset beyond front pointer"));
            }
        }
        Ok(())
    }

    /// Entire page, footer included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the page, returning its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    /// Data section, without the footer.
    pub fn data_section(&self) -> &[u8] {
        &self.buf[..F::DATA_SECTION_SIZE]
    }

    /// First free byte above the list storage.
    #[inline]
    pub fn front(&self) -> usize {
        self.read_pointer(F::FRONT_OFFSET)
    }

    /// Lowest byte of the slot directory.
    #[inline]
    pub fn rear(&self) -> usize {
        self.read_pointer(F::REAR_OFFSET)
    }

    /// Bytes between `front` and `rear`.
    #[inline]
    pub fn free_space(&self) -> usize {
        self.rear().saturating_sub(self.front())
    }

    /// Number of entries in the slot directory.
    #[inline]
    pub fn number_of_slots(&self) -> usize {
        F::DATA_SECTION_SIZE.saturating_sub(self.rear()) / F::SLOT_SIZE
    }

    /// Reads the slot at directory index `index`.
    pub fn slot(&self, index: usize) -> Result<Slot<F>> {
        let slots = self.number_of_slots();
        if index >= slots {
            return Err(PageError::SlotOutOfRange { index, slots });
        }
        let range = self.section_range(Self::slot_pos(index), F::SLOT_SIZE)?;
        Ok(Slot::decode(&self.buf[range]))
    }

    /// Reads the adjacency-list header of `slot`.
    ///
    /// On an LP-head page this is the length of the whole chain.
    pub fn list_size(&self, slot: &Slot<F>) -> Result<usize> {
        let value: F::ListSize = self.read_field(slot.record_pos())?;
        Ok(value.to_u64() as usize)
    }

    /// Reads the adjacency-list header of the slot at `index`.
    pub fn list_size_at(&self, index: usize) -> Result<usize> {
        self.list_size(&self.slot(index)?)
    }

    /// Elements following `slot`'s list header (SP and LP-head layout).
    ///
    /// The view is clipped to the elements physically present below `front`.
    pub fn list(&self, slot: &Slot<F>) -> Result<AdjList<'_, F>> {
        let declared = self.list_size(slot)?;
        let start = slot.record_pos() + F::LIST_SIZE_LEN;
        let present = self.front().saturating_sub(start) / F::ADJ_ELEM_SIZE;
        self.view(start, declared.min(present))
    }

    /// Elements following the list header of the slot at `index`.
    pub fn list_at(&self, index: usize) -> Result<AdjList<'_, F>> {
        self.list(&self.slot(index)?)
    }

    /// Elements starting directly at `slot`'s record offset (LP-extended layout).
    pub fn list_ext(&self, slot: &Slot<F>) -> Result<AdjList<'_, F>> {
        let start = slot.record_pos();
        let present = self.front().saturating_sub(start) / F::ADJ_ELEM_SIZE;
        self.view(start, present)
    }

    /// Elements starting at the record offset of the slot at `index`.
    pub fn list_ext_at(&self, index: usize) -> Result<AdjList<'_, F>> {
        self.list_ext(&self.slot(index)?)
    }

    /// Footer flag word.
    #[inline]
    pub fn flags(&self) -> u32 {
        u32::get(&self.buf[F::FLAGS_OFFSET..])
    }

    /// Role encoded in the flags, if exactly one role bit is set.
    pub fn role(&self) -> Option<PageRole> {
        PageRole::from_flags(self.flags())
    }

    /// True for a small page.
    #[inline]
    pub fn is_sp(&self) -> bool {
        self.flags() & flags::SP != 0
    }

    /// True for either half of a large-page chain.
    #[inline]
    pub fn is_lp(&self) -> bool {
        self.flags() & (flags::LP_HEAD | flags::LP_EXTENDED) != 0
    }

    /// True for a large-page chain head.
    #[inline]
    pub fn is_lp_head(&self) -> bool {
        self.flags() & flags::LP_HEAD != 0
    }

    /// True for a large-page continuation.
    #[inline]
    pub fn is_lp_extended(&self) -> bool {
        self.flags() & flags::LP_EXTENDED != 0
    }

    /// True when nothing has been allocated on the page.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.front() == 0 && self.rear() == F::DATA_SECTION_SIZE
    }

    #[inline]
    pub(crate) fn slot_pos(index: usize) -> usize {
        F::DATA_SECTION_SIZE.wrapping_sub(F::SLOT_SIZE * (index + 1))
    }

    /// Range `[offset, offset + len)` if it lies inside the data section.
    pub(crate) fn section_range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= F::DATA_SECTION_SIZE => Ok(offset..end),
            _ => Err(PageError::OutOfBounds {
                offset,
                len,
                limit: F::DATA_SECTION_SIZE,
            }),
        }
    }

    pub(crate) fn read_field<T: FixedWidth>(&self, offset: usize) -> Result<T> {
        let range = self.section_range(offset, T::WIDTH)?;
        Ok(T::get(&self.buf[range]))
    }

    pub(crate) fn section_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.buf[range]
    }

    pub(crate) fn zero_section(&mut self) {
        self.buf[..F::DATA_SECTION_SIZE].fill(0);
    }

    pub(crate) fn write_flags(&mut self, value: u32) {
        value.put(&mut self.buf[F::FLAGS_OFFSET..]);
    }

    /// Stores `front` or `rear`; callers keep `value <= DATA_SECTION_SIZE`.
    pub(crate) fn write_pointer(&mut self, at: usize, value: usize) {
        debug_assert!(value <= F::DATA_SECTION_SIZE);
        let encoded = F::Offset::from_u64(value as u64).unwrap_or_default();
        encoded.put(&mut self.buf[at..]);
    }

    fn read_pointer(&self, at: usize) -> usize {
        F::Offset::get(&self.buf[at..]).to_u64() as usize
    }

    fn view(&self, start: usize, len: usize) -> Result<AdjList<'_, F>> {
        let range = self.section_range(start, len * F::ADJ_ELEM_SIZE)?;
        Ok(AdjList::new(&self.buf[range], len))
    }
}

impl<F: PageFormat> PartialEq for SlottedPage<F> {
    fn eq(&self, other: &Self) -> bool {
        self.buf[..] == other.buf[..]
    }
}

impl<F: PageFormat> Eq for SlottedPage<F> {}

impl<F: PageLayout> fmt::Debug for SlottedPage<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlottedPage")
            .field("flags", &format_args!("{:#06x}", self.flags()))
            .field("front", &self.front())
            .field("rear", &self.rear())
            .field("slots", &self.number_of_slots())
            .finish()
    }
}

/// Bounds-checked view over a run of adjacency-list elements.
#[derive(Clone, Copy)]
pub struct AdjList<'a, F: PageFormat> {
    bytes: &'a [u8],
    len: usize,
    _format: PhantomData<F>,
}

impl<'a, F: PageLayout> AdjList<'a, F> {
    fn new(bytes: &'a [u8], len: usize) -> Self {
        Self {
            bytes,
            len,
            _format: PhantomData,
        }
    }

    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the view holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decodes element `index`.
    pub fn get(&self, index: usize) -> Option<AdjListElement<F>> {
        if index >= self.len {
            return None;
        }
        let start = index * F::ADJ_ELEM_SIZE;
        Some(AdjListElement::decode(&self.bytes[start..start + F::ADJ_ELEM_SIZE]))
    }

    /// Iterates the elements in storage order.
    pub fn iter(&self) -> AdjListIter<'a, F> {
        AdjListIter {
            cursor: Cursor::new(self.bytes),
            _format: PhantomData,
        }
    }

    /// Decodes every element.
    pub fn to_vec(&self) -> Vec<AdjListElement<F>> {
        self.iter().collect()
    }
}

impl<'a, F: PageLayout> IntoIterator for AdjList<'a, F> {
    type Item = AdjListElement<F>;
    type IntoIter = AdjListIter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, F: PageLayout> fmt::Debug for AdjList<'a, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over an [`AdjList`].
pub struct AdjListIter<'a, F: PageFormat> {
    cursor: Cursor<'a>,
    _format: PhantomData<F>,
}

impl<'a, F: PageLayout> Iterator for AdjListIter<'a, F> {
    type Item = AdjListElement<F>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.take(F::ADJ_ELEM_SIZE).map(AdjListElement::decode)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.cursor.remaining() / F::ADJ_ELEM_SIZE;
        (left, Some(left))
    }
}

impl<'a, F: PageLayout> ExactSizeIterator for AdjListIter<'a, F> {}
