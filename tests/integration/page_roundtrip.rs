#![allow(missing_docs)]

use slotgraph::{
    storage::{
        page::{AdjListElement, PageBuilder, PageFormat, PageRole, SlottedPage},
        Edge, RouteEntry, RoutingTable, Vertex,
    },
    types::{PageError, Result},
};

/// 256-byte pages with a one-byte tag per vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tagged;

impl PageFormat for Tagged {
    type VertexId = u32;
    type PageId = u16;
    type RecordOffset = u16;
    type SlotOffset = u16;
    type ListSize = u16;
    type Offset = u16;
    type VertexPayload = u8;
    type EdgePayload = ();
    const PAGE_SIZE: usize = 256;
}

#[test]
fn small_page_roundtrip() -> Result<()> {
    let table = RoutingTable::<Tagged>::new(vec![RouteEntry::new(1, 0)])?;
    let vertices = [Vertex::<Tagged>::new(1, b'a'), Vertex::new(2, b'x'), Vertex::new(3, b'b')];
    let edges = [Edge::<Tagged>::new(1, 3, ()), Edge::new(3, 1, ()), Edge::new(3, 2, ())];

    let mut page = SlottedPage::<Tagged>::with_role(PageRole::Small);
    let mut builder = PageBuilder::new(&mut page);
    for vertex in &vertices {
        let slot = vertex.to_slot(&mut builder)?;
        let elems = edges
            .iter()
            .filter(|e| e.src == vertex.id)
            .map(|e| e.to_adj_elem(&table))
            .collect::<Result<Vec<AdjListElement<Tagged>>>>()?;
        assert!(builder.scan().has_capacity);
        builder.add_list_sp(slot, &elems)?;
    }

    let bytes = page.as_bytes().to_vec();
    let restored = SlottedPage::<Tagged>::from_bytes(&bytes)?;
    assert_eq!(restored, page);
    assert!(restored.is_sp());
    assert_eq!(restored.number_of_slots(), 3);

    let first = restored.slot(0)?;
    assert_eq!((first.vertex_id, first.payload), (1, b'a'));
    let list = restored.list(&first)?;
    assert_eq!(list.len(), 1);
    let elem = list.get(0).expect("one element");
    assert_eq!(table.vertex_at(elem.page_id, elem.slot_offset)?, 3);
    assert_eq!(restored.slot(usize::from(elem.slot_offset))?.vertex_id, 3);

    let last = restored.slot(2)?;
    assert_eq!((last.vertex_id, last.payload), (3, b'b'));
    let targets = restored
        .list(&last)?
        .iter()
        .map(|e| table.vertex_at(e.page_id, e.slot_offset))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(targets, vec![1, 2]);
    assert!(restored.list_at(1)?.is_empty());
    Ok(())
}

#[test]
fn corrupted_footer_is_rejected() {
    let page = SlottedPage::<Tagged>::with_role(PageRole::Small);
    let mut bytes = page.into_bytes();
    let len = bytes.len();
    // rear pointer is the last two bytes; point it past the data section.
    bytes[len - 2..].copy_from_slice(&u16::MAX.to_le_bytes());
    assert!(matches!(
        SlottedPage::<Tagged>::from_bytes(&bytes),
        Err(PageError::Corruption(_))
    ));
    assert!(SlottedPage::<Tagged>::from_bytes(&bytes[..len - 1]).is_err());
}
