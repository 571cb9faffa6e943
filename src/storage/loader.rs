//! Bulk loading of vertices and edges into sealed pages.
//!
//! Loading runs in two passes. The plan pass replays every vertex against a
//! scratch page with dummy slots and lists, letting `scan` decide where each
//! small page ends and which vertices need a large-page chain. Page ids and
//! the routing table follow from the plan. The fill pass then writes real
//! slots and resolved adjacency elements into fresh pages.

use core::marker::PhantomData;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::primitives::bytes::le::FixedWidth;
use crate::storage::options::LoaderOptions;
use crate::storage::page::{
    AdjListElement, PageBuilder, PageFormat, PageLayout, PageRole, SlottedPage,
};
use crate::storage::record::{Edge, Vertex};
use crate::storage::routing::{RouteEntry, RoutingTable};
use crate::types::{PageError, Result};

/// Counters captured by [`BulkLoader::load`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoaderStats {
    /// Vertices written.
    pub vertices: u64,
    /// Edges written.
    pub edges: u64,
    /// Small pages produced.
    pub small_pages: u64,
    /// Large-page chain heads produced.
    pub lp_head_pages: u64,
    /// Large-page continuations produced.
    pub lp_ext_pages: u64,
}

impl LoaderStats {
    /// Total pages produced.
    pub fn pages(&self) -> u64 {
        self.small_pages + self.lp_head_pages + self.lp_ext_pages
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PagePlan {
    /// Vertices `first..end` share one small page.
    Small { first: usize, end: usize },
    /// One vertex spread over a head page and `ext_pages` continuations.
    Large { vertex: usize, ext_pages: usize },
}

/// Packs vertices and their adjacency lists into pages.
#[derive(Clone, Debug)]
pub struct BulkLoader<F: PageFormat> {
    opts: LoaderOptions,
    _format: PhantomData<F>,
}

impl<F: PageLayout> BulkLoader<F> {
    /// Constructs a loader with `opts`.
    pub fn new(opts: LoaderOptions) -> Self {
        Self {
            opts,
            _format: PhantomData,
        }
    }

    /// Returns the options associated with this loader.
    pub fn options(&self) -> &LoaderOptions {
        &self.opts
    }

    /// Loads `vertices`, sorted strictly ascending by id, and `edges` in any
    /// order. Each vertex's list keeps the input order of its edges.
    pub fn load(&self, vertices: &[Vertex<F>], edges: &[Edge<F>]) -> Result<LoadedGraph<F>> {
        debug!(
            vertices = vertices.len(),
            edges = edges.len(),
            page_size = F::PAGE_SIZE,
            "loader.load.start"
        );
        self.check_order(vertices)?;
        let lists = group_edges(vertices, edges)?;
        let plans = self.plan(vertices, &lists)?;
        let (routing, page_ids) = self.route(vertices, &plans)?;

        let mut stats = LoaderStats {
            vertices: vertices.len() as u64,
            edges: edges.len() as u64,
            ..LoaderStats::default()
        };
        let mut pages = Vec::with_capacity(plans.len());
        for (plan, page_id) in plans.iter().zip(page_ids) {
            match *plan {
                PagePlan::Small { first, end } => {
                    let page = fill_small(&vertices[first..end], &lists[first..end], &routing)?;
                    trace!(
                        page_id,
                        slots = end - first,
                        free = page.free_space(),
                        "loader.page.sealed"
                    );
                    pages.push(page);
                    stats.small_pages += 1;
                }
                PagePlan::Large { vertex, ext_pages } => {
                    let chain = fill_large(&vertices[vertex], &lists[vertex], &routing)?;
                    debug_assert_eq!(chain.len(), ext_pages + 1);
                    trace!(
                        page_id,
                        degree = lists[vertex].len(),
                        ext_pages,
                        "loader.chain.sealed"
                    );
                    pages.extend(chain);
                    stats.lp_head_pages += 1;
                    stats.lp_ext_pages += ext_pages as u64;
                }
            }
        }

        debug!(
            pages = stats.pages(),
            small = stats.small_pages,
            lp_head = stats.lp_head_pages,
            lp_ext = stats.lp_ext_pages,
            "loader.load.end"
        );
        Ok(LoadedGraph {
            first_page_id: self.opts.first_page_id,
            pages,
            routing,
            stats,
        })
    }

    fn check_order(&self, vertices: &[Vertex<F>]) -> Result<()> {
        for pair in vertices.windows(2) {
            let (prev, next) = (pair[0].id.to_u64(), pair[1].id.to_u64());
            if next <= prev {
                return Err(PageError::Invalid(
                    "vertices must be sorted by id without duplicates",
                ));
            }
            if !self.opts.split_on_gap && next != prev + 1 {
                return Err(PageError::Invalid(
                    "vertex ids must be contiguous when split_on_gap is disabled",
                ));
            }
        }
        Ok(())
    }

    fn plan(&self, vertices: &[Vertex<F>], lists: &[Vec<&Edge<F>>]) -> Result<Vec<PagePlan>> {
        let mut plans = Vec::new();
        let mut scratch = SlottedPage::<F>::with_role(PageRole::Small);
        let mut open: Option<(usize, usize)> = None;

        for (idx, vertex) in vertices.iter().enumerate() {
            let degree = lists[idx].len();
            if degree > F::MAX_EDGES_IN_HEAD_PAGE {
                if let Some((first, end)) = open.take() {
                    plans.push(PagePlan::Small { first, end });
                }
                let ext_pages = (degree - F::MAX_EDGES_IN_HEAD_PAGE).div_ceil(F::MAX_EDGES_IN_EXT_PAGE);
                plans.push(PagePlan::Large {
                    vertex: idx,
                    ext_pages,
                });
                continue;
            }

            let mut builder = PageBuilder::new(&mut scratch);
            let joins_open = match open {
                Some((_, end)) => {
                    vertices[end - 1].id.to_u64() + 1 == vertex.id.to_u64()
                        && builder.number_of_slots() as u64 <= <F::SlotOffset as FixedWidth>::MAX
                        && builder.scan().fits(degree)
                }
                None => false,
            };
            if !joins_open {
                if let Some((first, end)) = open.take() {
                    plans.push(PagePlan::Small { first, end });
                }
                builder.clear();
            }
            let slot = builder.add_dummy_slot()?;
            builder.add_dummy_list_sp(slot, degree)?;
            open = Some(match open {
                Some((first, _)) => (first, idx + 1),
                None => (idx, idx + 1),
            });
        }
        if let Some((first, end)) = open {
            plans.push(PagePlan::Small { first, end });
        }
        Ok(plans)
    }

    fn route(
        &self,
        vertices: &[Vertex<F>],
        plans: &[PagePlan],
    ) -> Result<(RoutingTable<F>, Vec<u64>)> {
        let mut entries = Vec::with_capacity(plans.len());
        let mut page_ids = Vec::with_capacity(plans.len());
        let mut next = Some(self.opts.first_page_id);
        for plan in plans {
            let (first_vertex, span) = match *plan {
                PagePlan::Small { first, .. } => (first, 1),
                PagePlan::Large { vertex, ext_pages } => (vertex, 1 + ext_pages as u64),
            };
            let first = next.ok_or(PageError::WidthOverflow {
                field: "page_id",
                value: u64::MAX,
            })?;
            let last = first
                .checked_add(span - 1)
                .ok_or(PageError::WidthOverflow {
                    field: "page_id",
                    value: first,
                })?;
            F::PageId::from_u64(last).ok_or(PageError::WidthOverflow {
                field: "page_id",
                value: last,
            })?;
            let page_id = F::PageId::from_u64(first).ok_or(PageError::WidthOverflow {
                field: "page_id",
                value: first,
            })?;
            entries.push(RouteEntry::new(vertices[first_vertex].id, page_id));
            page_ids.push(first);
            next = last.checked_add(1);
        }
        Ok((RoutingTable::new(entries)?, page_ids))
    }
}

impl<F: PageLayout> Default for BulkLoader<F> {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

fn group_edges<'e, F: PageLayout>(
    vertices: &[Vertex<F>],
    edges: &'e [Edge<F>],
) -> Result<Vec<Vec<&'e Edge<F>>>> {
    let mut index: FxHashMap<F::VertexId, usize> = FxHashMap::default();
    index.reserve(vertices.len());
    for (idx, vertex) in vertices.iter().enumerate() {
        index.insert(vertex.id, idx);
    }
    let mut lists = vec![Vec::new(); vertices.len()];
    for edge in edges {
        let src = index
            .get(&edge.src)
            .ok_or(PageError::Invalid("edge source is not a loaded vertex"))?;
        if !index.contains_key(&edge.dst) {
            return Err(PageError::Invalid("edge destination is not a loaded vertex"));
        }
        lists[*src].push(edge);
    }
    Ok(lists)
}

fn resolve<F: PageLayout>(
    list: &[&Edge<F>],
    routing: &RoutingTable<F>,
) -> Result<Vec<AdjListElement<F>>> {
    list.iter().map(|edge| edge.to_adj_elem(routing)).collect()
}

fn fill_small<F: PageLayout>(
    vertices: &[Vertex<F>],
    lists: &[Vec<&Edge<F>>],
    routing: &RoutingTable<F>,
) -> Result<SlottedPage<F>> {
    let mut page = SlottedPage::with_role(PageRole::Small);
    let mut builder = PageBuilder::new(&mut page);
    for (vertex, list) in vertices.iter().zip(lists) {
        debug_assert!(builder.scan().fits(list.len()));
        let slot = vertex.to_slot(&mut builder)?;
        builder.add_list_sp(slot, &resolve(list, routing)?)?;
    }
    Ok(page)
}

fn fill_large<F: PageLayout>(
    vertex: &Vertex<F>,
    list: &[&Edge<F>],
    routing: &RoutingTable<F>,
) -> Result<Vec<SlottedPage<F>>> {
    let elems = resolve(list, routing)?;
    let (head, rest) = elems.split_at(F::MAX_EDGES_IN_HEAD_PAGE);
    let mut chain = Vec::with_capacity(1 + rest.len().div_ceil(F::MAX_EDGES_IN_EXT_PAGE));

    let mut page = SlottedPage::with_role(PageRole::LargeHead);
    let mut builder = PageBuilder::new(&mut page);
    debug_assert!(builder.scan().fits(head.len()));
    vertex.to_slot_ext(&mut builder)?;
    builder.add_list_lp_head(elems.len(), head)?;
    chain.push(page);

    for part in rest.chunks(F::MAX_EDGES_IN_EXT_PAGE) {
        let mut page = SlottedPage::with_role(PageRole::LargeExtended);
        let mut builder = PageBuilder::new(&mut page);
        debug_assert!(builder.scan_ext().fits(part.len()));
        vertex.to_slot_ext(&mut builder)?;
        builder.add_list_lp_ext(part)?;
        chain.push(page);
    }
    Ok(chain)
}

/// Pages and routing table produced by a [`BulkLoader`].
#[derive(Clone, Debug)]
pub struct LoadedGraph<F: PageFormat> {
    first_page_id: u64,
    pages: Vec<SlottedPage<F>>,
    routing: RoutingTable<F>,
    stats: LoaderStats,
}

impl<F: PageLayout> LoadedGraph<F> {
    /// Id of `pages()[0]`; ids are consecutive from here.
    pub fn first_page_id(&self) -> u64 {
        self.first_page_id
    }

    /// Pages in page-id order.
    pub fn pages(&self) -> &[SlottedPage<F>] {
        &self.pages
    }

    /// Pages paired with their ids.
    pub fn pages_with_ids(&self) -> impl Iterator<Item = (u64, &SlottedPage<F>)> {
        self.pages
            .iter()
            .enumerate()
            .map(|(idx, page)| (self.first_page_id + idx as u64, page))
    }

    /// Page with id `page_id`.
    pub fn page(&self, page_id: F::PageId) -> Option<&SlottedPage<F>> {
        let idx = page_id.to_u64().checked_sub(self.first_page_id)?;
        self.pages.get(usize::try_from(idx).ok()?)
    }

    /// Routing table covering every SP and LP-head page.
    pub fn routing(&self) -> &RoutingTable<F> {
        &self.routing
    }

    /// Counters captured while loading.
    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    /// Splits into pages and routing table.
    pub fn into_parts(self) -> (Vec<SlottedPage<F>>, RoutingTable<F>) {
        (self.pages, self.routing)
    }

    /// Vertex an adjacency element points at.
    pub fn target(&self, elem: &AdjListElement<F>) -> Result<F::VertexId> {
        self.routing.vertex_at(elem.page_id, elem.slot_offset)
    }

    /// Full adjacency list of `vid`, following large-page chains.
    pub fn neighbors(&self, vid: F::VertexId) -> Result<Vec<AdjListElement<F>>> {
        let (page_id, slot_offset) = self.routing.locate(vid)?;
        let page = self
            .page(page_id)
            .ok_or(PageError::UnknownPage(page_id.to_u64()))?;
        let slot = match page.slot(slot_offset.to_u64() as usize) {
            Ok(slot) if slot.vertex_id == vid => slot,
            Ok(_) | Err(PageError::SlotOutOfRange { .. }) => {
                return Err(PageError::VertexOutOfRange(vid.to_u64()))
            }
            Err(err) => return Err(err),
        };
        let mut out = page.list(&slot)?.to_vec();
        if !page.is_lp_head() {
            return Ok(out);
        }

        let total = page.list_size(&slot)?;
        let mut next = page_id.to_u64().checked_add(1);
        while out.len() < total {
            let ext = next
                .and_then(F::PageId::from_u64)
                .and_then(|id| self.page(id))
                .filter(|p| p.is_lp_extended())
                .ok_or(PageError::Corruption("large-page chain ends early"))?;
            out.extend(ext.list_ext_at(0)?);
            next = next.and_then(|id| id.checked_add(1));
        }
        out.truncate(total);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::DefaultFormat;
    use proptest::prelude::*;

    /// 64-byte pages: head pages hold 9 elements, extended pages 10.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct Tiny;

    impl PageFormat for Tiny {
        type VertexId = u32;
        type PageId = u16;
        type RecordOffset = u32;
        type SlotOffset = u16;
        type ListSize = u16;
        type Offset = u32;
        type VertexPayload = ();
        type EdgePayload = ();
        const PAGE_SIZE: usize = 64;
    }

    /// Tiny geometry with 64-bit page ids.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct WidePages;

    impl PageFormat for WidePages {
        type VertexId = u32;
        type PageId = u64;
        type RecordOffset = u32;
        type SlotOffset = u16;
        type ListSize = u16;
        type Offset = u32;
        type VertexPayload = ();
        type EdgePayload = ();
        const PAGE_SIZE: usize = 64;
    }

    /// Room for hundreds of slots, but slot offsets stop at 255.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct NarrowSlots;

    impl PageFormat for NarrowSlots {
        type VertexId = u16;
        type PageId = u16;
        type RecordOffset = u16;
        type SlotOffset = u8;
        type ListSize = u8;
        type Offset = u16;
        type VertexPayload = ();
        type EdgePayload = ();
        const PAGE_SIZE: usize = 4096;
    }

    fn vertices_wide(ids: impl IntoIterator<Item = u32>) -> Vec<Vertex<WidePages>> {
        ids.into_iter().map(Vertex::bare).collect()
    }

    fn vertices(ids: impl IntoIterator<Item = u32>) -> Vec<Vertex<Tiny>> {
        ids.into_iter().map(Vertex::bare).collect()
    }

    #[test]
    fn small_vertices_share_pages() {
        // 18 + 10 + 14 = 42 of 48 bytes.
        let vs = vertices(0..3);
        let es = vec![Edge::bare(0, 1), Edge::bare(0, 2), Edge::bare(2, 0)];
        let graph = BulkLoader::<Tiny>::default().load(&vs, &es).unwrap();
        assert_eq!(graph.stats().small_pages, 1);
        assert_eq!(graph.routing().len(), 1);
        let page = &graph.pages()[0];
        assert_eq!(page.number_of_slots(), 3);
        let targets: Vec<u32> = graph
            .neighbors(0)
            .unwrap()
            .iter()
            .map(|e| graph.target(e).unwrap())
            .collect();
        assert_eq!(targets, vec![1, 2]);
        assert!(graph.neighbors(1).unwrap().is_empty());
    }

    #[test]
    fn full_page_starts_a_new_one() {
        // Each vertex takes 10 + 3*4 = 22 bytes; two fit in 48.
        let vs = vertices(0..5);
        let es: Vec<_> = (0..5)
            .flat_map(|v| (0..3).map(move |d| Edge::bare(v, d)))
            .collect();
        let graph = BulkLoader::<Tiny>::default().load(&vs, &es).unwrap();
        assert_eq!(graph.stats().small_pages, 3);
        let starts: Vec<u32> = graph.routing().entries().iter().map(|e| e.start_vid).collect();
        assert_eq!(starts, vec![0, 2, 4]);
        assert_eq!(graph.routing().locate(3).unwrap(), (1, 1));
        for page in graph.pages() {
            assert!(page.front() <= page.rear());
        }
    }

    #[test]
    fn gap_splits_pages() {
        let vs = vertices([1, 2, 7, 8]);
        let graph = BulkLoader::<Tiny>::default().load(&vs, &[]).unwrap();
        let starts: Vec<u32> = graph.routing().entries().iter().map(|e| e.start_vid).collect();
        assert_eq!(starts, vec![1, 7]);
        assert!(matches!(
            graph.neighbors(5),
            Err(PageError::VertexOutOfRange(5))
        ));
    }

    #[test]
    fn gap_rejected_without_split() {
        let vs = vertices([1, 3]);
        let loader = BulkLoader::<Tiny>::new(LoaderOptions::new().split_on_gap(false));
        assert!(matches!(loader.load(&vs, &[]), Err(PageError::Invalid(_))));
    }

    #[test]
    fn unsorted_vertices_rejected() {
        let vs = vertices([2, 1]);
        assert!(BulkLoader::<Tiny>::default().load(&vs, &[]).is_err());
    }

    #[test]
    fn dangling_edges_rejected() {
        let vs = vertices(0..2);
        let loader = BulkLoader::<Tiny>::default();
        assert!(loader.load(&vs, &[Edge::bare(5, 0)]).is_err());
        assert!(loader.load(&vs, &[Edge::bare(0, 5)]).is_err());
    }

    #[test]
    fn large_list_becomes_a_chain() {
        let vs = vertices(0..3);
        let es: Vec<_> = (0..25).map(|i| Edge::bare(1, i % 3)).collect();
        let graph = BulkLoader::<Tiny>::new(LoaderOptions::new().first_page_id(100))
            .load(&vs, &es)
            .unwrap();
        // 25 = 9 in the head + 10 + 6.
        let stats = graph.stats();
        assert_eq!(
            (stats.small_pages, stats.lp_head_pages, stats.lp_ext_pages),
            (2, 1, 2)
        );
        let ids: Vec<u64> = graph.pages_with_ids().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![100, 101, 102, 103, 104]);
        let head = graph.page(101).unwrap();
        assert!(head.is_lp_head());
        assert_eq!(head.list_size_at(0).unwrap(), 25);
        assert!(graph.page(102).unwrap().is_lp_extended());
        assert_eq!(graph.routing().vid_to_pid(2).unwrap(), 104);

        let targets: Vec<u32> = graph
            .neighbors(1)
            .unwrap()
            .iter()
            .map(|e| graph.target(e).unwrap())
            .collect();
        let expected: Vec<u32> = (0..25).map(|i| i % 3).collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn page_id_overflow_is_reported() {
        let vs = vertices(0..2);
        let loader = BulkLoader::<Tiny>::new(LoaderOptions::new().first_page_id(u64::from(u16::MAX)));
        let vs_gap = vertices([0, 5]);
        assert!(loader.load(&vs, &[]).is_ok());
        assert!(matches!(
            loader.load(&vs_gap, &[]),
            Err(PageError::WidthOverflow { field: "page_id", .. })
        ));
    }

    #[test]
    fn page_ids_past_u64_are_reported() {
        let loader =
            BulkLoader::<DefaultFormat>::new(LoaderOptions::new().first_page_id(u64::MAX));
        assert!(matches!(
            loader.load(&[Vertex::bare(0)], &[]),
            Err(PageError::WidthOverflow { field: "page_id", .. })
        ));

        let loader = BulkLoader::<WidePages>::new(LoaderOptions::new().first_page_id(u64::MAX));
        let graph = loader.load(&[Vertex::bare(0)], &[]).unwrap();
        let ids: Vec<u64> = graph.pages_with_ids().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![u64::MAX]);
        assert!(graph.page(u64::MAX).is_some());
        let chain: Vec<_> = (0..WidePages::MAX_EDGES_IN_HEAD_PAGE as u32 + 1)
            .map(|_| Edge::bare(0, 0))
            .collect();
        assert!(matches!(
            loader.load(&[Vertex::bare(0)], &chain),
            Err(PageError::WidthOverflow { field: "page_id", .. })
        ));
        let gap = vertices_wide([0, 5]);
        assert!(matches!(
            loader.load(&gap, &[]),
            Err(PageError::WidthOverflow { field: "page_id", .. })
        ));
    }

    #[test]
    fn slot_offset_width_caps_page_population() {
        let vs: Vec<Vertex<NarrowSlots>> = (0..300).map(Vertex::bare).collect();
        let graph = BulkLoader::<NarrowSlots>::default().load(&vs, &[]).unwrap();
        let starts: Vec<u16> = graph.routing().entries().iter().map(|e| e.start_vid).collect();
        assert_eq!(starts, vec![0, 256]);
        assert_eq!(graph.pages()[0].number_of_slots(), 256);
        assert_eq!(graph.routing().locate(299).unwrap(), (1, 43));
        assert!(graph.neighbors(299).unwrap().is_empty());
    }

    #[test]
    fn default_format_loads() {
        let vs: Vec<Vertex<DefaultFormat>> = (10..20).map(Vertex::bare).collect();
        let es: Vec<_> = (10..20).map(|v| Edge::bare(v, 10 + (v + 1) % 10)).collect();
        let graph = BulkLoader::<DefaultFormat>::default().load(&vs, &es).unwrap();
        assert_eq!(graph.pages().len(), 1);
        let n = graph.neighbors(19).unwrap();
        assert_eq!(graph.target(&n[0]).unwrap(), 10);
    }

    proptest! {
        #[test]
        fn every_list_survives_the_split(degrees in proptest::collection::vec(0usize..40, 1..8)) {
            let n = degrees.len() as u32;
            let vs = vertices(0..n);
            let es: Vec<_> = degrees
                .iter()
                .enumerate()
                .flat_map(|(v, d)| (0..*d).map(move |i| Edge::bare(v as u32, i as u32 % n)))
                .collect();
            let graph = BulkLoader::<Tiny>::default().load(&vs, &es).unwrap();
            for (v, d) in degrees.iter().enumerate() {
                let list = graph.neighbors(v as u32).unwrap();
                prop_assert_eq!(list.len(), *d);
                for (i, elem) in list.iter().enumerate() {
                    prop_assert_eq!(graph.target(elem).unwrap(), i as u32 % n);
                }
            }
            let large: Vec<usize> = degrees.iter().copied().filter(|d| *d > 9).collect();
            let ext: u64 = large.iter().map(|d| (d - 9).div_ceil(10) as u64).sum();
            prop_assert_eq!(graph.stats().lp_head_pages, large.len() as u64);
            prop_assert_eq!(graph.stats().lp_ext_pages, ext);
            for page in graph.pages() {
                prop_assert!(page.front() <= page.rear());
            }
        }
    }
}
