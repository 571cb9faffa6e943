#![allow(missing_docs)]

use slotgraph::storage::{
    page::{DefaultFormat, PageLayout},
    BulkLoader, Edge, LoaderOptions, Vertex,
};

#[test]
fn thousand_edge_list_spans_a_chain() {
    let head = DefaultFormat::MAX_EDGES_IN_HEAD_PAGE;
    let ext = DefaultFormat::MAX_EDGES_IN_EXT_PAGE;
    // Make sure the list cannot fit one page.
    let degree = head + ext + 7;

    let vertices: Vec<Vertex<DefaultFormat>> = (0..4).map(Vertex::bare).collect();
    let edges: Vec<Edge<DefaultFormat>> = (0..degree as u64)
        .map(|i| Edge::bare(1, [0, 2, 3][(i % 3) as usize]))
        .collect();

    let graph = BulkLoader::<DefaultFormat>::new(LoaderOptions::new().first_page_id(7))
        .load(&vertices, &edges)
        .expect("load");
    let stats = graph.stats();
    let ext_pages = (degree - head).div_ceil(ext);
    assert_eq!(ext_pages, 2);
    assert_eq!(stats.lp_head_pages, 1);
    assert_eq!(stats.lp_ext_pages, ext_pages as u64);
    // Vertex 0 before the chain, 2 and 3 after it.
    assert_eq!(stats.small_pages, 2);

    let head_page = graph.page(8).expect("head page");
    assert!(head_page.is_lp_head());
    assert_eq!(head_page.list_size_at(0).unwrap(), degree);
    assert_eq!(head_page.list_at(0).unwrap().len(), head);
    for pid in 9..9 + ext_pages as u32 {
        let page = graph.page(pid).expect("ext page");
        assert!(page.is_lp_extended());
        assert_eq!(page.slot(0).unwrap().vertex_id, 1);
    }
    assert_eq!(graph.page(9).unwrap().list_ext_at(0).unwrap().len(), ext);
    assert_eq!(graph.page(10).unwrap().list_ext_at(0).unwrap().len(), 7);

    let routed: Vec<(u64, u32)> = graph
        .routing()
        .entries()
        .iter()
        .map(|e| (e.start_vid, e.page_id))
        .collect();
    assert_eq!(routed, vec![(0, 7), (1, 8), (2, 11)]);

    let targets: Vec<u64> = graph
        .neighbors(1)
        .unwrap()
        .iter()
        .map(|e| graph.target(e).unwrap())
        .collect();
    let expected: Vec<u64> = (0..degree).map(|i| [0, 2, 3][i % 3]).collect();
    assert_eq!(targets, expected);
}

#[test]
fn thousand_edges_split_across_pages() {
    let vertices: Vec<Vertex<DefaultFormat>> = (0..2).map(Vertex::bare).collect();
    let edges: Vec<Edge<DefaultFormat>> = (0..1000).map(|_| Edge::bare(0, 1)).collect();
    let graph = BulkLoader::<DefaultFormat>::default()
        .load(&vertices, &edges)
        .unwrap();
    let head = DefaultFormat::MAX_EDGES_IN_HEAD_PAGE;
    let ext = DefaultFormat::MAX_EDGES_IN_EXT_PAGE;
    let expected_pages = (1000 - head).div_ceil(ext) + 1;
    assert_eq!(
        (graph.stats().lp_head_pages + graph.stats().lp_ext_pages) as usize,
        expected_pages
    );
    assert_eq!(graph.pages()[0].list_size_at(0).unwrap(), 1000);
    assert_eq!(graph.neighbors(0).unwrap().len(), 1000);
}
