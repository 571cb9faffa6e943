use std::collections::BTreeSet;
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::primitives::bytes::le::FixedWidth;
use crate::storage::page::{DefaultFormat, PageLayout, PageRole};
use crate::storage::{BulkLoader, Edge, LoadedGraph, LoaderOptions, LoaderStats, Vertex};
use crate::types::PageError;

/// Configuration for loading an edge list.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Path to the CSV file containing edges.
    pub path: PathBuf,
    /// Name of the CSV column containing source vertex ids.
    pub src_column: String,
    /// Name of the CSV column containing destination vertex ids.
    pub dst_column: String,
    /// Loader options.
    pub options: LoaderOptions,
    /// Vertices whose resolved neighbor lists are reported.
    pub show: Vec<u64>,
}

impl LoadConfig {
    /// Config reading `src`/`dst` columns from `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            src_column: "src".into(),
            dst_column: "dst".into(),
            options: LoaderOptions::default(),
            show: Vec::new(),
        }
    }
}

/// Geometry of one page format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    /// Total page size.
    pub page_size: usize,
    /// Footer size.
    pub footer_size: usize,
    /// Bytes shared by lists and slots.
    pub data_section_size: usize,
    /// Slot directory entry size.
    pub slot_size: usize,
    /// Adjacency element size.
    pub adj_elem_size: usize,
    /// List header size.
    pub list_size_len: usize,
    /// Elements stored in an LP-head page.
    pub max_edges_in_head_page: usize,
    /// Elements stored in an LP-extended page.
    pub max_edges_in_ext_page: usize,
}

impl LayoutReport {
    /// Report for format `F`.
    pub fn of<F: PageLayout>() -> Self {
        Self {
            page_size: F::PAGE_SIZE,
            footer_size: F::FOOTER_SIZE,
            data_section_size: F::DATA_SECTION_SIZE,
            slot_size: F::SLOT_SIZE,
            adj_elem_size: F::ADJ_ELEM_SIZE,
            list_size_len: F::LIST_SIZE_LEN,
            max_edges_in_head_page: F::MAX_EDGES_IN_HEAD_PAGE,
            max_edges_in_ext_page: F::MAX_EDGES_IN_EXT_PAGE,
        }
    }
}

/// Summary of one sealed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    /// Page id.
    pub page_id: u64,
    /// Role decoded from the footer flags.
    pub role: Option<PageRole>,
    /// Slot directory entries.
    pub slots: usize,
    /// Footer `front` pointer.
    pub front: usize,
    /// Footer `rear` pointer.
    pub rear: usize,
    /// Unused bytes between the two.
    pub free: usize,
}

/// Resolved adjacency of one vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborReport {
    /// Vertex id.
    pub vertex: u64,
    /// Page holding its slot.
    pub page_id: u64,
    /// Slot index inside that page.
    pub slot_offset: u64,
    /// Destination vertex of every adjacency element, in list order.
    pub neighbors: Vec<u64>,
}

/// Result of [`run_load`].
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Loader counters.
    pub stats: LoaderStats,
    /// Geometry the pages were built with.
    pub layout: LayoutReport,
    /// Every page in id order.
    pub pages: Vec<PageSummary>,
    /// Requested neighbor lists.
    pub neighbors: Vec<NeighborReport>,
}

/// Error type for CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV parsing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Page or loader error.
    #[error(transparent)]
    Page(#[from] PageError),
}

/// Reads the edge list, loads it with the default page format and
/// summarizes the result.
///
/// Every vertex mentioned by an edge is loaded, in ascending id order.
pub fn run_load(cfg: &LoadConfig) -> Result<LoadReport, CliError> {
    let edges = read_edges(cfg)?;
    let vertices: Vec<Vertex<DefaultFormat>> = edges
        .iter()
        .flat_map(|e| [e.src, e.dst])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Vertex::bare)
        .collect();
    debug!(
        path = %cfg.path.display(),
        vertices = vertices.len(),
        edges = edges.len(),
        "cli.load.read"
    );

    let graph = BulkLoader::<DefaultFormat>::new(cfg.options).load(&vertices, &edges)?;
    let neighbors = cfg
        .show
        .iter()
        .map(|vid| neighbor_report(&graph, *vid))
        .collect::<Result<Vec<_>, _>>()?;
    let stats = graph.stats();
    info!(pages = stats.pages(), edges = stats.edges, "cli.load.done");

    Ok(LoadReport {
        stats,
        layout: LayoutReport::of::<DefaultFormat>(),
        pages: graph
            .pages_with_ids()
            .map(|(page_id, page)| PageSummary {
                page_id,
                role: page.role(),
                slots: page.number_of_slots(),
                front: page.front(),
                rear: page.rear(),
                free: page.free_space(),
            })
            .collect(),
        neighbors,
    })
}

fn read_edges(cfg: &LoadConfig) -> Result<Vec<Edge<DefaultFormat>>, CliError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(&cfg.path)?;
    let headers = reader.headers()?.clone();
    let src_index = find_column(&headers, &cfg.src_column)?;
    let dst_index = find_column(&headers, &cfg.dst_column)?;

    let mut edges = Vec::new();
    for result in reader.records() {
        let record = result?;
        let src = parse_id(&record, src_index, &cfg.src_column)?;
        let dst = parse_id(&record, dst_index, &cfg.dst_column)?;
        edges.push(Edge::bare(src, dst));
    }
    Ok(edges)
}

fn neighbor_report(
    graph: &LoadedGraph<DefaultFormat>,
    vid: u64,
) -> Result<NeighborReport, CliError> {
    let (page_id, slot_offset) = graph.routing().locate(vid)?;
    let neighbors = graph
        .neighbors(vid)?
        .iter()
        .map(|elem| graph.target(elem))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(NeighborReport {
        vertex: vid,
        page_id: page_id.to_u64(),
        slot_offset: slot_offset.to_u64(),
        neighbors,
    })
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::Message(format!("column '{}' not found", name)))
}

fn parse_id(record: &StringRecord, idx: usize, name: &str) -> Result<u64, CliError> {
    let raw = record
        .get(idx)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CliError::Message(format!("missing value for column '{}'", name)))?;
    raw.parse::<u64>().map_err(|_| {
        CliError::Message(format!(
            "invalid vertex id '{}' in column '{}'",
            raw, name
        ))
    })
}
