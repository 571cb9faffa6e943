//! Binary entry point for the `slotgraph` page-layout CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use slotgraph::{
    cli::load::{run_load, LayoutReport, LoadConfig, LoadReport},
    storage::{page::DefaultFormat, LoaderOptions},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "slotgraph",
    version,
    about = "Pack graph adjacency lists into slotted pages",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the geometry of the default page format.
    Layout,
    /// Load a CSV edge list into pages.
    Load {
        #[arg(value_name = "EDGES", help = "CSV file with one edge per row")]
        path: PathBuf,

        #[arg(long, default_value = "src", help = "Edge source column name")]
        src_column: String,

        #[arg(long, default_value = "dst", help = "Edge destination column name")]
        dst_column: String,

        #[arg(long, default_value_t = 0, help = "Id of the first produced page")]
        first_page_id: u64,

        #[arg(long, help = "Reject vertex-id gaps instead of starting a new page")]
        no_split_on_gap: bool,

        #[arg(long = "show", value_name = "VID", help = "Print the neighbors of VID")]
        show: Vec<u64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slotgraph=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Layout => {
            let report = LayoutReport::of::<DefaultFormat>();
            emit(&cli.format, &report, |_| print_layout_text(&report))?;
        }
        Command::Load {
            path,
            src_column,
            dst_column,
            first_page_id,
            no_split_on_gap,
            show,
        } => {
            let cfg = LoadConfig {
                path,
                src_column,
                dst_column,
                options: LoaderOptions::new()
                    .first_page_id(first_page_id)
                    .split_on_gap(!no_split_on_gap),
                show,
            };
            let report = run_load(&cfg)?;
            emit(&cli.format, &report, |_| print_load_text(&report))?;
        }
    }

    Ok(())
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_layout_text(report: &LayoutReport) {
    println!("Page layout:");
    println!(
        "  page_size={} footer_size={} data_section_size={}",
        report.page_size, report.footer_size, report.data_section_size
    );
    println!(
        "  slot_size={} adj_elem_size={} list_size_len={}",
        report.slot_size, report.adj_elem_size, report.list_size_len
    );
    println!(
        "  max_edges_in_head_page={} max_edges_in_ext_page={}",
        report.max_edges_in_head_page, report.max_edges_in_ext_page
    );
}

fn print_load_text(report: &LoadReport) {
    let stats = &report.stats;
    println!(
        "Loaded {} vertices and {} edges into {} pages",
        stats.vertices,
        stats.edges,
        stats.pages()
    );
    println!(
        "  small={} lp_head={} lp_ext={}",
        stats.small_pages, stats.lp_head_pages, stats.lp_ext_pages
    );
    for page in &report.pages {
        let role = page
            .role
            .map(|r| format!("{r:?}"))
            .unwrap_or_else(|| "Unknown".to_string());
        println!(
            "  page {}: role={} slots={} front={} rear={} free={}",
            page.page_id, role, page.slots, page.front, page.rear, page.free
        );
    }
    for entry in &report.neighbors {
        let list: Vec<String> = entry.neighbors.iter().map(u64::to_string).collect();
        println!(
            "vertex {} @ page {} slot {}: [{}]",
            entry.vertex,
            entry.page_id,
            entry.slot_offset,
            list.join(", ")
        );
    }
}
