//! Pages through one index of a JSON dataset, printing each page.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rangepage::cli::{
    bound, collect_pages, load_dataset, load_options, render_text, PageReport, PageRequest,
};
use rangepage::paging::Paged;
use rangepage::KeyRange;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "rangepage",
    version,
    about = "Page through a key range of an indexed dataset"
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "JSON dataset with tables, indexes and rows")]
    data: PathBuf,

    #[arg(long, help = "Table to read")]
    table: String,

    #[arg(long, default_value = "", help = "Index to walk (empty for the primary key)")]
    index: String,

    #[arg(long, default_value_t = 10, help = "Entries per page")]
    limit: usize,

    #[arg(long, value_name = "KEY", help = "Lower bound, as JSON or bare text")]
    lower: Option<String>,

    #[arg(long, value_name = "KEY", help = "Upper bound, as JSON or bare text")]
    upper: Option<String>,

    #[arg(long, help = "Exclude the lower bound itself")]
    lower_open: bool,

    #[arg(long, help = "Exclude the upper bound itself")]
    upper_open: bool,

    #[arg(long, help = "Return records instead of primary keys")]
    values: bool,

    #[arg(long, help = "Return one entry per distinct indexed key")]
    unique: bool,

    #[arg(long, help = "Walk in descending key order")]
    reverse: bool,

    #[arg(long, value_name = "TOKEN", help = "Resume from an encoded page token")]
    token: Option<String>,

    #[arg(long, default_value_t = 1000, help = "Stop after this many pages")]
    max_pages: usize,

    #[arg(
        long,
        env = "RANGEPAGE_CONFIG",
        value_name = "FILE",
        help = "TOML file with paging options"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for pages"
    )]
    format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
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
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rangepage=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let options = load_options(cli.config.as_deref())?;
    let paged = Paged::with_options(load_dataset(&cli.data)?, options);
    let request = PageRequest {
        table: cli.table,
        index: cli.index,
        range: KeyRange::new(
            bound(cli.lower.as_deref(), cli.lower_open),
            bound(cli.upper.as_deref(), cli.upper_open),
        ),
        limit: cli.limit,
        values: cli.values,
        unique: cli.unique,
        reverse: cli.reverse,
        max_pages: cli.max_pages,
        resume: cli.token,
    };
    let reports = collect_pages(&paged, &request)?;
    emit(cli.format, &reports)
}

fn emit(format: OutputFormat, reports: &[PageReport]) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(reports)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for report in reports {
                println!("{}", render_text(report));
            }
        }
    }
    Ok(())
}
