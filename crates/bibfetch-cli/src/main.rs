use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

mod output;

use output::ColorMode;

use bibfetch_core::{
    BibStats, Config, DblpSearch, DocumentCache, Outcome, ProgressEvent, SearchService,
    config_file, resolve_references,
};
use bibfetch_parsing::extract_references;
use bibfetch_pdf_mupdf::MupdfSource;

/// References Downloader - resolve a paper's bibliography against DBLP
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and print the numbered reference list from PDFs
    Refs {
        /// PDF files to analyze
        files: Vec<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve every reference against the search API and emit the records
    Fetch {
        /// PDF files to process
        files: Vec<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Write the bibliography here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker pool size (bounds concurrent search requests)
        #[arg(long)]
        workers: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Search API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Maximum hits requested per query
        #[arg(long)]
        max_hits: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Refs {
            files,
            no_color,
            output,
        } => refs(files, no_color, output),
        Command::Fetch {
            files,
            no_color,
            output,
            workers,
            timeout,
            api_url,
            max_hits,
        } => fetch(files, no_color, output, workers, timeout, api_url, max_hits).await,
    }
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn build_config(
    workers: Option<usize>,
    timeout: Option<u64>,
    api_url: Option<String>,
    max_hits: Option<u32>,
) -> Config {
    let mut config = Config::default();
    config_file::load_config().apply_to(&mut config);

    if let Ok(api_base) = std::env::var("BIBFETCH_API_URL") {
        config.api_base = api_base;
    }
    if let Some(secs) = std::env::var("BIBFETCH_TIMEOUT")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.http_timeout_secs = secs;
    }
    if let Some(n) = std::env::var("BIBFETCH_WORKERS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.num_workers = n;
    }

    if let Some(api_base) = api_url {
        config.api_base = api_base;
    }
    if let Some(secs) = timeout {
        config.http_timeout_secs = secs;
    }
    if let Some(n) = workers {
        config.num_workers = n;
    }
    if let Some(h) = max_hits {
        config.max_hits = h;
    }
    config
}

fn open_writer(output: &Option<PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(if let Some(path) = output {
        Box::new(std::fs::File::create(path)?)
    } else {
        Box::new(std::io::stdout())
    })
}

fn file_name_of(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn refs(files: Vec<PathBuf>, no_color: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    if files.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let use_color = !no_color && output.is_none();
    let color = ColorMode(use_color);
    let mut writer = open_writer(&output)?;

    let source = MupdfSource::new();
    let cache = DocumentCache::new();

    for file in &files {
        let file_name = file_name_of(file);
        if !file.exists() {
            output::print_file_error(&mut writer, &file_name, "file not found", color)?;
            continue;
        }
        match cache.refs_or_build(file, || extract_references(file, &source)) {
            Ok(refs) => {
                output::print_reference_list(&mut writer, &file_name, &refs, color)?;
            }
            Err(err) => {
                output::print_file_error(&mut writer, &file_name, &err.to_string(), color)?;
            }
        }
    }
    Ok(())
}

async fn fetch(
    files: Vec<PathBuf>,
    no_color: bool,
    output: Option<PathBuf>,
    workers: Option<usize>,
    timeout: Option<u64>,
    api_url: Option<String>,
    max_hits: Option<u32>,
) -> anyhow::Result<()> {
    if files.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let config = Arc::new(build_config(workers, timeout, api_url, max_hits));
    let service: Arc<dyn SearchService> = Arc::new(DblpSearch::from_config(&config));

    let use_color = !no_color && output.is_none();
    let color = ColorMode(use_color);
    let mut writer = open_writer(&output)?;

    // Summaries go to stderr when the bibliography itself is on stdout.
    let mut info_writer: Box<dyn Write> = if output.is_some() {
        Box::new(std::io::stdout())
    } else {
        Box::new(std::io::stderr())
    };

    let source = MupdfSource::new();
    let cache = DocumentCache::new();

    for file in &files {
        let file_name = file_name_of(file);
        if !file.exists() {
            output::print_file_error(&mut info_writer, &file_name, "file not found", color)?;
            continue;
        }

        let refs = match cache.refs_or_build(file, || extract_references(file, &source)) {
            Ok(refs) => refs,
            Err(err) => {
                output::print_file_error(&mut info_writer, &file_name, &err.to_string(), color)?;
                continue;
            }
        };
        output::print_extraction_summary(&mut info_writer, &file_name, refs.len())?;

        let bar = ProgressBar::new(refs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {msg} [{bar:40.cyan/dim}] {pos}/{len}",
            )?
            .progress_chars("=> "),
        );
        bar.set_message(file_name.clone());

        let stats: Arc<Mutex<Option<BibStats>>> = Arc::new(Mutex::new(None));
        let bib_text = {
            let refs = Arc::clone(&refs);
            let config = Arc::clone(&config);
            let service = Arc::clone(&service);
            let bar = bar.clone();
            let stats = Arc::clone(&stats);
            cache
                .bib_or_build(file, async move {
                    let bibliography = resolve_references(
                        &refs,
                        config,
                        service,
                        move |event| {
                            if let ProgressEvent::Resolved { outcome, .. } = event {
                                let mut stats =
                                    stats.lock().unwrap_or_else(|e| e.into_inner());
                                let stats = stats.get_or_insert_with(BibStats::default);
                                stats.total += 1;
                                match outcome {
                                    Outcome::Found => stats.found += 1,
                                    Outcome::NotFound => stats.not_found += 1,
                                    Outcome::ServerError => stats.server_errors += 1,
                                }
                                bar.inc(1);
                            }
                        },
                    )
                    .await;
                    Ok::<_, anyhow::Error>(bibliography.render())
                })
                .await?
        };
        bar.finish_and_clear();

        let stats = stats.lock().unwrap_or_else(|e| e.into_inner()).take();
        output::print_fetch_summary(&mut info_writer, &file_name, stats, color)?;

        write!(writer, "{}", bib_text)?;
        writer.flush()?;
    }

    Ok(())
}
