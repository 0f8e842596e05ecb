//! CFI Locator CLI
//!
//! Locates highlighted text in EPUBs and prints EPUB CFI range references,
//! either for a single query or for every bookmark in a Kobo database.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cfi_locator::annotations::export_bookmarks;
use cfi_locator::cache::CfiCache;
use cfi_locator::config::Config;
use cfi_locator::generator::ExternalGenerator;
use cfi_locator::kobo::KoboDatabase;
use cfi_locator::library::DocumentLibrary;
use cfi_locator::{locate, locate_all};

#[derive(Parser)]
#[command(name = "cfi-locator")]
#[command(about = "Locate highlighted text in EPUBs as CFI ranges", long_about = None)]
struct Args {
    /// Path to the epub-cfi-generator executable
    #[arg(long, global = true)]
    generator: Option<PathBuf>,

    /// Directory for cached generator output
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find text in a single book
    Search {
        /// The EPUB file
        epub: PathBuf,

        /// Text to locate
        text: String,

        /// Print every occurrence instead of the first
        #[arg(long)]
        all: bool,

        /// Maximum occurrences printed with --all
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Export every highlight in a Kobo database as annotations
    Kobo {
        /// KoboReader.sqlite
        db: PathBuf,

        /// Local directory holding the device's books
        #[arg(long)]
        library: PathBuf,

        /// Write annotations here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Annotation color
        #[arg(long)]
        color: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cfi_locator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });
    if let Some(generator) = args.generator {
        config.generator.executable = generator;
    }
    if let Some(cache_dir) = args.cache_dir {
        config.cache.dir = cache_dir;
    }

    match args.command {
        Command::Search {
            epub,
            text,
            all,
            limit,
        } => search(&config, epub, &text, all, limit).await,
        Command::Kobo {
            db,
            library,
            output,
            color,
        } => {
            if let Some(color) = color {
                config.export.highlight_color = color;
            }
            kobo(&config, db, library, output).await
        }
    }
}

async fn search(
    config: &Config,
    epub: PathBuf,
    text: &str,
    all: bool,
    limit: usize,
) -> anyhow::Result<ExitCode> {
    let generator = ExternalGenerator::from_config(&config.generator);
    let cache = CfiCache::new(&config.cache.dir);

    let document = cache
        .load_or_generate(&epub, &generator)
        .await
        .with_context(|| format!("Failed to load CFIs for {}", epub.display()))?;

    if all {
        let references = locate_all(&document, text, limit)?;
        if references.is_empty() {
            eprintln!("Text not found in the EPUB: {}", text);
            return Ok(ExitCode::FAILURE);
        }
        for reference in references {
            println!("{}", reference);
        }
        return Ok(ExitCode::SUCCESS);
    }

    match locate(&document, text) {
        Ok(reference) => {
            println!("{}", reference);
            Ok(ExitCode::SUCCESS)
        }
        Err(cfi_locator::LocateError::NotFound { .. }) => {
            eprintln!("Text not found in the EPUB: {}", text);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn kobo(
    config: &Config,
    db: PathBuf,
    library_dir: PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let database = KoboDatabase::open(&db)
        .await
        .with_context(|| format!("Failed to open Kobo database {}", db.display()))?;
    let bookmarks = database.bookmarks().await?;
    database.close().await;
    tracing::info!("Read {} bookmarks", bookmarks.len());

    let library = DocumentLibrary::new(
        CfiCache::new(&config.cache.dir),
        Arc::new(ExternalGenerator::from_config(&config.generator)),
        config.cache.library_capacity,
    );

    let report = export_bookmarks(
        &library,
        &bookmarks,
        &library_dir,
        &config.export.highlight_color,
    )
    .await;

    for skipped in &report.skipped {
        eprintln!(
            "Skipped bookmark {} ({}): {}",
            skipped.bookmark_id, skipped.volume_id, skipped.reason
        );
    }

    let json = serde_json::to_string_pretty(&report.annotations)?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(
                "Wrote {} annotations to {}",
                report.annotations.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    tracing::info!(
        exported = report.annotations.len(),
        skipped = report.skipped.len(),
        "Processed all bookmarks"
    );
    Ok(ExitCode::SUCCESS)
}
