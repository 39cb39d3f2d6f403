use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finder_core::docid::is_corpus_file_name;
use finder_core::persist::IndexPaths;
use finder_core::{CorpusIndex, IndexBuilder};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "finder-indexer")]
#[command(about = "Build the RFC corpus index used by the search service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every rfc<digits>.txt file of a corpus directory
    Build {
        /// Directory holding the RFC text files (the rsync mirror)
        #[arg(long, default_value = "./corpus/rfcs")]
        corpus: String,
        /// Output index directory
        #[arg(long, default_value = "./idx")]
        output: String,
    },
    /// Print the header of an existing index
    Stats {
        #[arg(long, default_value = "./idx")]
        index: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, output } => build_index(Path::new(&corpus), &IndexPaths::new(output)),
        Commands::Stats { index } => {
            let idx = CorpusIndex::open(IndexPaths::new(index))?;
            println!("{}", serde_json::to_string_pretty(idx.meta())?);
            Ok(())
        }
    }
}

/// Corpus file names in listing order. Only the top level is scanned, like the rsync mirror layout.
fn corpus_files(corpus: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(corpus).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("scanning {}", corpus.display()))?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && is_corpus_file_name(&name) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn build_index(corpus: &Path, out_paths: &IndexPaths) -> Result<()> {
    let start = Instant::now();
    let files = corpus_files(corpus)?;
    if files.is_empty() {
        anyhow::bail!("no rfc<digits>.txt files under {}", corpus.display());
    }
    tracing::info!(corpus = %corpus.display(), files = files.len(), "indexing corpus");

    // Rebuild from scratch so postings of vanished terms do not linger.
    if out_paths.root.exists() {
        fs::remove_dir_all(&out_paths.root).with_context(|| format!("clearing {}", out_paths.root.display()))?;
    }

    let mut builder = IndexBuilder::new();
    for file in &files {
        let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        // A handful of old RFCs are Latin-1.
        let text = String::from_utf8_lossy(&bytes);
        let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        builder.add_document(format!("rfcs/{name}"), &text);
    }

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let meta = builder.write(out_paths, created_at)?;
    tracing::info!(
        output = %out_paths.root.display(),
        num_docs = meta.num_docs,
        unique_terms = meta.unique_terms,
        avg_doc_length = meta.avg_doc_length,
        elapsed_s = start.elapsed().as_secs(),
        "index build complete"
    );
    Ok(())
}
