use anyhow::Result;
use axum::Router;
use clap::Parser;
use finder_core::{Bm25Params, FinderConfig};
use finder_server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "finder-server", about = "Search the RFC corpus and browse its topics over HTTP")]
struct Args {
    /// rfc-index.xml from the RFC Editor
    #[arg(long, env = "RFC_FINDER_METADATA", default_value = "./corpus/rfcs/rfc-index.xml")]
    metadata: String,
    /// Index directory written by finder-indexer
    #[arg(long, env = "RFC_FINDER_INDEX", default_value = "./idx")]
    index: String,
    /// Directory holding lda-pgibbs-<k> topic models
    #[arg(long, env = "RFC_FINDER_MODELS", default_value = "./models")]
    models: String,
    /// Topic count of the model served by default
    #[arg(long, default_value_t = 20)]
    topics: usize,
    /// Results per search
    #[arg(long, default_value_t = 10)]
    top_k: usize,
    /// BM25 k1
    #[arg(long, default_value_t = 1.2)]
    k1: f32,
    /// BM25 b
    #[arg(long, default_value_t = 0.785)]
    b: f32,
    /// BM25 k3
    #[arg(long, default_value_t = 500.0)]
    k3: f32,
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = FinderConfig {
        metadata_path: args.metadata.into(),
        index_dir: args.index.into(),
        models_dir: args.models.into(),
        topic_count: args.topics,
        top_k: args.top_k,
        bm25: Bm25Params { k1: args.k1, b: args.b, k3: args.k3 },
        ..FinderConfig::default()
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
