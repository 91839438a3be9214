use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::{NormalizerConfig, StemmerKind, StopwordList};
use server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Serve boolean and TF-IDF search over a document collection")]
struct Args {
    /// Corpus cache directory or raw document path
    #[arg(long)]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Stopword list used when --index points at raw documents
    #[arg(long, default_value = "combined")]
    stopwords: StopwordList,
    /// Stemmer used when --index points at raw documents
    #[arg(long, default_value = "english")]
    stemmer: StemmerKind,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = NormalizerConfig::new(args.stopwords, args.stemmer);
    let app: Router = build_app(args.index.clone(), config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, index = %args.index, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
