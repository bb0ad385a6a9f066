//! HTTP server binary (feature `server`, spec §6 "external collaborator").

use std::path::PathBuf;

use physio_reasoner::config::EngineConfig;
use physio_reasoner::loader::{self, PackDocument};
use physio_reasoner::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let pack_paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let mut documents = Vec::with_capacity(pack_paths.len());
    for path in &pack_paths {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading pack {}: {e}", path.display()))?;
        documents.push(PackDocument::from_yaml_str(&text)?);
    }

    let (graph, diagnostics) = loader::load_pack(&documents)?;
    for diagnostic in &diagnostics {
        tracing::warn!(%diagnostic, "pack diagnostic");
    }
    tracing::info!(
        node_count = graph.node_count(),
        edge_count = graph.edge_count(),
        "graph loaded"
    );

    let state = AppState::new(graph, EngineConfig::from_env());
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
