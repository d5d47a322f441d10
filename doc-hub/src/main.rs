use axum::{routing::get, serve, Router};
use clap::Parser;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use doc_hub_core::events::EventBus;
use doc_hub_core::notify::{BroadcastTransport, ChangeNotifier};
use doc_hub_core::service::DocumentService;
use doc_hub_core::storage::{MemoryStore, UuidGenerator};

use doc_hub::api;

#[derive(Parser)]
#[command(about = "Access-control service for collaborative documents")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let transport = BroadcastTransport::new();
    let mut deliveries = transport.subscribe();
    tokio::spawn(async move {
        while let Ok(note) = deliveries.recv().await {
            info!(
                recipient = note.recipient,
                document_id = %note.document_id,
                "access notification dispatched"
            );
        }
        warn!("notification channel closed");
    });

    let service = Arc::new(DocumentService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(UuidGenerator),
        ChangeNotifier::new(Arc::new(transport)),
        EventBus::new(),
    ));

    let app = Router::new()
        .merge(api::router(service))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&args.addr).await?;
    info!("listening on {}", args.addr);
    serve(listener, app.into_make_service()).into_future().await?;
    Ok(())
}
