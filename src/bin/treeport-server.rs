//! In-memory development remote speaking the hierarchy, upload, and packfile API.

#![allow(clippy::result_large_err)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use treeport::model::RemoteId;
use treeport::remote::{
    CreateAcquisitionRequest, CreateGroupRequest, CreateProjectRequest, CreateSessionRequest,
    CreatedResponse, PackfileMetadata, PackfileStartResponse, RemoteNode, RemoteUser,
    ResolveRequest, ResolveResult, SubjectRef,
};

#[path = "treeport_server/types.rs"]
mod types;
use self::types::*;
#[path = "treeport_server/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "treeport_server/handlers_system.rs"]
mod handlers_system;
use self::handlers_system::*;
#[path = "treeport_server/handlers_resolve.rs"]
mod handlers_resolve;
use self::handlers_resolve::*;
#[path = "treeport_server/handlers_containers.rs"]
mod handlers_containers;
use self::handlers_containers::*;
#[path = "treeport_server/handlers_files.rs"]
mod handlers_files;
use self::handlers_files::*;
#[path = "treeport_server/routes.rs"]
mod routes;
use self::routes::*;

#[derive(Parser)]
#[command(name = "treeport-server")]
#[command(about = "In-memory hierarchy remote (development)", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// API key clients must present as `scitran-user <key>`
    #[arg(long, default_value = "dev")]
    api_key: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let state = Arc::new(AppState {
        api_key: args.api_key,
        hierarchy: Arc::new(RwLock::new(Hierarchy::default())),
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/debug/events", get(debug_events))
        .merge(authed_router(state.clone()))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;

    let local_addr = listener.local_addr().context("read listener local addr")?;
    info!(%local_addr, "treeport-server listening");

    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
