//! Development server: resident in-memory executor.
//!
//! Serve mode builds every entry into the artifact cache, binds the HTTP
//! listener, and answers requests straight from memory; nothing is written
//! to the output directory. With watching enabled, a background thread
//! rebuilds dirty entries in place, so the next request observes the new
//! artifact without a restart.

mod lifecycle;
mod response;

pub use lifecycle::setup_shutdown_handler;

use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::build::{ArtifactCache, BuiltArtifact, build_all};
use crate::config::{BuildProfile, PipelineConfig};
use crate::entry::EntryGraph;
use crate::fingerprint::fingerprint;
use crate::manifest::{MANIFEST_FILE, Manifest};
use crate::watch;
use crate::{debug, log};

/// Shared state each request handler needs.
struct ServeContext {
    graph: Arc<EntryGraph>,
    cache: Arc<ArtifactCache>,
    profile: BuildProfile,
}

/// Run the development server until shutdown.
pub fn run(config: &PipelineConfig, profile: &BuildProfile) -> Result<()> {
    let graph = Arc::new(config.entry_graph()?);
    let registry = Arc::new(config.registry(profile.minify)?);
    let cache = Arc::new(ArtifactCache::new());

    // Initial full build: serve never starts with a partial artifact set.
    let artifacts = build_all(&graph, &registry)?;
    let count = artifacts.len();
    for artifact in artifacts {
        let fingerprint = fingerprint(&artifact.bytes);
        cache.insert(BuiltArtifact {
            artifact,
            fingerprint,
        });
    }
    log!("build"; "bundled {} entr{} into memory",
        count, if count == 1 { "y" } else { "ies" });

    let (server, port) = lifecycle::bind_with_retry(&profile.host, profile.port)?;
    let server = Arc::new(server);

    // Port retry may land elsewhere than configured; manifest URLs must
    // point at the listener that actually answers.
    let mut profile = profile.clone();
    if port != profile.port {
        profile.port = port;
        profile.public_base = format!("http://{}:{}", profile.host, port);
    }

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}:{}", profile.host, profile.port);

    let watch_handle = profile.watch.then(|| {
        watch::spawn(
            Arc::clone(&graph),
            Arc::clone(&registry),
            Arc::clone(&cache),
            shutdown_rx,
        )
    });

    let ctx = Arc::new(ServeContext {
        graph,
        cache,
        profile,
    });
    run_request_loop(&server, &ctx);

    lifecycle::wait_for_shutdown(watch_handle);
    Ok(())
}

fn run_request_loop(server: &Server, ctx: &Arc<ServeContext>) {
    // Thread pool keeps one slow client from blocking the rest
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(4).build() {
        Ok(pool) => pool,
        Err(e) => {
            log!("error"; "failed to create request pool: {e}");
            return;
        }
    };

    for request in server.incoming_requests() {
        let ctx = Arc::clone(ctx);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request.
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    if lifecycle::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let url = request.url().to_string();
    let path = url
        .split('?')
        .next()
        .unwrap_or_default()
        .trim_start_matches('/');
    let cors = ctx.profile.cors;

    debug!("serve"; "{} /{path}", request.method());

    if path == "__status" {
        return respond_status(request, ctx, cors);
    }

    if path == MANIFEST_FILE {
        let manifest = current_manifest(ctx);
        return response::respond_json(request, manifest.to_json()?, cors);
    }

    match ctx.cache.resolve(path) {
        Some(artifact) => response::respond_artifact(request, &artifact, cors),
        None => response::respond_not_found(request, cors),
    }
}

/// Manifest reflecting the current cache, in declaration order.
fn current_manifest(ctx: &ServeContext) -> Manifest {
    let built: Vec<BuiltArtifact> = ctx
        .graph
        .resolve_all()
        .iter()
        .filter_map(|entry| ctx.cache.get(&entry.name))
        .map(|arc| (*arc).clone())
        .collect();
    Manifest::from_artifacts(&built, &ctx.profile)
}

/// Errors-only status channel: page reloads surface build failures
/// without scraping the pipeline's terminal.
fn respond_status(request: Request, ctx: &ServeContext, cors: bool) -> Result<()> {
    let errors = ctx.cache.errors();
    let body = serde_json::json!({
        "status": if errors.is_empty() { "ok" } else { "error" },
        "errors": errors,
    });
    response::respond_json(request, body.to_string(), cors)
}
