//! File watching with scoped rebuilds.
//!
//! The watcher thread observes the parent directories of every declared
//! source and folds the raw notify stream into a debounced set of dirty
//! entries; only those entries rebuild. A burst of changes touching one
//! entry coalesces into a single rebuild. Failed rebuilds keep the
//! previous artifact in the cache and go out over the per-entry error
//! channel instead of tearing the session down.

mod debouncer;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, unbounded};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use crate::build::{ArtifactCache, BuiltArtifact, build_entry};
use crate::entry::EntryGraph;
use crate::fingerprint::fingerprint;
use crate::logger;
use crate::transform::TransformRegistry;

use debouncer::DirtySet;

/// Spawn the watcher thread.
///
/// Runs until the shutdown channel fires (or drops). Errors during setup
/// or dispatch are logged; the serving thread keeps the last good cache.
pub fn spawn(
    graph: Arc<EntryGraph>,
    registry: Arc<TransformRegistry>,
    cache: Arc<ArtifactCache>,
    shutdown: Receiver<()>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(err) = run(&graph, &registry, &cache, &shutdown) {
            crate::log!("error"; "watcher stopped: {err:#}");
        }
    })
}

fn run(
    graph: &EntryGraph,
    registry: &TransformRegistry,
    cache: &ArtifactCache,
    shutdown: &Receiver<()>,
) -> Result<()> {
    let (tx, rx) = unbounded::<notify::Event>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            tx.send(event).ok();
        }
    })
    .context("failed to create file watcher")?;

    let roots = watch_roots(graph);
    for root in &roots {
        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
    }

    crate::log!("watch"; "watching {} director{} for changes",
        roots.len(), if roots.len() == 1 { "y" } else { "ies" });

    let mut dirty = DirtySet::new(graph);

    loop {
        crossbeam::select! {
            recv(shutdown) -> _ => return Ok(()),
            recv(rx) -> event => {
                let Ok(event) = event else { return Ok(()) };
                dirty.note(&event);
            }
            default(dirty.sleep_duration()) => {}
        }

        if let Some(entries) = dirty.take_if_ready() {
            rebuild_dirty(graph, registry, cache, &entries);
        }
    }
}

/// Unique parent directories of every declared source.
///
/// Watching parents rather than files keeps editors that replace files by
/// rename (vim, sed -i) on the radar.
fn watch_roots(graph: &EntryGraph) -> Vec<PathBuf> {
    let mut seen = FxHashSet::default();
    let mut roots = Vec::new();

    for entry in graph.resolve_all() {
        for source in &entry.sources {
            let Some(parent) = source.path.parent() else {
                continue;
            };
            if seen.insert(parent.to_path_buf()) {
                roots.push(parent.to_path_buf());
            }
        }
    }

    roots
}

/// Rebuild the named entries, updating the cache in place.
///
/// Success replaces the entry's artifact and clears its error; failure
/// records the error for that entry only, so an entry broken in an
/// earlier round stays reported until its own rebuild succeeds.
fn rebuild_dirty(
    graph: &EntryGraph,
    registry: &TransformRegistry,
    cache: &ArtifactCache,
    dirty: &[String],
) {
    let mut rebuilt = Vec::new();
    let mut failures = Vec::new();

    for name in dirty {
        let Some(entry) = graph.get(name) else {
            continue;
        };

        match build_entry(entry, registry) {
            Ok(artifact) => {
                let fingerprint = fingerprint(&artifact.bytes);
                crate::debug!("watch"; "rebuilt {} ({} bytes, {fingerprint})",
                    entry.logical_name(), artifact.bytes.len());
                cache.insert(BuiltArtifact {
                    artifact,
                    fingerprint,
                });
                cache.clear_error(name);
                rebuilt.push(entry.logical_name());
            }
            Err(err) => {
                let message = err.to_string();
                cache.record_error(name, message.clone());
                failures.push(message);
            }
        }
    }

    if failures.is_empty() {
        logger::status_success(&format!("rebuilt: {}", rebuilt.join(", ")));
    } else {
        logger::status_error(
            &format!("rebuild failed ({} entr{})",
                failures.len(), if failures.len() == 1 { "y" } else { "ies" }),
            &failures.join("\n"),
        );
    }
}
