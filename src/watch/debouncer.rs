use std::path::Path;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;

use crate::entry::EntryGraph;
use crate::utils::path::normalize_path;

/// Quiet period after the last interesting event before a rebuild fires.
pub(super) const QUIET_PERIOD_MS: u64 = 300;
/// Minimum spacing between rebuild rounds, so editors that save in
/// bursts (format-on-save, session restore) trigger one round, not many.
pub(super) const REBUILD_SPACING_MS: u64 = 800;

/// Accumulates dirty entries from the raw notify stream.
///
/// Routing happens at event time: a changed path marks every entry that
/// references it, and everything else (untracked files, editor temp
/// files, metadata-only touches) is discarded on arrival. By the time a
/// round fires, only entry identities remain — several saves to one
/// entry's sources coalesce into a single rebuild of that entry.
pub(super) struct DirtySet<'a> {
    graph: &'a EntryGraph,
    dirty: FxHashSet<String>,
    last_event: Option<Instant>,
    last_round: Option<Instant>,
}

impl<'a> DirtySet<'a> {
    pub(super) fn new(graph: &'a EntryGraph) -> Self {
        Self {
            graph,
            dirty: FxHashSet::default(),
            last_event: None,
            last_round: None,
        }
    }

    /// Fold one notify event into the dirty set.
    ///
    /// Creations, removals and content modifications all mark the owning
    /// entries dirty; a removed source simply fails its rebuild, which
    /// the rebuild loop reports while keeping the last good artifact.
    pub(super) fn note(&mut self, event: &notify::Event) {
        use notify::EventKind;

        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // Content only: mtime/chmod touches rebuild nothing
            EventKind::Modify(modify) => {
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
            }
            _ => return,
        }

        for path in &event.paths {
            if is_editor_noise(path) {
                continue;
            }

            let path = normalize_path(path);
            for name in self.graph.entries_for_source(&path) {
                if self.dirty.insert(name.to_string()) {
                    crate::debug!("watch"; "{} dirties entry `{name}`", path.display());
                }
                self.last_event = Some(Instant::now());
            }
        }
    }

    /// Take the dirty entries if the quiet period and round spacing have
    /// both elapsed. Names come back in declaration order, matching the
    /// order a full build would visit them.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<String>> {
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        self.last_round = Some(Instant::now());

        let mut dirty = std::mem::take(&mut self.dirty);
        let ordered = self
            .graph
            .resolve_all()
            .iter()
            .filter(|entry| dirty.remove(&entry.name))
            .map(|entry| entry.name.clone())
            .collect();
        Some(ordered)
    }

    fn is_ready(&self) -> bool {
        if self.dirty.is_empty() {
            return false;
        }

        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < Duration::from_millis(QUIET_PERIOD_MS) {
            return false;
        }

        match self.last_round {
            Some(last) => last.elapsed() >= Duration::from_millis(REBUILD_SPACING_MS),
            None => true,
        }
    }

    /// How long the watch loop may sleep before this set could fire.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            // Idle: nothing pending, wake only for the next event
            return Duration::from_secs(3600);
        };

        let quiet = Duration::from_millis(QUIET_PERIOD_MS).saturating_sub(last_event.elapsed());
        let spacing = self
            .last_round
            .map(|t| Duration::from_millis(REBUILD_SPACING_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        quiet.max(spacing).max(Duration::from_millis(1))
    }
}

/// Paths editors produce while saving, never build inputs.
fn is_editor_noise(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    name.starts_with('.')
        || name.ends_with('~')
        || matches!(ext, "swp" | "swo" | "tmp" | "bak" | "bck" | "backup")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AssetKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn graph(dir: &TempDir) -> EntryGraph {
        let mut graph = EntryGraph::new();
        for (entry, file) in [("app", "a.js"), ("admin", "b.js")] {
            let path = dir.path().join(file);
            std::fs::write(&path, "//").unwrap();
            graph.define(entry, AssetKind::Script, vec![path]).unwrap();
        }
        graph
    }

    fn modify_event(path: PathBuf) -> notify::Event {
        notify::Event::new(notify::EventKind::Modify(notify::event::ModifyKind::Data(
            notify::event::DataChange::Content,
        )))
        .add_path(path)
    }

    #[test]
    fn test_event_routes_to_owning_entry() {
        let dir = TempDir::new().unwrap();
        let graph = graph(&dir);
        let mut set = DirtySet::new(&graph);

        set.note(&modify_event(dir.path().join("a.js")));
        assert!(set.dirty.contains("app"));
        assert!(!set.dirty.contains("admin"));
    }

    #[test]
    fn test_untracked_and_noise_paths_discarded() {
        let dir = TempDir::new().unwrap();
        let graph = graph(&dir);
        let mut set = DirtySet::new(&graph);

        set.note(&modify_event(dir.path().join("unrelated.txt")));
        set.note(&modify_event(dir.path().join("a.js.swp")));
        set.note(&modify_event(dir.path().join(".a.js")));
        assert!(set.dirty.is_empty());
        assert!(set.last_event.is_none());
    }

    #[test]
    fn test_repeated_saves_coalesce_into_one_entry() {
        let dir = TempDir::new().unwrap();
        let graph = graph(&dir);
        let mut set = DirtySet::new(&graph);

        set.note(&modify_event(dir.path().join("a.js")));
        set.note(&modify_event(dir.path().join("a.js")));
        set.note(&modify_event(dir.path().join("a.js")));
        assert_eq!(set.dirty.len(), 1);
    }

    #[test]
    fn test_take_respects_quiet_period_and_orders_by_declaration() {
        let dir = TempDir::new().unwrap();
        let graph = graph(&dir);
        let mut set = DirtySet::new(&graph);

        // admin first, app second: take must restore declaration order
        set.note(&modify_event(dir.path().join("b.js")));
        set.note(&modify_event(dir.path().join("a.js")));

        // Too soon after the events
        assert!(set.take_if_ready().is_none());

        // Pretend the quiet period passed
        set.last_event = Some(Instant::now() - Duration::from_millis(QUIET_PERIOD_MS + 10));
        let dirty = set.take_if_ready().unwrap();
        assert_eq!(dirty, ["app", "admin"]);
        assert!(set.dirty.is_empty());
    }

    #[test]
    fn test_round_spacing_delays_next_take() {
        let dir = TempDir::new().unwrap();
        let graph = graph(&dir);
        let mut set = DirtySet::new(&graph);

        set.note(&modify_event(dir.path().join("a.js")));
        set.last_event = Some(Instant::now() - Duration::from_millis(QUIET_PERIOD_MS + 10));
        assert!(set.take_if_ready().is_some());

        // A fresh change right after a round waits out the spacing
        set.note(&modify_event(dir.path().join("a.js")));
        set.last_event = Some(Instant::now() - Duration::from_millis(QUIET_PERIOD_MS + 10));
        assert!(set.take_if_ready().is_none());
        assert!(set.sleep_duration() > Duration::ZERO);
    }
}
