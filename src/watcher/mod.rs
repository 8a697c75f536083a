//! Reloading inputs when they change on disk.
//!
//! The CLI re-runs a replay whenever the page description or the script is
//! saved. Editors tend to write a file in several steps, so change events are
//! debounced before they are reported.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

/// One file of interest.
#[derive(Debug)]
struct Target {
    path: PathBuf,
    name: Option<OsString>,
    root: PathBuf,
}

impl Target {
    fn new(path: &Path) -> Self {
        // Event paths from the OS are canonical; compare against the same form.
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let name = path.file_name().map(std::ffi::OsStr::to_os_string);
        let root = watch_root_for(&path);
        Self { path, name, root }
    }

    fn matches(&self, path: &Path) -> bool {
        path == self.root
            || path == self.path
            || self
                .name
                .as_ref()
                .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
    }
}

/// Watches a set of files and emits debounced change notifications.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    targets: Vec<Target>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("targets", &self.targets)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Watch every file in `paths`. Their directories are watched
    /// non-recursively, each at most once.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or a directory
    /// cannot be watched.
    pub fn new<P: AsRef<Path>>(paths: &[P], debounce: Duration) -> notify::Result<Self> {
        let targets: Vec<Target> = paths.iter().map(|p| Target::new(p.as_ref())).collect();

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        let mut roots: Vec<&Path> = Vec::new();
        for target in &targets {
            if !roots.contains(&target.root.as_path()) {
                watcher.watch(&target.root, RecursiveMode::NonRecursive)?;
                roots.push(&target.root);
            }
        }
        debug!(files = targets.len(), dirs = roots.len(), "watching inputs");

        Ok(Self {
            _watcher: watcher,
            rx,
            targets,
            debounce,
            pending_since: None,
        })
    }

    /// Canonical paths of the watched files.
    pub fn target_paths(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(|t| t.path.as_path())
    }

    /// Returns true once a debounced change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => {
                    trace!(kind = ?ev.kind, paths = ?ev.paths, "input changed");
                    saw_relevant_event = true;
                }
                Ok(ev) => trace!(kind = ?ev.kind, paths = ?ev.paths, "ignored fs event"),
                Err(err) => warn!(%err, "file watcher error"),
            }
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event
            .paths
            .iter()
            .any(|path| self.targets.iter().any(|t| t.matches(path)))
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
