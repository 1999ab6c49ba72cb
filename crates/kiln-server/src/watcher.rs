//! Filesystem change notifications.

use std::path::PathBuf;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;

/// What happened to the paths of a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// One notification from the filesystem.
///
/// A single event may name several paths; consumers treat them as one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub paths: Vec<PathBuf>,
}

/// Anything that can deliver change events.
pub trait ChangeSource {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Recursive notify watcher over a set of roots.
///
/// Events are forwarded as they arrive, without debouncing.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    sender: broadcast::Sender<ChangeEvent>,
}

impl FileWatcher {
    /// Watch every existing path in `paths` recursively.
    pub fn new(paths: &[PathBuf]) -> Result<Self, notify::Error> {
        let (sender, _) = broadcast::channel(256);
        let forward = sender.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    if let Some(change) = classify_event(event) {
                        // No subscribers yet is fine
                        let _ = forward.send(change);
                    }
                }
                Err(e) => tracing::warn!("Watch error: {}", e),
            }
        })?;

        for path in paths {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
                tracing::debug!("Watching {}", path.display());
            } else {
                tracing::warn!("Not watching missing path {}", path.display());
            }
        }

        Ok(Self {
            _watcher: watcher,
            sender,
        })
    }
}

impl ChangeSource for FileWatcher {
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

fn classify_event(event: notify::Event) -> Option<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        _ => return None,
    };

    if event.paths.is_empty() {
        return None;
    }

    Some(ChangeEvent {
        kind,
        paths: event.paths,
    })
}
