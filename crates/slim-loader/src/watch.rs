//! File system watcher for watch-mode loading.
//!
//! Watches the project tree recursively and forwards the paths of relevant
//! changes, ignoring `node_modules`, build output and hidden files.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::{Error, Result};

/// Directory names whose contents never trigger a rebuild.
const IGNORED_DIRS: &[&str] = &["node_modules", "dist", "target"];

/// Keeps a recursive watch alive for as long as it is held.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`. Changed paths arrive on the returned receiver.
    ///
    /// Events are dropped when the channel is full: a single pending change is
    /// enough to schedule the next rebuild.
    pub fn new(root: PathBuf) -> Result<(Self, mpsc::Receiver<PathBuf>)> {
        if !root.exists() {
            return Err(Error::EntryNotFound(root));
        }

        let (tx, rx) = mpsc::channel(64);
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if Self::should_ignore(&path, &filter_root) {
                    continue;
                }
                let _ = tx.try_send(path);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub(crate) fn should_ignore(path: &Path, root: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return true;
        };

        relative.components().any(|component| {
            component.as_os_str().to_str().is_some_and(|name| {
                IGNORED_DIRS.contains(&name) || (name.starts_with('.') && name != "." && name != "..")
            })
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_ignore_node_modules() {
        let root = PathBuf::from("/project");

        let path = PathBuf::from("/project/node_modules/hono/dist/hono.js");
        assert!(FileWatcher::should_ignore(&path, &root));

        let path = PathBuf::from("/project/src/index.ts");
        assert!(!FileWatcher::should_ignore(&path, &root));
    }

    #[test]
    fn test_should_ignore_hidden_and_output() {
        let root = PathBuf::from("/project");
        assert!(FileWatcher::should_ignore(Path::new("/project/.git/HEAD"), &root));
        assert!(FileWatcher::should_ignore(Path::new("/project/dist/index.js"), &root));
    }

    #[test]
    fn test_should_ignore_outside_root() {
        let root = PathBuf::from("/project");
        assert!(FileWatcher::should_ignore(Path::new("/etc/passwd"), &root));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let result = FileWatcher::new(PathBuf::from("/nonexistent/slim-watch-root"));
        assert!(matches!(result, Err(Error::EntryNotFound(_))));
    }
}
