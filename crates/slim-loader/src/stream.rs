//! The application sequence shared by the optimizer and sibling tools.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::ApplicationHandle;
use crate::compile::{BuildMode, compile, resolve_entry};
use crate::execute::{Executor, NodeExecutor};
use crate::options::LoadOptions;
use crate::watch::FileWatcher;
use crate::Result;

/// Ordered sequence of loaded applications.
///
/// The channel holds a single item: the producer suspends after each handle
/// until the consumer has taken the previous one. Dropping the stream (or
/// calling [`AppStream::close`]) ends the watch session once any in-flight
/// build has finished.
pub struct AppStream {
    rx: mpsc::Receiver<Result<ApplicationHandle>>,
    producer: JoinHandle<()>,
}

impl AppStream {
    /// Next application, or `None` once the sequence has ended.
    pub async fn next(&mut self) -> Option<Result<ApplicationHandle>> {
        self.rx.recv().await
    }

    /// Stop accepting new items. Already produced items can still be drained.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Whether the producer has exited.
    pub fn is_finished(&self) -> bool {
        self.producer.is_finished()
    }
}

/// Load `entry` with the default Node.js executor.
///
/// Must be called from within a Tokio runtime.
pub fn load(entry: impl AsRef<Path>, options: LoadOptions) -> AppStream {
    load_with(entry, options, Arc::new(NodeExecutor::new()))
}

/// Load `entry`, evaluating each build with `executor`.
pub fn load_with(
    entry: impl AsRef<Path>,
    options: LoadOptions,
    executor: Arc<dyn Executor>,
) -> AppStream {
    let (tx, rx) = mpsc::channel(1);
    let entry = entry.as_ref().to_path_buf();

    let producer = tokio::spawn(async move {
        if options.watch {
            watch_loop(entry, options, executor, tx).await;
        } else {
            let item = build_application(&entry, &options, executor.as_ref()).await;
            let _ = tx.send(item).await;
        }
    });

    AppStream { rx, producer }
}

/// One probe build plus evaluation.
pub async fn build_application(
    entry: &Path,
    options: &LoadOptions,
    executor: &dyn Executor,
) -> Result<ApplicationHandle> {
    let bundle = compile(entry, options, BuildMode::Probe).await?;
    let report = executor.execute(&bundle).await?;
    report.into_handle(bundle)
}

async fn watch_loop(
    entry: PathBuf,
    options: LoadOptions,
    executor: Arc<dyn Executor>,
    tx: mpsc::Sender<Result<ApplicationHandle>>,
) {
    let entry = match resolve_entry(&entry, &options) {
        Ok(entry) => entry,
        Err(err) => {
            let _ = tx.send(Err(err)).await;
            return;
        }
    };
    let root = options
        .cwd
        .clone()
        .or_else(|| entry.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let (watcher, mut changes) = match FileWatcher::new(root) {
        Ok(pair) => pair,
        Err(err) => {
            let _ = tx.send(Err(err)).await;
            return;
        }
    };
    info!(root = %watcher.root().display(), "watching for changes");

    loop {
        match build_application(&entry, &options, executor.as_ref()).await {
            Ok(app) => {
                if tx.send(Ok(app)).await.is_err() {
                    break;
                }
            }
            Err(err) => warn!(error = %err, "rebuild failed, waiting for changes"),
        }

        let changed = tokio::select! {
            _ = tx.closed() => None,
            changed = changes.recv() => changed,
        };
        let Some(first) = changed else {
            break;
        };
        debug!(path = %first.display(), "change detected");

        // Coalesce the rest of the burst into this rebuild.
        while let Ok(Some(path)) = tokio::time::timeout(options.debounce, changes.recv()).await {
            debug!(path = %path.display(), "change coalesced");
        }
    }

    debug!("watch session closed");
}
