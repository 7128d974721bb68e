//! Filesystem watching that keeps the index in sync with a directory tree.
//!
//! The watcher registers a root directory and every subdirectory for OS
//! change notifications, classifies incoming events, and dispatches them to
//! a small worker pool that calls into the indexing service. Each directory
//! is registered individually so newly created subtrees are picked up
//! explicitly and the registration count stays observable.

mod config;

pub use config::WatcherConfig;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, TermdexError};
use crate::retry::RetryPolicy;
use crate::service::IndexingService;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
const SHUTDOWN_FORCE: Duration = Duration::from_secs(1);

enum WatchTask {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

/// State shared between the watcher handle, its event loop, and the workers.
struct WatcherShared {
    service: Arc<IndexingService>,
    config: WatcherConfig,
    os_watcher: Mutex<Option<RecommendedWatcher>>,
    watched_directories: AtomicU64,
    retry: RetryPolicy,
    root: Mutex<Option<PathBuf>>,
}

impl WatcherShared {
    fn is_indexable_file(&self, path: &Path) -> bool {
        if path.is_dir() {
            return false;
        }
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.config.should_watch(name))
    }

    /// Register a single directory for notifications, retrying with backoff.
    fn register_directory(&self, directory: &Path) -> Result<()> {
        let context = directory.display().to_string();
        self.retry
            .run("register directory for watching", &context, || {
                let mut guard = self.os_watcher.lock();
                let Some(watcher) = guard.as_mut() else {
                    return Err(notify::Error::generic("watcher is closed"));
                };
                watcher.watch(directory, RecursiveMode::NonRecursive)
            })
            .map_err(|e| {
                TermdexError::Watcher(format!("cannot watch {}: {e}", directory.display()))
            })?;
        self.watched_directories.fetch_add(1, Ordering::Relaxed);
        info!("Registered directory for watching: {}", directory.display());
        Ok(())
    }

    /// Register a directory and all its current subdirectories.
    fn register_tree(&self, root: &Path) -> Result<()> {
        self.register_directory(root)?;
        for entry in WalkDir::new(root).min_depth(1) {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    self.register_directory(entry.path())?;
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to visit directory: {}", e),
            }
        }
        Ok(())
    }

    fn handle_created(&self, path: &Path) {
        if path.is_dir() {
            let under_root = self
                .root
                .lock()
                .as_deref()
                .is_some_and(|root| path.starts_with(root));
            if under_root {
                // a new subtree appeared while watching; registration is
                // best-effort here, the loop keeps running either way
                match self.register_tree(path) {
                    Ok(()) => info!("New directory registered for watching: {}", path.display()),
                    Err(e) => {
                        error!("Failed to register new directory {}: {}", path.display(), e)
                    }
                }
            }
        } else if self.is_indexable_file(path) {
            if self.service.index_file(path) {
                info!("New file indexed: {}", path.display());
            } else {
                warn!("Failed to index new file: {}", path.display());
            }
        } else {
            debug!("Created path is not indexable, skipping: {}", path.display());
        }
    }

    fn handle_modified(&self, path: &Path) {
        if self.is_indexable_file(path) {
            if self.service.index_file(path) {
                info!("Modified file re-indexed: {}", path.display());
            } else {
                warn!("Failed to re-index modified file: {}", path.display());
            }
        } else {
            debug!("Modified path is not indexable, skipping: {}", path.display());
        }
    }

    fn handle_removed(&self, path: &Path) {
        if self.service.remove_file(path) {
            info!("File removed from index: {}", path.display());
        } else {
            debug!("Removed path was not indexed: {}", path.display());
        }
    }
}

/// Monitors a directory tree and keeps the indexing service in sync with
/// file creation, modification, and deletion.
///
/// The watcher owns its OS handle and worker pool; both are released by
/// [`FileSystemWatcher::stop`], which also runs on drop.
pub struct FileSystemWatcher {
    shared: Arc<WatcherShared>,
    running: Arc<AtomicBool>,
    event_loop: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    task_tx: Option<Sender<WatchTask>>,
}

impl FileSystemWatcher {
    pub fn new(service: Arc<IndexingService>, config: WatcherConfig) -> Self {
        Self {
            shared: Arc::new(WatcherShared {
                service,
                config,
                os_watcher: Mutex::new(None),
                watched_directories: AtomicU64::new(0),
                retry: RetryPolicy::default(),
                root: Mutex::new(None),
            }),
            running: Arc::new(AtomicBool::new(false)),
            event_loop: None,
            workers: Vec::new(),
            task_tx: None,
        }
    }

    /// Start watching a directory tree.
    ///
    /// When `index_existing` is set, the tree is indexed first (inside the
    /// retry wrapper; exhaustion is logged and watching proceeds anyway).
    /// Fails with `InvalidInput` when the root does not exist or is not a
    /// directory, and with `Watcher` when the OS refuses the initial
    /// registrations.
    pub fn start(&mut self, root: &Path, index_existing: bool) -> Result<()> {
        if !root.exists() {
            return Err(TermdexError::invalid_input(format!(
                "directory does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(TermdexError::invalid_input(format!(
                "path is not a directory: {}",
                root.display()
            )));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(TermdexError::Watcher(
                "watcher is already running".to_string(),
            ));
        }

        info!("Starting filesystem watching for: {}", root.display());
        *self.shared.root.lock() = Some(root.to_path_buf());

        if index_existing {
            info!("Indexing existing files before starting to watch...");
            let service = Arc::clone(&self.shared.service);
            let context = root.display().to_string();
            let indexed = self.shared.retry.run_opt(
                "index existing files",
                &context,
                || -> std::io::Result<usize> {
                    // probe that the root is readable before walking it
                    std::fs::read_dir(root)?;
                    Ok(service.index_directory(root))
                },
            );
            match indexed {
                Some(count) => info!("Indexed {} existing files", count),
                None => error!(
                    "Failed to index existing files after all retries, continuing with watching"
                ),
            }
        }

        // raw OS events flow over a std channel into the event loop;
        // classified tasks go to the worker pool over a crossbeam channel
        let (raw_tx, raw_rx) = mpsc::channel::<notify::Result<Event>>();
        let os_watcher = match RecommendedWatcher::new(
            move |res| {
                let _ = raw_tx.send(res);
            },
            notify::Config::default(),
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                self.abort_start();
                return Err(TermdexError::Watcher(format!(
                    "cannot create OS watcher: {e}"
                )));
            }
        };
        *self.shared.os_watcher.lock() = Some(os_watcher);

        if let Err(e) = self.shared.register_tree(root) {
            self.abort_start();
            return Err(e);
        }

        let (task_tx, task_rx) = channel::unbounded::<WatchTask>();
        for worker_id in 0..self.shared.config.pool_size() {
            let shared = Arc::clone(&self.shared);
            let task_rx = task_rx.clone();
            self.workers.push(thread::spawn(move || {
                debug!("Watcher worker {} started", worker_id);
                while let Ok(task) = task_rx.recv() {
                    match task {
                        WatchTask::Created(path) => shared.handle_created(&path),
                        WatchTask::Modified(path) => shared.handle_modified(&path),
                        WatchTask::Removed(path) => shared.handle_removed(&path),
                    }
                }
                debug!("Watcher worker {} stopped", worker_id);
            }));
        }

        let running = Arc::clone(&self.running);
        let poll_timeout = self.shared.config.poll_timeout();
        let loop_tx = task_tx.clone();
        self.event_loop = Some(thread::spawn(move || {
            info!("Watcher event loop started");
            while running.load(Ordering::SeqCst) {
                match raw_rx.recv_timeout(poll_timeout) {
                    Ok(Ok(event)) => dispatch_event(event, &loop_tx),
                    Ok(Err(e)) => warn!("Filesystem notification error: {}", e),
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        info!("Watch channel closed, stopping event loop");
                        break;
                    }
                }
            }
            info!("Watcher event loop ended");
        }));
        self.task_tx = Some(task_tx);

        info!("Filesystem watching started successfully");
        Ok(())
    }

    /// Stop watching and release the OS handle and worker pool. Safe to call
    /// repeatedly.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if !was_running && self.event_loop.is_none() && self.workers.is_empty() {
            return;
        }
        info!("Stopping filesystem watcher...");

        // the loop re-checks the running flag at every poll timeout
        if let Some(handle) = self.event_loop.take() {
            if handle.join().is_err() {
                error!("Watcher event loop panicked");
            }
        }

        // disconnect the pool, then give it a bounded window to drain
        self.task_tx = None;
        let mut pending = std::mem::take(&mut self.workers);
        join_finished_workers(&mut pending, SHUTDOWN_GRACE);
        if !pending.is_empty() {
            warn!("Watcher workers still draining, waiting once more");
            join_finished_workers(&mut pending, SHUTDOWN_FORCE);
        }
        if !pending.is_empty() {
            warn!("{} watcher workers did not terminate", pending.len());
        }

        *self.shared.os_watcher.lock() = None;
        *self.shared.root.lock() = None;
        info!("Filesystem watcher stopped");
    }

    /// Alias for [`FileSystemWatcher::stop`].
    pub fn close(&mut self) {
        self.stop();
    }

    fn abort_start(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        *self.shared.os_watcher.lock() = None;
        *self.shared.root.lock() = None;
    }

    /// Number of successful directory registrations over the watcher's
    /// lifetime. Monotone; directories are not deregistered individually.
    pub fn watched_directory_count(&self) -> u64 {
        self.shared.watched_directories.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for FileSystemWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Classify a raw notification into per-path tasks for the pool.
fn dispatch_event(event: Event, tasks: &Sender<WatchTask>) {
    let kind = event.kind;
    for path in event.paths {
        let task = match kind {
            EventKind::Create(_) => Some(WatchTask::Created(path)),
            // renames surface as name-modify events; current existence
            // decides which side of the rename this path is on
            EventKind::Modify(ModifyKind::Name(_)) => {
                if path.exists() {
                    Some(WatchTask::Created(path))
                } else {
                    Some(WatchTask::Removed(path))
                }
            }
            EventKind::Modify(_) => Some(WatchTask::Modified(path)),
            EventKind::Remove(_) => Some(WatchTask::Removed(path)),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        };
        if let Some(task) = task {
            if tasks.send(task).is_err() {
                debug!("Worker pool closed, dropping event");
                return;
            }
        }
    }
}

fn join_finished_workers(pending: &mut Vec<JoinHandle<()>>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        let mut still_running = Vec::new();
        for handle in pending.drain(..) {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                still_running.push(handle);
            }
        }
        *pending = still_running;
        if pending.is_empty() || Instant::now() >= deadline {
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WordTokenizer;

    fn watcher() -> FileSystemWatcher {
        let service = Arc::new(IndexingService::new(Box::new(WordTokenizer::default())));
        FileSystemWatcher::new(service, WatcherConfig::default())
    }

    #[test]
    fn test_start_rejects_missing_directory() {
        let mut watcher = watcher();
        let err = watcher.start(Path::new("/no/such/dir"), false).unwrap_err();
        assert!(matches!(err, TermdexError::InvalidInput(_)));
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_start_rejects_file_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hi").unwrap();

        let mut watcher = watcher();
        let err = watcher.start(&file, false).unwrap_err();
        assert!(matches!(err, TermdexError::InvalidInput(_)));
    }

    #[test]
    fn test_stop_is_idempotent_without_start() {
        let mut watcher = watcher();
        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_running());
        assert_eq!(watcher.watched_directory_count(), 0);
    }
}
