//! Checksum & write guard
//!
//! Every generated file goes through `WriteGuard::write`. A write whose
//! content matches what is already on disk is a no-op, so file watchers are
//! never poked by unchanged output. Writes to the same path are serialized
//! through a per-path FIFO queue: a request arriving while another write to
//! that path is in flight is appended to the path's pending list and executed
//! by the in-flight writer once it finishes. The queue is dropped as soon as
//! it drains.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::domain::ports::file_system::{FileSystem, FsError, FsResult};
use crate::domain::value_objects::ContentHash;

/// What a guarded write did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content differed (or the file was new) and was written
    Written,
    /// File already held identical content
    Unchanged,
}

impl WriteOutcome {
    pub fn is_written(self) -> bool {
        self == WriteOutcome::Written
    }
}

struct PendingWrite {
    content: String,
    reply: mpsc::Sender<FsResult<WriteOutcome>>,
}

type Queues = HashMap<PathBuf, VecDeque<PendingWrite>>;

/// Write-deduplicating, per-path serialized writer
pub struct WriteGuard {
    fs: Arc<dyn FileSystem>,
    queues: Mutex<Queues>,
    writes: AtomicUsize,
}

impl WriteGuard {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            queues: Mutex::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of physical writes performed so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn queues(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write `content` to `path` unless the file already holds it.
    ///
    /// Blocks until this particular request has been carried out, whether by
    /// the calling thread or by the thread currently writing the same path.
    pub fn write(&self, path: &Path, content: &str) -> FsResult<WriteOutcome> {
        let waiting = {
            let mut queues = self.queues();
            match queues.get_mut(path) {
                Some(pending) => {
                    let (reply, rx) = mpsc::channel();
                    pending.push_back(PendingWrite {
                        content: content.to_string(),
                        reply,
                    });
                    trace!(path = %path.display(), queued = pending.len(), "write queued behind in-flight write");
                    Some(rx)
                }
                None => {
                    queues.insert(path.to_path_buf(), VecDeque::new());
                    None
                }
            }
        };

        if let Some(rx) = waiting {
            return rx.recv().unwrap_or_else(|_| {
                Err(FsError::Other(format!(
                    "write to {} abandoned by in-flight writer",
                    path.display()
                )))
            });
        }

        let _drain = DrainOnDrop { guard: self, path };
        self.write_if_changed(path, content)
    }

    /// Run queued writes for `path` in arrival order, then drop the queue.
    fn drain(&self, path: &Path) {
        loop {
            let next = {
                let mut queues = self.queues();
                match queues.get_mut(path).and_then(VecDeque::pop_front) {
                    Some(next) => next,
                    None => {
                        queues.remove(path);
                        return;
                    }
                }
            };
            let result = self.write_if_changed(path, &next.content);
            // The requester may have given up waiting; nothing to report then.
            let _ = next.reply.send(result);
        }
    }

    fn write_if_changed(&self, path: &Path, content: &str) -> FsResult<WriteOutcome> {
        let wanted = ContentHash::from_content(content);
        match self.fs.hash(path) {
            Ok(existing) if existing == wanted => {
                trace!(path = %path.display(), "content unchanged, skipping write");
                return Ok(WriteOutcome::Unchanged);
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.fs.create_dir_all(parent)?;
            }
        }
        self.fs.write(path, content)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(path = %path.display(), "wrote generated file");
        Ok(WriteOutcome::Written)
    }
}

/// Drains the queue even if the in-flight write panics, so later writers
/// of the same path are never parked forever.
struct DrainOnDrop<'a> {
    guard: &'a WriteGuard,
    path: &'a Path,
}

impl Drop for DrainOnDrop<'_> {
    fn drop(&mut self) {
        self.guard.drain(self.path);
    }
}
