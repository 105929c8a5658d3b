// Rate limiting for regenerate-and-persist, plus per-document exclusion for
// callers that compile from more than one thread.

use crate::ast::Workspace;
use crate::codegen::CodegenOptions;
use crate::document::write_document;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Coalesces bursts of edits into one action after a quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Records an edit. Any pending deadline is replaced, never queued.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once per burst, on the first poll after the quiet period.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct AutosaveState {
    pub debouncer: Debouncer,
    pub last_success: Option<Instant>,
    /// Message from the last failed save, cleared by the next success.
    pub error: Option<String>,
}

impl AutosaveState {
    pub fn with_quiet_period(quiet: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(quiet),
            ..Self::default()
        }
    }

    pub fn mark_dirty(&mut self, now: Instant) {
        self.debouncer.touch(now);
    }

    /// Runs `save` when the debouncer fires and records the outcome.
    /// Returns whether a save was attempted.
    pub fn tick(&mut self, now: Instant, save: impl FnOnce() -> Result<()>) -> bool {
        if !self.debouncer.poll(now) {
            return false;
        }
        match save() {
            Ok(()) => {
                self.last_success = Some(now);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!("autosave failed: {:#}", err);
                self.error = Some(format!("{:#}", err));
            }
        }
        true
    }
}

/// Serialises compile-and-persist per document path.
#[derive(Debug, Clone, Default)]
pub struct DocumentCompiler {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
    options: CodegenOptions,
}

impl DocumentCompiler {
    pub fn new(options: CodegenOptions) -> Self {
        Self {
            locks: Arc::default(),
            options,
        }
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Runs `body` while holding the lock for `path`.
    pub fn with_document<T>(&self, path: &Path, body: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        body()
    }

    /// Generates and writes `path`; concurrent calls for the same path run one
    /// at a time, other paths proceed independently.
    pub fn compile(&self, path: &Path, workspace: &Workspace) -> Result<String> {
        self.with_document(path, || write_document(path, workspace, &self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BlockNode, TopBlock};
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn touch_replaces_the_pending_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.touch(start);
        debouncer.touch(start + Duration::from_millis(1500));
        assert!(!debouncer.poll(start + Duration::from_millis(2100)));
        assert!(debouncer.poll(start + Duration::from_millis(3500)));
        assert!(!debouncer.poll(start + Duration::from_millis(9000)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn autosave_records_success_and_failure() {
        let start = Instant::now();
        let mut state = AutosaveState::with_quiet_period(Duration::from_millis(10));
        assert!(!state.tick(start, || Ok(())));

        state.mark_dirty(start);
        let later = start + Duration::from_millis(20);
        assert!(state.tick(later, || bail!("disk full")));
        assert_eq!(state.error.as_deref(), Some("disk full"));

        state.mark_dirty(later);
        let much_later = later + Duration::from_millis(20);
        assert!(state.tick(much_later, || Ok(())));
        assert_eq!(state.error, None);
        assert_eq!(state.last_success, Some(much_later));
    }

    #[test]
    fn same_document_compiles_never_overlap() {
        let compiler = DocumentCompiler::default();
        let active = Arc::new(AtomicUsize::new(0));
        let path = PathBuf::from("scripts/story.py");
        let handles = (0..4)
            .map(|_| {
                let compiler = compiler.clone();
                let active = Arc::clone(&active);
                let path = path.clone();
                thread::spawn(move || {
                    compiler.with_document(&path, || {
                        assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                        thread::sleep(Duration::from_millis(5));
                        active.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn compile_writes_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("story.py");
        let workspace = Workspace {
            top_blocks: vec![TopBlock {
                x: 0,
                y: 0,
                blocks: vec![BlockNode::new("f", "vn_finish")],
            }],
            ..Workspace::default()
        };
        let source = DocumentCompiler::default().compile(&path, &workspace).unwrap();
        assert_eq!(source, "vn.finish()\n");
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("vn.finish()\n\n\n\"\"\"### BLOCKLY_DATA ###"));
    }
}
