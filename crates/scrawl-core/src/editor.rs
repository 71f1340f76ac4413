//! Debounced write-through editing of the shared note.
//!
//! [`NoteEditor`] owns the authoritative in-memory copy of the note. Every
//! edit lands in memory synchronously, so same-process reads are never stale;
//! durability lags by at most one quiet period. Rapid edits re-arm a single
//! deferred persist, collapsing keystroke-level traffic into one storage
//! write per burst. Settled writes are recorded in an in-memory version
//! history consulted by [`NoteEditor::rollback`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::NoteStore;

/// Single-slot deferred task: arming cancels whatever was armed before, so at
/// most one timer is ever pending.
#[derive(Default)]
struct DebounceSlot {
    armed: Option<JoinHandle<()>>,
}

impl DebounceSlot {
    fn arm(&mut self, task: JoinHandle<()>) {
        if let Some(prev) = self.armed.replace(task) {
            prev.abort();
        }
    }

    fn cancel(&mut self) {
        if let Some(prev) = self.armed.take() {
            prev.abort();
        }
    }
}

struct EditorState {
    content: String,
    /// Committed versions, oldest first. Never empty: seeded with the content
    /// loaded at startup.
    history: Vec<String>,
    slot: DebounceSlot,
    /// Bumped on every edit. A settling persist clears `busy` only when no
    /// newer write was scheduled after it was armed.
    generation: u64,
    busy: bool,
}

/// Coalesces rapid note edits into one persisted write per quiet period.
pub struct NoteEditor {
    store: Arc<dyn NoteStore>,
    quiet_period: Duration,
    state: Arc<Mutex<EditorState>>,
}

impl NoteEditor {
    /// Load the persisted note and seed the version history with it.
    pub async fn load(store: Arc<dyn NoteStore>, quiet_period: Duration) -> Result<Self> {
        let content = store.read_note().await?;
        debug!(
            subsystem = "core",
            component = "editor",
            content_len = content.len(),
            "Loaded note"
        );
        Ok(Self {
            store,
            quiet_period,
            state: Arc::new(Mutex::new(EditorState {
                history: vec![content.clone()],
                content,
                slot: DebounceSlot::default(),
                generation: 0,
                busy: false,
            })),
        })
    }

    /// Replace the note content.
    ///
    /// The in-memory copy is updated before this call returns; the durable
    /// write is deferred by the quiet period and superseded by any newer edit.
    pub fn edit(&self, text: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        self.apply(&mut state, text.into(), true);
    }

    /// Prefix `text` (plus a blank line) onto the current content, as one edit.
    pub fn prepend(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        let combined = format!("{}\n\n{}", text, state.content);
        self.apply(&mut state, combined, true);
    }

    /// Discard the newest committed version and restore the one below it.
    ///
    /// A floor of one version is kept; rolling back past it is absorbed as a
    /// no-op. Returns the now-current content either way. The restoring edit
    /// is not recorded in history (the restored value is already there).
    pub fn rollback(&self) -> String {
        let mut state = self.state.lock().unwrap();
        if state.history.len() > 1 {
            state.history.pop();
            let restored = state
                .history
                .last()
                .cloned()
                .unwrap_or_default();
            self.apply(&mut state, restored, false);
        }
        debug!(
            subsystem = "core",
            component = "editor",
            versions = state.history.len(),
            "Rollback applied"
        );
        state.content.clone()
    }

    /// The in-memory content, which is always at least as current as storage.
    pub fn current(&self) -> String {
        self.state.lock().unwrap().content.clone()
    }

    /// True while a deferred write is scheduled or in flight.
    pub fn is_busy(&self) -> bool {
        self.state.lock().unwrap().busy
    }

    /// Number of committed versions available to [`NoteEditor::rollback`].
    pub fn history_depth(&self) -> usize {
        self.state.lock().unwrap().history.len()
    }

    /// Freshest durable view of the note.
    ///
    /// While a write is pending the in-memory copy is ahead of storage, so
    /// the store is only consulted when idle (and re-checked under the lock:
    /// an edit may land during the read).
    pub async fn refreshed(&self) -> Result<String> {
        if self.is_busy() {
            return Ok(self.current());
        }
        let stored = self.store.read_note().await?;
        let mut state = self.state.lock().unwrap();
        if !state.busy {
            state.content = stored;
        }
        Ok(state.content.clone())
    }

    /// Cancel any armed timer and persist the in-memory content immediately.
    ///
    /// Shutdown path: bounds the durability lag at process exit. The version
    /// history is in-memory only, so it is not updated here.
    pub async fn flush(&self) -> Result<()> {
        let (content, pending) = {
            let mut state = self.state.lock().unwrap();
            state.slot.cancel();
            (state.content.clone(), state.busy)
        };
        if pending {
            self.store.write_note(&content).await?;
            self.state.lock().unwrap().busy = false;
            debug!(
                subsystem = "core",
                component = "editor",
                content_len = content.len(),
                "Flushed pending note write"
            );
        }
        Ok(())
    }

    fn apply(&self, state: &mut EditorState, text: String, record_in_history: bool) {
        state.content = text.clone();
        state.generation += 1;
        state.busy = true;
        let generation = state.generation;

        let store = Arc::clone(&self.store);
        let shared = Arc::clone(&self.state);
        let quiet_period = self.quiet_period;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            // The quiet period elapsed without a superseding edit. From here
            // the persist runs to completion even if a newer edit cancels the
            // slot, so it is detached from the abortable timer task.
            tokio::spawn(persist(store, shared, text, generation, record_in_history));
        });
        state.slot.arm(timer);
    }
}

/// Write a settled edit through to storage and record it in history.
async fn persist(
    store: Arc<dyn NoteStore>,
    state: Arc<Mutex<EditorState>>,
    text: String,
    generation: u64,
    record_in_history: bool,
) {
    let result = store.write_note(&text).await;
    let mut state = state.lock().unwrap();
    match result {
        Ok(()) => {
            if record_in_history {
                state.history.push(text);
            }
            debug!(
                subsystem = "core",
                component = "editor",
                versions = state.history.len(),
                "Note persisted"
            );
        }
        Err(error) => {
            // Not retried: the in-memory copy stays authoritative and the
            // next edit schedules a fresh write.
            warn!(
                subsystem = "core",
                component = "editor",
                error = %error,
                "Deferred note persist failed"
            );
        }
    }
    if state.generation == generation {
        state.busy = false;
    }
}
