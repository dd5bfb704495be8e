use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use noto::sync::{RemoteNoteBlock, RemoteState, SyncBackend, SyncError};
use noto::{
    MediumError, NewChecklistItem, NewNoteBlock, NewTagDef, SCHEMA_VERSION, SnapshotMedium, Store,
};
use tempfile::TempDir;

/// Creates a Store over a fresh temp data directory.
/// Returns both the store and the temp dir (which must be kept alive).
pub fn create_test_store() -> (Store, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let store = Store::open(dir.path()).expect("Failed to open test store");
    (store, dir)
}

/// Reopens a store over the same directory, as a fresh process would.
pub fn reopen_store(dir: &TempDir) -> Store {
    Store::open(dir.path()).expect("Failed to reopen test store")
}

/// In-memory snapshot medium. Clones share one blob, so tests can keep a
/// handle and inspect what the store persisted.
#[derive(Clone, Default)]
pub struct MemoryMedium {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.blob.lock().expect("medium lock poisoned").clone()
    }

    pub fn set_contents(&self, blob: &str) {
        *self.blob.lock().expect("medium lock poisoned") = Some(blob.to_string());
    }
}

impl SnapshotMedium for MemoryMedium {
    fn read(&self) -> Result<Option<String>, MediumError> {
        Ok(self.contents())
    }

    fn write(&self, blob: &str) -> Result<(), MediumError> {
        self.set_contents(blob);
        Ok(())
    }
}

/// Medium whose writes succeed until the test flips it to full, after which
/// every write fails with a quota error.
#[derive(Clone, Default)]
pub struct QuotaMedium {
    inner: MemoryMedium,
    full: Arc<AtomicBool>,
}

impl QuotaMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_full(&self, full: bool) {
        self.full.store(full, Ordering::SeqCst);
    }

    pub fn contents(&self) -> Option<String> {
        self.inner.contents()
    }
}

impl SnapshotMedium for QuotaMedium {
    fn read(&self) -> Result<Option<String>, MediumError> {
        self.inner.read()
    }

    fn write(&self, blob: &str) -> Result<(), MediumError> {
        if self.full.load(Ordering::SeqCst) {
            return Err(MediumError::QuotaExceeded);
        }
        self.inner.write(blob)
    }
}

/// Sync backend fake: records every pushed snapshot, serves a configurable
/// pull result, and can refuse auth. Clones share the push log.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    remote: Option<RemoteState>,
    fail_auth: bool,
    fail_pull: bool,
    pushes: Arc<Mutex<Vec<RemoteState>>>,
}

impl RecordingBackend {
    /// Backend with nothing to pull.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose pull returns the given snapshot.
    pub fn with_remote(remote: RemoteState) -> Self {
        Self {
            remote: Some(remote),
            ..Self::default()
        }
    }

    /// Backend whose auth bootstrap always fails.
    pub fn failing_auth() -> Self {
        Self {
            fail_auth: true,
            ..Self::default()
        }
    }

    /// Backend that authenticates but cannot serve the initial pull.
    pub fn failing_pull() -> Self {
        Self {
            fail_pull: true,
            ..Self::default()
        }
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().expect("backend lock poisoned").len()
    }

    pub fn last_push(&self) -> Option<RemoteState> {
        self.pushes
            .lock()
            .expect("backend lock poisoned")
            .last()
            .cloned()
    }
}

impl SyncBackend for RecordingBackend {
    fn bootstrap_auth(&self) -> impl Future<Output = Result<(), SyncError>> + Send {
        let fail = self.fail_auth;
        async move {
            if fail {
                Err(SyncError::AuthUnavailable)
            } else {
                Ok(())
            }
        }
    }

    fn pull(&self) -> impl Future<Output = Result<Option<RemoteState>, SyncError>> + Send {
        let remote = self.remote.clone();
        let fail = self.fail_pull;
        async move {
            if fail {
                Err(SyncError::Status {
                    status: 503,
                    path: "/export".to_string(),
                })
            } else {
                Ok(remote)
            }
        }
    }

    fn push(&self, snapshot: &RemoteState) -> impl Future<Output = Result<(), SyncError>> + Send {
        let pushes = Arc::clone(&self.pushes);
        let snapshot = snapshot.clone();
        async move {
            pushes.lock().expect("backend lock poisoned").push(snapshot);
            Ok(())
        }
    }
}

/// Remote snapshot carrying one note under a legacy (non-UUID) id, shaped
/// like the server would return it.
pub fn remote_with_note(title: &str) -> RemoteState {
    RemoteState {
        schema_version: SCHEMA_VERSION,
        notes: vec![RemoteNoteBlock {
            id: "note-legacy-1".to_string(),
            title: title.to_string(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// NewChecklistItem with the given title and an empty description.
pub fn new_item(title: &str) -> NewChecklistItem {
    NewChecklistItem {
        title: title.to_string(),
        description_html: String::new(),
    }
}

/// NewNoteBlock with the given title and an empty body.
pub fn new_note(title: &str) -> NewNoteBlock {
    NewNoteBlock {
        title: title.to_string(),
        html: String::new(),
        content_json: None,
    }
}

/// NewTagDef with the given title and no color.
pub fn new_tag(title: &str) -> NewTagDef {
    NewTagDef {
        title: title.to_string(),
        color_key: None,
    }
}
