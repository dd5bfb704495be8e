mod client;
pub(crate) mod push;
pub(crate) mod wire;

use thiserror::Error;

pub use client::HttpSyncClient;
pub use wire::{
    RemoteAlarm, RemoteChecklistItem, RemoteNoteBlock, RemotePanelLayout, RemoteSettings,
    RemoteState, RemoteTag,
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no usable session could be established")]
    AuthUnavailable,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("server returned {status} for {path}")]
    Status { status: u16, path: String },
}

/// Everything the store needs from the remote side. The store never sees
/// URLs, tokens or response codes; test fakes implement this directly.
pub trait SyncBackend {
    /// Establish or revalidate a session. Idempotent per instance.
    fn bootstrap_auth(&self) -> impl Future<Output = Result<(), SyncError>> + Send;
    /// Fetch the remote snapshot; `None` when the remote has nothing worth
    /// adopting (absent or confirmed empty).
    fn pull(&self) -> impl Future<Output = Result<Option<RemoteState>, SyncError>> + Send;
    /// Replace the entire remote snapshot with `snapshot`.
    fn push(&self, snapshot: &RemoteState) -> impl Future<Output = Result<(), SyncError>> + Send;
}
