use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};

use crate::sync::SyncBackend;
use crate::sync::wire::RemoteState;

/// Quiet window before a scheduled push goes out; every further update
/// restarts it.
pub(crate) const DEBOUNCE: Duration = Duration::from_millis(1000);

pub(crate) enum PushRequest {
    /// Debounced full-snapshot push; supersedes any pending one.
    Update(RemoteState),
    /// Push right now, cancelling any pending debounce.
    Immediate(RemoteState),
    /// Deliver any pending push, then ack.
    Flush(oneshot::Sender<()>),
}

/// Single background task owning all outbound traffic. Only the newest
/// snapshot ever goes out; failed pushes are logged and dropped because the
/// next mutation carries the full state anyway.
pub(crate) async fn run_push_worker<B: SyncBackend>(
    backend: B,
    mut rx: UnboundedReceiver<PushRequest>,
) {
    let mut pending: Option<RemoteState> = None;
    let mut deadline: Option<Instant> = None;
    loop {
        let request = match deadline {
            Some(at) => tokio::select! {
                request = rx.recv() => request,
                _ = sleep_until(at) => {
                    if let Some(snapshot) = pending.take() {
                        push_snapshot(&backend, &snapshot).await;
                    }
                    deadline = None;
                    continue;
                }
            },
            None => rx.recv().await,
        };
        match request {
            Some(PushRequest::Update(snapshot)) => {
                pending = Some(snapshot);
                deadline = Some(Instant::now() + DEBOUNCE);
            }
            Some(PushRequest::Immediate(snapshot)) => {
                pending = None;
                deadline = None;
                push_snapshot(&backend, &snapshot).await;
            }
            Some(PushRequest::Flush(done)) => {
                if let Some(snapshot) = pending.take() {
                    push_snapshot(&backend, &snapshot).await;
                }
                deadline = None;
                let _ = done.send(());
            }
            None => break,
        }
    }
}

async fn push_snapshot<B: SyncBackend>(backend: &B, snapshot: &RemoteState) {
    if let Err(err) = backend.push(snapshot).await {
        tracing::warn!("push failed, changes stay local: {err}");
    }
}
