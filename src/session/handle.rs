use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Owner side of a cancellation flag. Dropping the source also counts as cancellation.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
    ancestors: Vec<watch::Receiver<bool>>,
}

impl CancelSource {
    /// Create a root source.
    pub fn new() -> Self {
        Self {
            tx: watch::channel(false).0,
            ancestors: Vec::new(),
        }
    }

    /// Token observing this source (and its ancestors).
    pub fn token(&self) -> CancelToken {
        let mut chain = Vec::with_capacity(self.ancestors.len() + 1);
        chain.push(self.tx.subscribe());
        chain.extend(self.ancestors.iter().cloned());
        CancelToken { chain }
    }

    /// Signal cancellation to every token.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// `true` once this source or an ancestor was cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow() || self.ancestors.iter().any(is_set)
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation flag.
///
/// The chain holds this token's own flag first, followed by every ancestor's flag.
#[derive(Clone, Debug)]
pub struct CancelToken {
    chain: Vec<watch::Receiver<bool>>,
}

impl CancelToken {
    /// `true` once cancelled (or once a source in the chain was dropped).
    pub fn is_cancelled(&self) -> bool {
        self.chain.iter().any(is_set)
    }

    /// Resolve when cancelled.
    pub async fn cancelled(&self) {
        let mut links = self.chain.iter().cloned();
        let Some(first) = links.next() else {
            return;
        };
        let mut fut: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(wait_set(first));
        for rx in links {
            let prev = fut;
            fut = Box::pin(async move {
                tokio::select! {
                    _ = prev => {}
                    _ = wait_set(rx) => {}
                }
            });
        }
        fut.await
    }

    /// A new source that is cancelled together with this token, or on its own.
    pub fn child(&self) -> CancelSource {
        CancelSource {
            tx: watch::channel(false).0,
            ancestors: self.chain.clone(),
        }
    }
}

fn is_set(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow() || rx.has_changed().is_err()
}

async fn wait_set(mut rx: watch::Receiver<bool>) {
    // An error means the source is gone, which also ends the work.
    let _ = rx.wait_for(|c| *c).await;
}

/// Owns every task scheduled for one session and is the only thing allowed to cancel them.
///
/// Dropping the handle cancels and aborts whatever is still running, so a new session can never
/// overlap with a stale render loop.
#[derive(Debug)]
pub struct SessionHandle {
    id: u64,
    cancel: CancelSource,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl SessionHandle {
    /// Create a handle with a fresh, process-unique id.
    pub fn new() -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            cancel: CancelSource::new(),
            tasks: Vec::new(),
        }
    }

    /// Process-unique session id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Token for work that must stop with the session.
    pub fn token(&self) -> CancelToken {
        self.cancel.token()
    }

    /// `true` once [`SessionHandle::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Schedule `fut` as part of this session.
    pub fn spawn<F>(&mut self, name: &'static str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!(session = self.id, task = name, "spawn session task");
        self.tasks.retain(|(_, h)| !h.is_finished());
        self.tasks.push((name, tokio::spawn(fut)));
    }

    /// Number of scheduled tasks that have not finished yet.
    pub fn running_tasks(&self) -> usize {
        self.tasks.iter().filter(|(_, h)| !h.is_finished()).count()
    }

    /// Signal cancellation without waiting.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for every task to observe it and exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for (name, handle) in self.tasks.drain(..) {
            if let Err(e) = handle.await
                && e.is_panic()
            {
                tracing::warn!(session = self.id, task = name, "session task panicked");
            }
        }
        tracing::debug!(session = self.id, "session shut down");
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        for (_, handle) in self.tasks.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/handle.rs"]
mod tests;
