//! Background refresh task tracking

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Registry for the fire-and-forget refresh tasks spawned by Warm listings.
///
/// The caller of a Warm read never awaits the refresh it triggers; the
/// queue exists so that a test harness (or a shutdown path) can wait for
/// every in-flight refresh before inspecting cache state. Tasks are not
/// cancellable once spawned.
#[derive(Debug, Clone, Default)]
pub struct RefreshQueue {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a refresh task. The handle is recorded instead of returned, so
    /// callers cannot accidentally await it. Handles of refreshes that have
    /// already finished are pruned here, keeping the registry bounded by the
    /// number of in-flight tasks.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(tokio::spawn(future));
    }

    /// Number of recorded refreshes not yet drained or pruned.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Await every in-flight refresh, including ones spawned while draining.
    /// Panicked tasks are absorbed.
    pub async fn drain(&self) {
        loop {
            let handle = self.handles.lock().pop();
            match handle {
                Some(handle) => {
                    let _ = handle.await;
                }
                None => break,
            }
        }
    }
}
