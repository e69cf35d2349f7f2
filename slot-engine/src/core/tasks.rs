//! Background tasks owned by a booking session
//!
//! - [`TaskKind::Worker`] - prompt reconciliation loop
//! - [`TaskKind::Listener`] - session event listener
//! - [`TaskKind::Periodic`] - booking refresh

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Worker,
    Listener,
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Worker => "worker",
            Self::Listener => "listener",
            Self::Periodic => "periodic",
        })
    }
}

/// Tasks sharing one shutdown token
///
/// Each task is expected to return once [`BackgroundTasks::shutdown_token`]
/// is cancelled. Dropping the registry cancels the token as well.
pub struct BackgroundTasks {
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start `future` on the runtime; a panic inside it is logged, not propagated
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if shutdown.is_cancelled() => {}
                Ok(()) => tracing::warn!(task = name, %kind, "Session task exited before shutdown"),
                Err(panic) => {
                    tracing::error!(task = name, %kind, panic = %panic_message(&*panic), "Session task panicked")
                }
            }
        });
        tracing::debug!(task = name, %kind, "Session task started");
        self.handles.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Cancel the token and wait for every task to return
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        let handles = std::mem::take(&mut self.handles);
        let count = handles.len();
        for (name, handle) in handles {
            if let Err(e) = handle.await {
                tracing::warn!(task = name, error = %e, "Session task did not stop cleanly");
            }
        }
        tracing::info!(count, "Session tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
