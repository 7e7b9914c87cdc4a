//! Background jobs.
//!
//! Catalog imports, preview lookups and video searches run as tokio tasks.
//! Each task gets its own [`CancellationToken`], derived from the service's
//! root token so that [`crate::SongClashService::cancel_all`] reaches every
//! job in flight.

use crate::error::{CoreError, Result};
use std::fmt;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use uuid::Uuid;

/// Handle to a spawned job producing `T`.
pub struct JobHandle<T> {
    id: Uuid,
    label: String,
    cancel: CancellationToken,
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> JobHandle<T> {
    /// Spawn the future built by `task` on the current runtime.
    ///
    /// `task` gets the job id for event correlation and is expected to watch
    /// `cancel` itself.
    pub(crate) fn spawn<F, Fut>(label: impl Into<String>, cancel: CancellationToken, task: F) -> Self
    where
        F: FnOnce(Uuid) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let label = label.into();
        debug!(job_id = %id, %label, "Spawning job");
        Self {
            id,
            label,
            cancel,
            handle: tokio::spawn(task(id)),
        }
    }
}

impl<T> JobHandle<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Ask the job to stop. A cancelled job applies nothing to the session.
    pub fn cancel(&self) {
        debug!(job_id = %self.id, label = %self.label, "Cancelling job");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job's result.
    pub async fn join(self) -> Result<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(CoreError::JobCancelled(self.label)),
            Err(e) => {
                error!(job_id = %self.id, error = %e, "Job panicked");
                Err(CoreError::JobFailed(format!("{}: {}", self.label, e)))
            }
        }
    }
}

impl<T> fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}
