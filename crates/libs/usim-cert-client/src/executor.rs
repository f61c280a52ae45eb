use std::io;

use tokio::runtime::{Handle, TryCurrentError};

use crate::config::{ServiceConfig, DEFAULT_WORKER_THREAD_NAME};

/// A unit of blocking work: one remote call plus posting its result.
pub type BackgroundJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs blocking remote calls away from the caller's context.
///
/// A job the executor cannot run must be dropped, not leaked: dropping it
/// reports the request as failed.
pub trait BackgroundExecutor: Send + Sync {
    fn spawn(&self, job: BackgroundJob) -> io::Result<()>;
}

/// One short-lived named OS thread per call.
#[derive(Clone, Debug)]
pub struct ThreadExecutor {
    thread_name: String,
}

impl ThreadExecutor {
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self { thread_name: thread_name.into() }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.worker_thread_name.clone())
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_THREAD_NAME)
    }
}

impl BackgroundExecutor for ThreadExecutor {
    fn spawn(&self, job: BackgroundJob) -> io::Result<()> {
        std::thread::Builder::new().name(self.thread_name.clone()).spawn(job).map(drop)
    }
}

/// Runs calls on the blocking pool of a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioBlockingExecutor {
    handle: Handle,
}

impl TokioBlockingExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the calling task is running on.
    pub fn current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }
}

impl BackgroundExecutor for TokioBlockingExecutor {
    fn spawn(&self, job: BackgroundJob) -> io::Result<()> {
        // Results travel through the delivery channel. On a runtime that has
        // shut down the job is dropped unrun, which reports the failure.
        drop(self.handle.spawn_blocking(job));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn thread_executor_runs_job_on_named_thread() {
        let executor = ThreadExecutor::new("cert-test-worker");
        let (tx, rx) = mpsc::channel();
        executor
            .spawn(Box::new(move || {
                let name = std::thread::current().name().map(str::to_owned);
                tx.send(name).expect("send thread name");
            }))
            .expect("spawn");
        let name = rx.recv_timeout(Duration::from_secs(5)).expect("job ran");
        assert_eq!(name.as_deref(), Some("cert-test-worker"));
    }

    #[test]
    fn thread_executor_uses_configured_name() {
        let mut config = ServiceConfig::new("app");
        config.worker_thread_name = "from-config".to_owned();
        assert_eq!(ThreadExecutor::from_config(&config).thread_name, "from-config");
        assert_eq!(ThreadExecutor::default().thread_name, DEFAULT_WORKER_THREAD_NAME);
    }

    #[test]
    fn tokio_executor_requires_a_runtime() {
        assert!(TokioBlockingExecutor::current().is_err());
    }

    #[tokio::test]
    async fn tokio_executor_runs_job_on_blocking_pool() {
        let executor = TokioBlockingExecutor::current().expect("inside runtime");
        let (tx, rx) = tokio::sync::oneshot::channel();
        let caller = std::thread::current().id();
        executor
            .spawn(Box::new(move || {
                tx.send(std::thread::current().id()).expect("send thread id");
            }))
            .expect("spawn");
        let worker = rx.await.expect("job ran");
        assert_ne!(worker, caller);
    }
}
