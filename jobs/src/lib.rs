//! Background job dispatch.
//!
//! Work is submitted by task name with JSON arguments and executed off the
//! request path by a worker with bounded concurrency.
//!
//! # Architecture
//!
//! - **TaskHandler**: Trait for implementing named tasks
//! - **JobServer**: Cloneable handle used to register tasks and submit jobs
//! - **Worker**: Drains the job queue, running at most `concurrency` jobs at once
//! - **JobHandle**: Returned per submission, resolves to the task's output
//!
//! The queue is in-process and bounded; nothing survives a restart.

use async_trait::async_trait;
use dashmap::DashMap;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};
use uuid::Uuid;

pub mod error;
pub mod tasks;

use error::{Error, JobErrorKind};

/// Identity assigned to every accepted job.
pub type JobId = Uuid;

/// Default number of jobs that may wait in the queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A task invocation: which task to run and with what arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub args: Vec<Value>,
}

impl Signature {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Trait for implementing a named background task.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self, args: &[Value]) -> Result<Value, Error>;
}

struct Job {
    id: JobId,
    signature: Signature,
    handler: Arc<dyn TaskHandler>,
    reply: oneshot::Sender<Result<Value, Error>>,
}

impl Job {
    async fn execute(self) {
        debug!("Running job {} ({})", self.id, self.signature.name);

        let result = self.handler.run(&self.signature.args).await;
        match &result {
            Ok(_) => debug!("Job {} ({}) succeeded", self.id, self.signature.name),
            Err(e) => warn!("Job {} ({}) failed: {e}", self.id, self.signature.name),
        }

        // Submitter may not be waiting for the result
        let _ = self.reply.send(result);
    }
}

/// Pending result of a submitted job.
pub struct JobHandle {
    pub id: JobId,
    pub name: String,
    result: oneshot::Receiver<Result<Value, Error>>,
}

impl JobHandle {
    /// Waits for the job to finish.
    pub async fn result(self) -> Result<Value, Error> {
        self.result
            .await
            .map_err(|_| Error::new(self.name, JobErrorKind::Abandoned))?
    }
}

/// Registers tasks and accepts submissions.
#[derive(Clone)]
pub struct JobServer {
    handlers: Arc<DashMap<String, Arc<dyn TaskHandler>>>,
    queue: mpsc::Sender<Job>,
}

impl JobServer {
    /// Creates a server and the worker that will consume its queue.
    pub fn new(capacity: usize) -> (JobServer, Worker) {
        let (queue, jobs) = mpsc::channel(capacity.max(1));
        let server = JobServer {
            handlers: Arc::new(DashMap::new()),
            queue,
        };
        (server, Worker { jobs })
    }

    /// Registers (or replaces) the handler for a task name.
    pub fn register_task(&self, name: impl Into<String>, handler: Arc<dyn TaskHandler>) {
        let name = name.into();
        info!("Registered background task \"{name}\"");
        self.handlers.insert(name, handler);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Enqueues a job without waiting for room in the queue.
    pub fn submit(&self, signature: Signature) -> Result<JobHandle, Error> {
        let handler = self
            .handlers
            .get(&signature.name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::new(signature.name.clone(), JobErrorKind::UnknownTask))?;

        let id = Uuid::new_v4();
        let name = signature.name.clone();
        let (reply, result) = oneshot::channel();

        self.queue
            .try_send(Job {
                id,
                signature,
                handler,
                reply,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    Error::new(name.clone(), JobErrorKind::QueueFull)
                }
                mpsc::error::TrySendError::Closed(_) => {
                    Error::new(name.clone(), JobErrorKind::QueueClosed)
                }
            })?;

        debug!("Submitted job {id} ({name})");
        Ok(JobHandle { id, name, result })
    }
}

/// Consumes the job queue.
pub struct Worker {
    jobs: mpsc::Receiver<Job>,
}

impl Worker {
    /// Runs jobs until every `JobServer` clone has been dropped.
    pub async fn launch(mut self, name: &str, concurrency: usize) {
        let concurrency = concurrency.max(1);
        let permits = Arc::new(Semaphore::new(concurrency));
        info!("Worker \"{name}\" launched with concurrency {concurrency}");

        while let Some(job) = self.jobs.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            tokio::spawn(async move {
                let _permit = permit;
                job.execute().await;
            });
        }

        info!("Worker \"{name}\" stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl TaskHandler for Echo {
        async fn run(&self, args: &[Value]) -> Result<Value, Error> {
            Ok(Value::Array(args.to_vec()))
        }
    }

    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TaskHandler for Gauge {
        async fn run(&self, _args: &[Value]) -> Result<Value, Error> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn submitted_job_resolves_with_task_output() {
        let (server, worker) = JobServer::new(8);
        server.register_task("echo", Arc::new(Echo));
        tokio::spawn(worker.launch("test", 2));

        let handle = server
            .submit(Signature::new("echo", vec![json!(1), json!("two")]))
            .unwrap();

        assert_eq!(handle.result().await.unwrap(), json!([1, "two"]));
    }

    #[tokio::test]
    async fn unknown_task_is_rejected_at_submission() {
        let (server, _worker) = JobServer::new(8);

        let err = server
            .submit(Signature::new("missing", vec![]))
            .err()
            .unwrap();

        assert_eq!(err.error_kind, JobErrorKind::UnknownTask);
        assert_eq!(err.task, "missing");
    }

    #[tokio::test]
    async fn full_queue_rejects_without_waiting() {
        let (server, _worker) = JobServer::new(1);
        server.register_task("echo", Arc::new(Echo));

        server.submit(Signature::new("echo", vec![])).unwrap();
        let err = server.submit(Signature::new("echo", vec![])).err().unwrap();

        assert_eq!(err.error_kind, JobErrorKind::QueueFull);
    }

    #[tokio::test]
    async fn dropped_worker_closes_the_queue() {
        let (server, worker) = JobServer::new(4);
        server.register_task("echo", Arc::new(Echo));
        drop(worker);

        let err = server.submit(Signature::new("echo", vec![])).err().unwrap();

        assert_eq!(err.error_kind, JobErrorKind::QueueClosed);
    }

    #[tokio::test]
    async fn worker_respects_concurrency_limit() {
        let (server, worker) = JobServer::new(16);
        let gauge = Arc::new(Gauge {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        server.register_task("gauge", gauge.clone());
        tokio::spawn(worker.launch("test", 2));

        let handles: Vec<_> = (0..6)
            .map(|_| server.submit(Signature::new("gauge", vec![])).unwrap())
            .collect();
        for handle in handles {
            handle.result().await.unwrap();
        }

        assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    }
}
