//! WorkerThread - restartable, cooperatively stopped background loop
//!
//! The work callback is bound at construction and runs once per `start`
//! on a dedicated OS thread. It is expected to loop while
//! [`RunFlag::is_running`] holds; `stop` clears the flag and joins.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

use crate::error::WorkerError;

struct RunState {
    running: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Shared "keep running" flag observed by a work loop
#[derive(Clone)]
pub struct RunFlag {
    state: Arc<RunState>,
}

impl RunFlag {
    fn new() -> Self {
        Self {
            state: Arc::new(RunState {
                running: AtomicBool::new(false),
                lock: Mutex::new(()),
                wake: Condvar::new(),
            }),
        }
    }

    /// True until `stop` is requested
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Sleep for `interval`, returning early if stop is requested
    pub fn sleep(&self, interval: Duration) {
        let mut guard = self.state.lock.lock();
        if !self.is_running() {
            return;
        }
        self.state.wake.wait_for(&mut guard, interval);
    }

    fn set_running(&self) {
        self.state.running.store(true, Ordering::Release);
    }

    fn request_stop(&self) {
        self.state.running.store(false, Ordering::Release);
        let _guard = self.state.lock.lock();
        self.state.wake.notify_all();
    }
}

type WorkFn = dyn Fn(&RunFlag) + Send + Sync;

/// Background execution context owned by a module
pub struct WorkerThread {
    name: String,
    work: Arc<WorkFn>,
    flag: RunFlag,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerThread {
    /// Create a stopped worker bound to `work`
    pub fn new<F>(name: impl Into<String>, work: F) -> Self
    where
        F: Fn(&RunFlag) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            work: Arc::new(work),
            flag: RunFlag::new(),
            handle: Mutex::new(None),
        }
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True between `start` and `stop`, or until the loop exits on its own
    pub fn is_running(&self) -> bool {
        self.flag.is_running()
    }

    /// Launch the work loop
    ///
    /// Returns `Ok(false)` without side effects if already running.
    ///
    /// # Errors
    /// [`WorkerError::Spawn`] if the OS refuses to create the thread.
    pub fn start(&self) -> Result<bool, WorkerError> {
        let mut handle = self.handle.lock();
        if self.flag.is_running() {
            debug!(worker = %self.name, "worker already running");
            return Ok(false);
        }

        // A previous loop that died on its own still has to be reaped.
        if let Some(previous) = handle.take() {
            let _ = previous.join();
        }

        self.flag.set_running();
        let flag = self.flag.clone();
        let work = Arc::clone(&self.work);
        let worker_name = self.name.clone();

        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                debug!(worker = %worker_name, "worker loop started");
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&flag)));
                if let Err(payload) = outcome {
                    error!(
                        worker = %worker_name,
                        panic = %panic_message(payload.as_ref()),
                        "worker loop panicked, worker stopped"
                    );
                }
                // A loop that returns on its own leaves the worker stopped.
                flag.request_stop();
                debug!(worker = %worker_name, "worker loop exited");
            });

        match spawned {
            Ok(join) => {
                *handle = Some(join);
                Ok(true)
            }
            Err(e) => {
                self.flag.request_stop();
                Err(WorkerError::Spawn {
                    name: self.name.clone(),
                    source: e,
                })
            }
        }
    }

    /// Request the loop to stop and wait for it to exit
    ///
    /// Returns `false` if there was nothing to stop.
    pub fn stop(&self) -> bool {
        let mut handle = self.handle.lock();
        self.flag.request_stop();
        match handle.take() {
            Some(join) => {
                if join.join().is_err() {
                    error!(worker = %self.name, "worker thread terminated abnormally");
                }
                debug!(worker = %self.name, "worker stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WorkerThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerThread")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
