//! # Generation Coordinator
//!
//! Staleness-coalescing request handling for one stage. At most one worker
//! runs at a time; requests arriving meanwhile only mark the running result
//! obsolete, and the coordinator re-requests once that worker finishes,
//! capturing whatever the inputs are by then.
//!
//! ```text
//! request ──► idle?  ── yes ──► capture ─► spawn worker ─► Started
//!               │                            └─ spawn error ─► publish failure ─► Failed
//!               │
//!               no ──► obsolete = true ──► Coalesced
//!
//! poll / wait ──► worker done? ─► publish ─► notify observers
//!                                   └─► obsolete? ─► request again
//! ```
//!
//! All coordinator state lives on the control thread. Workers only send
//! their output back over a channel.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::stage::Stage;

/// What [`Coordinator::request`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// A worker was started with freshly captured input
    Started,
    /// A worker is running; one trailing run will follow it
    Coalesced,
    /// The stage had nothing to capture
    Skipped,
    /// No worker could be started; a failed result was published instead
    Failed,
}

type Observer<T> = Box<dyn FnMut(&Arc<T>) + Send>;

struct Worker<T> {
    run: u64,
    receiver: Receiver<T>,
    handle: JoinHandle<()>,
}

/// Drives one [`Stage`].
pub struct Coordinator<S: Stage> {
    stage: S,
    in_flight: Option<Worker<S::Output>>,
    obsolete: bool,
    latest: Option<Arc<S::Output>>,
    unclaimed: Option<Arc<S::Output>>,
    observers: Vec<Observer<S::Output>>,
    runs_started: u64,
    runs_published: u64,
}

impl<S: Stage> Coordinator<S> {
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            in_flight: None,
            obsolete: false,
            latest: None,
            unclaimed: None,
            observers: Vec::new(),
            runs_started: 0,
            runs_published: 0,
        }
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// Asks for a result reflecting the current `context`. Never blocks.
    pub fn request(&mut self, context: &S::Context) -> RequestStatus {
        if self.in_flight.is_some() {
            self.obsolete = true;
            debug!(stage = S::NAME, "request coalesced");
            return RequestStatus::Coalesced;
        }
        self.obsolete = false;
        let Some(input) = self.stage.capture(context) else {
            debug!(stage = S::NAME, "nothing to capture, request skipped");
            return RequestStatus::Skipped;
        };

        self.runs_started += 1;
        let run = self.runs_started;
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("{}-worker", S::NAME))
            .spawn(move || {
                let output = match panic::catch_unwind(AssertUnwindSafe(|| S::run(input))) {
                    Ok(output) => output,
                    Err(payload) => {
                        let error = GenerationError::panicked(S::NAME, payload.as_ref());
                        warn!(%error, "stage worker failed");
                        S::failed(error.to_string())
                    }
                };
                // The coordinator may be gone; its result no longer matters then
                let _ = sender.send(output);
            });

        match spawned {
            Ok(handle) => {
                debug!(stage = S::NAME, run, "worker started");
                self.in_flight = Some(Worker {
                    run,
                    receiver,
                    handle,
                });
            }
            Err(source) => return self.spawn_failed(source),
        }
        RequestStatus::Started
    }

    fn spawn_failed(&mut self, source: io::Error) -> RequestStatus {
        let error = GenerationError::Spawn {
            stage: S::NAME,
            source,
        };
        warn!(%error, "stage worker failed");
        self.publish(S::failed(error.to_string()));
        RequestStatus::Failed
    }

    /// Publishes the running worker's output if it is ready.
    pub fn poll(&mut self, context: &S::Context) -> Option<Arc<S::Output>> {
        let worker = self.in_flight.as_ref()?;
        let output = match worker.receiver.try_recv() {
            Ok(output) => output,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Self::disconnected(),
        };
        Some(self.finish(output, context))
    }

    /// Blocks until the running worker finishes and publishes its output.
    pub fn wait(&mut self, context: &S::Context) -> Option<Arc<S::Output>> {
        let worker = self.in_flight.as_ref()?;
        let output = worker.receiver.recv().unwrap_or_else(|_| Self::disconnected());
        Some(self.finish(output, context))
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True when a trailing run will follow the running worker.
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    /// Takes the last published result not taken yet.
    pub fn take_result(&mut self) -> Option<Arc<S::Output>> {
        self.unclaimed.take()
    }

    /// Last published result, taken or not.
    pub fn latest(&self) -> Option<&Arc<S::Output>> {
        self.latest.as_ref()
    }

    /// Registers a callback invoked on the control thread for every
    /// published result.
    pub fn subscribe(&mut self, observer: impl FnMut(&Arc<S::Output>) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    pub fn runs_published(&self) -> u64 {
        self.runs_published
    }

    fn disconnected() -> S::Output {
        let error = GenerationError::WorkerDisconnected { stage: S::NAME };
        warn!(%error, "stage worker failed");
        S::failed(error.to_string())
    }

    fn finish(&mut self, output: S::Output, context: &S::Context) -> Arc<S::Output> {
        if let Some(worker) = self.in_flight.take() {
            debug!(stage = S::NAME, run = worker.run, "worker finished");
            if worker.handle.join().is_err() {
                warn!(stage = S::NAME, "worker thread ended abnormally");
            }
        }
        let published = self.publish(output);
        if self.obsolete {
            self.request(context);
        }
        published
    }

    fn publish(&mut self, output: S::Output) -> Arc<S::Output> {
        self.runs_published += 1;
        let output = Arc::new(output);
        debug!(
            stage = S::NAME,
            succeeded = S::succeeded(&output),
            "result published"
        );
        for observer in &mut self.observers {
            observer(&output);
        }
        self.latest = Some(Arc::clone(&output));
        self.unclaimed = Some(Arc::clone(&output));
        output
    }
}
