use crate::{AssetError, AssetImporter, ImportedModel};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// Identifies one started load. `generation` increases with every load the
/// viewer starts, so only the newest ticket is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub path: String,
}

/// A finished import, successful or not.
#[derive(Debug)]
pub struct ImportCompletion {
    pub ticket: LoadTicket,
    pub result: Result<ImportedModel, AssetError>,
}

/// Runs imports off the event loop and hands back completions when polled.
///
/// Completions are only ever applied by the caller of `poll`, so the scene is
/// mutated from a single thread. There is no cancellation: every started job
/// eventually completes.
pub trait ImportDriver {
    fn start(&mut self, ticket: LoadTicket);
    /// Completions that arrived since the last poll, in arrival order.
    fn poll(&mut self) -> Vec<ImportCompletion>;
    /// Jobs started but not yet returned by `poll`.
    fn in_flight(&self) -> usize;
}

/// One worker thread per import, results delivered over a channel.
pub struct ThreadedImports {
    importer: Arc<dyn AssetImporter>,
    sender: Sender<ImportCompletion>,
    receiver: Receiver<ImportCompletion>,
    in_flight: usize,
}

impl ThreadedImports {
    pub fn new(importer: Arc<dyn AssetImporter>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            importer,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Block until at least one completion arrives or the timeout passes.
    pub fn wait(&mut self, timeout: Duration) -> Vec<ImportCompletion> {
        if self.in_flight == 0 {
            return Vec::new();
        }
        let mut done = Vec::new();
        if let Ok(first) = self.receiver.recv_timeout(timeout) {
            done.push(first);
            done.extend(self.receiver.try_iter());
        }
        self.in_flight -= done.len();
        done
    }
}

impl ImportDriver for ThreadedImports {
    fn start(&mut self, ticket: LoadTicket) {
        let importer = Arc::clone(&self.importer);
        let sender = self.sender.clone();
        let job = ticket.clone();
        self.in_flight += 1;

        let spawned = std::thread::Builder::new()
            .name(format!("import-{}", ticket.generation))
            .spawn(move || {
                let result = importer.import(Path::new(&job.path));
                // The receiver only goes away with the driver itself.
                let _ = sender.send(ImportCompletion { ticket: job, result });
            });

        if let Err(e) = spawned {
            tracing::error!(generation = ticket.generation, "failed to spawn import worker: {e}");
            let _ = self.sender.send(ImportCompletion {
                ticket,
                result: Err(AssetError::Worker(e.to_string())),
            });
        }
    }

    fn poll(&mut self) -> Vec<ImportCompletion> {
        let done: Vec<ImportCompletion> = self.receiver.try_iter().collect();
        self.in_flight -= done.len();
        done
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[derive(Default)]
struct ManualState {
    pending: Vec<LoadTicket>,
    ready: Vec<ImportCompletion>,
}

/// Driver whose jobs complete only when resolved by hand.
///
/// Clones share state, so a test can keep one handle while the viewer owns
/// another and decide exactly when, and in which order, imports finish.
#[derive(Clone, Default)]
pub struct ManualImports {
    state: Rc<RefCell<ManualState>>,
}

impl ManualImports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickets started and not yet resolved, oldest first.
    pub fn pending(&self) -> Vec<LoadTicket> {
        self.state.borrow().pending.clone()
    }

    /// Complete the pending job with the given generation. Returns false if no
    /// such job is pending.
    pub fn resolve(&self, generation: u64, result: Result<ImportedModel, AssetError>) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(index) = state.pending.iter().position(|t| t.generation == generation) else {
            return false;
        };
        let ticket = state.pending.remove(index);
        state.ready.push(ImportCompletion { ticket, result });
        true
    }
}

impl ImportDriver for ManualImports {
    fn start(&mut self, ticket: LoadTicket) {
        self.state.borrow_mut().pending.push(ticket);
    }

    fn poll(&mut self) -> Vec<ImportCompletion> {
        std::mem::take(&mut self.state.borrow_mut().ready)
    }

    fn in_flight(&self) -> usize {
        let state = self.state.borrow();
        state.pending.len() + state.ready.len()
    }
}
