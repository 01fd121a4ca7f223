//! The store actor: sole owner of [`LookupState`].
//!
//! All actions, whether dispatched by UI code or by workers, travel through
//! one MPSC channel to a single task that applies them one at a time in
//! arrival order. That task is the only writer of state, so every
//! transition is atomic without locks, whatever runtime flavor hosts it.
//!
//! Readers get snapshots through a `watch` channel; every applied action is
//! also published on a broadcast "action tap".

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::action::Action;
use super::orchestrator::{self, Job};
use super::state::LookupState;
use crate::api::LookupApi;
use crate::models::{Record, RecordId, TableKey};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the store's command channel.
/// Senders wait when it is full; the actor never sends to itself, so a full
/// buffer only slows producers down.
const CHANNEL_BUFFER_SIZE: usize = 64;

/// How many applied actions a slow tap subscriber may lag behind.
const ACTION_TAP_CAPACITY: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Lookup store has stopped")]
    Closed,
}

enum Command {
    Dispatch(Action),
    WorkerFinished,
    Settle(oneshot::Sender<LookupState>),
    Shutdown,
}

/// Cheap, cloneable handle for dispatching actions into the store.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Command>,
}

impl Dispatcher {
    pub async fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        self.tx
            .send(Command::Dispatch(action))
            .await
            .map_err(|_| StoreError::Closed)
    }

    async fn worker_finished(&self) {
        // The store may already be gone during shutdown
        let _ = self.tx.send(Command::WorkerFinished).await;
    }
}

struct StoreActor {
    rx: mpsc::Receiver<Command>,
    /// Weak so the actor alone does not keep its own channel open
    tx: mpsc::WeakSender<Command>,
    api: Arc<dyn LookupApi>,
    state: watch::Sender<LookupState>,
    actions: broadcast::Sender<Action>,
    in_flight: usize,
    settle_waiters: Vec<oneshot::Sender<LookupState>>,
}

impl StoreActor {
    async fn run(mut self) {
        info!("Lookup store started");
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Dispatch(action) => self.apply(action),
                Command::WorkerFinished => self.in_flight = self.in_flight.saturating_sub(1),
                Command::Settle(reply) => self.settle_waiters.push(reply),
                Command::Shutdown => break,
            }
            self.release_settled();
        }
        info!(in_flight = self.in_flight, "Lookup store stopped");
    }

    fn apply(&mut self, action: Action) {
        debug!(action = action.name(), table = ?action.table(), "Applying action");
        if self.state.borrow().is_superseded(&action) {
            debug!(table = ?action.table(), "Discarding superseded fetch result");
        }
        self.state.send_modify(|state| state.apply(&action));

        let job = Job::from_action(&action, &self.state.borrow());
        if let Some(job) = job {
            self.spawn_worker(job);
        }

        // No subscribers is fine
        let _ = self.actions.send(action);
    }

    fn spawn_worker(&mut self, job: Job) {
        let Some(tx) = self.tx.upgrade() else {
            debug!(table = %job.table(), "No dispatchers left, skipping worker");
            return;
        };
        self.in_flight += 1;
        let api = Arc::clone(&self.api);
        let dispatcher = Dispatcher { tx };
        tokio::spawn(async move {
            orchestrator::run_job(api, dispatcher.clone(), job).await;
            dispatcher.worker_finished().await;
        });
    }

    fn release_settled(&mut self) {
        if self.in_flight > 0 || self.settle_waiters.is_empty() {
            return;
        }
        let state = self.state.borrow().clone();
        for waiter in self.settle_waiters.drain(..) {
            let _ = waiter.send(state.clone());
        }
    }
}

/// Handle to a running lookup store.
///
/// Dropping every handle and dispatcher lets the actor finish once its
/// in-flight workers have reported back.
pub struct LookupStore {
    dispatcher: Dispatcher,
    state: watch::Receiver<LookupState>,
    actions: broadcast::Sender<Action>,
    handle: JoinHandle<()>,
}

impl LookupStore {
    /// Start the store actor on the current tokio runtime.
    pub fn spawn(api: Arc<dyn LookupApi>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (state_tx, state_rx) = watch::channel(LookupState::new());
        let (actions_tx, _) = broadcast::channel(ACTION_TAP_CAPACITY);
        let dispatcher = Dispatcher { tx };

        let actor = StoreActor {
            rx,
            tx: dispatcher.tx.downgrade(),
            api,
            state: state_tx,
            actions: actions_tx.clone(),
            in_flight: 0,
            settle_waiters: Vec::new(),
        };
        let handle = tokio::spawn(actor.run());

        Self {
            dispatcher,
            state: state_rx,
            actions: actions_tx,
            handle,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    pub async fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        self.dispatcher.dispatch(action).await
    }

    pub async fn fetch(&self, table: impl Into<TableKey>) -> Result<(), StoreError> {
        self.dispatch(Action::fetch_requested(table)).await
    }

    pub async fn create(&self, table: impl Into<TableKey>, record: Record) -> Result<(), StoreError> {
        self.dispatch(Action::create_requested(table, record)).await
    }

    pub async fn update(
        &self,
        table: impl Into<TableKey>,
        id: impl Into<RecordId>,
        record: Record,
    ) -> Result<(), StoreError> {
        self.dispatch(Action::update_requested(table, id, record)).await
    }

    pub async fn delete(
        &self,
        table: impl Into<TableKey>,
        id: impl Into<RecordId>,
    ) -> Result<(), StoreError> {
        self.dispatch(Action::delete_requested(table, id)).await
    }

    /// The current state.
    pub fn state(&self) -> LookupState {
        self.state.borrow().clone()
    }

    /// A receiver that wakes whenever an action has been applied.
    pub fn watch(&self) -> watch::Receiver<LookupState> {
        self.state.clone()
    }

    /// Every action applied from now on, in apply order.
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.actions.subscribe()
    }

    /// Wait until no worker is in flight, then return the state at that point.
    ///
    /// Reloads triggered by writes count as in flight, so after a successful
    /// write this returns only once the reloaded table has landed.
    pub async fn settle(&self) -> Result<LookupState, StoreError> {
        let (reply, wait) = oneshot::channel();
        self.dispatcher
            .tx
            .send(Command::Settle(reply))
            .await
            .map_err(|_| StoreError::Closed)?;
        wait.await.map_err(|_| StoreError::Closed)
    }

    /// Stop the actor. Results from workers still in flight are dropped.
    pub async fn shutdown(self) {
        if self.dispatcher.tx.send(Command::Shutdown).await.is_ok() {
            let _ = self.handle.await;
        }
    }
}
