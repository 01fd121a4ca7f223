//! Shared test doubles for the store integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lookupcache_core::{Action, ApiError, LookupApi, Record, RecordId, TableKey};
use tokio::sync::{broadcast, oneshot};

/// Upper bound on any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Fetch,
    Create,
    Update,
    Delete,
}

/// How one scripted call should behave.
#[derive(Default)]
pub struct Plan {
    gate: Option<oneshot::Receiver<()>>,
    fail: Option<ApiError>,
    records: Option<Vec<Record>>,
}

impl Plan {
    pub fn fail(message: &str) -> Self {
        Self {
            fail: Some(ApiError::Other(message.to_string())),
            ..Self::default()
        }
    }

    pub fn error(error: ApiError) -> Self {
        Self {
            fail: Some(error),
            ..Self::default()
        }
    }

    pub fn records(records: Vec<Record>) -> Self {
        Self {
            records: Some(records),
            ..Self::default()
        }
    }

    /// Hold the call until the returned sender fires (or is dropped).
    pub fn gated(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Some(rx);
        (self, tx)
    }
}

/// In-memory backend. Unscripted calls behave like a simple table store;
/// scripted calls follow their `Plan` in FIFO order per (op, table).
#[derive(Default)]
pub struct ScriptedApi {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    plans: Mutex<HashMap<(Op, String), VecDeque<Plan>>>,
    calls: Mutex<Vec<(Op, String)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: &str, records: Vec<Record>) -> Self {
        self.tables.lock().unwrap().insert(table.to_string(), records);
        self
    }

    pub fn script(&self, op: Op, table: &str, plan: Plan) {
        self.plans
            .lock()
            .unwrap()
            .entry((op, table.to_string()))
            .or_default()
            .push_back(plan);
    }

    pub fn calls(&self) -> Vec<(Op, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until at least `n` calls have reached the backend.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(WAIT, async {
            while self.calls.lock().unwrap().len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for backend calls");
    }

    async fn begin(&self, op: Op, table: &TableKey) -> Option<Plan> {
        self.calls.lock().unwrap().push((op, table.to_string()));
        let mut plan = self
            .plans
            .lock()
            .unwrap()
            .get_mut(&(op, table.to_string()))
            .and_then(VecDeque::pop_front);
        if let Some(gate) = plan.as_mut().and_then(|p| p.gate.take()) {
            let _ = gate.await;
        }
        plan
    }

    fn id_matches(record: &Record, id: &RecordId) -> bool {
        match record.get("id") {
            Some(serde_json::Value::Number(n)) => n.to_string() == id.as_str(),
            Some(serde_json::Value::String(s)) => s == id.as_str(),
            _ => false,
        }
    }
}

#[async_trait]
impl LookupApi for ScriptedApi {
    async fn fetch_table(&self, table: &TableKey) -> Result<Vec<Record>, ApiError> {
        let plan = self.begin(Op::Fetch, table).await;
        if let Some(plan) = plan {
            if let Some(err) = plan.fail {
                return Err(err);
            }
            if let Some(records) = plan.records {
                return Ok(records);
            }
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn create_record(&self, table: &TableKey, record: &Record) -> Result<(), ApiError> {
        if let Some(err) = self.begin(Op::Create, table).await.and_then(|p| p.fail) {
            return Err(err);
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn update_record(
        &self,
        table: &TableKey,
        id: &RecordId,
        record: &Record,
    ) -> Result<(), ApiError> {
        if let Some(err) = self.begin(Op::Update, table).await.and_then(|p| p.fail) {
            return Err(err);
        }
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        match rows.iter_mut().find(|r| Self::id_matches(r, id)) {
            Some(row) => {
                if let (Some(target), Some(patch)) = (row.as_object_mut(), record.as_object()) {
                    for (k, v) in patch {
                        target.insert(k.clone(), v.clone());
                    }
                }
                Ok(())
            }
            None => Err(ApiError::NotFound("Not found".to_string())),
        }
    }

    async fn delete_record(&self, table: &TableKey, id: &RecordId) -> Result<(), ApiError> {
        if let Some(err) = self.begin(Op::Delete, table).await.and_then(|p| p.fail) {
            return Err(err);
        }
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|r| !Self::id_matches(r, id));
        if rows.len() == before {
            return Err(ApiError::NotFound("Not found".to_string()));
        }
        Ok(())
    }
}

/// Wait for the first tapped action matching `pred`, returning it.
pub async fn wait_for(
    rx: &mut broadcast::Receiver<Action>,
    pred: impl Fn(&Action) -> bool,
) -> Action {
    tokio::time::timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(action) if pred(&action) => return action,
                Ok(_) => continue,
                Err(e) => panic!("action tap closed: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for action")
}

/// Everything already sitting in the tap, in apply order.
pub fn drain(rx: &mut broadcast::Receiver<Action>) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Ok(action) = rx.try_recv() {
        actions.push(action);
    }
    actions
}

pub fn names(actions: &[Action]) -> Vec<&'static str> {
    actions.iter().map(Action::name).collect()
}
