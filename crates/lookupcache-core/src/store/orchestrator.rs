//! Workers that turn intent actions into remote calls and result actions.
//!
//! Every `*Requested` action becomes one [`Job`], run on its own tokio task.
//! Workers race freely: there is no deduplication, queuing or cancellation,
//! and no retry. A failure is reported as the matching `*Failed` action and
//! never escapes the worker.
//!
//! After a successful create, update or delete, the worker dispatches a fresh
//! `FetchRequested` for the same table so the cache is reloaded from the
//! backend instead of being patched locally.

use std::sync::Arc;

use tracing::{debug, warn};

use super::action::Action;
use super::runtime::Dispatcher;
use super::state::LookupState;
use crate::api::{ApiError, LookupApi};
use crate::models::{Record, RecordId, TableKey};

/// Remote work derived from one intent action.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Fetch {
        table: TableKey,
        generation: u64,
    },
    Create {
        table: TableKey,
        record: Record,
    },
    Update {
        table: TableKey,
        id: RecordId,
        record: Record,
    },
    Delete {
        table: TableKey,
        id: RecordId,
    },
}

impl Job {
    /// The job for an intent action, given the state it was just applied to.
    ///
    /// Fetches take the generation that applying the action issued.
    pub fn from_action(action: &Action, state: &LookupState) -> Option<Self> {
        match action {
            Action::FetchRequested(table) => Some(Job::Fetch {
                table: table.clone(),
                generation: state.latest_generation(table),
            }),
            Action::CreateRequested { table, record } => Some(Job::Create {
                table: table.clone(),
                record: record.clone(),
            }),
            Action::UpdateRequested { table, id, record } => Some(Job::Update {
                table: table.clone(),
                id: id.clone(),
                record: record.clone(),
            }),
            Action::DeleteRequested { table, id } => Some(Job::Delete {
                table: table.clone(),
                id: id.clone(),
            }),
            _ => None,
        }
    }

    pub fn table(&self) -> &TableKey {
        match self {
            Job::Fetch { table, .. }
            | Job::Create { table, .. }
            | Job::Update { table, .. }
            | Job::Delete { table, .. } => table,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Job::Fetch { .. } => "fetch",
            Job::Create { .. } => "create",
            Job::Update { .. } => "update",
            Job::Delete { .. } => "delete",
        }
    }
}

/// Run one job to completion, dispatching its result action(s).
pub async fn run_job(api: Arc<dyn LookupApi>, dispatcher: Dispatcher, job: Job) {
    let name = job.name();
    debug!(job = name, table = %job.table(), "Worker started");

    match job {
        Job::Fetch { table, generation } => {
            let action = match api.fetch_table(&table).await {
                Ok(records) => {
                    debug!(%table, generation, count = records.len(), "Table fetched");
                    Action::fetch_succeeded(table, records, generation)
                }
                Err(e) => {
                    report_failure(name, &table, &e);
                    Action::fetch_failed(e.to_string())
                }
            };
            send(&dispatcher, action).await;
        }
        Job::Create { table, record } => {
            let result = api.create_record(&table, &record).await;
            finish_write(
                &dispatcher,
                name,
                table,
                result,
                Action::CreateSucceeded,
                Action::CreateFailed,
            )
            .await;
        }
        Job::Update { table, id, record } => {
            let result = api.update_record(&table, &id, &record).await;
            finish_write(
                &dispatcher,
                name,
                table,
                result,
                Action::UpdateSucceeded,
                Action::UpdateFailed,
            )
            .await;
        }
        Job::Delete { table, id } => {
            let result = api.delete_record(&table, &id).await;
            finish_write(
                &dispatcher,
                name,
                table,
                result,
                Action::DeleteSucceeded,
                Action::DeleteFailed,
            )
            .await;
        }
    }
}

/// Report a write's outcome; on success, also ask for the table to reload.
async fn finish_write(
    dispatcher: &Dispatcher,
    name: &str,
    table: TableKey,
    result: Result<(), ApiError>,
    succeeded: Action,
    failed: fn(String) -> Action,
) {
    match result {
        Ok(()) => {
            debug!(job = name, %table, "Write succeeded, reloading table");
            send(dispatcher, succeeded).await;
            send(dispatcher, Action::fetch_requested(table)).await;
        }
        Err(e) => {
            report_failure(name, &table, &e);
            send(dispatcher, failed(e.to_string())).await;
        }
    }
}

fn report_failure(name: &str, table: &TableKey, error: &ApiError) {
    if error.is_session_expired() {
        warn!(job = name, %table, error = %error, "Lookup API rejected the session token");
    } else {
        warn!(job = name, %table, error = %error, "Lookup API call failed");
    }
}

/// Helper to dispatch a result, logging if the store is gone
async fn send(dispatcher: &Dispatcher, action: Action) {
    let name = action.name();
    if let Err(e) = dispatcher.dispatch(action).await {
        debug!(action = name, error = %e, "Dropping worker result - store stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::state::reduce;
    use serde_json::json;

    #[test]
    fn test_job_from_fetch_takes_issued_generation() {
        let action = Action::fetch_requested("Country");
        let state = reduce(LookupState::new(), &action);
        let state = reduce(state, &action);

        assert_eq!(
            Job::from_action(&action, &state),
            Some(Job::Fetch {
                table: TableKey::from("Country"),
                generation: 2,
            })
        );
    }

    #[test]
    fn test_job_from_write_intents() {
        let state = LookupState::new();
        assert_eq!(
            Job::from_action(&Action::create_requested("Country", json!({"name": "CA"})), &state),
            Some(Job::Create {
                table: TableKey::from("Country"),
                record: json!({"name": "CA"}),
            })
        );
        assert_eq!(
            Job::from_action(&Action::delete_requested("Country", 1i64), &state)
                .map(|job| job.table().clone()),
            Some(TableKey::from("Country"))
        );
    }

    #[test]
    fn test_result_actions_spawn_no_job() {
        let state = LookupState::new();
        for action in [
            Action::fetch_succeeded("Country", vec![], 1),
            Action::fetch_failed("x"),
            Action::create_succeeded(),
            Action::update_failed("y"),
            Action::delete_succeeded(),
            Action::Unrecognized,
        ] {
            assert!(Job::from_action(&action, &state).is_none(), "{}", action.name());
        }
    }
}
