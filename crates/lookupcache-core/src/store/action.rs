//! Intent and result actions for the lookup cache.
//!
//! Actions are plain data. Building one never fails and never touches the
//! network; the store decides what to do with it. On the wire an action is
//! a tagged record `{"kind": "...", "payload": ...}`, which is what a UI
//! bridge sends and receives.

use serde::{Deserialize, Serialize};

use crate::models::{Record, RecordId, TableKey, TableSnapshot};

/// Which loading/error track an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Action {
    /// Start reading a table
    FetchRequested(TableKey),
    /// A read completed; `generation` is the ticket the fetch was issued with
    FetchSucceeded {
        #[serde(rename = "tableKey")]
        table: TableKey,
        snapshot: TableSnapshot,
        generation: u64,
    },
    FetchFailed(String),

    /// Start inserting a record
    CreateRequested {
        #[serde(rename = "tableKey")]
        table: TableKey,
        record: Record,
    },
    CreateSucceeded,
    CreateFailed(String),

    /// Start modifying a record
    UpdateRequested {
        #[serde(rename = "tableKey")]
        table: TableKey,
        id: RecordId,
        record: Record,
    },
    UpdateSucceeded,
    UpdateFailed(String),

    /// Start removing a record
    DeleteRequested {
        #[serde(rename = "tableKey")]
        table: TableKey,
        id: RecordId,
    },
    DeleteSucceeded,
    DeleteFailed(String),

    /// Any kind this version does not know; applying it changes nothing.
    #[serde(other)]
    Unrecognized,
}

impl Action {
    pub fn fetch_requested(table: impl Into<TableKey>) -> Self {
        Action::FetchRequested(table.into())
    }

    pub fn fetch_succeeded(table: impl Into<TableKey>, records: Vec<Record>, generation: u64) -> Self {
        Action::FetchSucceeded {
            table: table.into(),
            snapshot: TableSnapshot::new(records),
            generation,
        }
    }

    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Action::FetchFailed(message.into())
    }

    pub fn create_requested(table: impl Into<TableKey>, record: Record) -> Self {
        Action::CreateRequested {
            table: table.into(),
            record,
        }
    }

    pub fn create_succeeded() -> Self {
        Action::CreateSucceeded
    }

    pub fn create_failed(message: impl Into<String>) -> Self {
        Action::CreateFailed(message.into())
    }

    pub fn update_requested(table: impl Into<TableKey>, id: impl Into<RecordId>, record: Record) -> Self {
        Action::UpdateRequested {
            table: table.into(),
            id: id.into(),
            record,
        }
    }

    pub fn update_succeeded() -> Self {
        Action::UpdateSucceeded
    }

    pub fn update_failed(message: impl Into<String>) -> Self {
        Action::UpdateFailed(message.into())
    }

    pub fn delete_requested(table: impl Into<TableKey>, id: impl Into<RecordId>) -> Self {
        Action::DeleteRequested {
            table: table.into(),
            id: id.into(),
        }
    }

    pub fn delete_succeeded() -> Self {
        Action::DeleteSucceeded
    }

    pub fn delete_failed(message: impl Into<String>) -> Self {
        Action::DeleteFailed(message.into())
    }

    /// Stable kind name, matching the serialized `kind` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Action::FetchRequested(_) => "FetchRequested",
            Action::FetchSucceeded { .. } => "FetchSucceeded",
            Action::FetchFailed(_) => "FetchFailed",
            Action::CreateRequested { .. } => "CreateRequested",
            Action::CreateSucceeded => "CreateSucceeded",
            Action::CreateFailed(_) => "CreateFailed",
            Action::UpdateRequested { .. } => "UpdateRequested",
            Action::UpdateSucceeded => "UpdateSucceeded",
            Action::UpdateFailed(_) => "UpdateFailed",
            Action::DeleteRequested { .. } => "DeleteRequested",
            Action::DeleteSucceeded => "DeleteSucceeded",
            Action::DeleteFailed(_) => "DeleteFailed",
            Action::Unrecognized => "Unrecognized",
        }
    }

    pub fn channel(&self) -> Option<Channel> {
        match self {
            Action::FetchRequested(_) | Action::FetchSucceeded { .. } | Action::FetchFailed(_) => {
                Some(Channel::Read)
            }
            Action::CreateRequested { .. }
            | Action::CreateSucceeded
            | Action::CreateFailed(_)
            | Action::UpdateRequested { .. }
            | Action::UpdateSucceeded
            | Action::UpdateFailed(_)
            | Action::DeleteRequested { .. }
            | Action::DeleteSucceeded
            | Action::DeleteFailed(_) => Some(Channel::Write),
            Action::Unrecognized => None,
        }
    }

    /// Whether this action asks for remote work (and so spawns a worker).
    pub fn is_intent(&self) -> bool {
        matches!(
            self,
            Action::FetchRequested(_)
                | Action::CreateRequested { .. }
                | Action::UpdateRequested { .. }
                | Action::DeleteRequested { .. }
        )
    }

    /// The table an action names, if its payload carries one.
    pub fn table(&self) -> Option<&TableKey> {
        match self {
            Action::FetchRequested(table)
            | Action::FetchSucceeded { table, .. }
            | Action::CreateRequested { table, .. }
            | Action::UpdateRequested { table, .. }
            | Action::DeleteRequested { table, .. } => Some(table),
            _ => None,
        }
    }

    /// The error message of a `*Failed` result.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Action::FetchFailed(message)
            | Action::CreateFailed(message)
            | Action::UpdateFailed(message)
            | Action::DeleteFailed(message) => Some(message),
            _ => None,
        }
    }
}
