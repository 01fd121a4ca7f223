//! Cache state and its transition function.
//!
//! `reduce` is the only way state changes. It is total over [`Action`] and
//! has no side effects: the same sequence of actions always yields the same
//! state.
//!
//! Both channel statuses are global rather than per table. Two concurrent
//! operations on different tables that share a channel race on the same
//! `loading`/`error` fields, and whichever result is applied last wins.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::action::{Action, Channel};
use crate::models::{Record, TableKey, TableSnapshot};

/// Loading/error track for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub loading: bool,
    pub error: Option<String>,
}

impl ChannelStatus {
    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn succeed(&mut self) {
        self.loading = false;
        self.error = None;
    }

    fn fail(&mut self, message: &str) {
        self.loading = false;
        self.error = Some(message.to_string());
    }
}

/// Serialized as `{data, readStatus, writeStatus}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupState {
    pub data: BTreeMap<TableKey, TableSnapshot>,
    pub read_status: ChannelStatus,
    pub write_status: ChannelStatus,
    /// Latest fetch generation issued per table
    #[serde(skip)]
    generations: HashMap<TableKey, u64>,
}

impl LookupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of a table, if it has been fetched at least once.
    pub fn records(&self, table: &TableKey) -> Option<&[Record]> {
        self.data.get(table).map(|s| s.records.as_slice())
    }

    pub fn snapshot(&self, table: &TableKey) -> Option<&TableSnapshot> {
        self.data.get(table)
    }

    /// Generation of the most recent `FetchRequested` for `table` (0 if none).
    pub fn latest_generation(&self, table: &TableKey) -> u64 {
        self.generations.get(table).copied().unwrap_or(0)
    }

    pub fn status(&self, channel: Channel) -> &ChannelStatus {
        match channel {
            Channel::Read => &self.read_status,
            Channel::Write => &self.write_status,
        }
    }

    fn status_mut(&mut self, channel: Channel) -> &mut ChannelStatus {
        match channel {
            Channel::Read => &mut self.read_status,
            Channel::Write => &mut self.write_status,
        }
    }

    /// Whether either channel has an operation in flight.
    pub fn is_busy(&self) -> bool {
        self.read_status.loading || self.write_status.loading
    }

    /// Whether `action` is a fetch result older than the latest fetch
    /// issued for its table. Applying such an action changes nothing.
    pub fn is_superseded(&self, action: &Action) -> bool {
        match action {
            Action::FetchSucceeded {
                table, generation, ..
            } => *generation < self.latest_generation(table),
            _ => false,
        }
    }

    /// Apply one action in place.
    pub fn apply(&mut self, action: &Action) {
        let Some(channel) = action.channel() else {
            return;
        };

        match action {
            Action::FetchRequested(table) => {
                *self.generations.entry(table.clone()).or_insert(0) += 1;
                self.read_status.begin();
            }
            Action::FetchSucceeded { table, snapshot, .. } => {
                if self.is_superseded(action) {
                    return;
                }
                self.data.insert(table.clone(), snapshot.clone());
                self.read_status.succeed();
            }
            Action::CreateRequested { .. }
            | Action::UpdateRequested { .. }
            | Action::DeleteRequested { .. } => self.write_status.begin(),
            Action::CreateSucceeded | Action::UpdateSucceeded | Action::DeleteSucceeded => {
                self.write_status.succeed()
            }
            Action::FetchFailed(message)
            | Action::CreateFailed(message)
            | Action::UpdateFailed(message)
            | Action::DeleteFailed(message) => self.status_mut(channel).fail(message),
            Action::Unrecognized => {}
        }
    }
}

/// Pure transition: `(state, action) -> state'`.
pub fn reduce(mut state: LookupState, action: &Action) -> LookupState {
    state.apply(action);
    state
}
