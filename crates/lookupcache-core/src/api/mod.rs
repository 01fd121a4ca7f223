//! REST API client module for the lookup endpoints.
//!
//! This module provides the `LookupApi` trait that the store's workers call,
//! and `ApiClient`, its HTTP implementation against the backend's
//! `/lookup/{table}` resource.
//!
//! Authenticated requests carry a JWT bearer token.

pub mod client;
pub mod error;

use async_trait::async_trait;

pub use client::ApiClient;
pub use error::ApiError;

use crate::models::{Record, RecordId, TableKey};

/// The remote store that owns the source of truth for lookup tables.
///
/// Every call either succeeds or fails as a whole; write responses are not
/// consumed because the cache reloads the table after each successful write.
#[async_trait]
pub trait LookupApi: Send + Sync {
    /// `GET /lookup/{table}`: the whole table, in backend order.
    async fn fetch_table(&self, table: &TableKey) -> Result<Vec<Record>, ApiError>;

    /// `POST /lookup/{table}`
    async fn create_record(&self, table: &TableKey, record: &Record) -> Result<(), ApiError>;

    /// `PUT /lookup/{table}/{id}`
    async fn update_record(
        &self,
        table: &TableKey,
        id: &RecordId,
        record: &Record,
    ) -> Result<(), ApiError>;

    /// `DELETE /lookup/{table}/{id}`
    async fn delete_record(&self, table: &TableKey, id: &RecordId) -> Result<(), ApiError>;
}
