//! Data models for lookup tables.
//!
//! Lookup tables are small reference datasets (countries, categories, ...)
//! that are read far more often than written. This layer treats both the
//! table keys and the records inside them as opaque:
//!
//! - `TableKey`, `RecordId`: identifiers rendered into API paths verbatim
//! - `Record`: whatever JSON value the backend returns for a row
//! - `TableSnapshot`: one table's records plus the time they were fetched

pub mod snapshot;
pub mod table;

pub use snapshot::TableSnapshot;
pub use table::{Record, RecordId, TableKey};
