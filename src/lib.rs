//! Motor-insurance claims ETL and descriptive reporting.
//!
//! A single linear pipeline over one SQLite table: declare the schema,
//! bulk-load raw CSV policy records, sanity-check the load, compute three
//! derived feature columns in place, then run seven read-only aggregate
//! queries (loss ratios, averages, counts by categorical dimension).

pub mod config;
pub mod enrich;
pub mod error;
pub mod loader;
pub mod logging;
pub mod report;
pub mod schema;
pub mod storage;
pub mod validate;
