//! Statement processing for virtual tables, and marshalling of completed
//! operations into typed rows.
pub mod client;
pub mod config;
pub mod errors;
pub mod ops;
pub mod processor;
pub mod rows_result;
