//! Virtual tables answering queries over live cluster metadata.
pub mod errors;
pub mod metadata;
pub mod registry;
pub mod request;
pub mod tables;
pub mod vtable;
