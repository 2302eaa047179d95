//! Command line front-end for parsing statements and querying the system
//! tables of an in-process permissions store.
pub mod args;
pub mod commands;
pub mod demo;
pub mod output;
