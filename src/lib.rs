//! Global Search - substring search over open documents and workspace files
//!
//! The crate is split into the corpus layer (where text comes from) and the
//! search layer (how a query becomes an ordered, grouped result list).

pub mod config;
pub mod corpus;
pub mod diagnostics;
pub mod search;
pub mod telemetry;
pub mod utils;
