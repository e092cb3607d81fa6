//! lexiscreen-core: scorers, result store, and risk aggregation.
//!
//! This crate defines the screening data model, the per-test scoring rules,
//! the persisted result layout, and the pure aggregation engine that the
//! presenters and the CLI build on.

pub mod aggregate;
pub mod checklist;
pub mod error;
pub mod handwriting;
pub mod model;
pub mod report;
pub mod scorers;
pub mod store;
