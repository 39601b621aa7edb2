#![deny(rust_2018_idioms, unsafe_code)]

//! Orchestration, the schema validation gate, the report builder, and the
//! closed error taxonomy.
//!
//! This crate is the only one that knows how to sequence `schema-describer`
//! and `schema-differ` into one end-to-end run; neither of those crates
//! depends on this one.

pub mod cancellation;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod validate;

pub use cancellation::CancellationToken;
pub use error::{CoreError, CoreResult};
pub use orchestrator::{DiffEngine, DiffOutcome, DiffRequest};
pub use report::Report;
pub use validate::ValidationError;
