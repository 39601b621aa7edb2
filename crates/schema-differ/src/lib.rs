#![deny(rust_2018_idioms, unsafe_code)]

//! Pure schema comparison and migration-script synthesis.
//!
//! Everything here is a pure function of already-read, already-validated
//! [`schema_describer::Schema`] values: no I/O, no fallibility.

pub mod clock;
pub mod compare;
pub mod model;
pub mod synth;

pub use clock::{Clock, FixedClock, SystemClock};
pub use compare::compare;
pub use model::{DiffSummary, Modification, SchemaComparison, TableDiff};
pub use synth::{renderer, synthesize, SqlRenderer};
