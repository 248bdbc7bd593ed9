//! # Ingestion Engine
//!
//! Turns a batch of spreadsheet rows into validated, column-oriented data for a
//! template, or into a row-addressable error report.
//!
//! ## Sub-modules:
//! - `type_rules`: coercion and admissibility of a single scalar per datatype.
//! - `cell`: normalization of raw cells (nested arrays, rich cells, sentinels, lists).
//! - `reference`: resolution of `validate_with` references into allow-lists.
//! - `column`: validation of one field over its whole column.
//! - `table`: the column table and the row/column reshaping helpers.
//! - `submission`: column parity and evaluation of a whole batch.

pub mod cell;
pub mod column;
pub mod reference;
pub mod submission;
pub mod table;
pub mod type_rules;

#[cfg(test)]
pub(crate) mod testing;
