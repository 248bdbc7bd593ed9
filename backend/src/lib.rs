//! Schema-driven ingestion of tabular submissions.
//!
//! Dependencies submit rows against published templates; the [`engine`]
//! normalizes and validates them, the [`storage`] layer keeps the accepted
//! data and the rejection log, and [`services`] exposes both over HTTP.

pub mod config;
pub mod engine;
pub mod services;
pub mod storage;
pub mod submission_lock;
