//! Pass-request intake and reporting service.
//!
//! Request records live in a Notion database, the student roster in a
//! Supabase Postgres instance. This crate provides the HTTP API plus the
//! report aggregation pipeline behind the admin dashboard: facet
//! derivation, compound filtering, stable sorting, per-student stats
//! with abort-superseded-request semantics, and PDF export through a
//! headless Chromium instance.

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod pdf;
pub mod report;
pub mod state;
pub mod store;

pub use error::{Error, Result};
