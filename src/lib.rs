//! SourceDock — admin tooling for connector-driven document indexing.
//!
//! A library plus a CLI (`dock`) for wiring external content sources
//! (Slack, Drive, wikis, plain files) into an indexing backend: create
//! credentials, walk the connector setup flow, and watch per-source
//! indexing health.
//!
//! The main pieces:
//!
//! - [`models`] — wire types shared with the backend (sources,
//!   connectors, credentials, indexing snapshots)
//! - [`schema`] — per-source configuration schemas and field transforms
//! - [`wizard`] — the three-step setup flow and its submission protocol
//! - [`status`] — grouping, summarizing, and filtering indexing status
//! - [`api`] — the HTTP backend client behind the [`api::Backend`] trait
//! - [`cache`] — typed fetch cache with explicit invalidation
//! - [`prefs`] — persisted expand/collapse state for the status table

pub mod api;
pub mod cache;
pub mod ccpair;
pub mod config;
pub mod credentials;
pub mod models;
pub mod prefs;
pub mod schema;
pub mod sources;
pub mod status;
pub mod upload;
pub mod wizard;
