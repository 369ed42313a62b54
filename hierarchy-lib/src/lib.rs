//! Hierarchy tree library
//!
//! A lazily loaded tree over a remote node/leaf hierarchy: paginated
//! fetching with stale-reply suppression, selection, drag-and-drop
//! reordering with fractional sort keys and breadcrumb reconstruction.

pub mod breadcrumb;
pub mod config;
pub mod driver;
pub mod dropzone;
pub mod engine;
pub mod error;
pub mod i18n;
pub mod model;
pub mod node;
pub mod service;
pub mod sort_key;
pub mod tracker;

pub use driver::TreeDriver;
pub use engine::TreeEngine;
pub use engine::TreeEvent;
pub use error::Error;
