//! fusionsync-core - Core library for fusionsync
//!
//! This crate contains the resource models, the per-kind file mapping tables,
//! and the download/upload/watch engine shared by the `fusionsync` CLI.

pub mod api;
pub mod config;
pub mod error;
pub mod lambda;
pub mod mapping;
pub mod models;
pub mod sync;
pub mod util;
pub mod watch;

pub use error::{Error, Result};
pub use models::{Resource, ResourceId, ResourceKind};
