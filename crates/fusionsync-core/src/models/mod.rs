//! Data models for fusionsync

mod kind;
mod resource;

pub use kind::{Endpoint, ResourceKind};
pub use resource::{Resource, ResourceId};
