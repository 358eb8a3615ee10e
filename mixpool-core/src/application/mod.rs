//! The coordinator singleton: message dispatch, session lifecycle, relay.

mod coordinator;
mod lifecycle;
mod relay;

pub use coordinator::{Coordinator, CoordinatorDeps};
