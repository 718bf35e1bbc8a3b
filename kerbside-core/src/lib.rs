//! Core types and service wiring for the kerbside special pickup client.

/// Bundle of ports that together make up one backend.
pub mod backend;
/// Pickup eligibility calendar: day generation, date set resolution, and selection.
pub mod calendar;
/// Special pickup submission form and its field rules.
pub mod form;
/// Domain models and identifiers shared by all backends.
pub mod model;
/// Traits describing the backend interfaces.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;

pub use backend::*;
pub use calendar::*;
pub use form::*;
pub use model::*;
pub use ports::*;
pub use service::*;

// Only the integration tests drive the async service.
#[cfg(test)]
use tokio as _;
