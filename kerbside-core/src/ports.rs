//! Traits describing backend capabilities and the shared error type.

use async_trait::async_trait;
use chrono::ParseError as ChronoParseError;
use reqwest::Error as ReqwestError;

use crate::form::FieldError;
use crate::model::{NewSpecialPickup, Profile, RouteId, ScheduleRecord, SpecialPickup, UserId};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the backend or preparing requests for it.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Failed to parse a date.
    #[error("Parse error: {0}")]
    Parse(#[from] ChronoParseError),
    /// Waste type text outside the known set.
    #[error("Unknown waste type: {0}")]
    UnknownWasteType(String),
    /// Year/month pair that cannot be shown as a calendar.
    #[error("Invalid month {month0} of year {year}")]
    InvalidMonth {
        /// Requested year.
        year: i32,
        /// Requested zero-based month.
        month0: u32,
    },
    /// The user's profile has no collection route.
    #[error("No route assigned")]
    NoRouteAssigned,
    /// User identifier is not usable by the backend.
    #[error("Invalid user id")]
    InvalidUserId,
    /// Pickup form failed validation.
    #[error("Invalid form: {}", join_messages(.0))]
    InvalidForm(Vec<FieldError>),
    /// Backend refused the request.
    #[error("Rejected: {0}")]
    Rejected(String),
    /// Internal backend error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
/// Trait for backends serving user profiles.
pub trait ProfilePort: Send + Sync {
    /// Fetch the profile of a user.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn profile(&self, user_id: &UserId) -> Result<Profile, PortError>;
}

#[async_trait]
/// Trait for backends serving route collection schedules.
pub trait SchedulePort: Send + Sync {
    /// Fetch the schedule record of a route for the current month.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails or the route is unknown.
    async fn schedule(&self, route_id: &RouteId) -> Result<ScheduleRecord, PortError>;
}

#[async_trait]
/// Trait for backends storing special pickups.
pub trait PickupPort: Send + Sync {
    /// List all special pickups.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn list(&self) -> Result<Vec<SpecialPickup>, PortError>;

    /// Create a special pickup.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Rejected`] when the backend refuses the request,
    /// or another [`PortError`] when the request fails.
    async fn submit(&self, request: &NewSpecialPickup) -> Result<(), PortError>;
}
