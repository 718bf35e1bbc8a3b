//! Bundle of the ports that make up one backend.

use std::sync::Arc;

use crate::ports::{PickupPort, ProfilePort, SchedulePort};

/// Collection of ports implementing one backend.
pub struct Backend {
    /// Implementation for reading user profiles.
    pub profile_port: Arc<dyn ProfilePort>,
    /// Implementation for fetching route schedules.
    pub schedule_port: Arc<dyn SchedulePort>,
    /// Implementation for listing and submitting special pickups.
    pub pickup_port: Arc<dyn PickupPort>,
}

impl Backend {
    /// Build a backend from its ports.
    #[must_use]
    pub fn new(
        profile_port: Arc<dyn ProfilePort>,
        schedule_port: Arc<dyn SchedulePort>,
        pickup_port: Arc<dyn PickupPort>,
    ) -> Self {
        Self {
            profile_port,
            schedule_port,
            pickup_port,
        }
    }
}
