//! High-level service facade over a backend.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::calendar::{MonthView, PickupCalendar};
use crate::form::PickupForm;
use crate::model::{NewSpecialPickup, ScheduleRecord, SessionContext, SpecialPickup};
use crate::ports::PortError;

/// Public entry point for loading pickup calendars and submitting pickups.
pub struct KerbsideService {
    backend: Arc<Backend>,
}

impl KerbsideService {
    /// Create a new service bound to the provided backend.
    #[must_use]
    pub fn new(backend: Arc<Backend>) -> Self {
        Self { backend }
    }

    /// Load the collection schedule of the route the session's user lives on.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NoRouteAssigned`] when the profile has no route,
    /// or a [`PortError`] when a backend request fails.
    pub async fn schedule_for(&self, session: &SessionContext) -> Result<ScheduleRecord, PortError> {
        let profile = self.backend.profile_port.profile(&session.user_id).await?;
        let route_id = profile.route_id.ok_or(PortError::NoRouteAssigned)?;
        debug!(user = %session.user_id, route = %route_id, "fetching schedule");
        self.backend.schedule_port.schedule(&route_id).await
    }

    /// Build the pickup calendar of `month` for the session's user.
    ///
    /// Never fails: when the schedule cannot be loaded the calendar simply has
    /// no eligible days.
    pub async fn load_calendar(&self, session: &SessionContext, month: MonthView) -> PickupCalendar {
        let mut calendar = PickupCalendar::new(month);
        calendar.apply_schedule(self.schedule_for(session).await);
        calendar
    }

    /// List all special pickups.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    pub async fn pickups(&self) -> Result<Vec<SpecialPickup>, PortError> {
        self.backend.pickup_port.list().await
    }

    /// Validate `form` and submit it as a new special pickup.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidForm`] without contacting the backend when
    /// validation fails, or a [`PortError`] when the backend refuses or fails.
    pub async fn submit_pickup(
        &self,
        session: &SessionContext,
        form: &PickupForm,
        today: NaiveDate,
    ) -> Result<NewSpecialPickup, PortError> {
        let request = form.to_request(session, today)?;
        self.backend.pickup_port.submit(&request).await?;
        info!(
            user = %session.user_id,
            date = %request.pickup_prefered_date,
            waste_type = %request.pickup_type,
            "special pickup submitted"
        );
        Ok(request)
    }
}
