#[cfg(test)]
mod service_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use kerbside_core::{
        Backend, DateList, KerbsideService, MonthView, NewSpecialPickup, PickupForm, PickupPort,
        PortError, Profile, ProfilePort, RouteId, ScheduleRecord, SchedulePort, SelectionState,
        SessionContext, SpecialPickup, UserId, WasteType,
    };

    // Linked into every test target; only the library itself needs them.
    use reqwest as _;
    use serde as _;
    use serde_json as _;
    use thiserror as _;
    use tracing as _;

    // ------------------------------------------------------------------------
    // In-memory backend
    // ------------------------------------------------------------------------

    struct FakeProfiles(HashMap<String, Option<RouteId>>);

    #[async_trait]
    impl ProfilePort for FakeProfiles {
        async fn profile(&self, user_id: &UserId) -> Result<Profile, PortError> {
            self.0
                .get(&user_id.0)
                .cloned()
                .map(|route_id| Profile { route_id })
                .ok_or_else(|| PortError::Internal(format!("no profile for {user_id}")))
        }
    }

    struct FakeSchedules(HashMap<RouteId, ScheduleRecord>);

    #[async_trait]
    impl SchedulePort for FakeSchedules {
        async fn schedule(&self, route_id: &RouteId) -> Result<ScheduleRecord, PortError> {
            self.0
                .get(route_id)
                .cloned()
                .ok_or_else(|| PortError::Internal(format!("no schedule for route {route_id}")))
        }
    }

    #[derive(Default)]
    struct FakePickups {
        submitted: Mutex<Vec<NewSpecialPickup>>,
    }

    #[async_trait]
    impl PickupPort for FakePickups {
        async fn list(&self) -> Result<Vec<SpecialPickup>, PortError> {
            Ok(Vec::new())
        }

        async fn submit(&self, request: &NewSpecialPickup) -> Result<(), PortError> {
            self.submitted
                .lock()
                .expect("lock")
                .push(request.clone());
            Ok(())
        }
    }

    fn schedule() -> ScheduleRecord {
        ScheduleRecord {
            metal_waste_dates: DateList::parse("5,12,19"),
            electrical_waste_dates: DateList::parse("3,10"),
            paper_waste_dates: DateList::parse("1,8,15,22,29"),
        }
    }

    fn setup(paper: &str) -> (KerbsideService, Arc<FakePickups>) {
        let route = RouteId("7".to_owned());
        let profiles = FakeProfiles(HashMap::from([
            ("1".to_owned(), Some(route.clone())),
            ("2".to_owned(), None),
        ]));
        let schedules = FakeSchedules(HashMap::from([(
            route,
            ScheduleRecord {
                paper_waste_dates: DateList::parse(paper),
                ..schedule()
            },
        )]));
        let pickups = Arc::new(FakePickups::default());
        let backend = Backend::new(Arc::new(profiles), Arc::new(schedules), Arc::<FakePickups>::clone(&pickups));
        (KerbsideService::new(Arc::new(backend)), pickups)
    }

    fn session(user: &str) -> SessionContext {
        SessionContext::new(UserId(user.to_owned()))
    }

    fn june_2024() -> MonthView {
        MonthView::from_zero_based(2024, 5).expect("valid month")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    // ------------------------------------------------------------------------
    // Scenarios
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn metal_pickup_is_accepted_and_submitted() {
        let (service, pickups) = setup("1,8,15,22,29");
        let mut calendar = service.load_calendar(&session("1"), june_2024()).await;
        let mut form = PickupForm::new();

        calendar.select_waste_type(WasteType::Metal);
        assert_eq!(calendar.eligible_cells(), &[5, 12, 19], "metal days");

        assert!(
            matches!(calendar.propose(Some(6), &mut form), SelectionState::Rejected { day: 6, .. }),
            "day six is not a metal day"
        );
        assert!(
            matches!(calendar.propose(Some(5), &mut form), SelectionState::Accepted(update) if update.pickup_date == "2024-06-05"),
            "day five is"
        );

        form.description = "Washing machine drum".to_owned();
        let request = service
            .submit_pickup(&session("1"), &form, today())
            .await
            .expect("submitted");
        assert_eq!(request.pickup_type, WasteType::Metal, "type from calendar");

        let submitted = pickups.submitted.lock().expect("lock");
        assert_eq!(submitted.as_slice(), &[request], "one request reached the backend");
    }

    #[tokio::test]
    async fn unselected_type_offers_union_of_schedules() {
        let (service, _) = setup("1,8,15,22,29");
        let calendar = service.load_calendar(&session("1"), june_2024()).await;
        assert_eq!(
            calendar.eligible_cells(),
            &[1, 3, 5, 8, 10, 12, 15, 19, 22, 29],
            "union"
        );
    }

    #[tokio::test]
    async fn empty_paper_schedule_rejects_every_day() {
        let (service, _) = setup("");
        let mut calendar = service.load_calendar(&session("1"), june_2024()).await;
        let mut form = PickupForm::new();
        calendar.select_waste_type(WasteType::Paper);

        assert!(calendar.eligible_cells().is_empty(), "no paper days");
        assert!(
            matches!(calendar.propose(Some(8), &mut form), SelectionState::Rejected { .. }),
            "former paper day"
        );
    }

    #[tokio::test]
    async fn missing_route_leaves_calendar_empty() {
        let (service, _) = setup("1,8");
        assert!(
            matches!(service.schedule_for(&session("2")).await, Err(PortError::NoRouteAssigned)),
            "no route"
        );

        let calendar = service.load_calendar(&session("2"), june_2024()).await;
        assert!(calendar.schedule().is_none(), "schedule unset");
        assert!(calendar.eligible_cells().is_empty(), "nothing eligible");
        assert_eq!(calendar.cells().len(), 36, "grid still generated");
    }

    #[tokio::test]
    async fn failed_profile_fetch_leaves_calendar_empty() {
        let (service, _) = setup("1,8");
        let calendar = service.load_calendar(&session("99"), june_2024()).await;
        assert!(calendar.eligible_days().is_empty(), "nothing eligible");
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_backend() {
        let (service, pickups) = setup("1,8");
        let result = service
            .submit_pickup(&session("1"), &PickupForm::new(), today())
            .await;
        assert!(matches!(result, Err(PortError::InvalidForm(_))), "validation first");
        assert!(pickups.submitted.lock().expect("lock").is_empty(), "nothing sent");
    }
}
