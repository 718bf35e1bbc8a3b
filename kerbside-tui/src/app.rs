use std::sync::Arc;

use chrono::{Local, NaiveDate};
use kerbside_core::{
    calendar::{Direction, PickupCalendar, SelectionState},
    form::PickupForm,
    model::{Day, SessionContext, SpecialPickup, WasteType},
    service::KerbsideService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Pickups,
    WasteType,
    Calendar,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetailField {
    Description,
    Weight,
}

pub(crate) struct App {
    pub service: Arc<KerbsideService>,
    pub session: SessionContext,

    pub screen: Screen,
    pub pickups: Vec<SpecialPickup>,
    pub pickup_list_index: usize,

    pub waste_list_index: usize,
    pub calendar: PickupCalendar,
    pub cursor_day: Day,

    pub form: PickupForm,
    pub detail_field: DetailField,

    pub is_loading: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
}

impl App {
    pub(crate) fn new(
        service: Arc<KerbsideService>,
        session: SessionContext,
        calendar: PickupCalendar,
    ) -> Self {
        Self {
            service,
            session,
            screen: Screen::Pickups,
            pickups: Vec::new(),
            pickup_list_index: 0,
            waste_list_index: 0,
            calendar,
            cursor_day: 1,
            form: PickupForm::new(),
            detail_field: DetailField::Description,
            is_loading: false,
            error_message: None,
            info_message: None,
        }
    }

    pub(crate) fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) fn clear_messages(&mut self) {
        self.error_message = None;
        self.info_message = None;
    }

    pub(crate) fn start_new_pickup(&mut self) {
        self.form = PickupForm::new();
        self.calendar.reset_selection();
        self.calendar.select_waste_type(WasteType::Unselected);
        self.waste_list_index = 0;
        self.detail_field = DetailField::Description;
        self.clear_messages();
        self.screen = Screen::WasteType;
    }

    pub(crate) fn select_current_waste_type(&mut self) {
        let Some(waste_type) = WasteType::ALL.get(self.waste_list_index).copied() else {
            return;
        };
        self.form.waste_type = waste_type;
        self.calendar.select_waste_type(waste_type);
        self.cursor_day = self.calendar.eligible_cells().first().copied().unwrap_or(1);
        self.clear_messages();
        if self.calendar.eligible_cells().is_empty() {
            self.info_message = Some(format!(
                "No eligible days for {} in {}",
                waste_type.label(),
                self.calendar.month()
            ));
        }
        self.screen = Screen::Calendar;
    }

    pub(crate) fn move_cursor(&mut self, offset: i64) {
        let days = i64::from(self.calendar.month().days_in_month());
        let target = i64::from(self.cursor_day).saturating_add(offset).clamp(1, days);
        self.cursor_day = Day::try_from(target).unwrap_or(1);
    }

    pub(crate) fn navigate_month(&mut self, direction: Direction) {
        if !self.calendar.navigate(direction) {
            self.error_message = Some("Month navigation is restricted to the current month".into());
        }
    }

    pub(crate) fn pick_cursor_day(&mut self) {
        if let SelectionState::DateProposed(day) = self.calendar.pick(Some(self.cursor_day)) {
            self.error_message = None;
            self.info_message = Some(format!("Day {day} picked, Enter to confirm"));
        }
    }

    pub(crate) fn propose_cursor_day(&mut self) {
        // A day already picked with Space is confirmed even if the cursor moved since
        let picked = matches!(self.calendar.selection(), SelectionState::DateProposed(_));
        let state = if picked {
            self.calendar.confirm(&mut self.form)
        } else {
            self.calendar.propose(Some(self.cursor_day), &mut self.form)
        };
        match state {
            SelectionState::Accepted(update) => {
                self.info_message = Some(format!("Pickup date set to {}", update.pickup_date));
                self.error_message = None;
                self.detail_field = DetailField::Description;
                self.screen = Screen::Details;
            }
            SelectionState::Rejected { day, reason } => {
                self.info_message = None;
                self.error_message = Some(format!("Day {day} rejected: {reason}"));
            }
            SelectionState::NoSelection | SelectionState::DateProposed(_) => {}
        }
    }

    pub(crate) fn active_input(&mut self) -> &mut String {
        match self.detail_field {
            DetailField::Description => &mut self.form.description,
            DetailField::Weight => &mut self.form.weight,
        }
    }

    pub(crate) fn toggle_detail_field(&mut self) {
        self.detail_field = match self.detail_field {
            DetailField::Description => DetailField::Weight,
            DetailField::Weight => DetailField::Description,
        };
    }
}
