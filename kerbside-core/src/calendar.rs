//! Pickup eligibility calendar for the displayed month.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Local, Month, NaiveDate};
use tracing::{debug, warn};

use crate::form::PickupForm;
use crate::model::{Day, ScheduleRecord, WasteType};
use crate::ports::PortError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A month of the proleptic Gregorian calendar that can be laid out as a grid.
pub struct MonthView {
    first: NaiveDate,
    days_in_month: u32,
}

impl MonthView {
    /// Month view for the given year and month.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidMonth`] for years before 1 or beyond what chrono represents.
    pub fn new(year: i32, month: Month) -> Result<Self, PortError> {
        let invalid = || PortError::InvalidMonth {
            year,
            month0: month.number_from_month().saturating_sub(1),
        };
        if year < 1 {
            return Err(invalid());
        }

        let first = NaiveDate::from_ymd_opt(year, month.number_from_month(), 1).ok_or_else(invalid)?;

        // Last day of the month is the day before the first of the following one.
        let (next_year, next_month) = match month {
            Month::December => (year.checked_add(1), Month::January),
            other => (Some(year), other.succ()),
        };
        let last = next_year
            .and_then(|following| NaiveDate::from_ymd_opt(following, next_month.number_from_month(), 1))
            .and_then(|next_first| next_first.pred_opt())
            .ok_or_else(invalid)?;

        Ok(Self {
            first,
            days_in_month: last.day(),
        })
    }

    /// Month view for a zero-based month index (`0` is January).
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidMonth`] when `month0` is above 11 or the year is out of range.
    pub fn from_zero_based(year: i32, month0: u32) -> Result<Self, PortError> {
        let month = u8::try_from(month0)
            .ok()
            .and_then(|zero_based| zero_based.checked_add(1))
            .and_then(|number| Month::try_from(number).ok())
            .ok_or(PortError::InvalidMonth { year, month0 })?;
        Self::new(year, month)
    }

    /// The current real-world month in local time.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidMonth`] only if the system clock is outside chrono's range.
    pub fn current() -> Result<Self, PortError> {
        let today = Local::now().date_naive();
        Self::from_zero_based(today.year(), today.month0())
    }

    /// Calendar year.
    #[must_use]
    pub fn year(self) -> i32 {
        self.first.year()
    }

    /// One-based month number.
    #[must_use]
    pub fn month(self) -> u32 {
        self.first.month()
    }

    /// Zero-based month number.
    #[must_use]
    pub fn month0(self) -> u32 {
        self.first.month0()
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days_in_month(self) -> u32 {
        self.days_in_month
    }

    /// Blank cells before day 1 so that it sits under its weekday (Sunday first).
    #[must_use]
    pub fn leading_blanks(self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    /// The date of `day` in this month, `None` if the month has no such day.
    #[must_use]
    pub fn date(self, day: Day) -> Option<NaiveDate> {
        self.first.with_day(day)
    }

    /// Whether the view shows the month containing `date`.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

impl fmt::Display for MonthView {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.first.format("%B %Y"))
    }
}

/// Lay out the days of a month: leading blanks for weekday alignment, then `1..=days`.
///
/// Trailing padding to a full week row is left to the renderer.
#[must_use]
pub fn generate(month: MonthView) -> Vec<Option<Day>> {
    (0..month.leading_blanks())
        .map(|_| None)
        .chain((1..=month.days_in_month()).map(Some))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Days of the displayed month on which a pickup may be requested.
pub struct EligibleDays(BTreeSet<Day>);

impl EligibleDays {
    /// Whether `day` is eligible.
    #[must_use]
    pub fn contains(&self, day: Day) -> bool {
        self.0.contains(&day)
    }

    /// Whether no day is eligible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of eligible days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Eligible days in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Day> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Day> for EligibleDays {
    fn from_iter<I: IntoIterator<Item = Day>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolve the days on which `waste_type` can be picked up.
///
/// Cardboard shares the paper schedule, `Others` has no schedule and resolves
/// to nothing, and an unselected type resolves to the union of all schedules.
/// A missing schedule resolves to nothing.
#[must_use]
pub fn resolve(schedule: Option<&ScheduleRecord>, waste_type: WasteType) -> EligibleDays {
    let Some(schedule) = schedule else {
        return EligibleDays::default();
    };

    let lists = match waste_type {
        WasteType::Metal => vec![&schedule.metal_waste_dates],
        WasteType::Electrical => vec![&schedule.electrical_waste_dates],
        WasteType::Paper | WasteType::Cardboard => vec![&schedule.paper_waste_dates],
        WasteType::Others => Vec::new(),
        WasteType::Unselected => vec![
            &schedule.metal_waste_dates,
            &schedule.electrical_waste_dates,
            &schedule.paper_waste_dates,
        ],
    };

    lists
        .into_iter()
        .flat_map(|list| list.days().iter().copied())
        .collect()
}

/// Keep the non-blank cells whose day is eligible, in calendar order.
#[must_use]
pub fn filter(cells: &[Option<Day>], eligible: &EligibleDays) -> Vec<Day> {
    cells
        .iter()
        .flatten()
        .copied()
        .filter(|day| eligible.contains(*day))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Which schedules a day belongs to.
pub struct DayMarkers {
    /// Metal is collected on the day.
    pub metal: bool,
    /// Electrical waste is collected on the day.
    pub electrical: bool,
    /// Paper and cardboard are collected on the day.
    pub paper: bool,
}

impl DayMarkers {
    /// Markers of `day` in `schedule`; all unset without a schedule.
    #[must_use]
    pub fn for_day(schedule: Option<&ScheduleRecord>, day: Day) -> Self {
        schedule.map_or_else(Self::default, |schedule| Self {
            metal: schedule.metal_waste_dates.contains(day),
            electrical: schedule.electrical_waste_dates.contains(day),
            paper: schedule.paper_waste_dates.contains(day),
        })
    }

    /// Whether any waste type is collected on the day.
    #[must_use]
    pub fn any(self) -> bool {
        self.metal || self.electrical || self.paper
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Date and waste type handed to the pickup form after a day is accepted.
pub struct PickupDateUpdate {
    /// `YYYY-MM-DD` in the displayed month.
    pub pickup_date: String,
    /// Waste type active when the day was accepted.
    pub waste_type: WasteType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Why a proposed day was not accepted.
pub enum RejectReason {
    /// The day is not in the schedule of the active waste type.
    NotScheduled(WasteType),
    /// The displayed month has no such day.
    NotInMonth,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotScheduled(WasteType::Unselected) => {
                formatter.write_str("no pickup is scheduled on this day")
            }
            Self::NotScheduled(waste_type) => write!(
                formatter,
                "this day is not available for {} waste",
                waste_type.label().to_lowercase()
            ),
            Self::NotInMonth => formatter.write_str("the displayed month has no such day"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Progress of a day selection.
pub enum SelectionState {
    /// Nothing picked.
    #[default]
    NoSelection,
    /// A day was picked and awaits [`PickupCalendar::confirm`].
    DateProposed(Day),
    /// The day was accepted and handed to the form.
    Accepted(PickupDateUpdate),
    /// The day was refused; the user can pick another one.
    Rejected {
        /// The refused day.
        day: Day,
        /// Why it was refused.
        reason: RejectReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Direction of month navigation.
pub enum Direction {
    /// The month before.
    Previous,
    /// The month after.
    Next,
}

/// Calendar of the displayed month with eligibility for the selected waste type.
///
/// The month is fixed for the lifetime of the calendar; navigation is refused.
#[derive(Debug, Clone)]
pub struct PickupCalendar {
    month: MonthView,
    cells: Vec<Option<Day>>,
    schedule: Option<ScheduleRecord>,
    waste_type: WasteType,
    eligible: EligibleDays,
    eligible_cells: Vec<Day>,
    selection: SelectionState,
}

impl PickupCalendar {
    /// Calendar for `month` with no schedule loaded yet.
    #[must_use]
    pub fn new(month: MonthView) -> Self {
        Self {
            month,
            cells: generate(month),
            schedule: None,
            waste_type: WasteType::Unselected,
            eligible: EligibleDays::default(),
            eligible_cells: Vec::new(),
            selection: SelectionState::NoSelection,
        }
    }

    /// Calendar for the current real-world month.
    ///
    /// # Errors
    ///
    /// See [`MonthView::current`].
    pub fn for_current_month() -> Result<Self, PortError> {
        MonthView::current().map(Self::new)
    }

    /// Take the outcome of a schedule fetch.
    ///
    /// A failed fetch is logged and leaves the calendar without a schedule,
    /// so nothing is eligible.
    pub fn apply_schedule(&mut self, fetched: Result<ScheduleRecord, PortError>) {
        match fetched {
            Ok(schedule) => self.set_schedule(Some(schedule)),
            Err(err) => {
                warn!(error = %err, "schedule unavailable, no days are eligible");
                self.set_schedule(None);
            }
        }
    }

    /// Replace the schedule. Any earlier selection is dropped.
    pub fn set_schedule(&mut self, schedule: Option<ScheduleRecord>) {
        self.schedule = schedule;
        self.refresh();
    }

    /// Switch the active waste type and recompute eligibility.
    /// Any earlier selection is dropped.
    pub fn select_waste_type(&mut self, waste_type: WasteType) {
        self.waste_type = waste_type;
        self.refresh();
    }

    /// Displayed month.
    #[must_use]
    pub fn month(&self) -> MonthView {
        self.month
    }

    /// All cells, leading blanks included.
    #[must_use]
    pub fn cells(&self) -> &[Option<Day>] {
        &self.cells
    }

    /// Loaded schedule, if any.
    #[must_use]
    pub fn schedule(&self) -> Option<&ScheduleRecord> {
        self.schedule.as_ref()
    }

    /// Active waste type.
    #[must_use]
    pub fn waste_type(&self) -> WasteType {
        self.waste_type
    }

    /// Eligible days for the active waste type.
    #[must_use]
    pub fn eligible_days(&self) -> &EligibleDays {
        &self.eligible
    }

    /// Days of the month that can be selected, in calendar order.
    #[must_use]
    pub fn eligible_cells(&self) -> &[Day] {
        &self.eligible_cells
    }

    /// Whether `day` can be selected.
    #[must_use]
    pub fn is_eligible(&self, day: Day) -> bool {
        self.eligible_cells.contains(&day)
    }

    /// Schedule markers for `day`.
    #[must_use]
    pub fn markers(&self, day: Day) -> DayMarkers {
        DayMarkers::for_day(self.schedule.as_ref(), day)
    }

    /// Current selection state.
    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Whether navigating in `direction` is possible. It never is.
    #[must_use]
    pub fn can_navigate(&self, _direction: Direction) -> bool {
        false
    }

    /// Try to show another month. Always refused.
    pub fn navigate(&mut self, direction: Direction) -> bool {
        warn!(?direction, month = %self.month, "month navigation is restricted to the current month");
        false
    }

    /// Pick a cell without checking it yet.
    ///
    /// A blank cell leaves the state at [`SelectionState::NoSelection`].
    pub fn pick(&mut self, cell: Option<Day>) -> &SelectionState {
        self.selection = match cell {
            Some(day) => {
                debug!(day, waste_type = %self.waste_type, "day proposed");
                SelectionState::DateProposed(day)
            }
            None => SelectionState::NoSelection,
        };
        &self.selection
    }

    /// Check the picked day and, when accepted, hand date and waste type to `form`.
    ///
    /// Does nothing unless a day is in [`SelectionState::DateProposed`]. A
    /// rejected day leaves the form, the schedule and the eligible cells untouched.
    pub fn confirm(&mut self, form: &mut PickupForm) -> &SelectionState {
        let SelectionState::DateProposed(day) = self.selection else {
            return &self.selection;
        };

        self.selection = match self.month.date(day) {
            None => self.reject(day, RejectReason::NotInMonth),
            Some(_) if !self.eligible.contains(day) => {
                self.reject(day, RejectReason::NotScheduled(self.waste_type))
            }
            Some(date) => {
                let update = PickupDateUpdate {
                    pickup_date: date.format(DATE_FORMAT).to_string(),
                    waste_type: self.waste_type,
                };
                debug!(date = %update.pickup_date, "day accepted");
                form.apply_date(&update);
                SelectionState::Accepted(update)
            }
        };

        &self.selection
    }

    /// [`pick`](Self::pick) a cell and [`confirm`](Self::confirm) it in one step.
    pub fn propose(&mut self, cell: Option<Day>, form: &mut PickupForm) -> &SelectionState {
        self.pick(cell);
        self.confirm(form)
    }

    /// Forget the last selection.
    pub fn reset_selection(&mut self) {
        self.selection = SelectionState::NoSelection;
    }

    fn reject(&self, day: Day, reason: RejectReason) -> SelectionState {
        warn!(day, waste_type = %self.waste_type, %reason, "selected date is not available");
        SelectionState::Rejected { day, reason }
    }

    fn refresh(&mut self) {
        self.selection = SelectionState::NoSelection;
        self.eligible = resolve(self.schedule.as_ref(), self.waste_type);
        self.eligible_cells = filter(&self.cells, &self.eligible);
    }
}
