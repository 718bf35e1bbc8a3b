use chrono::Datelike;
use kerbside_core::{
    calendar::{DayMarkers, SelectionState},
    form::FormField,
    model::{Day, PickupStatus, SpecialPickup, WasteType},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};

use crate::app::{App, DetailField, Screen};

const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new(format!(
        "kerbside – special pickups · user {} · {}",
        app.session.user_id,
        app.calendar.month()
    ))
    .block(Block::default().borders(Borders::ALL).title("Kerbside"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::Pickups => draw_pickups(frame, app, *content_area),
        Screen::WasteType => draw_waste_types(frame, app, *content_area),
        Screen::Calendar => draw_calendar(frame, app, *content_area),
        Screen::Details => draw_details(frame, app, *content_area),
    }

    let nav_hint = match app.screen {
        Screen::Pickups => "↑/↓ move · n/Enter new pickup · r reload · q/Ctrl-C quit",
        Screen::WasteType => "↑/↓ move · Enter/Space choose waste type · Esc back · q/Ctrl-C quit",
        Screen::Calendar => {
            "←/→/↑/↓ move · Space pick · Enter confirm · [/] month · Esc back · q/Ctrl-C quit"
        }
        Screen::Details => "Type to edit · Tab switch field · Enter submit · Esc back · Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else if let Some(msg) = app.error_message.as_ref().or(app.info_message.as_ref()) {
        format!("{msg} · {nav_hint}")
    } else {
        nav_hint.to_owned()
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else if app.info_message.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_pickups(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = "Special pickups (n for a new request)";

    if app.pickups.is_empty() {
        let paragraph = Paragraph::new("No special pickups yet. Press n to request one.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.pickups.iter().map(|pickup| {
        Row::new(vec![
            Cell::from(pickup_date_label(pickup)),
            Cell::from(pickup.pickup_type.clone()),
            Cell::from(pickup.pickup_status.to_string()),
            Cell::from(
                pickup
                    .pickup_weight
                    .as_deref()
                    .filter(|weight| !weight.is_empty())
                    .map_or_else(|| "–".to_owned(), |weight| format!("{weight} kg")),
            ),
            Cell::from(pickup.pickup_description.clone().unwrap_or_default()),
        ])
        .style(Style::default().fg(status_color(&pickup.pickup_status)))
    });

    let column_widths = [
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Date", "Type", "Status", "Weight", "Description"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default().with_selected(Some(app.pickup_list_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn draw_waste_types(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = WasteType::ALL
        .iter()
        .enumerate()
        .map(|(idx, waste_type)| {
            let prefix = if idx == app.waste_list_index {
                "> "
            } else {
                "  "
            };
            ListItem::new(format!("{prefix}{}", waste_type.label()))
                .style(Style::default().fg(waste_color(*waste_type)))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("What should be picked up? (↑/↓, Enter)"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    let mut state = ListState::default();
    state.select(Some(app.waste_list_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_calendar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(20)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [grid_area, info_area] = chunks else {
        return;
    };

    let today = App::today();
    let today_day = app.calendar.month().contains(today).then(|| today.day());

    let rows = app.calendar.cells().chunks(WEEKDAYS.len()).map(|week| {
        let mut cells = week
            .iter()
            .map(|cell| match cell {
                Some(day) => day_cell(app, *day, today_day == Some(*day)),
                None => Cell::from(""),
            })
            .collect::<Vec<Cell<'_>>>();
        // Pad the last week to a full row
        cells.resize_with(WEEKDAYS.len(), || Cell::from(""));
        Row::new(cells)
    });

    let grid = Table::new(rows, [Constraint::Length(4); 7])
        .header(Row::new(WEEKDAYS.to_vec()).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(app.calendar.month().to_string()),
        );
    frame.render_widget(grid, *grid_area);

    let waste_type = app.calendar.waste_type();
    let eligible = app.calendar.eligible_cells();
    let eligible_text = if eligible.is_empty() {
        "No eligible days this month".to_owned()
    } else {
        eligible
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let selection_line = match app.calendar.selection() {
        SelectionState::Accepted(update) => Line::styled(
            format!("Selected {}", update.pickup_date),
            Style::default().fg(Color::Green),
        ),
        SelectionState::Rejected { day, reason } => Line::styled(
            format!("Day {day} rejected: {reason}"),
            Style::default().fg(Color::Red),
        ),
        SelectionState::DateProposed(day) => Line::styled(
            format!("Day {day} picked, Enter to confirm"),
            Style::default().fg(Color::Yellow),
        ),
        SelectionState::NoSelection => Line::from("Pick a highlighted day"),
    };

    let lines = vec![
        Line::from(format!("Waste type: {}", waste_type.label())),
        Line::from(format!("Eligible days: {eligible_text}")),
        Line::from(""),
        selection_line,
        Line::from(""),
        Line::styled("■ metal", Style::default().fg(waste_color(WasteType::Metal))),
        Line::styled(
            "■ electrical",
            Style::default().fg(waste_color(WasteType::Electrical)),
        ),
        Line::styled(
            "■ paper / cardboard",
            Style::default().fg(waste_color(WasteType::Paper)),
        ),
    ];

    let info = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Pickup day"))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, *info_area);
}

fn draw_details(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let field_style = |field: DetailField| {
        if app.detail_field == field {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };

    let mut lines = vec![
        Line::from(format!("Waste type:  {}", app.form.waste_type.label())),
        Line::from(format!("Pickup date: {}", app.form.pickup_date)),
        Line::styled(
            format!("Description: {}", app.form.description),
            field_style(DetailField::Description),
        ),
        Line::styled(
            format!("Weight (kg): {}", app.form.weight),
            field_style(DetailField::Weight),
        ),
        Line::from(""),
    ];

    match app.form.validate(App::today()) {
        Ok(()) => lines.push(Line::styled(
            "Ready to submit (Enter)",
            Style::default().fg(Color::Green),
        )),
        Err(errors) => lines.extend(errors.iter().map(|err| {
            let prefix = if err.field() == FormField::PickupDate {
                "! "
            } else {
                "· "
            };
            Line::styled(format!("{prefix}{err}"), Style::default().fg(Color::Red))
        })),
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Pickup details (Tab to switch field)"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn day_cell(app: &App, day: Day, is_today: bool) -> Cell<'static> {
    let mut style = if app.calendar.is_eligible(day) {
        Style::default()
            .fg(day_color(app.calendar.waste_type(), app.calendar.markers(day)))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    if is_today {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if day == app.cursor_day {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Cell::from(format!("{day:>2}")).style(style)
}

fn day_color(waste_type: WasteType, markers: DayMarkers) -> Color {
    match waste_type {
        WasteType::Unselected if markers.metal => waste_color(WasteType::Metal),
        WasteType::Unselected if markers.electrical => waste_color(WasteType::Electrical),
        WasteType::Unselected if markers.paper => waste_color(WasteType::Paper),
        other => waste_color(other),
    }
}

fn waste_color(waste_type: WasteType) -> Color {
    match waste_type {
        WasteType::Metal => Color::LightBlue,
        WasteType::Electrical => Color::Yellow,
        WasteType::Paper | WasteType::Cardboard => Color::Cyan,
        WasteType::Others => Color::Magenta,
        WasteType::Unselected => Color::White,
    }
}

fn status_color(status: &PickupStatus) -> Color {
    match status {
        PickupStatus::Pending => Color::Red,
        PickupStatus::InProgress => Color::Yellow,
        PickupStatus::Completed => Color::Green,
        PickupStatus::Other(_) => Color::Gray,
    }
}

fn pickup_date_label(pickup: &SpecialPickup) -> String {
    // Timestamps come back as `YYYY-MM-DDTHH:MM:SS`; the date part is enough
    pickup
        .pickup_prefered_date
        .as_deref()
        .and_then(|date| date.split('T').next())
        .unwrap_or("–")
        .to_owned()
}
