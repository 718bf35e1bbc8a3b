use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kerbside_core::{calendar::Direction, model::WasteType};

use crate::app::{App, Screen};

const DAYS_IN_WEEK: i64 = 7;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `service.pickups`()
    LoadPickups,
    /// Run `service.submit_pickup`(...) with the current form
    SubmitPickup,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, Char, Down, Enter, Esc, Left, Right, Tab, Up};

    // Global quit shortcuts; plain `q` is text while editing details
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() && app.screen != Screen::Details {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::Pickups => match key.code {
            Up | Char('k') => {
                app.pickup_list_index = app.pickup_list_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.pickup_list_index + 1 < app.pickups.len() {
                    app.pickup_list_index += 1;
                }
            }
            Char('n') | Enter => {
                app.start_new_pickup();
            }
            Char('r') => {
                action = Action::LoadPickups;
            }
            _ => {}
        },

        Screen::WasteType => match key.code {
            Up | Char('k') => {
                app.waste_list_index = app.waste_list_index.saturating_sub(1);
            }
            Down | Char('j') => {
                if app.waste_list_index + 1 < WasteType::ALL.len() {
                    app.waste_list_index += 1;
                }
            }
            Enter | Char(' ') => {
                app.select_current_waste_type();
            }
            Left | Esc => {
                app.clear_messages();
                app.screen = Screen::Pickups;
            }
            _ => {}
        },

        Screen::Calendar => match key.code {
            Left | Char('h') => app.move_cursor(-1),
            Right | Char('l') => app.move_cursor(1),
            Up | Char('k') => app.move_cursor(-DAYS_IN_WEEK),
            Down | Char('j') => app.move_cursor(DAYS_IN_WEEK),
            Char(' ') => app.pick_cursor_day(),
            Enter => app.propose_cursor_day(),
            Char('<' | '[') => app.navigate_month(Direction::Previous),
            Char('>' | ']') => app.navigate_month(Direction::Next),
            Esc => {
                app.calendar.reset_selection();
                app.clear_messages();
                app.screen = Screen::WasteType;
            }
            _ => {}
        },

        Screen::Details => match key.code {
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    app.active_input().push(character);
                }
            }
            Backspace => {
                app.active_input().pop();
            }
            Tab | Up | Down => {
                app.toggle_detail_field();
            }
            Enter => {
                action = Action::SubmitPickup;
            }
            Esc => {
                app.clear_messages();
                app.screen = Screen::Calendar;
            }
            _ => {}
        },
    }
    action
}
