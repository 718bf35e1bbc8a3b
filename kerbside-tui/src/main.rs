//! Terminal UI for kerbside that lets residents request special waste pickups.

mod app;
mod input;
mod ui;

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kerbside_core::{
    calendar::MonthView,
    model::{SessionContext, UserId},
    ports::PortError,
    service::KerbsideService,
};
use kerbside_provider_rest::{self as rest, RestConfig};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::app::{App, Screen};
use crate::input::Action;

#[derive(Parser, Debug)]
#[command(name = "kerbside")]
#[command(about = "Request special waste pickups on your route's collection days")]
struct Args {
    /// Backend id of the signed-in user
    #[arg(long, env = "KERBSIDE_USER_ID")]
    user_id: String,

    /// Root of the waste-management REST API
    #[arg(long, env = "KERBSIDE_API_URL", default_value = rest::DEFAULT_BASE_URL)]
    api_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file; logging is off without it
    #[arg(long, env = "KERBSIDE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

// Logs must not reach the terminal the UI draws on.
fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new(log_level));
    let builder = fmt().with_env_filter(filter).with_target(false).with_ansi(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::sink).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_file.as_deref())?;

    // HTTP + service setup
    let client = Client::builder().user_agent("kerbside/0.1").build()?;
    let backend = Arc::new(rest::backend(client, RestConfig::new(args.api_url)));
    let service = Arc::new(KerbsideService::new(backend));
    let session = SessionContext::new(UserId(args.user_id));

    // The calendar always shows the current month
    let month = MonthView::current()?;
    info!(user = %session.user_id, %month, "starting");
    let calendar = service.load_calendar(&session, month).await;
    if calendar.schedule().is_none() {
        warn!("no schedule loaded, the calendar has no eligible days");
    }

    // App state
    let mut app = App::new(service, session, calendar);
    load_pickups(&mut app).await;

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::LoadPickups => {
                    app.is_loading = true;
                    app.clear_messages();
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    load_pickups(&mut app).await;
                }
                Action::SubmitPickup => {
                    app.is_loading = true;
                    app.clear_messages();
                    terminal.draw(|frame| ui::draw(frame, &app))?;

                    let res = app
                        .service
                        .submit_pickup(&app.session, &app.form, App::today())
                        .await;

                    app.is_loading = false;
                    match res {
                        Ok(request) => {
                            load_pickups(&mut app).await;
                            app.info_message = Some(format!(
                                "Special pickup requested for {}",
                                request.pickup_prefered_date
                            ));
                            app.calendar.reset_selection();
                            app.screen = Screen::Pickups;
                        }
                        Err(PortError::InvalidForm(errors)) => {
                            let messages =
                                errors.iter().map(ToString::to_string).collect::<Vec<_>>();
                            app.error_message = Some(format!(
                                "Please fix the form: {}",
                                messages.join(", ")
                            ));
                        }
                        Err(err) => {
                            warn!(error = %err, "pickup submission failed");
                            app.error_message = Some(format!("Submission failed: {err}"));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

async fn load_pickups(app: &mut App) {
    app.is_loading = true;
    let res = app.service.pickups().await;
    app.is_loading = false;

    match res {
        Ok(pickups) => {
            app.pickups = pickups;
            app.pickup_list_index = 0;
        }
        Err(err) => {
            warn!(error = %err, "failed to fetch pickups");
            app.pickups.clear();
            app.error_message = Some(format!("Failed to fetch pickups: {err}"));
        }
    }
}
