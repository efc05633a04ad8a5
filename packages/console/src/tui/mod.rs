//! Terminal front end.

pub mod app;
pub mod events;
pub mod ui;

use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::api::ConsoleClient;
use app::App;
use events::{Event, EventHandler};

const TICK_RATE: Duration = Duration::from_millis(100);

type ConsoleTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Takes over the terminal until the user quits.
pub async fn run(client: ConsoleClient) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(client);
    let events = EventHandler::new(TICK_RATE);

    let result = run_app(&mut terminal, &mut app, events).await;

    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<ConsoleTerminal> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut ConsoleTerminal) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut ConsoleTerminal,
    app: &mut App,
    mut events: EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        match events.next().await? {
            Event::Tick => app.on_tick(),
            Event::Key(key) => {
                if app.handle_key(key) {
                    tracing::info!("quit requested");
                    return Ok(());
                }
                app.on_tick();
            }
            Event::Resize(width, height) => {
                tracing::debug!(width, height, "terminal resized");
            }
        }
    }
}
