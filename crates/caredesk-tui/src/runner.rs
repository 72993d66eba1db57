// TUI event loop and terminal management
use std::io;

use caredesk_core::{LoadOutcome, Record, RecordSource};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use tracing::debug;

use crate::app::{Action, App};

pub async fn run_tui<R, S>(mut app: App<R>, source: &S) -> anyhow::Result<()>
where
    R: Record,
    S: RecordSource<R> + ?Sized,
{
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, source).await;

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B, R, S>(terminal: &mut Terminal<B>, app: &mut App<R>, source: &S) -> anyhow::Result<()>
where
    B: Backend,
    R: Record,
    S: RecordSource<R> + ?Sized,
{
    reload(terminal, app, source).await?;

    loop {
        terminal.draw(|f| crate::ui::render(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match app.handle_key(key) {
                Action::Quit => break,
                Action::Reload => reload(terminal, app, source).await?,
                Action::None => {}
            }
        }
    }

    Ok(())
}

/// Show the loading screen, fetch, then land on the new rows
async fn reload<B, R, S>(terminal: &mut Terminal<B>, app: &mut App<R>, source: &S) -> anyhow::Result<()>
where
    B: Backend,
    R: Record,
    S: RecordSource<R> + ?Sized,
{
    let ticket = app.view.begin_load();
    terminal.draw(|f| crate::ui::render(f, app))?;

    let fetched = source.fetch_all().await;
    let outcome = app.view.complete_load(ticket, fetched);
    debug!("{} load finished: {:?}", R::COLLECTION, outcome);

    if outcome == LoadOutcome::Ready {
        app.clamp_selection();
    }
    Ok(())
}
