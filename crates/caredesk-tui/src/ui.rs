// Rendering for the list view
use caredesk_core::{CategoryFilter, Record, ViewStatus};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, InputMode};

pub fn render<R: Record>(frame: &mut Frame, app: &mut App<R>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Summary cards
            Constraint::Length(3), // Search input
            Constraint::Min(5),    // Table or loading/error screen
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_summary(frame, app, chunks[1]);
    render_search_input(frame, app, chunks[2]);

    match app.view.status() {
        ViewStatus::Loading => render_loading(frame, chunks[3]),
        ViewStatus::Error => render_error(frame, app, chunks[3]),
        ViewStatus::Ready => render_table(frame, app, chunks[3]),
    }

    render_status_bar(frame, app, chunks[4]);
}

fn render_header<R: Record>(frame: &mut Frame, app: &App<R>, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" CareDesk · {}", R::KIND.label()),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(label) = &app.session_label {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(label.clone(), Style::default().fg(Color::DarkGray)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

/// Category cards, highlighting the active one; `Tab` cycles them
fn render_summary<R: Record>(frame: &mut Frame, app: &App<R>, area: Rect) {
    let active = app.view.filter().active_category.key().map(str::to_string);
    let highlight = Style::default().fg(Color::Black).bg(Color::Yellow);

    let line = match app.view.stats() {
        Some(stats) => {
            let mut spans = vec![Span::styled(
                format!(" All {} ", stats.total),
                if active.is_none() { highlight } else { Style::default() },
            )];
            for card in &stats.categories {
                spans.push(Span::raw(" │ "));
                let style = if active.as_deref() == Some(card.key.as_str()) {
                    highlight
                } else {
                    Style::default()
                };
                spans.push(Span::styled(format!(" {} {} ", card.label, card.count), style));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled(" …", Style::default().fg(Color::DarkGray))),
    };

    let summary = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Summary"));
    frame.render_widget(summary, area);
}

fn render_search_input<R: Record>(frame: &mut Frame, app: &App<R>, area: Rect) {
    let input_style = match app.input_mode {
        InputMode::Searching => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default(),
    };
    let term = app.view.filter().search_term.as_str();

    let input = Paragraph::new(term).style(input_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search (/ to type, ESC to finish)")
            .border_style(input_style),
    );
    frame.render_widget(input, area);

    if app.input_mode == InputMode::Searching {
        frame.set_cursor_position((area.x + term.chars().count() as u16 + 1, area.y + 1));
    }
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let loading = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Loading…",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(loading, area);
}

fn render_error<R: Record>(frame: &mut Frame, app: &App<R>, area: Rect) {
    let message = app
        .view
        .error()
        .map(|e| e.to_string())
        .unwrap_or_default();

    let error = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Could not load {}", R::KIND.label().to_lowercase()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled("Press r to retry", Style::default().fg(Color::Yellow))),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Error"));
    frame.render_widget(error, area);
}

fn render_table<R: Record>(frame: &mut Frame, app: &mut App<R>, area: Rect) {
    let columns = &app.view.config().columns;

    let header = Row::new(columns.iter().enumerate().map(|(i, column)| {
        let title = match app.sort_arrow(i) {
            Some(arrow) => format!("[{}] {} {}", i + 1, column.title, arrow),
            None => format!("[{}] {}", i + 1, column.title),
        };
        Cell::from(title)
    }))
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let rows: Vec<Row> = app
        .view
        .rows()
        .into_iter()
        .map(|record| {
            Row::new(
                columns
                    .iter()
                    .map(|column| Cell::from(column.value(record).as_text().into_owned())),
            )
        })
        .collect();
    let shown = rows.len();
    if shown == 0 {
        let empty = Paragraph::new("No records match")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("0 rows"));
        frame.render_widget(empty, area);
        return;
    }

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|_| Constraint::Ratio(1, columns.len().max(1) as u32))
        .collect();

    let title = match (&app.view.filter().active_category, app.view.store()) {
        (CategoryFilter::All, Some(store)) => format!("{} of {}", shown, store.len()),
        (CategoryFilter::Only(key), Some(store)) => {
            let label = app
                .view
                .config()
                .find_category(key)
                .map_or(key.as_str(), |c| c.label);
            format!("{} · {} of {}", label, shown, store.len())
        }
        (_, None) => String::new(),
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status_bar<R: Record>(frame: &mut Frame, app: &App<R>, area: Rect) {
    let status = match app.input_mode {
        InputMode::Searching => Span::styled(
            "SEARCH MODE | type to filter | ENTER/ESC: done",
            Style::default().fg(Color::Yellow),
        ),
        InputMode::Normal => match app.view.status() {
            ViewStatus::Error => Span::styled("r: retry | q: quit", Style::default().fg(Color::Red)),
            ViewStatus::Loading => Span::raw("Loading… | q: quit"),
            ViewStatus::Ready => Span::raw(
                "j/k: navigate | /: search | TAB: category | 1-9: sort by column | 0: clear sort | r: refresh | q: quit",
            ),
        },
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}
