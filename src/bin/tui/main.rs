mod app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Frame, Terminal,
};

use app::{
    format_change, format_kickoff, format_minutes_to_kickoff, format_odds, format_score, truncate,
    Action, AppState, ConnectionStatus, InputMode, Tab,
};
use oddsboard::config::PAGE_WINDOW;
use oddsboard::pagination::page_numbers;
use oddsboard::types::Severity;

const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url =
        std::env::var("DASHBOARD_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url.trim_end_matches('/').to_string());

    // Initial fetch before rendering
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &client).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
) -> io::Result<()> {
    let mut table_state = TableState::default();
    let mut last_tick = std::time::Instant::now();

    loop {
        table_state.select((app.row_count() > 0).then_some(app.selected));
        terminal.draw(|f| render(f, app, &mut table_state))?;

        let timeout = REFRESH_INTERVAL
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key.code) {
                        Action::Quit => return Ok(()),
                        Action::Refresh => {
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        Action::None => {}
                    }
                }
            }
        }

        // No background refresh while the user is typing a search.
        if last_tick.elapsed() >= REFRESH_INTERVAL && app.input == InputMode::Normal {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, table_state: &mut TableState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tabs
            Constraint::Length(1), // filters / search
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);
    render_filter_line(f, app, chunks[2]);
    match app.tab {
        Tab::Events => render_events_table(f, app, table_state, chunks[3]),
        Tab::Movements => render_movements_table(f, app, table_state, chunks[3]),
        Tab::SmartMoney => render_smart_money_table(f, app, table_state, chunks[3]),
    }
    render_footer(f, app, chunks[4]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let mut spans = vec![
        Span::styled(
            " Oddsboard  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
    ];

    if let Some(h) = &app.health {
        spans.extend([
            Span::raw("  │  "),
            Span::styled(format!("{} events", h.events), Style::default().fg(Color::White)),
            Span::raw("  │  "),
            Span::styled(
                format!("{} movements", h.movements),
                Style::default().fg(Color::White),
            ),
            Span::raw("  │  "),
            Span::styled(
                format!("{} smart money", h.smart_money),
                Style::default().fg(Color::White),
            ),
        ]);
        if h.mock_mode {
            spans.push(Span::raw("  │  "));
            spans.push(Span::styled("MOCK DATA", Style::default().fg(Color::Magenta)));
        } else if !h.backend_reachable {
            spans.push(Span::raw("  │  "));
            spans.push(Span::styled("backend unreachable", Style::default().fg(Color::Red)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_tabs(f: &mut Frame, app: &AppState, area: Rect) {
    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(app.tab.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn render_filter_line(f: &mut Frame, app: &AppState, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let value = Style::default().fg(Color::White);

    if let InputMode::Search(draft) = &app.input {
        let line = Line::from(vec![
            Span::styled(" search: ", key),
            Span::styled(format!("{draft}▏"), value.add_modifier(Modifier::BOLD)),
            Span::styled("  (enter apply, esc cancel)", Style::default().fg(Color::DarkGray)),
        ]);
        f.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut spans = Vec::new();
    let mut push = |label: &str, text: String| {
        spans.push(Span::styled(format!(" {label}: "), key));
        spans.push(Span::styled(text, value));
    };

    match app.tab {
        Tab::Events => {
            let ef = &app.event_filters;
            push("time", ef.time_range.to_string());
            push("live", if ef.live_only { "only".to_string() } else { "any".to_string() });
            if !ef.selected_leagues.is_empty() {
                push("leagues", ef.selected_leagues.len().to_string());
            }
            push("search", display_search(&ef.search));
            push("shown", format!("{}/{}", app.events_meta.total, app.events_unfiltered));
        }
        Tab::Movements => {
            let mf = &app.movement_filters;
            push("status", mf.status.to_string());
            push("direction", mf.direction.map_or("all".to_string(), |d| d.to_string()));
            push("min", format!("{:.0}%", mf.min_percentage));
            push("search", display_search(&mf.search));
            push("events", app.movements_meta.total.to_string());
        }
        Tab::SmartMoney => {
            let sf = &app.smart_money_filters;
            push("status", sf.status.to_string());
            push("severity", sf.severity.map_or("all".to_string(), |s| s.to_string()));
            push("min", format!("{:.0}%", sf.min_percentage));
            push("search", display_search(&sf.search));
            push("alerts", app.smart_money.len().to_string());
        }
    }

    if app.has_active_filters() {
        spans.push(Span::styled("  [filtered]", Style::default().fg(Color::Magenta)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn display_search(s: &str) -> String {
    if s.is_empty() {
        "—".to_string()
    } else {
        format!("\"{}\"", truncate(s, 20))
    }
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).height(1)
}

fn table_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn highlight() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

fn change_color(pct: f64) -> Color {
    if pct < 0.0 {
        Color::Green
    } else if pct > 0.0 {
        Color::Red
    } else {
        Color::White
    }
}

fn render_events_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let rows: Vec<Row> = app
        .events
        .iter()
        .map(|e| {
            let odds = e.odds.as_ref().and_then(|o| o.match_odds.as_ref());
            let time_color = if e.is_live { Color::Red } else { Color::DarkGray };
            Row::new(vec![
                Cell::from(format_kickoff(e)).style(Style::default().fg(time_color)),
                Cell::from(format!("{} {}", e.sport.icon, truncate(&e.league.name, 18))),
                Cell::from(truncate(&e.home_team.name, 20)),
                Cell::from(format_score(e)).style(Style::default().fg(Color::Cyan)),
                Cell::from(truncate(&e.away_team.name, 20)),
                Cell::from(format_odds(odds.map(|o| o.home))),
                Cell::from(format_odds(e.draw_price())),
                Cell::from(format_odds(odds.map(|o| o.away))),
            ])
        })
        .collect();

    let title = format!(
        " EVENTS  page {}/{} ",
        app.events_meta.page.max(1),
        app.events_meta.total_pages.max(1)
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(21),
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(header_row(&["Time", "League", "Home", "Score", "Away", "1", "X", "2"]))
    .block(table_block(title))
    .row_highlight_style(highlight());

    f.render_stateful_widget(table, area, state);
}

fn render_movements_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let rows: Vec<Row> = app
        .movements
        .iter()
        .map(|g| {
            // Headline movement: the largest absolute change in the group.
            let top = g.movements.iter().max_by(|a, b| {
                a.change_percentage.abs().total_cmp(&b.change_percentage.abs())
            });
            let (market, odds, change) = top.map_or(
                ("—".to_string(), "—".to_string(), 0.0),
                |m| {
                    (
                        truncate(&format!("{} {}", m.market, m.outcome), 18),
                        format!(
                            "{} → {}",
                            format_odds(Some(m.opening_odds)),
                            format_odds(Some(m.current_odds))
                        ),
                        m.change_percentage,
                    )
                },
            );
            let status = if g.is_live {
                match (g.home_score, g.away_score) {
                    (Some(h), Some(a)) => format!("LIVE {h}-{a}"),
                    _ => "LIVE".to_string(),
                }
            } else {
                truncate(&g.event_time, 10)
            };
            let status_color = if g.is_live { Color::Red } else { Color::DarkGray };

            Row::new(vec![
                Cell::from(status).style(Style::default().fg(status_color)),
                Cell::from(truncate(&g.match_label, 30)),
                Cell::from(truncate(&g.league, 16)),
                Cell::from(g.movement_count.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(market),
                Cell::from(odds),
                Cell::from(format_change(change)).style(Style::default().fg(change_color(change))),
            ])
        })
        .collect();

    let title = format!(
        " ODDS MOVEMENTS  page {}/{} ",
        app.movements_meta.page.max(1),
        app.movements_meta.total_pages.max(1)
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Min(12),
            Constraint::Length(17),
            Constraint::Length(3),
            Constraint::Length(19),
            Constraint::Length(13),
            Constraint::Length(8),
        ],
    )
    .header(header_row(&["Status", "Match", "League", "#", "Market", "Odds", "Change"]))
    .block(table_block(title))
    .row_highlight_style(highlight());

    f.render_stateful_widget(table, area, state);
}

fn render_smart_money_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let rows: Vec<Row> = app
        .smart_money
        .iter()
        .map(|m| {
            let (sev_text, sev_color) = match m.severity {
                Some(Severity::Critical) => ("CRIT", Color::Magenta),
                Some(Severity::High) => ("HIGH", Color::Red),
                Some(Severity::Medium) => ("MED", Color::Yellow),
                Some(Severity::Low) => ("LOW", Color::Green),
                None => ("—", Color::DarkGray),
            };
            let kickoff = if m.is_live {
                "LIVE".to_string()
            } else {
                format_minutes_to_kickoff(m.minutes_to_kickoff)
            };
            Row::new(vec![
                Cell::from(sev_text).style(Style::default().fg(sev_color)),
                Cell::from(truncate(&m.display_match(), 30)),
                Cell::from(truncate(&format!("{} {}", m.market_name, m.outcome), 18)),
                Cell::from(format!(
                    "{} → {}",
                    format_odds(Some(m.previous_odds)),
                    format_odds(Some(m.current_odds))
                )),
                Cell::from(format_change(m.change_percent))
                    .style(Style::default().fg(change_color(m.change_percent))),
                Cell::from(kickoff).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&m.alert_message, 40)).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(12),
            Constraint::Length(19),
            Constraint::Length(13),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Sev", "Match", "Market", "Odds", "Change", "Kickoff", "Alert"]))
    .block(table_block(" SMART MONEY ".to_string()))
    .row_highlight_style(highlight());

    f.render_stateful_widget(table, area, state);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let mut spans = vec![
        Span::styled(" [q] ", key),
        Span::raw("quit  "),
        Span::styled("[r] ", key),
        Span::raw("refresh  "),
        Span::styled("[tab] ", key),
        Span::raw("view  "),
        Span::styled("[/] ", key),
        Span::raw("search  "),
        Span::styled("[l] ", key),
        Span::raw("live  "),
    ];
    match app.tab {
        Tab::Events => {
            spans.extend([Span::styled("[t] ", key), Span::raw("time  ")]);
        }
        Tab::Movements => {
            spans.extend([
                Span::styled("[d] ", key),
                Span::raw("direction  "),
                Span::styled("[+/-] ", key),
                Span::raw("min %  "),
            ]);
        }
        Tab::SmartMoney => {
            spans.extend([
                Span::styled("[s] ", key),
                Span::raw("severity  "),
                Span::styled("[+/-] ", key),
                Span::raw("min %  "),
            ]);
        }
    }
    spans.extend([Span::styled("[x] ", key), Span::raw("reset  ")]);

    if let Some(meta) = app.current_meta() {
        let pages = page_numbers(meta.page, meta.total_pages, PAGE_WINDOW);
        if !pages.is_empty() {
            spans.push(Span::styled("[n/p] ", key));
            for p in pages {
                let style = if p == meta.page {
                    Style::default().fg(Color::Black).bg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!(" {p} "), style));
            }
        }
    }

    spans.push(Span::styled(
        format!("  auto-refresh: {}s", REFRESH_INTERVAL.as_secs()),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
