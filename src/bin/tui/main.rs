mod app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
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

use app::{AppState, ConnectionStatus, Tab};
use sunnalytics::format::{
    format_bool, format_percent, format_price, format_ratio_percent, format_score, format_usd,
    truncate,
};
use sunnalytics::types::Token;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(35))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url);

    // Initial fetch before rendering
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();

    let result = run_loop(&mut terminal, &mut app, &client, &mut table_state).await;

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
    table_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(5);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, table_state))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.force_refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Tab => {
                            app.tab = app.tab.next();
                            table_state.select(None);
                        }
                        KeyCode::Char(c @ '1'..='3') => {
                            let idx = c as usize - '1' as usize;
                            app.tab = Tab::ALL[idx];
                            table_state.select(None);
                        }
                        KeyCode::Char('p') | KeyCode::Char('P') => {
                            app.cycle_profile();
                            app.refresh(client).await;
                        }
                        KeyCode::Char('w') | KeyCode::Char('W') => {
                            let id = app.selected_token(table_state.selected()).map(|t| t.id.clone());
                            if let Some(id) = id {
                                app.toggle_watch(client, &id).await;
                                let max = app.row_count().saturating_sub(1);
                                table_state.select(table_state.selected().map(|i| i.min(max)));
                            }
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = app.row_count().saturating_sub(1);
                            let next = table_state.selected().map_or(0, |i| (i + 1).min(max));
                            table_state.select(Some(next));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = table_state.selected().map_or(0, |i| i.saturating_sub(1));
                            table_state.select(Some(prev));
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, table_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | tabs | body | notice | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tabs
            Constraint::Min(0),    // body
            Constraint::Length(1), // notice
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);
    match &app.status {
        // an unreachable service replaces content with the message
        ConnectionStatus::Error(e) if app.tokens.is_empty() => render_error(f, e, chunks[2]),
        _ => match app.tab {
            Tab::Tokens => render_tokens_table(f, " TOKENS ", &app.tokens, app, table_state, chunks[2]),
            Tab::Picks => render_picks_table(f, app, table_state, chunks[2]),
            Tab::Watchlist => {
                render_tokens_table(f, " WATCHLIST ", &app.watchlist, app, table_state, chunks[2])
            }
        },
    }
    render_notice(f, app, chunks[3]);
    render_footer(f, chunks[4]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => match app.health.status.as_str() {
            "degraded" => ("◐ degraded".to_string(), Color::Yellow),
            "down" => ("✗ backend down".to_string(), Color::Red),
            _ => ("● connected".to_string(), Color::Green),
        },
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let latency = app
        .latency
        .p50_ms
        .map_or("-".to_string(), |v| format!("{v:.0}ms p50"));
    let loading = if app.health.loading { "  ⟳ loading" } else { "" };

    let title_spans = vec![
        Span::styled(
            " Sunnalytics  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} tokens", app.health.token_count),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(latency, Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(format!("profile: {}", app.profile), Style::default().fg(Color::Magenta)),
        Span::styled(loading, Style::default().fg(Color::Yellow)),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(paragraph, area);
}

fn render_tabs(f: &mut Frame, app: &AppState, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!(" {} {} ", i + 1, t.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    Row::new(cells).height(1)
}

fn titled_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Green at or above `good`, red below `bad`, yellow between.
fn score_color(value: Option<f64>, good: f64, bad: f64) -> Color {
    value.map_or(Color::DarkGray, |v| {
        if v >= good {
            Color::Green
        } else if v < bad {
            Color::Red
        } else {
            Color::Yellow
        }
    })
}

fn render_tokens_table(
    f: &mut Frame,
    title: &'static str,
    tokens: &[Token],
    app: &AppState,
    state: &mut TableState,
    area: Rect,
) {
    let header = header_row(&[
        "", "Symbol", "Name", "Price", "Mkt Cap", "Vol 24h", "Vol/MC", "Liq", "P&D", "Dist", "Healthy",
    ]);

    let rows: Vec<Row> = tokens
        .iter()
        .map(|t| {
            let star = if app.is_watched(&t.id) { "★" } else { " " };
            // inverted: high pump & dump risk is bad
            let risk_color = score_color(t.pump_dump_risk_score.map(|r| 100.0 - r), 70.0, 30.0);
            Row::new(vec![
                Cell::from(star).style(Style::default().fg(Color::Yellow)),
                Cell::from(truncate(&t.symbol, 8)).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(truncate(&t.name, 18)),
                Cell::from(format_price(t.price)),
                Cell::from(format_usd(t.market_cap)),
                Cell::from(format_usd(t.volume24h)),
                Cell::from(format_ratio_percent(t.volume_market_cap_ratio)),
                Cell::from(format_score(t.liquidity_score))
                    .style(Style::default().fg(score_color(t.liquidity_score, 70.0, 30.0))),
                Cell::from(format_score(t.pump_dump_risk_score)).style(Style::default().fg(risk_color)),
                Cell::from(format_score(t.wallet_distribution_score))
                    .style(Style::default().fg(score_color(t.wallet_distribution_score, 70.0, 30.0))),
                Cell::from(format_bool(t.is_volume_healthy)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Length(8),
            Constraint::Min(10),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(titled_block(title))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_picks_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let header = header_row(&["#", "Symbol", "Name", "Exchange", "Score", "Confidence", "Price"]);

    let rows: Vec<Row> = app
        .picks
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&p.token.symbol, 8)).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(truncate(&p.token.name, 18)),
                Cell::from(p.token.exchange.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(format_score(Some(p.total_score)))
                    .style(Style::default().fg(score_color(Some(p.total_score), 75.0, 60.0))),
                Cell::from(format_percent(Some(p.confidence))),
                Cell::from(format_price(p.token.price)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(10),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(11),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(titled_block(" AI PICKS "))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_error(f: &mut Frame, message: &str, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled("press [r] to retry", Style::default().fg(Color::DarkGray))),
    ];
    f.render_widget(Paragraph::new(lines).block(titled_block(" ERROR ")), area);
}

fn render_notice(f: &mut Frame, app: &AppState, area: Rect) {
    let text = app
        .notice
        .as_deref()
        .or(app.health.last_error.as_deref())
        .map(|e| format!(" ! {e}"))
        .unwrap_or_default();
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Red)), area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[tab / 1-3] ", Style::default().fg(Color::Yellow)),
        Span::raw("switch view  "),
        Span::styled("[p] ", Style::default().fg(Color::Yellow)),
        Span::raw("risk profile  "),
        Span::styled("[w] ", Style::default().fg(Color::Yellow)),
        Span::raw("watch  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll"),
    ]);
    f.render_widget(Paragraph::new(line).style(Style::default().fg(Color::White)), area);
}
