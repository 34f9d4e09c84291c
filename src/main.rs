use std::fs::OpenOptions;
use std::io;
use std::sync::{Mutex, mpsc};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};
use tracing_subscriber::EnvFilter;

use betai_terminal::config::{BackendConfig, FeedSource};
use betai_terminal::filterizer::{OddCategory, THRESHOLDS};
use betai_terminal::http_client::http_client_with_timeout;
use betai_terminal::state::{
    AnalysisView, AppState, Delta, FilterRow, Fixture, FixtureRegion, Pane, ProviderCommand,
    TicketField, UtilityTab, ViewMode, apply_delta, pane_label,
};
use betai_terminal::stats::{StatCard, analysis_cards};
use betai_terminal::ticket::format_odd;
use betai_terminal::{fake_feed, feed};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn dispatch(&mut self, cmds: Vec<ProviderCommand>) {
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        for cmd in cmds {
            if tx.send(cmd).is_err() {
                self.state
                    .push_log("[WARN] Provider offline; request dropped".to_string());
                return;
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_alert();
            }
            return;
        }

        if self.state.search_active {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.state.end_search(),
                KeyCode::Backspace => self.state.pop_search_char(),
                KeyCode::Char(ch) => self.state.push_search_char(ch),
                _ => {}
            }
            return;
        }

        if self.state.focus == Pane::Utility && self.state.utility_tab == UtilityTab::Ticket {
            match key.code {
                KeyCode::Char(ch) if ch.is_ascii_digit() || ch == '.' => {
                    self.state.ticket_input(ch);
                    return;
                }
                KeyCode::Backspace => {
                    self.state.ticket_backspace();
                    return;
                }
                _ => {}
            }
        }

        let cmds = match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            KeyCode::Char('?') => {
                self.state.help_overlay = !self.state.help_overlay;
                Vec::new()
            }
            KeyCode::Tab => {
                self.state.cycle_focus(true);
                Vec::new()
            }
            KeyCode::BackTab => {
                self.state.cycle_focus(false);
                Vec::new()
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.select_next();
                Vec::new()
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.select_prev();
                Vec::new()
            }
            KeyCode::Left | KeyCode::Char('h')
                if self.state.focus == Pane::Utility
                    && self.state.utility_tab == UtilityTab::Filterizer =>
            {
                self.state.shift_filterizer_threshold(-1);
                Vec::new()
            }
            KeyCode::Right | KeyCode::Char('l')
                if self.state.focus == Pane::Utility
                    && self.state.utility_tab == UtilityTab::Filterizer =>
            {
                self.state.shift_filterizer_threshold(1);
                Vec::new()
            }
            KeyCode::Enter => self.state.activate(),
            KeyCode::Char('/') => {
                self.state.start_search();
                Vec::new()
            }
            KeyCode::Char('a') => {
                self.state.set_utility_tab(UtilityTab::Analysis);
                Vec::new()
            }
            KeyCode::Char('t') => {
                self.state.set_utility_tab(UtilityTab::Ticket);
                Vec::new()
            }
            KeyCode::Char('f') => {
                self.state.set_utility_tab(UtilityTab::Filterizer);
                Vec::new()
            }
            KeyCode::Char('x') => match self.state.utility_tab {
                UtilityTab::Ticket => self.state.clear_ticket(),
                UtilityTab::Filterizer => self.state.clear_filterizer(),
                UtilityTab::Analysis => Vec::new(),
            },
            KeyCode::Char('p') => self.state.cycle_sport(),
            KeyCode::Char('[') => self.state.shift_date(-1),
            KeyCode::Char(']') => self.state.shift_date(1),
            KeyCode::Esc => {
                if self.state.help_overlay {
                    self.state.help_overlay = false;
                } else {
                    self.state.clear_fixture();
                }
                Vec::new()
            }
            _ => Vec::new(),
        };
        self.dispatch(cmds);
    }
}

fn init_tracing() {
    let Ok(path) = std::env::var("BETAI_LOG_FILE") else {
        return;
    };
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let cfg = BackendConfig::from_env();
    if let Err(err) = http_client_with_timeout(cfg.request_timeout_secs) {
        tracing::warn!(error = %err, "http client unavailable");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    match cfg.source {
        FeedSource::Demo => fake_feed::spawn_fake_provider(tx, cmd_rx),
        FeedSource::Live => feed::spawn_provider(cfg, tx, cmd_rx),
    }

    let mut app = App::new(Some(cmd_tx));
    let boot = app.state.bootstrap();
    app.dispatch(boot);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            let cmds = app.state.refresh_today(Local::now().date_naive());
            app.dispatch(cmds);
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
        ])
        .split(frame.size());

    frame.render_widget(
        Paragraph::new(header_line(state)).block(Block::default().borders(Borders::BOTTOM)),
        rows[0],
    );

    let utility_width = if state.utility_expanded() { 52 } else { 30 };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(28),
            Constraint::Min(30),
            Constraint::Length(utility_width),
        ])
        .split(rows[1]);

    render_filter(frame, columns[0], state);
    render_fixtures(frame, columns[1], state);
    render_utility(frame, columns[2], state);

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[2]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if let Some(alert) = &state.alert {
        render_alert(frame, frame.size(), alert);
    }
}

fn pane_block(title: String, state: &AppState, pane: Pane) -> Block<'static> {
    let style = if state.focus == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}

fn header_line(state: &AppState) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            "BETAI ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{} [p]  ", state.sport.label())),
    ];
    for (idx, date) in state.date_strip().into_iter().enumerate() {
        let label = if idx == 0 {
            "TODAY".to_string()
        } else {
            date.format("%a %d").to_string()
        };
        let style = if state.selected_date == Some(date) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {label} "), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!(" focus: {}  ? help", pane_label(state.focus)),
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

fn render_filter(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match &state.selected_country {
        Some(country) => format!("Leagues · {}", country.name),
        None => "Countries".to_string(),
    };
    let block = pane_block(title, state, Pane::Filter);

    let mut lines = Vec::new();
    if state.search_active || !state.search.is_empty() {
        let cursor = if state.search_active { "_" } else { "" };
        lines.push(format!("/ {}{cursor}", state.search));
    }
    let header = lines.len();
    let rows = state.filter_rows();
    if rows.is_empty() {
        lines.push(if state.filter_loading() {
            "Loading...".to_string()
        } else {
            "Nothing to show".to_string()
        });
    }
    for (idx, row) in rows.iter().enumerate() {
        let prefix = if idx == state.filter_selected && state.focus == Pane::Filter {
            "> "
        } else {
            "  "
        };
        let line = match row {
            FilterRow::Country(country) => {
                let flag = state
                    .images
                    .resolve(country.flag.as_deref().unwrap_or_default(), &country.name);
                let mark = if state.selected_country.as_ref() == Some(*country) {
                    " ✓"
                } else {
                    ""
                };
                format!("{prefix}{} {}{mark}", flag.badge(), country.name)
            }
            FilterRow::League(league) => {
                let logo = state.images.resolve(&league.logo, &league.name);
                let mark = if state.selected_league.as_ref().map(|l| l.id) == Some(league.id) {
                    " ✓"
                } else {
                    ""
                };
                format!("{prefix}  {} {}{mark}", logo.badge(), league.name)
            }
        };
        lines.push(line);
    }
    if rows.len() > 1 && state.filter_loading() {
        lines.push("Loading...".to_string());
    }

    let visible = area.height.saturating_sub(2) as usize;
    let skip = scroll_offset(header + state.filter_selected, lines.len(), visible);
    let text = lines.into_iter().skip(skip).collect::<Vec<_>>().join("\n");
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_fixtures(frame: &mut Frame, area: Rect, state: &AppState) {
    let message = |title: &str, text: String| (title.to_string(), vec![text], false);
    let (title, lines, listing) = match state.fixture_region() {
        FixtureRegion::Unsupported(sport) => {
            message("Games", format!("{} coverage is coming soon", sport.label()))
        }
        FixtureRegion::SelectPrompt => message("Games", "Select a league or date".to_string()),
        FixtureRegion::Loading(query) => message(
            "Games",
            format!("Loading games for {}...", query.describe()),
        ),
        FixtureRegion::Empty => message("Games", "No games found".to_string()),
        FixtureRegion::Fixtures(fixtures) => {
            let title = match (&state.selected_league, state.selected_date) {
                (Some(league), _) => format!("Games · {}", league.name),
                (None, Some(date)) if date == state.today => "Games · Today".to_string(),
                (None, Some(date)) => format!("Games · {}", date.format("%a %d %b")),
                (None, None) => "Games".to_string(),
            };
            (title, fixture_lines(state, fixtures, None), true)
        }
        FixtureRegion::Ticket(slip) => (
            format!(
                "Ticket · {} games @ {}",
                slip.fixtures.len(),
                format_odd(slip.total_odd())
            ),
            fixture_lines(state, &slip.fixtures, None),
            true,
        ),
        FixtureRegion::Filterizer(result) => (
            format!(
                "Filterizer · {} {}",
                result.query.category.label(),
                result.query.odd_name()
            ),
            fixture_lines(state, &result.fixtures, Some(result.query.category)),
            true,
        ),
    };
    let block = pane_block(title, state, Pane::Fixtures);

    // One row per fixture so the selection offset maps onto screen rows.
    if listing {
        let visible = area.height.saturating_sub(2) as usize;
        let skip = scroll_offset(state.fixture_selected, lines.len(), visible);
        let text = lines.into_iter().skip(skip).collect::<Vec<_>>().join("\n");
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }
    frame.render_widget(
        Paragraph::new(lines.join("\n"))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn fixture_lines(
    state: &AppState,
    fixtures: &[Fixture],
    odd: Option<OddCategory>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (idx, fixture) in fixtures.iter().enumerate() {
        let prefix = if idx == state.fixture_selected && state.focus == Pane::Fixtures {
            "> "
        } else {
            "  "
        };
        let selected = state
            .selected_fixture
            .as_ref()
            .is_some_and(|f| f.id == fixture.id);
        let mark = if selected { "*" } else { " " };
        let home = state
            .images
            .resolve(&fixture.home_team_logo, &fixture.home_team);
        let away = state
            .images
            .resolve(&fixture.away_team_logo, &fixture.away_team);
        let mut line = format!(
            "{prefix}{mark}{} {} {} vs {} {}  [{}]",
            format_kickoff(&fixture.kickoff),
            home.badge(),
            fixture.home_team,
            fixture.away_team,
            away.badge(),
            fixture.league_name
        );
        if let Some(info) = &fixture.ticket_info {
            let price = info.odd.map(format_odd).unwrap_or_else(|| "-".to_string());
            line.push_str(&format!("  {} @ {price}", info.label));
        }
        if let Some(quote) = odd.and_then(|c| fixture.odds.get(c.key())) {
            line.push_str(&format!("  {} @ {}", quote.label, format_odd(quote.value)));
        }
        lines.push(line);
    }
    lines
}

fn render_utility(frame: &mut Frame, area: Rect, state: &AppState) {
    let tabs = [
        (UtilityTab::Analysis, "a:Analysis"),
        (UtilityTab::Ticket, "t:Ticket"),
        (UtilityTab::Filterizer, "f:Filter"),
    ]
    .iter()
    .map(|(tab, label)| {
        if *tab == state.utility_tab {
            format!("[{label}]")
        } else {
            format!(" {label} ")
        }
    })
    .collect::<Vec<_>>()
    .join("");
    let block = pane_block(tabs, state, Pane::Utility);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match state.utility_tab {
        UtilityTab::Analysis => render_analysis(frame, inner, state),
        UtilityTab::Ticket => {
            frame.render_widget(
                Paragraph::new(ticket_text(state)).wrap(Wrap { trim: false }),
                inner,
            );
        }
        UtilityTab::Filterizer => {
            frame.render_widget(
                Paragraph::new(filterizer_text(state)).wrap(Wrap { trim: false }),
                inner,
            );
        }
    }
}

fn render_analysis(frame: &mut Frame, area: Rect, state: &AppState) {
    match state.analysis_view() {
        AnalysisView::Collapsed => {
            frame.render_widget(Paragraph::new("Select a game to see its analysis"), area);
        }
        AnalysisView::Loading(fixture) => {
            frame.render_widget(
                Paragraph::new(format!(
                    "Loading analysis for\n{} vs {}",
                    fixture.home_team, fixture.away_team
                )),
                area,
            );
        }
        AnalysisView::Failed(fixture) => {
            frame.render_widget(
                Paragraph::new(format!(
                    "Failed to load analysis\n{} vs {}",
                    fixture.home_team, fixture.away_team
                )),
                area,
            );
        }
        AnalysisView::Ready(fixture, analysis) => {
            let cards = analysis_cards(fixture, analysis);
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(7),
                    Constraint::Length(7),
                    Constraint::Length(7),
                    Constraint::Min(0),
                ])
                .split(area);
            for (card, chunk) in cards.iter().zip(chunks.iter()) {
                render_stat_card(frame, *chunk, state, card);
            }
        }
    }
}

fn render_stat_card(frame: &mut Frame, area: Rect, state: &AppState, card: &StatCard) {
    let title = match &card.logo {
        Some(logo) => format!("{} {}", state.images.resolve(logo, &card.title).badge(), card.title),
        None => card.title.clone(),
    };
    let block = Block::default().title(title).borders(Borders::TOP);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); card.bars.len()])
        .split(inner);
    for (bar, row) in card.bars.iter().zip(rows.iter()) {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(bar.percent.round() as u16)
            .label(format!("{:<8} {:.2}", bar.kind.label(), bar.value));
        frame.render_widget(gauge, *row);
    }
}

fn ticket_text(state: &AppState) -> String {
    let form = &state.ticket;
    let field = |label: &str, value: &str, active: bool| {
        let cursor = if active && state.focus == Pane::Utility {
            "_"
        } else {
            ""
        };
        let marker = if active { ">" } else { " " };
        format!("{marker} {label}: {value}{cursor}")
    };
    let mut lines = vec![
        "Build a ticket in an odd range".to_string(),
        String::new(),
        field("Min odd", &form.min_odd, form.field == TicketField::Min),
        field("Max odd", &form.max_odd, form.field == TicketField::Max),
        String::new(),
    ];
    if form.pending.is_some() {
        lines.push("Building ticket...".to_string());
    } else if let Some(msg) = &form.message {
        lines.push(msg.clone());
    } else if let ViewMode::TicketView(slip) = &state.view {
        lines.push(format!(
            "{} games · total odd {}",
            slip.fixtures.len(),
            format_odd(slip.total_odd())
        ));
    }
    lines.push(String::new());
    lines.push("j/k field · Enter build · x clear".to_string());
    lines.join("\n")
}

fn filterizer_text(state: &AppState) -> String {
    let form = &state.filterizer;
    let mut lines = vec!["Find games by market".to_string(), String::new()];
    for category in OddCategory::ALL {
        let marker = if category == form.category { ">" } else { " " };
        lines.push(format!("{marker} {}", category.label()));
    }
    let query = form.query();
    lines.push(String::new());
    lines.push(format!(
        "Threshold: ← {} → ({}/{})",
        query.odd_name(),
        form.threshold_idx + 1,
        THRESHOLDS.len()
    ));
    lines.push(String::new());
    if form.pending.is_some() {
        lines.push("Filtering...".to_string());
    } else if let Some(msg) = &form.message {
        lines.push(msg.clone());
    } else if let ViewMode::FilterizerView(result) = &state.view {
        lines.push(format!("{} games matched", result.fixtures.len()));
    }
    lines.push(String::new());
    lines.push("j/k market · h/l odd · Enter run · x clear".to_string());
    lines.join("\n")
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn scroll_offset(selected: usize, total: usize, visible: usize) -> usize {
    if visible == 0 || total <= visible {
        return 0;
    }
    let max_start = total - visible;
    selected.saturating_sub(visible / 2).min(max_start)
}

fn format_kickoff(raw: &str) -> String {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return "TBD".to_string();
    }
    if let Some(dt) = parse_kickoff(cleaned) {
        return dt.format("%d %b %H:%M").to_string();
    }
    cleaned.chars().take(16).collect::<String>().replace('T', " ")
}

fn parse_kickoff(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    let trimmed = raw
        .split(['+', 'Z'])
        .next()
        .unwrap_or(raw)
        .trim_end_matches(".000");
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    None
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "BETAI Terminal - Help",
        "",
        "Global:",
        "  Tab / S-Tab  Move focus",
        "  j/k or ↑/↓   Move selection",
        "  Enter        Select / submit",
        "  /            Search countries and leagues",
        "  [ / ]        Previous / next day",
        "  p            Cycle sport",
        "  a / t / f    Analysis / Ticket / Filterizer",
        "  x            Clear ticket or filterizer",
        "  Esc          Clear selected game",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Ticket: type digits, j/k switch field",
        "Filterizer: j/k market, h/l threshold",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect(40, 20, area);
    frame.render_widget(Clear, popup_area);
    let alert = Paragraph::new(format!("{message}\n\nEnter / Esc to close"))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Notice")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(alert, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;

    use super::*;
    use betai_terminal::state::Country;

    fn booted() -> (AppState, ProviderCommand, ProviderCommand) {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
        let mut state = AppState::with_today(today);
        let mut cmds = state.bootstrap().into_iter();
        let countries = cmds.next().expect("countries fetch");
        let fixtures = cmds.next().expect("fixtures fetch");
        (state, countries, fixtures)
    }

    fn fixture(id: u64) -> Fixture {
        Fixture {
            id,
            home_team: format!("Home{id:02}"),
            home_team_logo: String::new(),
            away_team: format!("Away{id:02}"),
            away_team_logo: String::new(),
            kickoff: "2024-03-09T15:00:00+00:00".to_string(),
            league_name: "Championship".to_string(),
            league_logo: String::new(),
            odds: BTreeMap::new(),
            ticket_info: None,
        }
    }

    fn rendered_rows(width: u16, height: u16, draw: impl FnOnce(&mut Frame)) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
        terminal.draw(draw).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect()
    }

    #[test]
    fn games_pane_scrolls_to_the_selected_fixture() {
        let (mut state, _, fixtures_cmd) = booted();
        let ProviderCommand::FetchFixtures { token, .. } = &fixtures_cmd else {
            panic!("unexpected command: {fixtures_cmd:?}");
        };
        apply_delta(
            &mut state,
            Delta::SetFixtures {
                token: *token,
                result: Ok((0..30).map(fixture).collect()),
            },
        );
        state.focus = Pane::Fixtures;
        for _ in 0..25 {
            state.select_next();
        }
        assert_eq!(state.fixture_selected, 25);

        let rows = rendered_rows(100, 12, |f| {
            let area = f.size();
            render_fixtures(f, area, &state)
        });
        let row = rows
            .iter()
            .find(|row| row.contains("Home25"))
            .expect("selected fixture should be on screen");
        assert!(row.contains('>'));
        assert!(!rows.iter().any(|row| row.contains("Home00")));
    }

    #[test]
    fn filter_pane_keeps_selection_visible_under_search_prompt() {
        let (mut state, countries_cmd, _) = booted();
        let ProviderCommand::FetchCountries { token } = &countries_cmd else {
            panic!("unexpected command: {countries_cmd:?}");
        };
        let countries = (0..30)
            .map(|idx| Country {
                name: format!("Country{idx:02}"),
                code: None,
                flag: None,
            })
            .collect();
        apply_delta(
            &mut state,
            Delta::SetCountries {
                token: *token,
                result: Ok(countries),
            },
        );
        state.start_search();
        for _ in 0..10 {
            state.select_next();
        }
        assert_eq!(state.filter_selected, 10);

        let rows = rendered_rows(40, 4, |f| {
            let area = f.size();
            render_filter(f, area, &state)
        });
        assert!(rows.iter().any(|row| row.contains("Country10")));
    }

    #[test]
    fn scroll_offset_centres_and_clamps() {
        assert_eq!(scroll_offset(3, 5, 10), 0);
        assert_eq!(scroll_offset(25, 30, 10), 20);
        assert_eq!(scroll_offset(12, 30, 10), 7);
    }
}
