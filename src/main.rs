use std::env;
use std::io;
use std::sync::mpsc;
use std::time::Duration;

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
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use arena_terminal::improvements::{self, ImprovementsReport, RankKind};
use arena_terminal::state::{
    AppState, Delta, ImprovementsFlow, ImprovementsTab, ProviderCommand, SortMode, apply_delta,
};
use arena_terminal::{feed, fixture_feed, snapshot};

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

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('?') | KeyCode::Esc => self.state.help_overlay = false,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }
        if key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }
        if matches!(self.state.flow, ImprovementsFlow::Loading) {
            // The in-flight fetch set cannot be cancelled, but the popup
            // can be dismissed; a result landing afterwards is dropped.
            if key.code == KeyCode::Esc {
                self.state.dismiss_improvements();
            }
            return;
        }
        if matches!(self.state.flow, ImprovementsFlow::Failed { .. }) {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('b')
            ) {
                self.state.dismiss_improvements();
            }
            return;
        }
        if matches!(self.state.flow, ImprovementsFlow::Displayed(_)) {
            match key.code {
                KeyCode::Esc | KeyCode::Char('b') => self.state.dismiss_improvements(),
                KeyCode::Tab => self.state.cycle_tab(),
                KeyCode::BackTab => self.state.cycle_tab_back(),
                KeyCode::Char('1') => self.state.set_tab(ImprovementsTab::Tick),
                KeyCode::Char('2') => self.state.set_tab(ImprovementsTab::Rank),
                KeyCode::Char('3') => self.state.set_tab(ImprovementsTab::Floor),
                KeyCode::Char('j') | KeyCode::Down => self.state.modal_select_next(),
                KeyCode::Char('k') | KeyCode::Up => self.state.modal_select_prev(),
                KeyCode::Enter => self.select_room_from_popup(),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('s') => self.state.cycle_sort(),
            KeyCode::Char('i') | KeyCode::Char('I') => self.trigger_improvements(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_snapshot_reload(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn trigger_improvements(&mut self) {
        let Some(snapshot) = self.state.snapshot.clone() else {
            self.state
                .push_log("[WARN] No player snapshot loaded; nothing to compare");
            return;
        };
        if !self.state.begin_improvements() {
            self.state
                .push_log("[INFO] Improvements fetch already running");
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Improvements fetch unavailable");
            self.state.dismiss_improvements();
            return;
        };
        if tx
            .send(ProviderCommand::FetchImprovements { snapshot })
            .is_err()
        {
            self.state.push_log("[WARN] Improvements request failed");
            self.state.dismiss_improvements();
        }
    }

    fn select_room_from_popup(&mut self) {
        let Some(code) = self.state.modal_selected_code() else {
            return;
        };
        if self.state.select_room(&code) {
            let name = self.state.rows[self.state.selected].name.clone();
            self.state
                .push_log(format!("[INFO] Selected room {name} ({code})"));
        } else {
            self.state
                .push_log(format!("[INFO] Room {code} not in the snapshot table"));
        }
    }

    fn request_snapshot_reload(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Snapshot reload unavailable");
            return;
        };
        if tx.send(ProviderCommand::ReloadSnapshot).is_err() {
            self.state.push_log("[WARN] Snapshot reload request failed");
        } else {
            self.state.push_log("[INFO] Snapshot reload requested");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let fixture_mode = env::var("ARENA_FEED")
        .map(|mode| mode.trim().eq_ignore_ascii_case("fixture"))
        .unwrap_or(false);
    if fixture_mode {
        fixture_feed::spawn_fixture_provider(tx, cmd_rx);
    } else {
        feed::spawn_provider(tx, cmd_rx);
    }

    let mut app = App::new(Some(cmd_tx));
    match snapshot::load_snapshot() {
        Ok(snap) => apply_delta(&mut app.state, Delta::SnapshotLoaded(snap)),
        Err(err) => {
            // Fixture runs fall back to the bundled snapshot.
            if fixture_mode && let Ok(snap) = fixture_feed::fixture_snapshot() {
                apply_delta(&mut app.state, Delta::SnapshotLoaded(snap));
            } else {
                app.state
                    .push_log(format!("[WARN] Snapshot load failed: {err:#}"));
            }
        }
    }

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

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(5)])
        .split(chunks[1]);

    render_rooms(frame, body[0], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, body[1]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    match &app.state.flow {
        ImprovementsFlow::Idle => {}
        ImprovementsFlow::Loading => render_loading_popup(frame, frame.size()),
        ImprovementsFlow::Displayed(report) => {
            render_improvements_popup(frame, frame.size(), &app.state, report)
        }
        ImprovementsFlow::Failed { message } => {
            render_error_popup(frame, frame.size(), message)
        }
    }

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let who = state
        .snapshot
        .as_ref()
        .map(|snap| snap.user_name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "no snapshot".to_string());
    let line1 = format!(
        "ARENA TERMINAL | {who} | {} rooms | Sort: {}",
        state.rows.len(),
        sort_label(state.sort)
    );
    let line2 = match state
        .snapshot
        .as_ref()
        .and_then(|snap| snap.exported_at.as_deref())
    {
        Some(raw) => format!("snapshot exported {}", format_exported_at(raw)),
        None => "snapshot export time unknown".to_string(),
    };
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    if state.flow.popup_open() {
        "Tab/1/2/3 Category | j/k/↑/↓ Move | Enter Select room | Esc Close | q Quit".to_string()
    } else {
        "j/k/↑/↓ Move | s Sort | i Improvements | r Reload snapshot | ? Help | q Quit".to_string()
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
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

fn sort_label(sort: SortMode) -> &'static str {
    match sort {
        SortMode::Name => "NAME",
        SortMode::Ticks => "TICKS",
        SortMode::Rank => "RANK",
        SortMode::Floor => "FLOOR",
    }
}

fn format_exported_at(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(stamp) => stamp.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn room_columns() -> [Constraint; 6] {
    [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(7),
    ]
}

fn render_rooms(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = room_columns();
    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    render_cell_text(frame, cols[0], "Code", header_style);
    render_cell_text(frame, cols[1], "Room", header_style);
    render_cell_text(frame, cols[2], "Ticks", header_style);
    render_cell_text(frame, cols[3], "Rank", header_style);
    render_cell_text(frame, cols[4], "Rank ticks", header_style);
    render_cell_text(frame, cols[5], "Floor", header_style);

    let list_area = sections[1];
    if state.rows.is_empty() {
        let empty = Paragraph::new("No player snapshot loaded (set ARENA_SNAPSHOT_PATH)")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, state.rows.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };

        let selected = idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let row = &state.rows[idx];
        let rank = opt_value(row.record.rank);
        let rank_ticks = opt_value(row.record.rank_ticks);
        let floor = opt_value(row.record.floor);

        render_cell_text(frame, cols[0], &row.code, row_style);
        render_cell_text(frame, cols[1], &row.name, row_style);
        render_cell_text(frame, cols[2], &row.record.ticks.to_string(), row_style);
        render_cell_text(frame, cols[3], &rank, row_style);
        render_cell_text(frame, cols[4], &rank_ticks, row_style);
        render_cell_text(frame, cols[5], &floor, row_style);
    }
}

fn opt_value(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn render_loading_popup(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(50, 24, area);
    frame.render_widget(Clear, popup);
    let loading = Paragraph::new("\nLoading data...")
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("Improvement Opportunities")
                .borders(Borders::ALL),
        );
    frame.render_widget(loading, popup);
}

fn render_error_popup(frame: &mut Frame, area: Rect, message: &str) {
    let popup = centered_rect(60, 34, area);
    frame.render_widget(Clear, popup);
    let text = format!(
        "Failed to load improvement opportunities.\nPlease try again later.\n\nError: {message}\n\n[Esc] OK"
    );
    let error = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .block(Block::default().title("Error").borders(Borders::ALL));
    frame.render_widget(error, popup);
}

fn render_improvements_popup(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    report: &ImprovementsReport,
) {
    let popup = centered_rect(72, 80, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title("Improvement Opportunities")
        .borders(Borders::ALL);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    if inner.height < 8 || inner.width < 24 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(inner);

    render_tab_bar(frame, chunks[0], state.tab);
    match state.tab {
        ImprovementsTab::Tick => render_tick_rows(frame, chunks[1], state, report),
        ImprovementsTab::Rank => render_rank_rows(frame, chunks[1], state, report),
        ImprovementsTab::Floor => render_floor_rows(frame, chunks[1], state, report),
    }
    render_summary(frame, chunks[2], state.tab, report);

    let hints = Paragraph::new("Tab/1/2/3 Category | j/k Move | Enter Select room | Esc Close")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hints, chunks[3]);
}

fn render_tab_bar(frame: &mut Frame, area: Rect, active: ImprovementsTab) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    for (idx, tab) in [
        ImprovementsTab::Tick,
        ImprovementsTab::Rank,
        ImprovementsTab::Floor,
    ]
    .into_iter()
    .enumerate()
    {
        let style = if tab == active {
            Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let label = Paragraph::new(tab.label())
            .alignment(Alignment::Center)
            .style(style);
        frame.render_widget(label, cols[idx]);
    }
}

const OPPORTUNITY_ROW_HEIGHT: u16 = 2;

fn render_opportunity_rows(
    frame: &mut Frame,
    area: Rect,
    selected: usize,
    total: usize,
    empty_text: &str,
    mut row_lines: impl FnMut(usize) -> (String, String, Style),
) {
    if total == 0 {
        let empty = Paragraph::new(format!("\n{empty_text}"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }
    if area.height < OPPORTUNITY_ROW_HEIGHT {
        return;
    }

    let visible = (area.height / OPPORTUNITY_ROW_HEIGHT) as usize;
    let (start, end) = visible_range(selected, total, visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: area.x,
            y: area.y + (i as u16) * OPPORTUNITY_ROW_HEIGHT,
            width: area.width,
            height: OPPORTUNITY_ROW_HEIGHT,
        };

        let is_selected = idx == selected;
        let base = if is_selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if is_selected {
            frame.render_widget(Block::default().style(base), row_area);
        }

        let (top, bottom, mut accent) = row_lines(idx);
        if is_selected {
            accent = accent.bg(Color::DarkGray);
        }
        let top_area = Rect { height: 1, ..row_area };
        let bottom_area = Rect {
            y: row_area.y + 1,
            height: 1,
            ..row_area
        };
        frame.render_widget(Paragraph::new(top).style(base), top_area);
        frame.render_widget(Paragraph::new(bottom).style(accent), bottom_area);
    }
}

fn render_tick_rows(frame: &mut Frame, area: Rect, state: &AppState, report: &ImprovementsReport) {
    render_opportunity_rows(
        frame,
        area,
        state.modal_selected(),
        report.ticks.len(),
        "You are already at the top in all rooms!",
        |idx| {
            let o = &report.ticks[idx];
            let top = format!("{}  Your {} → Top {}", o.name, o.your_ticks, o.best_ticks);
            let mut bottom = format!("  +{} ticks ({}%) by {}", o.diff, o.pct, o.holder);
            if let Some(pos) = o.board_rank {
                bottom.push_str(&format!("  [#{pos} on board]"));
            }
            (top, bottom, Style::default().fg(Color::Green))
        },
    );
}

fn render_rank_rows(frame: &mut Frame, area: Rect, state: &AppState, report: &ImprovementsReport) {
    render_opportunity_rows(
        frame,
        area,
        state.modal_selected(),
        report.ranks.len(),
        "You already have the maximum rank score in all rooms!",
        |idx| {
            let o = &report.ranks[idx];
            let top = format!(
                "{}  Your score {} → Top {}",
                o.name, o.your_score, o.best_score
            );
            match o.kind {
                RankKind::Score => (
                    top,
                    format!("  +{} rank points by {}", o.diff, o.holder),
                    Style::default().fg(Color::Green),
                ),
                RankKind::Tick => {
                    let yours = opt_value(o.your_rank_ticks);
                    let best = opt_value(o.best_rank_ticks);
                    (
                        top,
                        format!("  Your {yours} → Top {best} rank ticks by {}", o.holder),
                        Style::default().fg(Color::Yellow),
                    )
                }
            }
        },
    );
}

fn render_floor_rows(frame: &mut Frame, area: Rect, state: &AppState, report: &ImprovementsReport) {
    render_opportunity_rows(
        frame,
        area,
        state.modal_selected(),
        report.floors.len(),
        "You already have the maximum floor in all rooms!",
        |idx| {
            let o = &report.floors[idx];
            (
                format!("{}  Your floor {} → Top {}", o.name, o.your_floor, o.best_floor),
                format!("  +{} floors by {}", o.diff, o.holder),
                Style::default().fg(Color::Green),
            )
        },
    );
}

fn render_summary(frame: &mut Frame, area: Rect, tab: ImprovementsTab, report: &ImprovementsReport) {
    let text = match tab {
        ImprovementsTab::Tick => format!(
            "Total: {}\nTheoretical minimum: {}\nPossible gain: {} ticks",
            report.totals.total, report.totals.min_theoretical, report.totals.possible_gain
        ),
        ImprovementsTab::Rank => {
            let summary = improvements::rank_summary(&report.ranks);
            format!(
                "Rooms with score improvement: {}\nRooms with tick improvement: {}\nTotal rank points to gain: {}",
                summary.score_rooms, summary.tick_rooms, summary.points_to_gain
            )
        }
        ImprovementsTab::Floor => {
            let summary = improvements::floor_summary(&report.floors);
            format!(
                "Rooms with floor improvement: {}\nTotal floors to gain: {}",
                summary.rooms, summary.floors_to_gain
            )
        }
    };
    let block = Block::default().title("Totals").borders(Borders::TOP);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Arena Terminal - Help",
        "",
        "Rooms:",
        "  j/k or ↑/↓   Move",
        "  s            Cycle sort mode",
        "  i            Improvement opportunities",
        "  r            Reload snapshot",
        "",
        "Improvements popup:",
        "  Tab / 1/2/3  Switch category",
        "  j/k or ↑/↓   Move",
        "  Enter        Select room in the table",
        "  Esc          Close",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
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
