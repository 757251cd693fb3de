//! Application state and event loop

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    DefaultTerminal, Frame,
};

use crate::config::Config;
use crate::report::{Report, DEFAULT_TOP_N};
use crate::services::{ApiClient, DashboardLoader, LoadOutcome, Transport};
use crate::types::{DateRange, Department};

use super::theme::Theme;
use super::widgets::{
    dashboard::DashboardView,
    filter_popup::{FilterPopup, FilterState},
    help::HelpPopup,
    spinner::Spinner,
    tabs::{Tab, TabBar},
};

/// Load status of one department view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    /// Never requested
    Idle,
    Loading { spinner_frame: usize },
    Ready(Box<Report>),
    NoData { reason: String },
}

/// What a finished fetch produced
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Ready(Box<Report>),
    NoData(String),
}

/// A fetch the event loop should start
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub department: Department,
    pub seq: u64,
    pub range: Option<DateRange>,
}

/// A finished fetch, tagged with the sequence number it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub department: Department,
    pub seq: u64,
    pub loaded: Loaded,
}

/// Per-department view state
#[derive(Debug, Clone)]
pub struct ViewState {
    range: Option<DateRange>,
    status: ViewStatus,
    seq: u64,
    scroll: usize,
}

impl ViewState {
    fn new() -> Self {
        Self {
            range: None,
            status: ViewStatus::Idle,
            seq: 0,
            scroll: 0,
        }
    }

    /// Issue a new sequence number; anything older becomes stale
    fn begin_load(&mut self) -> u64 {
        self.seq += 1;
        self.status = ViewStatus::Loading { spinner_frame: 0 };
        self.scroll = 0;
        self.seq
    }

    /// Store a result if it answers the latest request. Returns false for stale results.
    fn accept(&mut self, seq: u64, loaded: Loaded) -> bool {
        if seq != self.seq {
            return false;
        }
        self.status = match loaded {
            Loaded::Ready(report) => ViewStatus::Ready(report),
            Loaded::NoData(reason) => ViewStatus::NoData { reason },
        };
        true
    }
}

/// Main application
pub struct App {
    views: HashMap<Department, ViewState>,
    current_tab: Tab,
    show_help: bool,
    filter: Option<FilterState>,
    should_quit: bool,
    theme: Theme,
}

impl App {
    pub fn new(theme: Theme) -> Self {
        Self {
            views: Department::all()
                .iter()
                .map(|&d| (d, ViewState::new()))
                .collect(),
            current_tab: Tab::default(),
            show_help: false,
            filter: None,
            should_quit: false,
            theme,
        }
    }

    fn view(&self) -> &ViewState {
        &self.views[&self.current_tab.department()]
    }

    fn view_mut(&mut self) -> &mut ViewState {
        self.views
            .entry(self.current_tab.department())
            .or_insert_with(ViewState::new)
    }

    fn request(&mut self) -> LoadRequest {
        let department = self.current_tab.department();
        let view = self.view_mut();
        let seq = view.begin_load();
        LoadRequest {
            department,
            seq,
            range: view.range,
        }
    }

    /// Start loading the current view if it has never been loaded
    pub fn ensure_loaded(&mut self) -> Option<LoadRequest> {
        if self.view().status == ViewStatus::Idle {
            Some(self.request())
        } else {
            None
        }
    }

    fn select_tab(&mut self, tab: Tab) -> Option<LoadRequest> {
        self.current_tab = tab;
        self.ensure_loaded()
    }

    /// Handle keyboard events, returning a fetch to start if one is needed
    pub fn handle_event(&mut self, event: Event) -> Option<LoadRequest> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        if self.filter.is_some() {
            return self.handle_filter_key(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab => self.select_tab(self.current_tab.next()),
            KeyCode::BackTab => self.select_tab(self.current_tab.prev()),
            KeyCode::Char(c @ '1'..='4') => {
                Tab::from_number(c as u8 - b'0').and_then(|tab| self.select_tab(tab))
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_up();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_down();
                None
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                None
            }
            KeyCode::Char('f') => {
                self.show_help = false;
                self.filter = Some(FilterState::new(self.view().range));
                None
            }
            KeyCode::Char('c') => {
                if self.view().range.is_none() {
                    return None;
                }
                self.view_mut().range = None;
                Some(self.request())
            }
            KeyCode::Char('r') => Some(self.request()),
            _ => None,
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Option<LoadRequest> {
        let filter = self.filter.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.filter = None;
                None
            }
            KeyCode::Tab | KeyCode::BackTab => {
                filter.toggle_focus();
                None
            }
            KeyCode::Backspace => {
                filter.backspace();
                None
            }
            KeyCode::Enter => {
                let range = filter.submit()?;
                self.filter = None;
                self.view_mut().range = Some(range);
                Some(self.request())
            }
            KeyCode::Char(c) => {
                filter.input(c);
                None
            }
            _ => None,
        }
    }

    fn scroll_up(&mut self) {
        let view = self.view_mut();
        view.scroll = view.scroll.saturating_sub(1);
    }

    fn scroll_down(&mut self) {
        let view = self.view_mut();
        if let ViewStatus::Ready(report) = &view.status {
            let max = DashboardView::max_scroll_offset(report);
            view.scroll = (view.scroll + 1).min(max);
        }
    }

    /// Route a finished fetch to its view. Stale results are dropped.
    pub fn apply(&mut self, fetched: Fetched) {
        let Some(view) = self.views.get_mut(&fetched.department) else {
            return;
        };
        if !view.accept(fetched.seq, fetched.loaded) {
            tracing::debug!(
                department = ?fetched.department,
                seq = fetched.seq,
                latest = view.seq,
                "discarding stale result"
            );
        }
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let ViewStatus::Loading { spinner_frame } = &mut self.view_mut().status {
            *spinner_frame = Spinner::next_frame(*spinner_frame);
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Draw the application
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [tabs, _, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);

        TabBar::new(self.current_tab, self.theme).render(tabs, buf);

        let view = self.view();
        match &view.status {
            ViewStatus::Idle => {}
            ViewStatus::Loading { spinner_frame } => {
                Spinner::new(*spinner_frame, self.current_tab.department(), self.theme)
                    .render(body, buf);
            }
            ViewStatus::Ready(report) => {
                DashboardView::new(report, self.theme)
                    .with_scroll(view.scroll)
                    .render(body, buf);
            }
            ViewStatus::NoData { reason } => {
                let range = view
                    .range
                    .map(|r| format!(" for {}", r))
                    .unwrap_or_default();
                let lines = vec![
                    Line::from(Span::styled(
                        format!("No data available{}", range),
                        Style::default().fg(self.theme.error()),
                    )),
                    Line::from(Span::styled(
                        reason.clone(),
                        Style::default().fg(self.theme.muted()),
                    )),
                ];
                let y = body.y + body.height / 2;
                let message = Rect {
                    y: y.saturating_sub(1),
                    height: 2.min(body.height),
                    ..body
                };
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .render(message, buf);
            }
        }

        Paragraph::new(Line::from(Span::styled(
            "1-4 dashboards · f filter · c clear · r reload · ? help · q quit",
            Style::default().fg(self.theme.muted()),
        )))
        .alignment(Alignment::Center)
        .render(footer, buf);

        if let Some(filter) = &self.filter {
            let popup_area = FilterPopup::centered_area(area);
            FilterPopup::new(filter, self.theme).render(popup_area, buf);
        } else if self.show_help {
            let popup_area = HelpPopup::centered_area(area);
            HelpPopup::new(self.theme).render(popup_area, buf);
        }
    }
}

/// Run one fetch and build its report (runs on the background thread)
fn load_sync<T: Transport>(loader: &DashboardLoader<T>, request: &LoadRequest) -> Loaded {
    match loader.load(request.department, request.range.as_ref()) {
        LoadOutcome::Ready { analytics, source } => Loaded::Ready(Box::new(Report::build(
            &analytics,
            source,
            request.range,
            DEFAULT_TOP_N,
        ))),
        LoadOutcome::NoData { reason } => Loaded::NoData(reason),
    }
}

fn spawn_load(
    loader: &Arc<DashboardLoader<ApiClient>>,
    tx: &Sender<Fetched>,
    request: LoadRequest,
) {
    let loader = Arc::clone(loader);
    let tx = tx.clone();
    thread::spawn(move || {
        let loaded = load_sync(&loader, &request);
        let _ = tx.send(Fetched {
            department: request.department,
            seq: request.seq,
            loaded,
        });
    });
}

/// Run the TUI application
pub fn run(config: &Config) -> anyhow::Result<()> {
    // Must run before raw mode, it queries the terminal
    let theme = Theme::detect();
    let loader = Arc::new(DashboardLoader::new(config.client()?, config.sample_size));

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, theme, loader);
    ratatui::restore();
    result
}

fn run_app(
    terminal: &mut DefaultTerminal,
    theme: Theme,
    loader: Arc<DashboardLoader<ApiClient>>,
) -> anyhow::Result<()> {
    let mut app = App::new(theme);
    let (tx, rx) = mpsc::channel();

    if let Some(request) = app.ensure_loaded() {
        spawn_load(&loader, &tx, request);
    }

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Drain finished fetches (non-blocking)
        while let Ok(fetched) = rx.try_recv() {
            app.apply(fetched);
        }

        // Poll for events with 100ms timeout for spinner animation
        if event::poll(Duration::from_millis(100))? {
            if let Some(request) = app.handle_event(event::read()?) {
                spawn_load(&loader, &tx, request);
            }
        } else {
            app.tick();
        }
    }

    Ok(())
}
