use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_tracker::config::DisplaySection;
use expense_tracker::{
    DerivedView, ExpenseForm, ExpenseStore, KeyValueStorage, Rgb, ViewBuilder, CLEAR_PROMPT,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset, GraphType,
        Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Amount,
    Category,
    History,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Title => Focus::Amount,
            Focus::Amount => Focus::Category,
            Focus::Category => Focus::History,
            Focus::History => Focus::Title,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Title => Focus::History,
            Focus::Amount => Focus::Title,
            Focus::Category => Focus::Amount,
            Focus::History => Focus::Category,
        }
    }

    fn is_form(&self) -> bool {
        !matches!(self, Focus::History)
    }
}

pub struct App<S: KeyValueStorage> {
    pub store: ExpenseStore<S>,
    pub views: ViewBuilder,
    pub form: ExpenseForm,
    pub focus: Focus,
    pub history_state: TableState,
    pub confirm_clear: bool,
    pub display: DisplaySection,
    pub status: Option<String>,
}

impl<S: KeyValueStorage> App<S> {
    pub fn new(store: ExpenseStore<S>, display: DisplaySection) -> Self {
        let mut app = Self {
            store,
            views: ViewBuilder::new(),
            form: ExpenseForm::new(),
            focus: Focus::Title,
            history_state: TableState::default(),
            confirm_clear: false,
            display,
            status: None,
        };
        app.refresh();
        app
    }

    pub fn view(&mut self) -> &DerivedView {
        self.views.refresh(&self.store)
    }

    /// Recompute derived data and keep the selection in range
    fn refresh(&mut self) {
        self.views.refresh(&self.store);
        let len = self.store.len();
        match self.history_state.selected() {
            _ if len == 0 => self.history_state.select(None),
            Some(i) if i >= len => self.history_state.select(Some(len - 1)),
            None => self.history_state.select(Some(len - 1)),
            _ => {}
        }
    }

    /// Apply one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return true,
                KeyCode::Char('x') => self.confirm_clear = true,
                _ => {}
            }
            return false;
        }

        if self.confirm_clear {
            self.answer_clear(key.code);
            return false;
        }

        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Esc if self.focus.is_form() => self.focus = Focus::History,
            _ => match self.focus {
                Focus::Title => self.edit_title(key.code),
                Focus::Amount => self.edit_amount(key.code),
                Focus::Category => self.edit_category(key.code),
                Focus::History => return self.history_key(key.code),
            },
        }
        false
    }

    fn answer_clear(&mut self, code: KeyCode) {
        let answer = match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return,
        };
        self.confirm_clear = false;
        if self.store.clear(|_| answer) {
            self.status = Some("All expenses cleared".to_string());
            self.refresh();
        }
    }

    fn edit_title(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.form.title.push(c),
            KeyCode::Backspace => {
                self.form.title.pop();
            }
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn edit_amount(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.form.amount.push(c),
            KeyCode::Backspace => {
                self.form.amount.pop();
            }
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn edit_category(&mut self, code: KeyCode) {
        match code {
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => {
                self.form.category = self.form.category.next()
            }
            KeyCode::Left | KeyCode::Up => self.form.category = self.form.category.previous(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn history_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => self.focus = Focus::Title,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => {
                if !self.store.is_empty() {
                    self.history_state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.store.is_empty() {
                    self.history_state.select(Some(self.store.len() - 1));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('c') => self.confirm_clear = true,
            KeyCode::Char('a') => self.focus = Focus::Title,
            _ => {}
        }
        false
    }

    fn submit(&mut self) {
        // rejected input stays in the form untouched
        if self.form.submit(&mut self.store).is_some() {
            self.status = None;
            self.refresh();
            self.history_state.select(Some(self.store.len() - 1));
            self.focus = Focus::Title;
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self
            .history_state
            .selected()
            .and_then(|i| self.store.expenses().get(i))
            .map(|e| e.id)
        else {
            return;
        };
        if self.store.remove(id) {
            self.refresh();
        }
    }

    pub fn next(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.history_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.history_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.history_state.select(Some(i));
    }
}

pub fn run_ui<S: KeyValueStorage>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStorage>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui<S: KeyValueStorage>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with total
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    let view = app.view().clone();

    render_header(f, chunks[0], app, &view);
    render_form(f, left[0], app);
    render_history(f, left[1], app);
    render_trend(f, right[0], &view);
    render_breakdown(f, right[1], app, &view);
    render_status_bar(f, chunks[2], app);

    if app.confirm_clear {
        render_confirm(f, f.size());
    }
}

fn render_header<S: KeyValueStorage>(
    f: &mut Frame,
    area: Rect,
    app: &App<S>,
    view: &DerivedView,
) {
    let line = Line::from(vec![
        Span::styled(
            " Expense Tracker ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ Total: "),
        Span::styled(
            app.display.format_amount(view.total),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" │ {} expenses", app.store.len())),
    ]);

    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(header, area);
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_form<S: KeyValueStorage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let cursor = |focus: Focus| if app.focus == focus { "▏" } else { "" };

    let lines = vec![
        Line::from(vec![
            Span::styled(" Title:    ", field_style(app.focus == Focus::Title)),
            Span::raw(app.form.title.clone()),
            Span::styled(cursor(Focus::Title), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled(" Amount:   ", field_style(app.focus == Focus::Amount)),
            Span::raw(app.form.amount.clone()),
            Span::styled(cursor(Focus::Amount), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled(" Category: ", field_style(app.focus == Focus::Category)),
            Span::styled(
                format!("◀ {} ▶", app.form.category),
                field_style(app.focus == Focus::Category),
            ),
        ]),
    ];

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(field_style(app.focus.is_form()))
            .title(" Add Expense (Enter to save) "),
    );
    f.render_widget(form, area);
}

fn render_history<S: KeyValueStorage>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let header_cells = ["Date", "Title", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .store
        .expenses()
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.date.clone()),
                Cell::from(truncate(&e.title, 28)),
                Cell::from(e.category.as_str())
                    .style(Style::default().fg(to_color(e.category.index()))),
                Cell::from(app.display.format_amount(e.amount)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(field_style(app.focus == Focus::History))
            .title(" History "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.history_state);
}

fn render_trend(f: &mut Frame, area: Rect, view: &DerivedView) {
    let points: Vec<(f64, f64)> = view
        .trend
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect();

    let x_max = points.len().saturating_sub(1).max(1) as f64;
    let y_max = if view.trend_max() > 0.0 { view.trend_max() * 1.1 } else { 1.0 };

    let x_labels: Vec<Span> = match (view.trend.first(), view.trend.last()) {
        (Some(first), Some(last)) => {
            vec![Span::raw(first.label.clone()), Span::raw(last.label.clone())]
        }
        _ => vec![Span::raw("")],
    };

    let dataset = Dataset::default()
        .name("Spending")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Trend "),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_breakdown<S: KeyValueStorage>(
    f: &mut Frame,
    area: Rect,
    app: &App<S>,
    view: &DerivedView,
) {
    let bars: Vec<Bar> = view
        .breakdown
        .iter()
        .map(|slice| {
            let color = rgb(slice.color);
            Bar::default()
                .value(slice.value.max(0.0).round() as u64)
                .text_value(app.display.format_amount(slice.value))
                .label(Line::from(slice.category.as_str()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" By Category "),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(1);

    f.render_widget(chart, area);
}

fn render_status_bar<S: KeyValueStorage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut spans = match app.focus {
        Focus::History => vec![
            key(" ↑/↓"),
            Span::raw(" Select | "),
            key("d"),
            Span::raw(" Delete | "),
            key("c"),
            Span::raw(" Clear all | "),
            key("a"),
            Span::raw(" Add | "),
        ],
        Focus::Category => vec![
            key(" ←/→"),
            Span::raw(" Category | "),
            key("Enter"),
            Span::raw(" Save | "),
        ],
        _ => vec![
            key(" Enter"),
            Span::raw(" Save | "),
            key("Esc"),
            Span::raw(" History | "),
        ],
    };
    spans.push(key("Tab"));
    spans.push(Span::raw(" Next field | "));
    spans.push(Span::styled("Ctrl-C", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    if let Some(status) = &app.status {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn render_confirm(f: &mut Frame, screen: Rect) {
    let area = centered(screen, 50, 5);

    let lines = vec![
        Line::from(Span::styled(
            CLEAR_PROMPT,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(Color::Red)),
            Span::raw(" Yes    "),
            Span::styled("[n]", Style::default().fg(Color::Green)),
            Span::raw(" No"),
        ]),
    ];

    let dialog = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Clear all "),
    );

    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn centered(screen: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(screen.width);
    let height = height.min(screen.height);
    Rect {
        x: screen.x + (screen.width - width) / 2,
        y: screen.y + (screen.height - height) / 2,
        width,
        height,
    }
}

fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

fn to_color(index: usize) -> Color {
    rgb(expense_tracker::PALETTE[index % expense_tracker::PALETTE.len()])
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
