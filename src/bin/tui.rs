use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, Clear, List, ListItem, Paragraph, ListState, Wrap}, layout::{Layout, Constraint, Direction, Rect}, style::{Style, Modifier, Color}};

use taskboard::application::{board::{Frame, TaskBoard}, confirm::{Answer, ConfirmRequest, Confirmed}, preferences::{Theme, ThemePreference}, task_store::TaskStore};
use taskboard::config::{AppConfig, StorageKind};
use taskboard::domain::{error::TaskError, storage::KeyValueStorage, task::{parse_due_date, Priority, TaskDraft, TaskId}};
use taskboard::infrastructure::{memory_storage::MemoryStorage, sqlite_storage::SqliteKeyValueStorage};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;
    match config.storage {
        StorageKind::Sqlite => {
            let storage = SqliteKeyValueStorage::connect(&config.database_url).await?;
            storage.init().await?;
            run(storage).await
        }
        StorageKind::Memory => run(MemoryStorage::new()).await,
    }
}

async fn run<S: KeyValueStorage + Clone>(storage: S) -> Result<()> {
    let board = TaskBoard::new(TaskStore::load(storage.clone()).await?);
    let theme = ThemePreference::load(storage).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, board, theme).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, PartialEq, Eq)]
enum Mode { View, Form, Search, Confirm(ConfirmRequest) }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field { Title, Description, DueDate, Priority }

impl Field {
    fn next(self) -> Self {
        match self { Field::Title => Field::Description, Field::Description => Field::DueDate, Field::DueDate => Field::Priority, Field::Priority => Field::Title }
    }
}

struct Form {
    field: Field,
    title: String,
    description: String,
    due_date: String,
    priority: Priority,
}

impl Form {
    fn empty() -> Self {
        Self { field: Field::Title, title: String::new(), description: String::new(), due_date: String::new(), priority: Priority::Normal }
    }

    fn from_draft(draft: TaskDraft) -> Self {
        Self {
            field: Field::Title,
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            priority: draft.priority,
        }
    }

    fn active_text(&mut self) -> Option<&mut String> {
        match self.field {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::DueDate => Some(&mut self.due_date),
            Field::Priority => None,
        }
    }

    fn cycle_priority(&mut self) {
        self.priority = match self.priority { Priority::High => Priority::Normal, Priority::Normal => Priority::Low, _ => Priority::High };
    }

    fn to_draft(&self) -> Result<TaskDraft, String> {
        let due_date = match parse_due_date(&self.due_date) {
            Some(date) => Some(date),
            None if self.due_date.trim().is_empty() => None,
            None => return Err("Due date must be YYYY-MM-DD.".to_string()),
        };
        Ok(TaskDraft { title: self.title.clone(), description: self.description.clone(), due_date, priority: self.priority.clone() })
    }
}

struct App<S: KeyValueStorage> {
    board: TaskBoard<S>,
    theme: ThemePreference<S>,
    mode: Mode,
    selected: usize,
    list_state: ListState,
    form: Form,
    status: Option<String>,
}

impl<S: KeyValueStorage> App<S> {
    fn selected_id(&self, frame: &Frame) -> Option<TaskId> {
        frame.projection.items.get(self.selected).map(|t| t.id)
    }

    fn clamp_selection(&mut self, len: usize) {
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }

    fn report(&mut self, err: TaskError) { self.status = Some(err.to_string()); }

    async fn submit_form(&mut self) {
        let draft = match self.form.to_draft() {
            Ok(draft) => draft,
            Err(msg) => { self.status = Some(msg); return; }
        };
        match self.board.submit(draft).await {
            Ok(_) => { self.mode = Mode::View; self.status = None; }
            // Keep the form open so the title can be fixed
            Err(err @ TaskError::Validation(_)) => self.report(err),
            Err(err) => { self.mode = Mode::View; self.report(err); }
        }
    }

    async fn confirm(&mut self, request: ConfirmRequest) {
        let result = match request {
            ConfirmRequest::DeleteTask { id, .. } => self.board.delete(id, &mut Answer(true)).await.map(|_| None),
            ConfirmRequest::ClearCompleted { .. } => self.board.clear_completed(&mut Answer(true)).await.map(|outcome| match outcome {
                Confirmed::Applied(n) => Some(format!("Removed {n} completed task(s).")),
                Confirmed::Declined => None,
            }),
        };
        match result {
            Ok(message) => self.status = message,
            Err(err) => self.report(err),
        }
        self.mode = Mode::View;
    }
}

async fn run_app<S: KeyValueStorage>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, board: TaskBoard<S>, theme: ThemePreference<S>) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { board, theme, mode: Mode::View, selected: 0, list_state: ListState::default(), form: Form::empty(), status: None };

    loop {
        let frame = app.board.render();
        app.clamp_selection(frame.projection.items.len());
        terminal.draw(|f| draw(f, &mut app, &frame))?;

        if !event::poll(tick_rate)? { continue; }
        let Event::Key(key) = event::read()? else { continue };
        // Only act on key presses; ignore repeats and releases to prevent duplicate input
        if key.kind != KeyEventKind::Press { continue; }

        match app.mode.clone() {
            Mode::View => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Up | KeyCode::Char('k') => { if app.selected > 0 { app.selected -= 1; } }
                KeyCode::Down | KeyCode::Char('j') => { if app.selected + 1 < frame.projection.items.len() { app.selected += 1; } }
                KeyCode::Char(' ') | KeyCode::Enter => {
                    if let Some(task) = frame.projection.items.get(app.selected) {
                        if let Err(err) = app.board.toggle(task.id, !task.completed).await { app.report(err); }
                    }
                }
                KeyCode::Char('n') => {
                    app.board.cancel_edit();
                    app.form = Form::empty();
                    app.mode = Mode::Form;
                }
                KeyCode::Char('e') => {
                    if let Some(draft) = app.selected_id(&frame).and_then(|id| app.board.begin_edit(id)) {
                        app.form = Form::from_draft(draft);
                        app.mode = Mode::Form;
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(task) = frame.projection.items.get(app.selected) {
                        app.mode = Mode::Confirm(ConfirmRequest::DeleteTask { id: task.id, title: task.title.clone() });
                    }
                }
                KeyCode::Char('c') => {
                    if frame.can_clear_completed {
                        app.mode = Mode::Confirm(ConfirmRequest::ClearCompleted { count: frame.projection.counts.completed });
                    }
                }
                KeyCode::Char('f') => { let next = app.board.view().filter.next(); app.board.set_filter(next); }
                KeyCode::Char('s') => { let next = app.board.view().sort.next(); app.board.set_sort(next); }
                KeyCode::Char('/') => { app.mode = Mode::Search; }
                KeyCode::Char('t') => {
                    if let Err(err) = app.theme.toggle().await { app.status = Some(format!("failed to save theme: {err}")); }
                }
                _ => {}
            },
            Mode::Search => match key.code {
                KeyCode::Esc | KeyCode::Enter => { app.mode = Mode::View; }
                KeyCode::Backspace => { let mut q = app.board.view().query.clone(); q.pop(); app.board.set_query(q); }
                KeyCode::Char(c) => { let mut q = app.board.view().query.clone(); q.push(c); app.board.set_query(q); }
                _ => {}
            },
            Mode::Form => match key.code {
                KeyCode::Esc => { app.board.cancel_edit(); app.mode = Mode::View; app.status = None; }
                KeyCode::Enter => app.submit_form().await,
                KeyCode::Tab => { app.form.field = app.form.field.next(); }
                KeyCode::Left | KeyCode::Right if app.form.field == Field::Priority => app.form.cycle_priority(),
                KeyCode::Char(' ') if app.form.field == Field::Priority => app.form.cycle_priority(),
                KeyCode::Backspace => { if let Some(text) = app.form.active_text() { text.pop(); } }
                KeyCode::Char(c) => { if let Some(text) = app.form.active_text() { text.push(c); } }
                _ => {}
            },
            Mode::Confirm(request) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm(request).await,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => { app.mode = Mode::View; }
                _ => {}
            },
        }
    }
    Ok(())
}

fn accent(theme: Theme) -> Color {
    match theme { Theme::Light => Color::Cyan, Theme::Dark => Color::Yellow }
}

fn draw<S: KeyValueStorage>(f: &mut ratatui::Frame, app: &mut App<S>, frame: &Frame) {
    let accent = accent(app.theme.theme());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    let counts = frame.projection.counts;
    let view = app.board.view();
    let header = Paragraph::new(format!(
        "Total {}  Pending {}  Completed {}  |  filter [{}]  sort [{}]  search [{}]",
        counts.total, counts.pending, counts.completed, view.filter.as_str(), view.sort.as_str(), view.query
    ))
    .block(Block::default().borders(Borders::ALL).title(format!("taskboard ({})", app.theme.theme().as_str())));
    f.render_widget(header, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let list_block = Block::default().borders(Borders::ALL).title("tasks");
    if frame.projection.items.is_empty() {
        let empty = Paragraph::new("No tasks yet. Add your first task above.").block(list_block);
        f.render_widget(empty, middle[0]);
    } else {
        let items: Vec<ListItem> = frame.projection.items.iter().map(|t| {
            let mark = if t.completed { "[x]" } else { "[ ]" };
            let due = t.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".to_string());
            let style = if t.completed { Style::default().add_modifier(Modifier::CROSSED_OUT | Modifier::DIM) } else { Style::default() };
            ListItem::new(format!("{} {:<7} {:<10} {}", mark, t.priority.label(), due, t.title)).style(style)
        }).collect();
        let list = List::new(items)
            .block(list_block)
            .highlight_style(Style::default().fg(accent).add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, middle[0], &mut app.list_state);
    }

    let detail = match frame.projection.items.get(app.selected) {
        Some(t) => format!(
            "Title:\n{}\n\nStatus: {}\nPriority: {}\nDue: {}\n\nDescription:\n{}",
            t.title,
            if t.completed { "Completed" } else { "Pending" },
            t.priority.label(),
            t.due_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "No due date".to_string()),
            t.description().unwrap_or("(no description)"),
        ),
        None => String::new(),
    };
    f.render_widget(Paragraph::new(detail).wrap(Wrap { trim: false }).block(Block::default().borders(Borders::ALL).title("details")), middle[1]);

    let (title, text) = match &app.mode {
        Mode::View => ("keys", "space: toggle  n: new  e: edit  d: delete  c: clear completed  f: filter  s: sort  /: search  t: theme  q: quit".to_string()),
        Mode::Search => ("search", format!("{}_  (Enter/Esc to close)", view.query)),
        Mode::Form => (frame.submit_label(), form_line(&app.form)),
        Mode::Confirm(_) => ("confirm", "y: yes  n: no".to_string()),
    };
    let text = match &app.status { Some(status) => format!("{status}  |  {text}"), None => text };
    let footer = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(footer, chunks[2]);

    if let Mode::Confirm(request) = &app.mode {
        let area = popup(f.size(), 50, 5);
        let detail = match request {
            ConfirmRequest::DeleteTask { title, .. } => format!("{}\n\"{}\"\n(y/n)", request.prompt(), title),
            ConfirmRequest::ClearCompleted { count } => format!("{}\n{} task(s)\n(y/n)", request.prompt(), count),
        };
        f.render_widget(Clear, area);
        f.render_widget(Paragraph::new(detail).wrap(Wrap { trim: true }).block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(accent)).title("confirm")), area);
    }
}

fn form_line(form: &Form) -> String {
    let field = |f: Field, label: &str, value: &str| {
        if form.field == f { format!("[{label}: {value}_]") } else { format!("{label}: {value}") }
    };
    format!(
        "{}  {}  {}  {}  (Tab: next field, Enter: save, Esc: cancel)",
        field(Field::Title, "Title", &form.title),
        field(Field::Description, "Desc", &form.description),
        field(Field::DueDate, "Due", &form.due_date),
        field(Field::Priority, "Priority", form.priority.as_str()),
    )
}

fn popup(area: Rect, width_pct: u16, height: u16) -> Rect {
    let width = area.width * width_pct / 100;
    let height = height.min(area.height);
    Rect { x: area.x + (area.width - width) / 2, y: area.y + (area.height - height) / 2, width, height }
}
