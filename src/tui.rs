use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};
use std::io::stdout;

use crate::db::{ApplicationFilter, ApplicationSort, Database, JobFilter, JobSort};
use crate::models::{Application, ApplicationStatus, JobPosting};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Jobs,
    Applications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Url,
    Status,
    Notes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ApplicationForm {
    url: String,
    status: ApplicationStatus,
    notes: String,
    field: FormField,
}

impl ApplicationForm {
    fn new(url: String) -> Self {
        let field = if url.is_empty() { FormField::Url } else { FormField::Status };
        Self {
            url,
            status: ApplicationStatus::default(),
            notes: String::new(),
            field,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Url => FormField::Status,
            FormField::Status => FormField::Notes,
            FormField::Notes => FormField::Url,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Url => FormField::Notes,
            FormField::Status => FormField::Url,
            FormField::Notes => FormField::Status,
        };
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Url => Some(&mut self.url),
            FormField::Notes => Some(&mut self.notes),
            FormField::Status => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
    Form(ApplicationForm),
}

struct AppState {
    tab: Tab,
    mode: Mode,
    jobs: Vec<JobPosting>,
    applications: Vec<Application>,
    job_sort: JobSort,
    app_sort: ApplicationSort,
    /// Title/company text on the Jobs tab.
    job_filter: String,
    /// URL substring on the Applications tab.
    app_filter: String,
    selected_job: usize,
    selected_app: usize,
    show_detail: bool,
    scroll_offset: u16,
    message: Option<String>,
}

impl AppState {
    fn new() -> Self {
        Self {
            tab: Tab::Jobs,
            mode: Mode::Browse,
            jobs: Vec::new(),
            applications: Vec::new(),
            job_sort: JobSort::default(),
            app_sort: ApplicationSort::default(),
            job_filter: String::new(),
            app_filter: String::new(),
            selected_job: 0,
            selected_app: 0,
            show_detail: true,
            scroll_offset: 0,
            message: None,
        }
    }

    /// Re-reads both tables with their own filter and sort.
    fn reload(&mut self, db: &Database) -> Result<()> {
        let non_empty = |f: &str| Some(f.to_string()).filter(|f| !f.trim().is_empty());
        self.jobs = db.get_jobs(
            &JobFilter {
                text: non_empty(&self.job_filter),
                ..Default::default()
            },
            &self.job_sort,
        )?;
        self.applications = db.get_applications(
            &ApplicationFilter {
                url: non_empty(&self.app_filter),
                ..Default::default()
            },
            &self.app_sort,
        )?;
        self.selected_job = self.selected_job.min(self.jobs.len().saturating_sub(1));
        self.selected_app = self.selected_app.min(self.applications.len().saturating_sub(1));
        Ok(())
    }

    fn filter(&self) -> &str {
        match self.tab {
            Tab::Jobs => self.job_filter.as_str(),
            Tab::Applications => self.app_filter.as_str(),
        }
    }

    fn filter_mut(&mut self) -> &mut String {
        match self.tab {
            Tab::Jobs => &mut self.job_filter,
            Tab::Applications => &mut self.app_filter,
        }
    }

    fn current_job(&self) -> Option<&JobPosting> {
        self.jobs.get(self.selected_job)
    }

    fn current_application(&self) -> Option<&Application> {
        self.applications.get(self.selected_app)
    }

    fn next(&mut self) {
        let (selected, len) = match self.tab {
            Tab::Jobs => (&mut self.selected_job, self.jobs.len()),
            Tab::Applications => (&mut self.selected_app, self.applications.len()),
        };
        if len > 0 && *selected < len - 1 {
            *selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        let selected = match self.tab {
            Tab::Jobs => &mut self.selected_job,
            Tab::Applications => &mut self.selected_app,
        };
        if *selected > 0 {
            *selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn sort_label(&self) -> String {
        let (label, descending) = match self.tab {
            Tab::Jobs => (self.job_sort.field.label(), self.job_sort.descending),
            Tab::Applications => (self.app_sort.field.label(), self.app_sort.descending),
        };
        format!("{} {}", label, if descending { "desc" } else { "asc" })
    }

    /// Handles one key press. Returns false when the dashboard should close.
    fn handle_key(&mut self, code: KeyCode, db: &Database) -> bool {
        let result = match self.mode.clone() {
            Mode::Browse => return self.handle_browse_key(code, db),
            Mode::Filter => self.handle_filter_key(code, db),
            Mode::Form(form) => self.handle_form_key(code, form, db),
        };
        if let Err(e) = result {
            self.message = Some(format!("Error: {:#}", e));
        }
        true
    }

    fn handle_browse_key(&mut self, code: KeyCode, db: &Database) -> bool {
        self.message = None;
        let result = match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab | KeyCode::BackTab => {
                self.tab = match self.tab {
                    Tab::Jobs => Tab::Applications,
                    Tab::Applications => Tab::Jobs,
                };
                Ok(())
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.next();
                Ok(())
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.prev();
                Ok(())
            }
            KeyCode::Char('J') | KeyCode::PageDown => {
                self.scroll_down();
                Ok(())
            }
            KeyCode::Char('K') | KeyCode::PageUp => {
                self.scroll_up();
                Ok(())
            }
            KeyCode::Enter => {
                self.show_detail = !self.show_detail;
                Ok(())
            }
            KeyCode::Char('s') => {
                match self.tab {
                    Tab::Jobs => self.job_sort.field = self.job_sort.field.next(),
                    Tab::Applications => self.app_sort.field = self.app_sort.field.next(),
                }
                self.reload(db)
            }
            KeyCode::Char('r') => {
                match self.tab {
                    Tab::Jobs => self.job_sort.descending = !self.job_sort.descending,
                    Tab::Applications => self.app_sort.descending = !self.app_sort.descending,
                }
                self.reload(db)
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Filter;
                Ok(())
            }
            KeyCode::Char('g') => {
                self.message = Some("Reloaded".to_string());
                self.reload(db)
            }
            KeyCode::Char('a') => {
                let url = match self.tab {
                    Tab::Jobs => self.current_job().map(|j| j.url.clone()).unwrap_or_default(),
                    Tab::Applications => String::new(),
                };
                self.mode = Mode::Form(ApplicationForm::new(url));
                Ok(())
            }
            KeyCode::Char('n') | KeyCode::Right if self.tab == Tab::Applications => {
                self.step_application_status(db, ApplicationStatus::next)
            }
            KeyCode::Char('p') | KeyCode::Left if self.tab == Tab::Applications => {
                self.step_application_status(db, ApplicationStatus::prev)
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.message = Some(format!("Error: {:#}", e));
        }
        true
    }

    fn handle_filter_key(&mut self, code: KeyCode, db: &Database) -> Result<()> {
        match code {
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.selected_job = 0;
                self.selected_app = 0;
                self.reload(db)?;
            }
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.filter_mut().clear();
                self.reload(db)?;
            }
            KeyCode::Backspace => {
                self.filter_mut().pop();
            }
            KeyCode::Char(c) => self.filter_mut().push(c),
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, code: KeyCode, mut form: ApplicationForm, db: &Database) -> Result<()> {
        match code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.message = Some("Cancelled".to_string());
                return Ok(());
            }
            KeyCode::Enter => return self.submit_form(form, db),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left if form.field == FormField::Status => form.status = form.status.prev(),
            KeyCode::Right if form.field == FormField::Status => form.status = form.status.next(),
            KeyCode::Backspace => {
                if let Some(text) = form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.text_mut() {
                    text.push(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::Form(form);
        Ok(())
    }

    fn submit_form(&mut self, form: ApplicationForm, db: &Database) -> Result<()> {
        let url = form.url.trim();
        if url.is_empty() {
            self.message = Some("Job URL is required".to_string());
            self.mode = Mode::Form(form);
            return Ok(());
        }

        let mut app = Application::new(url, form.status);
        app.notes = Some(form.notes.trim().to_string()).filter(|n| !n.is_empty());

        let id = db.add_application(&app)?;
        self.mode = Mode::Browse;
        self.reload(db)?;
        self.message = Some(format!("Added application #{} ({})", id, app.status));
        Ok(())
    }

    fn step_application_status(
        &mut self,
        db: &Database,
        step: fn(ApplicationStatus) -> ApplicationStatus,
    ) -> Result<()> {
        let Some(app) = self.current_application() else {
            return Ok(());
        };
        let Some(id) = app.id else {
            return Ok(());
        };
        let status = step(app.status);
        db.update_application_status(id, status)?;
        self.reload(db)?;
        self.message = Some(format!("Application #{} is now {}", id, status));
        Ok(())
    }
}

pub fn run_dashboard(db: &Database) -> Result<()> {
    let mut state = AppState::new();
    state.reload(db)?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !state.handle_key(key.code, db) {
                break;
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let tabs = Tabs::new(vec![
        format!(" Jobs ({}) ", state.jobs.len()),
        format!(" Applications ({}) ", state.applications.len()),
    ])
    .select(match state.tab {
        Tab::Jobs => 0,
        Tab::Applications => 1,
    })
    .block(Block::default().borders(Borders::ALL).title(format!(
        " job-board | sort: {} | filter: {} ",
        state.sort_label(),
        if state.filter().is_empty() { "-" } else { state.filter() }
    )))
    .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, rows[0]);

    match state.tab {
        Tab::Jobs => draw_jobs(frame, state, rows[1]),
        Tab::Applications => draw_applications(frame, state, rows[1]),
    }

    frame.render_widget(footer(state), rows[2]);

    if let Mode::Form(form) = &state.mode {
        draw_form(frame, form);
    }
}

fn footer(state: &AppState) -> Paragraph<'_> {
    let (text, style) = match (&state.mode, &state.message) {
        (Mode::Filter, _) => (
            format!(" /{}  (Enter: apply  Esc: clear)", state.filter()),
            Style::default().fg(Color::Yellow),
        ),
        (Mode::Form(_), Some(msg)) | (Mode::Browse, Some(msg)) => {
            (format!(" {}", msg), Style::default().fg(Color::Green))
        }
        (Mode::Form(_), None) => (
            " Tab:next field  ←/→:status  Enter:save  Esc:cancel".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        (Mode::Browse, None) => {
            let keys = match state.tab {
                Tab::Jobs => " j/k:navigate  J/K:scroll  Enter:detail  s:sort r:reverse  /:filter  a:add application  Tab:applications  q:quit",
                Tab::Applications => " j/k:navigate  n/p:status  s:sort r:reverse  /:filter  a:add  Tab:jobs  q:quit",
            };
            (keys.to_string(), Style::default().fg(Color::DarkGray))
        }
    };
    Paragraph::new(text).style(style)
}

fn score_style(score: Option<i64>) -> Style {
    match score {
        Some(s) if s >= 8 => Style::default().fg(Color::Green),
        Some(s) if s >= 5 => Style::default().fg(Color::Yellow),
        Some(_) => Style::default().fg(Color::Red),
        None => Style::default().fg(Color::DarkGray),
    }
}

fn status_style(status: ApplicationStatus) -> Style {
    match status {
        ApplicationStatus::Applied => Style::default().fg(Color::Cyan),
        ApplicationStatus::Interviewing => Style::default().fg(Color::Yellow),
        ApplicationStatus::Rejected => Style::default().fg(Color::Red),
        ApplicationStatus::Offer => Style::default().fg(Color::Green),
    }
}

fn draw_jobs(frame: &mut Frame, state: &AppState, area: Rect) {
    let chunks = if state.show_detail {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(area)
    };

    let header = Row::new(["SCORE", "TITLE", "COMPANY", "LOCATION", "SALARY"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = state
        .jobs
        .iter()
        .map(|job| {
            let score = job.resume_score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(score).style(score_style(job.resume_score)),
                Cell::from(job.title.clone()),
                Cell::from(job.company.clone()),
                Cell::from(job.location.clone().unwrap_or_default()),
                Cell::from(job.salary_range().unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Percentage(35),
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Jobs "))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut table_state = TableState::default().with_selected(
        (!state.jobs.is_empty()).then_some(state.selected_job),
    );
    frame.render_stateful_widget(table, chunks[0], &mut table_state);

    if state.show_detail {
        let width = chunks[1].width.saturating_sub(4).max(20) as usize;
        let detail = Paragraph::new(build_detail(state, width))
            .block(Block::default().borders(Borders::ALL).title(" Detail "))
            .wrap(Wrap { trim: false })
            .scroll((state.scroll_offset, 0));
        frame.render_widget(detail, chunks[1]);
    }
}

fn build_detail(state: &AppState, width: usize) -> Text<'_> {
    let Some(job) = state.current_job() else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", job.company)));
    lines.push(Line::from(Span::styled(
        format!(
            "Fit score: {}",
            job.resume_score.map(|s| format!("{}/10", s)).unwrap_or_else(|| "-".to_string())
        ),
        score_style(job.resume_score),
    )));
    lines.push(Line::from(format!("URL: {}", job.url)));

    if let Some(location) = &job.location {
        let remote = if job.remote == Some(true) { " (remote)" } else { "" };
        lines.push(Line::from(format!("Location: {}{}", location, remote)));
    }
    if let Some(kind) = &job.employment_type {
        lines.push(Line::from(format!("Type: {}", kind)));
    }
    if let Some(salary) = job.salary_range() {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    if let Some(date) = &job.post_date {
        lines.push(Line::from(format!("Posted: {}", date)));
    }
    if let Some(matched) = job.matched_keywords.as_deref().filter(|m| !m.is_empty()) {
        lines.push(Line::from(format!(
            "Keywords ({}): {}",
            job.keyword_score.unwrap_or_default(),
            matched
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Parsed: {} [{}]", job.parsed_at, job.status),
        Style::default().fg(Color::DarkGray),
    )));

    let sections = [
        ("Requirements", &job.requirements),
        ("Responsibilities", &job.responsibilities),
        ("Description", &job.description),
        ("Notes", &job.notes),
    ];
    for (label, value) in sections {
        let Some(value) = value else { continue };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            label,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in textwrap::fill(value, width).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
    }

    Text::from(lines)
}

fn draw_applications(frame: &mut Frame, state: &AppState, area: Rect) {
    let header = Row::new(["ID", "DATE", "STATUS", "JOB", "NOTES"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = state
        .applications
        .iter()
        .map(|app| {
            Row::new(vec![
                Cell::from(app.id.map(|id| id.to_string()).unwrap_or_default()),
                Cell::from(app.application_date.clone()),
                Cell::from(app.status.to_string()).style(status_style(app.status)),
                Cell::from(app.job_url.clone()),
                Cell::from(app.notes.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(11),
            Constraint::Length(13),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Applications "))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut table_state = TableState::default().with_selected(
        (!state.applications.is_empty()).then_some(state.selected_app),
    );
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn draw_form(frame: &mut Frame, form: &ApplicationForm) {
    let area = centered(frame.area(), 70, 9);
    frame.render_widget(Clear, area);

    let field_style = |field: FormField| {
        if form.field == field {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("URL:    ", field_style(FormField::Url)),
            Span::raw(form.url.as_str()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Status: ", field_style(FormField::Status)),
            Span::styled(format!("< {} >", form.status), status_style(form.status)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Notes:  ", field_style(FormField::Notes)),
            Span::raw(form.notes.as_str()),
        ]),
    ];

    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Add application "))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height: height.min(area.height),
    }
}
