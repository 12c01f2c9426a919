// 🖥️ Terminal UI - subscriptions list, dashboard, detail panel

use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use subtrack::billing::BillingCycle;
use subtrack::dashboard::{self, DashboardSummary};
use subtrack::subscription::{Subscription, SubscriptionStatus};

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Subscriptions,
    Dashboard,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Subscriptions => Page::Dashboard,
            Page::Dashboard => Page::Subscriptions,
        }
    }

    pub fn previous(&self) -> Self {
        // Two pages: same as next
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Subscriptions => "Subscriptions",
            Page::Dashboard => "Dashboard",
        }
    }
}

pub struct App {
    pub subscriptions: Vec<Subscription>,
    pub filtered: Vec<Subscription>,
    pub status_filter: Option<SubscriptionStatus>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub summary: DashboardSummary,
    pub currency: String,
    pub now: DateTime<Utc>,
}

impl App {
    pub fn new(subscriptions: Vec<Subscription>, currency: &str, now: DateTime<Utc>) -> Self {
        let mut state = TableState::default();
        if !subscriptions.is_empty() {
            state.select(Some(0));
        }

        // Dashboard totals follow the active set, like the summary command
        let active: Vec<Subscription> = subscriptions.iter().filter(|s| s.is_active()).cloned().collect();
        let summary = dashboard::summarize(&active, now);

        Self {
            filtered: subscriptions.clone(),
            subscriptions,
            status_filter: None,
            state,
            current_page: Page::Subscriptions,
            show_detail: false,
            summary,
            currency: currency.to_string(),
            now,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_subscription(&self) -> Option<&Subscription> {
        self.state.selected().and_then(|i| self.filtered.get(i))
    }

    pub fn apply_filter(&mut self, status: Option<SubscriptionStatus>) {
        self.status_filter = status;
        self.filtered = match status {
            None => self.subscriptions.clone(),
            Some(status) => self
                .subscriptions
                .iter()
                .filter(|s| s.status == status)
                .cloned()
                .collect(),
        };

        if self.filtered.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
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

    if let Err(err) = res {
        tracing::error!(error = %err, "TUI loop failed");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('a') => app.apply_filter(Some(SubscriptionStatus::Active)),
                KeyCode::Char('p') => app.apply_filter(Some(SubscriptionStatus::Paused)),
                KeyCode::Char('x') => app.apply_filter(Some(SubscriptionStatus::Cancelled)),
                KeyCode::Char('c') => app.apply_filter(None),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home if !app.filtered.is_empty() => app.state.select(Some(0)),
                KeyCode::End if !app.filtered.is_empty() => {
                    app.state.select(Some(app.filtered.len() - 1))
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Subscriptions if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            render_table(f, content_chunks[0], app);
            render_detail_panel(f, content_chunks[1], app);
        }
        Page::Subscriptions => render_table(f, chunks[1], app),
        Page::Dashboard => render_dashboard(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Subscriptions, Page::Dashboard].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", app.subscriptions.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{:.2} {}/mo", app.summary.total_monthly, app.currency),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("{:.2} {}/yr", app.summary.total_yearly, app.currency),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn status_color(status: SubscriptionStatus) -> Color {
    match status {
        SubscriptionStatus::Active => Color::Green,
        SubscriptionStatus::Paused => Color::Yellow,
        SubscriptionStatus::Cancelled => Color::Red,
        SubscriptionStatus::Expired => Color::DarkGray,
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Name", "Price", "Cycle", "Monthly", "Next Charge", "Category", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered.iter().map(|sub| {
        let color = status_color(sub.status);
        let next = sub
            .upcoming_charge_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());

        Row::new(vec![
            Cell::from(truncate(&sub.name, 28)),
            Cell::from(format!("{:.2} {}", sub.price, sub.currency)),
            Cell::from(sub.billing_cycle.as_str()),
            Cell::from(format!("{:.2}", sub.monthly_equivalent())),
            Cell::from(next),
            Cell::from(truncate(&sub.category, 18)),
            Cell::from(sub.status.as_str()).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Subscriptions "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    let summary = &app.summary;
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    // Category breakdown + cycle mix
    let mut lines = vec![Line::from("")];
    for (category, monthly) in &summary.category_breakdown {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<22}", truncate(category, 22)), heading),
            Span::raw(format!("{:>10.2} {}/mo", monthly, app.currency)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("  ─────────────────────────────────────"));
    let active: Vec<Subscription> = app.subscriptions.iter().filter(|s| s.is_active()).cloned().collect();
    for (cycle, monthly) in dashboard::breakdown_by_cycle(&active) {
        lines.push(Line::from(vec![
            Span::styled(format!("  per {:<18}", cycle.interval_display()), heading),
            Span::raw(format!("{:>10.2} {}/mo", monthly, app.currency)),
        ]));
    }
    let breakdown = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" By Category "),
    );
    f.render_widget(breakdown, columns[0]);

    // Top subscriptions
    let top: Vec<Line> = summary
        .top_subscriptions
        .iter()
        .enumerate()
        .map(|(i, ranked)| {
            Line::from(vec![
                Span::styled(format!("  {}. ", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(format!("{:<26}", truncate(&ranked.subscription.name, 26))),
                Span::styled(
                    format!("{:>9.2}/mo", ranked.monthly_cost),
                    Style::default().fg(Color::Green),
                ),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(top).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Most Expensive "),
        ),
        right[0],
    );

    // Upcoming charges
    let upcoming: Vec<Line> = summary
        .upcoming_payments
        .iter()
        .map(|payment| {
            let color = if payment.days_until <= i64::from(payment.subscription.reminder_days) {
                Color::Red
            } else {
                Color::White
            };
            Line::from(vec![
                Span::styled(format!("  {} ", payment.charge_date), Style::default().fg(Color::Cyan)),
                Span::raw(format!("{:<24}", truncate(&payment.subscription.name, 24))),
                Span::styled(format!("in {} days", payment.days_until), Style::default().fg(color)),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(upcoming).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Upcoming (as of {}) ", app.now.date_naive())),
        ),
        right[1],
    );
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.filtered.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(status) = app.status_filter {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", status),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    for (key, label) in [
        ("Enter", " Details | "),
        ("Tab", " Page | "),
        ("a/p/x", " Filter | "),
        ("↑/↓", " Nav | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn detail_line<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Subscription Details ");

    let Some(sub) = app.selected_subscription() else {
        f.render_widget(Paragraph::new("No subscription selected").block(block), area);
        return;
    };

    let today = app.now.date_naive();
    let next = match (sub.upcoming_charge_date(), sub.days_until_billing(today)) {
        (Some(date), Some(days)) => format!("{} ({} days)", date, days),
        _ => "-".to_string(),
    };
    let cost_note = if sub.billing_cycle == BillingCycle::Monthly {
        String::new()
    } else {
        format!(" per {}", sub.billing_cycle.interval_display())
    };

    let mut content = vec![
        Line::from(""),
        detail_line("  Name: ", sub.name.clone()),
        detail_line("  Price: ", format!("{:.2} {}{}", sub.price, sub.currency, cost_note)),
        detail_line("  Monthly: ", format!("{:.2}", sub.monthly_equivalent())),
        detail_line("  Yearly: ", format!("{:.2}", sub.yearly_equivalent())),
        detail_line("  Category: ", sub.category.clone()),
        Line::from(vec![
            Span::styled("  Status: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(sub.status.as_str(), Style::default().fg(status_color(sub.status))),
        ]),
        Line::from(""),
        detail_line("  Started: ", sub.start_date.to_string()),
        detail_line("  Next charge: ", next),
        detail_line("  Reminder: ", format!("{} days before", sub.reminder_days)),
        detail_line("  Auto-renew: ", if sub.auto_renew { "yes" } else { "no" }.to_string()),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(vec![Span::styled(
            "  PAYMENTS",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        detail_line("  Count: ", sub.payment_count.to_string()),
        detail_line("  Total spent: ", format!("{:.2} {}", sub.total_spent, sub.currency)),
        detail_line(
            "  Last paid: ",
            sub.last_payment_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        ),
    ];

    if let Some(website) = &sub.website {
        content.push(detail_line("  Website: ", website.clone()));
    }
    if !sub.notes.is_empty() {
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                wrap_text(&sub.notes, 35),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }
    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n  ")
}
