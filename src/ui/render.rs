use std::collections::HashSet;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::app::{App, InputMode, Screen};
use super::commands;
use super::theme;
use super::util::format_amount;

/// Key bindings shown in the help overlay, two per row.
const KEYS: &[(&str, &str)] = &[
    ("j/k, Up/Down", "Move cursor"),
    ("1-2", "Switch tabs"),
    ("Tab/Shift-Tab", "Cycle tabs"),
    ("g/G", "Top/Bottom"),
    ("H/L", "Prev/Next month"),
    ("Ctrl-d/u", "Half page"),
    (":", "Command mode"),
    ("D", "Delete (Transactions)"),
    ("Esc", "Clear message"),
    ("q, Ctrl-q", "Quit"),
];

pub(crate) fn render(f: &mut Frame, app: &App) {
    let [tabs, body, status, command] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_tab_bar(f, tabs, app);
    match app.screen {
        Screen::Dashboard => super::screens::dashboard::render(f, body, app),
        Screen::Transactions => super::screens::transactions::render(f, body, app),
    }
    render_status_bar(f, status, app);
    render_command_bar(f, command, app);

    if app.show_help {
        render_help_overlay(f, f.area());
    }
}

fn render_tab_bar(f: &mut Frame, area: Rect, app: &App) {
    let titles = Screen::all().iter().enumerate().map(|(i, s)| {
        let label = Style::default().fg(theme::TEXT_DIM);
        let name = if *s == app.screen {
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            label
        };
        Line::from(vec![
            Span::styled(format!("{}:", i + 1), label),
            Span::styled(s.to_string(), name),
        ])
    });

    let tabs = Tabs::new(titles)
        .divider(Span::styled(" | ", Style::default().fg(theme::OVERLAY)))
        .style(Style::default().bg(theme::HEADER_BG));
    f.render_widget(tabs, area);
}

fn mode_color(mode: InputMode) -> Color {
    match mode {
        InputMode::Normal => theme::ACCENT,
        InputMode::Command => theme::GREEN,
        InputMode::Confirm => theme::RED,
    }
}

/// Mode badge, then month, owner and the month's net and budget state.
fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let base = theme::status_bar_style();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", app.input_mode),
            Style::default()
                .fg(theme::HEADER_BG)
                .bg(mode_color(app.input_mode))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " {} | {} | {} txns",
                app.current_month, app.owner, app.transaction_count
            ),
            base,
        ),
    ];

    if let Some(report) = &app.report {
        spans.push(Span::styled(" | net ", base));
        spans.push(Span::styled(
            format_amount(report.net),
            base.fg(theme::balance_color(report.net)),
        ));
        let flag = if report.budget_status.is_exceeded {
            Some("over budget")
        } else if report.budget_status.is_warning {
            Some("near budget")
        } else {
            None
        };
        if let Some(flag) = flag {
            spans.push(Span::styled(" | ", base));
            spans.push(Span::styled(
                flag,
                base.fg(theme::budget_color(&report.budget_status)),
            ));
        }
    }

    let hint = match app.screen {
        Screen::Dashboard => " :expense :income :budget | ? help ",
        Screen::Transactions => " D delete | :rename :recat | ? help ",
    };
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let pad = (area.width as usize).saturating_sub(used + hint.len());
    spans.push(Span::styled(" ".repeat(pad), base));
    spans.push(Span::styled(hint, base));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_command_bar(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => Line::from(vec![
            Span::styled(":", Style::default().fg(theme::ACCENT)),
            Span::styled(&app.command_input, theme::command_bar_style()),
        ]),
        InputMode::Confirm => Line::from(vec![
            Span::styled(&app.confirm_message, Style::default().fg(theme::YELLOW)),
            Span::styled(" [y/N] ", Style::default().fg(theme::RED)),
        ]),
        InputMode::Normal if app.status_message.is_empty() => Line::from(Span::styled(
            " Press : for commands, ? for help",
            theme::dim_style(),
        )),
        InputMode::Normal => Line::from(Span::styled(
            &app.status_message,
            theme::command_bar_style(),
        )),
    };

    f.render_widget(
        Paragraph::new(content).style(Style::default().bg(theme::COMMAND_BG)),
        area,
    );

    if app.input_mode == InputMode::Command {
        let offset = 1 + app.command_input.chars().count() as u16;
        f.set_cursor_position((area.x + offset, area.y));
    }
}

/// Rows for the `:` section, one per command, aliases skipped.
fn command_help_rows() -> Vec<(&'static str, &'static str)> {
    let mut rows: Vec<_> = commands::COMMANDS
        .iter()
        .filter(|(name, _)| name.len() > 2)
        .map(|(&name, cmd)| (name, cmd.description))
        .collect();
    rows.sort_unstable();
    let mut seen = HashSet::new();
    rows.retain(|(_, desc)| seen.insert(*desc));
    rows
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

fn render_help_overlay(f: &mut Frame, area: Rect) {
    let heading = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(theme::YELLOW)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let mut lines = vec![heading(" Keys")];
    for pair in KEYS.chunks(2) {
        let row: String = pair
            .iter()
            .map(|(key, action)| format!("  {key:<14} {action:<22}"))
            .collect();
        lines.push(Line::styled(row, theme::normal_style()));
    }
    lines.push(Line::from(""));
    lines.push(heading(" Commands"));
    for (name, desc) in command_help_rows() {
        lines.push(Line::styled(
            format!("  :{name:<14} {desc}"),
            theme::normal_style(),
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(" Press any key to close ", theme::dim_style()));

    let popup = centered(area, 80, lines.len() as u16 + 2);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" fintrack help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT))
                .style(Style::default().bg(theme::HEADER_BG)),
        ),
        popup,
    );
}
