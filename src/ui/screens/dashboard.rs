use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::analytics::{top_categories, MonthReport};
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_percent, truncate};

const TOP_CATEGORIES: usize = 5;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(report) = app.report.as_ref() else {
        render_unavailable(f, area, app.load_error.as_deref());
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Summary cards
            Constraint::Length(3), // Budget gauge
            Constraint::Min(8),    // Category breakdown
            Constraint::Length(10), // Trend
        ])
        .split(area);

    render_summary_cards(f, chunks[0], report);
    render_budget_gauge(f, chunks[1], report);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);
    render_spending_chart(f, middle[0], report);
    render_top_categories(f, middle[1], report);

    render_trend_chart(f, chunks[3], report);
}

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        ))
}

fn render_unavailable(f: &mut Frame, area: Rect, error: Option<&str>) {
    let text = match error {
        Some(e) => vec![
            Line::from(""),
            Line::from(Span::styled("Could not load data", theme::expense_style())),
            Line::from(Span::styled(e.to_string(), theme::dim_style())),
        ],
        None => vec![Line::from(""), Line::from(Span::styled("Loading…", theme::dim_style()))],
    };
    f.render_widget(Paragraph::new(text).centered().block(titled_block("Dashboard")), area);
}

fn render_summary_cards(f: &mut Frame, area: Rect, report: &MonthReport) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    render_card(
        f,
        cards[0],
        "Expenses",
        report.expenses.total,
        theme::RED,
        format!(
            "{} txns, avg {}",
            report.expenses.count,
            format_amount(report.expenses.average)
        ),
    );
    render_card(
        f,
        cards[1],
        "Income",
        report.income.total,
        theme::GREEN,
        format!(
            "{} txns, avg {}",
            report.income.count,
            format_amount(report.income.average)
        ),
    );
    render_card(
        f,
        cards[2],
        "Net",
        report.net,
        theme::balance_color(report.net),
        "income − expenses".into(),
    );
    match &report.budget {
        Some(budget) => render_card(
            f,
            cards[3],
            "Budget Left",
            report.budget_status.remaining,
            theme::budget_color(&report.budget_status),
            format!("of {}", format_amount(budget.amount)),
        ),
        None => render_card(
            f,
            cards[3],
            "Budget Left",
            Decimal::ZERO,
            theme::TEXT_DIM,
            "no budget (:budget <amount>)".into(),
        ),
    }
}

fn render_card(f: &mut Frame, area: Rect, title: &str, amount: Decimal, color: Color, subtitle: String) {
    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            format_amount(amount),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(titled_block(title));

    f.render_widget(text, area);
}

fn render_budget_gauge(f: &mut Frame, area: Rect, report: &MonthReport) {
    let status = &report.budget_status;
    let block = titled_block("Budget");
    if report.budget.is_none() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No budget set for this month",
            theme::dim_style(),
        )))
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let ratio = (status.percentage_used / Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let flag = if status.is_exceeded {
        " EXCEEDED"
    } else if status.is_warning {
        " WARNING"
    } else {
        ""
    };
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(theme::budget_color(status)).bg(theme::SURFACE))
        .ratio(ratio)
        .label(format!(
            "{} used of {}{flag}",
            format_percent(status.percentage_used),
            format_amount(report.budget.as_ref().map_or(Decimal::ZERO, |b| b.amount))
        ));
    f.render_widget(gauge, area);
}

fn render_spending_chart(f: &mut Frame, area: Rect, report: &MonthReport) {
    if report.expense_breakdown.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses this month. Add one with :expense",
            theme::dim_style(),
        )))
        .centered()
        .block(titled_block("Spending by Category"));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = report
        .expense_breakdown
        .iter()
        .map(|share| {
            Bar::default()
                .value(share.amount.round().to_u64().unwrap_or(0))
                .label(Line::from(truncate(&share.category, 10)))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(titled_block("Spending by Category"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(Style::default().fg(theme::TEXT));

    f.render_widget(chart, area);
}

fn render_top_categories(f: &mut Frame, area: Rect, report: &MonthReport) {
    let items: Vec<ListItem> = top_categories(&report.expense_breakdown, TOP_CATEGORIES)
        .iter()
        .enumerate()
        .map(|(i, share)| {
            let style = if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<14}", truncate(&share.category, 13)), style),
                Span::styled(format!("{:>12} ", format_amount(share.amount)), theme::expense_style()),
                Span::styled(format!("{:>6}", format_percent(share.percentage)), theme::dim_style()),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(titled_block("Top Categories")), area);
}

fn render_trend_chart(f: &mut Frame, area: Rect, report: &MonthReport) {
    let title = format!("Last {} Months (income / expenses)", report.trend.len());
    let mut chart = BarChart::default()
        .block(titled_block(&title))
        .bar_width(5)
        .bar_gap(1)
        .group_gap(3)
        .value_style(Style::default().fg(theme::HEADER_BG));

    for period in &report.trend {
        let bars = [
            Bar::default()
                .value(period.income.round().to_u64().unwrap_or(0))
                .style(theme::income_style()),
            Bar::default()
                .value(period.expenses.round().to_u64().unwrap_or(0))
                .style(theme::expense_style()),
        ];
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(period.label.clone()))
                .bars(&bars),
        );
    }

    f.render_widget(chart, area);
}
