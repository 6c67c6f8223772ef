//! Dashboard presentation: every widget is a pure function of the current
//! session, and derived values (merchant sort order, category bars, the
//! summed potential savings) are recomputed on each draw.

use moneylens_core::{AnalysisReport, HabitAudit, MerchantSummary, ReportBundle, Role};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph, Wrap},
};

use crate::dashboard::App;
use crate::fmt;

pub const HEADER_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);
const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

/// Score buckets as the gauge shows them: healthy, needs attention, off track.
pub fn score_color(score: f64) -> Color {
    if score >= 75.0 {
        Color::Green
    } else if score >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Stable color per category key; unrecognized keys fall back to dark gray.
pub fn category_color(key: &str) -> Color {
    match key {
        "dining" => Color::Magenta,
        "shopping" => Color::Cyan,
        "bill_payments" => Color::Blue,
        "travel" => Color::Green,
        "investments" => Color::Yellow,
        "others" => Color::Gray,
        "survival" => Color::Blue,
        "lifestyle" => Color::Magenta,
        "future" => Color::Green,
        _ => Color::DarkGray,
    }
}

/// Merchants by descending amount. The wire order is whatever the agent
/// felt like; display order is ours.
pub fn sorted_merchants(report: &AnalysisReport) -> Vec<&MerchantSummary> {
    let mut v: Vec<&MerchantSummary> = report.merchants().iter().collect();
    v.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    v
}

/// Clip to `width` chars, marking the cut with an ellipsis.
pub fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn category_bar(pct: f64, width: usize) -> String {
    let filled = ((pct / 100.0) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chat_h: u16 = if app.session.transcript().is_empty() { 0 } else { 8 };
    let [header_area, sep_area, body_area, chat_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(chat_h),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    draw_header(frame, header_area, app);

    let sep = "━".repeat(area.width as usize);
    frame.render_widget(Paragraph::new(sep).style(FOOTER_STYLE), sep_area);

    draw_body(frame, body_area, app);
    draw_chat(frame, chat_area, app);
    draw_input(frame, input_area, app);
    draw_footer(frame, footer_area, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let [left, right] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(40)]).areas(area);

    let today = chrono::Local::now().format("%b %d");
    frame.render_widget(
        Paragraph::new(format!(" Moneylens — {today}")).style(HEADER_STYLE),
        left,
    );

    let statement = match app.session.statement() {
        Some(s) => format!("{} ({} rows) ", s.name, s.row_count),
        None => "no statement ".to_string(),
    };
    frame.render_widget(
        Paragraph::new(statement)
            .style(FOOTER_STYLE)
            .right_aligned(),
        right,
    );
}

fn draw_body(frame: &mut Frame, area: Rect, app: &App) {
    match app.session.report() {
        Some(bundle) => draw_report(frame, area, app, bundle),
        None => draw_empty(frame, area, app),
    }
}

/// Pre-report banner: what to do next, or the in-flight stage label.
fn draw_empty(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![Line::from("")];
    if let Some(stage) = app.session.analyzing_stage() {
        lines.push(Line::from(Span::styled(
            format!("  {}", stage.label()),
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(s) = app.session.statement() {
        lines.push(Line::from(format!(
            "  Statement loaded: {} ({} transaction rows)",
            s.name, s.row_count
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Press a to send it to your money manager.",
            FOOTER_STYLE,
        )));
    } else {
        lines.push(Line::from("  No statement yet."));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Press o and type a path to a .csv export, or paste one into the terminal.",
            FOOTER_STYLE,
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_report(frame: &mut Frame, area: Rect, app: &App, bundle: &ReportBundle) {
    let report = &bundle.report;

    let habit_h: u16 = if report.habit_audit().is_some() { 6 } else { 0 };
    let note_rows = bundle
        .insights
        .len()
        .min(4)
        .max(report.recommendations().len().min(4));
    let notes_h: u16 = if note_rows > 0 { note_rows as u16 + 2 } else { 0 };

    let [stage_area, gauge_area, mid_area, habit_area, notes_area, txn_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Length(habit_h),
            Constraint::Length(notes_h),
            Constraint::Fill(1),
        ])
        .areas(area);

    if let Some(stage) = app.session.analyzing_stage() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {}", stage.label()),
                Style::default().fg(Color::Yellow),
            )),
            stage_area,
        );
    }

    draw_gauge(frame, gauge_area, report);

    let [cat_area, merch_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
            .areas(mid_area);
    draw_categories(frame, cat_area, report);
    draw_merchants(frame, merch_area, report);

    if let Some(audit) = report.habit_audit() {
        draw_habits(frame, habit_area, audit);
    }
    if notes_h > 0 {
        draw_notes(frame, notes_area, bundle);
    }
    draw_transactions(frame, txn_area, report, app.txn_scroll);
}

fn draw_gauge(frame: &mut Frame, area: Rect, report: &AnalysisReport) {
    let [info_area, bar_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

    let score = report.score();
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(" Financial alignment  "),
            Span::styled(
                format!("{score:.0}/100"),
                Style::default()
                    .fg(score_color(score))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "   {} transactions, {} total",
                    report.total_transactions(),
                    fmt::money(report.total_amount())
                ),
                FOOTER_STYLE,
            ),
        ])),
        info_area,
    );

    let gauge = LineGauge::default()
        .ratio((score / 100.0).clamp(0.0, 1.0))
        .filled_style(Style::default().fg(score_color(score)))
        .unfilled_style(FOOTER_STYLE)
        .line_set(ratatui::symbols::line::THICK);
    frame.render_widget(gauge, bar_area);
}

fn draw_categories(frame: &mut Frame, area: Rect, report: &AnalysisReport) {
    let mut lines = vec![Line::from(Span::styled(" Categories", TITLE_STYLE))];
    match report {
        AnalysisReport::Classic(r) => {
            for (key, c) in r.category_summary.entries() {
                lines.push(category_line(key, c.amount, c.percentage, c.count));
            }
        }
        AnalysisReport::Audit(r) => {
            for (key, c) in r.category_summary.entries() {
                lines.push(category_line(
                    key,
                    c.total_amount,
                    c.percentage,
                    c.transaction_count,
                ));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn category_line(key: &'static str, amount: f64, pct: f64, count: u64) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!(" {key:<14}")),
        Span::raw(format!("{:>12}  ", fmt::money(amount))),
        Span::raw(format!("{:>6}  ", fmt::percent(pct))),
        Span::raw(format!("{count:>4}  ")),
        Span::styled(
            category_bar(pct, 18),
            Style::default().fg(category_color(key)),
        ),
    ])
}

fn draw_merchants(frame: &mut Frame, area: Rect, report: &AnalysisReport) {
    let mut lines = vec![Line::from(Span::styled(" Top merchants", TITLE_STYLE))];
    let budget = area.height.saturating_sub(2) as usize;
    for m in sorted_merchants(report).into_iter().take(budget) {
        lines.push(Line::from(format!(
            " {:<22} {:>12}  {}x",
            clip(&m.merchant, 22),
            fmt::money(m.amount),
            m.count
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_habits(frame: &mut Frame, area: Rect, audit: &HabitAudit) {
    let [c1, c2, c3, c4] =
        Layout::horizontal([Constraint::Percentage(25); 4]).areas(area);

    let mut impulsive = vec![Line::from(Span::styled(" Impulsive buys", TITLE_STYLE))];
    for p in audit.impulsive_purchases.iter().take(4) {
        impulsive.push(Line::from(format!(
            " {} {}",
            clip(&p.merchant, 14),
            fmt::money(p.amount)
        )));
    }
    if audit.impulsive_purchases.is_empty() {
        impulsive.push(Line::from(Span::styled(" none flagged", FOOTER_STYLE)));
    }
    frame.render_widget(Paragraph::new(impulsive), c1);

    let mut dining = vec![Line::from(Span::styled(" High-cost dining", TITLE_STYLE))];
    for d in audit.high_cost_dining.iter().take(4) {
        dining.push(Line::from(format!(
            " {} {} ({} visits)",
            clip(&d.merchant, 12),
            fmt::money(d.total_amount),
            d.visit_count
        )));
    }
    if audit.high_cost_dining.is_empty() {
        dining.push(Line::from(Span::styled(" none flagged", FOOTER_STYLE)));
    }
    frame.render_widget(Paragraph::new(dining), c2);

    let mut subs = vec![Line::from(Span::styled(" Subscriptions", TITLE_STYLE))];
    for s in audit.subscription_analysis.iter().take(4) {
        subs.push(Line::from(format!(
            " {} {}/mo",
            clip(&s.service, 14),
            fmt::money(s.monthly_amount)
        )));
    }
    if audit.subscription_analysis.is_empty() {
        subs.push(Line::from(Span::styled(" none tracked", FOOTER_STYLE)));
    }
    frame.render_widget(Paragraph::new(subs), c3);

    let mut cuts = vec![Line::from(Span::styled(
        format!(
            " Cut back — save {}/mo",
            fmt::money(audit.potential_savings_total())
        ),
        TITLE_STYLE,
    ))];
    for c in audit.cut_back_opportunities.iter().take(4) {
        cuts.push(Line::from(format!(
            " {}: {}",
            clip(&c.category, 12),
            fmt::money(c.potential_savings)
        )));
    }
    if audit.cut_back_opportunities.is_empty() {
        cuts.push(Line::from(Span::styled(" nothing to trim", FOOTER_STYLE)));
    }
    frame.render_widget(Paragraph::new(cuts), c4);
}

fn draw_notes(frame: &mut Frame, area: Rect, bundle: &ReportBundle) {
    let recs = bundle.report.recommendations();
    if recs.is_empty() {
        let mut lines = vec![Line::from(Span::styled(" Insights", TITLE_STYLE))];
        for i in bundle.insights.iter().take(4) {
            lines.push(Line::from(format!(" - {i}")));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
        return;
    }

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let mut insights = vec![Line::from(Span::styled(" Insights", TITLE_STYLE))];
    for i in bundle.insights.iter().take(4) {
        insights.push(Line::from(format!(" - {i}")));
    }
    frame.render_widget(Paragraph::new(insights).wrap(Wrap { trim: false }), left);

    let mut lines = vec![Line::from(Span::styled(" Recommendations", TITLE_STYLE))];
    for r in recs.iter().take(4) {
        lines.push(Line::from(format!(" - {r}")));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), right);
}

fn draw_transactions(frame: &mut Frame, area: Rect, report: &AnalysisReport, scroll: usize) {
    let txns = report.transactions();
    if txns.is_empty() || area.height < 3 {
        return;
    }

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" Transactions ({})", txns.len()),
            TITLE_STYLE,
        )),
        Line::from(Span::styled(
            format!(" {:<12} {:<28} {:<16} {:>12}", "date", "merchant", "category", "amount"),
            FOOTER_STYLE,
        )),
    ];

    let visible = area.height.saturating_sub(2) as usize;
    for t in txns.iter().skip(scroll).take(visible) {
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<12} {:<28} ", clip(&t.date, 12), clip(&t.merchant, 28))),
            Span::styled(
                format!("{:<16} ", clip(&t.category, 16)),
                Style::default().fg(category_color(&t.category)),
            ),
            Span::raw(format!("{:>12}", fmt::money(t.amount))),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_chat(frame: &mut Frame, area: Rect, app: &App) {
    if area.height == 0 {
        return;
    }

    let turns = app.session.transcript();
    let start = turns.len().saturating_sub(8);

    let mut lines = Vec::new();
    for t in &turns[start..] {
        let (tag, color) = match t.role {
            Role::User => ("you", Color::Cyan),
            Role::Assistant => ("manager", Color::Magenta),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{tag}: "), Style::default().fg(color)),
            Span::raw(t.content.clone()),
        ]));
    }

    let block = Block::default().borders(Borders::ALL).title("conversation");
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_input(frame: &mut Frame, area: Rect, app: &App) {
    let (title, text, style) = if let Some(path) = &app.path_prompt {
        (
            "statement path",
            format!("{path}\u{2588}"),
            Style::default().fg(Color::White),
        )
    } else if app.input_focused {
        (
            "ask your money manager",
            format!("{}\u{2588}", app.input),
            Style::default().fg(Color::White),
        )
    } else if app.session.can_ask() {
        (
            "ask your money manager (press /)",
            app.input.clone(),
            FOOTER_STYLE,
        )
    } else {
        (
            "chat unlocks after your first analysis",
            String::new(),
            FOOTER_STYLE,
        )
    };

    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(Paragraph::new(text).style(style).block(block), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(msg) = &app.status {
        frame.render_widget(
            Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
            area,
        );
        return;
    }

    let hints = if app.path_prompt.is_some() || app.input_focused {
        " Enter=submit  Esc=back"
    } else {
        " o=open csv  a=analyze  /=ask  v=view  Up/Down=scroll  q=quit"
    };
    frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), area);
}
