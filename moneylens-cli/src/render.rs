//! Plain-stdout rendering for the one-shot `analyze` command. Reuses the
//! dashboard's derivations (merchant sort, savings total) without taking
//! over the terminal.

use moneylens_core::{AnalysisReport, ReportBundle};
use moneylens_intake::LoadedStatement;

use crate::fmt;
use crate::ui::{clip, sorted_merchants};

pub fn print_report(statement: &LoadedStatement, bundle: &ReportBundle) {
    let report = &bundle.report;

    println!(
        "Statement: {} ({} transaction rows)",
        statement.name, statement.row_count
    );
    println!(
        "Financial alignment: {:.0}/100  ({} transactions, {} total)",
        report.score(),
        report.total_transactions(),
        fmt::money(report.total_amount())
    );

    println!("\nCategories:");
    match report {
        AnalysisReport::Classic(r) => {
            for (key, c) in r.category_summary.entries() {
                println!(
                    "  {:<14} {:>12}  {:>6}  {:>4} txns",
                    key,
                    fmt::money(c.amount),
                    fmt::percent(c.percentage),
                    c.count
                );
            }
        }
        AnalysisReport::Audit(r) => {
            for (key, c) in r.category_summary.entries() {
                println!(
                    "  {:<14} {:>12}  {:>6}  {:>4} txns",
                    key,
                    fmt::money(c.total_amount),
                    fmt::percent(c.percentage),
                    c.transaction_count
                );
            }
        }
    }

    let merchants = sorted_merchants(report);
    if !merchants.is_empty() {
        println!("\nTop merchants:");
        for m in merchants.iter().take(10) {
            println!(
                "  {:<28} {:>12}  {}x",
                clip(&m.merchant, 28),
                fmt::money(m.amount),
                m.count
            );
        }
    }

    if let Some(audit) = report.habit_audit() {
        println!("\nHabit audit:");
        for p in &audit.impulsive_purchases {
            println!(
                "  impulsive  {:<20} {:>10}  {}",
                clip(&p.merchant, 20),
                fmt::money(p.amount),
                p.reason
            );
        }
        for d in &audit.high_cost_dining {
            println!(
                "  dining     {:<20} {:>10}  {} visits",
                clip(&d.merchant, 20),
                fmt::money(d.total_amount),
                d.visit_count
            );
        }
        for s in &audit.subscription_analysis {
            println!(
                "  recurring  {:<20} {:>10}/mo  {}",
                clip(&s.service, 20),
                fmt::money(s.monthly_amount),
                s.assessment
            );
        }
        for c in &audit.cut_back_opportunities {
            println!(
                "  cut back   {:<20} save {}  {}",
                clip(&c.category, 20),
                fmt::money(c.potential_savings),
                c.suggestion
            );
        }
        if !audit.cut_back_opportunities.is_empty() {
            println!(
                "  potential savings: {}/mo",
                fmt::money(audit.potential_savings_total())
            );
        }
    }

    if !bundle.insights.is_empty() {
        println!("\nInsights:");
        for i in &bundle.insights {
            println!("  - {i}");
        }
    }

    let recs = report.recommendations();
    if !recs.is_empty() {
        println!("\nRecommendations:");
        for r in recs {
            println!("  - {r}");
        }
    }

    let txns = report.transactions();
    if !txns.is_empty() {
        println!("\nTransactions:");
        println!(
            "  {:<12} {:<28} {:<16} {:>12}",
            "date", "merchant", "category", "amount"
        );
        for t in txns {
            println!(
                "  {:<12} {:<28} {:<16} {:>12}",
                clip(&t.date, 12),
                clip(&t.merchant, 28),
                clip(&t.category, 16),
                fmt::money(t.amount)
            );
        }
    }
}
