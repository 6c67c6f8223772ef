//! End-to-end session exercises: statement in, report rendered state out,
//! chat layered on top, with failures and supersession along the way.

use moneylens_core::{
    ANSWER_ERROR, AnalysisReport, Phase, ReportKind, Role, Session, SessionEvent, decode_report,
};
use moneylens_intake::LoadedStatement;
use serde_json::json;

fn july_statement() -> LoadedStatement {
    let text = "date,merchant,amount\n\
                2026-07-01,H-E-B,42.18\n\
                2026-07-03,Shell,31.00\n\
                2026-07-05,Spotify,11.99";
    LoadedStatement {
        name: "july.csv".to_string(),
        text: text.to_string(),
        row_count: 3,
    }
}

fn audit_result(score: f64) -> serde_json::Value {
    let bucket = |amount: f64, pct: f64, n: u64| {
        json!({"total_amount": amount, "percentage": pct, "transaction_count": n})
    };
    json!({
        "financial_alignment_score": score,
        "total_transactions": 3,
        "total_amount": 85.17,
        "category_summary": {
            "dining": bucket(0.0, 0.0, 0),
            "shopping": bucket(42.18, 49.5, 1),
            "bill_payments": bucket(11.99, 14.1, 1),
            "travel": bucket(31.00, 36.4, 1),
            "investments": bucket(0.0, 0.0, 0),
            "others": bucket(0.0, 0.0, 0)
        },
        "merchant_breakdown": [
            {"merchant": "H-E-B", "amount": 42.18, "count": 1},
            {"merchant": "Shell", "amount": 31.00, "count": 1},
            {"merchant": "Spotify", "amount": 11.99, "count": 1}
        ],
        "transactions": [
            {"date": "2026-07-01", "merchant": "H-E-B", "amount": 42.18,
             "category": "shopping", "subcategory": "groceries"},
            {"date": "2026-07-03", "merchant": "Shell", "amount": 31.00,
             "category": "travel", "subcategory": "fuel"},
            {"date": "2026-07-05", "merchant": "Spotify", "amount": 11.99,
             "category": "bill_payments", "subcategory": "subscription"}
        ],
        "habit_audit": {
            "subscription_analysis": [
                {"service": "Spotify", "monthly_amount": 11.99, "assessment": "keep"}
            ],
            "cut_back_opportunities": [
                {"category": "travel", "suggestion": "Combine fuel runs", "potential_savings": 12.0}
            ]
        },
        "insights": ["Fuel is a third of this statement."],
        "recommendations": ["Set a travel envelope."]
    })
}

fn decoded(score: f64) -> (AnalysisReport, Vec<String>) {
    decode_report(ReportKind::Audit, &audit_result(score)).expect("payload decodes")
}

#[test]
fn full_session_load_analyze_ask() {
    let mut session = Session::new();
    assert!(matches!(session.phase(), Phase::Idle));

    session.load_statement(july_statement());
    assert!(session.can_analyze());
    assert!(!session.can_ask(), "chat stays disabled until a report exists");

    let analysis = session.begin_analysis().expect("statement is loaded");
    let (report, insights) = decoded(61.0);
    session.apply(SessionEvent::AnalysisCompleted {
        request_id: analysis,
        report,
        insights,
    });

    let bundle = session.report().expect("analysis completed");
    assert_eq!(bundle.report.score(), 61.0);
    assert_eq!(bundle.insights, vec!["Fuel is a third of this statement.".to_string()]);
    assert_eq!(
        bundle.report.habit_audit().unwrap().potential_savings_total(),
        12.0
    );

    // Two quick questions: user turns visible at once, answers in order.
    let q1 = session.begin_question("What did fuel cost?").unwrap();
    let q2 = session.begin_question("Any subscriptions to drop?").unwrap();
    assert_eq!(session.transcript().len(), 2);

    session.apply(SessionEvent::AnswerArrived {
        request_id: q1,
        text: "Fuel came to $31.00 across one fill-up.".to_string(),
    });
    session.apply(SessionEvent::AnswerFailed { request_id: q2 });

    let turns = session.transcript();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[2].content, "Fuel came to $31.00 across one fill-up.");
    assert_eq!(turns[3].content, ANSWER_ERROR);
}

#[test]
fn failed_reanalysis_then_recovery() {
    let mut session = Session::new();
    session.load_statement(july_statement());

    let first = session.begin_analysis().unwrap();
    let (report, insights) = decoded(70.0);
    session.apply(SessionEvent::AnalysisCompleted {
        request_id: first,
        report,
        insights,
    });

    // Re-run fails: the July report stays on screen and chat stays usable.
    let second = session.begin_analysis().unwrap();
    session.apply(SessionEvent::AnalysisFailed {
        request_id: second,
        reason: "agent status: error".to_string(),
    });
    assert!(matches!(session.phase(), Phase::Failed { .. }));
    assert_eq!(session.report().unwrap().report.score(), 70.0);
    assert!(session.can_ask());

    // Third attempt succeeds and replaces the report wholesale.
    let third = session.begin_analysis().unwrap();
    let (report, insights) = decoded(88.0);
    session.apply(SessionEvent::AnalysisCompleted {
        request_id: third,
        report,
        insights,
    });
    assert_eq!(session.report().unwrap().report.score(), 88.0);
}

#[test]
fn superseding_run_wins_regardless_of_arrival_order() {
    let mut session = Session::new();
    session.load_statement(july_statement());

    let stale = session.begin_analysis().unwrap();
    let live = session.begin_analysis().unwrap();

    // The live result lands first, then the stale one trickles in late.
    let (report, insights) = decoded(90.0);
    session.apply(SessionEvent::AnalysisCompleted {
        request_id: live,
        report,
        insights,
    });
    let (report, insights) = decoded(15.0);
    session.apply(SessionEvent::AnalysisCompleted {
        request_id: stale,
        report,
        insights,
    });

    assert_eq!(session.report().unwrap().report.score(), 90.0);
}
