//! moneylens-core: report schemas and view-session state for Moneylens.

pub mod report;
pub mod session;

pub use report::{
    AnalysisReport, AuditCategory, AuditReport, AuditSummary, ClassicCategory, ClassicReport,
    ClassicSummary, CutBack, DiningSpot, HabitAudit, ImpulsivePurchase, MerchantSummary,
    ReportKind, SubscriptionLine, TransactionRecord, decode_report,
};
pub use session::{
    ANSWER_ERROR, AnalysisStage, ChatTurn, FALLBACK_ANSWER, Phase, ReportBundle, Role, Session,
    SessionEvent,
};
