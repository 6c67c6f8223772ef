//! View-session state machine.
//!
//! One tagged [`Phase`] replaces the loose analyzing/loaded/report flags a
//! dashboard would otherwise juggle, so states like "analyzing with no
//! statement" cannot be represented. Async work (analysis, chat answers)
//! reports back as [`SessionEvent`]s stamped with a request id; events from
//! a superseded request are ignored, which is what makes report replacement
//! atomic and keeps a failed re-analysis from disturbing the report already
//! on screen.

use moneylens_intake::LoadedStatement;

use crate::report::AnalysisReport;

/// Shown when the agent answers a question with empty text.
pub const FALLBACK_ANSWER: &str =
    "I don't have an answer for that yet. Try asking about a category or merchant from the report.";

/// Shown as the assistant turn when a chat request fails outright.
pub const ANSWER_ERROR: &str =
    "Something went wrong answering that. Give it another try in a moment.";

/// Perceived-progress stages shown while an analysis is in flight. They
/// advance on a fixed cadence, not on real progress, and stop the moment
/// their request completes, fails, or is superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Sending,
    Categorizing,
    Auditing,
    Scoring,
}

impl AnalysisStage {
    pub fn first() -> Self {
        AnalysisStage::Sending
    }

    pub fn next(self) -> Option<Self> {
        match self {
            AnalysisStage::Sending => Some(AnalysisStage::Categorizing),
            AnalysisStage::Categorizing => Some(AnalysisStage::Auditing),
            AnalysisStage::Auditing => Some(AnalysisStage::Scoring),
            AnalysisStage::Scoring => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnalysisStage::Sending => "Sending your statement to your money manager...",
            AnalysisStage::Categorizing => "Categorizing your spending...",
            AnalysisStage::Auditing => "Auditing habits and merchants...",
            AnalysisStage::Scoring => "Scoring financial alignment...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. The transcript is append-only and lives only as
/// long as the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        ChatTurn {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatTurn {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A decoded report plus the insights list that rode in the same payload.
/// The two are always replaced together, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    pub report: AnalysisReport,
    pub insights: Vec<String>,
}

/// Page status as a single tagged variant. `prior` carries the last good
/// report through statement swaps, in-flight analyses, and failures, since
/// the report on screen outlives all three.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loaded {
        statement: LoadedStatement,
        prior: Option<ReportBundle>,
    },
    Analyzing {
        statement: LoadedStatement,
        stage: AnalysisStage,
        prior: Option<ReportBundle>,
    },
    Ready {
        statement: LoadedStatement,
        report: ReportBundle,
    },
    Failed {
        statement: LoadedStatement,
        reason: String,
        prior: Option<ReportBundle>,
    },
}

/// Completion events delivered by the async workers, stamped with the id
/// handed out by [`Session::begin_analysis`] / [`Session::begin_question`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StageAdvanced {
        request_id: u64,
        stage: AnalysisStage,
    },
    AnalysisCompleted {
        request_id: u64,
        report: AnalysisReport,
        insights: Vec<String>,
    },
    AnalysisFailed {
        request_id: u64,
        reason: String,
    },
    AnswerArrived {
        request_id: u64,
        text: String,
    },
    AnswerFailed {
        request_id: u64,
    },
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    transcript: Vec<ChatTurn>,
    next_request: u64,
    current_analysis: Option<u64>,
    pending_asks: Vec<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            phase: Phase::Idle,
            transcript: Vec::new(),
            next_request: 0,
            current_analysis: None,
            pending_asks: Vec::new(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn statement(&self) -> Option<&LoadedStatement> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Loaded { statement, .. }
            | Phase::Analyzing { statement, .. }
            | Phase::Ready { statement, .. }
            | Phase::Failed { statement, .. } => Some(statement),
        }
    }

    /// The report currently on screen: the live one when ready, otherwise
    /// whatever survived the in-flight or failed analysis.
    pub fn report(&self) -> Option<&ReportBundle> {
        match &self.phase {
            Phase::Ready { report, .. } => Some(report),
            Phase::Loaded { prior, .. }
            | Phase::Analyzing { prior, .. }
            | Phase::Failed { prior, .. } => prior.as_ref(),
            Phase::Idle => None,
        }
    }

    /// Current stage label while an analysis is in flight.
    pub fn analyzing_stage(&self) -> Option<AnalysisStage> {
        match &self.phase {
            Phase::Analyzing { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn can_analyze(&self) -> bool {
        self.statement().is_some()
    }

    /// Chat is gated on a report being visible; the dashboard disables the
    /// input rather than erroring.
    pub fn can_ask(&self) -> bool {
        self.report().is_some()
    }

    /// Replace the loaded statement wholesale. Any in-flight analysis is
    /// orphaned: its id stops matching, so its eventual result is dropped.
    pub fn load_statement(&mut self, statement: LoadedStatement) {
        let prior = self.take_report();
        self.current_analysis = None;
        self.phase = Phase::Loaded { statement, prior };
    }

    /// Start (or restart) an analysis. Returns the request id the caller
    /// must stamp on the worker request, or `None` when no statement is
    /// loaded. Starting again supersedes the previous request.
    pub fn begin_analysis(&mut self) -> Option<u64> {
        let (statement, prior) = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => return None,
            Phase::Loaded { statement, prior } => (statement, prior),
            Phase::Analyzing {
                statement, prior, ..
            } => (statement, prior),
            Phase::Ready { statement, report } => (statement, Some(report)),
            Phase::Failed {
                statement, prior, ..
            } => (statement, prior),
        };

        let id = self.next_id();
        self.current_analysis = Some(id);
        self.phase = Phase::Analyzing {
            statement,
            stage: AnalysisStage::first(),
            prior,
        };
        Some(id)
    }

    /// Append the user turn immediately (optimistic) and hand out the id
    /// for the worker request. `None` when no report exists yet.
    pub fn begin_question(&mut self, question: &str) -> Option<u64> {
        if !self.can_ask() {
            return None;
        }
        self.transcript.push(ChatTurn::user(question));
        let id = self.next_id();
        self.pending_asks.push(id);
        Some(id)
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StageAdvanced { request_id, stage } => {
                if self.current_analysis != Some(request_id) {
                    return;
                }
                if let Phase::Analyzing { stage: current, .. } = &mut self.phase {
                    *current = stage;
                }
            }

            SessionEvent::AnalysisCompleted {
                request_id,
                report,
                insights,
            } => {
                if self.current_analysis != Some(request_id) {
                    return;
                }
                self.current_analysis = None;
                match std::mem::replace(&mut self.phase, Phase::Idle) {
                    Phase::Analyzing { statement, .. } => {
                        self.phase = Phase::Ready {
                            statement,
                            report: ReportBundle { report, insights },
                        };
                    }
                    other => self.phase = other,
                }
            }

            SessionEvent::AnalysisFailed { request_id, reason } => {
                if self.current_analysis != Some(request_id) {
                    return;
                }
                self.current_analysis = None;
                match std::mem::replace(&mut self.phase, Phase::Idle) {
                    Phase::Analyzing {
                        statement, prior, ..
                    } => {
                        self.phase = Phase::Failed {
                            statement,
                            reason,
                            prior,
                        };
                    }
                    other => self.phase = other,
                }
            }

            SessionEvent::AnswerArrived { request_id, text } => {
                if !self.settle_ask(request_id) {
                    return;
                }
                let content = if text.trim().is_empty() {
                    FALLBACK_ANSWER.to_string()
                } else {
                    text
                };
                self.transcript.push(ChatTurn::assistant(content));
            }

            SessionEvent::AnswerFailed { request_id } => {
                if !self.settle_ask(request_id) {
                    return;
                }
                self.transcript.push(ChatTurn::assistant(ANSWER_ERROR));
            }
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_request += 1;
        self.next_request
    }

    /// Remove a pending ask; false means the id was never handed out or was
    /// already settled, and the event must be dropped.
    fn settle_ask(&mut self, request_id: u64) -> bool {
        match self.pending_asks.iter().position(|id| *id == request_id) {
            Some(pos) => {
                self.pending_asks.remove(pos);
                true
            }
            None => false,
        }
    }

    fn take_report(&mut self) -> Option<ReportBundle> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => None,
            Phase::Ready { report, .. } => Some(report),
            Phase::Loaded { prior, .. }
            | Phase::Analyzing { prior, .. }
            | Phase::Failed { prior, .. } => prior,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{
        AnalysisReport, ClassicCategory, ClassicReport, ClassicSummary,
    };

    fn statement(name: &str) -> LoadedStatement {
        LoadedStatement {
            name: name.to_string(),
            text: "date,merchant,amount\n2026-07-01,H-E-B,42.00\n".to_string(),
            row_count: 2,
        }
    }

    fn bucket(amount: f64) -> ClassicCategory {
        ClassicCategory {
            amount,
            percentage: 33.3,
            count: 3,
        }
    }

    fn report(score: f64) -> AnalysisReport {
        AnalysisReport::Classic(ClassicReport {
            financial_alignment_score: score,
            total_transactions: 9,
            total_amount: 300.0,
            category_summary: ClassicSummary {
                survival: bucket(100.0),
                lifestyle: bucket(100.0),
                future: bucket(100.0),
            },
            top_merchants: vec![],
            transactions: vec![],
        })
    }

    fn ready_session(score: f64) -> Session {
        let mut s = Session::new();
        s.load_statement(statement("july.csv"));
        let id = s.begin_analysis().unwrap();
        s.apply(SessionEvent::AnalysisCompleted {
            request_id: id,
            report: report(score),
            insights: vec!["insight".to_string()],
        });
        s
    }

    #[test]
    fn idle_session_cannot_analyze_or_ask() {
        let mut s = Session::new();
        assert!(!s.can_analyze());
        assert!(!s.can_ask());
        assert_eq!(s.begin_analysis(), None);
        assert_eq!(s.begin_question("total?"), None);
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn successful_analysis_replaces_report_wholesale() {
        let mut s = ready_session(80.0);
        assert_eq!(s.report().unwrap().report.score(), 80.0);
        assert_eq!(s.report().unwrap().insights, vec!["insight".to_string()]);

        let id = s.begin_analysis().unwrap();
        s.apply(SessionEvent::AnalysisCompleted {
            request_id: id,
            report: report(40.0),
            insights: vec![],
        });

        let bundle = s.report().unwrap();
        assert_eq!(bundle.report.score(), 40.0);
        assert!(bundle.insights.is_empty(), "insights replaced, not merged");
        assert!(matches!(s.phase(), Phase::Ready { .. }));
    }

    #[test]
    fn failed_analysis_keeps_prior_report_and_insights() {
        let mut s = ready_session(80.0);
        let before = s.report().unwrap().clone();

        let id = s.begin_analysis().unwrap();
        s.apply(SessionEvent::AnalysisFailed {
            request_id: id,
            reason: "agent status: error".to_string(),
        });

        assert_eq!(s.report(), Some(&before));
        match s.phase() {
            Phase::Failed { reason, .. } => assert_eq!(reason, "agent status: error"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn first_analysis_failure_leaves_no_report() {
        let mut s = Session::new();
        s.load_statement(statement("july.csv"));
        let id = s.begin_analysis().unwrap();
        s.apply(SessionEvent::AnalysisFailed {
            request_id: id,
            reason: "network".to_string(),
        });
        assert!(s.report().is_none());
        assert!(!s.can_ask());
    }

    #[test]
    fn superseded_analysis_result_is_dropped() {
        let mut s = Session::new();
        s.load_statement(statement("july.csv"));
        let first = s.begin_analysis().unwrap();
        let second = s.begin_analysis().unwrap();
        assert_ne!(first, second);

        s.apply(SessionEvent::AnalysisCompleted {
            request_id: first,
            report: report(10.0),
            insights: vec![],
        });
        assert!(matches!(s.phase(), Phase::Analyzing { .. }), "stale result ignored");

        s.apply(SessionEvent::AnalysisCompleted {
            request_id: second,
            report: report(90.0),
            insights: vec![],
        });
        assert_eq!(s.report().unwrap().report.score(), 90.0);
    }

    #[test]
    fn loading_a_statement_orphans_the_in_flight_analysis() {
        let mut s = ready_session(65.0);
        let id = s.begin_analysis().unwrap();
        s.load_statement(statement("august.csv"));

        s.apply(SessionEvent::AnalysisCompleted {
            request_id: id,
            report: report(5.0),
            insights: vec![],
        });

        // Still showing the report from the July analysis, on the new file.
        assert!(matches!(s.phase(), Phase::Loaded { .. }));
        assert_eq!(s.report().unwrap().report.score(), 65.0);
        assert_eq!(s.statement().unwrap().name, "august.csv");
    }

    #[test]
    fn statement_swap_keeps_the_visible_report() {
        let mut s = ready_session(70.0);
        s.load_statement(statement("august.csv"));
        assert_eq!(s.report().unwrap().report.score(), 70.0);
        assert!(s.can_ask());
    }

    #[test]
    fn stage_advances_only_for_the_current_request() {
        let mut s = Session::new();
        s.load_statement(statement("july.csv"));
        let id = s.begin_analysis().unwrap();
        assert_eq!(s.analyzing_stage(), Some(AnalysisStage::Sending));

        s.apply(SessionEvent::StageAdvanced {
            request_id: id + 100,
            stage: AnalysisStage::Scoring,
        });
        assert_eq!(s.analyzing_stage(), Some(AnalysisStage::Sending));

        s.apply(SessionEvent::StageAdvanced {
            request_id: id,
            stage: AnalysisStage::Categorizing,
        });
        assert_eq!(s.analyzing_stage(), Some(AnalysisStage::Categorizing));
    }

    #[test]
    fn stage_sequence_terminates() {
        let mut stage = AnalysisStage::first();
        let mut steps = 0;
        while let Some(next) = stage.next() {
            stage = next;
            steps += 1;
        }
        assert_eq!(stage, AnalysisStage::Scoring);
        assert_eq!(steps, 3);
    }

    #[test]
    fn both_user_turns_appear_immediately() {
        let mut s = ready_session(75.0);
        s.begin_question("how much on dining?").unwrap();
        s.begin_question("top merchant?").unwrap();

        let roles: Vec<Role> = s.transcript().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::User]);
    }

    #[test]
    fn answers_append_in_resolution_order() {
        let mut s = ready_session(75.0);
        let q1 = s.begin_question("first?").unwrap();
        let q2 = s.begin_question("second?").unwrap();

        // Second answer lands first; the transcript reflects resolution order.
        s.apply(SessionEvent::AnswerArrived {
            request_id: q2,
            text: "answer two".to_string(),
        });
        s.apply(SessionEvent::AnswerArrived {
            request_id: q1,
            text: "answer one".to_string(),
        });

        let contents: Vec<&str> = s.transcript().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first?", "second?", "answer two", "answer one"]);
    }

    #[test]
    fn each_question_settles_exactly_once() {
        let mut s = ready_session(75.0);
        let q = s.begin_question("total?").unwrap();

        s.apply(SessionEvent::AnswerArrived {
            request_id: q,
            text: "42".to_string(),
        });
        s.apply(SessionEvent::AnswerArrived {
            request_id: q,
            text: "duplicate".to_string(),
        });

        assert_eq!(s.transcript().len(), 2);
        assert_eq!(s.transcript()[1].content, "42");
    }

    #[test]
    fn empty_answer_falls_back_to_fixed_text() {
        let mut s = ready_session(75.0);
        let q = s.begin_question("anything?").unwrap();
        s.apply(SessionEvent::AnswerArrived {
            request_id: q,
            text: "   ".to_string(),
        });
        assert_eq!(s.transcript()[1].content, FALLBACK_ANSWER);
    }

    #[test]
    fn failed_answer_appends_fixed_error_turn() {
        let mut s = ready_session(75.0);
        let q = s.begin_question("anything?").unwrap();
        s.apply(SessionEvent::AnswerFailed { request_id: q });
        assert_eq!(s.transcript()[1].content, ANSWER_ERROR);
        assert_eq!(s.transcript()[1].role, Role::Assistant);
    }

    #[test]
    fn unknown_answer_id_is_a_no_op() {
        let mut s = ready_session(75.0);
        s.apply(SessionEvent::AnswerArrived {
            request_id: 999,
            text: "ghost".to_string(),
        });
        assert!(s.transcript().is_empty());
    }
}
