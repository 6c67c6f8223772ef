//! Interactive dashboard session.
//!
//! Single UI thread: the crossterm loop drains completion events from the
//! agent worker and the intake tasks between draws, applies them to the
//! [`Session`], and never blocks on the network itself. A dropped file
//! arrives as a bracketed paste of its path; the typed path prompt and the
//! `--csv` flag feed the same accept path.

use std::io::{self, Stdout};
use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use moneylens_agent::{AgentEvent, AgentRequest, run_worker};
use moneylens_core::{AnalysisStage, ReportKind, Session, SessionEvent, decode_report};
use moneylens_intake::LoadedStatement;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Config;
use crate::ui;

pub struct App {
    pub session: Session,
    /// Report shape requested from the agent on the next analysis.
    pub kind: ReportKind,
    /// Shape the in-flight (or last) analysis was requested under; the
    /// arriving payload decodes against this even if `kind` was toggled
    /// while the call was out.
    pub analysis_kind: ReportKind,
    pub input: String,
    pub input_focused: bool,
    pub path_prompt: Option<String>,
    pub txn_scroll: usize,
    pub status: Option<String>,
}

impl App {
    fn new(kind: ReportKind) -> Self {
        App {
            session: Session::new(),
            kind,
            analysis_kind: kind,
            input: String::new(),
            input_focused: false,
            path_prompt: None,
            txn_scroll: 0,
            status: None,
        }
    }
}

type LoadResult = (PathBuf, Result<Option<LoadedStatement>>);

struct Wiring {
    requests: UnboundedSender<AgentRequest>,
    agent_events: std::sync::mpsc::Receiver<AgentEvent>,
    loads: std::sync::mpsc::Receiver<LoadResult>,
    load_tx: std::sync::mpsc::Sender<LoadResult>,
}

pub async fn run(cfg: &Config, csv: Option<PathBuf>, kind: ReportKind) -> Result<()> {
    let (req_tx, req_rx) = tokio::sync::mpsc::unbounded_channel();
    let (agent_tx, agent_rx) = std::sync::mpsc::channel();
    let worker = tokio::spawn(run_worker(cfg.worker_settings(), req_rx, agent_tx));

    let (load_tx, load_rx) = std::sync::mpsc::channel();
    if let Some(path) = csv {
        spawn_accept(path, load_tx.clone());
    }

    let mut app = App::new(kind);
    let mut wiring = Wiring {
        requests: req_tx,
        agent_events: agent_rx,
        loads: load_rx,
        load_tx,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = session_loop(&mut terminal, &mut app, &mut wiring);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)?;
    terminal.show_cursor()?;
    worker.abort();

    res
}

fn session_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    wiring: &mut Wiring,
) -> Result<()> {
    loop {
        // drain async results first so the draw below reflects them
        while let Ok((path, res)) = wiring.loads.try_recv() {
            apply_load(app, &path, res);
        }
        while let Ok(ev) = wiring.agent_events.try_recv() {
            apply_agent_event(app, ev);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(std::time::Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(app, wiring, key.code) {
                    return Ok(());
                }
            }
            // terminals deliver a dropped file as a bracketed paste of its path
            Event::Paste(text) => {
                if let Some(path) = app.path_prompt.as_mut() {
                    path.push_str(text.trim());
                } else if app.input_focused {
                    app.input.push_str(&text);
                } else {
                    spawn_accept(PathBuf::from(text.trim()), wiring.load_tx.clone());
                }
            }
            _ => {}
        }
    }
}

fn spawn_accept(path: PathBuf, tx: std::sync::mpsc::Sender<LoadResult>) {
    tokio::spawn(async move {
        let res = moneylens_intake::accept(&path).await;
        let _ = tx.send((path, res));
    });
}

fn apply_load(app: &mut App, path: &Path, res: Result<Option<LoadedStatement>>) {
    match res {
        Ok(Some(statement)) => {
            app.txn_scroll = 0;
            app.status = Some(format!("Loaded {}", statement.name));
            app.session.load_statement(statement);
        }
        // not a .csv: prior state stays, nothing surfaces
        Ok(None) => {}
        Err(e) => {
            log::warn!("could not read {}: {e:#}", path.display());
            app.status = Some(format!("Could not read {}", path.display()));
        }
    }
}

fn apply_agent_event(app: &mut App, ev: AgentEvent) {
    match ev {
        AgentEvent::StageTick { request_id } => {
            if let Some(stage) = app.session.analyzing_stage().and_then(AnalysisStage::next) {
                app.session
                    .apply(SessionEvent::StageAdvanced { request_id, stage });
            }
        }

        AgentEvent::Analyzed { request_id, result } => {
            match decode_report(app.analysis_kind, &result) {
                Ok((report, insights)) => {
                    app.session.apply(SessionEvent::AnalysisCompleted {
                        request_id,
                        report,
                        insights,
                    });
                }
                Err(e) => {
                    log::warn!("analysis payload rejected: {e:#}");
                    app.session.apply(SessionEvent::AnalysisFailed {
                        request_id,
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        AgentEvent::AnalysisError {
            request_id,
            message,
        } => {
            log::warn!("analysis failed: {message}");
            app.session.apply(SessionEvent::AnalysisFailed {
                request_id,
                reason: message,
            });
        }

        AgentEvent::Answered { request_id, text } => {
            app.session
                .apply(SessionEvent::AnswerArrived { request_id, text });
        }

        AgentEvent::AnswerError {
            request_id,
            message,
        } => {
            log::warn!("chat failed: {message}");
            app.session.apply(SessionEvent::AnswerFailed { request_id });
        }
    }
}

/// Returns true when the session should end.
fn handle_key(app: &mut App, wiring: &Wiring, code: KeyCode) -> bool {
    app.status = None;

    if app.path_prompt.is_some() {
        handle_path_key(app, wiring, code);
        return false;
    }
    if app.input_focused {
        handle_chat_key(app, wiring, code);
        return false;
    }

    match code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('o') => app.path_prompt = Some(String::new()),
        KeyCode::Char('a') => start_analysis(app, wiring),
        KeyCode::Char('/') => {
            if app.session.can_ask() {
                app.input_focused = true;
            } else {
                app.status = Some("Chat unlocks after your first analysis.".to_string());
            }
        }
        KeyCode::Char('v') => {
            app.kind = match app.kind {
                ReportKind::Classic => ReportKind::Audit,
                ReportKind::Audit => ReportKind::Classic,
            };
            let name = match app.kind {
                ReportKind::Classic => "classic",
                ReportKind::Audit => "audit",
            };
            app.status = Some(format!("View: {name} (applies to the next analysis)"));
        }
        KeyCode::Up => app.txn_scroll = app.txn_scroll.saturating_sub(1),
        KeyCode::Down => {
            let max = app
                .session
                .report()
                .map(|b| b.report.transactions().len().saturating_sub(1))
                .unwrap_or(0);
            app.txn_scroll = (app.txn_scroll + 1).min(max);
        }
        _ => {}
    }
    false
}

fn handle_path_key(app: &mut App, wiring: &Wiring, code: KeyCode) {
    let Some(path) = app.path_prompt.as_mut() else {
        return;
    };
    match code {
        KeyCode::Enter => {
            let typed = path.trim().to_string();
            app.path_prompt = None;
            if !typed.is_empty() {
                spawn_accept(PathBuf::from(typed), wiring.load_tx.clone());
            }
        }
        KeyCode::Esc => app.path_prompt = None,
        KeyCode::Backspace => {
            path.pop();
        }
        KeyCode::Char(c) => path.push(c),
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, wiring: &Wiring, code: KeyCode) {
    match code {
        KeyCode::Enter => {
            let question = app.input.trim().to_string();
            if question.is_empty() {
                return;
            }
            if let Some(request_id) = app.session.begin_question(&question) {
                let _ = wiring.requests.send(AgentRequest::Ask {
                    request_id,
                    question,
                });
            }
            app.input.clear();
        }
        KeyCode::Esc => app.input_focused = false,
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }
}

fn start_analysis(app: &mut App, wiring: &Wiring) {
    let Some(request_id) = app.session.begin_analysis() else {
        app.status = Some("Load a statement first (o, or paste a path).".to_string());
        return;
    };
    app.analysis_kind = app.kind;
    let csv_text = app
        .session
        .statement()
        .map(|s| s.text.clone())
        .unwrap_or_default();
    let _ = wiring.requests.send(AgentRequest::Analyze {
        request_id,
        csv_text,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneylens_core::Phase;
    use serde_json::{Value, json};

    fn statement() -> LoadedStatement {
        LoadedStatement {
            name: "july.csv".to_string(),
            text: "date,merchant,amount\n2026-07-01,H-E-B,42.18\n".to_string(),
            row_count: 2,
        }
    }

    fn audit_payload() -> Value {
        let bucket = json!({"total_amount": 10.0, "percentage": 16.6, "transaction_count": 1});
        json!({
            "financial_alignment_score": 64.0,
            "total_transactions": 6,
            "total_amount": 60.0,
            "category_summary": {
                "dining": bucket, "shopping": bucket, "bill_payments": bucket,
                "travel": bucket, "investments": bucket, "others": bucket
            },
            "merchant_breakdown": [],
            "habit_audit": {},
            "insights": []
        })
    }

    fn wiring() -> (Wiring, tokio::sync::mpsc::UnboundedReceiver<AgentRequest>) {
        let (req_tx, req_rx) = tokio::sync::mpsc::unbounded_channel();
        let (_agent_tx, agent_rx) = std::sync::mpsc::channel();
        let (load_tx, load_rx) = std::sync::mpsc::channel();
        let wiring = Wiring {
            requests: req_tx,
            agent_events: agent_rx,
            loads: load_rx,
            load_tx,
        };
        (wiring, req_rx)
    }

    #[test]
    fn non_csv_load_is_invisible() {
        let mut app = App::new(ReportKind::Audit);
        app.session.load_statement(statement());

        apply_load(&mut app, Path::new("notes.txt"), Ok(None));

        assert_eq!(app.session.statement().unwrap().name, "july.csv");
        assert_eq!(app.status, None);
    }

    #[test]
    fn failed_read_surfaces_on_the_status_line() {
        let mut app = App::new(ReportKind::Audit);
        app.session.load_statement(statement());

        apply_load(&mut app, Path::new("gone.csv"), Err(anyhow::anyhow!("no such file")));

        assert_eq!(app.session.statement().unwrap().name, "july.csv");
        assert_eq!(app.status.as_deref(), Some("Could not read gone.csv"));
    }

    #[test]
    fn successful_load_resets_scroll_and_announces() {
        let mut app = App::new(ReportKind::Audit);
        app.txn_scroll = 7;

        apply_load(&mut app, Path::new("july.csv"), Ok(Some(statement())));

        assert_eq!(app.txn_scroll, 0);
        assert_eq!(app.status.as_deref(), Some("Loaded july.csv"));
    }

    #[test]
    fn payload_decodes_against_the_kind_it_was_requested_under() {
        let mut app = App::new(ReportKind::Audit);
        app.session.load_statement(statement());
        let id = app.session.begin_analysis().unwrap();
        app.analysis_kind = app.kind;

        // toggling the view while the call is out must not change the decode
        app.kind = ReportKind::Classic;
        apply_agent_event(
            &mut app,
            AgentEvent::Analyzed {
                request_id: id,
                result: audit_payload(),
            },
        );

        assert!(matches!(app.session.phase(), Phase::Ready { .. }));
        assert_eq!(app.session.report().unwrap().report.kind(), ReportKind::Audit);
    }

    #[test]
    fn undecodable_payload_fails_the_analysis() {
        let mut app = App::new(ReportKind::Audit);
        app.session.load_statement(statement());
        let id = app.session.begin_analysis().unwrap();
        app.analysis_kind = app.kind;

        apply_agent_event(
            &mut app,
            AgentEvent::Analyzed {
                request_id: id,
                result: json!({"not": "a report"}),
            },
        );

        assert!(matches!(app.session.phase(), Phase::Failed { .. }));
    }

    #[test]
    fn stage_ticks_walk_the_label_sequence_and_pin_at_the_last() {
        let mut app = App::new(ReportKind::Audit);
        app.session.load_statement(statement());
        let id = app.session.begin_analysis().unwrap();
        assert_eq!(app.session.analyzing_stage(), Some(AnalysisStage::Sending));

        for expected in [
            AnalysisStage::Categorizing,
            AnalysisStage::Auditing,
            AnalysisStage::Scoring,
        ] {
            apply_agent_event(&mut app, AgentEvent::StageTick { request_id: id });
            assert_eq!(app.session.analyzing_stage(), Some(expected));
        }

        apply_agent_event(&mut app, AgentEvent::StageTick { request_id: id });
        assert_eq!(app.session.analyzing_stage(), Some(AnalysisStage::Scoring));
    }

    #[test]
    fn analyze_key_requires_a_statement() {
        let (wiring, mut req_rx) = wiring();
        let mut app = App::new(ReportKind::Audit);

        handle_key(&mut app, &wiring, KeyCode::Char('a'));

        assert!(app.status.as_deref().unwrap().starts_with("Load a statement"));
        assert!(req_rx.try_recv().is_err());
    }

    #[test]
    fn analyze_key_sends_the_raw_statement_text() {
        let (wiring, mut req_rx) = wiring();
        let mut app = App::new(ReportKind::Classic);
        app.session.load_statement(statement());

        handle_key(&mut app, &wiring, KeyCode::Char('a'));

        let AgentRequest::Analyze { csv_text, .. } = req_rx.try_recv().unwrap() else {
            panic!("expected an analyze request");
        };
        assert_eq!(csv_text, statement().text);
        assert_eq!(app.analysis_kind, ReportKind::Classic);
    }

    #[test]
    fn view_toggle_applies_to_the_next_analysis_only() {
        let (wiring, _req_rx) = wiring();
        let mut app = App::new(ReportKind::Audit);

        handle_key(&mut app, &wiring, KeyCode::Char('v'));

        assert_eq!(app.kind, ReportKind::Classic);
        assert_eq!(app.analysis_kind, ReportKind::Audit);
        assert!(app.status.as_deref().unwrap().contains("classic"));
    }

    #[test]
    fn chat_gate_blocks_until_a_report_exists() {
        let (wiring, _req_rx) = wiring();
        let mut app = App::new(ReportKind::Audit);
        app.session.load_statement(statement());

        handle_key(&mut app, &wiring, KeyCode::Char('/'));

        assert!(!app.input_focused);
        assert!(app.status.as_deref().unwrap().contains("Chat unlocks"));
    }
}
