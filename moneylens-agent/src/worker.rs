//! Sequenced agent worker.
//!
//! One task owns all agent traffic. Analysis requests supersede each other:
//! submitting a new one aborts the in-flight call, and because the stage
//! ticks are produced inside the same select loop as the call, no tick can
//! outlive its request. Chat requests are answered inline, one at a time, so
//! answers come back in the order the questions were asked.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::client::AgentClient;
use crate::prompt;

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub client: AgentClient,
    pub analyze_agent_id: String,
    pub chat_agent_id: String,
    pub stage_interval: Duration,
}

#[derive(Debug, Clone)]
pub enum AgentRequest {
    Analyze { request_id: u64, csv_text: String },
    Ask { request_id: u64, question: String },
}

#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Cadence tick while the analysis call is still in flight. Perceived
    /// progress only; not tied to anything the agent reports.
    StageTick { request_id: u64 },
    /// Analysis came back with `status == "success"`; `result` is the raw
    /// payload, not yet decoded into a report.
    Analyzed { request_id: u64, result: Value },
    AnalysisError { request_id: u64, message: String },
    Answered { request_id: u64, text: String },
    AnswerError { request_id: u64, message: String },
}

pub async fn run_worker(
    settings: WorkerSettings,
    mut rx: mpsc::UnboundedReceiver<AgentRequest>,
    tx: std::sync::mpsc::Sender<AgentEvent>,
) {
    let mut current: Option<tokio::task::JoinHandle<()>> = None;

    while let Some(req) = rx.recv().await {
        match req {
            AgentRequest::Analyze {
                request_id,
                csv_text,
            } => {
                // supersede the in-flight analysis
                if let Some(h) = current.take() {
                    h.abort();
                    log::debug!("analysis {request_id} supersedes the in-flight request");
                }

                let s = settings.clone();
                let tx2 = tx.clone();
                current = Some(tokio::spawn(async move {
                    run_analysis(&s, request_id, &csv_text, &tx2).await;
                }));
            }

            AgentRequest::Ask {
                request_id,
                question,
            } => {
                // answered inline: one question in flight at a time, FIFO
                run_question(&settings, request_id, &question, &tx).await;
            }
        }
    }
}

async fn run_analysis(
    settings: &WorkerSettings,
    request_id: u64,
    csv_text: &str,
    tx: &std::sync::mpsc::Sender<AgentEvent>,
) {
    let message = prompt::analysis_prompt(csv_text);
    let call = settings
        .client
        .invoke(&message, &settings.analyze_agent_id);
    tokio::pin!(call);

    let mut ticks = tokio::time::interval(settings.stage_interval);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // an interval's first tick completes immediately; swallow it so the
    // first visible stage holds for one full interval
    ticks.tick().await;

    let outcome = loop {
        tokio::select! {
            res = &mut call => break res,
            _ = ticks.tick() => {
                let _ = tx.send(AgentEvent::StageTick { request_id });
            }
        }
    };

    match outcome {
        Ok(reply) if reply.is_success() => {
            let _ = tx.send(AgentEvent::Analyzed {
                request_id,
                result: reply.result,
            });
        }
        Ok(reply) => {
            let _ = tx.send(AgentEvent::AnalysisError {
                request_id,
                message: format!("agent status: {}", reply.status),
            });
        }
        Err(e) => {
            let _ = tx.send(AgentEvent::AnalysisError {
                request_id,
                message: format!("{e:#}"),
            });
        }
    }
}

async fn run_question(
    settings: &WorkerSettings,
    request_id: u64,
    question: &str,
    tx: &std::sync::mpsc::Sender<AgentEvent>,
) {
    let message = prompt::chat_prompt(question);
    match settings
        .client
        .invoke(&message, &settings.chat_agent_id)
        .await
    {
        Ok(reply) if reply.is_success() => {
            let _ = tx.send(AgentEvent::Answered {
                request_id,
                text: reply.answer_text(),
            });
        }
        Ok(reply) => {
            let _ = tx.send(AgentEvent::AnswerError {
                request_id,
                message: format!("agent status: {}", reply.status),
            });
        }
        Err(e) => {
            let _ = tx.send(AgentEvent::AnswerError {
                request_id,
                message: format!("{e:#}"),
            });
        }
    }
}
