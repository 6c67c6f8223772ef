//! moneylens-agent: manager-agent client, prompt templates, and the
//! sequenced worker that drives analysis and chat requests.

pub mod client;
pub mod prompt;
pub mod worker;

pub use client::{ANALYZE_AGENT_ID, AgentClient, AgentReply, CHAT_AGENT_ID};
pub use worker::{AgentEvent, AgentRequest, WorkerSettings, run_worker};
