//! HTTP client for the remote manager agent.
//!
//! The agent owns every piece of financial intelligence (categorization,
//! scoring, habit detection, chat answers); this side of the wire is a single
//! POST of `{message, agent_id}` and a loosely-typed `{status, result}` reply.
//! No retry, no timeout, no idempotency: the agent is natural-language driven
//! and may answer the same prompt differently twice.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Agent that turns raw CSV text into a structured report. Both report views
/// read from the same agent.
pub const ANALYZE_AGENT_ID: &str = "financial-analysis-agent";

/// Agent that answers free-form questions about the analyzed data.
pub const CHAT_AGENT_ID: &str = "financial-chat-agent";

#[derive(Debug, Clone)]
pub struct AgentClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct InvokeBody<'a> {
    message: &'a str,
    agent_id: &'a str,
}

/// Reply envelope. `result` stays loosely typed here; the caller decides what
/// shape to demand of it (report decode vs answer text).
#[derive(Debug, Clone, Deserialize)]
pub struct AgentReply {
    pub status: String,
    #[serde(default)]
    pub result: Value,
}

impl AgentReply {
    /// Anything but `"success"` counts as a failure, same as a transport
    /// error would.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Chat answers arrive either as a bare string or wrapped in an object;
    /// anything else reads as empty and the caller substitutes its fallback.
    pub fn answer_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("answer")
                .or_else(|| map.get("response"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

impl AgentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        AgentClient {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Fire one prompt at one agent and decode the reply envelope.
    pub async fn invoke(&self, message: &str, agent_id: &str) -> Result<AgentReply> {
        let body = InvokeBody { message, agent_id };

        let resp = self
            .http
            .post(format!("{}/invoke", self.base_url))
            .json(&body)
            .send()
            .await
            .context("agent request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("agent error: {status} {txt}");
        }

        resp.json::<AgentReply>().await.context("parse agent reply")
    }
}
