use anyhow::{Context, Result, bail};
use moneylens_agent::{ANALYZE_AGENT_ID, AgentClient, CHAT_AGENT_ID, WorkerSettings};
use moneylens_core::ReportKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::ensure_moneylens_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub agent: AgentSection,
    pub dashboard: DashboardSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    pub base_url: String,
    pub analyze_agent_id: String,
    pub chat_agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSection {
    /// "classic" (three buckets) or "audit" (six categories + habit audit)
    pub view: String,
    /// Wall-clock cadence of the perceived-progress stage labels
    pub stage_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentSection {
                base_url: "https://manager.moneylens.app".to_string(),
                analyze_agent_id: ANALYZE_AGENT_ID.to_string(),
                chat_agent_id: CHAT_AGENT_ID.to_string(),
            },
            dashboard: DashboardSection {
                view: "audit".to_string(),
                stage_interval_ms: 1500,
            },
        }
    }
}

impl Config {
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            client: AgentClient::new(self.agent.base_url.clone()),
            analyze_agent_id: self.agent.analyze_agent_id.clone(),
            chat_agent_id: self.agent.chat_agent_id.clone(),
            stage_interval: Duration::from_millis(self.dashboard.stage_interval_ms),
        }
    }
}

pub fn parse_view(name: &str) -> Result<ReportKind> {
    match name {
        "classic" => Ok(ReportKind::Classic),
        "audit" => Ok(ReportKind::Audit),
        other => bail!("unknown view {other:?} (expected classic or audit)"),
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_moneylens_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("# {}", p.display());
    } else {
        println!("# {} (not written; defaults shown)", p.display());
    }
    print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
    Ok(())
}
