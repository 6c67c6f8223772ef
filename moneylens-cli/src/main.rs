use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use moneylens_agent::{AgentClient, prompt};
use moneylens_core::{FALLBACK_ANSWER, ReportBundle, ReportKind, decode_report};
use std::path::{Path, PathBuf};

mod config;
mod dashboard;
mod fmt;
mod render;
mod state;
mod ui;

use config::Config;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("MONEYLENS_BUILD_SHA"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "moneylens", version = VERSION, about = "Terminal dashboard for agent-analyzed spending")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive dashboard session
    Dashboard {
        /// Statement to load on startup
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Report view: classic | audit (default from config)
        #[arg(long)]
        view: Option<String>,
    },

    /// Send one statement for analysis and print the report
    Analyze {
        /// Path to the CSV statement
        #[arg(long)]
        csv: PathBuf,

        /// Report view: classic | audit (default from config)
        #[arg(long)]
        view: Option<String>,

        /// Print the raw agent payload as pretty JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Ask the money manager one question about the analyzed data
    Ask {
        /// The question, as free text
        question: Vec<String>,
    },

    /// Manage ~/.moneylens/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file
    Init,

    /// Print the active config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    // opt-in via RUST_LOG; silent by default so the dashboard stays clean
    env_logger::Builder::from_default_env().init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;

    match cli.command {
        Command::Dashboard { csv, view } => {
            let kind = view_kind(&cfg, view.as_deref())?;
            dashboard::run(&cfg, csv, kind).await?;
        }

        Command::Analyze { csv, view, json } => {
            let kind = view_kind(&cfg, view.as_deref())?;
            analyze_once(&cfg, &csv, kind, json).await?;
        }

        Command::Ask { question } => {
            let question = question.join(" ");
            if question.trim().is_empty() {
                bail!("empty question (usage: moneylens ask <question...>)");
            }
            ask_once(&cfg, &question).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&cfg)?,
        },
    }

    Ok(())
}

fn view_kind(cfg: &Config, flag: Option<&str>) -> Result<ReportKind> {
    config::parse_view(flag.unwrap_or(&cfg.dashboard.view))
}

async fn analyze_once(cfg: &Config, csv: &Path, kind: ReportKind, json: bool) -> Result<()> {
    let statement = moneylens_intake::accept(csv)
        .await?
        .ok_or_else(|| anyhow!("not a .csv file: {}", csv.display()))?;

    let client = AgentClient::new(cfg.agent.base_url.clone());
    let message = prompt::analysis_prompt(&statement.text);
    let reply = client.invoke(&message, &cfg.agent.analyze_agent_id).await?;
    if !reply.is_success() {
        bail!("agent status: {}", reply.status);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reply.result)?);
        return Ok(());
    }

    let (report, insights) = decode_report(kind, &reply.result)?;
    render::print_report(&statement, &ReportBundle { report, insights });
    Ok(())
}

async fn ask_once(cfg: &Config, question: &str) -> Result<()> {
    let client = AgentClient::new(cfg.agent.base_url.clone());
    let message = prompt::chat_prompt(question);
    let reply = client.invoke(&message, &cfg.agent.chat_agent_id).await?;
    if !reply.is_success() {
        bail!("agent status: {}", reply.status);
    }

    let answer = reply.answer_text();
    if answer.trim().is_empty() {
        println!("{FALLBACK_ANSWER}");
    } else {
        println!("{answer}");
    }
    Ok(())
}
