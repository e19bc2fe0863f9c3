use agent_utils_core::{AgentConfig, AgentConfigPatch};
use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use super::util::{print_json, require_truthy, Remote};
use crate::config::Settings;

#[derive(Subcommand)]
pub enum AgentCmd {
    /// Print the agent's editable configuration (JSON)
    Show(AgentShowArgs),
    /// Change configuration fields; unspecified fields keep their current value
    Update(AgentUpdateArgs),
    /// Initialize all agents on the service
    Init,
    /// Run the agent healthcheck (exit code 1 when unhealthy)
    Health(AgentHealthArgs),
    /// Delete the agent
    Delete(AgentDeleteArgs),
}

#[derive(Args)]
pub struct AgentShowArgs {
    /// Print the raw agent record instead of the configuration form
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args, Default)]
pub struct AgentUpdateArgs {
    /// The name of the agent
    #[arg(long)]
    pub name: Option<String>,
    /// A brief description of the agent
    #[arg(long)]
    pub description: Option<String>,
    /// API key used for JPR integration
    #[arg(long)]
    pub jpr_api_key: Option<String>,
    /// Maximum messages handled within the window time
    #[arg(long)]
    pub message_limit: Option<i64>,
    /// Seconds to block interactions after detecting a flood
    #[arg(long)]
    pub flood_block_time: Option<i64>,
    /// Seconds in the flood monitoring window
    #[arg(long)]
    pub window_time: Option<i64>,
    /// Messages allowed within the window time
    #[arg(long)]
    pub flood_threshold: Option<i64>,
    /// Interactions kept in the frame before auto-pruning
    #[arg(long)]
    pub frame_size: Option<i64>,
    /// Text-to-speech action
    #[arg(long)]
    pub tts_action: Option<String>,
    /// Speech-to-text action
    #[arg(long)]
    pub stt_action: Option<String>,
    /// Vector store action used for embeddings
    #[arg(long)]
    pub vector_store_action: Option<String>,
}

impl AgentUpdateArgs {
    fn into_patch(self) -> AgentConfigPatch {
        AgentConfigPatch {
            name: self.name,
            description: self.description,
            jpr_api_key: self.jpr_api_key,
            message_limit: self.message_limit,
            flood_block_time: self.flood_block_time,
            window_time: self.window_time,
            flood_threshold: self.flood_threshold,
            frame_size: self.frame_size,
            tts_action: self.tts_action,
            stt_action: self.stt_action,
            vector_store_action: self.vector_store_action,
        }
    }
}

#[derive(Args)]
pub struct AgentHealthArgs {
    /// Ask the service to include trace details
    #[arg(long)]
    pub trace: bool,
}

#[derive(Args)]
pub struct AgentDeleteArgs {
    /// Confirm deletion
    #[arg(long)]
    pub yes: bool,
}

pub fn execute(cmd: AgentCmd, settings: &Settings) -> Result<()> {
    let mut remote = Remote::connect(settings)?;
    match cmd {
        AgentCmd::Show(args) => cmd_show(&mut remote, &args),
        AgentCmd::Update(args) => cmd_update(&mut remote, args),
        AgentCmd::Init => cmd_init(&mut remote),
        AgentCmd::Health(args) => cmd_health(&mut remote, &args),
        AgentCmd::Delete(args) => cmd_delete(&mut remote, &args),
    }
}

fn cmd_show(remote: &mut Remote, args: &AgentShowArgs) -> Result<()> {
    let agent_id = remote.agent_id()?;
    let agent = remote.client.get_agent(&mut remote.session, &agent_id)?;
    if args.raw {
        print_json(&agent)
    } else {
        print_json(&AgentConfig::from_agent(&agent))
    }
}

fn cmd_update(remote: &mut Remote, args: AgentUpdateArgs) -> Result<()> {
    let patch = args.into_patch();
    if patch.is_empty() {
        bail!("nothing to update: pass at least one field flag (see --help)");
    }
    let agent_id = remote.agent_id()?;
    let agent = remote.client.get_agent(&mut remote.session, &agent_id)?;
    // Defaults must never stand in for a missing record on write.
    if !agent.as_object().is_some_and(|record| !record.is_empty()) {
        bail!("agent {agent_id} not found; nothing was updated");
    }
    let mut config = AgentConfig::from_agent(&agent);
    config.apply(patch);
    let result = remote
        .client
        .update_agent(&mut remote.session, &agent_id, &config)?;
    require_truthy(result, "Failed to update agent.")?;
    println!("Agent updated successfully");
    Ok(())
}

fn cmd_init(remote: &mut Remote) -> Result<()> {
    remote.client.init_agents(&mut remote.session)?;
    println!("Agents initialized successfully");
    Ok(())
}

fn cmd_health(remote: &mut Remote, args: &AgentHealthArgs) -> Result<()> {
    let agent_id = remote.agent_id()?;
    let report = remote
        .client
        .healthcheck(&mut remote.session, &agent_id, args.trace)?;
    print_json(&report.body)?;
    if !report.is_healthy() {
        bail!("Agent health not okay (HTTP {})", report.status);
    }
    println!("Agent health okay");
    Ok(())
}

fn cmd_delete(remote: &mut Remote, args: &AgentDeleteArgs) -> Result<()> {
    if !args.yes {
        bail!("refusing to delete without --yes");
    }
    let target = remote.target()?;
    let result = remote.client.delete_agent(&mut remote.session, &target)?;
    require_truthy(
        result,
        "Failed to delete agent. Ensure the agent exists and the action is installed.",
    )?;
    println!("Agent deleted successfully");
    Ok(())
}
