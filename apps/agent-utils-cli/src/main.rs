use std::path::PathBuf;

use agent_utils_client::ClientError;
use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use commands::agent::AgentCmd;
use commands::bundle::BundleCmd;
use commands::classify::ClassifyArgs;
use commands::daf::DafCmd;
use commands::descriptor::DescriptorCmd;
use commands::logging::LoggingCmd;
use commands::memory::MemoryCmd;
use config::{GlobalArgs, Settings};

#[derive(Parser)]
#[command(
    name = "agent-utils",
    version,
    about = "Agent administration: configuration, memory, import and export"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Agent configuration and lifecycle
    Agent {
        #[command(subcommand)]
        cmd: AgentCmd,
    },
    /// Memory healthcheck, purge, refresh, export and import
    Memory {
        #[command(subcommand)]
        cmd: MemoryCmd,
    },
    /// Interaction logging toggle
    Logging {
        #[command(subcommand)]
        cmd: LoggingCmd,
    },
    /// Agent descriptor helpers
    Descriptor {
        #[command(subcommand)]
        cmd: DescriptorCmd,
    },
    /// DAF package import and export
    Daf {
        #[command(subcommand)]
        cmd: DafCmd,
    },
    /// Descriptor/memory/knowledge bundles (ZIP export, multi-file import)
    Bundle {
        #[command(subcommand)]
        cmd: BundleCmd,
    },
    /// Report which import slot each document would fill
    Classify(ClassifyArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
struct CompletionsArgs {
    /// Target shell (bash, zsh, fish, powershell, elvish)
    shell: clap_complete::Shell,
    /// Output directory (writes a file). If not set, prints to stdout.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        if err
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_unauthorized)
        {
            eprintln!("hint: the session token was rejected; log in again and pass --token");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let global = &cli.global;
    match cli.command {
        Commands::Agent { cmd } => commands::agent::execute(cmd, &Settings::load(global)?),
        Commands::Memory { cmd } => commands::memory::execute(cmd, &Settings::load(global)?),
        Commands::Logging { cmd } => commands::logging::execute(cmd, &Settings::load(global)?),
        Commands::Descriptor { cmd } => {
            commands::descriptor::execute(cmd, &Settings::load(global)?)
        }
        Commands::Daf { cmd } => commands::daf::execute(cmd, &Settings::load(global)?),
        Commands::Bundle { cmd } => commands::bundle::execute(cmd, global),
        Commands::Classify(args) => commands::classify::execute(args),
        Commands::Completions(args) => cmd_completions(args.shell, args.out_dir.as_deref()),
    }
}

fn cmd_completions(shell: clap_complete::Shell, out_dir: Option<&std::path::Path>) -> Result<()> {
    use clap_complete::{generate, generate_to};
    let mut cmd = Cli::command();
    let bin = "agent-utils";
    match out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = generate_to(shell, &mut cmd, bin, dir)?;
            eprintln!("wrote {}", path.display());
        }
        None => generate(shell, &mut cmd, bin, &mut std::io::stdout()),
    }
    Ok(())
}
