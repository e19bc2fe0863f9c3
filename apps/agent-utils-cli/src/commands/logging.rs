use agent_utils_client::is_truthy;
use anyhow::Result;
use clap::{Subcommand, ValueEnum};

use super::util::{require_truthy, Remote};
use crate::config::Settings;

#[derive(Subcommand)]
pub enum LoggingCmd {
    /// Show whether interaction logging is enabled
    Get,
    /// Turn interaction logging on or off
    Set {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

pub fn execute(cmd: LoggingCmd, settings: &Settings) -> Result<()> {
    let mut remote = Remote::connect(settings)?;
    let target = remote.target()?;
    match cmd {
        LoggingCmd::Get => {
            let value = remote.client.get_logging(&mut remote.session, &target)?;
            println!("{}", if is_truthy(&value) { "on" } else { "off" });
        }
        LoggingCmd::Set { state } => {
            let result =
                remote
                    .client
                    .set_logging(&mut remote.session, &target, state.enabled())?;
            require_truthy(result, "Failed to update logging config.")?;
            println!("Agent logging config updated");
        }
    }
    Ok(())
}
