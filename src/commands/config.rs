use autostash::{SettingsCommands, load_settings, save_settings};
use clap::Subcommand;

use super::require_world;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Use the block in the actor's main hand as the structure's anchor block
    SetAnchor {
        #[arg(long)]
        actor: String,
    },
    /// Register the held block as a trigger block with its search radius
    AddTrigger {
        #[arg(long)]
        actor: String,
        /// Horizontal search radius (1-200)
        #[arg(long)]
        range: i32,
    },
    /// Unregister the held block as a trigger block
    RemoveTrigger {
        #[arg(long)]
        actor: String,
    },
    /// Cells scanned per tick (at least 1)
    SetBlockSpeed { blocks: usize },
    /// Vertical search radius (1-50)
    SetYRadius { radius: i32 },
    /// Flying item animation length in ticks (1-200)
    SetFlightTime { ticks: u32 },
    /// Show the current settings
    List,
}

pub(super) fn run_config(cmd: ConfigCommand) -> Result<(), String> {
    let mut settings = load_settings().map_err(|e| e.to_string())?;

    let confirmation = match cmd {
        ConfigCommand::List => {
            for line in SettingsCommands::describe(&settings) {
                println!("{}", line);
            }
            return Ok(());
        }
        ConfigCommand::SetAnchor { actor } => {
            let world = require_world()?;
            SettingsCommands::set_anchor(&mut settings, &world, &actor)?
        }
        ConfigCommand::AddTrigger { actor, range } => {
            let world = require_world()?;
            SettingsCommands::add_trigger(&mut settings, &world, &actor, range)?
        }
        ConfigCommand::RemoveTrigger { actor } => {
            let world = require_world()?;
            SettingsCommands::remove_trigger(&mut settings, &world, &actor)?
        }
        ConfigCommand::SetBlockSpeed { blocks } => {
            SettingsCommands::set_blocks_per_tick(&mut settings, blocks)?
        }
        ConfigCommand::SetYRadius { radius } => SettingsCommands::set_y_radius(&mut settings, radius)?,
        ConfigCommand::SetFlightTime { ticks } => {
            SettingsCommands::set_flight_time(&mut settings, ticks)?
        }
    };

    let path = save_settings(&settings).map_err(|e| e.to_string())?;
    println!("{} (saved to {})", confirmation, path.display());
    Ok(())
}
