use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::modules::item::Material;
use crate::modules::messages::{MessageKey, Messages};
use crate::modules::scan::DEFAULT_BLOCKS_PER_TICK;
use crate::modules::world::{World, data_dir};

pub const MAX_TRIGGER_RANGE: i32 = 200;
pub const MAX_Y_RADIUS: i32 = 50;
pub const MAX_FLIGHT_TICKS: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    pub blocks_per_tick: usize,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            blocks_per_tick: DEFAULT_BLOCKS_PER_TICK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    pub enabled: bool,
    pub flight_duration_ticks: u32,
    pub arc_height: f64,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            flight_duration_ticks: 30,
            arc_height: 0.3,
        }
    }
}

/// Toggles for the optional collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub audit: bool,
    pub locks: bool,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            audit: true,
            locks: true,
        }
    }
}

/// The trigger structure: an anchor block standing on a trigger block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureSettings {
    pub anchor_block: Material,
    pub y_radius: i32,
    pub triggers: BTreeMap<Material, i32>,
}

impl Default for StructureSettings {
    fn default() -> Self {
        let triggers = [
            (Material::DiamondBlock, 50),
            (Material::EmeraldBlock, 30),
            (Material::GoldBlock, 20),
            (Material::IronBlock, 15),
        ]
        .into_iter()
        .collect();
        Self {
            anchor_block: Material::Lodestone,
            y_radius: 5,
            triggers,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub performance: PerformanceSettings,
    pub visual_effects: VisualSettings,
    pub integrations: IntegrationSettings,
    pub structure: StructureSettings,
    pub messages: BTreeMap<MessageKey, String>,
}

impl Settings {
    pub fn messages(&self) -> Messages {
        Messages::with_overrides(&self.messages)
    }

    pub fn blocks_per_tick(&self) -> usize {
        self.performance.blocks_per_tick.max(1)
    }
}

pub fn settings_file_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}

pub fn load_settings_from(dir: &Path) -> io::Result<Settings> {
    let path = settings_file_path(dir);
    if !path.exists() {
        return Ok(Settings::default());
    }

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(Settings::default());
    }

    let settings: Settings = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse settings file {}; delete it to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(settings)
}

pub fn save_settings_to(dir: &Path, settings: &Settings) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = settings_file_path(dir);
    let json = serde_json::to_vec_pretty(settings)?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn load_settings() -> io::Result<Settings> {
    load_settings_from(&data_dir())
}

pub fn save_settings(settings: &Settings) -> io::Result<PathBuf> {
    save_settings_to(&data_dir(), settings)
}

/// Administrative edits to the settings. Each returns the confirmation text.
pub struct SettingsCommands;

impl SettingsCommands {
    fn held_block(world: &World, actor: &str) -> Result<Material, String> {
        let actor = world
            .actor_by_name(actor)
            .ok_or_else(|| format!("actor '{}' not found", actor))?;
        let held = actor
            .held
            .as_ref()
            .filter(|item| !item.is_empty())
            .ok_or_else(|| format!("{} must hold a block in their main hand", actor.name))?;
        if !held.kind.is_block() {
            return Err(format!("{} is not a block", held.kind));
        }
        Ok(held.kind)
    }

    pub fn set_anchor(settings: &mut Settings, world: &World, actor: &str) -> Result<String, String> {
        let block = Self::held_block(world, actor)?;
        settings.structure.anchor_block = block;
        Ok(format!("anchor block set to {}", block))
    }

    pub fn add_trigger(
        settings: &mut Settings,
        world: &World,
        actor: &str,
        range: i32,
    ) -> Result<String, String> {
        if !(1..=MAX_TRIGGER_RANGE).contains(&range) {
            return Err(format!("range must be between 1 and {}", MAX_TRIGGER_RANGE));
        }
        let block = Self::held_block(world, actor)?;
        match settings.structure.triggers.insert(block, range) {
            Some(_) => Ok(format!("updated trigger {} -> range {}", block, range)),
            None => Ok(format!("added trigger {} -> range {}", block, range)),
        }
    }

    pub fn remove_trigger(settings: &mut Settings, world: &World, actor: &str) -> Result<String, String> {
        let block = Self::held_block(world, actor)?;
        match settings.structure.triggers.remove(&block) {
            Some(_) => Ok(format!("removed trigger {}", block)),
            None => Err(format!("{} is not a configured trigger", block)),
        }
    }

    pub fn set_blocks_per_tick(settings: &mut Settings, blocks: usize) -> Result<String, String> {
        if blocks == 0 {
            return Err("blocks per tick must be at least 1".into());
        }
        settings.performance.blocks_per_tick = blocks;
        Ok(format!("scanning {} blocks per tick", blocks))
    }

    pub fn set_y_radius(settings: &mut Settings, y_radius: i32) -> Result<String, String> {
        if !(1..=MAX_Y_RADIUS).contains(&y_radius) {
            return Err(format!("y radius must be between 1 and {}", MAX_Y_RADIUS));
        }
        settings.structure.y_radius = y_radius;
        Ok(format!("y radius set to {}", y_radius))
    }

    pub fn set_flight_time(settings: &mut Settings, ticks: u32) -> Result<String, String> {
        if !(1..=MAX_FLIGHT_TICKS).contains(&ticks) {
            return Err(format!("flight time must be between 1 and {}", MAX_FLIGHT_TICKS));
        }
        settings.visual_effects.flight_duration_ticks = ticks;
        Ok(format!("flight time set to {} ticks", ticks))
    }

    pub fn describe(settings: &Settings) -> Vec<String> {
        let mut lines = vec![
            format!("anchor block     : {}", settings.structure.anchor_block),
            format!("y radius         : {}", settings.structure.y_radius),
            format!("blocks per tick  : {}", settings.performance.blocks_per_tick),
            format!(
                "flight time      : {} ticks{}",
                settings.visual_effects.flight_duration_ticks,
                if settings.visual_effects.enabled { "" } else { " (effects off)" }
            ),
            format!(
                "integrations     : audit={} locks={}",
                settings.integrations.audit, settings.integrations.locks
            ),
            "triggers:".to_string(),
        ];
        if settings.structure.triggers.is_empty() {
            lines.push("  (none)".to_string());
        }
        for (block, range) in &settings.structure.triggers {
            lines.push(format!("  {} -> range {}", block, range));
        }
        lines
    }
}
