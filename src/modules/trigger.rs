use crate::modules::item::Material;
use crate::modules::settings::StructureSettings;
use crate::modules::world::{BlockFace, Position, World};

/// Where and how far a triggered run searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    /// The trigger block; the scan is centred on it.
    pub center: Position,
    pub trigger_block: Material,
    pub radius: i32,
    pub y_radius: i32,
}

/// Checks the frame at `frame_position` against the configured structure:
/// the frame shows a chest, hangs on the anchor block, and the anchor stands
/// on a trigger block.
pub fn match_frame(
    world: &World,
    frame_position: Position,
    structure: &StructureSettings,
) -> Option<TriggerMatch> {
    let frame = world.frame_at(frame_position)?;
    let shown = frame.item.as_ref()?;
    if shown.kind != Material::Chest || shown.is_empty() {
        return None;
    }

    let anchor = frame_position.relative(frame.attached);
    if world.block_at(anchor) != structure.anchor_block {
        return None;
    }

    let below = anchor.relative(BlockFace::Down);
    let trigger_block = world.block_at(below);
    let radius = *structure.triggers.get(&trigger_block)?;
    Some(TriggerMatch {
        center: below,
        trigger_block,
        radius,
        y_radius: structure.y_radius,
    })
}
