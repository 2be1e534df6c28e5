use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::modules::item::{ItemStack, Material};
use crate::modules::world::{Position, World};

const CONTAINER_KINDS: [Material; 3] = [Material::Chest, Material::Barrel, Material::TrappedChest];

const DEFAULT_STOCK: [Material; 8] = [
    Material::Coal,
    Material::IronIngot,
    Material::Wheat,
    Material::Bread,
    Material::Apple,
    Material::Stick,
    Material::Cobblestone,
    Material::Dirt,
];

const ATTEMPTS_PER_CONTAINER: u32 = 32;

#[derive(Debug, Clone)]
pub struct SeedCommand {
    pub center: Position,
    pub radius: i32,
    pub count: u32,
    /// Item kinds to stock containers with; empty means a default mix.
    pub stock: Vec<Material>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededContainer {
    pub position: Position,
    pub kind: Material,
    pub contents: Vec<ItemStack>,
}

/// Command-side world mutations.
pub struct WorldCommands;

impl WorldCommands {
    /// Scatters stocked containers over free cells around a centre.
    pub fn seed_containers(world: &mut World, cmd: &SeedCommand) -> Result<Vec<SeededContainer>, String> {
        if cmd.count == 0 {
            return Err("count must be at least 1".into());
        }
        if cmd.radius < 0 {
            return Err("radius must not be negative".into());
        }
        let stock: &[Material] = if cmd.stock.is_empty() {
            &DEFAULT_STOCK
        } else {
            &cmd.stock
        };
        if let Some(bad) = stock.iter().find(|m| m.max_stack_size() == 0) {
            return Err(format!("{} cannot be stocked", bad));
        }

        let mut rng = match cmd.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut placed = Vec::new();
        for _ in 0..cmd.count {
            let Some(position) = free_position(world, cmd.center, cmd.radius, &mut rng) else {
                log::warn!("no free cell left around {}; placed {}", cmd.center, placed.len());
                break;
            };
            let kind = *CONTAINER_KINDS.choose(&mut rng).unwrap_or(&Material::Chest);
            world.set_block(position, kind).map_err(|e| e.to_string())?;

            let mut contents = Vec::new();
            for slot in 0..rng.gen_range(1..=3usize) {
                let Some(item_kind) = stock.choose(&mut rng).copied() else {
                    break;
                };
                let item = ItemStack::new(item_kind, rng.gen_range(1..=item_kind.max_stack_size()));
                world
                    .put_in_container(position, Some(slot), item.clone())
                    .map_err(|e| e.to_string())?;
                contents.push(item);
            }
            placed.push(SeededContainer {
                position,
                kind,
                contents,
            });
        }
        Ok(placed)
    }
}

fn free_position(world: &World, center: Position, radius: i32, rng: &mut StdRng) -> Option<Position> {
    let bounds = world.bounds();
    for _ in 0..ATTEMPTS_PER_CONTAINER {
        let candidate = Position {
            x: center.x + rng.gen_range(-radius..=radius),
            y: center.y + rng.gen_range(-radius..=radius),
            z: center.z + rng.gen_range(-radius..=radius),
        };
        if bounds.contains_y(candidate.y) && world.block_at(candidate) == Material::Air {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::world::WorldBounds;

    fn cmd(seed: u64) -> SeedCommand {
        SeedCommand {
            center: Position::new(0, 64, 0),
            radius: 6,
            count: 5,
            stock: Vec::new(),
            seed: Some(seed),
        }
    }

    #[test]
    fn same_seed_same_world() {
        let mut a = World::new(WorldBounds::default());
        let mut b = World::new(WorldBounds::default());
        let first = WorldCommands::seed_containers(&mut a, &cmd(7)).unwrap();
        let second = WorldCommands::seed_containers(&mut b, &cmd(7)).unwrap();
        assert_eq!(first, second);
        assert_eq!(a.container_positions(), b.container_positions());
    }

    #[test]
    fn seeded_containers_hold_their_stock() {
        let mut world = World::new(WorldBounds::default());
        let mut command = cmd(42);
        command.stock = vec![Material::Egg];
        let placed = WorldCommands::seed_containers(&mut world, &command).unwrap();

        assert_eq!(placed.len(), 5);
        for container in &placed {
            assert!(container.kind.is_container());
            assert!(!container.contents.is_empty());
            let inv = world.container(container.position).unwrap();
            assert!(inv.items().all(|i| i.kind == Material::Egg && i.amount <= 16));
        }
    }

    #[test]
    fn rejects_empty_request() {
        let mut world = World::new(WorldBounds::default());
        let mut command = cmd(1);
        command.count = 0;
        assert!(WorldCommands::seed_containers(&mut world, &command).is_err());
        command.count = 1;
        command.stock = vec![Material::Air];
        assert!(WorldCommands::seed_containers(&mut world, &command).is_err());
    }
}
