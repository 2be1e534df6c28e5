use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::modules::item::{CARRY_SLOTS, CONTAINER_SLOTS, Inventory, ItemStack, Material};

pub type ActorId = u64;

/// Lowest buildable y of a default world.
pub const DEFAULT_MIN_HEIGHT: i32 = -64;
/// Exclusive upper y limit of a default world.
pub const DEFAULT_MAX_HEIGHT: i32 = 320;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn origin() -> Self {
        Self { x: 0, y: 0, z: 0 }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    pub const fn relative(self, face: BlockFace) -> Self {
        let (dx, dy, dz) = face.direction();
        self.offset(dx, dy, dz)
    }

    /// Centre of the cell, in continuous coordinates.
    pub fn center(self) -> (f64, f64, f64) {
        (
            self.x as f64 + 0.5,
            self.y as f64 + 0.5,
            self.z as f64 + 0.5,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BlockFace {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl BlockFace {
    pub const fn direction(self) -> (i32, i32, i32) {
        match self {
            BlockFace::North => (0, 0, -1),
            BlockFace::South => (0, 0, 1),
            BlockFace::East => (1, 0, 0),
            BlockFace::West => (-1, 0, 0),
            BlockFace::Up => (0, 1, 0),
            BlockFace::Down => (0, -1, 0),
        }
    }
}

/// Vertical build limits; `max_height` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_height: i32,
    pub max_height: i32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_height: DEFAULT_MIN_HEIGHT,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl WorldBounds {
    pub fn contains_y(&self, y: i32) -> bool {
        y >= self.min_height && y < self.max_height
    }
}

/// A lock sign protecting the container it is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSign {
    pub owner: String,
    #[serde(default)]
    pub users: Vec<String>,
}

impl LockSign {
    pub fn allows(&self, name: &str) -> bool {
        self.owner == name || self.users.iter().any(|u| u == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFrame {
    /// Side of the frame's cell holding the block it hangs on.
    pub attached: BlockFace,
    pub item: Option<ItemStack>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub position: Position,
    pub online: bool,
    #[serde(default)]
    pub held: Option<ItemStack>,
    pub carry: Inventory,
    #[serde(default)]
    pub inbox: Vec<String>,
}

impl Actor {
    pub fn notify(&mut self, message: impl Into<String>) {
        self.inbox.push(message.into());
    }

    pub fn take_inbox(&mut self) -> Vec<String> {
        std::mem::take(&mut self.inbox)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedItem {
    pub position: Position,
    pub item: ItemStack,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldError {
    OutOfBounds { position: Position, bounds: WorldBounds },
    NotAContainer(Position),
    MissingInventory(Position),
    SlotOutOfRange { position: Position, slot: usize },
    ActorNotFound(ActorId),
    DuplicateActor(String),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::OutOfBounds { position, bounds } => write!(
                f,
                "position {} is outside the build limits [{}, {})",
                position, bounds.min_height, bounds.max_height
            ),
            WorldError::NotAContainer(position) => {
                write!(f, "block at {} is not a container", position)
            }
            WorldError::MissingInventory(position) => write!(
                f,
                "container block at {} has no inventory attached",
                position
            ),
            WorldError::SlotOutOfRange { position, slot } => {
                write!(f, "slot {} out of range for container at {}", slot, position)
            }
            WorldError::ActorNotFound(id) => write!(f, "actor {} not found", id),
            WorldError::DuplicateActor(name) => write!(f, "actor '{}' already exists", name),
        }
    }
}

impl std::error::Error for WorldError {}

#[derive(Debug, Clone, Default)]
pub struct World {
    bounds: WorldBounds,
    tick: u64,
    next_actor_id: ActorId,
    blocks: HashMap<Position, Material>,
    containers: HashMap<Position, Inventory>,
    locks: HashMap<Position, LockSign>,
    frames: HashMap<Position, ItemFrame>,
    actors: BTreeMap<ActorId, Actor>,
    dropped: Vec<DroppedItem>,
}

impl World {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            next_actor_id: 1,
            ..Self::default()
        }
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn block_at(&self, position: Position) -> Material {
        self.blocks.get(&position).copied().unwrap_or_default()
    }

    /// Sets a block. Replacing a container spills its contents where it stood.
    pub fn set_block(&mut self, position: Position, material: Material) -> Result<(), WorldError> {
        if !self.bounds.contains_y(position.y) {
            return Err(WorldError::OutOfBounds {
                position,
                bounds: self.bounds,
            });
        }

        if let Some(old) = self.containers.remove(&position) {
            for item in old.items() {
                self.dropped.push(DroppedItem {
                    position,
                    item: item.clone(),
                });
            }
        }
        self.locks.remove(&position);

        if material == Material::Air {
            self.blocks.remove(&position);
        } else {
            self.blocks.insert(position, material);
            if material.is_container() {
                self.containers
                    .insert(position, Inventory::with_size(CONTAINER_SLOTS));
            }
        }
        Ok(())
    }

    pub fn container(&self, position: Position) -> Option<&Inventory> {
        self.containers.get(&position)
    }

    pub fn container_mut(&mut self, position: Position) -> Option<&mut Inventory> {
        self.containers.get_mut(&position)
    }

    /// Drops the inventory of a container while leaving its block in place.
    pub fn detach_inventory(&mut self, position: Position) -> Option<Inventory> {
        self.containers.remove(&position)
    }

    pub fn put_in_container(
        &mut self,
        position: Position,
        slot: Option<usize>,
        item: ItemStack,
    ) -> Result<Option<ItemStack>, WorldError> {
        if !self.block_at(position).is_container() {
            return Err(WorldError::NotAContainer(position));
        }
        let inventory = self
            .containers
            .get_mut(&position)
            .ok_or(WorldError::MissingInventory(position))?;
        match slot {
            Some(slot) => {
                inventory
                    .set(slot, Some(item))
                    .map_err(|_| WorldError::SlotOutOfRange { position, slot })?;
                Ok(None)
            }
            None => Ok(inventory.add_item(item)),
        }
    }

    pub fn lock_container(&mut self, position: Position, sign: LockSign) -> Result<(), WorldError> {
        if !self.block_at(position).is_container() {
            return Err(WorldError::NotAContainer(position));
        }
        self.locks.insert(position, sign);
        Ok(())
    }

    pub fn lock_at(&self, position: Position) -> Option<&LockSign> {
        self.locks.get(&position)
    }

    pub fn place_frame(&mut self, position: Position, frame: ItemFrame) {
        self.frames.insert(position, frame);
    }

    pub fn frame_at(&self, position: Position) -> Option<&ItemFrame> {
        self.frames.get(&position)
    }

    pub fn spawn_actor(
        &mut self,
        name: impl Into<String>,
        position: Position,
    ) -> Result<ActorId, WorldError> {
        let name = name.into();
        if self.actors.values().any(|a| a.name == name) {
            return Err(WorldError::DuplicateActor(name));
        }
        let id = self.next_actor_id.max(1);
        self.next_actor_id = id + 1;
        self.actors.insert(
            id,
            Actor {
                id,
                name,
                position,
                online: true,
                held: None,
                carry: Inventory::with_size(CARRY_SLOTS),
                inbox: Vec::new(),
            },
        );
        Ok(id)
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn actor_by_name(&self, name: &str) -> Option<&Actor> {
        self.actors.values().find(|a| a.name == name)
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Whether the actor can currently receive items and notices.
    pub fn is_reachable(&self, id: ActorId) -> bool {
        self.actors.get(&id).is_some_and(|a| a.online)
    }

    pub fn drop_item(&mut self, position: Position, item: ItemStack) {
        if item.is_empty() {
            return;
        }
        self.dropped.push(DroppedItem { position, item });
    }

    pub fn dropped(&self) -> &[DroppedItem] {
        &self.dropped
    }

    pub fn container_positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.containers.keys().copied().collect();
        positions.sort();
        positions
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mut blocks: Vec<BlockRecord> = self
            .blocks
            .iter()
            .map(|(position, material)| BlockRecord {
                position: *position,
                material: *material,
            })
            .collect();
        let mut containers: Vec<ContainerRecord> = self
            .containers
            .iter()
            .map(|(position, inventory)| ContainerRecord {
                position: *position,
                inventory: inventory.clone(),
            })
            .collect();
        let mut locks: Vec<LockRecord> = self
            .locks
            .iter()
            .map(|(position, sign)| LockRecord {
                position: *position,
                sign: sign.clone(),
            })
            .collect();
        let mut frames: Vec<FrameRecord> = self
            .frames
            .iter()
            .map(|(position, frame)| FrameRecord {
                position: *position,
                frame: frame.clone(),
            })
            .collect();

        blocks.sort_by_key(|b| b.position);
        containers.sort_by_key(|c| c.position);
        locks.sort_by_key(|l| l.position);
        frames.sort_by_key(|f| f.position);

        WorldSnapshot {
            bounds: self.bounds,
            tick: self.tick,
            next_actor_id: self.next_actor_id,
            blocks,
            containers,
            locks,
            frames,
            actors: self.actors.values().cloned().collect(),
            dropped: self.dropped.clone(),
        }
    }

    pub fn from_snapshot(snapshot: WorldSnapshot) -> Self {
        let next_actor_id = snapshot
            .actors
            .iter()
            .map(|a| a.id + 1)
            .max()
            .unwrap_or(1)
            .max(snapshot.next_actor_id);
        Self {
            bounds: snapshot.bounds,
            tick: snapshot.tick,
            next_actor_id,
            blocks: snapshot
                .blocks
                .into_iter()
                .map(|b| (b.position, b.material))
                .collect(),
            containers: snapshot
                .containers
                .into_iter()
                .map(|c| (c.position, c.inventory))
                .collect(),
            locks: snapshot
                .locks
                .into_iter()
                .map(|l| (l.position, l.sign))
                .collect(),
            frames: snapshot
                .frames
                .into_iter()
                .map(|f| (f.position, f.frame))
                .collect(),
            actors: snapshot.actors.into_iter().map(|a| (a.id, a)).collect(),
            dropped: snapshot.dropped,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub position: Position,
    pub material: Material,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub position: Position,
    pub inventory: Inventory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub position: Position,
    pub sign: LockSign,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub position: Position,
    pub frame: ItemFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub bounds: WorldBounds,
    #[serde(default)]
    pub tick: u64,
    #[serde(default)]
    pub next_actor_id: ActorId,
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
    #[serde(default)]
    pub containers: Vec<ContainerRecord>,
    #[serde(default)]
    pub locks: Vec<LockRecord>,
    #[serde(default)]
    pub frames: Vec<FrameRecord>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub dropped: Vec<DroppedItem>,
}

pub fn data_dir() -> PathBuf {
    PathBuf::from(".autostash")
}

pub fn world_file_path(dir: &Path) -> PathBuf {
    dir.join("world.json")
}

pub fn load_world_from(dir: &Path) -> io::Result<Option<World>> {
    let path = world_file_path(dir);
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let snapshot: WorldSnapshot = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse world file {}; delete it or run `autostash init` to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(Some(World::from_snapshot(snapshot)))
}

pub fn save_world_to(dir: &Path, world: &World) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = world_file_path(dir);
    let json = serde_json::to_vec_pretty(&world.snapshot())?;
    fs::write(&path, json)?;
    Ok(path)
}

pub fn load_world() -> io::Result<Option<World>> {
    load_world_from(&data_dir())
}

pub fn save_world(world: &World) -> io::Result<PathBuf> {
    save_world_to(&data_dir(), world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn placing_container_attaches_inventory() {
        let mut world = World::new(WorldBounds::default());
        let pos = Position::new(2, 64, -3);
        world.set_block(pos, Material::Barrel).unwrap();

        assert_eq!(world.block_at(pos), Material::Barrel);
        assert_eq!(world.container(pos).unwrap().size(), CONTAINER_SLOTS);
        assert_eq!(world.block_at(pos.offset(1, 0, 0)), Material::Air);
    }

    #[test]
    fn breaking_container_spills_contents() {
        let mut world = World::new(WorldBounds::default());
        let pos = Position::origin();
        world.set_block(pos, Material::Chest).unwrap();
        world
            .put_in_container(pos, None, ItemStack::new(Material::Coal, 12))
            .unwrap();

        world.set_block(pos, Material::Air).unwrap();

        assert!(world.container(pos).is_none());
        assert_eq!(world.dropped().len(), 1);
        assert_eq!(world.dropped()[0].item, ItemStack::new(Material::Coal, 12));
    }

    #[test]
    fn blocks_outside_build_limits_are_rejected() {
        let mut world = World::new(WorldBounds {
            min_height: 0,
            max_height: 16,
        });
        let err = world
            .set_block(Position::new(0, 16, 0), Material::Stone)
            .unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds { .. }));
    }

    #[test]
    fn actor_names_are_unique() {
        let mut world = World::new(WorldBounds::default());
        let first = world.spawn_actor("Steve", Position::origin()).unwrap();
        let second = world.spawn_actor("Alex", Position::origin()).unwrap();
        assert_ne!(first, second);
        assert!(matches!(
            world.spawn_actor("Steve", Position::origin()),
            Err(WorldError::DuplicateActor(_))
        ));
    }

    #[test]
    fn face_offsets() {
        let pos = Position::new(1, 1, 1);
        assert_eq!(pos.relative(BlockFace::Down), Position::new(1, 0, 1));
        assert_eq!(pos.relative(BlockFace::North), Position::new(1, 1, 0));
        assert_eq!(pos.relative(BlockFace::East), Position::new(2, 1, 1));
    }

    #[test]
    fn world_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut world = World::new(WorldBounds::default());
        let chest = Position::new(4, 70, 4);
        world.set_block(chest, Material::Chest).unwrap();
        world
            .put_in_container(chest, Some(3), ItemStack::new(Material::Diamond, 5))
            .unwrap();
        world
            .lock_container(
                chest,
                LockSign {
                    owner: "Steve".into(),
                    users: vec!["Alex".into()],
                },
            )
            .unwrap();
        let id = world.spawn_actor("Steve", chest.offset(0, 1, 0)).unwrap();

        save_world_to(dir.path(), &world).unwrap();
        let loaded = load_world_from(dir.path()).unwrap().expect("world saved");

        assert_eq!(loaded.block_at(chest), Material::Chest);
        assert_eq!(loaded.container(chest).unwrap().get(3).unwrap().amount, 5);
        assert!(loaded.lock_at(chest).unwrap().allows("Alex"));
        assert_eq!(loaded.actor(id).unwrap().name, "Steve");

        let mut loaded = loaded;
        let next = loaded.spawn_actor("Alex", Position::origin()).unwrap();
        assert!(next > id);
    }

    #[test]
    fn missing_world_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_world_from(dir.path()).unwrap().is_none());
    }
}
