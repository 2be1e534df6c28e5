pub mod modules;

pub use modules::access::{AccessFilter, SignLockFilter, is_accessible};
pub use modules::audit::{self, AuditRecord, AuditTrail, TransactionLog};
pub use modules::effect::{Flight, ease_out};
pub use modules::item::{
    CARRY_SLOTS, CONTAINER_SLOTS, Inventory, ItemMeta, ItemStack, Material, TRAY_SLOTS,
};
pub use modules::messages::{MessageKey, Messages};
pub use modules::placement::{PlacementResult, ReturnOutcome, drop_items, place, return_items};
pub use modules::scan::{
    BoundingBox, ContainerInfo, DEFAULT_BLOCKS_PER_TICK, RegionScanner, ScanCursor,
};
pub use modules::seed::{SeedCommand, SeededContainer, WorldCommands};
pub use modules::session::{
    OrganizeError, Organizer, SessionRegistry, TickReport, TraySession,
};
pub use modules::settings::{
    self, IntegrationSettings, PerformanceSettings, Settings, SettingsCommands,
    StructureSettings, VisualSettings, load_settings, save_settings,
};
pub use modules::task::{Integrations, OrganizeEvent, OrganizeRequest, OrganizeTask};
pub use modules::trigger::{TriggerMatch, match_frame};
pub use modules::world;
pub use modules::world::{
    Actor, ActorId, BlockFace, DroppedItem, ItemFrame, LockSign, Position, World, WorldBounds,
    WorldError, WorldSnapshot, data_dir, load_world, save_world,
};
