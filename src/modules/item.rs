use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Slot count of every container block.
pub const CONTAINER_SLOTS: usize = 27;
/// Slot count of an actor's carry inventory.
pub const CARRY_SLOTS: usize = 36;
/// Slot count of the holding tray opened for a session.
pub const TRAY_SLOTS: usize = 54;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Material {
    #[default]
    Air,
    Stone,
    Cobblestone,
    Dirt,
    Sand,
    Gravel,
    Glass,
    OakLog,
    OakPlanks,
    Torch,
    Lodestone,
    DiamondBlock,
    EmeraldBlock,
    GoldBlock,
    IronBlock,
    Chest,
    TrappedChest,
    Barrel,
    ShulkerBox,
    WhiteShulkerBox,
    OrangeShulkerBox,
    MagentaShulkerBox,
    LightBlueShulkerBox,
    YellowShulkerBox,
    LimeShulkerBox,
    PinkShulkerBox,
    GrayShulkerBox,
    LightGrayShulkerBox,
    CyanShulkerBox,
    PurpleShulkerBox,
    BlueShulkerBox,
    BrownShulkerBox,
    GreenShulkerBox,
    RedShulkerBox,
    BlackShulkerBox,
    Diamond,
    Emerald,
    IronIngot,
    GoldIngot,
    Coal,
    Stick,
    Apple,
    Bread,
    Wheat,
    Egg,
    Snowball,
    EnderPearl,
    Bucket,
    WaterBucket,
    IronPickaxe,
    DiamondSword,
}

impl Material {
    pub const fn max_stack_size(self) -> u32 {
        match self {
            Material::Air => 0,
            Material::Egg | Material::Snowball | Material::EnderPearl | Material::Bucket => 16,
            Material::WaterBucket | Material::IronPickaxe | Material::DiamondSword => 1,
            m if m.is_shulker_box() => 1,
            _ => 64,
        }
    }

    pub const fn is_shulker_box(self) -> bool {
        matches!(
            self,
            Material::ShulkerBox
                | Material::WhiteShulkerBox
                | Material::OrangeShulkerBox
                | Material::MagentaShulkerBox
                | Material::LightBlueShulkerBox
                | Material::YellowShulkerBox
                | Material::LimeShulkerBox
                | Material::PinkShulkerBox
                | Material::GrayShulkerBox
                | Material::LightGrayShulkerBox
                | Material::CyanShulkerBox
                | Material::PurpleShulkerBox
                | Material::BlueShulkerBox
                | Material::BrownShulkerBox
                | Material::GreenShulkerBox
                | Material::RedShulkerBox
                | Material::BlackShulkerBox
        )
    }

    /// Chest-like blocks the scanner treats as storage.
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Material::Chest | Material::TrappedChest | Material::Barrel
        ) || self.is_shulker_box()
    }

    /// Whether the material can be placed as a block.
    pub const fn is_block(self) -> bool {
        !matches!(
            self,
            Material::Diamond
                | Material::Emerald
                | Material::IronIngot
                | Material::GoldIngot
                | Material::Coal
                | Material::Stick
                | Material::Apple
                | Material::Bread
                | Material::Wheat
                | Material::Egg
                | Material::Snowball
                | Material::EnderPearl
                | Material::Bucket
                | Material::WaterBucket
                | Material::IronPickaxe
                | Material::DiamondSword
        )
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix("minecraft:").unwrap_or(trimmed);
        <Material as ValueEnum>::from_str(name, true)
            .map_err(|_| format!("unknown material '{}'", trimmed))
    }
}

/// Opaque per-stack tags (custom names, enchantments, ...). Compared for equality only.
pub type ItemMeta = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: Material,
    pub amount: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: ItemMeta,
}

impl ItemStack {
    pub fn new(kind: Material, amount: u32) -> Self {
        Self {
            kind,
            amount,
            meta: ItemMeta::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Copy of this stack carrying a different amount.
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            kind: self.kind,
            amount,
            meta: self.meta.clone(),
        }
    }

    pub fn max_stack_size(&self) -> u32 {
        self.kind.max_stack_size()
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0 || self.kind == Material::Air
    }

    pub fn is_similar(&self, other: &ItemStack) -> bool {
        self.kind == other.kind && self.meta == other.meta
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.meta.is_empty() {
            write!(f, "{} x{}", self.kind, self.amount)
        } else {
            write!(f, "{} x{} {:?}", self.kind, self.amount, self.meta)
        }
    }
}

/// Fixed-size ordered slot grid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
}

impl Inventory {
    pub fn with_size(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn set(&mut self, slot: usize, item: Option<ItemStack>) -> Result<(), String> {
        let size = self.slots.len();
        let target = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| format!("slot {} out of range (size {})", slot, size))?;
        *target = item.filter(|i| !i.is_empty());
        Ok(())
    }

    /// Non-empty stacks in slot order.
    pub fn items(&self) -> impl Iterator<Item = &ItemStack> {
        self.slots.iter().flatten().filter(|i| !i.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }

    pub fn contains_similar(&self, item: &ItemStack) -> bool {
        self.items().any(|existing| existing.is_similar(item))
    }

    /// Sum of amounts of stacks similar to `item`.
    pub fn count_similar(&self, item: &ItemStack) -> u32 {
        self.items()
            .filter(|existing| existing.is_similar(item))
            .map(|existing| existing.amount)
            .sum()
    }

    /// Tops up similar stacks in slot order, taking from `item`. Returns the amount moved.
    pub fn merge_into_similar(&mut self, item: &mut ItemStack) -> u32 {
        let mut moved = 0;
        for existing in self.slots.iter_mut().flatten() {
            if item.amount == 0 {
                break;
            }
            if existing.is_empty() || !existing.is_similar(item) {
                continue;
            }
            let room = existing.max_stack_size().saturating_sub(existing.amount);
            if room == 0 {
                continue;
            }
            let add = room.min(item.amount);
            existing.amount += add;
            item.amount -= add;
            moved += add;
        }
        moved
    }

    /// Puts `item` into empty slots in slot order, one max-size stack per slot.
    pub fn fill_empty_slots(&mut self, item: &mut ItemStack) -> u32 {
        let max = item.max_stack_size();
        if max == 0 {
            return 0;
        }
        let mut moved = 0;
        for slot in self.slots.iter_mut() {
            if item.amount == 0 {
                break;
            }
            if slot.as_ref().is_some_and(|s| !s.is_empty()) {
                continue;
            }
            let put = max.min(item.amount);
            *slot = Some(item.with_amount(put));
            item.amount -= put;
            moved += put;
        }
        moved
    }

    /// Merge first, then empty slots. Returns whatever did not fit.
    pub fn add_item(&mut self, item: ItemStack) -> Option<ItemStack> {
        let mut remaining = item;
        if remaining.is_empty() {
            return None;
        }
        self.merge_into_similar(&mut remaining);
        self.fill_empty_slots(&mut remaining);
        (remaining.amount > 0).then_some(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_names_round_trip() {
        assert_eq!(Material::LightBlueShulkerBox.to_string(), "light_blue_shulker_box");
        assert_eq!(
            "minecraft:trapped_chest".parse::<Material>().unwrap(),
            Material::TrappedChest
        );
        assert_eq!("  Barrel ".parse::<Material>().unwrap(), Material::Barrel);
        assert!("bedrock".parse::<Material>().is_err());
    }

    #[test]
    fn container_set_is_closed() {
        assert!(Material::Chest.is_container());
        assert!(Material::RedShulkerBox.is_container());
        assert!(!Material::Lodestone.is_container());
        assert!(!Material::Air.is_container());
    }

    #[test]
    fn stack_limits_by_kind() {
        assert_eq!(Material::Cobblestone.max_stack_size(), 64);
        assert_eq!(Material::EnderPearl.max_stack_size(), 16);
        assert_eq!(Material::DiamondSword.max_stack_size(), 1);
        assert_eq!(Material::ShulkerBox.max_stack_size(), 1);
    }

    #[test]
    fn similarity_includes_meta() {
        let plain = ItemStack::new(Material::Diamond, 3);
        let named = ItemStack::new(Material::Diamond, 3).with_meta("name", "Shiny");
        assert!(plain.is_similar(&ItemStack::new(Material::Diamond, 60)));
        assert!(!plain.is_similar(&named));
        assert!(!plain.is_similar(&ItemStack::new(Material::Emerald, 3)));
    }

    #[test]
    fn add_item_merges_before_filling() {
        let mut inv = Inventory::with_size(3);
        inv.set(2, Some(ItemStack::new(Material::Coal, 60))).unwrap();

        let leftover = inv.add_item(ItemStack::new(Material::Coal, 10));

        assert!(leftover.is_none());
        assert_eq!(inv.get(2).unwrap().amount, 64);
        assert_eq!(inv.get(0).unwrap().amount, 6);
        assert!(inv.get(1).is_none());
    }

    #[test]
    fn add_item_reports_overflow() {
        let mut inv = Inventory::with_size(1);
        let leftover = inv.add_item(ItemStack::new(Material::Egg, 20));
        assert_eq!(leftover, Some(ItemStack::new(Material::Egg, 4)));
        assert_eq!(inv.count_similar(&ItemStack::new(Material::Egg, 1)), 16);
    }

    #[test]
    fn set_rejects_out_of_range_slot() {
        let mut inv = Inventory::with_size(2);
        assert!(inv.set(5, None).is_err());
    }
}
