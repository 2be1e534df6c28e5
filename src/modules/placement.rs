use crate::modules::audit::TransactionLog;
use crate::modules::item::ItemStack;
use crate::modules::messages::{MessageKey, Messages};
use crate::modules::scan::ContainerInfo;
use crate::modules::world::{ActorId, Position, World, WorldError};

/// Outcome of one placement call. `placed` and `target` are set together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementResult {
    /// `None` once the whole stack was absorbed.
    pub remaining: Option<ItemStack>,
    pub placed: Option<ItemStack>,
    pub target: Option<Position>,
}

impl PlacementResult {
    pub fn has_placed(&self) -> bool {
        self.placed.as_ref().is_some_and(|p| p.amount > 0)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining.as_ref().is_none_or(|r| r.amount == 0)
    }
}

/// Puts `item` into the first discovered container that already holds a similar stack.
///
/// Containers are tried in discovery order. A candidate whose block is gone is skipped,
/// as is one whose write the audit hook refuses. Within the chosen container similar
/// stacks are topped up before empty slots are used, and the call stops at the first
/// container that took anything, so a stack is never split across containers.
pub fn place(
    item: &ItemStack,
    containers: &[ContainerInfo],
    world: &mut World,
    actor: Option<&str>,
    mut audit: Option<&mut (dyn TransactionLog + '_)>,
) -> Result<PlacementResult, WorldError> {
    if item.is_empty() {
        return Ok(PlacementResult::default());
    }

    let mut remaining = item.clone();
    for info in containers {
        let location = info.location;
        if !world.block_at(location).is_container() {
            log::debug!("container at {} is gone; skipping", location);
            continue;
        }

        let inventory = world
            .container(location)
            .ok_or(WorldError::MissingInventory(location))?;
        if !inventory.contains_similar(&remaining) {
            continue;
        }

        if let (Some(actor), Some(guard)) = (actor, audit.as_deref_mut()) {
            if !guard.log_container_transaction(actor, location) {
                log::debug!("audit refused write to {} for {}; skipping", location, actor);
                continue;
            }
        }

        let inventory = world
            .container_mut(location)
            .ok_or(WorldError::MissingInventory(location))?;
        let before = remaining.amount;
        inventory.merge_into_similar(&mut remaining);
        inventory.fill_empty_slots(&mut remaining);
        let placed = before - remaining.amount;

        if placed > 0 {
            return Ok(PlacementResult {
                remaining: (remaining.amount > 0).then_some(remaining),
                placed: Some(item.with_amount(placed)),
                target: Some(location),
            });
        }
    }

    Ok(PlacementResult {
        remaining: Some(remaining),
        placed: None,
        target: None,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnOutcome {
    pub returned: Vec<ItemStack>,
    pub dropped: Vec<ItemStack>,
    /// Where `dropped` landed: the actor's position at return time.
    pub position: Position,
}

/// Gives items back to the actor's carry inventory; what does not fit drops at their feet.
pub fn return_items(
    world: &mut World,
    actor: ActorId,
    items: Vec<ItemStack>,
    messages: &Messages,
) -> Result<ReturnOutcome, WorldError> {
    let owner = world
        .actor_mut(actor)
        .ok_or(WorldError::ActorNotFound(actor))?;
    let position = owner.position;
    let mut outcome = ReturnOutcome {
        returned: Vec::new(),
        dropped: Vec::new(),
        position,
    };

    for item in items {
        if item.is_empty() {
            continue;
        }
        let total = item.amount;
        match owner.carry.add_item(item.clone()) {
            None => outcome.returned.push(item),
            Some(left) => {
                if left.amount < total {
                    outcome.returned.push(item.with_amount(total - left.amount));
                }
                outcome.dropped.push(left);
            }
        }
    }

    if !outcome.dropped.is_empty() {
        owner.notify(messages.plain(MessageKey::ItemsDropped));
    }
    for item in &outcome.dropped {
        world.drop_item(position, item.clone());
    }
    Ok(outcome)
}

/// Drops every non-empty stack at `position`.
pub fn drop_items(world: &mut World, position: Position, items: Vec<ItemStack>) -> Vec<ItemStack> {
    let mut dropped = Vec::new();
    for item in items.into_iter().filter(|i| !i.is_empty()) {
        world.drop_item(position, item.clone());
        dropped.push(item);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::item::{CARRY_SLOTS, Material};
    use crate::modules::world::WorldBounds;

    struct RefuseAt(Position, Vec<Position>);

    impl TransactionLog for RefuseAt {
        fn log_container_transaction(&mut self, _actor: &str, container: Position) -> bool {
            self.1.push(container);
            container != self.0
        }
    }

    fn world_with_chests(positions: &[Position]) -> (World, Vec<ContainerInfo>) {
        let mut world = World::new(WorldBounds::default());
        for pos in positions {
            world.set_block(*pos, Material::Chest).unwrap();
        }
        let infos = positions
            .iter()
            .map(|p| ContainerInfo { location: *p })
            .collect();
        (world, infos)
    }

    fn fill_except(world: &mut World, pos: Position, keep_free: usize, filler: Material) {
        let size = world.container(pos).unwrap().size();
        for slot in 0..size.saturating_sub(keep_free) {
            world
                .put_in_container(pos, Some(slot), ItemStack::new(filler, 64))
                .unwrap();
        }
    }

    #[test]
    fn merges_before_using_empty_slot() {
        let chest = Position::new(1, 0, 0);
        let (mut world, infos) = world_with_chests(&[chest]);
        fill_except(&mut world, chest, 2, Material::Stone);
        world
            .put_in_container(chest, Some(26), ItemStack::new(Material::Cobblestone, 40))
            .unwrap();

        let result = place(
            &ItemStack::new(Material::Cobblestone, 50),
            &infos,
            &mut world,
            None,
            None,
        )
        .unwrap();

        assert!(result.remaining.is_none());
        assert_eq!(result.placed, Some(ItemStack::new(Material::Cobblestone, 50)));
        assert_eq!(result.target, Some(chest));
        let inv = world.container(chest).unwrap();
        assert_eq!(inv.get(26).unwrap().amount, 64);
        assert_eq!(inv.get(25), Some(&ItemStack::new(Material::Cobblestone, 26)));
    }

    #[test]
    fn untouched_container_never_gets_a_new_kind() {
        let empty = Position::new(0, 0, 0);
        let (mut world, infos) = world_with_chests(&[empty]);

        let result = place(
            &ItemStack::new(Material::Diamond, 3),
            &infos,
            &mut world,
            None,
            None,
        )
        .unwrap();

        assert_eq!(result.remaining, Some(ItemStack::new(Material::Diamond, 3)));
        assert!(!result.has_placed());
        assert!(result.target.is_none());
        assert!(world.container(empty).unwrap().is_empty());
    }

    #[test]
    fn first_discovered_match_wins() {
        let a = Position::new(0, 0, 0);
        let b = Position::new(5, 0, 0);
        let (mut world, infos) = world_with_chests(&[a, b]);
        world
            .put_in_container(a, Some(0), ItemStack::new(Material::Coal, 1))
            .unwrap();
        world
            .put_in_container(b, Some(0), ItemStack::new(Material::Coal, 1))
            .unwrap();

        let result = place(&ItemStack::new(Material::Coal, 10), &infos, &mut world, None, None)
            .unwrap();

        assert_eq!(result.target, Some(a));
        assert_eq!(world.container(a).unwrap().count_similar(&ItemStack::new(Material::Coal, 1)), 11);
        assert_eq!(world.container(b).unwrap().count_similar(&ItemStack::new(Material::Coal, 1)), 1);
    }

    #[test]
    fn stack_is_not_split_across_containers() {
        let a = Position::new(0, 0, 0);
        let b = Position::new(0, 0, 1);
        let (mut world, infos) = world_with_chests(&[a, b]);
        fill_except(&mut world, a, 1, Material::Stone);
        world
            .put_in_container(a, Some(26), ItemStack::new(Material::IronIngot, 60))
            .unwrap();
        world
            .put_in_container(b, Some(0), ItemStack::new(Material::IronIngot, 1))
            .unwrap();

        let result = place(
            &ItemStack::new(Material::IronIngot, 10),
            &infos,
            &mut world,
            None,
            None,
        )
        .unwrap();

        assert_eq!(result.target, Some(a));
        assert_eq!(result.placed.unwrap().amount, 4);
        assert_eq!(result.remaining, Some(ItemStack::new(Material::IronIngot, 6)));
        assert_eq!(world.container(b).unwrap().get(0).unwrap().amount, 1);
    }

    #[test]
    fn full_match_falls_through_to_next_container() {
        let a = Position::new(0, 0, 0);
        let b = Position::new(0, 0, 1);
        let (mut world, infos) = world_with_chests(&[a, b]);
        fill_except(&mut world, a, 0, Material::Wheat);
        world
            .put_in_container(b, Some(3), ItemStack::new(Material::Wheat, 2))
            .unwrap();

        let result = place(&ItemStack::new(Material::Wheat, 5), &infos, &mut world, None, None)
            .unwrap();

        assert_eq!(result.target, Some(b));
        assert!(result.is_complete());
    }

    #[test]
    fn similarity_respects_meta() {
        let a = Position::new(0, 0, 0);
        let (mut world, infos) = world_with_chests(&[a]);
        world
            .put_in_container(
                a,
                Some(0),
                ItemStack::new(Material::DiamondSword, 1).with_meta("enchant", "sharpness"),
            )
            .unwrap();

        let result = place(
            &ItemStack::new(Material::DiamondSword, 1),
            &infos,
            &mut world,
            None,
            None,
        )
        .unwrap();

        assert!(!result.has_placed());
    }

    #[test]
    fn removed_container_is_skipped() {
        let a = Position::new(0, 0, 0);
        let b = Position::new(1, 0, 0);
        let (mut world, infos) = world_with_chests(&[a, b]);
        world
            .put_in_container(a, Some(0), ItemStack::new(Material::Apple, 1))
            .unwrap();
        world
            .put_in_container(b, Some(0), ItemStack::new(Material::Apple, 1))
            .unwrap();
        world.set_block(a, Material::Air).unwrap();

        let result = place(&ItemStack::new(Material::Apple, 3), &infos, &mut world, None, None)
            .unwrap();

        assert_eq!(result.target, Some(b));
    }

    #[test]
    fn audit_refusal_skips_container_silently() {
        let a = Position::new(0, 0, 0);
        let b = Position::new(1, 0, 0);
        let (mut world, infos) = world_with_chests(&[a, b]);
        world
            .put_in_container(a, Some(0), ItemStack::new(Material::Bread, 1))
            .unwrap();
        world
            .put_in_container(b, Some(0), ItemStack::new(Material::Bread, 1))
            .unwrap();
        let mut guard = RefuseAt(a, Vec::new());

        let result = place(
            &ItemStack::new(Material::Bread, 4),
            &infos,
            &mut world,
            Some("Steve"),
            Some(&mut guard),
        )
        .unwrap();

        assert_eq!(result.target, Some(b));
        assert_eq!(guard.1, vec![a, b]);
        assert_eq!(world.container(a).unwrap().get(0).unwrap().amount, 1);
    }

    #[test]
    fn audit_is_unused_without_actor() {
        let a = Position::new(0, 0, 0);
        let (mut world, infos) = world_with_chests(&[a]);
        world
            .put_in_container(a, Some(0), ItemStack::new(Material::Bread, 1))
            .unwrap();
        let mut guard = RefuseAt(a, Vec::new());

        let result = place(
            &ItemStack::new(Material::Bread, 4),
            &infos,
            &mut world,
            None,
            Some(&mut guard),
        )
        .unwrap();

        assert_eq!(result.target, Some(a));
        assert!(guard.1.is_empty());
    }

    #[test]
    fn lost_inventory_is_a_fault() {
        let a = Position::new(0, 0, 0);
        let (mut world, infos) = world_with_chests(&[a]);
        world.detach_inventory(a);

        let err = place(&ItemStack::new(Material::Coal, 1), &infos, &mut world, None, None)
            .unwrap_err();

        assert_eq!(err, WorldError::MissingInventory(a));
    }

    #[test]
    fn return_overflow_drops_with_one_notice() {
        let mut world = World::new(WorldBounds::default());
        let id = world.spawn_actor("Steve", Position::new(3, 64, 3)).unwrap();
        {
            let actor = world.actor_mut(id).unwrap();
            for slot in 0..CARRY_SLOTS - 1 {
                actor
                    .carry
                    .set(slot, Some(ItemStack::new(Material::Dirt, 64)))
                    .unwrap();
            }
        }

        let outcome = return_items(
            &mut world,
            id,
            vec![
                ItemStack::new(Material::Stick, 64),
                ItemStack::new(Material::Coal, 5),
                ItemStack::new(Material::Torch, 7),
            ],
            &Messages::default(),
        )
        .unwrap();

        assert_eq!(outcome.returned, vec![ItemStack::new(Material::Stick, 64)]);
        assert_eq!(
            outcome.dropped,
            vec![
                ItemStack::new(Material::Coal, 5),
                ItemStack::new(Material::Torch, 7)
            ]
        );
        assert_eq!(outcome.position, Position::new(3, 64, 3));
        assert_eq!(world.dropped().len(), 2);
        assert!(world.dropped().iter().all(|d| d.position == outcome.position));
        let inbox = &world.actor(id).unwrap().inbox;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0], Messages::default().plain(MessageKey::ItemsDropped));
    }

    #[test]
    fn return_without_overflow_sends_no_notice() {
        let mut world = World::new(WorldBounds::default());
        let id = world.spawn_actor("Steve", Position::origin()).unwrap();

        let outcome = return_items(
            &mut world,
            id,
            vec![ItemStack::new(Material::Coal, 5)],
            &Messages::default(),
        )
        .unwrap();

        assert!(outcome.dropped.is_empty());
        assert!(world.actor(id).unwrap().inbox.is_empty());
        assert_eq!(
            world.actor(id).unwrap().carry.count_similar(&ItemStack::new(Material::Coal, 1)),
            5
        );
    }
}
