use crate::modules::world::{Actor, Position, World};

/// Decides whether an actor may use a container. Consulted once per container per scan.
pub trait AccessFilter {
    fn can_access(&self, world: &World, actor: &Actor, container: Position) -> bool;
}

/// Lock-sign protection: unlocked containers are open, locked ones admit the owner and listed users.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignLockFilter;

impl AccessFilter for SignLockFilter {
    fn can_access(&self, world: &World, actor: &Actor, container: Position) -> bool {
        match world.lock_at(container) {
            None => true,
            Some(sign) => sign.allows(&actor.name),
        }
    }
}

/// A missing filter admits everything.
pub fn is_accessible(
    filter: Option<&dyn AccessFilter>,
    world: &World,
    actor: &Actor,
    container: Position,
) -> bool {
    filter.is_none_or(|f| f.can_access(world, actor, container))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::item::Material;
    use crate::modules::world::{LockSign, WorldBounds};

    fn locked_world() -> (World, Position) {
        let mut world = World::new(WorldBounds::default());
        let chest = Position::new(3, 64, 3);
        world.set_block(chest, Material::Chest).unwrap();
        world
            .lock_container(
                chest,
                LockSign {
                    owner: "Owner".into(),
                    users: vec!["Friend".into()],
                },
            )
            .unwrap();
        world.spawn_actor("Owner", Position::origin()).unwrap();
        world.spawn_actor("Friend", Position::origin()).unwrap();
        world.spawn_actor("Stranger", Position::origin()).unwrap();
        (world, chest)
    }

    #[test]
    fn lock_admits_owner_and_users_only() {
        let (world, chest) = locked_world();
        let filter = SignLockFilter;
        let owner = world.actor_by_name("Owner").unwrap();
        let friend = world.actor_by_name("Friend").unwrap();
        let stranger = world.actor_by_name("Stranger").unwrap();

        assert!(filter.can_access(&world, owner, chest));
        assert!(filter.can_access(&world, friend, chest));
        assert!(!filter.can_access(&world, stranger, chest));
    }

    #[test]
    fn unlocked_container_is_open() {
        let (mut world, _) = locked_world();
        let open = Position::new(5, 64, 5);
        world.set_block(open, Material::Barrel).unwrap();
        let stranger = world.actor_by_name("Stranger").unwrap();
        assert!(SignLockFilter.can_access(&world, stranger, open));
    }

    #[test]
    fn absent_filter_fails_open() {
        let (world, chest) = locked_world();
        let stranger = world.actor_by_name("Stranger").unwrap();
        assert!(is_accessible(None, &world, stranger, chest));
        assert!(!is_accessible(Some(&SignLockFilter), &world, stranger, chest));
    }
}
