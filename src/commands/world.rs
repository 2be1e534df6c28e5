use autostash::{
    BlockFace, ItemFrame, ItemStack, LockSign, Material, SeedCommand, World, WorldCommands,
    save_world,
};
use clap::Subcommand;

use super::{ItemArg, PositionArg, actor_id, join_items, require_world};

#[derive(Subcommand)]
pub enum WorldCommand {
    /// Print blocks, containers, actors and dropped items
    Show {
        /// Print the stored snapshot as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Add an actor
    AddActor {
        name: String,
        /// Position as x,y,z
        #[arg(short = 'p', long, default_value = "0,64,0")]
        position: PositionArg,
    },
    /// Mark an actor online (or offline with --offline)
    SetOnline {
        name: String,
        #[arg(long)]
        offline: bool,
    },
    /// Move an actor
    Move {
        name: String,
        position: PositionArg,
    },
    /// Set the block at a position (air clears it)
    PlaceBlock {
        position: PositionArg,
        material: Material,
    },
    /// Put an item stack into a container
    Fill {
        position: PositionArg,
        item: ItemArg,
        /// Target slot (defaults to merging into the first free room)
        #[arg(long)]
        slot: Option<usize>,
    },
    /// Give an item stack to an actor's inventory
    Give { name: String, item: ItemArg },
    /// Put a block in an actor's main hand (omit to empty it)
    Hold {
        name: String,
        material: Option<Material>,
    },
    /// Protect a container with a lock sign
    Lock {
        position: PositionArg,
        #[arg(long)]
        owner: String,
        /// Additional allowed user; repeatable
        #[arg(long = "user")]
        users: Vec<String>,
    },
    /// Hang an item frame
    Frame {
        position: PositionArg,
        /// Side of the frame's cell the supporting block is on
        #[arg(long, value_enum)]
        attached: BlockFace,
        /// Item shown in the frame
        #[arg(long)]
        item: Option<Material>,
    },
    /// Scatter stocked containers around a centre
    Seed {
        #[arg(long, default_value = "0,64,0")]
        center: PositionArg,
        #[arg(long, default_value_t = 8)]
        radius: i32,
        #[arg(long, default_value_t = 6)]
        count: u32,
        /// Item kinds to stock with; repeatable
        #[arg(long = "stock")]
        stock: Vec<Material>,
        /// Optional RNG seed for reproducible placement
        #[arg(long)]
        seed: Option<u64>,
    },
}

pub(super) fn run_world(cmd: WorldCommand) -> Result<(), String> {
    let mut world = require_world()?;

    match cmd {
        WorldCommand::Show { json } => {
            if json {
                let json_str =
                    serde_json::to_string_pretty(&world.snapshot()).map_err(|e| e.to_string())?;
                println!("{}", json_str);
            } else {
                print_world(&world);
            }
            return Ok(());
        }
        WorldCommand::AddActor { name, position } => {
            let id = world
                .spawn_actor(name.clone(), position.0)
                .map_err(|e| e.to_string())?;
            println!("Added actor {} (id {}) at {}", name, id, position.0);
        }
        WorldCommand::SetOnline { name, offline } => {
            let id = actor_id(&world, &name)?;
            if let Some(actor) = world.actor_mut(id) {
                actor.online = !offline;
            }
            println!("{} is now {}", name, if offline { "offline" } else { "online" });
        }
        WorldCommand::Move { name, position } => {
            let id = actor_id(&world, &name)?;
            if let Some(actor) = world.actor_mut(id) {
                actor.position = position.0;
            }
            println!("Moved {} to {}", name, position.0);
        }
        WorldCommand::PlaceBlock { position, material } => {
            if material != Material::Air && !material.is_block() {
                return Err(format!("{} is not a block", material));
            }
            world
                .set_block(position.0, material)
                .map_err(|e| e.to_string())?;
            println!("Set {} to {}", position.0, material);
        }
        WorldCommand::Fill {
            position,
            item,
            slot,
        } => {
            let left = world
                .put_in_container(position.0, slot, item.0.clone())
                .map_err(|e| e.to_string())?;
            match left {
                None => println!("Put {} into {}", item.0, position.0),
                Some(left) => println!(
                    "Put {} of {} into {}; {} did not fit",
                    item.0.amount - left.amount,
                    item.0.kind,
                    position.0,
                    left.amount
                ),
            }
        }
        WorldCommand::Give { name, item } => {
            let id = actor_id(&world, &name)?;
            let actor = world
                .actor_mut(id)
                .ok_or_else(|| format!("actor '{}' not found", name))?;
            match actor.carry.add_item(item.0.clone()) {
                None => println!("Gave {} to {}", item.0, name),
                Some(left) => println!("{} has no room for {} of {}", name, left.amount, item.0.kind),
            }
        }
        WorldCommand::Hold { name, material } => {
            let id = actor_id(&world, &name)?;
            let held = material.map(|m| ItemStack::new(m, 1));
            if let Some(actor) = world.actor_mut(id) {
                actor.held = held;
            }
            match material {
                Some(m) => println!("{} now holds {}", name, m),
                None => println!("{} has an empty hand", name),
            }
        }
        WorldCommand::Lock {
            position,
            owner,
            users,
        } => {
            world
                .lock_container(
                    position.0,
                    LockSign {
                        owner: owner.clone(),
                        users,
                    },
                )
                .map_err(|e| e.to_string())?;
            println!("Locked container at {} for {}", position.0, owner);
        }
        WorldCommand::Frame {
            position,
            attached,
            item,
        } => {
            world.place_frame(
                position.0,
                ItemFrame {
                    attached,
                    item: item.map(|m| ItemStack::new(m, 1)),
                },
            );
            println!(
                "Hung a frame at {} on {}",
                position.0,
                position.0.relative(attached)
            );
        }
        WorldCommand::Seed {
            center,
            radius,
            count,
            stock,
            seed,
        } => {
            let placed = WorldCommands::seed_containers(
                &mut world,
                &SeedCommand {
                    center: center.0,
                    radius,
                    count,
                    stock,
                    seed,
                },
            )?;
            println!("Seeded {} container(s)", placed.len());
            for container in &placed {
                println!(
                    " - {} at {}: {}",
                    container.kind,
                    container.position,
                    join_items(&container.contents)
                );
            }
        }
    }

    save_world(&world).map_err(|e| e.to_string())?;
    Ok(())
}

fn print_world(world: &World) {
    let bounds = world.bounds();
    println!(
        "World: tick={} | height {}..{}",
        world.tick(),
        bounds.min_height,
        bounds.max_height
    );

    let actors: Vec<_> = world.actors().collect();
    if actors.is_empty() {
        println!("No actors yet. Use `autostash world add-actor` to add one.");
    } else {
        println!("{} actor(s):", actors.len());
        for actor in actors {
            let held = actor
                .held
                .as_ref()
                .map(|h| h.kind.to_string())
                .unwrap_or_else(|| "-".into());
            let carried: Vec<ItemStack> = actor.carry.items().cloned().collect();
            println!(
                " - {} (id {}) at {} {} | hand={} | carry=[{}]",
                actor.name,
                actor.id,
                actor.position,
                if actor.online { "online" } else { "offline" },
                held,
                join_items(&carried)
            );
        }
    }

    let containers = world.container_positions();
    println!("{} container(s):", containers.len());
    for position in containers {
        let contents: Vec<ItemStack> = world
            .container(position)
            .map(|inv| inv.items().cloned().collect())
            .unwrap_or_default();
        let lock = world
            .lock_at(position)
            .map(|l| format!(" [locked by {}]", l.owner))
            .unwrap_or_default();
        println!(
            " - {} at {}{}: [{}]",
            world.block_at(position),
            position,
            lock,
            join_items(&contents)
        );
    }

    if !world.dropped().is_empty() {
        println!("{} dropped stack(s):", world.dropped().len());
        for dropped in world.dropped() {
            println!(" - {} at {}", dropped.item, dropped.position);
        }
    }
}
