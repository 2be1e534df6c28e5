use std::str::FromStr;

use autostash::{
    ActorId, Integrations, ItemStack, Material, OrganizeEvent, Organizer, Position, Settings,
    World, WorldBounds, data_dir, load_settings, load_world, save_settings, save_world,
};
use clap::{Parser, Subcommand};

mod config;
mod world;

use config::{ConfigCommand, run_config};
use world::{WorldCommand, run_world};

#[derive(Parser)]
#[command(
    name = "autostash",
    version,
    about = "Sort deposited items into matching nearby containers",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write default settings and an empty world
    Init,
    /// Inspect and edit the local world
    World {
        #[command(subcommand)]
        command: WorldCommand,
    },
    /// Edit sorting settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Deposit items into a tray and sort them into nearby containers
    Organize {
        /// Actor whose tray is used
        #[arg(long)]
        actor: String,
        /// Centre of the search as x,y,z (ignored with --frame)
        #[arg(long)]
        anchor: Option<PositionArg>,
        /// Horizontal search radius (required with --anchor)
        #[arg(long)]
        radius: Option<i32>,
        /// Vertical search radius (defaults to the configured y radius)
        #[arg(long)]
        y_radius: Option<i32>,
        /// Use the item frame at x,y,z instead of an explicit anchor
        #[arg(long, conflicts_with = "anchor")]
        frame: Option<PositionArg>,
        /// Item to deposit as kind[:amount]; repeatable
        #[arg(long = "item", value_name = "kind[:amount]", required = true)]
        items: Vec<ItemArg>,
        /// Give up (and hand everything back) after this many ticks
        #[arg(long, default_value_t = 10_000)]
        max_ticks: u64,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct PositionArg(pub Position);

impl FromStr for PositionArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.trim().split(',').collect();
        if parts.len() != 3 {
            return Err("Position must be formatted as x,y,z".into());
        }

        let x = parts[0]
            .trim()
            .parse::<i32>()
            .map_err(|_| "x must be an integer")?;
        let y = parts[1]
            .trim()
            .parse::<i32>()
            .map_err(|_| "y must be an integer")?;
        let z = parts[2]
            .trim()
            .parse::<i32>()
            .map_err(|_| "z must be an integer")?;

        Ok(PositionArg(Position { x, y, z }))
    }
}

/// `kind[:amount]`, amount defaulting to 1.
#[derive(Clone, Debug)]
pub struct ItemArg(pub ItemStack);

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, amount) = match s.trim().rsplit_once(':') {
            Some((kind, amount)) if amount.chars().all(|c| c.is_ascii_digit()) => (
                kind,
                amount
                    .parse::<u32>()
                    .map_err(|_| "amount must be a positive integer")?,
            ),
            _ => (s.trim(), 1),
        };
        let kind = Material::from_str(kind)?;
        let max = kind.max_stack_size();
        if max == 0 {
            return Err(format!("{} is not an item", kind));
        }
        if amount == 0 || amount > max {
            return Err(format!("amount for {} must be between 1 and {}", kind, max));
        }
        Ok(ItemArg(ItemStack::new(kind, amount)))
    }
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli.command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Init => run_init(),
        Command::World { command } => run_world(command),
        Command::Config { command } => run_config(command),
        Command::Organize {
            actor,
            anchor,
            radius,
            y_radius,
            frame,
            items,
            max_ticks,
        } => run_organize(OrganizeArgs {
            actor,
            anchor: anchor.map(|a| a.0),
            radius,
            y_radius,
            frame: frame.map(|f| f.0),
            items: items.into_iter().map(|i| i.0).collect(),
            max_ticks,
        }),
    }
}

fn run_init() -> Result<(), String> {
    let settings = load_settings().map_err(|e| e.to_string())?;
    let settings_path = save_settings(&settings).map_err(|e| e.to_string())?;
    println!("Settings at {}", settings_path.display());

    match load_world().map_err(|e| e.to_string())? {
        Some(_) => println!("World already initialized; left untouched."),
        None => {
            let path = save_world(&World::new(WorldBounds::default())).map_err(|e| e.to_string())?;
            println!("Initialized empty world at {}", path.display());
        }
    }
    Ok(())
}

pub(crate) fn require_world() -> Result<World, String> {
    load_world()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "Not initialized. Run `autostash init` first.".to_string())
}

pub(crate) fn actor_id(world: &World, name: &str) -> Result<ActorId, String> {
    world
        .actor_by_name(name)
        .map(|a| a.id)
        .ok_or_else(|| format!("actor '{}' not found", name))
}

struct OrganizeArgs {
    actor: String,
    anchor: Option<Position>,
    radius: Option<i32>,
    y_radius: Option<i32>,
    frame: Option<Position>,
    items: Vec<ItemStack>,
    max_ticks: u64,
}

fn run_organize(args: OrganizeArgs) -> Result<(), String> {
    let mut world = require_world()?;
    let settings: Settings = load_settings().map_err(|e| e.to_string())?;
    let integrations = Integrations::from_settings(&settings.integrations, &data_dir());
    let y_radius_default = settings.structure.y_radius;
    let mut organizer = Organizer::new(settings, integrations);
    let actor = actor_id(&world, &args.actor)?;

    match (args.frame, args.anchor) {
        (Some(frame), _) => {
            let found = organizer
                .interact_frame(&mut world, actor, frame)
                .map_err(|e| e.to_string())?;
            println!(
                "Frame at {} opened a tray on {} at {} (radius {}, y radius {})",
                frame, found.trigger_block, found.center, found.radius, found.y_radius
            );
        }
        (None, Some(anchor)) => {
            let radius = args
                .radius
                .ok_or_else(|| "--radius is required with --anchor".to_string())?;
            organizer
                .open_tray(
                    &mut world,
                    actor,
                    anchor,
                    radius,
                    args.y_radius.unwrap_or(y_radius_default),
                )
                .map_err(|e| e.to_string())?;
        }
        (None, None) => return Err("either --anchor or --frame is required".into()),
    }

    for item in args.items {
        let label = item.to_string();
        if let Some(left) = organizer.deposit(actor, item).map_err(|e| e.to_string())? {
            return Err(format!("tray is full; could not deposit {} of {}", left.amount, label));
        }
    }
    organizer
        .close_tray(&mut world, actor)
        .map_err(|e| e.to_string())?;

    let mut ticks = 0u64;
    while !organizer.is_idle() {
        if ticks >= args.max_ticks {
            eprintln!("warning: gave up after {} ticks", ticks);
            for event in organizer.abort_all(&mut world) {
                println!("{}", describe_event(&event));
            }
            break;
        }
        let report = organizer.tick(&mut world);
        ticks += 1;
        for event in &report.events {
            println!("[tick {}] {}", report.tick, describe_event(event));
        }
        for flight in &report.landed {
            println!(
                "[tick {}] {} landed at {}",
                report.tick,
                flight.item,
                flight.destination()
            );
        }
    }

    if let Some(owner) = world.actor_mut(actor) {
        for notice in owner.take_inbox() {
            println!("{}: {}", owner.name, notice);
        }
    }
    let path = save_world(&world).map_err(|e| e.to_string())?;
    println!("Saved world to {} after {} ticks", path.display(), ticks);
    Ok(())
}

fn describe_event(event: &OrganizeEvent) -> String {
    match event {
        OrganizeEvent::ScanStarted {
            volume,
            estimated_ticks,
            ..
        } => format!("scanning {} cells (~{} ticks)", volume, estimated_ticks),
        OrganizeEvent::ContainersFound { count, .. } => format!("found {} containers", count),
        OrganizeEvent::ItemPlaced {
            item, container, ..
        } => format!("placed {} into {}", item, container),
        OrganizeEvent::ItemFlying { item, from, to, .. } => {
            format!("{} flying {} -> {}", item, from, to)
        }
        OrganizeEvent::ItemsReturned { items, .. } => format!("returned {}", join_items(items)),
        OrganizeEvent::ItemsDropped {
            position, items, ..
        } => format!("dropped {} at {}", join_items(items), position),
        OrganizeEvent::Finished {
            organized,
            remaining,
            ..
        } => format!("finished: {} organized, {} remaining", organized, remaining),
        OrganizeEvent::Aborted { reason, .. } => format!("aborted: {}", reason),
    }
}

pub(crate) fn join_items(items: &[ItemStack]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
