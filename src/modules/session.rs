use std::collections::BTreeMap;
use std::fmt;

use crate::modules::effect::Flight;
use crate::modules::item::{Inventory, ItemStack, TRAY_SLOTS};
use crate::modules::messages::{MessageKey, Messages};
use crate::modules::placement::return_items;
use crate::modules::settings::Settings;
use crate::modules::task::{Integrations, OrganizeEvent, OrganizeRequest, OrganizeTask};
use crate::modules::trigger::{TriggerMatch, match_frame};
use crate::modules::world::{ActorId, Position, World};

/// An open holding tray and where its contents will be sorted to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraySession {
    pub actor: ActorId,
    pub anchor: Position,
    pub radius: i32,
    pub y_radius: i32,
    pub tray: Inventory,
}

impl TraySession {
    pub fn new(actor: ActorId, anchor: Position, radius: i32, y_radius: i32) -> Self {
        Self {
            actor,
            anchor,
            radius,
            y_radius,
            tray: Inventory::with_size(TRAY_SLOTS),
        }
    }
}

/// At most one open tray per actor.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<ActorId, TraySession>,
}

impl SessionRegistry {
    /// Opens a session, handing back any session it replaced.
    pub fn open(&mut self, session: TraySession) -> Option<TraySession> {
        self.sessions.insert(session.actor, session)
    }

    pub fn get(&self, actor: ActorId) -> Option<&TraySession> {
        self.sessions.get(&actor)
    }

    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut TraySession> {
        self.sessions.get_mut(&actor)
    }

    pub fn close(&mut self, actor: ActorId) -> Option<TraySession> {
        self.sessions.remove(&actor)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrganizeError {
    ActorNotFound(ActorId),
    ActorOffline(String),
    NotATrigger(Position),
    NoOpenTray(ActorId),
    InvalidRadius(i32),
}

impl fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizeError::ActorNotFound(id) => write!(f, "actor {} not found", id),
            OrganizeError::ActorOffline(name) => write!(f, "{} is offline", name),
            OrganizeError::NotATrigger(pos) => {
                write!(f, "no sorting structure behind the frame at {}", pos)
            }
            OrganizeError::NoOpenTray(id) => write!(f, "actor {} has no open tray", id),
            OrganizeError::InvalidRadius(r) => write!(f, "radius {} is out of range", r),
        }
    }
}

impl std::error::Error for OrganizeError {}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub events: Vec<OrganizeEvent>,
    pub landed: Vec<Flight>,
}

/// Owns the trays, the running tasks and their flights; ticked once per host tick.
pub struct Organizer {
    settings: Settings,
    messages: Messages,
    integrations: Integrations,
    sessions: SessionRegistry,
    tasks: Vec<OrganizeTask>,
    flights: Vec<Flight>,
}

impl Organizer {
    pub fn new(settings: Settings, integrations: Integrations) -> Self {
        let messages = settings.messages();
        Self {
            settings,
            messages,
            integrations,
            sessions: SessionRegistry::default(),
            tasks: Vec::new(),
            flights: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty() && self.flights.is_empty()
    }

    pub fn open_tray(
        &mut self,
        world: &mut World,
        actor: ActorId,
        anchor: Position,
        radius: i32,
        y_radius: i32,
    ) -> Result<(), OrganizeError> {
        // The search box must stay within coordinate range on every axis.
        let fits = |center: i32, r: i32| {
            r >= 0 && center.checked_add(r).is_some() && center.checked_sub(r).is_some()
        };
        if !fits(anchor.x, radius) || !fits(anchor.z, radius) {
            return Err(OrganizeError::InvalidRadius(radius));
        }
        if !fits(anchor.y, y_radius) {
            return Err(OrganizeError::InvalidRadius(y_radius));
        }
        let owner = world
            .actor_mut(actor)
            .ok_or(OrganizeError::ActorNotFound(actor))?;
        if !owner.online {
            return Err(OrganizeError::ActorOffline(owner.name.clone()));
        }
        owner.notify(self.messages.plain(MessageKey::TrayOpened));

        if let Some(replaced) = self
            .sessions
            .open(TraySession::new(actor, anchor, radius, y_radius))
        {
            // The old tray's contents go back rather than vanish.
            let items: Vec<ItemStack> = replaced.tray.items().cloned().collect();
            if !items.is_empty() {
                log::debug!("actor {} reopened a tray holding {} stacks", actor, items.len());
                if let Err(err) = return_items(world, actor, items, &self.messages) {
                    log::warn!("could not return tray contents to actor {}: {}", actor, err);
                }
            }
        }
        Ok(())
    }

    /// Opens a tray when the frame sits on a complete trigger structure.
    pub fn interact_frame(
        &mut self,
        world: &mut World,
        actor: ActorId,
        frame: Position,
    ) -> Result<TriggerMatch, OrganizeError> {
        let found = match_frame(world, frame, &self.settings.structure)
            .ok_or(OrganizeError::NotATrigger(frame))?;
        self.open_tray(world, actor, found.center, found.radius, found.y_radius)?;
        Ok(found)
    }

    /// Puts a stack into the actor's open tray; returns what did not fit.
    pub fn deposit(&mut self, actor: ActorId, item: ItemStack) -> Result<Option<ItemStack>, OrganizeError> {
        let session = self
            .sessions
            .get_mut(actor)
            .ok_or(OrganizeError::NoOpenTray(actor))?;
        Ok(session.tray.add_item(item))
    }

    /// Closes the tray. A non-empty tray starts a sorting run; returns whether one started.
    pub fn close_tray(&mut self, world: &mut World, actor: ActorId) -> Result<bool, OrganizeError> {
        let owner = world
            .actor_mut(actor)
            .ok_or(OrganizeError::ActorNotFound(actor))?;
        let actor_position = owner.position;
        let session = self
            .sessions
            .close(actor)
            .ok_or(OrganizeError::NoOpenTray(actor))?;
        let items: Vec<ItemStack> = session.tray.items().cloned().collect();

        if items.is_empty() {
            owner.notify(self.messages.plain(MessageKey::TrayEmpty));
            return Ok(false);
        }
        owner.notify(self.messages.plain(MessageKey::OrganizeStarted));

        log::info!(
            "actor {} started sorting {} stacks around {} (radius {}, y radius {})",
            actor,
            items.len(),
            session.anchor,
            session.radius,
            session.y_radius
        );
        let request = OrganizeRequest {
            actor,
            actor_position,
            anchor: session.anchor,
            radius: session.radius,
            y_radius: session.y_radius,
            items,
        };
        self.tasks.push(OrganizeTask::new(request, &self.settings));
        Ok(true)
    }

    /// Cancels every running task and returns what each still held. Flights are discarded.
    pub fn abort_all(&mut self, world: &mut World) -> Vec<OrganizeEvent> {
        let mut events = Vec::new();
        for mut task in self.tasks.drain(..) {
            log::warn!("cancelling sorting run for actor {}", task.actor());
            events.extend(task.abort(world, &self.messages));
        }
        self.flights.clear();
        events
    }

    /// Advances every task once, then every flight once.
    pub fn tick(&mut self, world: &mut World) -> TickReport {
        let tick = world.advance_tick();
        let mut events = Vec::new();

        for task in &mut self.tasks {
            let task_events = task.tick(world, &self.messages, &mut self.integrations);
            for event in &task_events {
                if let OrganizeEvent::ItemFlying { item, from, to, .. } = event {
                    self.flights.push(Flight::new(
                        item.clone(),
                        *from,
                        *to,
                        &self.settings.visual_effects,
                    ));
                }
            }
            events.extend(task_events);
        }
        self.tasks.retain(|task| !task.is_done());

        let mut landed = Vec::new();
        let mut flying = Vec::with_capacity(self.flights.len());
        for mut flight in self.flights.drain(..) {
            if flight.advance() {
                landed.push(flight);
            } else {
                flying.push(flight);
            }
        }
        self.flights = flying;

        TickReport {
            tick,
            events,
            landed,
        }
    }
}
