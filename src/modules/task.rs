use std::collections::VecDeque;
use std::path::Path;

use crate::modules::access::{AccessFilter, SignLockFilter, is_accessible};
use crate::modules::audit::{AuditTrail, TransactionLog};
use crate::modules::item::ItemStack;
use crate::modules::messages::{MessageKey, Messages};
use crate::modules::placement::{self, drop_items, return_items};
use crate::modules::scan::{ContainerInfo, RegionScanner};
use crate::modules::settings::{IntegrationSettings, Settings};
use crate::modules::world::{ActorId, Position, World, WorldError};

/// Optional collaborators shared by every run.
#[derive(Default)]
pub struct Integrations {
    pub access: Option<Box<dyn AccessFilter>>,
    pub audit: Option<Box<dyn TransactionLog>>,
}

impl Integrations {
    pub fn none() -> Self {
        Self::default()
    }

    /// Lock signs and the audit trail, each only when its toggle is on.
    pub fn from_settings(settings: &IntegrationSettings, data_dir: &Path) -> Self {
        let access = settings
            .locks
            .then(|| Box::new(SignLockFilter) as Box<dyn AccessFilter>);
        let audit = settings
            .audit
            .then(|| Box::new(AuditTrail::in_dir(data_dir)) as Box<dyn TransactionLog>);
        Self { access, audit }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrganizeRequest {
    pub actor: ActorId,
    /// Where the actor stood when the run was requested.
    pub actor_position: Position,
    pub anchor: Position,
    pub radius: i32,
    pub y_radius: i32,
    pub items: Vec<ItemStack>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrganizeEvent {
    ScanStarted {
        actor: ActorId,
        volume: u64,
        estimated_ticks: u64,
    },
    ContainersFound {
        actor: ActorId,
        count: usize,
    },
    ItemPlaced {
        actor: ActorId,
        item: ItemStack,
        container: Position,
    },
    ItemFlying {
        actor: ActorId,
        item: ItemStack,
        from: Position,
        to: Position,
    },
    ItemsReturned {
        actor: ActorId,
        items: Vec<ItemStack>,
    },
    ItemsDropped {
        actor: ActorId,
        position: Position,
        items: Vec<ItemStack>,
    },
    Finished {
        actor: ActorId,
        organized: usize,
        remaining: usize,
    },
    Aborted {
        actor: ActorId,
        reason: String,
    },
}

#[derive(Clone, Debug)]
enum Phase {
    /// The scanner is created on the first tick of the phase.
    FindContainers(Option<RegionScanner>),
    OrganizeItems,
    Finish,
    Done,
}

/// One sorting run: scans for containers a slice at a time, then places every item.
#[derive(Clone, Debug)]
pub struct OrganizeTask {
    actor: ActorId,
    anchor: Position,
    radius: i32,
    y_radius: i32,
    blocks_per_tick: usize,
    visual_effects: bool,
    input_count: usize,
    processed: usize,
    pending: VecDeque<ItemStack>,
    containers: Vec<ContainerInfo>,
    remainder: Vec<ItemStack>,
    last_known: Position,
    phase: Phase,
}

impl OrganizeTask {
    pub fn new(request: OrganizeRequest, settings: &Settings) -> Self {
        let pending: VecDeque<ItemStack> = request
            .items
            .into_iter()
            .filter(|item| !item.is_empty())
            .collect();
        // Nothing to sort means nothing to scan for.
        let phase = if pending.is_empty() {
            log::debug!("sorting run for actor {} has no items", request.actor);
            Phase::Done
        } else {
            Phase::FindContainers(None)
        };
        Self {
            actor: request.actor,
            anchor: request.anchor,
            radius: request.radius.max(0),
            y_radius: request.y_radius.max(0),
            blocks_per_tick: settings.blocks_per_tick(),
            visual_effects: settings.visual_effects.enabled,
            input_count: pending.len(),
            processed: 0,
            pending,
            containers: Vec::new(),
            remainder: Vec::new(),
            last_known: request.actor_position,
            phase,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    pub fn containers(&self) -> &[ContainerInfo] {
        &self.containers
    }

    /// Ends the run early, handing back everything it still holds.
    pub fn abort(&mut self, world: &mut World, messages: &Messages) -> Vec<OrganizeEvent> {
        let mut events = Vec::new();
        if self.is_done() {
            return events;
        }
        let items = self.take_held_items();
        if world.is_reachable(self.actor) {
            self.give_back(world, items, messages, &mut events);
        } else {
            self.spill(world, items, &mut events);
        }
        events.push(OrganizeEvent::Aborted {
            actor: self.actor,
            reason: "cancelled".into(),
        });
        self.phase = Phase::Done;
        events
    }

    pub fn tick(
        &mut self,
        world: &mut World,
        messages: &Messages,
        integrations: &mut Integrations,
    ) -> Vec<OrganizeEvent> {
        let mut events = Vec::new();
        if self.is_done() {
            return events;
        }

        match world.actor(self.actor) {
            Some(actor) if actor.online => self.last_known = actor.position,
            gone => {
                if let Some(actor) = gone {
                    self.last_known = actor.position;
                }
                log::info!(
                    "actor {} left during a sorting run; dropping items at {}",
                    self.actor,
                    self.last_known
                );
                let items = self.take_held_items();
                self.spill(world, items, &mut events);
                events.push(OrganizeEvent::Aborted {
                    actor: self.actor,
                    reason: "actor unreachable".into(),
                });
                self.phase = Phase::Done;
                return events;
            }
        }

        if let Err(err) = self.advance(world, messages, integrations, &mut events) {
            log::error!("sorting run for actor {} failed: {}", self.actor, err);
            events.push(OrganizeEvent::Aborted {
                actor: self.actor,
                reason: err.to_string(),
            });
            let items = self.take_held_items();
            if world.is_reachable(self.actor) {
                notify(world, self.actor, messages.plain(MessageKey::ErrorOccurred));
                self.give_back(world, items, messages, &mut events);
            } else {
                self.spill(world, items, &mut events);
            }
            self.phase = Phase::Done;
        }
        events
    }

    fn advance(
        &mut self,
        world: &mut World,
        messages: &Messages,
        integrations: &mut Integrations,
        events: &mut Vec<OrganizeEvent>,
    ) -> Result<(), WorldError> {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::FindContainers(scanner) => {
                self.find_containers(scanner, world, messages, integrations, events)
            }
            Phase::OrganizeItems => {
                self.organize_items(world, messages, integrations, events)?;
                self.finish(world, messages, events);
                Ok(())
            }
            Phase::Finish => {
                self.finish(world, messages, events);
                Ok(())
            }
            Phase::Done => Ok(()),
        }
    }

    fn find_containers(
        &mut self,
        scanner: Option<RegionScanner>,
        world: &mut World,
        messages: &Messages,
        integrations: &Integrations,
        events: &mut Vec<OrganizeEvent>,
    ) -> Result<(), WorldError> {
        let mut scanner = match scanner {
            Some(scanner) => scanner,
            None => {
                let scanner =
                    RegionScanner::new(self.anchor, self.radius, self.y_radius, world.bounds());
                let estimated_ticks = scanner.estimated_ticks(self.blocks_per_tick);
                log::debug!(
                    "scanning {} cells around {} for actor {}",
                    scanner.volume(),
                    self.anchor,
                    self.actor
                );
                notify(
                    world,
                    self.actor,
                    messages.render(
                        MessageKey::SearchContainers,
                        &[("estimated_ticks", estimated_ticks.to_string())],
                    ),
                );
                events.push(OrganizeEvent::ScanStarted {
                    actor: self.actor,
                    volume: scanner.volume(),
                    estimated_ticks,
                });
                scanner
            }
        };

        let actor = world
            .actor(self.actor)
            .ok_or(WorldError::ActorNotFound(self.actor))?;
        let filter = integrations.access.as_deref();
        for _ in 0..self.blocks_per_tick {
            if !scanner.has_more() {
                break;
            }
            let Some(found) = scanner.step(world) else {
                continue;
            };
            if is_accessible(filter, world, actor, found.location) {
                self.containers.push(found);
            } else {
                log::debug!("{} may not use container at {}", actor.name, found.location);
            }
        }

        if scanner.has_more() {
            self.phase = Phase::FindContainers(Some(scanner));
            return Ok(());
        }

        if self.containers.is_empty() {
            notify(world, self.actor, messages.plain(MessageKey::NoContainers));
            let items = self.take_held_items();
            self.give_back(world, items, messages, events);
            self.phase = Phase::Done;
            return Ok(());
        }

        notify(
            world,
            self.actor,
            messages.render(
                MessageKey::ContainersFound,
                &[("count", self.containers.len().to_string())],
            ),
        );
        events.push(OrganizeEvent::ContainersFound {
            actor: self.actor,
            count: self.containers.len(),
        });
        self.phase = Phase::OrganizeItems;
        Ok(())
    }

    fn organize_items(
        &mut self,
        world: &mut World,
        messages: &Messages,
        integrations: &mut Integrations,
        events: &mut Vec<OrganizeEvent>,
    ) -> Result<(), WorldError> {
        let actor_name = world
            .actor(self.actor)
            .map(|a| a.name.clone())
            .ok_or(WorldError::ActorNotFound(self.actor))?;

        while let Some(item) = self.pending.pop_front() {
            let result = match placement::place(
                &item,
                &self.containers,
                world,
                Some(actor_name.as_str()),
                integrations.audit.as_deref_mut(),
            ) {
                Ok(result) => result,
                Err(err) => {
                    self.pending.push_front(item);
                    return Err(err);
                }
            };
            self.processed += 1;

            if let (Some(placed), Some(target)) = (result.placed, result.target) {
                if self.visual_effects {
                    events.push(OrganizeEvent::ItemFlying {
                        actor: self.actor,
                        item: placed.clone(),
                        from: self.anchor,
                        to: target,
                    });
                }
                events.push(OrganizeEvent::ItemPlaced {
                    actor: self.actor,
                    item: placed,
                    container: target,
                });
            }
            if let Some(remaining) = result.remaining.filter(|r| !r.is_empty()) {
                self.remainder.push(remaining);
            }
        }

        let total = self.input_count;
        let progress = if total == 0 {
            100
        } else {
            self.processed * 100 / total
        };
        notify(
            world,
            self.actor,
            messages.render(
                MessageKey::OrganizingProgress,
                &[
                    ("progress", progress.to_string()),
                    ("current", self.processed.to_string()),
                    ("total", total.to_string()),
                ],
            ),
        );
        self.phase = Phase::Finish;
        Ok(())
    }

    fn finish(&mut self, world: &mut World, messages: &Messages, events: &mut Vec<OrganizeEvent>) {
        let remaining = self.remainder.len();
        let organized = self.input_count.saturating_sub(remaining);

        notify(world, self.actor, messages.plain(MessageKey::OrganizeComplete));
        notify(
            world,
            self.actor,
            messages.render(MessageKey::ItemsOrganized, &[("count", organized.to_string())]),
        );
        if remaining > 0 {
            notify(
                world,
                self.actor,
                messages.render(MessageKey::ItemsRemaining, &[("count", remaining.to_string())]),
            );
            let items = std::mem::take(&mut self.remainder);
            self.give_back(world, items, messages, events);
        } else {
            notify(world, self.actor, messages.plain(MessageKey::AllItemsOrganized));
        }

        log::info!(
            "sorting run for actor {} finished: {} organized, {} returned",
            self.actor,
            organized,
            remaining
        );
        events.push(OrganizeEvent::Finished {
            actor: self.actor,
            organized,
            remaining,
        });
        self.phase = Phase::Done;
    }

    fn take_held_items(&mut self) -> Vec<ItemStack> {
        let mut items: Vec<ItemStack> = self.pending.drain(..).collect();
        items.append(&mut self.remainder);
        items
    }

    fn give_back(
        &self,
        world: &mut World,
        items: Vec<ItemStack>,
        messages: &Messages,
        events: &mut Vec<OrganizeEvent>,
    ) {
        if items.is_empty() {
            return;
        }
        match return_items(world, self.actor, items.clone(), messages) {
            Ok(outcome) => {
                if !outcome.returned.is_empty() {
                    events.push(OrganizeEvent::ItemsReturned {
                        actor: self.actor,
                        items: outcome.returned,
                    });
                }
                if !outcome.dropped.is_empty() {
                    events.push(OrganizeEvent::ItemsDropped {
                        actor: self.actor,
                        position: outcome.position,
                        items: outcome.dropped,
                    });
                }
            }
            Err(err) => {
                log::warn!("could not return items to actor {}: {}", self.actor, err);
                self.spill(world, items, events);
            }
        }
    }

    fn spill(&self, world: &mut World, items: Vec<ItemStack>, events: &mut Vec<OrganizeEvent>) {
        let dropped = drop_items(world, self.last_known, items);
        if !dropped.is_empty() {
            events.push(OrganizeEvent::ItemsDropped {
                actor: self.actor,
                position: self.last_known,
                items: dropped,
            });
        }
    }
}

fn notify(world: &mut World, actor: ActorId, text: String) {
    if let Some(actor) = world.actor_mut(actor) {
        actor.notify(text);
    }
}
