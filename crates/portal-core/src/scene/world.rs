//! Top-level scene lifecycle
//!
//! The world starts `Uninitialized` and becomes `Ready` the first time it
//! sees the base resource group finish. Events are drained synchronously at
//! the start of each `update`, so construction never races a frame.

use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Result;

use crate::scene::{ResourceEvent, ResourceStore, Update};
use crate::BASE_GROUP;

/// Lifecycle of the world's child
pub enum WorldState<P> {
    Uninitialized,
    Ready(P),
}

/// Owns the portal once it exists and forwards frame updates to it
pub struct World<P> {
    events: Receiver<ResourceEvent>,
    resources: ResourceStore,
    state: WorldState<P>,
    base_loaded: bool,
    events_closed: bool,
    ended_groups: Vec<String>,
}

impl<P> World<P> {
    pub fn new(events: Receiver<ResourceEvent>) -> Self {
        Self {
            events,
            resources: ResourceStore::new(),
            state: WorldState::Uninitialized,
            base_loaded: false,
            events_closed: false,
            ended_groups: Vec::new(),
        }
    }

    /// Advance one frame
    ///
    /// Drains resource events, builds the child with `spawn` once the base
    /// group has ended, then forwards the update. `spawn` is called at most
    /// once over the world's lifetime unless it fails. Before the base group
    /// ends this does nothing.
    pub fn update<C>(&mut self, ctx: &mut C, spawn: impl FnOnce(&mut C, &ResourceStore) -> Result<P>) -> Result<()>
    where
        C: ?Sized,
        P: Update<C>,
    {
        self.poll_events();

        if self.base_loaded && matches!(self.state, WorldState::Uninitialized) {
            log::info!("Base resources loaded, creating portal");
            self.state = WorldState::Ready(spawn(ctx, &self.resources)?);
        }

        match &mut self.state {
            WorldState::Ready(portal) => portal.update(ctx),
            WorldState::Uninitialized => Ok(()),
        }
    }

    /// Apply every pending resource event
    pub fn poll_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.events_closed {
                        log::debug!("Resource loader finished");
                    }
                    self.events_closed = true;
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: ResourceEvent) {
        match event {
            ResourceEvent::ItemLoaded { group, item, data } => {
                self.resources.insert(&group, &item, data);
            }
            ResourceEvent::GroupEnd { name } => {
                log::debug!("Resource group '{}' ended", name);
                if name == BASE_GROUP {
                    self.base_loaded = true;
                }
                self.ended_groups.push(name);
            }
            ResourceEvent::Failed { group, item, error } => {
                log::error!("Failed to load {}/{}: {}", group, item, error);
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, WorldState::Ready(_))
    }

    /// True once the loader has hung up; if the world is still not ready by
    /// then, it never will be
    pub fn events_closed(&self) -> bool {
        self.events_closed
    }

    pub fn portal(&self) -> Option<&P> {
        match &self.state {
            WorldState::Ready(portal) => Some(portal),
            WorldState::Uninitialized => None,
        }
    }

    pub fn portal_mut(&mut self) -> Option<&mut P> {
        match &mut self.state {
            WorldState::Ready(portal) => Some(portal),
            WorldState::Uninitialized => None,
        }
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// Groups that have ended, in arrival order
    pub fn ended_groups(&self) -> &[String] {
        &self.ended_groups
    }
}
