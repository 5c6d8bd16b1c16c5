//! Resource loading
//!
//! Groups of files are read on a background thread. Progress comes back as
//! `ResourceEvent`s over a channel; whoever owns the receiver (the `World`)
//! drains it from the frame loop, so no callbacks run on the loader thread.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use crate::ResourceGroupConfig;

/// Loader progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// One file of a group finished loading
    ItemLoaded { group: String, item: String, data: Vec<u8> },
    /// Every file of the group loaded
    GroupEnd { name: String },
    /// A file could not be read; its group will not end
    Failed { group: String, item: String, error: String },
}

/// Loaded file contents by group and item name
#[derive(Debug, Default)]
pub struct ResourceStore {
    items: HashMap<(String, String), Vec<u8>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: &str, item: &str, data: Vec<u8>) {
        self.items.insert((group.to_string(), item.to_string()), data);
    }

    pub fn get(&self, group: &str, item: &str) -> Option<&[u8]> {
        self.items
            .get(&(group.to_string(), item.to_string()))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Handle to the background loader thread
pub struct Resources {
    handle: Option<JoinHandle<()>>,
}

impl Resources {
    /// Start loading `groups` in order; relative paths resolve against `root`
    pub fn load(groups: Vec<ResourceGroupConfig>, root: impl Into<PathBuf>) -> Result<(Self, Receiver<ResourceEvent>)> {
        let root = root.into();
        let (tx, rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("resources".to_string())
            .spawn(move || load_groups(&groups, &root, &tx))
            .context("Failed to spawn resource loader thread")?;

        Ok((Self { handle: Some(handle) }, rx))
    }

    /// Block until every group has been attempted
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Resource loader thread panicked");
            }
        }
    }
}

fn load_groups(groups: &[ResourceGroupConfig], root: &Path, tx: &Sender<ResourceEvent>) {
    for group in groups {
        let mut complete = true;

        for item in &group.items {
            let path = root.join(&item.path);
            let event = match std::fs::read(&path) {
                Ok(data) => {
                    log::debug!("Loaded {}/{} ({} bytes)", group.name, item.name, data.len());
                    ResourceEvent::ItemLoaded {
                        group: group.name.clone(),
                        item: item.name.clone(),
                        data,
                    }
                }
                Err(err) => {
                    complete = false;
                    ResourceEvent::Failed {
                        group: group.name.clone(),
                        item: item.name.clone(),
                        error: format!("{}: {}", path.display(), err),
                    }
                }
            };

            // Receiver gone: nobody is waiting for resources any more
            if tx.send(event).is_err() {
                return;
            }
        }

        if complete {
            log::info!("Resource group '{}' loaded ({} items)", group.name, group.items.len());
            if tx.send(ResourceEvent::GroupEnd { name: group.name.clone() }).is_err() {
                return;
            }
        }
    }
}
