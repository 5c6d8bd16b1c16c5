use std::sync::mpsc;

use anyhow::{bail, Result};
use portal_core::scene::{ResourceEvent, ResourceStore, Update, World};

/// Stand-in portal counting the updates forwarded to it
struct StubPortal {
    updates: u32,
    shader: Option<String>,
}

impl Update<Frames> for StubPortal {
    fn update(&mut self, ctx: &mut Frames) -> Result<()> {
        self.updates += 1;
        ctx.forwarded += 1;
        Ok(())
    }
}

#[derive(Default)]
struct Frames {
    spawned: u32,
    forwarded: u32,
}

fn spawn(ctx: &mut Frames, resources: &ResourceStore) -> Result<StubPortal> {
    ctx.spawned += 1;
    let shader = resources
        .get("base", "flow_field_shader")
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
    Ok(StubPortal { updates: 0, shader })
}

fn group_end(name: &str) -> ResourceEvent {
    ResourceEvent::GroupEnd { name: name.to_string() }
}

#[test]
fn update_is_a_noop_before_base_loads() {
    let (_tx, rx) = mpsc::channel();
    let mut world: World<StubPortal> = World::new(rx);
    let mut frames = Frames::default();

    for _ in 0..5 {
        world.update(&mut frames, spawn).unwrap();
    }

    assert!(!world.is_ready());
    assert!(world.portal().is_none());
    assert_eq!(frames.spawned, 0);
    assert_eq!(frames.forwarded, 0);
}

#[test]
fn base_group_creates_exactly_one_portal() {
    let (tx, rx) = mpsc::channel();
    let mut world: World<StubPortal> = World::new(rx);
    let mut frames = Frames::default();

    tx.send(group_end("fonts")).unwrap();
    world.update(&mut frames, spawn).unwrap();
    assert!(!world.is_ready());

    tx.send(group_end("base")).unwrap();
    world.update(&mut frames, spawn).unwrap();
    assert!(world.is_ready());
    assert_eq!(frames.spawned, 1);

    // later group ends, related or not, never spawn again
    tx.send(group_end("textures")).unwrap();
    tx.send(group_end("base")).unwrap();
    world.update(&mut frames, spawn).unwrap();
    world.update(&mut frames, spawn).unwrap();

    assert_eq!(frames.spawned, 1);
    assert_eq!(world.portal().unwrap().updates, 3);
    assert_eq!(frames.forwarded, 3);
    assert_eq!(world.ended_groups(), ["fonts", "base", "textures", "base"]);
}

#[test]
fn loaded_items_reach_the_spawn_function() {
    let (tx, rx) = mpsc::channel();
    let mut world: World<StubPortal> = World::new(rx);
    let mut frames = Frames::default();

    tx.send(ResourceEvent::ItemLoaded {
        group: "base".to_string(),
        item: "flow_field_shader".to_string(),
        data: b"@fragment fn fs_main() {}".to_vec(),
    })
    .unwrap();
    tx.send(group_end("base")).unwrap();
    world.update(&mut frames, spawn).unwrap();

    let portal = world.portal().unwrap();
    assert_eq!(portal.shader.as_deref(), Some("@fragment fn fs_main() {}"));
    assert_eq!(world.resources().len(), 1);
}

#[test]
fn failed_items_do_not_advance_state() {
    let (tx, rx) = mpsc::channel();
    let mut world: World<StubPortal> = World::new(rx);
    let mut frames = Frames::default();

    tx.send(ResourceEvent::Failed {
        group: "base".to_string(),
        item: "flow_field_shader".to_string(),
        error: "missing".to_string(),
    })
    .unwrap();
    drop(tx);

    world.update(&mut frames, spawn).unwrap();
    assert!(!world.is_ready());
    assert!(world.events_closed());
    assert_eq!(frames.spawned, 0);
}

#[test]
fn spawn_failure_propagates_and_leaves_world_uninitialized() {
    let (tx, rx) = mpsc::channel();
    let mut world: World<StubPortal> = World::new(rx);
    let mut frames = Frames::default();

    tx.send(group_end("base")).unwrap();
    let result = world.update(&mut frames, |_, _| -> Result<StubPortal> { bail!("no adapter") });

    assert!(result.is_err());
    assert!(!world.is_ready());
}
