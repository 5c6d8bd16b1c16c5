use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use portal_core::scene::{ResourceEvent, Resources};
use portal_core::{ResourceGroupConfig, ResourceItemConfig};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("portal-resources-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn group(name: &str, items: &[(&str, &str)]) -> ResourceGroupConfig {
    ResourceGroupConfig {
        name: name.to_string(),
        items: items
            .iter()
            .map(|(item, path)| ResourceItemConfig {
                name: item.to_string(),
                path: path.to_string(),
            })
            .collect(),
    }
}

fn collect(resources: Resources, rx: Receiver<ResourceEvent>) -> Vec<ResourceEvent> {
    resources.wait();
    rx.try_iter().collect()
}

#[test]
fn groups_load_in_order_and_end_once() {
    let dir = scratch_dir("ordered");
    std::fs::write(dir.join("flow.wgsl"), "// shader").unwrap();
    std::fs::write(dir.join("noise.bin"), [1u8, 2, 3]).unwrap();

    let groups = vec![
        group("base", &[("flow_field_shader", "flow.wgsl")]),
        group("extra", &[("noise", "noise.bin")]),
    ];
    let (resources, rx) = Resources::load(groups, &dir).unwrap();
    let events = collect(resources, rx);

    assert_eq!(
        events,
        vec![
            ResourceEvent::ItemLoaded {
                group: "base".to_string(),
                item: "flow_field_shader".to_string(),
                data: b"// shader".to_vec(),
            },
            ResourceEvent::GroupEnd { name: "base".to_string() },
            ResourceEvent::ItemLoaded {
                group: "extra".to_string(),
                item: "noise".to_string(),
                data: vec![1, 2, 3],
            },
            ResourceEvent::GroupEnd { name: "extra".to_string() },
        ]
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn empty_group_ends_immediately() {
    let dir = scratch_dir("empty");
    let (resources, rx) = Resources::load(vec![group("base", &[])], &dir).unwrap();
    let events = collect(resources, rx);

    assert_eq!(events, vec![ResourceEvent::GroupEnd { name: "base".to_string() }]);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_file_fails_without_group_end() {
    let dir = scratch_dir("missing");
    let groups = vec![group("base", &[("flow_field_shader", "does-not-exist.wgsl")])];
    let (resources, rx) = Resources::load(groups, &dir).unwrap();
    let events = collect(resources, rx);

    assert_eq!(events.len(), 1);
    match &events[0] {
        ResourceEvent::Failed { group, item, error } => {
            assert_eq!(group, "base");
            assert_eq!(item, "flow_field_shader");
            assert!(error.contains("does-not-exist.wgsl"));
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    std::fs::remove_dir_all(&dir).ok();
}
