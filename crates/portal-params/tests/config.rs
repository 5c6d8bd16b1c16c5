use portal_params::{
    FlowFieldParams, PortalConfig, ResourceGroupConfig, TexturePrecision, BASE_GROUP, MAX_FLOW_FIELD_COUNT,
};

#[test]
fn default_config_is_valid() {
    let config = PortalConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.flow_field.count, 10_000);
    assert_eq!(config.flow_field.precision, TexturePrecision::Full);
    assert_eq!(config.resources.groups[0].name, BASE_GROUP);
    assert!(!config.debug.plane);
}

#[test]
fn zero_count_is_rejected() {
    let mut config = PortalConfig::default();
    config.flow_field.count = 0;
    let err = config.validate().unwrap_err();
    assert!(err.contains("count"), "unexpected error: {}", err);
}

#[test]
fn oversized_count_is_rejected() {
    let mut config = PortalConfig::default();
    config.flow_field.count = MAX_FLOW_FIELD_COUNT;
    assert!(config.validate().is_ok());

    config.flow_field.count = MAX_FLOW_FIELD_COUNT + 1;
    let err = config.validate().unwrap_err();
    assert!(err.contains("at most"), "unexpected error: {}", err);

    config.flow_field.count = u32::MAX;
    assert!(config.validate().is_err());
}

#[test]
fn oversized_count_in_yaml_is_rejected() {
    let config: PortalConfig = serde_yaml::from_str("flow_field:\n  count: 4294967295\n").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn advancing_params_leaves_the_original_untouched() {
    let params = FlowFieldParams::new([[0.0; 4]; 4], [256, 40]);
    let next = params.advanced(0.25).advanced(0.5);

    assert_eq!(params.time, 0.0);
    assert_eq!(params.delta, 0.0);
    assert_eq!(next.time, 0.75);
    assert_eq!(next.delta, 0.5);
    assert_eq!(next.size, [256, 40]);
}

#[test]
fn non_positive_delta_is_rejected() {
    let mut config = PortalConfig::default();
    config.run.delta = 0.0;
    assert!(config.validate().is_err());

    config.run.delta = f32::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn duplicate_groups_are_rejected() {
    let mut config = PortalConfig::default();
    config.resources.groups.push(ResourceGroupConfig {
        name: BASE_GROUP.to_string(),
        items: Vec::new(),
    });
    let err = config.validate().unwrap_err();
    assert!(err.contains("duplicate"), "unexpected error: {}", err);
}

#[test]
fn partial_yaml_fills_defaults() {
    let yaml = r#"
flow_field:
  count: 512
  precision: half
debug:
  plane: true
"#;
    let config: PortalConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.flow_field.count, 512);
    assert_eq!(config.flow_field.seed, 1337);
    assert_eq!(config.flow_field.precision, TexturePrecision::Half);
    assert!(config.debug.plane);
    assert_eq!(config.run.frames, 600);
    assert!(config.validate().is_ok());
}

#[test]
fn uniform_sizes_match_wgsl() {
    assert_eq!(std::mem::size_of::<portal_params::FlowFieldParams>(), 80);
    assert_eq!(std::mem::size_of::<portal_params::ParticleParams>(), 96);
    assert_eq!(std::mem::size_of::<portal_params::QuadParams>(), 128);
}
