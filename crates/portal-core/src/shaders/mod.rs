/// Bindings and vertex stage shared by every simulation fragment shader
pub fn simulation_prelude() -> &'static str {
    include_str!("simulation_prelude.wgsl")
}

/// Default flow-field simulation rule (fragment stage only)
pub fn flow_field() -> &'static str {
    include_str!("flow_field.wgsl")
}

/// Particle point rendering
pub fn particles() -> &'static str {
    include_str!("particles.wgsl")
}

/// Debug quad showing the published state texture
pub fn debug_plane() -> &'static str {
    include_str!("debug_plane.wgsl")
}

/// Complete simulation module: the shared prelude followed by `fragment`
pub fn simulation_module(fragment: &str) -> String {
    let prelude = simulation_prelude();
    let mut source = String::with_capacity(prelude.len() + fragment.len() + 1);
    source.push_str(prelude);
    source.push('\n');
    source.push_str(fragment);
    source
}
