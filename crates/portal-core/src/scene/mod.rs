pub mod camera;
pub mod debug_plane;
pub mod frame;
pub mod particles;
pub mod plane;
pub mod portal;
pub mod resources;
pub mod world;

pub use camera::*;
pub use debug_plane::*;
pub use frame::*;
pub use particles::*;
pub use plane::*;
pub use portal::*;
pub use resources::*;
pub use world::*;
