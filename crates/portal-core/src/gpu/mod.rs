pub mod device;
pub mod layouts;
pub mod pipelines;
pub mod target;
pub mod textures;

pub use device::*;
pub use layouts::*;
pub use pipelines::*;
pub use target::*;
pub use textures::*;
