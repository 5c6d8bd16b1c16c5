pub mod flow_field;
pub mod grid;
pub mod seed;
pub mod stats;

pub use flow_field::*;
pub use grid::*;
pub use seed::*;
pub use stats::*;
