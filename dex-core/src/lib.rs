pub mod error;
pub mod math;
pub mod model;
pub mod ports;
pub mod registry;

pub use error::*;
pub use math::*;
pub use model::*;
pub use ports::*;
pub use registry::*;
