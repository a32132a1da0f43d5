pub mod base;
pub mod error;
pub mod layer;
pub mod markers;
pub mod overlays;
pub mod surface;

pub use base::*;
pub use error::*;
pub use layer::*;
pub use markers::*;
pub use overlays::*;
pub use surface::*;
