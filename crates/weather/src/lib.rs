pub mod alerts;
pub mod bands;
pub mod labels;
pub mod snapshot;
pub mod units;
pub mod uv;

pub use alerts::*;
pub use bands::*;
pub use labels::*;
pub use snapshot::*;
pub use units::*;
pub use uv::*;
