pub mod geo;
pub mod html;
pub mod ids;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use html::*;
pub use ids::*;
pub use time::*;
