pub mod event_bus;
pub mod subscriptions;
pub mod timers;

pub use event_bus::*;
pub use subscriptions::*;
pub use timers::*;
