//! Page controllers of the weather dashboard.
//!
//! Each controller owns the state of one widget and reaches the page only
//! through [`Ui`], the network through [`api::HttpClient`] and the map
//! through [`layers::MapSurface`], so all of them run natively under test.

pub mod admin_users;
pub mod alert_form;
pub mod alert_modal;
pub mod animations;
pub mod chat;
pub mod context;
pub mod env;
pub mod location_tracker;
pub mod map;
pub mod notifications;
pub mod ui;
pub mod user_markers;

#[cfg(test)]
pub mod testing;

pub use admin_users::{AdminUserActions, UsersTable};
pub use alert_form::AlertForm;
pub use alert_modal::WeatherAlertModal;
pub use animations::WeatherAnimations;
pub use chat::{AdminChat, AdminChatHistory, TemperatureAlertDialog, UserChat};
pub use context::Context;
pub use env::{Clock, GeoError, Geolocator};
pub use location_tracker::LocationTracker;
pub use map::{MapAction, MapState, WeatherMap};
pub use notifications::Notifications;
pub use ui::{ToastKind, Ui};
pub use user_markers::{MarkerStyle, UserMarkers};
