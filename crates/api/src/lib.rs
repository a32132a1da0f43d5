pub mod config;
pub mod csrf;
pub mod error;
pub mod http;
pub mod openweather;
pub mod server;
pub mod wire;

pub use config::*;
pub use csrf::*;
pub use error::*;
pub use http::*;
pub use openweather::*;
pub use server::*;
pub use wire::*;
