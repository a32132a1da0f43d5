use chrono::{DateTime, FixedOffset, Utc};
use foundation::LatLng;
use futures_util::future::LocalBoxFuture;

/// Wall clock and randomness; injected so schedules and ids are testable.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    /// Uniform in `[0, 1)`.
    fn random(&self) -> f64;
    fn local_offset(&self) -> FixedOffset;
    /// Resolves once `ms` milliseconds have passed.
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;

    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&self.local_offset())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    Unsupported,
    Denied(String),
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::Unsupported => write!(f, "geolocation is not supported"),
            GeoError::Denied(msg) => write!(f, "geolocation failed: {msg}"),
        }
    }
}

impl std::error::Error for GeoError {}

pub trait Geolocator {
    fn locate(&self) -> LocalBoxFuture<'_, Result<LatLng, GeoError>>;
}

/// `toLocaleString()`-like rendering used for the "selected at" stamp.
pub fn local_timestamp(clock: &dyn Clock) -> String {
    clock.local_now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
