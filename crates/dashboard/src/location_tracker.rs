use std::rc::Rc;

use api::{ApiError, HttpClient, UserLocationUpdate};
use foundation::LatLng;
use tracing::{info, warn};

use crate::context::Context;
use crate::env::GeoError;

const UNKNOWN_PLACE: &str = "Unknown";

#[derive(Debug)]
pub enum TrackError {
    Geo(GeoError),
    Api(ApiError),
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::Geo(e) => write!(f, "{e}"),
            TrackError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TrackError {}

/// Reports the signed-in user's position to the server once per page load.
pub struct LocationTracker<H> {
    ctx: Rc<Context<H>>,
}

impl<H: HttpClient> LocationTracker<H> {
    pub fn new(ctx: Rc<Context<H>>) -> Self {
        Self { ctx }
    }

    /// Nominatim's most specific place name, or "Unknown" when the lookup
    /// fails or the address has none.
    pub async fn place_name(&self, at: LatLng) -> String {
        match self.ctx.openweather().nominatim_reverse(at.lat, at.lng).await {
            Ok(reverse) => reverse
                .address
                .as_ref()
                .and_then(|a| a.place_name())
                .unwrap_or(UNKNOWN_PLACE)
                .to_string(),
            Err(e) => {
                warn!("reverse geocoding failed: {e}");
                UNKNOWN_PLACE.to_string()
            }
        }
    }

    pub async fn start(&self) -> Result<UserLocationUpdate, TrackError> {
        let at = self.ctx.geo.locate().await.map_err(|e| {
            warn!("cannot track location: {e}");
            TrackError::Geo(e)
        })?;
        let update = UserLocationUpdate {
            latitude: at.lat,
            longitude: at.lng,
            location_name: self.place_name(at).await,
        };
        self.ctx
            .server()
            .update_user_location(&update)
            .await
            .map_err(|e| {
                warn!("location update failed: {e}");
                TrackError::Api(e)
            })?;
        info!(place = %update.location_name, "user location reported");
        self.ctx.trace("location", update.location_name.clone());
        Ok(update)
    }
}
