use tracing::{info, warn};

use crate::error::LayerError;
use crate::layer::{LayerId, TileLayerSpec, TileRole};
use crate::surface::MapSurface;

pub const OVERLAY_OPACITY: f64 = 0.6;
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    Temp,
    Precipitation,
    Clouds,
    Wind,
    Pressure,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 5] = [
        OverlayKind::Temp,
        OverlayKind::Precipitation,
        OverlayKind::Clouds,
        OverlayKind::Wind,
        OverlayKind::Pressure,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "temp" => Some(OverlayKind::Temp),
            "precipitation" => Some(OverlayKind::Precipitation),
            "clouds" => Some(OverlayKind::Clouds),
            "wind" => Some(OverlayKind::Wind),
            "pressure" => Some(OverlayKind::Pressure),
            _ => None,
        }
    }

    /// OpenWeatherMap layer code; also the `data-legend` key.
    pub fn code(&self) -> &'static str {
        match self {
            OverlayKind::Temp => "temp",
            OverlayKind::Precipitation => "precipitation",
            OverlayKind::Clouds => "clouds",
            OverlayKind::Wind => "wind",
            OverlayKind::Pressure => "pressure",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OverlayKind::Temp => "Temperature",
            OverlayKind::Precipitation => "Rain",
            OverlayKind::Clouds => "Clouds",
            OverlayKind::Wind => "Wind",
            OverlayKind::Pressure => "Pressure",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            OverlayKind::Temp => "🌡️",
            OverlayKind::Precipitation => "🌧️",
            OverlayKind::Clouds => "☁️",
            OverlayKind::Wind => "💨",
            OverlayKind::Pressure => "📊",
        }
    }
}

pub fn is_placeholder_key(api_key: &str) -> bool {
    let key = api_key.trim();
    key.is_empty() || key == API_KEY_PLACEHOLDER
}

pub fn overlay_spec(tile_base_url: &str, kind: OverlayKind, api_key: &str) -> TileLayerSpec {
    TileLayerSpec {
        role: TileRole::Overlay,
        url_template: format!(
            "{}/{}_new/{{z}}/{{x}}/{{y}}.png?appid={}",
            tile_base_url.trim_end_matches('/'),
            kind.code(),
            api_key
        ),
        attribution: "© OpenWeatherMap".to_string(),
        max_zoom: 19,
        subdomains: None,
        opacity: OVERLAY_OPACITY,
    }
}

/// Single active weather overlay per map.
#[derive(Debug)]
pub struct WeatherOverlays {
    tile_base_url: String,
    api_key: String,
    active: Option<(OverlayKind, LayerId)>,
    visible: bool,
}

impl WeatherOverlays {
    pub fn new(tile_base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            tile_base_url: tile_base_url.into(),
            api_key: api_key.into(),
            active: None,
            visible: true,
        }
    }

    pub fn active_kind(&self) -> Option<OverlayKind> {
        self.active.map(|(k, _)| k)
    }

    pub fn active_id(&self) -> Option<LayerId> {
        self.active.map(|(_, id)| id)
    }

    /// Replaces any active overlay. On success returns the legend key to show.
    ///
    /// With a placeholder key the previous overlay is still removed and the
    /// map is left without one.
    pub fn add_weather_layer(
        &mut self,
        map: &dyn MapSurface,
        kind: OverlayKind,
    ) -> Result<&'static str, LayerError> {
        self.remove_weather_layer(map);
        if is_placeholder_key(&self.api_key) {
            warn!("please set your OpenWeatherMap API key");
            return Err(LayerError::MissingApiKey);
        }
        let spec = overlay_spec(&self.tile_base_url, kind, &self.api_key);
        let id = map.add_tile_layer(&spec);
        self.active = Some((kind, id));
        self.visible = true;
        info!("added {} weather layer", kind.code());
        Ok(kind.code())
    }

    pub fn remove_weather_layer(&mut self, map: &dyn MapSurface) {
        if let Some((_, id)) = self.active.take() {
            // Already-detached layers are fine.
            map.remove_layer(id);
        }
    }

    /// Flips between hidden and the default opacity; returns the new state.
    pub fn toggle_visibility(&mut self, map: &dyn MapSurface) -> bool {
        let Some((_, id)) = self.active else {
            return false;
        };
        self.visible = !self.visible;
        map.set_opacity(id, if self.visible { OVERLAY_OPACITY } else { 0.0 });
        self.visible
    }

    pub fn set_opacity(&self, map: &dyn MapSurface, opacity: f64) {
        if let Some((_, id)) = self.active {
            map.set_opacity(id, opacity.clamp(0.0, 1.0));
        }
    }
}
