use foundation::LatLng;

/// Handle for anything attached to a map surface: tile layers and markers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TileRole {
    Base,
    Overlay,
}

/// Everything needed to construct a Leaflet `L.tileLayer`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayerSpec {
    pub role: TileRole,
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub subdomains: Option<String>,
    pub opacity: f64,
}

impl TileLayerSpec {
    pub fn base(url_template: &str, attribution: &str, max_zoom: u8) -> Self {
        Self {
            role: TileRole::Base,
            url_template: url_template.to_string(),
            attribution: attribution.to_string(),
            max_zoom,
            subdomains: None,
            opacity: 1.0,
        }
    }

    pub fn with_subdomains(mut self, subdomains: &str) -> Self {
        self.subdomains = Some(subdomains.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerIcon {
    /// Leaflet's default pin.
    Pin,
    /// Round `divIcon` badge showing a short label (user initials).
    Badge {
        label: String,
        class_name: String,
        size_px: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub icon: MarkerIcon,
    /// Pre-escaped popup markup.
    pub popup_html: Option<String>,
    pub open_popup: bool,
    pub tooltip: Option<String>,
}

impl MarkerSpec {
    pub fn pin(position: LatLng) -> Self {
        Self {
            position,
            icon: MarkerIcon::Pin,
            popup_html: None,
            open_popup: false,
            tooltip: None,
        }
    }

    pub fn with_popup(mut self, html: impl Into<String>, open: bool) -> Self {
        self.popup_html = Some(html.into());
        self.open_popup = open;
        self
    }

    pub fn with_icon(mut self, icon: MarkerIcon) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_tooltip(mut self, text: impl Into<String>) -> Self {
        self.tooltip = Some(text.into());
        self
    }
}
