use tracing::info;

use crate::layer::{LayerId, TileLayerSpec};
use crate::surface::MapSurface;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BaseLayerName {
    Streets,
    Satellite,
    Terrain,
    Dark,
    Light,
}

impl BaseLayerName {
    pub const ALL: [BaseLayerName; 5] = [
        BaseLayerName::Streets,
        BaseLayerName::Satellite,
        BaseLayerName::Terrain,
        BaseLayerName::Dark,
        BaseLayerName::Light,
    ];

    /// Unknown names fall back to streets.
    pub fn parse(name: &str) -> Self {
        match name {
            "satellite" => BaseLayerName::Satellite,
            "terrain" => BaseLayerName::Terrain,
            "dark" => BaseLayerName::Dark,
            "light" => BaseLayerName::Light,
            _ => BaseLayerName::Streets,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseLayerName::Streets => "streets",
            BaseLayerName::Satellite => "satellite",
            BaseLayerName::Terrain => "terrain",
            BaseLayerName::Dark => "dark",
            BaseLayerName::Light => "light",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BaseLayerName::Streets => "Streets",
            BaseLayerName::Satellite => "Satellite",
            BaseLayerName::Terrain => "Terrain",
            BaseLayerName::Dark => "Dark",
            BaseLayerName::Light => "Light",
        }
    }

    pub fn spec(&self) -> TileLayerSpec {
        match self {
            BaseLayerName::Streets => TileLayerSpec::base(
                "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                "© OpenStreetMap contributors",
                19,
            ),
            BaseLayerName::Satellite => TileLayerSpec::base(
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                "Tiles © Esri — Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community",
                18,
            ),
            BaseLayerName::Terrain => TileLayerSpec::base(
                "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
                "Map data: © OpenStreetMap contributors, SRTM | Map style: © OpenTopoMap",
                17,
            ),
            BaseLayerName::Dark => TileLayerSpec::base(
                "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
                "© OpenStreetMap contributors © CARTO",
                19,
            )
            .with_subdomains("abcd"),
            BaseLayerName::Light => TileLayerSpec::base(
                "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
                "© OpenStreetMap contributors © CARTO",
                19,
            )
            .with_subdomains("abcd"),
        }
    }
}

/// Base-layer registry: at most one base layer attached at a time.
#[derive(Debug)]
pub struct MapLayers {
    current_name: BaseLayerName,
    attached: Option<LayerId>,
}

impl Default for MapLayers {
    fn default() -> Self {
        Self {
            current_name: BaseLayerName::Streets,
            attached: None,
        }
    }
}

impl MapLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_layer(name: &str) -> TileLayerSpec {
        BaseLayerName::parse(name).spec()
    }

    pub fn current(&self) -> BaseLayerName {
        self.current_name
    }

    pub fn attached_id(&self) -> Option<LayerId> {
        self.attached
    }

    /// Attaches the current base layer; used once when the map is built.
    pub fn attach_initial(&mut self, map: &dyn MapSurface) {
        let name = self.current_name;
        self.switch_to(map, name);
    }

    pub fn switch_layer(&mut self, map: &dyn MapSurface, name: &str) -> BaseLayerName {
        let name = BaseLayerName::parse(name);
        self.switch_to(map, name);
        info!("switched to {} map layer", name.as_str());
        name
    }

    fn switch_to(&mut self, map: &dyn MapSurface, name: BaseLayerName) {
        // Remove-before-add; an already detached layer is skipped.
        if let Some(id) = self.attached.take() {
            if map.has_layer(id) {
                map.remove_layer(id);
            }
        }
        self.attached = Some(map.add_tile_layer(&name.spec()));
        self.current_name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::{BaseLayerName, MapLayers};
    use crate::layer::TileRole;
    use crate::surface::{MapSurface, MemoryMapSurface};
    use foundation::LatLng;

    fn map() -> MemoryMapSurface {
        MemoryMapSurface::new(LatLng::new(14.651, 121.0437), 6)
    }

    #[test]
    fn unknown_names_fall_back_to_streets() {
        assert_eq!(BaseLayerName::parse("watercolor"), BaseLayerName::Streets);
        assert_eq!(
            MapLayers::get_layer("nope").url_template,
            BaseLayerName::Streets.spec().url_template
        );
    }

    #[test]
    fn at_most_one_base_layer_for_any_switch_sequence() {
        let map = map();
        let mut layers = MapLayers::new();
        layers.attach_initial(&map);
        for name in ["dark", "dark", "satellite", "bogus", "light", "terrain", "terrain"] {
            layers.switch_layer(&map, name);
            assert_eq!(map.tile_layers(TileRole::Base).len(), 1);
        }
        assert_eq!(layers.current(), BaseLayerName::Terrain);
        assert_eq!(map.tile_layers(TileRole::Base)[0].max_zoom, 17);
    }

    #[test]
    fn switching_after_external_removal_does_not_fail() {
        let map = map();
        let mut layers = MapLayers::new();
        layers.switch_layer(&map, "dark");
        let id = layers.attached_id().unwrap();
        map.remove_layer(id);
        layers.switch_layer(&map, "light");
        let attached = map.tile_layers(TileRole::Base);
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].subdomains.as_deref(), Some("abcd"));
    }
}
