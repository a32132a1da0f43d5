//! [`MapSurface`] over a Leaflet map object. Leaflet itself is loaded by the
//! page template.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use foundation::{GeoBounds, LatLng};
use layers::{LayerId, MapSurface, MarkerIcon, MarkerSpec, TileLayerSpec};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = r#"
export function createMap(elementId, lat, lng, zoom, minZoom, maxZoom, zoomControl) {
    return L.map(elementId, { minZoom, maxZoom, zoomControl }).setView([lat, lng], zoom);
}

export function addTileLayer(map, url, attribution, maxZoom, subdomains, opacity) {
    const options = { attribution, maxZoom, opacity };
    if (subdomains) {
        options.subdomains = subdomains;
    }
    return L.tileLayer(url, options).addTo(map);
}

export function addMarker(map, lat, lng, badgeHtml, className, size, popupHtml, openPopup, tooltip) {
    const options = {};
    if (badgeHtml) {
        options.icon = L.divIcon({
            html: badgeHtml,
            className,
            iconSize: [size, size],
            iconAnchor: [size / 2, size / 2],
        });
    }
    const marker = L.marker([lat, lng], options).addTo(map);
    if (popupHtml) {
        marker.bindPopup(popupHtml);
        if (openPopup) {
            marker.openPopup();
        }
    }
    if (tooltip) {
        marker.bindTooltip(tooltip);
    }
    return marker;
}

export function removeLayer(map, layer) {
    map.removeLayer(layer);
}

export function hasLayer(map, layer) {
    return map.hasLayer(layer);
}

export function setOpacity(layer, opacity) {
    if (layer.setOpacity) {
        layer.setOpacity(opacity);
    }
}

export function setView(map, lat, lng, zoom) {
    map.setView([lat, lng], zoom);
}

export function viewOf(map) {
    const c = map.getCenter();
    return [c.lat, c.lng, map.getZoom()];
}

export function fitBounds(map, south, west, north, east, padding) {
    map.fitBounds([[south, west], [north, east]], { padding: [padding, padding] });
}

export function openPopup(layer) {
    if (!layer.getPopup || !layer.getPopup()) {
        return false;
    }
    layer.openPopup();
    return true;
}

export function addHtmlControl(map, html, position) {
    const Control = L.Control.extend({
        onAdd: function () {
            const div = L.DomUtil.create('div', 'leaflet-bar leaflet-control');
            div.innerHTML = html;
            L.DomEvent.disableClickPropagation(div);
            return div;
        },
    });
    new Control({ position }).addTo(map);
}

export function onMapClick(map, callback) {
    map.on('click', (e) => callback(e.latlng.lat, e.latlng.lng));
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = createMap)]
    fn create_map(element_id: &str, lat: f64, lng: f64, zoom: u8, min_zoom: u8, max_zoom: u8, zoom_control: bool) -> JsValue;
    #[wasm_bindgen(js_name = addTileLayer)]
    fn add_tile_layer(map: &JsValue, url: &str, attribution: &str, max_zoom: u8, subdomains: &str, opacity: f64) -> JsValue;
    #[wasm_bindgen(js_name = addMarker)]
    fn add_marker(
        map: &JsValue,
        lat: f64,
        lng: f64,
        badge_html: &str,
        class_name: &str,
        size: u32,
        popup_html: &str,
        open_popup: bool,
        tooltip: &str,
    ) -> JsValue;
    #[wasm_bindgen(js_name = removeLayer)]
    fn remove_layer(map: &JsValue, layer: &JsValue);
    #[wasm_bindgen(js_name = hasLayer)]
    fn has_layer(map: &JsValue, layer: &JsValue) -> bool;
    #[wasm_bindgen(js_name = setOpacity)]
    fn set_opacity(layer: &JsValue, opacity: f64);
    #[wasm_bindgen(js_name = setView)]
    fn set_view(map: &JsValue, lat: f64, lng: f64, zoom: u8);
    #[wasm_bindgen(js_name = viewOf)]
    fn view_of(map: &JsValue) -> Vec<f64>;
    #[wasm_bindgen(js_name = fitBounds)]
    fn fit_bounds(map: &JsValue, south: f64, west: f64, north: f64, east: f64, padding: u32);
    #[wasm_bindgen(js_name = openPopup)]
    fn open_popup(layer: &JsValue) -> bool;
    #[wasm_bindgen(js_name = addHtmlControl)]
    fn add_html_control(map: &JsValue, html: &str, position: &str);
    #[wasm_bindgen(js_name = onMapClick)]
    fn on_map_click(map: &JsValue, callback: &Closure<dyn Fn(f64, f64)>);
}

pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub zoom_control: bool,
}

/// One Leaflet map and the layers the dashboard attached to it.
pub struct LeafletMap {
    map: JsValue,
    layers: RefCell<BTreeMap<LayerId, JsValue>>,
    next_id: Cell<u64>,
}

impl LeafletMap {
    pub fn create(element_id: &str, options: &MapOptions) -> Self {
        let map = create_map(
            element_id,
            options.center.lat,
            options.center.lng,
            options.zoom,
            options.min_zoom,
            options.max_zoom,
            options.zoom_control,
        );
        Self {
            map,
            layers: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
        }
    }

    fn remember(&self, layer: JsValue) -> LayerId {
        let id = LayerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.layers.borrow_mut().insert(id, layer);
        id
    }

    pub fn add_control(&self, html: &str, position: &str) {
        add_html_control(&self.map, html, position);
    }

    /// Calls `f` with the clicked point for every map click.
    pub fn on_click(&self, f: impl Fn(LatLng) + 'static) {
        let cb = Closure::<dyn Fn(f64, f64)>::new(move |lat, lng| f(LatLng::new(lat, lng)));
        on_map_click(&self.map, &cb);
        cb.forget();
    }
}

impl MapSurface for LeafletMap {
    fn add_tile_layer(&self, spec: &TileLayerSpec) -> LayerId {
        let layer = add_tile_layer(
            &self.map,
            &spec.url_template,
            &spec.attribution,
            spec.max_zoom,
            spec.subdomains.as_deref().unwrap_or(""),
            spec.opacity,
        );
        self.remember(layer)
    }

    fn add_marker(&self, spec: &MarkerSpec) -> LayerId {
        let (badge, class_name, size) = match &spec.icon {
            MarkerIcon::Pin => (String::new(), String::new(), 0),
            MarkerIcon::Badge {
                label,
                class_name,
                size_px,
            } => (
                format!(r#"<div class="marker-badge">{}</div>"#, foundation::escape_html(label)),
                class_name.clone(),
                *size_px,
            ),
        };
        let layer = add_marker(
            &self.map,
            spec.position.lat,
            spec.position.lng,
            &badge,
            &class_name,
            size,
            spec.popup_html.as_deref().unwrap_or(""),
            spec.open_popup,
            spec.tooltip.as_deref().unwrap_or(""),
        );
        self.remember(layer)
    }

    fn remove_layer(&self, id: LayerId) -> bool {
        match self.layers.borrow_mut().remove(&id) {
            Some(layer) => {
                remove_layer(&self.map, &layer);
                true
            }
            None => false,
        }
    }

    fn has_layer(&self, id: LayerId) -> bool {
        self.layers
            .borrow()
            .get(&id)
            .is_some_and(|layer| has_layer(&self.map, layer))
    }

    fn set_opacity(&self, id: LayerId, opacity: f64) {
        if let Some(layer) = self.layers.borrow().get(&id) {
            set_opacity(layer, opacity);
        }
    }

    fn set_view(&self, center: LatLng, zoom: u8) {
        set_view(&self.map, center.lat, center.lng, zoom);
    }

    fn view(&self) -> (LatLng, u8) {
        match view_of(&self.map).as_slice() {
            [lat, lng, zoom] => (LatLng::new(*lat, *lng), *zoom as u8),
            _ => (LatLng::new(0.0, 0.0), 0),
        }
    }

    fn fit_bounds(&self, bounds: GeoBounds, padding_px: u32) {
        fit_bounds(
            &self.map,
            bounds.south_west.lat,
            bounds.south_west.lng,
            bounds.north_east.lat,
            bounds.north_east.lng,
            padding_px,
        );
    }

    fn open_popup(&self, id: LayerId) -> bool {
        self.layers
            .borrow()
            .get(&id)
            .is_some_and(|layer| open_popup(layer))
    }
}
