use std::cell::RefCell;
use std::collections::BTreeMap;

use foundation::{GeoBounds, LatLng};

use crate::layer::{LayerId, MarkerSpec, TileLayerSpec, TileRole};

/// The operations the dashboard needs from a slippy map.
///
/// Methods take `&self`: the browser implementation forwards to a JS map object
/// and the in-memory implementation keeps its state in a `RefCell`.
pub trait MapSurface {
    fn add_tile_layer(&self, spec: &TileLayerSpec) -> LayerId;
    fn add_marker(&self, spec: &MarkerSpec) -> LayerId;
    /// Detaching something that is not attached is a no-op returning `false`.
    fn remove_layer(&self, id: LayerId) -> bool;
    fn has_layer(&self, id: LayerId) -> bool;
    fn set_opacity(&self, id: LayerId, opacity: f64);
    fn set_view(&self, center: LatLng, zoom: u8);
    fn view(&self) -> (LatLng, u8);
    fn fit_bounds(&self, bounds: GeoBounds, padding_px: u32);
    /// Opens the popup bound to a marker; `false` when the marker has none.
    fn open_popup(&self, id: LayerId) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attached {
    Tile(TileLayerSpec),
    Marker(MarkerSpec),
}

#[derive(Debug)]
struct MemoryMapInner {
    next_id: u64,
    attached: BTreeMap<LayerId, Attached>,
    center: LatLng,
    zoom: u8,
    fitted: Option<(GeoBounds, u32)>,
    open_popup: Option<LayerId>,
}

/// Map surface that records attachments; used natively and in tests.
#[derive(Debug)]
pub struct MemoryMapSurface {
    inner: RefCell<MemoryMapInner>,
}

impl MemoryMapSurface {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            inner: RefCell::new(MemoryMapInner {
                next_id: 1,
                attached: BTreeMap::new(),
                center,
                zoom,
                fitted: None,
                open_popup: None,
            }),
        }
    }

    fn attach(&self, item: Attached) -> LayerId {
        let mut inner = self.inner.borrow_mut();
        let id = LayerId(inner.next_id);
        inner.next_id += 1;
        inner.attached.insert(id, item);
        id
    }

    pub fn tile_layers(&self, role: TileRole) -> Vec<TileLayerSpec> {
        self.inner
            .borrow()
            .attached
            .values()
            .filter_map(|a| match a {
                Attached::Tile(t) if t.role == role => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn markers(&self) -> Vec<MarkerSpec> {
        self.inner
            .borrow()
            .attached
            .values()
            .filter_map(|a| match a {
                Attached::Marker(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn opacity_of(&self, id: LayerId) -> Option<f64> {
        match self.inner.borrow().attached.get(&id) {
            Some(Attached::Tile(t)) => Some(t.opacity),
            _ => None,
        }
    }

    pub fn last_fit(&self) -> Option<(GeoBounds, u32)> {
        self.inner.borrow().fitted
    }

    pub fn open_popup_id(&self) -> Option<LayerId> {
        self.inner.borrow().open_popup
    }
}

impl MapSurface for MemoryMapSurface {
    fn add_tile_layer(&self, spec: &TileLayerSpec) -> LayerId {
        self.attach(Attached::Tile(spec.clone()))
    }

    fn add_marker(&self, spec: &MarkerSpec) -> LayerId {
        self.attach(Attached::Marker(spec.clone()))
    }

    fn remove_layer(&self, id: LayerId) -> bool {
        self.inner.borrow_mut().attached.remove(&id).is_some()
    }

    fn has_layer(&self, id: LayerId) -> bool {
        self.inner.borrow().attached.contains_key(&id)
    }

    fn set_opacity(&self, id: LayerId, opacity: f64) {
        if let Some(Attached::Tile(t)) = self.inner.borrow_mut().attached.get_mut(&id) {
            t.opacity = opacity;
        }
    }

    fn set_view(&self, center: LatLng, zoom: u8) {
        let mut inner = self.inner.borrow_mut();
        inner.center = center;
        inner.zoom = zoom;
    }

    fn view(&self) -> (LatLng, u8) {
        let inner = self.inner.borrow();
        (inner.center, inner.zoom)
    }

    fn fit_bounds(&self, bounds: GeoBounds, padding_px: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.fitted = Some((bounds, padding_px));
        inner.center = bounds.center();
    }

    fn open_popup(&self, id: LayerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let has_popup = matches!(
            inner.attached.get(&id),
            Some(Attached::Marker(MarkerSpec { popup_html: Some(_), .. }))
        );
        if has_popup {
            inner.open_popup = Some(id);
        }
        has_popup
    }
}

#[cfg(test)]
mod tests {
    use super::{MapSurface, MemoryMapSurface};
    use crate::layer::{MarkerSpec, TileLayerSpec, TileRole};
    use foundation::LatLng;

    #[test]
    fn removing_twice_is_a_noop() {
        let map = MemoryMapSurface::new(LatLng::new(0.0, 0.0), 3);
        let id = map.add_tile_layer(&TileLayerSpec::base("u", "a", 19));
        assert!(map.has_layer(id));
        assert!(map.remove_layer(id));
        assert!(!map.remove_layer(id));
        assert!(map.tile_layers(TileRole::Base).is_empty());
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let map = MemoryMapSurface::new(LatLng::new(0.0, 0.0), 3);
        let a = map.add_tile_layer(&TileLayerSpec::base("u", "a", 19));
        let b = map.add_marker(&MarkerSpec::pin(LatLng::new(1.0, 1.0)));
        assert_ne!(a, b);
        assert_eq!(map.markers().len(), 1);
    }
}
