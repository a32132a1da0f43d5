use foundation::GeoBounds;

use crate::layer::{LayerId, MarkerSpec};
use crate::surface::MapSurface;

/// A group of markers that is always replaced wholesale (clear-then-redraw).
#[derive(Debug, Default)]
pub struct MarkerSet {
    ids: Vec<LayerId>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    pub fn clear(&mut self, map: &dyn MapSurface) {
        for id in self.ids.drain(..) {
            map.remove_layer(id);
        }
    }

    /// Clears, draws `specs`, and returns the bounds of what was drawn.
    pub fn replace_all(&mut self, map: &dyn MapSurface, specs: &[MarkerSpec]) -> Option<GeoBounds> {
        self.clear(map);
        for spec in specs {
            self.ids.push(map.add_marker(spec));
        }
        GeoBounds::from_points(specs.iter().map(|s| s.position))
    }
}

/// The single "current selection" marker on the main map.
#[derive(Debug, Default)]
pub struct SelectionMarker {
    id: Option<LayerId>,
}

impl SelectionMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_placed(&self) -> bool {
        self.id.is_some()
    }

    pub fn place(&mut self, map: &dyn MapSurface, spec: &MarkerSpec) -> LayerId {
        self.remove(map);
        let id = map.add_marker(spec);
        self.id = Some(id);
        id
    }

    pub fn remove(&mut self, map: &dyn MapSurface) {
        if let Some(id) = self.id.take() {
            map.remove_layer(id);
        }
    }
}
