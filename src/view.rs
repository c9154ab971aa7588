//! Map view coordination.
//!
//! [`MapView`] ties the resolver to the current viewport and publishes
//! changes on two [`SignalBus`]es: one for scale changes and one for the
//! visible tile rectangle. A tile loader listens to the latter; anything
//! drawing a scale bar or zoom indicator listens to the former.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PyramidError;
use crate::events::{SignalBus, SignalReceiver};
use crate::pyramid::{PyramidParams, Viewport, VisibleTiles, VisibleTilesResolver};

/// Published after every [`MapView::set_scale`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleChange {
    pub scale: f32,
    pub level: usize,
    pub sub_sample: u32,
}

/// Owns the resolver state of one map and notifies listeners of changes.
#[derive(Debug)]
pub struct MapView {
    resolver: VisibleTilesResolver,
    viewport: Viewport,
    visible: VisibleTiles,
    scale_changed: SignalBus<ScaleChange>,
    visible_tiles_changed: SignalBus<VisibleTiles>,
}

impl MapView {
    /// Create a view at scale 1.0 showing `viewport`.
    pub fn new(params: PyramidParams, viewport: Viewport) -> Result<Self, PyramidError> {
        let resolver = VisibleTilesResolver::new(params)?;
        let visible = resolver.visible_tiles(&viewport);
        Ok(Self {
            resolver,
            viewport,
            visible,
            scale_changed: SignalBus::new(),
            visible_tiles_changed: SignalBus::new(),
        })
    }

    /// Zoom to `scale`.
    ///
    /// The viewport is expected to already be expressed at the new scale;
    /// call [`set_viewport`](Self::set_viewport) first when it also moves.
    pub fn set_scale(&mut self, scale: f32) {
        self.resolver.set_scale(scale);

        let change = ScaleChange {
            scale,
            level: self.resolver.current_level(),
            sub_sample: self.resolver.sub_sample(),
        };
        debug!(
            scale = change.scale,
            level = change.level,
            sub_sample = change.sub_sample,
            "scale changed"
        );
        self.scale_changed.post(change);

        self.refresh();
    }

    /// Move or resize the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.refresh();
    }

    /// Listen for scale changes.
    pub fn subscribe_scale(&self) -> SignalReceiver<ScaleChange> {
        self.scale_changed.subscribe()
    }

    /// Listen for changes of the visible tile rectangle.
    pub fn subscribe_visible_tiles(&self) -> SignalReceiver<VisibleTiles> {
        self.visible_tiles_changed.subscribe()
    }

    pub fn visible_tiles(&self) -> &VisibleTiles {
        &self.visible
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn resolver(&self) -> &VisibleTilesResolver {
        &self.resolver
    }

    fn refresh(&mut self) {
        let visible = self.resolver.visible_tiles(&self.viewport);
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        self.visible_tiles_changed.post(visible);
    }
}
