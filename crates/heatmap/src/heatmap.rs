//! The public facade wiring store, renderer and coordinator together.

use serde_json::Value;
use tracing::{debug, info, trace};

use heatmap_common::{
    ConfigPatch, DataPoint, DataSet, HeatmapConfig, HeatmapData, HeatmapError, HeatmapResult,
};
use renderer::{CanvasRenderer, HeatmapRenderer};

use crate::coordinator::{Coordinator, EventKind, ExtremaChange, HeatmapEvent};
use crate::plugin::PluginRegistry;
use crate::store::{AggregationStore, DataStore, StoreEvent};

/// A heatmap instance.
///
/// Owns one store and one renderer for its whole lifetime. Every mutating
/// operation updates the store first and then redraws, either the affected
/// points only or the whole surface.
pub struct Heatmap {
    config: HeatmapConfig,
    store: Box<dyn DataStore>,
    renderer: Box<dyn HeatmapRenderer>,
    coordinator: Coordinator,
}

impl Heatmap {
    /// Create a heatmap with the built-in store and canvas renderer.
    pub fn new(config: HeatmapConfig) -> HeatmapResult<Self> {
        Self::create(config, &PluginRegistry::default())
    }

    /// Create a heatmap, taking the store and renderer from the plugin
    /// named in `config.plugin` if set.
    pub fn create(config: HeatmapConfig, plugins: &PluginRegistry) -> HeatmapResult<Self> {
        config.validate()?;

        let (store, renderer): (Box<dyn DataStore>, Box<dyn HeatmapRenderer>) =
            match &config.plugin {
                Some(key) => {
                    let plugin = plugins
                        .get(key)
                        .ok_or_else(|| HeatmapError::PluginNotFound(key.clone()))?;
                    (plugin.create_store(&config), plugin.create_renderer(&config)?)
                }
                None => (
                    Box::new(AggregationStore::new(config.radius)),
                    Box::new(CanvasRenderer::new(&config)),
                ),
            };

        info!(
            width = config.width,
            height = config.height,
            radius = config.radius,
            plugin = config.plugin.as_deref().unwrap_or("canvas"),
            "Created heatmap"
        );

        Ok(Self {
            config,
            store,
            renderer,
            coordinator: Coordinator::new(),
        })
    }

    pub fn config(&self) -> &HeatmapConfig {
        &self.config
    }

    /// Add one observation.
    pub fn add_point(&mut self, point: DataPoint) -> HeatmapResult<()> {
        let events = self.store.add_point(point);
        self.dispatch(events)
    }

    /// Add observations in order.
    pub fn add_data<I>(&mut self, points: I) -> HeatmapResult<()>
    where
        I: IntoIterator<Item = DataPoint>,
    {
        let points: Vec<DataPoint> = points.into_iter().collect();
        let events = self.store.add_data(&points);
        self.dispatch(events)
    }

    /// Add arbitrary records, mapping each one to a point with `extract`.
    pub fn add_records<T, F>(&mut self, records: &[T], extract: F) -> HeatmapResult<()>
    where
        F: FnMut(&T) -> DataPoint,
    {
        self.add_data(records.iter().map(extract))
    }

    /// Add a JSON record or an array of records, read through the
    /// configured field names.
    ///
    /// Every record is parsed before any is added, so a malformed record
    /// leaves the heatmap untouched.
    pub fn add_json(&mut self, json: &Value) -> HeatmapResult<()> {
        let points = match json {
            Value::Array(records) => records
                .iter()
                .map(|r| DataPoint::from_json(r, &self.config.fields))
                .collect::<HeatmapResult<Vec<_>>>()?,
            record => vec![DataPoint::from_json(record, &self.config.fields)?],
        };
        self.add_data(points)
    }

    /// Replace all data. `min` defaults to 0.
    pub fn set_data(&mut self, points: &[DataPoint], max: f64, min: Option<f64>) -> HeatmapResult<()> {
        let events = self.store.set_data(points, max, min.unwrap_or(0.0));
        self.dispatch(events)
    }

    pub fn set_dataset(&mut self, dataset: DataSet) -> HeatmapResult<()> {
        self.set_data(&dataset.data, dataset.max, dataset.min)
    }

    pub fn set_data_max(&mut self, max: f64) -> HeatmapResult<()> {
        let events = self.store.set_data_max(max);
        self.dispatch(events)
    }

    pub fn set_data_min(&mut self, min: f64) -> HeatmapResult<()> {
        let events = self.store.set_data_min(min);
        self.dispatch(events)
    }

    /// Remove observations if the store supports it. No-op otherwise.
    pub fn remove_data(&mut self, points: &[DataPoint]) -> HeatmapResult<()> {
        match self.store.remove_data(points) {
            Some(events) => self.dispatch(events),
            None => {
                debug!(points = points.len(), "Store does not support removal");
                Ok(())
            }
        }
    }

    /// Merge a partial configuration and redraw everything.
    pub fn configure(&mut self, patch: ConfigPatch) -> HeatmapResult<()> {
        let mut config = self.config.clone();
        config.merge(&patch);
        config.validate()?;

        debug!(?patch, "Reconfiguring heatmap");
        self.config = config;
        self.store.set_default_radius(self.config.radius);
        self.renderer.update_config(&self.config);
        self.repaint()
    }

    /// Redraw the whole surface from the current store contents.
    pub fn repaint(&mut self) -> HeatmapResult<()> {
        let snapshot = self.store.get_data();
        self.renderer.render_all(&snapshot);
        self.coordinator.publish(&HeatmapEvent::RenderAll(snapshot))
    }

    pub fn get_data(&self) -> HeatmapData {
        self.store.get_data()
    }

    pub fn get_image_png(&self) -> HeatmapResult<Vec<u8>> {
        self.renderer.get_image_png()
    }

    pub fn get_image_url(&self) -> HeatmapResult<String> {
        self.renderer.get_image_url()
    }

    /// Value at a pixel: exact from the store when it can answer,
    /// otherwise approximated by the renderer.
    pub fn get_value_at(&self, x: i32, y: i32) -> Option<f64> {
        self.store
            .get_value_at(x, y)
            .or_else(|| self.renderer.get_value_at(x, y))
    }

    /// Observe render or extrema events.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&HeatmapEvent) -> HeatmapResult<()> + 'static,
    {
        self.coordinator.subscribe(kind, handler);
    }

    /// Call `callback` with the new extrema and gradient whenever they change.
    pub fn on_extrema_change<F>(&mut self, mut callback: F)
    where
        F: FnMut(&ExtremaChange) + 'static,
    {
        self.coordinator
            .subscribe(EventKind::ExtremaChange, move |event| {
                if let HeatmapEvent::ExtremaChange(change) = event {
                    callback(change);
                }
                Ok(())
            });
    }

    /// Apply the outcome of one store operation.
    ///
    /// When any event invalidates the image, the snapshot already holds
    /// every delta of the operation, so deltas are dropped and the surface
    /// is repainted once after all extrema changes were published.
    fn dispatch(&mut self, events: Vec<StoreEvent>) -> HeatmapResult<()> {
        let invalidated = events.iter().any(|e| matches!(e, StoreEvent::Invalidate));

        for event in events {
            match event {
                StoreEvent::Delta(_) if invalidated => {}
                StoreEvent::Delta(delta) => {
                    trace!(points = delta.data.len(), "Rendering delta");
                    self.renderer.render_partial(&delta);
                    if self.coordinator.has_subscribers(EventKind::RenderPartial) {
                        self.coordinator.publish(&HeatmapEvent::RenderPartial(delta))?;
                    }
                }
                StoreEvent::Invalidate => {}
                StoreEvent::ExtremaChanged(extrema) => {
                    let change = ExtremaChange {
                        min: extrema.min,
                        max: extrema.max,
                        gradient: self.config.gradient.clone(),
                    };
                    self.coordinator
                        .publish(&HeatmapEvent::ExtremaChange(change))?;
                }
            }
        }

        if invalidated {
            self.repaint()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Heatmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heatmap")
            .field("config", &self.config)
            .field("extrema", &self.store.extrema())
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
