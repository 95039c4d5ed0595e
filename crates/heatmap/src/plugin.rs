//! Named store/renderer pairs that replace the built-in implementations.

use std::collections::HashMap;

use heatmap_common::{HeatmapConfig, HeatmapResult};
use renderer::HeatmapRenderer;

use crate::store::{AggregationStore, DataStore};

pub type StoreFactory = Box<dyn Fn(&HeatmapConfig) -> Box<dyn DataStore>>;
pub type RendererFactory =
    Box<dyn Fn(&HeatmapConfig) -> HeatmapResult<Box<dyn HeatmapRenderer>>>;

/// Factories for an alternative store and renderer.
pub struct Plugin {
    store: StoreFactory,
    renderer: RendererFactory,
}

impl Plugin {
    pub fn new<S, R>(store: S, renderer: R) -> Self
    where
        S: Fn(&HeatmapConfig) -> Box<dyn DataStore> + 'static,
        R: Fn(&HeatmapConfig) -> HeatmapResult<Box<dyn HeatmapRenderer>> + 'static,
    {
        Self {
            store: Box::new(store),
            renderer: Box::new(renderer),
        }
    }

    /// A plugin that only swaps the renderer and keeps the aggregation store.
    pub fn with_renderer<R>(renderer: R) -> Self
    where
        R: Fn(&HeatmapConfig) -> HeatmapResult<Box<dyn HeatmapRenderer>> + 'static,
    {
        Self::new(
            |config: &HeatmapConfig| {
                Box::new(AggregationStore::new(config.radius)) as Box<dyn DataStore>
            },
            renderer,
        )
    }

    pub fn create_store(&self, config: &HeatmapConfig) -> Box<dyn DataStore> {
        (self.store)(config)
    }

    pub fn create_renderer(
        &self,
        config: &HeatmapConfig,
    ) -> HeatmapResult<Box<dyn HeatmapRenderer>> {
        (self.renderer)(config)
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin").finish_non_exhaustive()
    }
}

/// Plugins by name. Passed to [`crate::Heatmap::create`].
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Plugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any previous one with the same key.
    pub fn register(&mut self, key: impl Into<String>, plugin: Plugin) {
        self.plugins.insert(key.into(), plugin);
    }

    pub fn get(&self, key: &str) -> Option<&Plugin> {
        self.plugins.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.plugins.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
