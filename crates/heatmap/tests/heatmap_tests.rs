//! End-to-end tests for the heatmap facade.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use heatmap::{
    AggregationStore, Color, ConfigPatch, DataPoint, DataSet, DataStore, EventKind, ExtremaChange,
    FieldNames, Heatmap, HeatmapConfig, HeatmapData, HeatmapError, HeatmapEvent, HeatmapResult,
    Plugin, PluginRegistry, StoreEvent,
};
use renderer::{CanvasRenderer, HeatmapRenderer};
use test_utils::{hard_disk_config, sizes, solid_gradient};

// ============================================================================
// Helper functions
// ============================================================================

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .expect("valid PNG")
        .to_rgba8()
}

fn hard_map() -> Heatmap {
    Heatmap::new(hard_disk_config(sizes::SMALL, 10)).unwrap()
}

/// Renderer that records what it was asked to do.
struct RecordingRenderer {
    calls: Rc<RefCell<Vec<String>>>,
}

impl HeatmapRenderer for RecordingRenderer {
    fn render_partial(&mut self, data: &HeatmapData) {
        self.calls.borrow_mut().push(format!("partial:{}", data.data.len()));
    }

    fn render_all(&mut self, data: &HeatmapData) {
        self.calls.borrow_mut().push(format!("all:{}", data.data.len()));
    }

    fn update_config(&mut self, _config: &HeatmapConfig) {
        self.calls.borrow_mut().push("config".to_string());
    }

    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.calls.borrow_mut().push(format!("resize:{}x{}", width, height));
    }

    fn get_image_png(&self) -> HeatmapResult<Vec<u8>> {
        Err(HeatmapError::Encoding("recording renderer has no image".to_string()))
    }
}

/// Store that answers exact value lookups and supports removal.
struct ExactStore {
    inner: AggregationStore,
}

impl DataStore for ExactStore {
    fn add_point(&mut self, point: DataPoint) -> Vec<StoreEvent> {
        self.inner.add_point(point)
    }

    fn set_data(&mut self, points: &[DataPoint], max: f64, min: f64) -> Vec<StoreEvent> {
        self.inner.set_data(points, max, min)
    }

    fn set_data_max(&mut self, max: f64) -> Vec<StoreEvent> {
        self.inner.set_data_max(max)
    }

    fn set_data_min(&mut self, min: f64) -> Vec<StoreEvent> {
        self.inner.set_data_min(min)
    }

    fn get_data(&self) -> HeatmapData {
        self.inner.get_data()
    }

    fn extrema(&self) -> heatmap::Extrema {
        self.inner.extrema()
    }

    fn set_default_radius(&mut self, radius: u32) {
        self.inner.set_default_radius(radius);
    }

    fn remove_data(&mut self, points: &[DataPoint]) -> Option<Vec<StoreEvent>> {
        let remaining: Vec<DataPoint> = self
            .inner
            .get_data()
            .data
            .iter()
            .filter(|p| !points.iter().any(|r| r.x == p.x && r.y == p.y))
            .map(|p| DataPoint::new(p.x, p.y).with_value(p.value).with_radius(p.radius))
            .collect();
        let extrema = self.inner.extrema();
        Some(self.inner.set_data(&remaining, extrema.max, extrema.min))
    }

    fn get_value_at(&self, x: i32, y: i32) -> Option<f64> {
        self.inner.value_at(x, y)
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_unknown_plugin_fails_construction() {
    let config = HeatmapConfig {
        plugin: Some("webgl".to_string()),
        ..HeatmapConfig::with_size(10, 10)
    };
    let err = Heatmap::create(config, &PluginRegistry::new()).unwrap_err();
    assert!(matches!(err, HeatmapError::PluginNotFound(ref name) if name == "webgl"));
    assert!(err.is_construction_error());
}

#[test]
fn test_invalid_config_fails_construction() {
    let config = HeatmapConfig {
        blur: 1.5,
        ..HeatmapConfig::with_size(10, 10)
    };
    let err = Heatmap::new(config).unwrap_err();
    assert!(matches!(err, HeatmapError::InvalidConfig { ref field, .. } if field == "blur"));
}

#[test]
fn test_registered_plugin_is_used() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&calls);

    let mut registry = PluginRegistry::new();
    registry.register(
        "recording",
        Plugin::with_renderer(move |_config: &HeatmapConfig| {
            Ok(Box::new(RecordingRenderer {
                calls: Rc::clone(&recorded),
            }) as Box<dyn HeatmapRenderer>)
        }),
    );
    assert!(registry.contains("recording"));

    let config = HeatmapConfig {
        plugin: Some("recording".to_string()),
        ..HeatmapConfig::with_size(10, 10)
    };
    let mut map = Heatmap::create(config, &registry).unwrap();

    map.add_point(DataPoint::new(1, 1).with_value(0.5)).unwrap();
    map.add_point(DataPoint::new(2, 2).with_value(4.0)).unwrap();
    map.configure(ConfigPatch::default()).unwrap();

    assert_eq!(
        *calls.borrow(),
        vec!["partial:1", "all:2", "config", "all:2"]
    );
    assert!(matches!(map.get_image_url(), Err(HeatmapError::Encoding(_))));
}

#[test]
fn test_zero_sized_heatmap_is_tolerated() {
    let mut map = Heatmap::new(HeatmapConfig::default()).unwrap();
    map.add_point(DataPoint::new(5, 5)).unwrap();
    map.repaint().unwrap();
    assert_eq!(map.get_data().data.len(), 1);
}

// ============================================================================
// Data ingestion
// ============================================================================

#[test]
fn test_single_point_renders_disk() {
    let mut map = hard_map();
    map.set_data(&[DataPoint::new(50, 50).with_value(5.0)], 5.0, None)
        .unwrap();

    let img = decode(&map.get_image_png().unwrap());
    assert_eq!(img.get_pixel(50, 50).0, [255, 255, 255, 255]);
    assert_eq!(img.get_pixel(50, 45).0, [255, 255, 255, 255]);
    assert_eq!(img.get_pixel(50, 62).0[3], 0);
    assert_eq!(map.get_value_at(50, 50), Some(5.0));
}

#[test]
fn test_raising_max_repaints_at_new_scale() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(50, 50)).unwrap();
    map.add_point(DataPoint::new(20, 20).with_value(3.0)).unwrap();
    assert_eq!(map.get_data().max, 3.0);

    // The visible image equals a fresh full render of the snapshot
    let mut reference = CanvasRenderer::new(&hard_disk_config(sizes::SMALL, 10));
    reference.render_all(&map.get_data());
    assert_eq!(map.get_image_png().unwrap(), reference.get_image_png().unwrap());

    // The first point is drawn at a third of the new range
    let img = decode(&map.get_image_png().unwrap());
    assert_eq!(img.get_pixel(50, 50).0[3], 85);
    assert_eq!(img.get_pixel(20, 20).0[3], 255);
}

#[test]
fn test_add_data_accumulates_duplicates() {
    let mut map = hard_map();
    map.add_data(vec![
        DataPoint::new(10, 10),
        DataPoint::new(10, 10).with_value(2.0),
        DataPoint::new(30, 30),
    ])
    .unwrap();

    let data = map.get_data();
    assert_eq!(data.data.len(), 2);
    assert_eq!(data.data[0].value, 3.0);
    assert_eq!(data.max, 3.0);
}

#[test]
fn test_mixed_batch_matches_full_render() {
    let mut map = hard_map();
    map.add_data(vec![
        DataPoint::new(20, 20).with_value(5.0),
        DataPoint::new(60, 60).with_value(2.0),
    ])
    .unwrap();

    let mut reference = CanvasRenderer::new(&hard_disk_config(sizes::SMALL, 10));
    reference.render_all(&map.get_data());
    let batched = map.get_image_png().unwrap();
    assert_eq!(batched, reference.get_image_png().unwrap());

    // The later point is stamped once, at the raised scale
    assert_eq!(map.get_value_at(60, 60), Some(2.0));

    map.repaint().unwrap();
    assert_eq!(map.get_image_png().unwrap(), batched);
}

#[test]
fn test_batch_repaints_once_after_all_extrema_changes() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut map = hard_map();

    for kind in [EventKind::RenderPartial, EventKind::RenderAll, EventKind::ExtremaChange] {
        let log = Rc::clone(&log);
        map.subscribe(kind, move |event: &HeatmapEvent| {
            let entry = match event {
                HeatmapEvent::ExtremaChange(change) => format!("extrema:{}", change.max),
                other => format!("{:?}", other.kind()),
            };
            log.borrow_mut().push(entry);
            Ok(())
        });
    }

    map.add_data(vec![
        DataPoint::new(10, 10).with_value(0.5),
        DataPoint::new(20, 20).with_value(4.0),
        DataPoint::new(30, 30).with_value(1.0),
        DataPoint::new(40, 40).with_value(9.0),
    ])
    .unwrap();

    assert_eq!(*log.borrow(), vec!["extrema:4", "extrema:9", "RenderAll"]);
}

#[test]
fn test_oversized_radius_is_stored_but_not_drawn() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(50, 50).with_value(3.0).with_radius(u32::MAX / 2 + 1))
        .unwrap();
    map.add_point(DataPoint::new(20, 20).with_value(3.0)).unwrap();

    assert_eq!(map.get_value_at(50, 50), Some(3.0));
    assert!(map.get_data().data.iter().any(|p| p.x == 50 && p.radius == u32::MAX / 2 + 1));
    map.repaint().unwrap();
}

#[test]
fn test_add_records_uses_extractor() {
    struct Sighting {
        lng: f64,
        lat: f64,
        count: u32,
    }

    let sightings = [
        Sighting { lng: 12.4, lat: 40.0, count: 2 },
        Sighting { lng: 12.6, lat: 40.0, count: 3 },
    ];

    let mut map = hard_map();
    map.add_records(&sightings, |s| {
        DataPoint::new(s.lng.round() as i32, s.lat as i32).with_value(s.count as f64)
    })
    .unwrap();

    let data = map.get_data();
    assert_eq!(data.data.len(), 2);
    assert_eq!((data.data[0].x, data.data[0].value), (12, 2.0));
    assert_eq!((data.data[1].x, data.data[1].value), (13, 3.0));
}

#[test]
fn test_add_json_with_custom_fields() {
    let config = HeatmapConfig {
        fields: FieldNames {
            x: "lng".to_string(),
            y: "lat".to_string(),
            value: "count".to_string(),
        },
        ..hard_disk_config(sizes::SMALL, 10)
    };
    let mut map = Heatmap::new(config).unwrap();

    map.add_json(&json!([
        {"lng": 10, "lat": 20, "count": 4},
        {"lng": "11", "lat": 20},
        {"lng": 12, "lat": 20, "count": 0, "radius": 5},
    ]))
    .unwrap();
    map.add_json(&json!({"lng": 10, "lat": 20, "count": 1})).unwrap();

    let data = map.get_data();
    let values: Vec<(i32, f64, u32)> = data.data.iter().map(|p| (p.x, p.value, p.radius)).collect();
    assert_eq!(values, vec![(10, 5.0, 10), (11, 1.0, 10), (12, 0.0, 5)]);
}

#[test]
fn test_malformed_json_leaves_heatmap_untouched() {
    let mut map = hard_map();
    let err = map
        .add_json(&json!([{"x": 1, "y": 1}, {"x": 2}]))
        .unwrap_err();
    assert!(matches!(err, HeatmapError::InvalidPoint(_)));
    assert!(map.get_data().is_empty());
}

#[test]
fn test_set_dataset_defaults_min_to_zero() {
    let mut map = hard_map();
    let dataset: DataSet = serde_json::from_value(json!({
        "max": 8,
        "data": [{"x": 5, "y": 5, "value": 2}, {"x": 5, "y": 5, "value": 2}]
    }))
    .unwrap();
    map.set_dataset(dataset).unwrap();

    let data = map.get_data();
    assert_eq!((data.min, data.max), (0.0, 8.0));
    assert_eq!(data.data[0].value, 4.0);
}

#[test]
fn test_set_data_replaces_everything() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(80, 80)).unwrap();
    map.set_data(&[DataPoint::new(20, 20)], 1.0, Some(0.0)).unwrap();

    assert_eq!(map.get_data().data.len(), 1);
    let img = decode(&map.get_image_png().unwrap());
    assert_eq!(img.get_pixel(80, 80).0[3], 0);
    assert_eq!(img.get_pixel(20, 20).0[3], 255);
}

// ============================================================================
// Lookups and removal
// ============================================================================

#[test]
fn test_get_value_at_untouched_pixel() {
    let mut map = hard_map();
    assert_eq!(map.get_value_at(3, 3), Some(0.0));
    map.add_point(DataPoint::new(50, 50)).unwrap();
    assert_eq!(map.get_value_at(3, 3), Some(0.0));
}

#[test]
fn test_get_value_at_prefers_store() {
    let mut registry = PluginRegistry::new();
    registry.register(
        "exact",
        Plugin::new(
            |config: &HeatmapConfig| {
                Box::new(ExactStore {
                    inner: AggregationStore::new(config.radius),
                }) as Box<dyn DataStore>
            },
            |config: &HeatmapConfig| {
                Ok(Box::new(CanvasRenderer::new(config)) as Box<dyn HeatmapRenderer>)
            },
        ),
    );

    let config = HeatmapConfig {
        plugin: Some("exact".to_string()),
        ..hard_disk_config(sizes::SMALL, 10)
    };
    let mut map = Heatmap::create(config, &registry).unwrap();
    map.set_data(&[DataPoint::new(50, 50).with_value(7.0)], 1000.0, None)
        .unwrap();

    assert_eq!(map.get_value_at(50, 50), Some(7.0));
    // Not a store cell: the renderer answers from the alpha surface, where
    // the point was stamped at the 0.01 opacity floor (alpha 3)
    assert_eq!(map.get_value_at(52, 50), Some(11.0));
    assert_eq!(map.get_value_at(0, 0), Some(0.0));

    map.remove_data(&[DataPoint::new(50, 50)]).unwrap();
    assert!(map.get_data().is_empty());
    assert_eq!(map.get_value_at(52, 50), Some(0.0));
}

#[test]
fn test_remove_data_is_noop_without_support() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(10, 10)).unwrap();
    let before = map.get_image_png().unwrap();

    map.remove_data(&[DataPoint::new(10, 10)]).unwrap();
    assert_eq!(map.get_data().data.len(), 1);
    assert_eq!(map.get_image_png().unwrap(), before);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_configure_gradient_recolors() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(50, 50)).unwrap();
    map.configure(ConfigPatch::gradient(solid_gradient(Color::css("red"))))
        .unwrap();

    let img = decode(&map.get_image_png().unwrap());
    assert_eq!(img.get_pixel(50, 50).0, [255, 0, 0, 255]);
}

#[test]
fn test_configure_size_resizes_and_repaints() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(50, 50)).unwrap();
    map.configure(ConfigPatch::size(200, 150)).unwrap();

    let img = decode(&map.get_image_png().unwrap());
    assert_eq!(img.dimensions(), (200, 150));
    assert_eq!(img.get_pixel(50, 50).0[3], 255);
    assert_eq!((map.config().width, map.config().height), (200, 150));
}

#[test]
fn test_configure_radius_applies_to_new_points() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(10, 10)).unwrap();
    map.configure(ConfigPatch {
        radius: Some(4),
        ..ConfigPatch::default()
    })
    .unwrap();
    map.add_point(DataPoint::new(60, 60).with_value(0.5)).unwrap();

    let radii: Vec<u32> = map.get_data().data.iter().map(|p| p.radius).collect();
    assert_eq!(radii, vec![10, 4]);
}

#[test]
fn test_invalid_configure_keeps_previous_config() {
    let mut map = hard_map();
    let err = map
        .configure(ConfigPatch {
            min_opacity: Some(0.9),
            max_opacity: Some(0.2),
            ..ConfigPatch::default()
        })
        .unwrap_err();
    assert!(matches!(err, HeatmapError::InvalidConfig { .. }));
    assert_eq!(map.config().max_opacity, 1.0);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_extrema_callback_receives_gradient() {
    let seen: Rc<RefCell<Vec<ExtremaChange>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let mut map = hard_map();
    map.on_extrema_change(move |change| sink.borrow_mut().push(change.clone()));

    map.set_data_max(10.0).unwrap();
    map.set_data_min(2.0).unwrap();
    map.add_point(DataPoint::new(1, 1).with_value(5.0)).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!((seen[0].min, seen[0].max), (0.0, 10.0));
    assert_eq!((seen[1].min, seen[1].max), (2.0, 10.0));
    assert_eq!(seen[0].gradient, map.config().gradient);
}

#[test]
fn test_render_events_are_published() {
    let kinds = Rc::new(RefCell::new(Vec::new()));
    let mut map = hard_map();

    for kind in [EventKind::RenderPartial, EventKind::RenderAll] {
        let log = Rc::clone(&kinds);
        map.subscribe(kind, move |event: &HeatmapEvent| {
            log.borrow_mut().push(event.kind());
            Ok(())
        });
    }

    map.add_point(DataPoint::new(1, 1).with_value(0.5)).unwrap();
    map.add_point(DataPoint::new(1, 1)).unwrap();

    assert_eq!(
        *kinds.borrow(),
        vec![EventKind::RenderPartial, EventKind::RenderAll]
    );
}

#[test]
fn test_handler_error_propagates() {
    let mut map = hard_map();
    map.subscribe(EventKind::RenderAll, |_| {
        Err(HeatmapError::Handler("listener failed".to_string()))
    });

    let err = map.repaint().unwrap_err();
    assert!(matches!(err, HeatmapError::Handler(ref msg) if msg == "listener failed"));
}

#[test]
fn test_image_url() {
    let mut map = hard_map();
    map.add_point(DataPoint::new(50, 50)).unwrap();
    let url = map.get_image_url().unwrap();
    assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
}
