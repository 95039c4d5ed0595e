//! Sparse aggregation of point observations.
//!
//! The store accumulates values per exact `(x, y)` cell and keeps the
//! extrema used to scale them. Every mutation reports what the renderer
//! has to do next as a list of [`StoreEvent`]s, in the order they must be
//! handled.

use std::collections::HashMap;

use heatmap_common::{DataPoint, Extrema, HeatmapData, RenderPoint};

/// Outcome of a store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Points to draw on top of the current image.
    Delta(HeatmapData),
    /// The whole image must be redrawn from a fresh snapshot.
    Invalidate,
    /// Min or max changed.
    ExtremaChanged(Extrema),
}

/// Storage backend driven by the facade.
///
/// The built-in implementation is [`AggregationStore`]; alternatives are
/// supplied through the plugin registry.
pub trait DataStore {
    /// Accumulate a single observation.
    fn add_point(&mut self, point: DataPoint) -> Vec<StoreEvent>;

    /// Accumulate observations in input order.
    fn add_data(&mut self, points: &[DataPoint]) -> Vec<StoreEvent> {
        points.iter().flat_map(|p| self.add_point(*p)).collect()
    }

    /// Replace all data and set the extrema to exactly `(min, max)`.
    fn set_data(&mut self, points: &[DataPoint], max: f64, min: f64) -> Vec<StoreEvent>;

    fn set_data_max(&mut self, max: f64) -> Vec<StoreEvent>;

    fn set_data_min(&mut self, min: f64) -> Vec<StoreEvent>;

    /// De-duplicated snapshot of every occupied cell.
    fn get_data(&self) -> HeatmapData;

    fn extrema(&self) -> Extrema;

    /// Radius used for points that do not carry their own.
    fn set_default_radius(&mut self, radius: u32);

    /// Remove observations. `None` when the store cannot remove data.
    fn remove_data(&mut self, _points: &[DataPoint]) -> Option<Vec<StoreEvent>> {
        None
    }

    /// Exact value lookup, for stores that can answer one.
    fn get_value_at(&self, _x: i32, _y: i32) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    value: f64,
    radius: u32,
}

/// Composite grid key. Coordinates are kept as their raw bit patterns.
#[inline]
fn pack_key(x: i32, y: i32) -> u64 {
    ((x as u32 as u64) << 32) | (y as u32 as u64)
}

#[inline]
fn unpack_key(key: u64) -> (i32, i32) {
    ((key >> 32) as u32 as i32, key as u32 as i32)
}

/// Hash-map backed sparse value store.
#[derive(Debug, Clone)]
pub struct AggregationStore {
    cells: HashMap<u64, Cell>,
    extrema: Extrema,
    default_radius: u32,
}

impl AggregationStore {
    pub fn new(default_radius: u32) -> Self {
        Self {
            cells: HashMap::new(),
            extrema: Extrema::default(),
            default_radius,
        }
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Accumulated value of a cell, if occupied.
    pub fn value_at(&self, x: i32, y: i32) -> Option<f64> {
        self.cells.get(&pack_key(x, y)).map(|c| c.value)
    }

    /// Merge a point into its cell and return the new accumulated value
    /// together with the radius it is drawn with.
    fn accumulate(&mut self, point: &DataPoint) -> (f64, u32) {
        let radius = point.radius.unwrap_or(self.default_radius);
        let cell = self
            .cells
            .entry(pack_key(point.x, point.y))
            .or_insert(Cell { value: 0.0, radius });
        cell.value += point.value;
        (cell.value, cell.radius)
    }

    fn invalidate(&self) -> Vec<StoreEvent> {
        vec![StoreEvent::ExtremaChanged(self.extrema), StoreEvent::Invalidate]
    }
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new(heatmap_common::config::DEFAULT_RADIUS)
    }
}

impl DataStore for AggregationStore {
    fn add_point(&mut self, point: DataPoint) -> Vec<StoreEvent> {
        let (total, radius) = self.accumulate(&point);

        if total > self.extrema.max || total < self.extrema.min {
            // Drawing this point at the old scale would be wrong
            self.extrema.max = self.extrema.max.max(total);
            self.extrema.min = self.extrema.min.min(total);
            return self.invalidate();
        }

        vec![StoreEvent::Delta(HeatmapData::new(
            self.extrema,
            vec![RenderPoint {
                x: point.x,
                y: point.y,
                value: point.value,
                radius,
            }],
        ))]
    }

    fn set_data(&mut self, points: &[DataPoint], max: f64, min: f64) -> Vec<StoreEvent> {
        self.cells.clear();
        for point in points {
            self.accumulate(point);
        }
        self.extrema = Extrema::new(min, max);
        self.invalidate()
    }

    fn set_data_max(&mut self, max: f64) -> Vec<StoreEvent> {
        self.extrema.max = max;
        self.invalidate()
    }

    fn set_data_min(&mut self, min: f64) -> Vec<StoreEvent> {
        self.extrema.min = min;
        self.invalidate()
    }

    fn get_data(&self) -> HeatmapData {
        let mut data: Vec<RenderPoint> = self
            .cells
            .iter()
            .map(|(key, cell)| {
                let (x, y) = unpack_key(*key);
                RenderPoint {
                    x,
                    y,
                    value: cell.value,
                    radius: cell.radius,
                }
            })
            .collect();
        data.sort_unstable_by_key(|p| (p.x, p.y));
        HeatmapData::new(self.extrema, data)
    }

    fn extrema(&self) -> Extrema {
        self.extrema
    }

    fn set_default_radius(&mut self, radius: u32) {
        self.default_radius = radius;
    }
}
