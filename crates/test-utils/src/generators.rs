//! Test data generators for synthetic heatmap input.
//!
//! Random generators take an explicit seed so failures reproduce.

use heatmap_common::DataPoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates `count` points scattered over a `width x height` canvas.
///
/// Values are whole numbers in `1..=max_value` so sums compare exactly.
///
/// # Example
///
/// ```
/// use test_utils::random_points;
///
/// let points = random_points(42, 100, 64, 48, 10);
/// assert_eq!(points.len(), 100);
/// assert!(points.iter().all(|p| p.x < 64 && p.y < 48));
/// assert_eq!(points, random_points(42, 100, 64, 48, 10));
/// ```
pub fn random_points(
    seed: u64,
    count: usize,
    width: u32,
    height: u32,
    max_value: u32,
) -> Vec<DataPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x = rng.gen_range(0..width.max(1)) as i32;
            let y = rng.gen_range(0..height.max(1)) as i32;
            let value = rng.gen_range(1..=max_value.max(1)) as f64;
            DataPoint::new(x, y).with_value(value)
        })
        .collect()
}

/// Creates points that all land on a small set of hot spots.
///
/// Useful for exercising accumulation: each of `spots` cells receives
/// `per_spot` points of value 1.
pub fn clustered_points(spots: &[(i32, i32)], per_spot: usize) -> Vec<DataPoint> {
    spots
        .iter()
        .flat_map(|&(x, y)| std::iter::repeat(DataPoint::new(x, y).with_value(1.0)).take(per_spot))
        .collect()
}

/// Creates one point per cell on a regular lattice.
///
/// Cell `(col, row)` sits at `(col * step, row * step)` and carries the
/// value `col + row + 1`.
pub fn lattice_points(cols: u32, rows: u32, step: i32) -> Vec<DataPoint> {
    let mut points = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            points.push(
                DataPoint::new(col as i32 * step, row as i32 * step)
                    .with_value((col + row + 1) as f64),
            );
        }
    }
    points
}
