//! Path smoother turning a cell path into a continuous world-frame trajectory.
//!
//! The cell path is walked greedily: from an anchor cell the smoother extends a straight,
//! line-of-sight checked shortcut as far along the path as it stays clear of the inflated
//! obstacle set, emits it as evenly spaced points and re-anchors at the last visible cell.
//! A moving average over the emitted points then rounds off the joints.

use grid_util::point::Point;
use log::{debug, warn};
use num_traits::Float;

use crate::line_tracer::trace;
use crate::occupancy_grid::OccupancyGrid;
use crate::path::{DiscretePath, SmoothedPath, WorldPoint};
use crate::{
    FALLBACK_SEGMENT_POINTS, SEGMENT_POINTS_PER_CELL, SMOOTHING_ITERATION_FACTOR,
    SMOOTHING_WINDOW,
};

/// One straight piece of the smoothed path, between two cells of the discrete path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    /// Number of interpolated points, both ends included.
    pub points: usize,
    /// A short bridge emitted when no shortcut was visible. Fallback segments are not
    /// line-of-sight checked.
    pub fallback: bool,
}

impl Segment {
    fn shortcut(from: Point, to: Point, traced_cells: usize) -> Segment {
        Segment {
            from,
            to,
            points: segment_points(traced_cells),
            fallback: false,
        }
    }

    fn bridge(from: Point, to: Point) -> Segment {
        Segment {
            from,
            to,
            points: FALLBACK_SEGMENT_POINTS,
            fallback: true,
        }
    }
}

/// Path smoother bound to the grid the path was planned on.
pub struct PathSmoother<'a> {
    grid: &'a OccupancyGrid,
    /// Apply the moving-average post-pass.
    pub moving_average: bool,
}

impl<'a> PathSmoother<'a> {
    pub fn new(grid: &'a OccupancyGrid) -> Self {
        Self {
            grid,
            moving_average: true,
        }
    }

    /// Smooth a discrete path. The result starts on the world point of the first cell and, unless
    /// the iteration cap is hit, ends on the world point of the goal cell.
    pub fn smooth(&self, path: &DiscretePath) -> SmoothedPath {
        let cells = &path.cells;
        match cells.len() {
            0 => return SmoothedPath::default(),
            1 => return SmoothedPath::new(vec![self.grid.cell_to_world(cells[0])]),
            _ => {}
        }

        let segments = self.segments(path);
        let mut points = Vec::new();
        for segment in &segments {
            self.push_segment(&mut points, segment);
        }
        debug!(
            "Smoothed {} cells into {} segments, {} points",
            cells.len(),
            segments.len(),
            points.len()
        );
        self.finish(points)
    }

    /// Collapses the path into consecutive segments. Every segment that is not a
    /// [fallback](Segment::fallback) traces clear of the inflated obstacles.
    pub fn segments(&self, path: &DiscretePath) -> Vec<Segment> {
        let cells = &path.cells;
        let len = cells.len();
        let mut segments = Vec::new();
        if len < 2 {
            return segments;
        }

        let mut start = cells[0];
        let mut last_ok = cells[0];
        let mut last_traced = 0;
        let mut ray_iters = 0;
        let mut idx = 1;
        let max_iterations = SMOOTHING_ITERATION_FACTOR * len;
        let mut iterations = 0;

        while idx < len - 1 {
            if iterations >= max_iterations {
                warn!(
                    "Smoothing stopped after {} iterations at path index {}",
                    iterations, idx
                );
                segments.push(Segment::shortcut(start, last_ok, last_traced));
                return segments;
            }
            iterations += 1;

            let traced = trace(self.grid, start, cells[idx]);
            if !traced.collision {
                last_ok = cells[idx];
                last_traced = traced.cells.len();
                ray_iters += 1;
                idx += 1;
            } else if ray_iters == 0 {
                // Not even the next cell is visible: bridge to it with a short segment.
                segments.push(Segment::bridge(start, cells[idx]));
                start = cells[idx];
                last_ok = start;
                idx += 1;
            } else {
                segments.push(Segment::shortcut(start, last_ok, last_traced));
                start = last_ok;
                ray_iters = 0;
            }
        }

        let goal = cells[len - 1];
        let traced = trace(self.grid, start, goal);
        if !traced.collision {
            segments.push(Segment::shortcut(start, goal, traced.cells.len()));
        } else {
            if last_ok != start {
                segments.push(Segment::shortcut(start, last_ok, last_traced));
            }
            // last_ok is the cell right before the goal here
            segments.push(Segment::bridge(last_ok, goal));
        }
        segments
    }

    /// Appends the evenly spaced points of a segment, both ends included, skipping the first one
    /// when it repeats the last emitted point. A segment that starts and ends on the same cell
    /// contributes that single point.
    fn push_segment(&self, points: &mut Vec<WorldPoint>, segment: &Segment) {
        let a = self.grid.cell_to_world(segment.from);
        let b = self.grid.cell_to_world(segment.to);
        let count = if segment.from == segment.to {
            1
        } else {
            segment.points
        };
        let xs = linspace(a.x, b.x, count);
        let ys = linspace(a.y, b.y, count);
        for p in xs.into_iter().zip(ys).map(|(x, y)| WorldPoint::new(x, y)) {
            if points.last() != Some(&p) {
                points.push(p);
            }
        }
    }

    fn finish(&self, points: Vec<WorldPoint>) -> SmoothedPath {
        if !self.moving_average {
            return SmoothedPath::new(points);
        }
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let xs = moving_average(&xs, SMOOTHING_WINDOW);
        let ys = moving_average(&ys, SMOOTHING_WINDOW);
        SmoothedPath::new(
            xs.into_iter()
                .zip(ys)
                .map(|(x, y)| WorldPoint::new(x, y))
                .collect(),
        )
    }
}

/// Number of points for a shortcut that traced `traced_cells` cells.
fn segment_points(traced_cells: usize) -> usize {
    (SEGMENT_POINTS_PER_CELL * traced_cells).max(2)
}

fn count_as<T: Float>(n: usize) -> T {
    // usize always converts to a float, at worst rounded
    num_traits::cast(n).unwrap_or_else(T::max_value)
}

/// `n` evenly spaced samples from `a` to `b`. The first sample is exactly `a` and the last is
/// exactly `b`.
pub fn linspace<T: Float>(a: T, b: T, n: usize) -> Vec<T> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / count_as::<T>(n - 1);
            (0..n)
                .map(|i| if i == n - 1 { b } else { a + step * count_as::<T>(i) })
                .collect()
        }
    }
}

/// Replaces every sample at least `window / 2 + 1` positions away from both ends by the mean of
/// the `window` input samples starting `window / 2` positions before it. Samples near the ends
/// are kept as they are.
pub fn moving_average<T: Float>(samples: &[T], window: usize) -> Vec<T> {
    let mut filtered = samples.to_vec();
    let half = window / 2;
    let margin = half + 1;
    if window == 0 || samples.len() <= 2 * margin {
        return filtered;
    }
    let divisor: T = count_as(window);
    for (i, value) in filtered
        .iter_mut()
        .enumerate()
        .take(samples.len() - margin)
        .skip(margin)
    {
        let sum = samples[i - half..i - half + window]
            .iter()
            .fold(T::zero(), |acc, &v| acc + v);
        *value = sum / divisor;
    }
    filtered
}
