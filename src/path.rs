//! Path representations handed between the search, the smoother and path consumers.

use grid_util::point::Point;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::PATH_LENGTH_WEIGHT;

/// A point in world (map frame) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> WorldPoint {
        WorldPoint { x, y }
    }

    pub fn distance(&self, other: &WorldPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Length of a single lattice move: 1 for cardinal moves, √2 for diagonal ones.
pub fn move_length(from: &Point, to: &Point) -> f64 {
    let dx = (to.x - from.x) as f64;
    let dy = (to.y - from.y) as f64;
    dx.hypot(dy)
}

/// Straight-line distance between two cells, in cells.
pub fn euclidean_distance(p1: &Point, p2: &Point) -> f64 {
    move_length(p1, p2)
}

/// The raw search result: cells from start to goal, plus the costs of the goal node.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscretePath {
    pub cells: Vec<Point>,
    /// Weighted path length `g` of the goal node.
    pub cost: f64,
    /// Accumulated soft-tier penalty `w` of the goal node.
    pub penalty: f64,
    /// Nodes popped from the open set before the goal was reached.
    pub expanded: usize,
}

impl DiscretePath {
    pub fn start(&self) -> Option<&Point> {
        self.cells.first()
    }

    pub fn goal(&self) -> Option<&Point> {
        self.cells.last()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Unweighted lattice length of the path in cells.
    pub fn length(&self) -> f64 {
        self.cells
            .iter()
            .tuple_windows()
            .map(|(a, b)| move_length(a, b))
            .sum()
    }

    /// Recomputes the weighted path cost from the cells, which matches [cost](Self::cost) for
    /// paths produced by the search.
    pub fn weighted_length(&self) -> f64 {
        self.length() * PATH_LENGTH_WEIGHT
    }
}

/// The smoothed path in world coordinates, as delivered to path consumers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPath {
    pub points: Vec<WorldPoint>,
}

impl SmoothedPath {
    pub fn new(points: Vec<WorldPoint>) -> SmoothedPath {
        SmoothedPath { points }
    }

    pub fn first(&self) -> Option<&WorldPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&WorldPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total polyline length in world units.
    pub fn length(&self) -> f64 {
        self.points
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.distance(b))
            .sum()
    }
}
