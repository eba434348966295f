//! # grid_planner
//!
//! Global path planning for a mobile robot on a 2D occupancy grid. Implements
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) over the 8-connected cell lattice with
//! hard obstacles and three soft penalty tiers around them, followed by a smoother that collapses
//! the cell path into long line-of-sight segments and rounds off the joints with a moving
//! average. Pre-computes
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! to avoid flood-filling behaviour if no path exists.
//!
//! The entry point is [Planner]: feed it map updates and the robot position, then ask it for
//! paths to goals.
//!
//! ```
//! use grid_planner::{OccupancyGrid, Planner, PlannerConfig, PlannerRequest, Point, WorldPoint};
//!
//! let grid = OccupancyGrid::new(10, 10, 0.05, WorldPoint::default());
//! let config = PlannerConfig::default();
//! let request = PlannerRequest::new(Point::new(0, 0), Point::new(9, 9), config.deadline());
//! let mut planner = Planner::new(grid, config);
//! let path = planner.plan(request).unwrap();
//! assert_eq!(path.first(), Some(&WorldPoint::new(0.0, 0.0)));
//! ```
pub mod astar;
pub mod config;
pub mod error;
pub mod line_tracer;
pub mod occupancy_grid;
pub mod path;
pub mod planner;
pub mod smoother;

pub use grid_util::point::Point;

pub use crate::config::PlannerConfig;
pub use crate::error::{PlannerError, Result};
pub use crate::occupancy_grid::{CellClass, GridUpdate, OccupancyGrid, Tier};
pub use crate::path::{DiscretePath, SmoothedPath, WorldPoint};
pub use crate::planner::{PathSink, PlanFailure, Planner, PlannerRequest};

/// Weight applied to every lattice move length when accumulating path cost.
pub const PATH_LENGTH_WEIGHT: f64 = 0.40;
/// Within this Euclidean distance (in cells) of the goal the search may enter blocked cells.
pub const GOAL_RELAXATION_RADIUS: f64 = 5.0;
/// Window of the moving-average pass over the smoothed path.
pub const SMOOTHING_WINDOW: usize = 18;
/// Points of the short bridging segment used when no shortcut is visible.
pub const FALLBACK_SEGMENT_POINTS: usize = 5;
/// Points emitted per cell traced by a line-of-sight shortcut (at least two per segment).
pub const SEGMENT_POINTS_PER_CELL: usize = 3;
/// The smoother gives up after this many iterations per path cell.
pub const SMOOTHING_ITERATION_FACTOR: usize = 4;
/// Failure code reported to path consumers for every planning failure.
pub const NO_PATH_FOUND: &str = "NO_PATH_FOUND";
