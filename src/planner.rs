use std::sync::Arc;
use std::time::{Duration, Instant};

use grid_util::point::Point;
use log::{info, warn};
use serde::Serialize;

use crate::astar::SearchContext;
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::occupancy_grid::{GridUpdate, OccupancyGrid};
use crate::path::{SmoothedPath, WorldPoint};
use crate::smoother::PathSmoother;

/// A single planning request in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannerRequest {
    pub start: Point,
    pub goal: Point,
    pub deadline: Duration,
}

impl PlannerRequest {
    pub fn new(start: Point, goal: Point, deadline: Duration) -> PlannerRequest {
        PlannerRequest {
            start,
            goal,
            deadline,
        }
    }
}

/// Failure notification delivered to a [PathSink].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlanFailure {
    pub code: &'static str,
    pub reason: String,
}

impl From<&PlannerError> for PlanFailure {
    fn from(error: &PlannerError) -> Self {
        PlanFailure {
            code: error.failure_code(),
            reason: error.to_string(),
        }
    }
}

/// Consumer of planning results, e.g. a path follower or a message publisher.
pub trait PathSink {
    fn publish_path(&mut self, path: &SmoothedPath);
    fn publish_failure(&mut self, failure: &PlanFailure);
}

/// Owns the current map, the robot's last known cell and the reusable search state.
///
/// Map updates swap the grid out as a whole. A planning call clones the [Arc] of the grid it
/// starts with, so a map that arrives later never changes a search in progress.
pub struct Planner {
    grid: Arc<OccupancyGrid>,
    start: Option<Point>,
    config: PlannerConfig,
    context: SearchContext,
}

impl Planner {
    pub fn new(mut grid: OccupancyGrid, config: PlannerConfig) -> Planner {
        grid.update();
        Planner {
            grid: Arc::new(grid),
            start: None,
            config,
            context: SearchContext::new(),
        }
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The robot cell set by the last [update_start](Self::update_start).
    pub fn start(&self) -> Option<Point> {
        self.start
    }

    /// Replaces the map. On error the previous map stays in place.
    pub fn update_grid(&mut self, update: GridUpdate) -> Result<()> {
        let grid = OccupancyGrid::from_update(update)?;
        self.grid = Arc::new(grid);
        Ok(())
    }

    pub fn set_grid(&mut self, mut grid: OccupancyGrid) {
        grid.update();
        self.grid = Arc::new(grid);
    }

    /// Records the robot position, converted to a cell of the current map.
    pub fn update_start(&mut self, position: WorldPoint) {
        self.start = Some(self.grid.world_to_cell(position));
    }

    pub fn plan(&mut self, request: PlannerRequest) -> Result<SmoothedPath> {
        let invoked = Instant::now();
        let grid = Arc::clone(&self.grid);
        self.context.reachability_check = self.config.reachability_check;
        let path = self
            .context
            .astar(&grid, request.start, request.goal, request.deadline)?;

        let mut smoother = PathSmoother::new(&grid);
        smoother.moving_average = self.config.moving_average;
        let smoothed = smoother.smooth(&path);
        info!(
            "Planned {:?} -> {:?}: {} cells, cost {:.3}, penalty {:.3}, {} points in {:?}",
            path.start(),
            path.goal(),
            path.len(),
            path.cost,
            path.penalty,
            smoothed.len(),
            invoked.elapsed()
        );
        Ok(smoothed)
    }

    /// Plans from the recorded start to `goal` with the configured deadline.
    pub fn plan_to(&mut self, goal: WorldPoint) -> Result<SmoothedPath> {
        let start = self.start.ok_or(PlannerError::StartUnknown)?;
        let goal = self.grid.world_to_cell(goal);
        self.plan(PlannerRequest::new(start, goal, self.config.deadline()))
    }

    /// Plans to `goal` and reports the outcome to `sink`.
    pub fn handle_goal<S: PathSink + ?Sized>(
        &mut self,
        goal: WorldPoint,
        sink: &mut S,
    ) -> Result<SmoothedPath> {
        let result = self.plan_to(goal);
        match &result {
            Ok(path) => sink.publish_path(path),
            Err(e) => {
                warn!("Planning to {:?} failed: {}", goal, e);
                sink.publish_failure(&PlanFailure::from(e));
            }
        }
        result
    }
}
