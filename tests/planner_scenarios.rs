use grid_planner::astar::SearchContext;
use grid_planner::line_tracer::trace;
use grid_planner::*;
use mockall::mock;
use rstest::rstest;
use std::time::Duration;

mock! {
    Sink {}
    impl PathSink for Sink {
        fn publish_path(&mut self, path: &SmoothedPath);
        fn publish_failure(&mut self, failure: &PlanFailure);
    }
}

fn free_grid(width: usize, height: usize) -> OccupancyGrid {
    OccupancyGrid::new(width, height, 1.0, WorldPoint::default())
}

/// Square ring of hard cells at Chebyshev distance 7 around (10, 10).
fn ring_grid() -> OccupancyGrid {
    let mut grid = free_grid(21, 21);
    grid.set_rect(3, 3, 15, 1, CellClass::HardObstacle);
    grid.set_rect(3, 17, 15, 1, CellClass::HardObstacle);
    grid.set_rect(3, 3, 1, 15, CellClass::HardObstacle);
    grid.set_rect(17, 3, 1, 15, CellClass::HardObstacle);
    grid
}

#[test]
fn diagonal_across_free_grid() {
    let mut planner = Planner::new(free_grid(10, 10), PlannerConfig::default());
    planner.update_start(WorldPoint::new(0.2, 0.7));

    let mut sink = MockSink::new();
    sink.expect_publish_path()
        .times(1)
        .withf(|path: &SmoothedPath| {
            path.first() == Some(&WorldPoint::new(0.0, 0.0))
                && path.last() == Some(&WorldPoint::new(9.0, 9.0))
        })
        .return_const(());
    sink.expect_publish_failure().never();

    let path = planner
        .handle_goal(WorldPoint::new(9.5, 9.5), &mut sink)
        .unwrap();
    assert!((path.length() - 9.0 * 2f64.sqrt()).abs() < 1e-6);

    let mut ct = SearchContext::new();
    let discrete = ct
        .astar(planner.grid(), Point::new(0, 0), Point::new(9, 9), Duration::from_secs(1))
        .unwrap();
    assert_eq!(discrete.len(), 10);
    assert!((discrete.cost - 9.0 * 2f64.sqrt() * PATH_LENGTH_WEIGHT).abs() < 1e-9);
}

#[rstest]
#[case(Point::new(3, 17), Point::new(15, 2))]
#[case(Point::new(10, 10), Point::new(0, 19))]
#[case(Point::new(19, 0), Point::new(0, 7))]
#[case(Point::new(4, 4), Point::new(16, 4))]
fn free_grid_cost_is_weighted_octile_distance(#[case] start: Point, #[case] goal: Point) {
    let grid = free_grid(20, 20);
    let mut ct = SearchContext::new();
    let path = ct
        .astar(&grid, start, goal, Duration::from_secs(1))
        .unwrap();
    let dx = (goal.x - start.x).abs() as f64;
    let dy = (goal.y - start.y).abs() as f64;
    let octile = dx.max(dy) - dx.min(dy) + dx.min(dy) * 2f64.sqrt();
    assert!((path.cost - octile * PATH_LENGTH_WEIGHT).abs() < 1e-9);
    assert_eq!(path.penalty, 0.0);
}

#[test]
fn walled_grid_cost_exceeds_octile_optimum() {
    // Wall at x = 10 with a two-cell gap at the bottom. The Euclidean heuristic pulls the
    // search along the wall and cells are never re-opened, so the detour is not the shortest.
    let mut grid = free_grid(20, 20);
    grid.set_rect(10, 2, 1, 18, CellClass::HardObstacle);
    let mut ct = SearchContext::new();
    let path = ct
        .astar(&grid, Point::new(0, 19), Point::new(19, 19), Duration::from_secs(1))
        .unwrap();

    // Shortest 8-connected route through the gap at (10, 1)
    let optimum = (17.0 + 19.0 * 2f64.sqrt()) * PATH_LENGTH_WEIGHT;
    assert_eq!(path.len(), 45);
    assert!((path.cost - 19.422539674441).abs() < 1e-6);
    assert!(path.cost > optimum + 1.0);
    assert_eq!(path.penalty, 0.0);
}

#[rstest]
#[case(Point::new(9, 5))]
#[case(Point::new(0, 0))]
#[case(Point::new(5, 9))]
fn blocked_start_moves_to_free_neighbour(#[case] goal: Point) {
    let mut grid = free_grid(10, 10);
    let start = Point::new(5, 5);
    grid.set_cell(start, CellClass::HardObstacle);
    let mut planner = Planner::new(grid, PlannerConfig::default());
    let path = planner
        .plan(PlannerRequest::new(start, goal, Duration::from_secs(1)))
        .unwrap();
    let first = *path.first().unwrap();
    let neighbours = [(4.0, 5.0), (6.0, 5.0), (5.0, 4.0), (5.0, 6.0)];
    assert!(neighbours.contains(&(first.x, first.y)));
    assert_eq!(path.last(), Some(&WorldPoint::new(goal.x as f64, goal.y as f64)));
}

#[rstest]
fn enclosed_goal_reports_no_path(#[values(true, false)] reachability_check: bool) {
    let config = PlannerConfig {
        reachability_check,
        ..PlannerConfig::default()
    };
    let mut planner = Planner::new(ring_grid(), config);
    planner.update_start(WorldPoint::new(0.5, 0.5));

    let mut sink = MockSink::new();
    sink.expect_publish_path().never();
    sink.expect_publish_failure()
        .times(1)
        .withf(|failure: &PlanFailure| failure.code == NO_PATH_FOUND)
        .return_const(());

    let error = planner
        .handle_goal(WorldPoint::new(10.5, 10.5), &mut sink)
        .unwrap_err();
    assert!(error.is_no_path_found());
    assert!(!error.is_timeout());
}

#[rstest]
#[case::horizontal(Point::new(0, 5), Point::new(9, 5), 5)]
#[case::vertical(Point::new(5, 0), Point::new(5, 9), 5)]
#[case::diagonal(Point::new(0, 0), Point::new(9, 9), 15)]
#[case::reversed(Point::new(9, 5), Point::new(0, 5), 4)]
fn trace_stops_before_single_blocked_cell(
    #[case] from: Point,
    #[case] to: Point,
    #[case] prefix: usize,
) {
    let mut grid = free_grid(10, 10);
    let blocked = Point::new(5, 5);
    grid.set_cell(blocked, CellClass::SoftTier(Tier::Inflated));
    let traced = trace(&grid, from, to);
    assert!(traced.collision);
    assert_eq!(traced.cells.len(), prefix);
    assert_eq!(traced.cells.first(), Some(&from));
    assert!(!traced.cells.contains(&blocked));
}

#[rstest]
#[case(false)]
#[case(true)]
fn smoothed_path_keeps_endpoints(#[case] moving_average: bool) {
    let mut grid = OccupancyGrid::new(30, 30, 0.05, WorldPoint::new(-0.5, 1.0));
    grid.set_rect(10, 0, 2, 25, CellClass::HardObstacle);
    grid.set_rect(9, 0, 1, 26, CellClass::SoftTier(Tier::Inflated));
    grid.set_rect(12, 0, 1, 26, CellClass::SoftTier(Tier::Inflated));
    grid.set_rect(18, 5, 2, 25, CellClass::SoftTier(Tier::Caution));
    let config = PlannerConfig {
        moving_average,
        ..PlannerConfig::default()
    };
    let start = Point::new(2, 2);
    let goal = Point::new(27, 3);
    let mut planner = Planner::new(grid, config);
    let path = planner
        .plan(PlannerRequest::new(start, goal, Duration::from_secs(1)))
        .unwrap();
    let grid = planner.grid();
    assert_eq!(path.first(), Some(&grid.cell_to_world(start)));
    assert_eq!(path.last(), Some(&grid.cell_to_world(goal)));
    // Going around the wall is longer than the straight line
    let direct = grid.cell_to_world(start).distance(&grid.cell_to_world(goal));
    assert!(path.length() > direct);
}

#[rstest]
#[case(0.05, WorldPoint::new(0.0, 0.0), WorldPoint::new(0.49, 0.26))]
#[case(0.05, WorldPoint::new(-2.5, -1.0), WorldPoint::new(-1.01, 0.0))]
#[case(0.5, WorldPoint::new(1.0, 1.0), WorldPoint::new(4.2, 7.99))]
#[case(1.0, WorldPoint::new(0.0, 0.0), WorldPoint::new(3.0, 3.0))]
fn world_cell_round_trip_within_one_cell(
    #[case] resolution: f64,
    #[case] origin: WorldPoint,
    #[case] world: WorldPoint,
) {
    let grid = OccupancyGrid::new(100, 100, resolution, origin);
    let back = grid.cell_to_world(grid.world_to_cell(world));
    assert!(world.x - back.x >= -1e-9 && world.x - back.x < resolution);
    assert!(world.y - back.y >= -1e-9 && world.y - back.y < resolution);
}

#[test]
fn grid_update_drives_planning() {
    let (width, height) = (16, 6);
    let mut cells = vec![0i8; width * height];
    // Obstacle column with inflation around it, leaving the top row open
    for y in 0..height - 1 {
        cells[4 + y * width] = 100;
        cells[3 + y * width] = -20;
        cells[5 + y * width] = -40;
    }
    let update = GridUpdate {
        width,
        height,
        resolution: 0.1,
        origin_x: 0.0,
        origin_y: 0.0,
        cells,
    };
    let mut planner = Planner::new(free_grid(1, 1), PlannerConfig::default());
    planner.update_grid(update).unwrap();
    let grid = planner.grid();
    assert_eq!(grid.cell(4, 0), Some(CellClass::HardObstacle));
    assert_eq!(grid.cell(3, 2), Some(CellClass::SoftTier(Tier::Inflated)));
    assert_eq!(grid.cell(5, 4), Some(CellClass::SoftTier(Tier::Caution)));
    assert_eq!(grid.cell(4, 5), Some(CellClass::Free));

    let mut ct = SearchContext::new();
    let path = ct
        .astar(grid, Point::new(0, 0), Point::new(15, 0), Duration::from_secs(1))
        .unwrap();
    assert!(path.cells.contains(&Point::new(4, 5)));
    assert!(path.cells.iter().all(|p| !grid.is_hard_obstacle(p.x, p.y)));
}

#[test]
fn failure_serializes_for_transport() {
    let failure = PlanFailure::from(&PlannerError::Timeout(Duration::from_millis(1000)));
    let encoded = toml::to_string(&failure).unwrap();
    assert!(encoded.contains("code = \"NO_PATH_FOUND\""));
    assert!(encoded.contains("timed out"));
}
