use grid_planner::*;
use std::path::Path;

// Plans through a small maze of walls with inflation rings:
//  - # marks a hard obstacle
//  - x, + and - mark the lethal, inflated and caution tiers
//
// Run with `RUST_LOG=debug cargo run --example plan_maze [config.toml]` to see the planner logs.

fn wall(grid: &mut OccupancyGrid, x: i32, y: i32, width: i32, height: i32) {
    grid.set_rect(x - 3, y - 3, width + 6, height + 6, CellClass::SoftTier(Tier::Caution));
    grid.set_rect(x - 2, y - 2, width + 4, height + 4, CellClass::SoftTier(Tier::Inflated));
    grid.set_rect(x - 1, y - 1, width + 2, height + 2, CellClass::SoftTier(Tier::Lethal));
    grid.set_rect(x, y, width, height, CellClass::HardObstacle);
}

fn main() -> Result<()> {
    env_logger::init();
    let config = match std::env::args().nth(1) {
        Some(path) => PlannerConfig::load(Path::new(&path))?,
        None => PlannerConfig::default(),
    };

    let mut grid = OccupancyGrid::new(48, 32, 0.05, WorldPoint::new(-1.2, -0.8));
    wall(&mut grid, 12, 0, 2, 22);
    wall(&mut grid, 28, 10, 2, 22);
    wall(&mut grid, 36, 8, 12, 2);
    println!("{}", grid);

    let mut planner = Planner::new(grid, config);
    planner.update_start(WorldPoint::new(-1.1, -0.7));
    let path = planner.plan_to(WorldPoint::new(1.1, -0.7))?;
    println!("Smoothed path ({} points, {:.2} m):", path.len(), path.length());
    for p in &path.points {
        println!("{:.3} {:.3}", p.x, p.y);
    }
    Ok(())
}
