use core::fmt;

use grid_util::point::Point;
use log::{debug, info};
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::path::{euclidean_distance, WorldPoint};

/// Occupancy code of an obstacle cell.
pub const CODE_OCCUPIED: i8 = 100;
/// Alternate obstacle code, used for the innermost inflation ring.
pub const CODE_LETHAL: i8 = -2;
pub const CODE_INFLATED: i8 = -20;
pub const CODE_CAUTION: i8 = -40;

pub const LETHAL_TIER_MULTIPLIER: f64 = 2.5;
pub const INFLATED_TIER_MULTIPLIER: f64 = 1.7;
pub const CAUTION_TIER_MULTIPLIER: f64 = 1.2;

/// Soft penalty tiers, ordered from the one closest to an obstacle outwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Blocks the search (outside the goal relaxation radius) and the smoother.
    Lethal,
    /// Traversable by the search at a cost, blocks the smoother.
    Inflated,
    /// Outermost ring, penalised like [Inflated](Tier::Inflated) at a lower rate.
    Caution,
}

impl Tier {
    pub const fn multiplier(self) -> f64 {
        match self {
            Tier::Lethal => LETHAL_TIER_MULTIPLIER,
            Tier::Inflated => INFLATED_TIER_MULTIPLIER,
            Tier::Caution => CAUTION_TIER_MULTIPLIER,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellClass {
    #[default]
    Free,
    HardObstacle,
    SoftTier(Tier),
}

impl CellClass {
    pub const fn from_code(code: i8) -> CellClass {
        match code {
            CODE_OCCUPIED => CellClass::HardObstacle,
            CODE_LETHAL => CellClass::SoftTier(Tier::Lethal),
            CODE_INFLATED => CellClass::SoftTier(Tier::Inflated),
            CODE_CAUTION => CellClass::SoftTier(Tier::Caution),
            _ => CellClass::Free,
        }
    }

    /// Impassable for the search.
    pub const fn blocks_search(self) -> bool {
        matches!(
            self,
            CellClass::HardObstacle | CellClass::SoftTier(Tier::Lethal)
        )
    }

    /// Impassable for straight-line shortcuts: hard obstacles and every soft tier. A superset of
    /// [blocks_search](Self::blocks_search).
    pub const fn blocks_shortcut(self) -> bool {
        matches!(self, CellClass::HardObstacle | CellClass::SoftTier(_))
    }

    fn symbol(self) -> char {
        match self {
            CellClass::Free => '.',
            CellClass::HardObstacle => '#',
            CellClass::SoftTier(Tier::Lethal) => 'x',
            CellClass::SoftTier(Tier::Inflated) => '+',
            CellClass::SoftTier(Tier::Caution) => '-',
        }
    }
}

/// A map update as received from the mapping side: row-major occupancy codes plus metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridUpdate {
    pub width: usize,
    pub height: usize,
    pub resolution: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub cells: Vec<i8>,
}

/// [OccupancyGrid] holds the classified cells of the latest map together with a [UnionFind]
/// structure over the cells the search may enter. The components allow rejecting unreachable
/// goals without flood-filling the whole map.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    resolution: f64,
    origin: WorldPoint,
    cells: Vec<CellClass>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl OccupancyGrid {
    /// Creates an all-free grid. Components are generated and clean.
    ///
    /// `resolution` must be finite and positive; [from_update](Self::from_update) validates it for
    /// grids received from outside.
    pub fn new(width: usize, height: usize, resolution: f64, origin: WorldPoint) -> OccupancyGrid {
        debug_assert!(
            resolution.is_finite() && resolution > 0.0,
            "resolution must be finite and positive, got {resolution}"
        );
        let mut grid = OccupancyGrid {
            width,
            height,
            resolution,
            origin,
            cells: vec![CellClass::Free; width * height],
            components: UnionFind::new(width * height),
            components_dirty: false,
        };
        grid.generate_components();
        grid
    }

    /// Validates and classifies a map update.
    pub fn from_update(update: GridUpdate) -> Result<OccupancyGrid> {
        let GridUpdate {
            width,
            height,
            resolution,
            origin_x,
            origin_y,
            cells,
        } = update;
        if width == 0 || height == 0 {
            return Err(PlannerError::InvalidGrid(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        if cells.len() != width * height {
            return Err(PlannerError::InvalidGrid(format!(
                "expected {} cells for a {width}x{height} grid, got {}",
                width * height,
                cells.len()
            )));
        }
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(PlannerError::InvalidGrid(format!(
                "resolution must be finite and positive, got {resolution}"
            )));
        }
        if !origin_x.is_finite() || !origin_y.is_finite() {
            return Err(PlannerError::InvalidGrid(
                "origin must be finite".to_string(),
            ));
        }
        let mut grid = OccupancyGrid {
            width,
            height,
            resolution,
            origin: WorldPoint::new(origin_x, origin_y),
            cells: cells.into_iter().map(CellClass::from_code).collect(),
            components: UnionFind::new(width * height),
            components_dirty: true,
        };
        grid.generate_components();
        info!(
            "Received {}x{} grid at {} m/cell",
            width, height, resolution
        );
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn resolution(&self) -> f64 {
        self.resolution
    }
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    pub fn is_in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }
    pub fn point_in_bounds(&self, point: Point) -> bool {
        self.is_in_bounds(point.x, point.y)
    }

    fn ix(&self, x: i32, y: i32) -> usize {
        x as usize + y as usize * self.width
    }

    /// The class of a cell, or [None] outside the grid.
    pub fn cell(&self, x: i32, y: i32) -> Option<CellClass> {
        if self.is_in_bounds(x, y) {
            Some(self.cells[self.ix(x, y)])
        } else {
            None
        }
    }

    /// Overwrites a cell. Blocking a cell may split components, so they are flagged as dirty;
    /// freeing one joins it with its neighbours right away.
    pub fn set_cell(&mut self, point: Point, class: CellClass) {
        if !self.point_in_bounds(point) {
            return;
        }
        let ix = self.ix(point.x, point.y);
        if class.blocks_search() {
            if !self.cells[ix].blocks_search() {
                self.components_dirty = true;
            }
        } else {
            for n in moore_neighborhood(point) {
                if self.point_in_bounds(n) && !self.is_hard_obstacle(n.x, n.y) {
                    let n_ix = self.ix(n.x, n.y);
                    self.components.union(ix, n_ix);
                }
            }
        }
        self.cells[ix] = class;
    }

    /// Sets every cell of the axis-aligned rectangle with corner `(x, y)` and the given size.
    pub fn set_rect(&mut self, x: i32, y: i32, width: i32, height: i32, class: CellClass) {
        for cx in x..x + width {
            for cy in y..y + height {
                self.set_cell(Point::new(cx, cy), class);
            }
        }
    }

    /// True for cells the search must not enter. Out-of-bounds cells are not reported as
    /// obstacles; callers check bounds separately.
    pub fn is_hard_obstacle(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(CellClass::blocks_search)
    }

    /// The stricter predicate used when tracing shortcuts: hard obstacles plus all soft tiers.
    pub fn is_inflated_obstacle(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(CellClass::blocks_shortcut)
    }

    /// Extra cost for entering the cell with a move of cost `move_cost`.
    pub fn tier_penalty(&self, x: i32, y: i32, move_cost: f64) -> f64 {
        match self.cell(x, y) {
            Some(CellClass::SoftTier(tier)) => tier.multiplier() * move_cost,
            _ => 0.0,
        }
    }

    pub fn world_to_cell(&self, world: WorldPoint) -> Point {
        let x = ((world.x - self.origin.x) / self.resolution).floor();
        let y = ((world.y - self.origin.y) / self.resolution).floor();
        Point::new(x as i32, y as i32)
    }

    pub fn cell_to_world(&self, cell: Point) -> WorldPoint {
        WorldPoint::new(
            cell.x as f64 * self.resolution + self.origin.x,
            cell.y as f64 * self.resolution + self.origin.y,
        )
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up passable 8-neighbours.
    pub fn generate_components(&mut self) {
        debug!("Generating connected components");
        let (w, h) = (self.width as i32, self.height as i32);
        self.components = UnionFind::new(self.width * self.height);
        self.components_dirty = false;
        for x in 0..w {
            for y in 0..h {
                if self.is_hard_obstacle(x, y) {
                    continue;
                }
                let ix = self.ix(x, y);
                // The remaining four directions are covered from the other side.
                for (nx, ny) in [(x, y + 1), (x + 1, y - 1), (x + 1, y), (x + 1, y + 1)] {
                    if self.is_in_bounds(nx, ny) && !self.is_hard_obstacle(nx, ny) {
                        let n_ix = self.ix(nx, ny);
                        self.components.union(ix, n_ix);
                    }
                }
            }
        }
    }

    /// Checks whether a search rooted at `from`, which may enter blocked cells only within
    /// `radius` of `center`, can reach any cell of that disk. The clipped disk is 8-connected,
    /// so reaching one of its cells is enough to reach `center`.
    ///
    /// Requires clean components; see [update](Self::update).
    pub fn region_reachable(&self, from: Point, center: Point, radius: f64) -> bool {
        if !self.point_in_bounds(from) || !self.point_in_bounds(center) {
            return false;
        }
        if euclidean_distance(&from, &center) <= radius {
            return true;
        }
        if self.is_hard_obstacle(from.x, from.y) {
            // Not part of any component; only its neighbours are. Stay conservative.
            return true;
        }
        let from_ix = self.ix(from.x, from.y);
        let joined = |p: Point| {
            self.point_in_bounds(p)
                && !self.is_hard_obstacle(p.x, p.y)
                && self.components.equiv(from_ix, self.ix(p.x, p.y))
        };
        let r = radius.floor() as i32;
        for x in center.x - r..=center.x + r {
            for y in center.y - r..=center.y + r {
                let p = Point::new(x, y);
                if !self.point_in_bounds(p) || euclidean_distance(&p, &center) > radius {
                    continue;
                }
                if joined(p) || moore_neighborhood(p).into_iter().any(joined) {
                    return true;
                }
            }
        }
        false
    }
}

/// The 8 neighbours of a cell, in no particular order.
fn moore_neighborhood(p: Point) -> [Point; 8] {
    [
        Point::new(p.x - 1, p.y - 1),
        Point::new(p.x, p.y - 1),
        Point::new(p.x + 1, p.y - 1),
        Point::new(p.x - 1, p.y),
        Point::new(p.x + 1, p.y),
        Point::new(p.x - 1, p.y + 1),
        Point::new(p.x, p.y + 1),
        Point::new(p.x + 1, p.y + 1),
    ]
}

impl fmt::Display for OccupancyGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in (0..self.height as i32).rev() {
            let row = (0..self.width as i32)
                .map(|x| self.cells[self.ix(x, y)].symbol())
                .collect::<String>();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
