//! A* over the 8-connected lattice of an [OccupancyGrid].
//!
//! The node pool is an [IndexMap] keyed by cell: the map index of a cell is its arena index and
//! parents are stored as indices, so the path is rebuilt by following indices back to the root.
//! Membership in the map doubles as the open/closed test.
use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use crate::error::{PlannerError, Result};
use crate::occupancy_grid::OccupancyGrid;
use crate::path::{euclidean_distance, move_length, DiscretePath};
use crate::{GOAL_RELAXATION_RADIUS, PATH_LENGTH_WEIGHT};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Expansion order of the lattice moves. Start relocation scans rings in the same order.
pub const MOVES: [(i32, i32); 8] = [
    (-1, 0),
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 1),
    (1, 1),
    (1, -1),
    (-1, -1),
];

struct SmallestCostHolder {
    estimated_cost: f64,
    index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lowest estimated cost first. Every cell is pushed exactly once, so the arena index is
        // the insertion order and equal costs pop first-in first-out.
        match other.estimated_cost.total_cmp(&self.estimated_cost) {
            Ordering::Equal => other.index.cmp(&self.index),
            s => s,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    parent: Option<usize>,
    /// Weighted path length so far.
    g: f64,
    /// Accumulated soft-tier penalty.
    w: f64,
    /// Euclidean distance to the goal.
    h: f64,
}

impl SearchNode {
    fn f(&self) -> f64 {
        self.g + self.h + self.w
    }
}

/// Reusable search state. Its contents only describe the most recent call and are cleared at
/// the start of every search; keeping the context around just saves the allocations.
pub struct SearchContext {
    to_see: BinaryHeap<SmallestCostHolder>,
    nodes: FxIndexMap<Point, SearchNode>,
    /// Skip the search when the goal is not in the root's connected region.
    pub reachability_check: bool,
}

impl Default for SearchContext {
    fn default() -> Self {
        SearchContext::new()
    }
}

impl SearchContext {
    pub fn new() -> SearchContext {
        SearchContext {
            to_see: BinaryHeap::new(),
            nodes: FxIndexMap::default(),
            reachability_check: true,
        }
    }

    fn clear(&mut self) {
        self.to_see.clear();
        self.nodes.clear();
    }

    /// Finds a path from `start` to `goal`, giving up once `deadline` has elapsed.
    ///
    /// An occupied start is first moved to the nearest free cell (see [nearest_free_cell]); an
    /// occupied goal is kept as is. Blocked cells may be entered within
    /// [GOAL_RELAXATION_RADIUS] of the goal.
    pub fn astar(
        &mut self,
        grid: &OccupancyGrid,
        start: Point,
        goal: Point,
        deadline: Duration,
    ) -> Result<DiscretePath> {
        let invoked = Instant::now();
        self.clear();
        for cell in [start, goal] {
            if !grid.point_in_bounds(cell) {
                return Err(PlannerError::OutOfBounds {
                    cell,
                    width: grid.width(),
                    height: grid.height(),
                });
            }
        }

        let root = if grid.is_hard_obstacle(start.x, start.y) {
            match nearest_free_cell(grid, start) {
                Some(cell) => {
                    warn!("Start {:?} is occupied, searching from {:?}", start, cell);
                    cell
                }
                None => {
                    warn!("Start {:?} is occupied and no free cell exists", start);
                    return Err(PlannerError::Exhausted { goal });
                }
            }
        } else {
            start
        };

        if self.reachability_check
            && !grid.components_dirty
            && !grid.region_reachable(root, goal, GOAL_RELAXATION_RADIUS)
        {
            debug!("{:?} is not reachable from {:?}", goal, root);
            return Err(PlannerError::Exhausted { goal });
        }

        let h = euclidean_distance(&root, &goal);
        self.nodes.insert(
            root,
            SearchNode {
                parent: None,
                g: 0.0,
                w: 0.0,
                h,
            },
        );
        self.to_see.push(SmallestCostHolder {
            estimated_cost: h,
            index: 0,
        });

        let mut expanded = 0;
        while let Some(SmallestCostHolder { index, .. }) = self.to_see.pop() {
            let Some((&pos, &node)) = self.nodes.get_index(index) else {
                continue;
            };
            expanded += 1;
            if pos == goal {
                debug!(
                    "Reached {:?} after {} expansions in {:?}",
                    goal,
                    expanded,
                    invoked.elapsed()
                );
                return Ok(DiscretePath {
                    cells: self.reverse_path(index),
                    cost: node.g,
                    penalty: node.w,
                    expanded,
                });
            }
            if invoked.elapsed() > deadline {
                warn!(
                    "Search for {:?} timed out after {} expansions",
                    goal, expanded
                );
                return Err(PlannerError::Timeout(deadline));
            }

            for (dx, dy) in MOVES {
                let child = Point::new(pos.x + dx, pos.y + dy);
                if !grid.point_in_bounds(child) {
                    continue;
                }
                if grid.is_hard_obstacle(child.x, child.y)
                    && euclidean_distance(&child, &goal) > GOAL_RELAXATION_RADIUS
                {
                    continue;
                }
                match self.nodes.entry(child) {
                    // Closed, or already queued. A queued node keeps the cost and parent it was
                    // discovered with even if a cheaper route shows up later; lowering it here
                    // would change which paths come out of the search.
                    Occupied(_) => continue,
                    Vacant(e) => {
                        let step = move_length(&pos, &child) * PATH_LENGTH_WEIGHT;
                        let successor = SearchNode {
                            parent: Some(index),
                            g: node.g + step,
                            w: node.w + grid.tier_penalty(child.x, child.y, step),
                            h: euclidean_distance(&child, &goal),
                        };
                        let n = e.index();
                        e.insert(successor);
                        self.to_see.push(SmallestCostHolder {
                            estimated_cost: successor.f(),
                            index: n,
                        });
                    }
                }
            }
        }
        warn!(
            "Open set exhausted after {} expansions without reaching {:?}",
            expanded, goal
        );
        Err(PlannerError::Exhausted { goal })
    }

    fn reverse_path(&self, goal_index: usize) -> Vec<Point> {
        let mut path: Vec<Point> = std::iter::successors(Some(goal_index), |&i| {
            self.nodes.get_index(i).and_then(|(_, node)| node.parent)
        })
        .filter_map(|i| self.nodes.get_index(i).map(|(p, _)| *p))
        .collect();
        path.reverse();
        path
    }
}

/// Scans growing rings around `start`, testing at radius `r` the eight cells `start + r * m`
/// for every move `m`, and returns the first in-bounds cell the search may enter.
pub fn nearest_free_cell(grid: &OccupancyGrid, start: Point) -> Option<Point> {
    let max_radius = grid.width().max(grid.height()) as i32;
    (1..=max_radius)
        .flat_map(|r| {
            MOVES
                .iter()
                .map(move |&(dx, dy)| Point::new(start.x + r * dx, start.y + r * dy))
        })
        .find(|p| grid.point_in_bounds(*p) && !grid.is_hard_obstacle(p.x, p.y))
}
