//! Integer line rasterization between two cells with early exit on the first blocked cell.

use grid_util::point::Point;

use crate::occupancy_grid::OccupancyGrid;

/// The cells visited by a trace. On collision, `cells` holds the prefix before the blocking
/// cell; the blocking cell itself is never included.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineTrace {
    pub cells: Vec<Point>,
    pub collision: bool,
}

/// Traces the segment `from -> to` against the shortcut predicate of the grid. Cells outside
/// the grid count as blocked.
pub fn trace(grid: &OccupancyGrid, from: Point, to: Point) -> LineTrace {
    trace_with(from, to, |p| {
        !grid.point_in_bounds(p) || grid.is_inflated_obstacle(p.x, p.y)
    })
}

/// Walks the half-open segment `[from, to)` with an error accumulator, taking `|dx| + |dy|`
/// unit steps along one axis at a time. When the accumulator is exactly zero the corner cell
/// `(x + x_inc, y)` is checked and recorded before stepping in y, so a diagonal only passes
/// when both cells around each corner are free.
pub fn trace_with<F>(from: Point, to: Point, mut blocked: F) -> LineTrace
where
    F: FnMut(Point) -> bool,
{
    let mut dx = (to.x - from.x).abs();
    let mut dy = (to.y - from.y).abs();
    let n = dx + dy;
    let x_inc = if to.x > from.x { 1 } else { -1 };
    let y_inc = if to.y > from.y { 1 } else { -1 };
    let mut error = dx - dy;
    dx *= 2;
    dy *= 2;

    let (mut x, mut y) = (from.x, from.y);
    let mut cells = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let current = Point::new(x, y);
        if blocked(current) {
            return LineTrace {
                cells,
                collision: true,
            };
        }
        cells.push(current);

        if error > 0 {
            x += x_inc;
            error -= dy;
        } else {
            if error == 0 {
                let corner = Point::new(x + x_inc, y);
                if blocked(corner) {
                    return LineTrace {
                        cells,
                        collision: true,
                    };
                }
                cells.push(corner);
            }
            y += y_inc;
            error += dx;
        }
    }
    LineTrace {
        cells,
        collision: false,
    }
}
