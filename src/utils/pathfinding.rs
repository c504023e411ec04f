//! # Pathfinding Algorithms
//!
//! Line tracing and flood-fill reachability used by connectivity checks,
//! projectiles and area spells.

use crate::Position;
use pathfinding::prelude::bfs_reach;
use std::collections::HashSet;

/// Collects every position 4-connected to `start` through passable cells.
///
/// `start` itself is always part of the result.
///
/// # Examples
///
/// ```
/// use catacomb::{reachable_positions, Position};
///
/// // A 3-wide horizontal strip
/// let reach = reachable_positions(Position::new(0, 0), |p| p.y == 0 && (0..3).contains(&p.x));
/// assert_eq!(reach.len(), 3);
/// ```
pub fn reachable_positions<F>(start: Position, passable: F) -> HashSet<Position>
where
    F: Fn(Position) -> bool,
{
    bfs_reach(start, |pos: &Position| {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|next| passable(*next))
            .collect::<Vec<_>>()
    })
    .collect()
}

/// Positions on the straight line from `start` to `end`, both included.
///
/// Uses Bresenham's algorithm, so consecutive positions may be diagonal
/// neighbours.
pub fn line_between(start: Position, end: Position) -> Vec<Position> {
    let mut points = Vec::new();
    let dx = (end.x - start.x).abs();
    let dy = -(end.y - start.y).abs();
    let step_x = if start.x < end.x { 1 } else { -1 };
    let step_y = if start.y < end.y { 1 } else { -1 };
    let mut error = dx + dy;
    let mut current = start;

    loop {
        points.push(current);
        if current == end {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            current.x += step_x;
        }
        if doubled <= dx {
            error += dx;
            current.y += step_y;
        }
    }

    points
}

/// Checks whether nothing between `from` and `to` blocks sight.
///
/// The end points themselves are not tested, so a wall can be seen.
pub fn has_line_of_sight<F>(from: Position, to: Position, blocks: F) -> bool
where
    F: Fn(Position) -> bool,
{
    let line = line_between(from, to);
    if line.len() <= 2 {
        return true;
    }
    line[1..line.len() - 1].iter().all(|pos| !blocks(*pos))
}
