//! # Corridors
//!
//! Carves passages between two connection points.

use crate::{Connection, Level, Position, TileId};
use log::debug;

/// Carves straight or L-shaped corridors into the wall layer.
///
/// A corridor leaving horizontally runs along its own row to the end point's
/// column before turning; one leaving vertically runs along its own column
/// first. Every carved cell shares an edge with the next one.
///
/// # Examples
///
/// ```
/// use catacomb::{Connection, CorridorGenerator, Direction, Level, Position, TileId};
///
/// let mut level = Level::new(10, 10, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
/// let start = Connection { location: Position::new(1, 1), direction: Direction::East, section: 0, other: None };
/// let end = Connection { location: Position::new(6, 4), direction: Direction::West, section: 1, other: None };
///
/// CorridorGenerator::new(TileId::WALL_EMPTY).carve(&mut level, &start, &end);
/// assert!(!level.blocks_movement(Position::new(6, 1)));
/// assert!(!level.blocks_movement(Position::new(6, 4)));
/// assert!(level.blocks_movement(Position::new(1, 4)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorridorGenerator {
    /// Wall tile written along the corridor
    pub tile: TileId,
}

impl CorridorGenerator {
    pub fn new(tile: TileId) -> Self {
        Self { tile }
    }

    /// Carves a corridor from `start` to `end`.
    pub fn carve(&self, level: &mut Level, start: &Connection, end: &Connection) {
        for pos in Self::path(start, end) {
            level.set_wall(pos, self.tile);
        }
    }

    /// Cells a corridor between the two connections occupies, in order from
    /// start to end.
    pub fn path(start: &Connection, end: &Connection) -> Vec<Position> {
        let (from, to) = (start.location, end.location);
        if from == to {
            return Vec::new();
        }
        if from.x == to.x || from.y == to.y {
            return straight(from, to);
        }

        let bend = if start.direction.is_horizontal() {
            Position::new(to.x, from.y)
        } else {
            Position::new(from.x, to.y)
        };
        debug!("Corridor {:?} -> {:?} bends at {:?}", from, to, bend);
        let mut path = straight(from, bend);
        path.extend(straight(bend, to).into_iter().skip(1));
        path
    }
}

/// Cells of an axis-aligned line, both ends included.
fn straight(from: Position, to: Position) -> Vec<Position> {
    let step = Position::new((to.x - from.x).signum(), (to.y - from.y).signum());
    let mut cells = vec![from];
    let mut current = from;
    while current != to {
        current = current + step;
        cells.push(current);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;
    use proptest::prelude::*;

    fn connection(x: i32, y: i32, direction: Direction) -> Connection {
        Connection {
            location: Position::new(x, y),
            direction,
            section: 0,
            other: None,
        }
    }

    fn solid() -> Level {
        Level::new(30, 30, TileId::FLOOR_ROCK, TileId::WALL_GROUND)
    }

    #[test]
    fn test_straight_corridor() {
        let mut level = solid();
        let start = connection(2, 5, Direction::East);
        let end = connection(9, 5, Direction::West);
        CorridorGenerator::new(TileId::WALL_EMPTY).carve(&mut level, &start, &end);

        for x in 2..=9 {
            assert!(!level.blocks_movement(Position::new(x, 5)));
        }
        assert!(level.blocks_movement(Position::new(10, 5)));
        assert!(level.blocks_movement(Position::new(5, 4)));
    }

    #[test]
    fn test_vertical_start_bends_at_end_row() {
        let start = connection(3, 3, Direction::South);
        let end = connection(8, 10, Direction::North);
        let path = CorridorGenerator::path(&start, &end);

        assert!(path.contains(&Position::new(3, 10)));
        assert!(!path.contains(&Position::new(8, 3)));
        assert_eq!(path.len(), 8 + 5);
    }

    #[test]
    fn test_identical_endpoints_carve_nothing() {
        let mut level = solid();
        let point = connection(4, 4, Direction::North);
        CorridorGenerator::new(TileId::WALL_EMPTY).carve(&mut level, &point, &point);
        assert!(level.blocks_movement(Position::new(4, 4)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn corridor_is_four_connected_and_passable(
            sx in 0i32..30, sy in 0i32..30, ex in 0i32..30, ey in 0i32..30,
            horizontal in any::<bool>(),
        ) {
            prop_assume!((sx, sy) != (ex, ey));
            let direction = if horizontal { Direction::East } else { Direction::South };
            let start = connection(sx, sy, direction);
            let end = connection(ex, ey, direction.opposite());
            let mut level = solid();
            CorridorGenerator::new(TileId::WALL_EMPTY).carve(&mut level, &start, &end);

            let path = CorridorGenerator::path(&start, &end);
            prop_assert_eq!(path.first(), Some(&start.location));
            prop_assert_eq!(path.last(), Some(&end.location));
            for pair in path.windows(2) {
                prop_assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
            }
            for pos in &path {
                prop_assert_eq!(level.wall_at(*pos), Some(TileId::WALL_EMPTY));
            }
        }
    }
}
