//! # Game Module
//!
//! Core simulation: the level store, characters and items, effects, events,
//! actions and the turn scheduler.
//!
//! This module contains the fundamental building blocks of the turn loop:
//! - Level storage for tiles, creatures, items and portals
//! - Characters, inventories, spell books and items
//! - Timed effects and the rules for dying
//! - The action factory that turns intents into validated state changes
//! - The tick based scheduler that decides who acts next

pub mod actions;
pub mod builders;
pub mod dying;
pub mod effects;
pub mod entities;
pub mod events;
pub mod scheduler;
pub mod state;
pub mod world;

pub use actions::*;
pub use builders::*;
pub use dying::*;
pub use effects::*;
pub use entities::*;
pub use events::*;
pub use scheduler::*;
pub use state::*;
pub use world::*;

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use uuid::Uuid;

/// Cell coordinate on a level. `x` grows east, `y` grows south.
///
/// # Examples
///
/// ```
/// use catacomb::{Direction, Position};
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.step(Direction::North), Position::new(10, 4));
/// assert_eq!(pos.adjacent_positions().len(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Number of orthogonal steps between two cells.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    pub fn euclidean_distance(self, other: Position) -> f64 {
        f64::from(self.x - other.x).hypot(f64::from(self.y - other.y))
    }

    /// Neighbouring cell in `direction`; `Enter` stays put.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// The eight surrounding cells, row by row from the north-west corner.
    pub fn adjacent_positions(self) -> Vec<Position> {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(|(dx, dy)| Position::new(self.x + dx, self.y + dy))
            .collect()
    }

    /// The four cells sharing an edge with this one.
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        [Direction::North, Direction::West, Direction::East, Direction::South]
            .into_iter()
            .map(|direction| self.step(direction))
            .collect()
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Compass directions for movement, attacks and section connections.
///
/// `Enter` points at the character's own cell; moving that way uses a
/// portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
    Enter,
}

impl Direction {
    /// Offset of one step in this direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use catacomb::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(0, -1));
    /// assert_eq!(Direction::Southwest.to_delta(), Position::new(-1, 1));
    /// assert_eq!(Direction::Enter.to_delta(), Position::origin());
    /// ```
    pub fn to_delta(self) -> Position {
        let (dx, dy) = match self {
            Direction::North => (0, -1),
            Direction::Northeast => (1, -1),
            Direction::East => (1, 0),
            Direction::Southeast => (1, 1),
            Direction::South => (0, 1),
            Direction::Southwest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::Northwest => (-1, -1),
            Direction::Enter => (0, 0),
        };
        Position::new(dx, dy)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::Northeast => Direction::Southwest,
            Direction::East => Direction::West,
            Direction::Southeast => Direction::Northwest,
            Direction::South => Direction::North,
            Direction::Southwest => Direction::Northeast,
            Direction::West => Direction::East,
            Direction::Northwest => Direction::Southeast,
            Direction::Enter => Direction::Enter,
        }
    }

    /// East or west.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    /// The eight compass directions, clockwise from north.
    pub fn all() -> Vec<Direction> {
        vec![
            Direction::North,
            Direction::Northeast,
            Direction::East,
            Direction::Southeast,
            Direction::South,
            Direction::Southwest,
            Direction::West,
            Direction::Northwest,
        ]
    }
}

/// Identifier shared by characters, items and portals.
pub type EntityId = Uuid;

/// Identifier of a level within the dungeon.
pub type LevelId = u32;

pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
