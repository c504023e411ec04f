//! # Decorators
//!
//! Post-processing passes over a generated level's tile layers.
//!
//! Generation carves with placeholder tiles. Decorators then swap those for
//! the tiles a level actually shows, and can be chained with an
//! [`AggregateDecorator`].

use crate::{Level, Position, TileId};
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// A pass that rewrites a level's floor and wall layers in place.
pub trait Decorator: fmt::Debug {
    fn decorate_level(&self, level: &mut Level);
}

/// Replaces placeholder tiles with final ones, cell by cell.
///
/// # Examples
///
/// ```
/// use catacomb::{Decorator, Level, Position, ReplacingDecorator, TileId};
///
/// let mut level = Level::new(4, 4, TileId::FLOOR_ROCK, TileId::WALL_NATURAL);
/// ReplacingDecorator::new()
///     .with_ground(TileId::FLOOR_ROCK, TileId::FLOOR_BRICK)
///     .with_wall(TileId::WALL_NATURAL, TileId::WALL_ROCK)
///     .decorate_level(&mut level);
///
/// assert_eq!(level.floor_at(Position::new(2, 2)), Some(TileId::FLOOR_BRICK));
/// assert_eq!(level.wall_at(Position::new(0, 3)), Some(TileId::WALL_ROCK));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacingDecorator {
    pub ground: HashMap<TileId, TileId>,
    pub walls: HashMap<TileId, TileId>,
}

impl ReplacingDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ground(mut self, from: TileId, to: TileId) -> Self {
        self.ground.insert(from, to);
        self
    }

    pub fn with_wall(mut self, from: TileId, to: TileId) -> Self {
        self.walls.insert(from, to);
        self
    }
}

impl Decorator for ReplacingDecorator {
    fn decorate_level(&self, level: &mut Level) {
        let positions: Vec<Position> = level.positions().collect();
        for pos in positions {
            if let Some(tile) = level.floor_at(pos).and_then(|t| self.ground.get(&t)) {
                level.set_floor(pos, *tile);
            }
            if let Some(tile) = level.wall_at(pos).and_then(|t| self.walls.get(&t)) {
                level.set_wall(pos, *tile);
            }
        }
    }
}

/// Gives walls a face wherever they border open space.
///
/// For every interior cell whose wall is the empty marker, each of its eight
/// neighbours whose wall appears in the table is replaced by the mapped
/// tile. Cells are rewritten during the scan, so later cells see earlier
/// replacements.
///
/// # Examples
///
/// ```
/// use catacomb::{Decorator, Level, Position, TileId, WallBuilderDecorator};
///
/// let mut level = Level::new(5, 5, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
/// level.set_wall(Position::new(2, 2), TileId::WALL_EMPTY);
///
/// WallBuilderDecorator::new(TileId::WALL_EMPTY)
///     .with_wall(TileId::WALL_GROUND, TileId::WALL_CONSTRUCTED)
///     .decorate_level(&mut level);
///
/// assert_eq!(level.wall_at(Position::new(1, 1)), Some(TileId::WALL_CONSTRUCTED));
/// assert_eq!(level.wall_at(Position::new(0, 0)), Some(TileId::WALL_GROUND));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallBuilderDecorator {
    pub empty_tile: TileId,
    pub walls: HashMap<TileId, TileId>,
}

impl WallBuilderDecorator {
    pub fn new(empty_tile: TileId) -> Self {
        Self {
            empty_tile,
            walls: HashMap::new(),
        }
    }

    pub fn with_wall(mut self, from: TileId, to: TileId) -> Self {
        self.walls.insert(from, to);
        self
    }
}

impl Decorator for WallBuilderDecorator {
    fn decorate_level(&self, level: &mut Level) {
        let mut built = 0;
        for y in 1..level.height() - 1 {
            for x in 1..level.width() - 1 {
                let pos = Position::new(x, y);
                if level.wall_at(pos) != Some(self.empty_tile) {
                    continue;
                }
                for neighbour in pos.adjacent_positions() {
                    if let Some(tile) = level.wall_at(neighbour).and_then(|t| self.walls.get(&t)) {
                        level.set_wall(neighbour, *tile);
                        built += 1;
                    }
                }
            }
        }
        debug!("Wall builder replaced {} tiles", built);
    }
}

/// Runs child decorators in the order they were added.
#[derive(Debug, Default)]
pub struct AggregateDecorator {
    decorators: Vec<Box<dyn Decorator>>,
}

impl AggregateDecorator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decorator(mut self, decorator: impl Decorator + 'static) -> Self {
        self.add_decorator(Box::new(decorator));
        self
    }

    pub fn add_decorator(&mut self, decorator: Box<dyn Decorator>) {
        self.decorators.push(decorator);
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

impl Decorator for AggregateDecorator {
    fn decorate_level(&self, level: &mut Level) {
        for decorator in &self.decorators {
            decorator.decorate_level(level);
        }
    }
}

/// Standard finish for carved levels: rock floors become brick, walls next to
/// open space become constructed walls, and the rest becomes natural rock.
pub fn standard_decorator() -> AggregateDecorator {
    AggregateDecorator::new()
        .with_decorator(
            WallBuilderDecorator::new(TileId::WALL_EMPTY)
                .with_wall(TileId::WALL_GROUND, TileId::WALL_CONSTRUCTED),
        )
        .with_decorator(
            ReplacingDecorator::new()
                .with_ground(TileId::FLOOR_ROCK, TileId::FLOOR_BRICK)
                .with_wall(TileId::WALL_GROUND, TileId::WALL_ROCK),
        )
}
