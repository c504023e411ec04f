//! # Rooms
//!
//! Carving rooms into partitioned sections.

use crate::{
    CatacombError, CatacombResult, Connection, Direction, Level, Position, Rect, Section, TileId,
};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt;

/// Places a room inside a section.
pub trait RoomGenerator: fmt::Debug {
    /// Carves a room into `section` and records a doorway on every side
    /// that has a connection to a neighbour.
    fn generate_room(
        &self,
        level: &mut Level,
        section: &mut Section,
        rng: &mut StdRng,
    ) -> CatacombResult<()>;
}

/// Square room of random size, kept one cell away from the section border.
///
/// # Examples
///
/// ```
/// use catacomb::{Level, Position, Rect, RoomGenerator, Section, SquareRoomGenerator, TileId};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut level = Level::new(12, 12, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
/// let mut section = Section::new(0, Rect::from_corners(Position::new(0, 0), Position::new(11, 11)));
///
/// SquareRoomGenerator::new(3)
///     .generate_room(&mut level, &mut section, &mut StdRng::seed_from_u64(8))
///     .unwrap();
/// let room = section.room.unwrap();
/// assert!(room.width() >= 3 && room.width() <= 10);
/// assert!(!level.blocks_movement(room.center()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareRoomGenerator {
    pub min_size: u32,
    /// Floor tile laid inside the room
    pub floor_tile: TileId,
    /// Wall tile marking the room as open
    pub empty_tile: TileId,
}

impl SquareRoomGenerator {
    pub fn new(min_size: u32) -> Self {
        Self {
            min_size: min_size.max(1),
            floor_tile: TileId::FLOOR_ROCK,
            empty_tile: TileId::WALL_EMPTY,
        }
    }
}

impl RoomGenerator for SquareRoomGenerator {
    fn generate_room(
        &self,
        level: &mut Level,
        section: &mut Section,
        rng: &mut StdRng,
    ) -> CatacombResult<()> {
        let bounds = section.bounds;
        let max_size = (bounds.width() - 2).min(bounds.height() - 2);
        if max_size < 1 {
            return Err(CatacombError::GenerationFailed(format!(
                "Section {} is too small for a room",
                section.id
            )));
        }
        let min_size = (self.min_size as i32).min(max_size);
        let size = rng.gen_range(min_size..=max_size);

        let left = rng.gen_range(bounds.left + 1..=bounds.right - size);
        let top = rng.gen_range(bounds.top + 1..=bounds.bottom - size);
        let room = Rect {
            left,
            top,
            right: left + size - 1,
            bottom: top + size - 1,
        };
        for pos in room.positions() {
            level.set_floor(pos, self.floor_tile);
            level.set_wall(pos, self.empty_tile);
        }

        let center = room.center();
        let mut directions: Vec<Direction> = Vec::new();
        for connection in &section.connections {
            if !directions.contains(&connection.direction) {
                directions.push(connection.direction);
            }
        }
        section.room_connections = directions
            .into_iter()
            .map(|direction| {
                let location = match direction {
                    Direction::East => Position::new(room.right, center.y),
                    Direction::West => Position::new(room.left, center.y),
                    Direction::North => Position::new(center.x, room.top),
                    _ => Position::new(center.x, room.bottom),
                };
                Connection {
                    location,
                    direction,
                    section: section.id,
                    other: None,
                }
            })
            .collect();
        section.room = Some(room);
        debug!("Section {} room {:?}", section.id, room);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_room_stays_inside_border() {
        let bounds = Rect::from_corners(Position::new(10, 5), Position::new(19, 14));
        for seed in 0..50 {
            let mut level = Level::new(30, 30, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
            let mut section = Section::new(0, bounds);
            SquareRoomGenerator::new(3)
                .generate_room(&mut level, &mut section, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            let room = section.room.unwrap();
            assert!(room.left > bounds.left && room.right < bounds.right);
            assert!(room.top > bounds.top && room.bottom < bounds.bottom);
        }
    }

    #[test]
    fn test_doorways_face_connections() {
        let mut level = Level::new(20, 10, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
        let mut section = Section::new(0, Rect::from_corners(Position::new(0, 0), Position::new(9, 9)));
        section.connections.push(Connection {
            location: Position::new(9, 4),
            direction: Direction::East,
            section: 0,
            other: Some(1),
        });
        SquareRoomGenerator::new(3)
            .generate_room(&mut level, &mut section, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(section.room_connections.len(), 1);
        let doorway = section.room_connection(Direction::East).unwrap();
        assert_eq!(doorway.location.x, section.room.unwrap().right);
        assert!(section.room_connection(Direction::West).is_none());
    }

    #[test]
    fn test_tiny_section_fails() {
        let mut level = Level::new(5, 5, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
        let mut section = Section::new(0, Rect::from_corners(Position::new(0, 0), Position::new(1, 4)));
        let result = SquareRoomGenerator::new(3).generate_room(
            &mut level,
            &mut section,
            &mut StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(CatacombError::GenerationFailed(_))));
    }
}
