//! # Level Partitioning
//!
//! Splits a level into disjoint rectangular sections that cover the whole
//! grid, and records which sections share an edge.
//!
//! Sections live in a [`SectionArena`] and refer to each other by index, so
//! neighbour and connection links never form ownership cycles.

use crate::{CatacombError, CatacombResult, Direction, Level, PartitionPolicy, Position};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt;

/// Index of a section inside its arena.
pub type SectionId = usize;

/// Axis-aligned rectangle with inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from two opposite corners.
    ///
    /// # Examples
    ///
    /// ```
    /// use catacomb::{Position, Rect};
    ///
    /// let rect = Rect::from_corners(Position::new(5, 2), Position::new(1, 4));
    /// assert_eq!(rect.width(), 5);
    /// assert_eq!(rect.height(), 3);
    /// assert!(rect.contains(Position::new(3, 3)));
    /// ```
    pub fn from_corners(a: Position, b: Position) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    pub fn area(&self) -> i32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Position {
        Position::new((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.left && pos.x <= self.right && pos.y >= self.top && pos.y <= self.bottom
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let (left, right) = (self.left, self.right);
        (self.top..=self.bottom).flat_map(move |y| (left..=right).map(move |x| Position::new(x, y)))
    }

    /// Side of `self` that touches `other`, if the two share an edge.
    pub fn shared_side(&self, other: &Rect) -> Option<Direction> {
        let rows_overlap = self.top <= other.bottom && other.top <= self.bottom;
        let cols_overlap = self.left <= other.right && other.left <= self.right;
        if rows_overlap && self.right + 1 == other.left {
            Some(Direction::East)
        } else if rows_overlap && other.right + 1 == self.left {
            Some(Direction::West)
        } else if cols_overlap && self.bottom + 1 == other.top {
            Some(Direction::South)
        } else if cols_overlap && other.bottom + 1 == self.top {
            Some(Direction::North)
        } else {
            None
        }
    }
}

/// A point where a corridor enters or leaves a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub location: Position,
    /// Direction the corridor leaves in
    pub direction: Direction,
    /// Section the connection belongs to
    pub section: SectionId,
    /// Section at the other end, once paired
    pub other: Option<SectionId>,
}

/// Rectangular part of a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub bounds: Rect,
    pub neighbours: Vec<SectionId>,
    /// Paired connections on the section border
    pub connections: Vec<Connection>,
    /// Room doorways waiting for a corridor
    pub room_connections: Vec<Connection>,
    /// Carved room, if any
    pub room: Option<Rect>,
}

impl Section {
    pub fn new(id: SectionId, bounds: Rect) -> Self {
        Self {
            id,
            bounds,
            neighbours: Vec::new(),
            connections: Vec::new(),
            room_connections: Vec::new(),
            room: None,
        }
    }

    pub fn is_connected_to(&self, other: SectionId) -> bool {
        self.connections.iter().any(|c| c.other == Some(other))
    }

    /// Finds the room doorway facing `direction`.
    pub fn room_connection(&self, direction: Direction) -> Option<&Connection> {
        self.room_connections
            .iter()
            .find(|c| c.direction == direction)
    }
}

/// Owner of every section produced for a level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionArena {
    sections: Vec<Section>,
}

impl SectionArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a section and returns its id.
    pub fn add(&mut self, bounds: Rect) -> SectionId {
        let id = self.sections.len();
        self.sections.push(Section::new(id, bounds));
        id
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn get_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    /// Marks every pair of sections sharing an edge as neighbours.
    pub fn mark_neighbours(&mut self) {
        for section in &mut self.sections {
            section.neighbours.clear();
        }
        for a in 0..self.sections.len() {
            for b in (a + 1)..self.sections.len() {
                if self.sections[a]
                    .bounds
                    .shared_side(&self.sections[b].bounds)
                    .is_some()
                {
                    self.sections[a].neighbours.push(b);
                    self.sections[b].neighbours.push(a);
                }
            }
        }
    }

    /// Pairs two neighbouring sections with a connection on each side of
    /// their shared edge.
    ///
    /// The two connection points are orthogonally adjacent, picked at random
    /// along the overlap of the edge.
    pub fn connect(&mut self, a: SectionId, b: SectionId, rng: &mut StdRng) -> CatacombResult<()> {
        let (first, second) = match (self.get(a), self.get(b)) {
            (Some(first), Some(second)) => (first.bounds, second.bounds),
            _ => {
                return Err(CatacombError::GenerationFailed(format!(
                    "Cannot connect missing sections {} and {}",
                    a, b
                )))
            }
        };
        let side = first.shared_side(&second).ok_or_else(|| {
            CatacombError::GenerationFailed(format!("Sections {} and {} do not touch", a, b))
        })?;

        let (here, there) = match side {
            Direction::East | Direction::West => {
                let y = rng.gen_range(first.top.max(second.top)..=first.bottom.min(second.bottom));
                let (x, other_x) = if side == Direction::East {
                    (first.right, second.left)
                } else {
                    (first.left, second.right)
                };
                (Position::new(x, y), Position::new(other_x, y))
            }
            _ => {
                let x = rng.gen_range(first.left.max(second.left)..=first.right.min(second.right));
                let (y, other_y) = if side == Direction::South {
                    (first.bottom, second.top)
                } else {
                    (first.top, second.bottom)
                };
                (Position::new(x, y), Position::new(x, other_y))
            }
        };
        debug!("Connecting section {} {:?} to section {} {:?}", a, here, b, there);

        self.sections[a].connections.push(Connection {
            location: here,
            direction: side,
            section: a,
            other: Some(b),
        });
        self.sections[b].connections.push(Connection {
            location: there,
            direction: side.opposite(),
            section: b,
            other: Some(a),
        });
        Ok(())
    }
}

impl fmt::Display for SectionArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(
                f,
                "#{} ({},{})-({},{}) neighbours {:?}",
                section.id,
                section.bounds.left,
                section.bounds.top,
                section.bounds.right,
                section.bounds.bottom,
                section.neighbours
            )?;
        }
        Ok(())
    }
}

/// Strategy for dividing a level into sections.
pub trait Partitioner: fmt::Debug {
    /// Splits the level's area into sections with neighbours marked.
    fn partition(&self, level: &Level, rng: &mut StdRng) -> CatacombResult<SectionArena>;
}

/// Builds the partitioner for a configured policy.
pub fn partitioner_for(policy: PartitionPolicy) -> Box<dyn Partitioner> {
    match policy {
        PartitionPolicy::Grid { rows, cols } => Box::new(GridPartitioner::new(rows, cols)),
        PartitionPolicy::Bsp {
            min_width,
            min_height,
        } => Box::new(BspPartitioner::new(min_width, min_height)),
    }
}

/// Divides the level into a uniform `rows × cols` grid.
///
/// Left-over columns and rows go to the first sections, so sizes differ by
/// at most one.
///
/// # Examples
///
/// ```
/// use catacomb::{GridPartitioner, Level, Partitioner, TileId};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let level = Level::new(10, 10, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
/// let sections = GridPartitioner::new(2, 2)
///     .partition(&level, &mut StdRng::seed_from_u64(1))
///     .unwrap();
/// assert_eq!(sections.len(), 4);
/// assert!(sections.iter().all(|s| s.neighbours.len() == 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPartitioner {
    pub rows: u32,
    pub cols: u32,
}

impl GridPartitioner {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    fn spans(total: i32, parts: i32) -> Vec<(i32, i32)> {
        let base = total / parts;
        let extra = total % parts;
        let mut start = 0;
        (0..parts)
            .map(|i| {
                let size = base + i32::from(i < extra);
                let span = (start, start + size - 1);
                start += size;
                span
            })
            .collect()
    }
}

impl Partitioner for GridPartitioner {
    fn partition(&self, level: &Level, _rng: &mut StdRng) -> CatacombResult<SectionArena> {
        let (rows, cols) = (self.rows as i32, self.cols as i32);
        if rows == 0 || cols == 0 || rows > level.height() || cols > level.width() {
            return Err(CatacombError::GenerationFailed(format!(
                "Cannot split a {}x{} level into {}x{} sections",
                level.width(),
                level.height(),
                rows,
                cols
            )));
        }

        let mut arena = SectionArena::new();
        for (top, bottom) in Self::spans(level.height(), rows) {
            for (left, right) in Self::spans(level.width(), cols) {
                arena.add(Rect {
                    left,
                    top,
                    right,
                    bottom,
                });
            }
        }
        arena.mark_neighbours();
        debug!("Grid partition produced {} sections", arena.len());
        Ok(arena)
    }
}

/// Recursively halves the level at random points until pieces would become
/// smaller than the minimum size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BspPartitioner {
    pub min_width: u32,
    pub min_height: u32,
}

impl BspPartitioner {
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width: min_width.max(1),
            min_height: min_height.max(1),
        }
    }
}

impl Partitioner for BspPartitioner {
    fn partition(&self, level: &Level, rng: &mut StdRng) -> CatacombResult<SectionArena> {
        if level.width() <= 0 || level.height() <= 0 {
            return Err(CatacombError::GenerationFailed(
                "Cannot partition an empty level".to_string(),
            ));
        }
        let (min_w, min_h) = (self.min_width as i32, self.min_height as i32);
        let mut arena = SectionArena::new();
        let mut work = vec![Rect {
            left: 0,
            top: 0,
            right: level.width() - 1,
            bottom: level.height() - 1,
        }];

        while let Some(rect) = work.pop() {
            let can_split_x = rect.width() >= 2 * min_w;
            let can_split_y = rect.height() >= 2 * min_h;
            let split_x = match (can_split_x, can_split_y) {
                (false, false) => {
                    arena.add(rect);
                    continue;
                }
                (true, false) => true,
                (false, true) => false,
                (true, true) => rng.gen_bool(0.5),
            };

            if split_x {
                let cut = rng.gen_range(rect.left + min_w..=rect.right + 1 - min_w);
                work.push(Rect {
                    right: cut - 1,
                    ..rect
                });
                work.push(Rect { left: cut, ..rect });
            } else {
                let cut = rng.gen_range(rect.top + min_h..=rect.bottom + 1 - min_h);
                work.push(Rect {
                    bottom: cut - 1,
                    ..rect
                });
                work.push(Rect { top: cut, ..rect });
            }
        }

        arena.mark_neighbours();
        debug!("BSP partition produced {} sections", arena.len());
        Ok(arena)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileId;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn level(width: u32, height: u32) -> Level {
        Level::new(width, height, TileId::FLOOR_ROCK, TileId::WALL_GROUND)
    }

    fn assert_exact_cover(arena: &SectionArena, level: &Level) {
        let mut seen = HashSet::new();
        for section in arena.iter() {
            for pos in section.bounds.positions() {
                assert!(level.in_bounds(pos), "{:?} outside level", pos);
                assert!(seen.insert(pos), "{:?} covered twice", pos);
            }
        }
        assert_eq!(seen.len(), (level.width() * level.height()) as usize);
    }

    #[test]
    fn test_grid_partition_covers_level() {
        let level = level(80, 30);
        let arena = GridPartitioner::new(3, 4)
            .partition(&level, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(arena.len(), 12);
        assert_exact_cover(&arena, &level);

        // Corner, edge and centre sections
        assert_eq!(arena.get(0).unwrap().neighbours.len(), 2);
        assert_eq!(arena.get(1).unwrap().neighbours.len(), 3);
        assert_eq!(arena.get(5).unwrap().neighbours.len(), 4);
    }

    #[test]
    fn test_grid_spreads_remainder() {
        let level = level(10, 3);
        let arena = GridPartitioner::new(1, 3)
            .partition(&level, &mut StdRng::seed_from_u64(0))
            .unwrap();
        let widths: Vec<i32> = arena.iter().map(|s| s.bounds.width()).collect();
        assert_eq!(widths, vec![4, 3, 3]);
    }

    #[test]
    fn test_zero_sections_is_failure() {
        let level = level(10, 10);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            GridPartitioner::new(0, 3).partition(&level, &mut rng),
            Err(CatacombError::GenerationFailed(_))
        ));
        assert!(GridPartitioner::new(1, 11).partition(&level, &mut rng).is_err());
        assert!(BspPartitioner::new(4, 4)
            .partition(&self::level(0, 0), &mut rng)
            .is_err());
    }

    #[test]
    fn test_neighbours_are_symmetric() {
        let level = level(60, 40);
        let arena = BspPartitioner::new(8, 6)
            .partition(&level, &mut StdRng::seed_from_u64(77))
            .unwrap();
        for section in arena.iter() {
            for neighbour in &section.neighbours {
                assert!(arena
                    .get(*neighbour)
                    .unwrap()
                    .neighbours
                    .contains(&section.id));
            }
        }
    }

    #[test]
    fn test_connect_places_adjacent_points() {
        let level = level(20, 10);
        let mut rng = StdRng::seed_from_u64(4);
        let mut arena = GridPartitioner::new(1, 2).partition(&level, &mut rng).unwrap();
        arena.connect(0, 1, &mut rng).unwrap();

        let left = arena.get(0).unwrap().connections[0];
        let right = arena.get(1).unwrap().connections[0];
        assert_eq!(left.direction, Direction::East);
        assert_eq!(right.direction, Direction::West);
        assert_eq!(left.location.manhattan_distance(right.location), 1);
        assert!(arena.get(0).unwrap().is_connected_to(1));
    }

    #[test]
    fn test_connect_rejects_distant_sections() {
        let level = level(30, 10);
        let mut rng = StdRng::seed_from_u64(4);
        let mut arena = GridPartitioner::new(1, 3).partition(&level, &mut rng).unwrap();
        assert!(arena.connect(0, 2, &mut rng).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn bsp_sections_cover_level_and_respect_minimum(
            seed in any::<u64>(),
            width in 10u32..90,
            height in 8u32..50,
        ) {
            let level = level(width, height);
            let arena = BspPartitioner::new(5, 4)
                .partition(&level, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            let covered: i32 = arena.iter().map(|s| s.bounds.area()).sum();
            prop_assert_eq!(covered, level.width() * level.height());
            for section in arena.iter() {
                prop_assert!(section.bounds.width() >= 5);
                prop_assert!(section.bounds.height() >= 4);
            }
            assert_exact_cover(&arena, &level);
        }
    }
}
