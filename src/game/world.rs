//! # Level Store
//!
//! Tile grids, creature and item placement, and portals for a single level.
//!
//! A level stores two layers of tile codes per cell: a floor and a wall.
//! A cell whose wall is [`TileId::WALL_EMPTY`] can be walked through.
//! Generation writes both layers, and during play only actions mutate the
//! creature, item and portal stores.

use crate::{
    reachable_positions, CatacombError, CatacombResult, Character, EntityId, Item, LevelId,
    Position,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Numeric tile code stored in the floor and wall layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u16);

impl TileId {
    pub const FLOOR_EMPTY: TileId = TileId(0);
    pub const FLOOR_ROCK: TileId = TileId(1);
    pub const FLOOR_BRICK: TileId = TileId(2);

    /// Marks a passable cell in the wall layer
    pub const WALL_EMPTY: TileId = TileId(100);
    /// Solid ground that has not been carved yet
    pub const WALL_GROUND: TileId = TileId(101);
    pub const WALL_ROCK: TileId = TileId(102);
    pub const WALL_ROCK_DECO_1: TileId = TileId(103);
    pub const WALL_ROCK_DECO_2: TileId = TileId(104);
    /// Placeholder for natural walls, replaced by decorators
    pub const WALL_NATURAL: TileId = TileId(105);
    /// Placeholder for constructed walls, replaced by decorators
    pub const WALL_CONSTRUCTED: TileId = TileId(106);

    pub const PORTAL_STAIRS_DOWN: TileId = TileId(200);
    pub const PORTAL_STAIRS_UP: TileId = TileId(201);
    pub const PORTAL_EXIT: TileId = TileId(202);

    /// ASCII glyph used by text front ends.
    pub fn glyph(self) -> char {
        match self {
            TileId::WALL_EMPTY => '.',
            TileId::WALL_GROUND => ' ',
            TileId::PORTAL_STAIRS_DOWN => '>',
            TileId::PORTAL_STAIRS_UP => '<',
            TileId::PORTAL_EXIT => '^',
            TileId(code) if (100..200).contains(&code) => '#',
            _ => '.',
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

/// Destination of a portal on another level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalLink {
    pub level: LevelId,
    pub location: Position,
}

/// Connection between levels, or the way out of the dungeon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub id: EntityId,
    pub location: Position,
    pub icon: TileId,
    /// Paired end; `None` until linked
    pub other_end: Option<PortalLink>,
    /// Using this portal leaves the dungeon
    pub exits_dungeon: bool,
}

impl Portal {
    /// Creates an unlinked portal.
    pub fn new(icon: TileId) -> Self {
        Self {
            id: crate::new_entity_id(),
            location: Position::origin(),
            icon,
            other_end: None,
            exits_dungeon: false,
        }
    }

    /// Creates the portal that leads out of the dungeon.
    pub fn exit() -> Self {
        Self {
            exits_dungeon: true,
            ..Self::new(TileId::PORTAL_EXIT)
        }
    }
}

/// A single level of the dungeon.
///
/// # Examples
///
/// ```
/// use catacomb::{Level, Position, TileId};
///
/// let mut level = Level::new(10, 10, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
/// assert!(level.blocks_movement(Position::new(3, 3)));
///
/// level.set_wall(Position::new(3, 3), TileId::WALL_EMPTY);
/// assert!(!level.blocks_movement(Position::new(3, 3)));
/// assert!(level.blocks_movement(Position::new(-1, 3)));
/// ```
#[derive(Debug, Clone)]
pub struct Level {
    /// Identifier within the dungeon
    pub id: LevelId,
    /// Human readable name
    pub name: String,
    width: i32,
    height: i32,
    floor: Vec<TileId>,
    walls: Vec<TileId>,
    /// Creatures in scheduling order
    creatures: Vec<Character>,
    creature_index: HashMap<Position, EntityId>,
    items: Vec<Item>,
    portals: Vec<Portal>,
}

impl Level {
    /// Creates a level filled with the given floor and wall tiles.
    pub fn new(width: u32, height: u32, floor_tile: TileId, wall_tile: TileId) -> Self {
        let cells = (width * height) as usize;
        Self {
            id: 0,
            name: String::new(),
            width: width as i32,
            height: height as i32,
            floor: vec![floor_tile; cells],
            walls: vec![wall_tile; cells],
            creatures: Vec::new(),
            creature_index: HashMap::new(),
            items: Vec::new(),
            portals: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Checks if a position lies on the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    /// All grid positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    pub fn floor_at(&self, pos: Position) -> Option<TileId> {
        self.index(pos).map(|i| self.floor[i])
    }

    pub fn wall_at(&self, pos: Position) -> Option<TileId> {
        self.index(pos).map(|i| self.walls[i])
    }

    /// Sets the floor tile; positions off the grid are ignored.
    pub fn set_floor(&mut self, pos: Position, tile: TileId) {
        if let Some(i) = self.index(pos) {
            self.floor[i] = tile;
        }
    }

    /// Sets the wall tile; positions off the grid are ignored.
    pub fn set_wall(&mut self, pos: Position, tile: TileId) {
        if let Some(i) = self.index(pos) {
            self.walls[i] = tile;
        }
    }

    /// Out of bounds cells and cells with any wall block movement.
    pub fn blocks_movement(&self, pos: Position) -> bool {
        !matches!(self.wall_at(pos), Some(TileId::WALL_EMPTY))
    }

    /// Passable and not occupied by a creature.
    pub fn is_free(&self, pos: Position) -> bool {
        !self.blocks_movement(pos) && !self.creature_index.contains_key(&pos)
    }

    /// Picks a random passable, unoccupied cell.
    pub fn find_free_space(&self, rng: &mut StdRng) -> Option<Position> {
        let candidates: Vec<Position> = self.positions().filter(|p| self.is_free(*p)).collect();
        candidates.choose(rng).copied()
    }

    /// Checks that every passable cell can be reached from every other one
    /// using orthogonal steps.
    pub fn is_fully_connected(&self) -> bool {
        let passable: Vec<Position> = self
            .positions()
            .filter(|p| !self.blocks_movement(*p))
            .collect();
        match passable.first() {
            None => true,
            Some(start) => {
                let reach = reachable_positions(*start, |p| !self.blocks_movement(p));
                reach.len() == passable.len()
            }
        }
    }

    // Creatures

    /// Places a creature on the level.
    ///
    /// Fails if the location is blocked or already occupied.
    pub fn add_creature(
        &mut self,
        mut character: Character,
        location: Position,
    ) -> CatacombResult<EntityId> {
        if self.blocks_movement(location) {
            return Err(CatacombError::InvalidState(format!(
                "Cannot place {} inside a wall at {:?}",
                character.name, location
            )));
        }
        if self.creature_index.contains_key(&location) {
            return Err(CatacombError::InvalidState(format!(
                "Location {:?} is already occupied",
                location
            )));
        }
        let id = character.id;
        character.location = location;
        character.level = Some(self.id);
        self.creature_index.insert(location, id);
        self.creatures.push(character);
        Ok(id)
    }

    /// Takes a creature off the level.
    pub fn remove_creature(&mut self, id: EntityId) -> Option<Character> {
        let index = self.creatures.iter().position(|c| c.id == id)?;
        let mut character = self.creatures.remove(index);
        self.creature_index.remove(&character.location);
        character.level = None;
        Some(character)
    }

    /// Moves a creature to another free cell.
    pub fn move_creature(&mut self, id: EntityId, to: Position) -> CatacombResult<()> {
        if !self.is_free(to) {
            return Err(CatacombError::InvalidState(format!(
                "Location {:?} is not free",
                to
            )));
        }
        let character = self
            .creatures
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(CatacombError::UnknownEntity(id))?;
        self.creature_index.remove(&character.location);
        character.location = to;
        self.creature_index.insert(to, id);
        Ok(())
    }

    pub fn creatures(&self) -> &[Character] {
        &self.creatures
    }

    /// Mutable access to all creatures. Locations must not be changed
    /// through this; use [`Level::move_creature`].
    pub fn creatures_mut(&mut self) -> &mut [Character] {
        &mut self.creatures
    }

    pub fn creature(&self, id: EntityId) -> Option<&Character> {
        self.creatures.iter().find(|c| c.id == id)
    }

    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.creatures.iter_mut().find(|c| c.id == id)
    }

    pub fn creature_at(&self, pos: Position) -> Option<&Character> {
        let id = self.creature_index.get(&pos)?;
        self.creature(*id)
    }

    pub fn creature_id_at(&self, pos: Position) -> Option<EntityId> {
        self.creature_index.get(&pos).copied()
    }

    // Items

    /// Puts an item on the floor.
    pub fn add_item(&mut self, mut item: Item, location: Position) {
        item.location = Some(location);
        item.level = Some(self.id);
        self.items.push(item);
    }

    /// Lifts an item off the floor.
    pub fn remove_item(&mut self, id: EntityId) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == id)?;
        let mut item = self.items.remove(index);
        item.location = None;
        item.level = None;
        Some(item)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn items_at(&self, pos: Position) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| i.location == Some(pos))
            .collect()
    }

    // Portals

    /// Places a portal, optionally already linked to its other end.
    pub fn add_portal(
        &mut self,
        mut portal: Portal,
        location: Position,
        other_end: Option<PortalLink>,
    ) -> EntityId {
        portal.location = location;
        if other_end.is_some() {
            portal.other_end = other_end;
        }
        let id = portal.id;
        self.portals.push(portal);
        id
    }

    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    pub fn portal_at(&self, pos: Position) -> Option<&Portal> {
        self.portals.iter().find(|p| p.location == pos)
    }

    pub fn portal_at_mut(&mut self, pos: Position) -> Option<&mut Portal> {
        self.portals.iter_mut().find(|p| p.location == pos)
    }

    /// Renders the wall layer with portals, items and creatures on top.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                let glyph = if let Some(creature) = self.creature_at(pos) {
                    creature.icon
                } else if let Some(portal) = self.portal_at(pos) {
                    portal.icon.glyph()
                } else if let Some(item) = self.items_at(pos).first() {
                    item.icon
                } else {
                    self.wall_at(pos).map(TileId::glyph).unwrap_or(' ')
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}
