//! # Dungeon Generation
//!
//! Wires the generation stages into complete levels and stacks levels into a
//! dungeon.
//!
//! A [`LevelGenerator`] runs the pipeline for one level:
//!
//! 1. partition the grid into sections
//! 2. connect neighbouring sections with a random walk
//! 3. carve a room into every section, with a doorway on each connected side
//! 4. carve a corridor from each doorway to the section's edge connections
//! 5. decorate, then place portals, items and creatures
//! 6. verify that every open cell is reachable
//!
//! A failed attempt is thrown away and the whole level regenerated, up to
//! the configured number of attempts.

use super::utils;
use crate::{
    crystal_skull, partitioner_for, standard_creature_prototypes, standard_decorator,
    standard_item_prototypes, AggregateDecorator, CatacombError, CatacombResult,
    CorridorGenerator, CreatureAdder, Decorator, GameState, GenerationConfig, Generator,
    ItemAdder, Level, LevelId, Partitioner, PortalAdder, PortalLink, RandomConnector,
    RoomGenerator, SquareRoomGenerator, TileId,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// Generates single levels from a fixed set of stages.
///
/// When several partitioners or room generators are registered, one is
/// picked at random for every attempt (rooms: for every section). With none
/// registered, the values from the [`GenerationConfig`] are used.
///
/// # Examples
///
/// ```
/// use catacomb::{GenerationConfig, LevelGenerator};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let config = GenerationConfig::for_testing(5);
/// let generator = LevelGenerator::from_config(&config);
/// let level = generator
///     .generate_level(1, &config, &mut StdRng::seed_from_u64(5))
///     .unwrap();
///
/// assert_eq!(level.id, 1);
/// assert!(level.is_fully_connected());
/// ```
#[derive(Debug, Default)]
pub struct LevelGenerator {
    partitioners: Vec<Box<dyn Partitioner>>,
    room_generators: Vec<Box<dyn RoomGenerator>>,
    decorator: AggregateDecorator,
    item_adders: Vec<ItemAdder>,
    creature_adders: Vec<CreatureAdder>,
    portal_adders: Vec<PortalAdder>,
    size: Option<(u32, u32)>,
    connector: RandomConnector,
}

impl LevelGenerator {
    /// Standard generator: the configured partition policy, square rooms,
    /// the standard decorator and the standard item and creature prototypes
    /// spread over the configured counts.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let items = standard_item_prototypes();
        let creatures = standard_creature_prototypes();
        let item_counts = spread(config.item_count, items.len());
        let creature_counts = spread(config.creature_count, creatures.len());

        LevelConfiguration::new()
            .with_partitioners(vec![partitioner_for(config.partition)])
            .with_rooms(vec![Box::new(SquareRoomGenerator::new(config.min_room_size))])
            .with_decorators(vec![Box::new(standard_decorator())])
            .with_items(
                items
                    .into_iter()
                    .zip(item_counts)
                    .filter(|(_, count)| *count > 0)
                    .map(|(item, count)| ItemAdder::new(item, count))
                    .collect(),
            )
            .with_creatures(
                creatures
                    .into_iter()
                    .zip(creature_counts)
                    .filter(|(_, count)| *count > 0)
                    .map(|(creature, count)| CreatureAdder::new(creature, count))
                    .collect(),
            )
            .build()
    }

    pub fn add_item_adder(&mut self, adder: ItemAdder) {
        self.item_adders.push(adder);
    }

    pub fn add_creature_adder(&mut self, adder: CreatureAdder) {
        self.creature_adders.push(adder);
    }

    pub fn add_portal_adder(&mut self, adder: PortalAdder) {
        self.portal_adders.push(adder);
    }

    /// Generates a level with the given id, retrying failed attempts.
    pub fn generate_level(
        &self,
        id: LevelId,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> CatacombResult<Level> {
        let attempts = config.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.try_generate(id, config, rng) {
                Ok(level) => {
                    info!(
                        "Generated level {} ({}x{}) on attempt {}",
                        id,
                        level.width(),
                        level.height(),
                        attempt
                    );
                    return Ok(level);
                }
                Err(CatacombError::GenerationFailed(reason)) => {
                    warn!(
                        "Level {} attempt {}/{} failed: {}",
                        id, attempt, attempts, reason
                    );
                }
                Err(other) => return Err(other),
            }
        }
        Err(CatacombError::GenerationFailed(format!(
            "Level {} could not be generated in {} attempts",
            id, attempts
        )))
    }

    fn try_generate(
        &self,
        id: LevelId,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> CatacombResult<Level> {
        let (width, height) = self.size.unwrap_or((config.width, config.height));
        let mut level = Level::new(width, height, TileId::FLOOR_ROCK, TileId::WALL_GROUND);
        level.id = id;
        level.name = format!("Depth {}", id + 1);

        let fallback_partitioner;
        let partitioner: &dyn Partitioner = match self.partitioners.choose(rng) {
            Some(partitioner) => partitioner.as_ref(),
            None => {
                fallback_partitioner = partitioner_for(config.partition);
                fallback_partitioner.as_ref()
            }
        };
        let mut sections = partitioner.partition(&level, rng)?;
        self.connector.connect_sections(&mut sections, None, rng)?;

        let fallback_rooms = SquareRoomGenerator::new(config.min_room_size);
        for section in sections.iter_mut() {
            let rooms: &dyn RoomGenerator = match self.room_generators.choose(rng) {
                Some(rooms) => rooms.as_ref(),
                None => &fallback_rooms,
            };
            rooms.generate_room(&mut level, section, rng)?;
        }

        let corridors = CorridorGenerator::new(TileId::WALL_EMPTY);
        for section in sections.iter() {
            for connection in &section.connections {
                let doorway = section.room_connection(connection.direction).ok_or_else(|| {
                    CatacombError::GenerationFailed(format!(
                        "Section {} has no doorway facing {:?}",
                        section.id, connection.direction
                    ))
                })?;
                corridors.carve(&mut level, doorway, connection);
            }
        }
        debug!("Carved corridors for {} sections", sections.len());

        self.decorator.decorate_level(&mut level);

        for adder in &self.portal_adders {
            adder.add_portal(&mut level, rng)?;
        }
        for adder in &self.item_adders {
            adder.add_items(&mut level, rng)?;
        }
        for adder in &self.creature_adders {
            adder.add_creatures(&mut level, rng)?;
        }

        utils::validate_level(&level)?;
        Ok(level)
    }
}

impl Generator<Level> for LevelGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CatacombResult<Level> {
        self.generate_level(0, config, rng)
    }

    fn validate(&self, level: &Level, _config: &GenerationConfig) -> CatacombResult<()> {
        utils::validate_level(level)
    }

    fn generator_type(&self) -> &'static str {
        "LevelGenerator"
    }
}

/// Splits `total` over `parts` as evenly as possible, earlier parts first.
fn spread(total: usize, parts: usize) -> Vec<usize> {
    if parts == 0 {
        return Vec::new();
    }
    (0..parts)
        .map(|i| total / parts + usize::from(i < total % parts))
        .collect()
}

/// Builder for a [`LevelGenerator`].
///
/// # Examples
///
/// ```
/// use catacomb::{GridPartitioner, LevelConfiguration, SquareRoomGenerator};
///
/// let generator = LevelConfiguration::new()
///     .with_partitioners(vec![Box::new(GridPartitioner::new(1, 2))])
///     .with_rooms(vec![Box::new(SquareRoomGenerator::new(3))])
///     .with_level_size(20, 12)
///     .build();
/// # let _ = generator;
/// ```
#[derive(Debug, Default)]
pub struct LevelConfiguration {
    rooms: Vec<Box<dyn RoomGenerator>>,
    partitioners: Vec<Box<dyn Partitioner>>,
    decorators: Vec<Box<dyn Decorator>>,
    items: Vec<ItemAdder>,
    creatures: Vec<CreatureAdder>,
    portals: Vec<PortalAdder>,
    size: Option<(u32, u32)>,
}

impl LevelConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rooms(mut self, rooms: Vec<Box<dyn RoomGenerator>>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_partitioners(mut self, partitioners: Vec<Box<dyn Partitioner>>) -> Self {
        self.partitioners = partitioners;
        self
    }

    /// Decorators run in the given order.
    pub fn with_decorators(mut self, decorators: Vec<Box<dyn Decorator>>) -> Self {
        self.decorators = decorators;
        self
    }

    pub fn with_items(mut self, items: Vec<ItemAdder>) -> Self {
        self.items = items;
        self
    }

    pub fn with_creatures(mut self, creatures: Vec<CreatureAdder>) -> Self {
        self.creatures = creatures;
        self
    }

    pub fn with_portals(mut self, portals: Vec<PortalAdder>) -> Self {
        self.portals = portals;
        self
    }

    /// Overrides the level size from the generation config.
    pub fn with_level_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn build(self) -> LevelGenerator {
        let mut decorator = AggregateDecorator::new();
        for child in self.decorators {
            decorator.add_decorator(child);
        }
        LevelGenerator {
            partitioners: self.partitioners,
            room_generators: self.rooms,
            decorator,
            item_adders: self.items,
            creature_adders: self.creatures,
            portal_adders: self.portals,
            size: self.size,
            connector: RandomConnector::new(),
        }
    }
}

/// Level generators registered under string keys.
#[derive(Debug, Default)]
pub struct LevelGeneratorFactory {
    generators: HashMap<String, LevelGenerator>,
}

impl LevelGeneratorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a generator, replacing any previous one under the same key.
    pub fn add_generator(&mut self, key: &str, generator: LevelGenerator) {
        self.generators.insert(key.to_string(), generator);
    }

    /// Looks up a generator. An unregistered key is a configuration error.
    pub fn get_generator(&self, key: &str) -> CatacombResult<&LevelGenerator> {
        self.generators.get(key).ok_or_else(|| {
            CatacombError::Configuration(format!("No level generator registered for '{}'", key))
        })
    }

    pub fn generate_level(
        &self,
        key: &str,
        id: LevelId,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> CatacombResult<Level> {
        self.get_generator(key)?.generate_level(id, config, rng)
    }
}

/// Generates a stack of levels joined by stairs.
///
/// Level 0 holds the dungeon exit, every level below it has stairs up to
/// the level above, and the deepest level holds the crystal skull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DungeonGenerator {
    pub depth: u32,
}

impl DungeonGenerator {
    pub fn new(depth: u32) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    fn level_generator(&self, id: LevelId, config: &GenerationConfig) -> LevelGenerator {
        let mut generator = LevelGenerator::from_config(config);
        if id == 0 {
            generator.add_portal_adder(PortalAdder::exit());
        } else {
            generator.add_portal_adder(PortalAdder::new(TileId::PORTAL_STAIRS_UP));
        }
        if id + 1 < self.depth {
            generator.add_portal_adder(PortalAdder::new(TileId::PORTAL_STAIRS_DOWN));
        } else {
            generator.add_item_adder(ItemAdder::new(crystal_skull(), 1));
        }
        generator
    }
}

fn find_portal(state: &GameState, level: LevelId, icon: TileId) -> CatacombResult<PortalLink> {
    state
        .level(level)
        .and_then(|l| l.portals().iter().find(|p| p.icon == icon))
        .map(|portal| PortalLink {
            level,
            location: portal.location,
        })
        .ok_or_else(|| {
            CatacombError::GenerationFailed(format!("Level {} is missing portal {}", level, icon))
        })
}

impl Generator<GameState> for DungeonGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CatacombResult<GameState> {
        let mut state = GameState::new();
        for id in 0..self.depth {
            let level = self.level_generator(id, config).generate_level(id, config, rng)?;
            state.add_level(level);
        }
        for id in 1..self.depth {
            let down = find_portal(&state, id - 1, TileId::PORTAL_STAIRS_DOWN)?;
            let up = find_portal(&state, id, TileId::PORTAL_STAIRS_UP)?;
            state.link_portals(down, up)?;
        }
        info!("{} produced {} levels", self.generator_type(), self.depth);
        Ok(state)
    }

    fn validate(&self, state: &GameState, _config: &GenerationConfig) -> CatacombResult<()> {
        if state.levels.len() != self.depth as usize {
            return Err(CatacombError::GenerationFailed(format!(
                "Expected {} levels, found {}",
                self.depth,
                state.levels.len()
            )));
        }
        for level in state.levels.values() {
            utils::validate_level(level)?;
            if let Some(portal) = level
                .portals()
                .iter()
                .find(|p| !p.exits_dungeon && p.other_end.is_none())
            {
                return Err(CatacombError::GenerationFailed(format!(
                    "Portal at {:?} on level {} leads nowhere",
                    portal.location, level.id
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}
