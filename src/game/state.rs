//! # Game State Module
//!
//! Central game state shared by actions, effects and the scheduler.
//!
//! The game state owns every level (and through them every creature and
//! item), knows which character is the player, and is the single place where
//! events are raised. Raised events are delivered to the creatures on the
//! level they happened on, to every registered listener, and to the
//! statistics.

use crate::{
    config, CatacombError, CatacombResult, Character, EntityId, EventListener, GameEvent, Level,
    LevelId, PortalLink,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Item that turns an escape into a victory.
pub const VICTORY_ITEM: &str = "crystal skull";

/// Statistics about the current game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Creatures other than the player that died
    pub creatures_killed: u32,
    /// Number of times the player has died
    pub deaths: u32,
    /// Total damage dealt by attacks
    pub damage_dealt: u64,
    /// Items picked up by anyone
    pub items_collected: u32,
    /// Total steps taken
    pub steps_taken: u64,
    /// Spells cast by anyone
    pub spells_cast: u32,
    /// Portal transitions
    pub levels_visited: u32,
}

impl GameStatistics {
    /// Creates new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent, player_id: Option<EntityId>) {
        match event {
            GameEvent::Move { .. } => {
                self.steps_taken += 1;
            }
            GameEvent::AttackHit { damage, .. } => {
                self.damage_dealt += (*damage).max(0) as u64;
            }
            GameEvent::Death { character, .. } => {
                if Some(*character) == player_id {
                    self.deaths += 1;
                } else {
                    self.creatures_killed += 1;
                }
            }
            GameEvent::PickUp { .. } => {
                self.items_collected += 1;
            }
            GameEvent::SpellCast { .. } => {
                self.spells_cast += 1;
            }
            GameEvent::PortalEntered { .. } => {
                self.levels_visited += 1;
            }
            _ => {}
        }
    }
}

/// Game completion state for handling endings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    /// Game is still in progress
    #[default]
    Playing,
    /// Player left the dungeon
    Escaped,
    /// Player left the dungeon carrying the crystal skull
    Victory,
    /// Player died
    PlayerDied,
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Dead,
    Escaped,
    Victory,
    Quit,
}

/// Central game state containing all levels and the event plumbing.
#[derive(Debug, Default)]
pub struct GameState {
    /// Every level in the dungeon, by id
    pub levels: BTreeMap<LevelId, Level>,
    /// The player character
    pub player_id: Option<EntityId>,
    /// Current game completion state
    pub completion_state: GameCompletionState,
    /// Scheduler rounds elapsed
    pub turn_number: u64,
    /// Game statistics for player progress
    pub statistics: GameStatistics,
    /// Most recent events, oldest first; capped at [`config::EVENT_LOG_SIZE`]
    pub event_log: VecDeque<GameEvent>,
    listeners: Vec<Box<dyn EventListener>>,
}

impl GameState {
    /// Creates an empty game state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a game state holding a single level.
    pub fn with_level(level: Level) -> Self {
        let mut state = Self::new();
        state.add_level(level);
        state
    }

    /// Adds a level under its own id, replacing any level with that id.
    pub fn add_level(&mut self, level: Level) -> LevelId {
        let id = level.id;
        self.levels.insert(id, level);
        id
    }

    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(&id)
    }

    pub fn level_mut(&mut self, id: LevelId) -> Option<&mut Level> {
        self.levels.get_mut(&id)
    }

    /// Level lookup that reports a missing level as an error.
    pub fn require_level_mut(&mut self, id: LevelId) -> CatacombResult<&mut Level> {
        self.levels
            .get_mut(&id)
            .ok_or_else(|| CatacombError::InvalidState(format!("Level {} does not exist", id)))
    }

    pub fn set_player(&mut self, id: EntityId) {
        self.player_id = Some(id);
    }

    pub fn is_player(&self, id: EntityId) -> bool {
        self.player_id == Some(id)
    }

    pub fn player(&self) -> Option<&Character> {
        self.player_id.and_then(|id| self.character(id))
    }

    /// Level the character is currently on.
    pub fn locate_character(&self, id: EntityId) -> Option<LevelId> {
        self.levels
            .iter()
            .find(|(_, level)| level.creature(id).is_some())
            .map(|(level_id, _)| *level_id)
    }

    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.levels.values().find_map(|level| level.creature(id))
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.levels
            .values_mut()
            .find_map(|level| level.creature_mut(id))
    }

    /// Character lookup that reports a missing character as an error.
    pub fn require_character_mut(&mut self, id: EntityId) -> CatacombResult<&mut Character> {
        self.character_mut(id)
            .ok_or(CatacombError::UnknownEntity(id))
    }

    /// Registers an observer for every future event.
    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Delivers an event to the creatures on its level, the listeners and
    /// the statistics, then records it.
    pub fn raise_event(&mut self, event: GameEvent) {
        debug!("Event: {:?}", event);
        self.statistics.update_from_event(&event, self.player_id);
        if let Some(level) = self.levels.get_mut(&event.level()) {
            for creature in level.creatures_mut() {
                creature.receive_event(&event);
            }
        }
        for listener in self.listeners.iter_mut() {
            listener.receive_event(&event);
        }
        if self.event_log.len() >= config::EVENT_LOG_SIZE {
            self.event_log.pop_front();
        }
        self.event_log.push_back(event);
    }

    pub fn raise_events(&mut self, events: &[GameEvent]) {
        for event in events {
            self.raise_event(event.clone());
        }
    }

    /// Pairs two portals so that each leads to the other.
    pub fn link_portals(&mut self, first: PortalLink, second: PortalLink) -> CatacombResult<()> {
        for end in [first, second] {
            let exists = self
                .level(end.level)
                .map_or(false, |level| level.portal_at(end.location).is_some());
            if !exists {
                return Err(CatacombError::InvalidState(format!(
                    "No portal at {:?} on level {}",
                    end.location, end.level
                )));
            }
        }
        for (here, there) in [(first, second), (second, first)] {
            if let Some(portal) = self
                .level_mut(here.level)
                .and_then(|level| level.portal_at_mut(here.location))
            {
                portal.other_end = Some(there);
            }
        }
        Ok(())
    }

    pub fn is_game_ended(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    /// Works out how the game ended.
    ///
    /// A game that stopped while the player was alive and inside the
    /// dungeon counts as quit.
    pub fn check_result(&self) -> GameResult {
        match self.completion_state {
            GameCompletionState::PlayerDied => GameResult::Dead,
            GameCompletionState::Escaped => GameResult::Escaped,
            GameCompletionState::Victory => GameResult::Victory,
            GameCompletionState::Playing => match self.player() {
                Some(player) if player.is_dead() => GameResult::Dead,
                _ => GameResult::Quit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        new_entity_id, CharacterBuilder, EventCollector, LevelBuilder, Portal, Position, TileId,
    };

    fn state_with_player() -> (GameState, EntityId) {
        let player = CharacterBuilder::new().with_name("Hero").build();
        let id = player.id;
        let level = LevelBuilder::new()
            .with_character(player, Position::new(2, 2))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);
        state.set_player(id);
        (state, id)
    }

    #[test]
    fn test_game_state_creation() {
        let state = GameState::new();
        assert_eq!(state.turn_number, 0);
        assert!(state.player_id.is_none());
        assert_eq!(state.completion_state, GameCompletionState::Playing);
    }

    #[test]
    fn test_locate_character() {
        let (state, id) = state_with_player();
        assert_eq!(state.locate_character(id), Some(0));
        assert_eq!(state.locate_character(new_entity_id()), None);
        assert_eq!(state.player().unwrap().name, "Hero");
    }

    #[test]
    fn test_events_reach_creatures_and_listeners() {
        let (mut state, id) = state_with_player();
        let collector = EventCollector::new();
        state.add_listener(Box::new(collector.clone()));

        state.raise_event(GameEvent::Wait {
            character: id,
            level: 0,
        });
        // Events on other levels are not heard
        state.raise_event(GameEvent::Wait {
            character: id,
            level: 7,
        });

        assert_eq!(collector.len(), 2);
        assert_eq!(state.event_log.len(), 2);
        assert_eq!(state.character(id).unwrap().short_term_memory.len(), 1);
    }

    #[test]
    fn test_event_log_drops_oldest_events() {
        let (mut state, id) = state_with_player();

        for level in 0..config::EVENT_LOG_SIZE + 3 {
            state.raise_event(GameEvent::Wait {
                character: id,
                level: level as LevelId,
            });
        }

        assert_eq!(state.event_log.len(), config::EVENT_LOG_SIZE);
        assert_eq!(state.event_log.front().map(GameEvent::level), Some(3));
    }

    #[test]
    fn test_statistics_update() {
        let mut stats = GameStatistics::new();
        let player = new_entity_id();

        stats.update_from_event(
            &GameEvent::Move {
                character: player,
                level: 0,
                from: Position::new(0, 0),
                to: Position::new(1, 0),
            },
            Some(player),
        );
        stats.update_from_event(
            &GameEvent::Death {
                character: new_entity_id(),
                name: "rat".to_string(),
                level: 0,
                location: Position::new(1, 1),
            },
            Some(player),
        );

        assert_eq!(stats.steps_taken, 1);
        assert_eq!(stats.creatures_killed, 1);
        assert_eq!(stats.deaths, 0);
    }

    #[test]
    fn test_check_result() {
        let (mut state, id) = state_with_player();
        assert_eq!(state.check_result(), GameResult::Quit);

        state.character_mut(id).unwrap().set_hit_points(0);
        assert_eq!(state.check_result(), GameResult::Dead);

        state.completion_state = GameCompletionState::Victory;
        assert_eq!(state.check_result(), GameResult::Victory);
    }

    #[test]
    fn test_link_portals() {
        let mut upper = LevelBuilder::new().with_id(1).build().unwrap();
        let mut lower = LevelBuilder::new().with_id(2).build().unwrap();
        upper.add_portal(Portal::new(TileId::PORTAL_STAIRS_DOWN), Position::new(3, 3), None);
        lower.add_portal(Portal::new(TileId::PORTAL_STAIRS_UP), Position::new(5, 5), None);

        let mut state = GameState::new();
        state.add_level(upper);
        state.add_level(lower);

        let a = PortalLink {
            level: 1,
            location: Position::new(3, 3),
        };
        let b = PortalLink {
            level: 2,
            location: Position::new(5, 5),
        };
        state.link_portals(a, b).unwrap();

        assert_eq!(
            state.level(1).unwrap().portal_at(a.location).unwrap().other_end,
            Some(b)
        );
        assert_eq!(
            state.level(2).unwrap().portal_at(b.location).unwrap().other_end,
            Some(a)
        );
        assert!(state
            .link_portals(a, PortalLink { level: 9, location: Position::origin() })
            .is_err());
    }
}
