//! Walking, taking portals and leaving the dungeon.

use super::{find_actor, illegal, require_actor, Action, ActionKind, ActionParameters, SubActionFactory};
use crate::{
    config, CatacombError, CatacombResult, Direction, EntityId, GameCompletionState, GameEvent,
    GameState, VICTORY_ITEM,
};
use log::{debug, info};
use rand::rngs::StdRng;

/// Builds [`MoveAction`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveFactory;

impl SubActionFactory for MoveFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::Move]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        _state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        match parameters {
            ActionParameters::Move {
                character,
                direction,
            } => Ok(Box::new(MoveAction::new(character, direction))),
            other => Err(CatacombError::Configuration(format!(
                "MoveFactory cannot handle {:?}",
                other.kind()
            ))),
        }
    }
}

/// Step in one of the eight directions, or take the portal underfoot.
#[derive(Debug, Clone)]
pub struct MoveAction {
    pub character: EntityId,
    pub direction: Direction,
}

impl MoveAction {
    pub fn new(character: EntityId, direction: Direction) -> Self {
        Self {
            character,
            direction,
        }
    }

    fn portal_is_usable(&self, state: &GameState) -> bool {
        let Some((level_id, character)) = find_actor(state, self.character) else {
            return false;
        };
        let Some(link) = state
            .level(level_id)
            .and_then(|level| level.portal_at(character.location))
            .and_then(|portal| portal.other_end)
        else {
            return false;
        };
        state
            .level(link.level)
            .map_or(false, |level| level.is_free(link.location))
    }

    fn enter_portal(&self, state: &mut GameState) -> CatacombResult<Vec<GameEvent>> {
        let (level_id, character) = require_actor(state, self.character)?;
        let location = character.location;
        let link = state
            .level(level_id)
            .and_then(|level| level.portal_at(location))
            .and_then(|portal| portal.other_end)
            .ok_or_else(|| illegal(self))?;

        let mut traveller = state
            .require_level_mut(level_id)?
            .remove_creature(self.character)
            .ok_or(CatacombError::UnknownEntity(self.character))?;
        traveller.add_to_tick(config::MOVE_COST);
        state
            .require_level_mut(link.level)?
            .add_creature(traveller, link.location)?;

        info!(
            "Character {} took a portal from level {} to level {}",
            self.character, level_id, link.level
        );
        let event = GameEvent::PortalEntered {
            character: self.character,
            level: level_id,
            destination_level: link.level,
            destination: link.location,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}

impl Action for MoveAction {
    fn is_legal(&self, state: &GameState) -> bool {
        if self.direction == Direction::Enter {
            return self.portal_is_usable(state);
        }
        let Some((level_id, character)) = find_actor(state, self.character) else {
            return false;
        };
        let target = character.location.step(self.direction);
        state
            .level(level_id)
            .map_or(false, |level| level.is_free(target))
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        _rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        if self.direction == Direction::Enter {
            return self.enter_portal(state);
        }

        let (level_id, character) = require_actor(state, self.character)?;
        let from = character.location;
        let to = from.step(self.direction);

        let level = state.require_level_mut(level_id)?;
        level.move_creature(self.character, to)?;
        if let Some(character) = level.creature_mut(self.character) {
            character.add_to_tick(config::MOVE_COST);
        }
        debug!("Character {} moved {:?} -> {:?}", self.character, from, to);

        let event = GameEvent::Move {
            character: self.character,
            level: level_id,
            from,
            to,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}

/// Builds [`EscapeAction`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeFactory;

impl SubActionFactory for EscapeFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::Escape]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        _state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        match parameters {
            ActionParameters::Escape { character } => Ok(Box::new(EscapeAction { character })),
            other => Err(CatacombError::Configuration(format!(
                "EscapeFactory cannot handle {:?}",
                other.kind()
            ))),
        }
    }
}

/// Leave the dungeon through its exit portal.
///
/// The player escaping ends the game; carrying the crystal skull turns the
/// escape into a victory. Monsters that escape simply leave the level.
#[derive(Debug, Clone)]
pub struct EscapeAction {
    pub character: EntityId,
}

impl Action for EscapeAction {
    fn is_legal(&self, state: &GameState) -> bool {
        let Some((level_id, character)) = find_actor(state, self.character) else {
            return false;
        };
        state
            .level(level_id)
            .and_then(|level| level.portal_at(character.location))
            .map_or(false, |portal| portal.exits_dungeon)
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        _rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        let (level_id, character) = require_actor(state, self.character)?;
        let has_skull = character
            .inventory
            .items()
            .iter()
            .any(|item| item.name == VICTORY_ITEM);

        if state.is_player(self.character) {
            state.completion_state = if has_skull {
                GameCompletionState::Victory
            } else {
                GameCompletionState::Escaped
            };
            info!("Player escaped the dungeon ({:?})", state.completion_state);
        } else {
            state.require_level_mut(level_id)?.remove_creature(self.character);
        }

        let event = GameEvent::Escaped {
            character: self.character,
            level: level_id,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CharacterBuilder, ItemBuilder, LevelBuilder, Portal, PortalLink, Position, TileId,
    };
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_move_into_wall_is_illegal() {
        let hero = CharacterBuilder::new().build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_wall_at(Position::new(5, 4))
            .with_character(hero, Position::new(5, 5))
            .build()
            .unwrap();
        let state = GameState::with_level(level);

        assert!(!MoveAction::new(id, Direction::North).is_legal(&state));
        assert!(MoveAction::new(id, Direction::South).is_legal(&state));
    }

    #[test]
    fn test_move_into_creature_is_illegal() {
        let hero = CharacterBuilder::new().build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(5, 5))
            .with_character(CharacterBuilder::new().build(), Position::new(6, 6))
            .build()
            .unwrap();
        let state = GameState::with_level(level);

        assert!(!MoveAction::new(id, Direction::Southeast).is_legal(&state));
    }

    #[test]
    fn test_move_updates_location_and_tick() {
        let hero = CharacterBuilder::new().with_speed(2).build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(5, 5))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);

        let events = MoveAction::new(id, Direction::Northwest)
            .execute(&mut state, &mut rng())
            .unwrap();

        let hero = state.character(id).unwrap();
        assert_eq!(hero.location, Position::new(4, 4));
        assert_eq!(hero.tick, 2 * config::MOVE_COST);
        assert_eq!(events.len(), 1);
        assert_eq!(state.statistics.steps_taken, 1);
    }

    #[test]
    fn test_enter_portal_changes_level() {
        let hero = CharacterBuilder::new().build();
        let id = hero.id;
        let mut upper = LevelBuilder::new()
            .with_id(1)
            .with_character(hero, Position::new(2, 2))
            .build()
            .unwrap();
        let mut lower = LevelBuilder::new().with_id(2).build().unwrap();
        upper.add_portal(Portal::new(TileId::PORTAL_STAIRS_DOWN), Position::new(2, 2), None);
        lower.add_portal(Portal::new(TileId::PORTAL_STAIRS_UP), Position::new(7, 7), None);
        let mut state = GameState::new();
        state.add_level(upper);
        state.add_level(lower);
        state
            .link_portals(
                PortalLink {
                    level: 1,
                    location: Position::new(2, 2),
                },
                PortalLink {
                    level: 2,
                    location: Position::new(7, 7),
                },
            )
            .unwrap();

        let mut action = MoveAction::new(id, Direction::Enter);
        assert!(action.is_legal(&state));
        action.execute(&mut state, &mut rng()).unwrap();

        assert_eq!(state.locate_character(id), Some(2));
        assert_eq!(state.character(id).unwrap().location, Position::new(7, 7));
    }

    #[test]
    fn test_enter_without_portal_is_illegal() {
        let hero = CharacterBuilder::new().build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(2, 2))
            .build()
            .unwrap();
        let state = GameState::with_level(level);
        assert!(!MoveAction::new(id, Direction::Enter).is_legal(&state));
    }

    fn state_at_exit(carrying_skull: bool) -> (GameState, EntityId) {
        let mut builder = CharacterBuilder::new();
        if carrying_skull {
            builder = builder.with_item(ItemBuilder::new().with_name(VICTORY_ITEM).build());
        }
        let hero = builder.build();
        let id = hero.id;
        let mut level = LevelBuilder::new()
            .with_character(hero, Position::new(3, 3))
            .build()
            .unwrap();
        level.add_portal(Portal::exit(), Position::new(3, 3), None);
        let mut state = GameState::with_level(level);
        state.set_player(id);
        (state, id)
    }

    #[test]
    fn test_player_escapes() {
        let (mut state, id) = state_at_exit(false);
        let mut action = EscapeAction { character: id };
        assert!(action.is_legal(&state));
        action.execute(&mut state, &mut rng()).unwrap();
        assert_eq!(state.check_result(), crate::GameResult::Escaped);
    }

    #[test]
    fn test_escape_with_crystal_skull_is_victory() {
        let (mut state, id) = state_at_exit(true);
        EscapeAction { character: id }
            .execute(&mut state, &mut rng())
            .unwrap();
        assert_eq!(state.check_result(), crate::GameResult::Victory);
    }

    #[test]
    fn test_escape_factory_rejects_other_intents() {
        let (state, id) = state_at_exit(false);
        let factory = EscapeFactory;

        let wait = factory.get_action(ActionParameters::Wait { character: id }, &state);
        assert!(matches!(wait, Err(CatacombError::Configuration(_))));

        let escape = factory
            .get_action(ActionParameters::Escape { character: id }, &state)
            .unwrap();
        assert!(escape.is_legal(&state));
    }
}
