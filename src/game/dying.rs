//! # Dying
//!
//! What happens when hit points run out.

use crate::{Action, CatacombResult, DropAction, EntityId, GameCompletionState, GameEvent, GameState};
use log::info;

/// Resolves death for a character whose hit points are at or below zero.
///
/// Everything the character carries is dropped through [`DropAction`], a
/// death event is raised, and the character is taken off its level. The
/// player stays in place and the game ends instead. Characters that are
/// alive, missing, or already dead players are left alone.
pub fn check_dying(state: &mut GameState, character: EntityId) -> CatacombResult<Vec<GameEvent>> {
    let Some(level_id) = state.locate_character(character) else {
        return Ok(Vec::new());
    };
    let Some(dying) = state.character(character) else {
        return Ok(Vec::new());
    };
    if !dying.is_dead() {
        return Ok(Vec::new());
    }
    if state.is_player(character) && state.completion_state == GameCompletionState::PlayerDied {
        return Ok(Vec::new());
    }

    let name = dying.name.clone();
    let location = dying.location;
    let carried: Vec<EntityId> = dying.inventory.items().iter().map(|i| i.id).collect();

    let mut events = Vec::new();
    for item in carried {
        let drop = DropAction::new(character, item);
        if drop.is_legal(state) {
            events.extend(drop.perform(state)?);
        }
    }

    let death = GameEvent::Death {
        character,
        name: name.clone(),
        level: level_id,
        location,
    };
    state.raise_event(death.clone());
    events.push(death);

    if state.is_player(character) {
        info!("Player {} died at {:?}", name, location);
        state.completion_state = GameCompletionState::PlayerDied;
    } else {
        info!("{} died at {:?}", name, location);
        state.require_level_mut(level_id)?.remove_creature(character);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharacterBuilder, GameResult, ItemBuilder, LevelBuilder, Position};

    #[test]
    fn test_dead_monster_is_removed_and_drops_items() {
        let sword = ItemBuilder::new().with_name("sword").build();
        let monster = CharacterBuilder::new()
            .with_hit_points(-1)
            .with_weapon(sword)
            .build();
        let id = monster.id;
        let level = LevelBuilder::new()
            .with_character(monster, Position::new(3, 3))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);

        let events = check_dying(&mut state, id).unwrap();

        let tags: Vec<&str> = events.iter().map(GameEvent::event_type).collect();
        assert_eq!(tags, vec!["drop", "death"]);
        let level = state.level(0).unwrap();
        assert!(level.creatures().is_empty());
        assert_eq!(level.items_at(Position::new(3, 3)).len(), 1);
    }

    #[test]
    fn test_dead_player_ends_game_and_stays() {
        let player = CharacterBuilder::new().with_hit_points(0).build();
        let id = player.id;
        let level = LevelBuilder::new()
            .with_character(player, Position::new(3, 3))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);
        state.set_player(id);

        check_dying(&mut state, id).unwrap();
        assert_eq!(state.check_result(), GameResult::Dead);
        assert!(state.character(id).is_some());

        // A second check does not raise another death
        assert!(check_dying(&mut state, id).unwrap().is_empty());
        assert_eq!(state.statistics.deaths, 1);
    }

    #[test]
    fn test_living_character_is_untouched() {
        let hero = CharacterBuilder::new().with_hit_points(1).build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(3, 3))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);
        assert!(check_dying(&mut state, id).unwrap().is_empty());
        assert!(check_dying(&mut state, crate::new_entity_id())
            .unwrap()
            .is_empty());
    }
}
