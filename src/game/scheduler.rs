//! # Turn Scheduler
//!
//! Picks the creature that acts next on a level.
//!
//! Every creature carries a `tick` clock. A creature whose tick has reached
//! zero may act; acting pushes its tick up by `speed × cost`. When nobody is
//! ready, time advances: every tick drops by one, every active effect
//! advances one step, and anything killed by its effects is resolved before
//! the next scan.

use crate::{check_dying, CatacombError, CatacombResult, EntityId, GameState, LevelId};
use log::debug;

/// Returns the first creature on the level, in level order, that is ready to
/// act, advancing time until one is.
///
/// # Examples
///
/// ```
/// use catacomb::{get_next_actor, CharacterBuilder, GameState, LevelBuilder, Position};
///
/// let slow = CharacterBuilder::new().with_tick(5).build();
/// let quick = CharacterBuilder::new().with_tick(2).build();
/// let quick_id = quick.id;
/// let level = LevelBuilder::new()
///     .with_character(slow, Position::new(1, 1))
///     .with_character(quick, Position::new(2, 2))
///     .build()
///     .unwrap();
/// let mut state = GameState::with_level(level);
///
/// assert_eq!(get_next_actor(&mut state, 0).unwrap(), quick_id);
/// assert_eq!(state.turn_number, 2);
/// ```
pub fn get_next_actor(state: &mut GameState, level_id: LevelId) -> CatacombResult<EntityId> {
    loop {
        let level = state
            .level(level_id)
            .ok_or_else(|| CatacombError::InvalidState(format!("Level {} does not exist", level_id)))?;
        if level.creatures().is_empty() {
            return Err(CatacombError::InvalidState(format!(
                "Level {} has no creatures to schedule",
                level_id
            )));
        }
        if let Some(ready) = level.creatures().iter().find(|c| c.tick <= 0) {
            return Ok(ready.id);
        }
        advance_time(state, level_id)?;
    }
}

/// Moves every clock on the level forward by one tick.
pub fn advance_time(state: &mut GameState, level_id: LevelId) -> CatacombResult<()> {
    let level = state.require_level_mut(level_id)?;
    let mut events = Vec::new();
    for creature in level.creatures_mut() {
        creature.tick -= 1;
        events.extend(creature.advance_effects(level_id));
    }
    let fallen: Vec<EntityId> = level
        .creatures()
        .iter()
        .filter(|c| c.is_dead())
        .map(|c| c.id)
        .collect();

    state.raise_events(&events);
    for id in fallen {
        debug!("Resolving death of {} after effects", id);
        check_dying(state, id)?;
    }
    state.turn_number += 1;
    Ok(())
}
