//! Spending time without doing anything.

use super::{illegal, require_actor, Action, ActionKind, ActionParameters, SubActionFactory};
use crate::{config, CatacombResult, EntityId, GameEvent, GameState};
use rand::rngs::StdRng;

/// Builds [`WaitAction`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitFactory;

impl SubActionFactory for WaitFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::Wait]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        _state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        Ok(Box::new(WaitAction {
            character: parameters.actor(),
            cost: config::WAIT_COST,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct WaitAction {
    pub character: EntityId,
    pub cost: i32,
}

impl Action for WaitAction {
    fn is_legal(&self, state: &GameState) -> bool {
        state.character(self.character).is_some()
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        _rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        let (level, _) = require_actor(state, self.character)?;
        state
            .require_character_mut(self.character)?
            .add_to_tick(self.cost);
        let event = GameEvent::Wait {
            character: self.character,
            level,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}
