//! Drinking potions.

use super::{find_actor, illegal, require_actor, Action, ActionKind, ActionParameters, SubActionFactory};
use crate::{
    check_dying, config, CatacombError, CatacombResult, EffectsFactory, EntityId, GameEvent,
    GameState, Trigger,
};
use log::debug;
use rand::rngs::StdRng;
use std::rc::Rc;

/// Builds [`DrinkAction`]s.
#[derive(Debug, Clone)]
pub struct DrinkFactory {
    effects: Rc<EffectsFactory>,
}

impl DrinkFactory {
    pub fn new(effects: Rc<EffectsFactory>) -> Self {
        Self { effects }
    }
}

impl SubActionFactory for DrinkFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::Drink]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        _state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        match parameters {
            ActionParameters::Drink { character, item } => Ok(Box::new(DrinkAction {
                character,
                item,
                effects: Rc::clone(&self.effects),
            })),
            other => Err(CatacombError::Configuration(format!(
                "DrinkFactory cannot handle {:?}",
                other.kind()
            ))),
        }
    }
}

/// Drink a carried item, firing its drink effects on the drinker.
///
/// Each drink spends one charge of every drink effect. The item is used up
/// once none of them has charges left.
#[derive(Debug, Clone)]
pub struct DrinkAction {
    pub character: EntityId,
    pub item: EntityId,
    effects: Rc<EffectsFactory>,
}

impl DrinkAction {
    pub fn new(character: EntityId, item: EntityId, effects: Rc<EffectsFactory>) -> Self {
        Self {
            character,
            item,
            effects,
        }
    }
}

impl Action for DrinkAction {
    fn is_legal(&self, state: &GameState) -> bool {
        find_actor(state, self.character)
            .and_then(|(_, character)| character.inventory.get(self.item))
            .map_or(false, |item| {
                item.effect_handles_for(Trigger::OnDrink)
                    .any(|handle| handle.has_charges())
            })
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        _rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        let (level_id, drinker) = require_actor(state, self.character)?;
        let pending = drinker
            .inventory
            .get(self.item)
            .ok_or(CatacombError::UnknownEntity(self.item))?
            .effect_handles
            .iter()
            .enumerate()
            .filter(|(_, h)| h.trigger == Trigger::OnDrink && h.has_charges())
            .map(|(index, h)| {
                Ok((index, self.effects.create_effect(&h.effect, Some(self.character))?))
            })
            .collect::<CatacombResult<Vec<_>>>()?;

        let drink = GameEvent::Drink {
            character: self.character,
            item: self.item,
            level: level_id,
        };
        state.raise_event(drink.clone());
        let mut events = vec![drink];
        let mut effect_events = Vec::new();

        let drinker = state.require_character_mut(self.character)?;
        drinker.add_to_tick(config::DRINK_COST);
        let mut potion = drinker
            .inventory
            .remove(self.item)
            .ok_or(CatacombError::UnknownEntity(self.item))?;

        for (index, effect) in pending {
            if effect.is_expired() {
                effect_events.extend(effect.trigger(drinker, level_id));
            } else {
                effect_events.extend(drinker.add_effect(effect, level_id));
            }
            if let Some(handle) = potion.effect_handles.get_mut(index) {
                handle.use_charge();
            }
        }

        let has_charges_left = potion
            .effect_handles_for(Trigger::OnDrink)
            .any(|handle| handle.has_charges());
        if has_charges_left {
            drinker.inventory.add(potion);
        } else {
            debug!("{} finished {}", drinker.name, potion.name);
        }

        state.raise_events(&effect_events);
        events.extend(effect_events);
        events.extend(check_dying(state, self.character)?);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharacterBuilder, EffectHandle, EffectType, ItemBuilder, LevelBuilder, Position};
    use rand::SeedableRng;

    fn drink(state: &mut GameState, character: EntityId, item: EntityId) -> Vec<GameEvent> {
        let mut action =
            DrinkAction::new(character, item, Rc::new(EffectsFactory::with_defaults()));
        action
            .execute(state, &mut StdRng::seed_from_u64(9))
            .unwrap()
    }

    fn drinker_with(potion: crate::Item, hit_points: i32) -> (GameState, EntityId) {
        let hero = CharacterBuilder::new()
            .with_max_hp(20)
            .with_hit_points(hit_points)
            .with_item(potion)
            .build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(4, 4))
            .build()
            .unwrap();
        (GameState::with_level(level), id)
    }

    #[test]
    fn test_healing_potion_is_used_up() {
        let potion = ItemBuilder::new()
            .with_name("healing potion")
            .with_effect(EffectHandle::new(Trigger::OnDrink, "major heal").with_charges(1))
            .build();
        let potion_id = potion.id;
        let (mut state, id) = drinker_with(potion, 5);

        let events = drink(&mut state, id, potion_id);

        let hero = state.character(id).unwrap();
        assert_eq!(hero.hit_points(), 15);
        assert!(hero.inventory.is_empty());
        assert_eq!(events[0].event_type(), "drink");
        assert_eq!(hero.tick, config::DRINK_COST);
    }

    #[test]
    fn test_potion_with_charges_left_is_kept() {
        let potion = ItemBuilder::new()
            .with_name("flask")
            .with_effect(EffectHandle::new(Trigger::OnDrink, "minor heal").with_charges(2))
            .build();
        let potion_id = potion.id;
        let (mut state, id) = drinker_with(potion, 5);

        drink(&mut state, id, potion_id);
        assert!(state.character(id).unwrap().inventory.contains(potion_id));
        drink(&mut state, id, potion_id);
        let hero = state.character(id).unwrap();
        assert!(!hero.inventory.contains(potion_id));
        assert_eq!(hero.hit_points(), 15);
    }

    #[test]
    fn test_poison_potion_starts_effect() {
        let potion = ItemBuilder::new()
            .with_name("murky potion")
            .with_effect(EffectHandle::new(Trigger::OnDrink, "poison").with_charges(1))
            .build();
        let potion_id = potion.id;
        let (mut state, id) = drinker_with(potion, 20);

        drink(&mut state, id, potion_id);
        assert!(state
            .character(id)
            .unwrap()
            .has_effect_type(EffectType::Poison));
    }

    #[test]
    fn test_instant_heal_clamps_and_leaves_no_effect() {
        let potion = ItemBuilder::new()
            .with_name("healing potion")
            .with_effect(EffectHandle::new(Trigger::OnDrink, "major heal").with_charges(1))
            .build();
        let potion_id = potion.id;
        let hero = CharacterBuilder::new()
            .with_hit_points(1)
            .with_max_hp(10)
            .with_item(potion)
            .build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(4, 4))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);

        drink(&mut state, id, potion_id);

        let hero = state.character(id).unwrap();
        assert_eq!(hero.hit_points(), 10);
        assert!(hero.effects().is_empty());
    }

    #[test]
    fn test_unknown_effect_leaves_potion_untouched() {
        let potion = ItemBuilder::new()
            .with_name("strange brew")
            .with_effect(EffectHandle::new(Trigger::OnDrink, "liquid luck").with_charges(1))
            .build();
        let potion_id = potion.id;
        let (mut state, id) = drinker_with(potion, 5);

        let result = DrinkAction::new(id, potion_id, Rc::new(EffectsFactory::with_defaults()))
            .execute(&mut state, &mut StdRng::seed_from_u64(9));

        assert!(matches!(result, Err(CatacombError::Configuration(_))));
        let hero = state.character(id).unwrap();
        assert!(hero.inventory.contains(potion_id));
        assert_eq!(hero.tick, 0);
        assert!(state.event_log.is_empty());
    }

    #[test]
    fn test_item_without_drink_effect_is_not_drinkable() {
        let rock = ItemBuilder::new().with_name("rock").build();
        let rock_id = rock.id;
        let (state, id) = drinker_with(rock, 10);
        let action = DrinkAction::new(id, rock_id, Rc::new(EffectsFactory::with_defaults()));
        assert!(!action.is_legal(&state));
    }

    #[test]
    fn test_drinking_poison_can_kill() {
        let potion = ItemBuilder::new()
            .with_name("vial of wounding")
            .with_effect(EffectHandle::new(Trigger::OnDrink, "cause wound").with_charges(1))
            .build();
        let potion_id = potion.id;
        let (mut state, id) = drinker_with(potion, 3);

        let events = drink(&mut state, id, potion_id);
        assert!(events.iter().any(|e| e.event_type() == "death"));
        assert!(state.character(id).is_none());
    }
}
