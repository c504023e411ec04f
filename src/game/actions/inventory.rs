//! Picking up, dropping, equipping and unequipping items.

use super::{find_actor, illegal, require_actor, Action, ActionKind, ActionParameters, SubActionFactory};
use crate::{config, CatacombError, CatacombResult, EntityId, GameEvent, GameState};
use log::debug;
use rand::rngs::StdRng;

/// Builds every inventory action.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryFactory;

impl SubActionFactory for InventoryFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[
            ActionKind::PickUp,
            ActionKind::Drop,
            ActionKind::Equip,
            ActionKind::Unequip,
        ]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        _state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        match parameters {
            ActionParameters::PickUp { character, item } => {
                Ok(Box::new(PickUpAction::new(character, item)))
            }
            ActionParameters::Drop { character, item } => {
                Ok(Box::new(DropAction::new(character, item)))
            }
            ActionParameters::Equip { character, item } => {
                Ok(Box::new(EquipAction::new(character, item)))
            }
            ActionParameters::Unequip { character, item } => {
                Ok(Box::new(UnequipAction::new(character, item)))
            }
            other => Err(CatacombError::Configuration(format!(
                "InventoryFactory cannot handle {:?}",
                other.kind()
            ))),
        }
    }
}

/// Pick an item up from the character's own square.
///
/// Ammunition merges into a carried stack with the same name.
#[derive(Debug, Clone)]
pub struct PickUpAction {
    pub character: EntityId,
    pub item: EntityId,
}

impl PickUpAction {
    pub fn new(character: EntityId, item: EntityId) -> Self {
        Self { character, item }
    }

    /// Executes the pick up; needs no randomness.
    pub fn perform(&self, state: &mut GameState) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        let (level_id, character) = require_actor(state, self.character)?;
        let location = character.location;

        let level = state.require_level_mut(level_id)?;
        let item = level
            .remove_item(self.item)
            .ok_or(CatacombError::UnknownEntity(self.item))?;
        let character = level
            .creature_mut(self.character)
            .ok_or(CatacombError::UnknownEntity(self.character))?;

        let merged = match (&item.ammunition_data, character.inventory.ammunition_stack_mut(&item.name)) {
            (Some(incoming), Some(stack)) => {
                if let Some(data) = stack.ammunition_data.as_mut() {
                    data.count += incoming.count;
                }
                true
            }
            _ => false,
        };
        debug!(
            "{} picked up {} (merged: {})",
            character.name, item.name, merged
        );
        if !merged {
            character.inventory.add(item);
        }
        character.add_to_tick(config::INVENTORY_COST);

        let event = GameEvent::PickUp {
            character: self.character,
            item: self.item,
            level: level_id,
            location,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}

impl Action for PickUpAction {
    fn is_legal(&self, state: &GameState) -> bool {
        let Some((level_id, character)) = find_actor(state, self.character) else {
            return false;
        };
        state
            .level(level_id)
            .and_then(|level| level.item(self.item))
            .map_or(false, |item| item.location == Some(character.location))
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        _rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        self.perform(state)
    }
}

/// Put a carried item down on the character's square.
#[derive(Debug, Clone)]
pub struct DropAction {
    pub character: EntityId,
    pub item: EntityId,
}

impl DropAction {
    pub fn new(character: EntityId, item: EntityId) -> Self {
        Self { character, item }
    }

    /// Executes the drop; needs no randomness.
    pub fn perform(&self, state: &mut GameState) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        let (level_id, character) = require_actor(state, self.character)?;
        let location = character.location;

        let level = state.require_level_mut(level_id)?;
        let character = level
            .creature_mut(self.character)
            .ok_or(CatacombError::UnknownEntity(self.character))?;
        let item = character
            .inventory
            .remove(self.item)
            .ok_or(CatacombError::UnknownEntity(self.item))?;
        character.add_to_tick(config::INVENTORY_COST);
        debug!("{} dropped {}", character.name, item.name);
        level.add_item(item, location);

        let event = GameEvent::Drop {
            character: self.character,
            item: self.item,
            level: level_id,
            location,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}

impl Action for DropAction {
    fn is_legal(&self, state: &GameState) -> bool {
        find_actor(state, self.character)
            .map_or(false, |(_, character)| character.inventory.contains(self.item))
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        _rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        self.perform(state)
    }
}

/// Wield a weapon, ready ammunition or put on armour.
#[derive(Debug, Clone)]
pub struct EquipAction {
    pub character: EntityId,
    pub item: EntityId,
}

impl EquipAction {
    pub fn new(character: EntityId, item: EntityId) -> Self {
        Self { character, item }
    }
}

impl Action for EquipAction {
    fn is_legal(&self, state: &GameState) -> bool {
        find_actor(state, self.character)
            .and_then(|(_, character)| character.inventory.get(self.item))
            .map_or(false, |item| {
                item.weapon_data.is_some()
                    || item.ammunition_data.is_some()
                    || item.armour_data.is_some()
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
        let (level, _) = require_actor(state, self.character)?;
        let character = state.require_character_mut(self.character)?;
        let inventory = &mut character.inventory;
        let item = inventory
            .get(self.item)
            .ok_or(CatacombError::UnknownEntity(self.item))?;
        let (is_weapon, is_ammunition) = (item.weapon_data.is_some(), item.is_ammunition());
        if is_weapon {
            inventory.weapon = Some(self.item);
        } else if is_ammunition {
            inventory.projectiles = Some(self.item);
        } else {
            inventory.armour = Some(self.item);
        }
        character.add_to_tick(config::INVENTORY_COST);

        let event = GameEvent::Equip {
            character: self.character,
            item: self.item,
            level,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}

/// Take an equipped item out of its slot; it stays in the pack.
#[derive(Debug, Clone)]
pub struct UnequipAction {
    pub character: EntityId,
    pub item: EntityId,
}

impl UnequipAction {
    pub fn new(character: EntityId, item: EntityId) -> Self {
        Self { character, item }
    }
}

impl Action for UnequipAction {
    fn is_legal(&self, state: &GameState) -> bool {
        find_actor(state, self.character)
            .map_or(false, |(_, character)| character.inventory.is_equipped(self.item))
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
        let character = state.require_character_mut(self.character)?;
        let inventory = &mut character.inventory;
        for slot in [
            &mut inventory.weapon,
            &mut inventory.projectiles,
            &mut inventory.armour,
        ] {
            if *slot == Some(self.item) {
                *slot = None;
            }
        }
        character.add_to_tick(config::INVENTORY_COST);

        let event = GameEvent::Unequip {
            character: self.character,
            item: self.item,
            level,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharacterBuilder, DamageType, Dice, ItemBuilder, LevelBuilder, Position};
    use rand::SeedableRng;

    fn arrows(count: u32) -> crate::Item {
        ItemBuilder::new()
            .with_name("arrow")
            .with_ammunition("arrow", count, Dice::new(1, 6), DamageType::Piercing)
            .build()
    }

    #[test]
    fn test_pick_up_requires_same_location() {
        let hero = CharacterBuilder::new().build();
        let id = hero.id;
        let item = ItemBuilder::new().with_name("dagger").build();
        let item_id = item.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(5, 5))
            .with_item(item, Position::new(6, 6))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);

        let action = PickUpAction::new(id, item_id);
        assert!(!action.is_legal(&state));
        assert!(action.perform(&mut state).is_err());
        assert!(state.character(id).unwrap().inventory.is_empty());
        assert_eq!(state.level(0).unwrap().items().len(), 1);
    }

    #[test]
    fn test_picked_up_item_has_no_location() {
        let hero = CharacterBuilder::new().build();
        let id = hero.id;
        let item = ItemBuilder::new().with_name("dagger").build();
        let item_id = item.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(5, 5))
            .with_item(item, Position::new(5, 5))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);

        PickUpAction::new(id, item_id).perform(&mut state).unwrap();

        let hero = state.character(id).unwrap();
        let carried = hero.inventory.get(item_id).unwrap();
        assert_eq!(carried.location, None);
        assert_eq!(hero.tick, config::INVENTORY_COST);
        assert!(state.level(0).unwrap().items().is_empty());
    }

    #[test]
    fn test_ammunition_stacks_merge() {
        let hero = CharacterBuilder::new().with_item(arrows(10)).build();
        let id = hero.id;
        let more = arrows(20);
        let more_id = more.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(5, 5))
            .with_item(more, Position::new(5, 5))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);

        PickUpAction::new(id, more_id).perform(&mut state).unwrap();

        let inventory = &state.character(id).unwrap().inventory;
        assert_eq!(inventory.len(), 1);
        assert_eq!(
            inventory.items()[0].ammunition_data.as_ref().unwrap().count,
            30
        );
    }

    #[test]
    fn test_drop_places_item_at_feet() {
        let item = ItemBuilder::new().with_name("rock").build();
        let item_id = item.id;
        let hero = CharacterBuilder::new().with_item(item).build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(4, 2))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);

        let events = DropAction::new(id, item_id).perform(&mut state).unwrap();

        assert_eq!(events[0].event_type(), "drop");
        let level = state.level(0).unwrap();
        let dropped = level.items_at(Position::new(4, 2));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].id, item_id);
        let hero = state.character(id).unwrap();
        assert_eq!(dropped[0].location, Some(hero.location));
        assert!(!hero.inventory.contains(item_id));
        assert!(hero.tick > 0);
    }

    #[test]
    fn test_equip_and_unequip() {
        let sword = ItemBuilder::new()
            .with_name("sword")
            .with_damage(Dice::new(1, 8), DamageType::Slashing)
            .build();
        let sword_id = sword.id;
        let hero = CharacterBuilder::new().with_item(sword).build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(1, 1))
            .build()
            .unwrap();
        let mut state = GameState::with_level(level);
        let mut rng = StdRng::seed_from_u64(1);

        let mut unequip = UnequipAction::new(id, sword_id);
        assert!(!unequip.is_legal(&state));

        EquipAction::new(id, sword_id)
            .execute(&mut state, &mut rng)
            .unwrap();
        assert_eq!(state.character(id).unwrap().inventory.weapon, Some(sword_id));

        unequip.execute(&mut state, &mut rng).unwrap();
        let inventory = &state.character(id).unwrap().inventory;
        assert_eq!(inventory.weapon, None);
        assert!(inventory.contains(sword_id));
    }

    #[test]
    fn test_plain_items_cannot_be_equipped() {
        let rock = ItemBuilder::new().with_name("rock").build();
        let rock_id = rock.id;
        let hero = CharacterBuilder::new().with_item(rock).build();
        let id = hero.id;
        let level = LevelBuilder::new()
            .with_character(hero, Position::new(1, 1))
            .build()
            .unwrap();
        let state = GameState::with_level(level);
        assert!(!EquipAction::new(id, rock_id).is_legal(&state));
    }
}
