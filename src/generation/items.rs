//! # Item Placement
//!
//! Scatters item prototypes over a finished level.

use crate::{
    CatacombError, CatacombResult, DamageType, Dice, EffectHandle, Item, ItemBuilder, Level,
    Trigger, VICTORY_ITEM,
};
use log::debug;
use rand::rngs::StdRng;

/// Places copies of an item prototype on random free cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemAdder {
    pub prototype: Item,
    pub count: usize,
}

impl ItemAdder {
    pub fn new(prototype: Item, count: usize) -> Self {
        Self { prototype, count }
    }

    pub fn add_items(&self, level: &mut Level, rng: &mut StdRng) -> CatacombResult<()> {
        for _ in 0..self.count {
            let location = level.find_free_space(rng).ok_or_else(|| {
                CatacombError::GenerationFailed(format!(
                    "No room left on level {} for {}",
                    level.id, self.prototype.name
                ))
            })?;
            level.add_item(self.prototype.instantiate(), location);
            debug!("Placed {} at {:?}", self.prototype.name, location);
        }
        Ok(())
    }
}

/// Prototypes for the items generated levels are stocked with.
pub fn standard_item_prototypes() -> Vec<Item> {
    vec![
        ItemBuilder::new()
            .with_name("healing potion")
            .with_icon('!')
            .with_effect(EffectHandle::new(Trigger::OnDrink, "major heal").with_charges(1))
            .build(),
        ItemBuilder::new()
            .with_name("dagger")
            .with_icon('|')
            .with_damage(Dice::new(1, 4), DamageType::Piercing)
            .build(),
        ItemBuilder::new()
            .with_name("arrow")
            .with_icon('/')
            .with_ammunition("arrow", 10, Dice::new(1, 6), DamageType::Piercing)
            .build(),
        ItemBuilder::new()
            .with_name("tome of fire")
            .with_icon('?')
            .with_domain("fire")
            .build(),
    ]
}

/// The item that turns an escape into a victory.
pub fn crystal_skull() -> Item {
    ItemBuilder::new()
        .with_name(VICTORY_ITEM)
        .with_icon('*')
        .build()
}
