//! # Encounters
//!
//! Populates a finished level with creatures and portals.

use crate::{
    CatacombError, CatacombResult, Character, CharacterBuilder, Dice, EffectHandle, Level,
    Portal, Position, TileId, Trigger,
};
use log::debug;
use rand::rngs::StdRng;

/// Places copies of a creature prototype on random free cells.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureAdder {
    pub prototype: Character,
    pub count: usize,
}

impl CreatureAdder {
    pub fn new(prototype: Character, count: usize) -> Self {
        Self { prototype, count }
    }

    pub fn add_creatures(&self, level: &mut Level, rng: &mut StdRng) -> CatacombResult<()> {
        for _ in 0..self.count {
            let location = level.find_free_space(rng).ok_or_else(|| {
                CatacombError::GenerationFailed(format!(
                    "No room left on level {} for {}",
                    level.id, self.prototype.name
                ))
            })?;
            level.add_creature(self.prototype.instantiate(), location)?;
            debug!("Placed {} at {:?}", self.prototype.name, location);
        }
        Ok(())
    }
}

/// Places a single unlinked portal on a free cell that has no portal yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalAdder {
    pub icon: TileId,
    /// Whether the portal leads out of the dungeon
    pub escape: bool,
}

impl PortalAdder {
    pub fn new(icon: TileId) -> Self {
        Self {
            icon,
            escape: false,
        }
    }

    /// Adder for the dungeon exit.
    pub fn exit() -> Self {
        Self {
            icon: TileId::PORTAL_EXIT,
            escape: true,
        }
    }

    /// Places the portal and returns where it went.
    pub fn add_portal(&self, level: &mut Level, rng: &mut StdRng) -> CatacombResult<Position> {
        let location = (0..100)
            .filter_map(|_| level.find_free_space(rng))
            .find(|pos| level.portal_at(*pos).is_none())
            .ok_or_else(|| {
                CatacombError::GenerationFailed(format!(
                    "No free cell for a portal on level {}",
                    level.id
                ))
            })?;
        let portal = if self.escape {
            Portal::exit()
        } else {
            Portal::new(self.icon)
        };
        level.add_portal(portal, location, None);
        debug!("Placed portal {} at {:?}", self.icon, location);
        Ok(location)
    }
}

/// Prototypes for the monsters generated levels are stocked with.
pub fn standard_creature_prototypes() -> Vec<Character> {
    vec![
        CharacterBuilder::new()
            .with_name("rat")
            .with_icon('r')
            .with_hit_points(4)
            .with_max_hp(4)
            .with_unarmed_damage(Dice::new(1, 2))
            .with_speed(2)
            .build(),
        CharacterBuilder::new()
            .with_name("spider")
            .with_icon('s')
            .with_hit_points(6)
            .with_max_hp(6)
            .with_effect_handle(EffectHandle::new(Trigger::OnAttackHit, "poison"))
            .with_speed(1)
            .build(),
    ]
}
