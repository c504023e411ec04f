//! # Magic
//!
//! Spell casting and the study of spell domains.
//!
//! Spells are described by [`SpellSpecification`]s held in a
//! [`SpellGenerator`]. A caster knows a spell when its spell book lists the
//! spell and its level in the spell's domain is high enough. Casting costs
//! spirit and fires the spell's effect handles on every target.

use super::{find_actor, illegal, require_actor, Action, ActionKind, ActionParameters, SubActionFactory};
use crate::{
    check_dying, config, has_line_of_sight, CatacombError, CatacombResult, Character, Direction,
    EffectHandle, EffectsFactory, EntityId, GameEvent, GameState, Level, Position, Trigger,
};
use log::{debug, info};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

/// How a spell picks its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Targeting {
    /// The caster itself
    Caster,
    /// First creature in the cast direction
    SingleTarget,
    /// Every visible creature around the point where the spell lands
    SphericalArea { radius: i32 },
}

/// Static description of a spell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSpecification {
    pub name: String,
    pub domain: String,
    /// Domain level needed to know the spell
    pub level: u32,
    /// Spirit spent per cast
    pub spirit: i32,
    pub targeting: Targeting,
    pub effect_handles: Vec<EffectHandle>,
}

/// Table of known spell specifications.
///
/// # Examples
///
/// ```
/// use catacomb::{SpellGenerator, Targeting};
///
/// let spells = SpellGenerator::new();
/// let fireball = spells.spell("fireball").unwrap();
/// assert_eq!(fireball.spirit, 10);
/// assert_eq!(fireball.targeting, Targeting::SphericalArea { radius: 3 });
/// assert!(spells.spell("wish").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpellGenerator {
    spells: HashMap<String, SpellSpecification>,
}

impl SpellGenerator {
    /// Generator with the built-in spells.
    pub fn new() -> Self {
        let mut generator = Self::default();
        let on_hit = |effect: &str| EffectHandle::new(Trigger::OnSpellHit, effect).with_charges(1);

        generator.add_spell(SpellSpecification {
            name: "healing wind".to_string(),
            domain: "healing".to_string(),
            level: 1,
            spirit: 5,
            targeting: Targeting::Caster,
            effect_handles: vec![on_hit("heal medium wounds")],
        });
        generator.add_spell(SpellSpecification {
            name: "magic missile".to_string(),
            domain: "arcane".to_string(),
            level: 1,
            spirit: 7,
            targeting: Targeting::SingleTarget,
            effect_handles: vec![on_hit("cause wound")],
        });
        generator.add_spell(SpellSpecification {
            name: "fireball".to_string(),
            domain: "fire".to_string(),
            level: 1,
            spirit: 10,
            targeting: Targeting::SphericalArea { radius: 3 },
            effect_handles: vec![on_hit("fire"), on_hit("cause wound")],
        });
        generator
    }

    /// Loads spell specifications from a JSON list.
    pub fn from_json(json: &str) -> CatacombResult<Self> {
        let specifications: Vec<SpellSpecification> = serde_json::from_str(json)?;
        let mut generator = Self::default();
        for specification in specifications {
            generator.add_spell(specification);
        }
        Ok(generator)
    }

    pub fn add_spell(&mut self, specification: SpellSpecification) {
        self.spells
            .insert(specification.name.clone(), specification);
    }

    pub fn spell(&self, name: &str) -> Option<&SpellSpecification> {
        self.spells.get(name)
    }

    /// Characters a spell cast by `caster` towards `direction` would affect.
    pub fn targets(
        &self,
        specification: &SpellSpecification,
        level: &Level,
        caster: &Character,
        direction: Direction,
    ) -> Vec<EntityId> {
        match specification.targeting {
            Targeting::Caster => vec![caster.id],
            Targeting::SingleTarget => match trace(level, caster.location, direction) {
                Some(Landing::Creature { id, .. }) => vec![id],
                _ => Vec::new(),
            },
            Targeting::SphericalArea { radius } => {
                let splash = match trace(level, caster.location, direction) {
                    Some(Landing::Creature { previous, .. }) | Some(Landing::Wall { previous }) => {
                        previous
                    }
                    None => return Vec::new(),
                };
                debug!("{} lands at {:?}", specification.name, splash);
                level
                    .creatures()
                    .iter()
                    .filter(|c| c.location.euclidean_distance(splash) <= radius as f64)
                    .filter(|c| {
                        has_line_of_sight(splash, c.location, |p| level.blocks_movement(p))
                    })
                    .map(|c| c.id)
                    .collect()
            }
        }
    }
}

/// Where a traced spell stops.
enum Landing {
    Creature { id: EntityId, previous: Position },
    Wall { previous: Position },
}

fn trace(level: &Level, from: Position, direction: Direction) -> Option<Landing> {
    if direction == Direction::Enter {
        return None;
    }
    let mut previous = from;
    for _ in 0..config::MAX_TARGETING_RANGE {
        let current = previous.step(direction);
        if let Some(id) = level.creature_id_at(current) {
            return Some(Landing::Creature { id, previous });
        }
        if level.blocks_movement(current) {
            return Some(Landing::Wall { previous });
        }
        previous = current;
    }
    None
}

/// Builds [`SpellCastingAction`]s, resolving targets when the action is made.
#[derive(Debug, Clone)]
pub struct SpellCastingFactory {
    spells: Rc<SpellGenerator>,
    effects: Rc<EffectsFactory>,
}

impl SpellCastingFactory {
    pub fn new(spells: Rc<SpellGenerator>, effects: Rc<EffectsFactory>) -> Self {
        Self { spells, effects }
    }
}

impl SubActionFactory for SpellCastingFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::SpellCast]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        let ActionParameters::SpellCast {
            caster,
            direction,
            spell,
        } = parameters
        else {
            return Err(CatacombError::Configuration(format!(
                "SpellCastingFactory cannot handle {:?}",
                parameters.kind()
            )));
        };
        let specification = self
            .spells
            .spell(&spell)
            .ok_or_else(|| CatacombError::Configuration(format!("No spell named '{}'", spell)))?;
        let (level_id, character) = require_actor(state, caster)?;
        let level = state
            .level(level_id)
            .ok_or_else(|| CatacombError::InvalidState(format!("Level {} missing", level_id)))?;
        let targets = self
            .spells
            .targets(specification, level, character, direction);

        Ok(Box::new(SpellCastingAction {
            caster,
            spell: specification.clone(),
            targets,
            effects: Rc::clone(&self.effects),
        }))
    }
}

/// A spell with its targets already chosen.
#[derive(Debug, Clone)]
pub struct SpellCastingAction {
    pub caster: EntityId,
    pub spell: SpellSpecification,
    pub targets: Vec<EntityId>,
    effects: Rc<EffectsFactory>,
}

impl Action for SpellCastingAction {
    fn is_legal(&self, state: &GameState) -> bool {
        find_actor(state, self.caster).map_or(false, |(_, caster)| {
            caster.spellbook.knows_spell(&self.spell.name) && caster.spirit >= self.spell.spirit
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
        let (level_id, _) = require_actor(state, self.caster)?;
        let caster = state.require_character_mut(self.caster)?;
        caster.spirit -= self.spell.spirit;
        caster.add_to_tick(config::SPELL_COST);
        info!("{} casts {}", caster.name, self.spell.name);

        let cast = GameEvent::SpellCast {
            caster: self.caster,
            level: level_id,
            spell: self.spell.name.clone(),
            targets: self.targets.clone(),
        };
        state.raise_event(cast.clone());
        let mut events = vec![cast];

        for target in &self.targets {
            let Some(victim) = state.character_mut(*target) else {
                continue;
            };
            // Every target is struck by a fresh copy of the spell's handles
            let mut handles: Vec<EffectHandle> = self
                .spell
                .effect_handles
                .iter()
                .filter(|h| h.trigger == Trigger::OnSpellHit)
                .cloned()
                .collect();
            let mut hit_events = Vec::new();
            for handle in handles.iter_mut().filter(|h| h.has_charges()) {
                handle.use_charge();
                let effect = self.effects.create_effect(&handle.effect, Some(*target))?;
                if effect.is_expired() {
                    hit_events.extend(effect.trigger(victim, level_id));
                } else {
                    hit_events.extend(victim.add_effect(effect, level_id));
                }
            }
            state.raise_events(&hit_events);
            events.extend(hit_events);
        }
        for target in &self.targets {
            events.extend(check_dying(state, *target)?);
        }
        Ok(events)
    }
}

/// Builds [`GainDomainAction`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct GainDomainFactory;

impl SubActionFactory for GainDomainFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::GainDomain]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        _state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        match parameters {
            ActionParameters::GainDomain {
                character,
                item,
                domain,
            } => Ok(Box::new(GainDomainAction {
                character,
                item,
                domain,
            })),
            other => Err(CatacombError::Configuration(format!(
                "GainDomainFactory cannot handle {:?}",
                other.kind()
            ))),
        }
    }
}

/// Sacrifice a domain item to raise the character's level in that domain.
#[derive(Debug, Clone)]
pub struct GainDomainAction {
    pub character: EntityId,
    pub item: EntityId,
    pub domain: String,
}

impl Action for GainDomainAction {
    fn is_legal(&self, state: &GameState) -> bool {
        find_actor(state, self.character)
            .and_then(|(_, character)| character.inventory.get(self.item))
            .map_or(false, |item| item.domain.as_deref() == Some(self.domain.as_str()))
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        _rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        let (level_id, _) = require_actor(state, self.character)?;
        let character = state.require_character_mut(self.character)?;
        character.inventory.remove(self.item);
        let domain_level = character.spellbook.add_domain_level(&self.domain, 1);
        character.add_to_tick(config::GAIN_DOMAIN_COST);
        debug!(
            "{} reached level {} in {}",
            character.name, domain_level, self.domain
        );

        let event = GameEvent::DomainGained {
            character: self.character,
            level: level_id,
            domain: self.domain.clone(),
            domain_level,
        };
        state.raise_event(event.clone());
        Ok(vec![event])
    }
}
