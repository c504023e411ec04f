//! # Effects
//!
//! Timed and instantaneous effects such as healing, poison and fire.
//!
//! An effect counts its `tick` down once per scheduler round. When the tick
//! runs out the effect triggers, spends `frequency` worth of its `duration`
//! and starts counting again. Effects with no duration left have expired and
//! are removed from their character.

use crate::{CatacombError, CatacombResult, Character, EntityId, GameEvent, LevelId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of damage dealt by weapons and effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Crushing,
    Piercing,
    Slashing,
    Fire,
    Poison,
    Magic,
}

/// Tag used for the non-stacking rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectType {
    Heal,
    Poison,
    Damage,
    Fire,
}

/// What an effect does each time it triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    Heal { healing: i32 },
    Poison { damage: i32 },
    Damage { damage: i32, damage_type: DamageType },
    Fire { damage: i32 },
}

impl EffectKind {
    pub fn effect_type(&self) -> EffectType {
        match self {
            EffectKind::Heal { .. } => EffectType::Heal,
            EffectKind::Poison { .. } => EffectType::Poison,
            EffectKind::Damage { .. } => EffectType::Damage,
            EffectKind::Fire { .. } => EffectType::Fire,
        }
    }
}

/// An effect instance attached to a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Template name the effect was created from
    pub name: String,
    pub kind: EffectKind,
    /// Remaining duration in ticks; zero means instantaneous or expired
    pub duration: i32,
    /// Ticks between triggers
    pub frequency: i32,
    /// Ticks until the next trigger
    pub tick: i32,
    /// Character the effect acts on
    pub target: Option<EntityId>,
}

impl Effect {
    pub fn effect_type(&self) -> EffectType {
        self.kind.effect_type()
    }

    /// True once the duration has run out.
    pub fn is_expired(&self) -> bool {
        self.duration <= 0
    }

    /// Applies the effect's magnitude to `target` once.
    pub fn trigger(&self, target: &mut Character, level: LevelId) -> Vec<GameEvent> {
        let old = target.hit_points();
        match &self.kind {
            EffectKind::Heal { healing } => target.heal(*healing),
            EffectKind::Poison { damage }
            | EffectKind::Damage { damage, .. }
            | EffectKind::Fire { damage } => target.take_damage(*damage),
        }
        debug!(
            "Effect '{}' triggered on {}: {} -> {}",
            self.name,
            target.name,
            old,
            target.hit_points()
        );
        vec![GameEvent::HitPointsChanged {
            character: target.id,
            level,
            old,
            new: target.hit_points(),
            cause: self.name.clone(),
        }]
    }

    /// Advances the effect clock by one tick, triggering when it runs out.
    pub fn advance(&mut self, target: &mut Character, level: LevelId) -> Vec<GameEvent> {
        self.tick -= 1;
        if self.tick > 0 {
            return Vec::new();
        }
        let events = self.trigger(target, level);
        if self.frequency > 0 {
            self.duration -= self.frequency;
            self.tick = self.frequency;
        } else {
            self.duration = 0;
        }
        events
    }
}

/// Condition that makes an effect handle fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnDrink,
    OnAttackHit,
    OnSpellHit,
}

/// Binds a trigger to a named effect template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectHandle {
    pub trigger: Trigger,
    /// Name of the template in the [`EffectsFactory`]
    pub effect: String,
    /// Uses left; `None` never runs out
    pub charges: Option<u32>,
}

impl EffectHandle {
    pub fn new(trigger: Trigger, effect: impl Into<String>) -> Self {
        Self {
            trigger,
            effect: effect.into(),
            charges: None,
        }
    }

    pub fn with_charges(mut self, charges: u32) -> Self {
        self.charges = Some(charges);
        self
    }

    pub fn has_charges(&self) -> bool {
        self.charges.map_or(true, |c| c > 0)
    }

    /// Spends one charge, if the handle counts them.
    pub fn use_charge(&mut self) {
        if let Some(charges) = self.charges.as_mut() {
            *charges = charges.saturating_sub(1);
        }
    }
}

/// Template from which effects are instantiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTemplate {
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub frequency: i32,
    #[serde(default)]
    pub tick: i32,
    #[serde(flatten)]
    pub kind: EffectKind,
}

impl EffectTemplate {
    /// Template for an effect that fires once and is gone.
    pub fn instant(kind: EffectKind) -> Self {
        Self {
            duration: 0,
            frequency: 0,
            tick: 0,
            kind,
        }
    }

    pub fn timed(kind: EffectKind, duration: i32, frequency: i32, tick: i32) -> Self {
        Self {
            duration,
            frequency,
            tick,
            kind,
        }
    }
}

/// Named table of effect templates.
///
/// # Examples
///
/// ```
/// use catacomb::{EffectsFactory, EffectType};
///
/// let json = r#"{
///     "major heal": {"type": "heal", "healing": 10},
///     "poison": {"type": "poison", "damage": 5, "duration": 12, "frequency": 3, "tick": 3}
/// }"#;
/// let factory = EffectsFactory::from_json(json).unwrap();
/// let effect = factory.create_effect("poison", None).unwrap();
/// assert_eq!(effect.effect_type(), EffectType::Poison);
/// assert_eq!(effect.duration, 12);
/// assert!(factory.create_effect("unknown", None).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EffectsFactory {
    templates: HashMap<String, EffectTemplate>,
}

impl EffectsFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in effects used by potions, poisonous creatures and spells.
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.add_effect(
            "minor heal",
            EffectTemplate::instant(EffectKind::Heal { healing: 5 }),
        );
        factory.add_effect(
            "major heal",
            EffectTemplate::instant(EffectKind::Heal { healing: 10 }),
        );
        factory.add_effect(
            "heal medium wounds",
            EffectTemplate::instant(EffectKind::Heal { healing: 10 }),
        );
        factory.add_effect(
            "cause wound",
            EffectTemplate::instant(EffectKind::Damage {
                damage: 5,
                damage_type: DamageType::Magic,
            }),
        );
        factory.add_effect(
            "fire",
            EffectTemplate::timed(EffectKind::Fire { damage: 3 }, 30, 5, 0),
        );
        factory.add_effect(
            "poison",
            EffectTemplate::timed(EffectKind::Poison { damage: 5 }, 12, 3, 3),
        );
        factory
    }

    /// Loads templates from a JSON object keyed by effect name.
    pub fn from_json(json: &str) -> CatacombResult<Self> {
        let templates: HashMap<String, EffectTemplate> = serde_json::from_str(json)?;
        Ok(Self { templates })
    }

    /// Registers or replaces a template.
    pub fn add_effect(&mut self, name: impl Into<String>, template: EffectTemplate) {
        self.templates.insert(name.into(), template);
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Instantiates the named effect for `target`.
    ///
    /// An unknown name means the content tables are wired wrong and is
    /// reported as a configuration error.
    pub fn create_effect(&self, name: &str, target: Option<EntityId>) -> CatacombResult<Effect> {
        let template = self.templates.get(name).ok_or_else(|| {
            CatacombError::Configuration(format!("No effect template named '{}'", name))
        })?;
        Ok(Effect {
            name: name.to_string(),
            kind: template.kind.clone(),
            duration: template.duration,
            frequency: template.frequency,
            tick: template.tick,
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CharacterBuilder;

    #[test]
    fn test_timed_effect_triggers_every_frequency_ticks() {
        let factory = EffectsFactory::with_defaults();
        let mut target = CharacterBuilder::new().with_hit_points(100).build();
        let mut effect = factory.create_effect("poison", Some(target.id)).unwrap();

        let mut trigger_ticks = Vec::new();
        for elapsed in 1..=20 {
            if effect.is_expired() {
                break;
            }
            if !effect.advance(&mut target, 0).is_empty() {
                trigger_ticks.push(elapsed);
            }
        }

        assert_eq!(trigger_ticks, vec![3, 6, 9, 12]);
        assert!(effect.is_expired());
        assert_eq!(target.hit_points(), 80);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let factory = EffectsFactory::with_defaults();
        let mut target = CharacterBuilder::new()
            .with_hit_points(8)
            .with_max_hp(10)
            .build();
        let effect = factory.create_effect("major heal", None).unwrap();
        let events = effect.trigger(&mut target, 0);

        assert_eq!(target.hit_points(), 10);
        assert!(matches!(
            events[0],
            GameEvent::HitPointsChanged { old: 8, new: 10, .. }
        ));
    }

    #[test]
    fn test_damage_has_no_floor() {
        let mut target = CharacterBuilder::new().with_hit_points(2).build();
        let effect = EffectsFactory::with_defaults()
            .create_effect("cause wound", None)
            .unwrap();
        effect.trigger(&mut target, 0);
        assert_eq!(target.hit_points(), -3);
    }

    #[test]
    fn test_unknown_effect_is_configuration_error() {
        let factory = EffectsFactory::new();
        assert!(matches!(
            factory.create_effect("mystery", None),
            Err(CatacombError::Configuration(_))
        ));
    }

    #[test]
    fn test_effect_handle_charges() {
        let mut handle = EffectHandle::new(Trigger::OnDrink, "minor heal").with_charges(1);
        assert!(handle.has_charges());
        handle.use_charge();
        assert!(!handle.has_charges());

        let unlimited = EffectHandle::new(Trigger::OnAttackHit, "poison");
        assert!(unlimited.has_charges());
    }
}
