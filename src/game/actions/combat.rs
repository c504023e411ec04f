//! Unarmed, melee and ranged attacks.
//!
//! To hit, an attacker rolls d20 plus its strength modifier (dexterity for
//! ranged attacks) plus its size modifier, minus 4 when using a weapon it is
//! not proficient with. The roll must reach the target's armour class. Damage
//! is the weapon's roll plus the strength modifier, scaled by 1.5 for
//! two-handed weapons, and is always at least 1.

use super::{find_actor, illegal, require_actor, Action, ActionKind, ActionParameters, SubActionFactory};
use crate::{
    check_dying, config, AttackType, CatacombError, CatacombResult, Character, Dice, Direction,
    EffectHandle, EffectsFactory, EntityId, GameEvent, GameState, Item, Level, LevelId, Position,
    RollQueue, Trigger,
};
use log::debug;
use rand::rngs::StdRng;
use std::rc::Rc;

/// Penalty for using a weapon without proficiency.
pub const NON_PROFICIENCY_PENALTY: i32 = 4;

/// Builds attacks, choosing unarmed, melee or ranged from the attacker's
/// equipment and surroundings.
#[derive(Debug, Clone)]
pub struct AttackFactory {
    effects: Rc<EffectsFactory>,
}

impl AttackFactory {
    pub fn new(effects: Rc<EffectsFactory>) -> Self {
        Self { effects }
    }

    /// Picks the attack type for an attacker facing `direction`.
    ///
    /// Without a weapon the attack is unarmed. A launcher with matching
    /// ammunition readied shoots, unless the adjacent square holds a creature
    /// or blocks movement, in which case it is swung in melee.
    pub fn attack_type(level: &Level, attacker: &Character, direction: Direction) -> AttackType {
        let Some(weapon) = attacker.inventory.weapon_item() else {
            return AttackType::Unarmed;
        };
        let launcher_ammunition = weapon
            .weapon_data
            .as_ref()
            .and_then(|w| w.ammunition_type.as_deref());
        let readied_ammunition = attacker
            .inventory
            .projectile_item()
            .and_then(|p| p.ammunition_data.as_ref())
            .map(|a| a.ammunition_type.as_str());

        match (launcher_ammunition, readied_ammunition) {
            (Some(wanted), Some(readied)) if wanted == readied => {
                let adjacent = attacker.location.step(direction);
                if level.creature_at(adjacent).is_some() || level.blocks_movement(adjacent) {
                    AttackType::Melee
                } else {
                    AttackType::Ranged
                }
            }
            _ => AttackType::Melee,
        }
    }
}

impl SubActionFactory for AttackFactory {
    fn handled_kinds(&self) -> &'static [ActionKind] {
        &[ActionKind::Attack]
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        let ActionParameters::Attack {
            attacker,
            direction,
            rolls,
        } = parameters
        else {
            return Err(CatacombError::Configuration(format!(
                "AttackFactory cannot handle {:?}",
                parameters.kind()
            )));
        };
        let (level_id, character) = require_actor(state, attacker)?;
        let level = state
            .level(level_id)
            .ok_or_else(|| CatacombError::InvalidState(format!("Level {} missing", level_id)))?;
        let attack_type = Self::attack_type(level, character, direction);
        debug!("Attack by {} resolved as {:?}", character.name, attack_type);

        Ok(Box::new(AttackAction {
            attack_type,
            attacker,
            direction,
            rolls,
            effects: Rc::clone(&self.effects),
        }))
    }
}

/// What an attack ends up aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackTarget {
    Character(EntityId, Position),
    Wall(Position),
    Void(Position),
}

/// A single resolved attack.
#[derive(Debug, Clone)]
pub struct AttackAction {
    pub attack_type: AttackType,
    pub attacker: EntityId,
    pub direction: Direction,
    pub rolls: RollQueue,
    effects: Rc<EffectsFactory>,
}

/// Where an on-hit handle is kept, so a hit can spend its charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleSource {
    Attacker(usize),
    Item(EntityId, usize),
}

/// Numbers that decide an attack, gathered before any state changes.
struct AttackProfile {
    to_hit_bonus: i32,
    damage: Dice,
    strength_bonus: f64,
    handles: Vec<(HandleSource, EffectHandle)>,
}

fn charged_on_hit(handle: &EffectHandle) -> bool {
    handle.trigger == Trigger::OnAttackHit && handle.has_charges()
}

fn item_handles(item: &Item) -> impl Iterator<Item = (HandleSource, EffectHandle)> + '_ {
    item.effect_handles
        .iter()
        .enumerate()
        .filter(|(_, h)| charged_on_hit(h))
        .map(move |(i, h)| (HandleSource::Item(item.id, i), h.clone()))
}

impl AttackAction {
    pub fn new(
        attack_type: AttackType,
        attacker: EntityId,
        direction: Direction,
        rolls: RollQueue,
        effects: Rc<EffectsFactory>,
    ) -> Self {
        Self {
            attack_type,
            attacker,
            direction,
            rolls,
            effects,
        }
    }

    /// Finds the target: the adjacent square for close combat, or the first
    /// creature or wall along the line for ranged attacks.
    pub fn find_target(&self, level: &Level, from: Position) -> AttackTarget {
        if self.direction == Direction::Enter {
            return AttackTarget::Void(from);
        }
        let range = match self.attack_type {
            AttackType::Ranged => config::MAX_TARGETING_RANGE,
            _ => 1,
        };
        let mut current = from;
        for _ in 0..range {
            current = current.step(self.direction);
            if let Some(creature) = level.creature_id_at(current) {
                return AttackTarget::Character(creature, current);
            }
            if level.blocks_movement(current) {
                return AttackTarget::Wall(current);
            }
        }
        AttackTarget::Void(current)
    }

    fn profile(&self, attacker: &Character) -> AttackProfile {
        let weapon = attacker.inventory.weapon_item();
        let mut handles: Vec<(HandleSource, EffectHandle)> = attacker
            .effect_handles
            .iter()
            .enumerate()
            .filter(|(_, h)| charged_on_hit(h))
            .map(|(i, h)| (HandleSource::Attacker(i), h.clone()))
            .collect();
        let proficiency_penalty = match weapon.and_then(|w| w.weapon_data.as_ref().map(|d| (w, d))) {
            Some((item, data)) if !attacker.is_proficient(&item.name, data) => {
                NON_PROFICIENCY_PENALTY
            }
            _ => 0,
        };
        let size = attacker.size.modifier();

        match self.attack_type {
            AttackType::Unarmed => AttackProfile {
                to_hit_bonus: attacker.strength_modifier() + size,
                damage: attacker.unarmed_damage,
                strength_bonus: attacker.strength_modifier() as f64,
                handles,
            },
            AttackType::Melee => {
                let data = weapon.and_then(|w| w.weapon_data.as_ref());
                let multiplier = match data {
                    Some(d) if d.two_handed && !d.light => 1.5,
                    _ => 1.0,
                };
                if let Some(item) = weapon {
                    handles.extend(item_handles(item));
                }
                AttackProfile {
                    to_hit_bonus: attacker.strength_modifier() + size - proficiency_penalty,
                    damage: data.map_or(attacker.unarmed_damage, |d| d.damage),
                    strength_bonus: attacker.strength_modifier() as f64 * multiplier,
                    handles,
                }
            }
            AttackType::Ranged => {
                let ammunition = attacker
                    .inventory
                    .projectile_item()
                    .and_then(|p| p.ammunition_data.as_ref());
                if let Some(item) = attacker.inventory.projectile_item() {
                    handles.extend(item_handles(item));
                }
                AttackProfile {
                    to_hit_bonus: attacker.dexterity_modifier() + size - proficiency_penalty,
                    damage: ammunition.map_or(attacker.unarmed_damage, |a| a.damage),
                    strength_bonus: 0.0,
                    handles,
                }
            }
        }
    }

    fn spend_ammunition(&self, state: &mut GameState) -> CatacombResult<()> {
        let character = state.require_character_mut(self.attacker)?;
        let Some(id) = character.inventory.projectiles else {
            return Ok(());
        };
        let exhausted = match character
            .inventory
            .get_mut(id)
            .and_then(|item| item.ammunition_data.as_mut())
        {
            Some(data) => {
                data.count = data.count.saturating_sub(1);
                data.count == 0
            }
            None => false,
        };
        if exhausted {
            character.inventory.remove(id);
        }
        Ok(())
    }

    fn apply_hit_effects(
        &self,
        state: &mut GameState,
        handles: &[(HandleSource, EffectHandle)],
        target: EntityId,
        level: LevelId,
    ) -> CatacombResult<Vec<GameEvent>> {
        let mut events = Vec::new();
        for (_, handle) in handles {
            let effect = self.effects.create_effect(&handle.effect, Some(target))?;
            let victim = state.require_character_mut(target)?;
            if effect.is_expired() {
                events.extend(effect.trigger(victim, level));
            } else {
                events.extend(victim.add_effect(effect, level));
            }
        }
        self.spend_charges(state, handles)?;
        Ok(events)
    }

    /// Spends one charge from every handle that fired. Ammunition used up by
    /// the shot is already gone and has nothing left to spend.
    fn spend_charges(
        &self,
        state: &mut GameState,
        handles: &[(HandleSource, EffectHandle)],
    ) -> CatacombResult<()> {
        let attacker = state.require_character_mut(self.attacker)?;
        for (source, _) in handles {
            let handle = match *source {
                HandleSource::Attacker(index) => attacker.effect_handles.get_mut(index),
                HandleSource::Item(item, index) => attacker
                    .inventory
                    .get_mut(item)
                    .and_then(|i| i.effect_handles.get_mut(index)),
            };
            if let Some(handle) = handle {
                handle.use_charge();
            }
        }
        Ok(())
    }
}

impl Action for AttackAction {
    fn is_legal(&self, state: &GameState) -> bool {
        let Some((_, attacker)) = find_actor(state, self.attacker) else {
            return false;
        };
        match self.attack_type {
            AttackType::Ranged => attacker
                .inventory
                .projectile_item()
                .and_then(|p| p.ammunition_data.as_ref())
                .map_or(false, |a| a.count > 0),
            _ => true,
        }
    }

    fn execute(
        &mut self,
        state: &mut GameState,
        rng: &mut StdRng,
    ) -> CatacombResult<Vec<GameEvent>> {
        if !self.is_legal(state) {
            return Err(illegal(self));
        }
        let (level_id, attacker) = require_actor(state, self.attacker)?;
        let profile = self.profile(attacker);
        let from = attacker.location;
        let level = state
            .level(level_id)
            .ok_or_else(|| CatacombError::InvalidState(format!("Level {} missing", level_id)))?;
        let target = self.find_target(level, from);

        state
            .require_character_mut(self.attacker)?
            .add_to_tick(config::ATTACK_COST);
        if self.attack_type == AttackType::Ranged {
            self.spend_ammunition(state)?;
        }

        let (victim_id, location) = match target {
            AttackTarget::Character(id, location) => (id, location),
            AttackTarget::Wall(location) | AttackTarget::Void(location) => {
                let event = GameEvent::AttackNothing {
                    attacker: self.attacker,
                    level: level_id,
                    location,
                    attack_type: self.attack_type,
                };
                state.raise_event(event.clone());
                return Ok(vec![event]);
            }
        };

        let armour_class = state
            .character(victim_id)
            .map(Character::armour_class)
            .ok_or(CatacombError::UnknownEntity(victim_id))?;
        let to_hit = self.rolls.roll(&Dice::d20(), rng) + profile.to_hit_bonus;
        debug!("To hit {} against armour class {}", to_hit, armour_class);

        if to_hit < armour_class {
            let event = GameEvent::AttackMiss {
                attacker: self.attacker,
                target: victim_id,
                level: level_id,
                location,
                attack_type: self.attack_type,
            };
            state.raise_event(event.clone());
            return Ok(vec![event]);
        }

        let rolled = self.rolls.roll(&profile.damage, rng);
        let damage = ((rolled as f64 + profile.strength_bonus).floor() as i32).max(1);
        state.require_character_mut(victim_id)?.take_damage(damage);

        let hit = GameEvent::AttackHit {
            attacker: self.attacker,
            target: victim_id,
            level: level_id,
            location,
            damage,
            attack_type: self.attack_type,
        };
        state.raise_event(hit.clone());
        let mut events = vec![hit];

        let effect_events = self.apply_hit_effects(state, &profile.handles, victim_id, level_id)?;
        state.raise_events(&effect_events);
        events.extend(effect_events);
        events.extend(check_dying(state, victim_id)?);
        Ok(events)
    }
}
