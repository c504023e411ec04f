//! # Game Events
//!
//! Immutable records of state changes, broadcast after every action.

use crate::{EffectType, EntityId, LevelId, Position};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// How an attack was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
    Unarmed,
    Melee,
    Ranged,
}

/// Everything that can happen in the game.
///
/// Each variant carries the level it happened on so that only creatures on
/// that level hear about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Move {
        character: EntityId,
        level: LevelId,
        from: Position,
        to: Position,
    },
    PortalEntered {
        character: EntityId,
        level: LevelId,
        destination_level: LevelId,
        destination: Position,
    },
    AttackHit {
        attacker: EntityId,
        target: EntityId,
        level: LevelId,
        location: Position,
        damage: i32,
        attack_type: AttackType,
    },
    AttackMiss {
        attacker: EntityId,
        target: EntityId,
        level: LevelId,
        location: Position,
        attack_type: AttackType,
    },
    /// Attack that met only air or a wall
    AttackNothing {
        attacker: EntityId,
        level: LevelId,
        location: Position,
        attack_type: AttackType,
    },
    Death {
        character: EntityId,
        name: String,
        level: LevelId,
        location: Position,
    },
    PickUp {
        character: EntityId,
        item: EntityId,
        level: LevelId,
        location: Position,
    },
    Drop {
        character: EntityId,
        item: EntityId,
        level: LevelId,
        location: Position,
    },
    Equip {
        character: EntityId,
        item: EntityId,
        level: LevelId,
    },
    Unequip {
        character: EntityId,
        item: EntityId,
        level: LevelId,
    },
    Drink {
        character: EntityId,
        item: EntityId,
        level: LevelId,
    },
    EffectAdded {
        character: EntityId,
        level: LevelId,
        effect: String,
        effect_type: EffectType,
    },
    EffectRemoved {
        character: EntityId,
        level: LevelId,
        effect: String,
        effect_type: EffectType,
    },
    HitPointsChanged {
        character: EntityId,
        level: LevelId,
        old: i32,
        new: i32,
        cause: String,
    },
    SpellCast {
        caster: EntityId,
        level: LevelId,
        spell: String,
        targets: Vec<EntityId>,
    },
    DomainGained {
        character: EntityId,
        level: LevelId,
        domain: String,
        domain_level: u32,
    },
    Wait {
        character: EntityId,
        level: LevelId,
    },
    Escaped {
        character: EntityId,
        level: LevelId,
    },
}

impl GameEvent {
    /// Short type tag, as shown in message logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::Move { .. } => "move",
            GameEvent::PortalEntered { .. } => "portal",
            GameEvent::AttackHit { .. } => "attack hit",
            GameEvent::AttackMiss { .. } => "attack miss",
            GameEvent::AttackNothing { .. } => "attack nothing",
            GameEvent::Death { .. } => "death",
            GameEvent::PickUp { .. } => "pick up",
            GameEvent::Drop { .. } => "drop",
            GameEvent::Equip { .. } => "equip",
            GameEvent::Unequip { .. } => "unequip",
            GameEvent::Drink { .. } => "drink",
            GameEvent::EffectAdded { .. } => "effect added",
            GameEvent::EffectRemoved { .. } => "effect removed",
            GameEvent::HitPointsChanged { .. } => "hit points changed",
            GameEvent::SpellCast { .. } => "spell cast",
            GameEvent::DomainGained { .. } => "domain gained",
            GameEvent::Wait { .. } => "wait",
            GameEvent::Escaped { .. } => "escape",
        }
    }

    /// Level the event happened on.
    pub fn level(&self) -> LevelId {
        match self {
            GameEvent::Move { level, .. }
            | GameEvent::PortalEntered { level, .. }
            | GameEvent::AttackHit { level, .. }
            | GameEvent::AttackMiss { level, .. }
            | GameEvent::AttackNothing { level, .. }
            | GameEvent::Death { level, .. }
            | GameEvent::PickUp { level, .. }
            | GameEvent::Drop { level, .. }
            | GameEvent::Equip { level, .. }
            | GameEvent::Unequip { level, .. }
            | GameEvent::Drink { level, .. }
            | GameEvent::EffectAdded { level, .. }
            | GameEvent::EffectRemoved { level, .. }
            | GameEvent::HitPointsChanged { level, .. }
            | GameEvent::SpellCast { level, .. }
            | GameEvent::DomainGained { level, .. }
            | GameEvent::Wait { level, .. }
            | GameEvent::Escaped { level, .. } => *level,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::AttackHit {
                damage,
                attack_type,
                ..
            } => write!(f, "{:?} attack hit for {} damage", attack_type, damage),
            GameEvent::Death { name, location, .. } => {
                write!(f, "{} died at ({}, {})", name, location.x, location.y)
            }
            GameEvent::HitPointsChanged { old, new, cause, .. } => {
                write!(f, "{}: hit points {} -> {}", cause, old, new)
            }
            GameEvent::EffectAdded { effect, .. } => write!(f, "effect '{}' started", effect),
            GameEvent::EffectRemoved { effect, .. } => write!(f, "effect '{}' wore off", effect),
            GameEvent::SpellCast { spell, targets, .. } => {
                write!(f, "cast {} at {} target(s)", spell, targets.len())
            }
            other => f.write_str(other.event_type()),
        }
    }
}

/// Observer that is told about every raised event.
pub trait EventListener: fmt::Debug {
    fn receive_event(&mut self, event: &GameEvent);
}

/// Listener that keeps a shared, cloneable record of events.
///
/// Front ends hold one clone and hand the other to the game state.
///
/// # Examples
///
/// ```
/// use catacomb::{EventCollector, EventListener, GameEvent, new_entity_id};
///
/// let collector = EventCollector::new();
/// let mut handle = collector.clone();
/// handle.receive_event(&GameEvent::Wait { character: new_entity_id(), level: 0 });
/// assert_eq!(collector.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventCollector {
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything collected so far.
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Removes and returns the collected events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl EventListener for EventCollector {
    fn receive_event(&mut self, event: &GameEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
