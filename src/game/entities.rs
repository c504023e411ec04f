//! # Entities
//!
//! Characters, items, inventories and spell books.
//!
//! Characters and items are plain data. Rules that span several entities
//! live in the action modules; the methods here only keep a single entity's
//! own invariants, like hit points never exceeding the maximum after healing.

use crate::{
    attribute_modifier, config, new_entity_id, Dice, DamageType, Effect, EffectHandle,
    EffectType, EntityId, GameEvent, LevelId, Position, Trigger,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

/// Body size; smaller creatures are harder to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl Size {
    pub fn modifier(self) -> i32 {
        match self {
            Size::Tiny => 2,
            Size::Small => 1,
            Size::Medium => 0,
            Size::Large => -1,
            Size::Huge => -2,
        }
    }
}

/// Weapon training category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponClass {
    Simple,
    Martial,
    Exotic,
}

/// Special abilities of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feat {
    /// Proficiency with a whole weapon class, or with one named weapon
    WeaponProficiency {
        class: WeaponClass,
        weapon: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub damage: Dice,
    pub damage_type: DamageType,
    pub class: WeaponClass,
    /// Light weapons get no strength bonus scaling
    pub light: bool,
    /// Two-handed weapons add one and a half times the strength bonus
    pub two_handed: bool,
    /// Launchers name the ammunition they fire
    pub ammunition_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmunitionData {
    pub ammunition_type: String,
    pub count: u32,
    pub damage: Dice,
    pub damage_type: DamageType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmourData {
    /// Added to armour class while worn
    pub armour_bonus: i32,
}

/// Anything that can lie on the floor or be carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub name: String,
    pub icon: char,
    /// `None` while carried
    pub location: Option<Position>,
    /// `None` while carried
    pub level: Option<LevelId>,
    pub weapon_data: Option<WeaponData>,
    pub ammunition_data: Option<AmmunitionData>,
    pub armour_data: Option<ArmourData>,
    /// Spell domain that can be learned by studying the item
    pub domain: Option<String>,
    pub effect_handles: Vec<EffectHandle>,
}

impl Item {
    pub fn new(name: impl Into<String>, icon: char) -> Self {
        Self {
            id: new_entity_id(),
            name: name.into(),
            icon,
            location: None,
            level: None,
            weapon_data: None,
            ammunition_data: None,
            armour_data: None,
            domain: None,
            effect_handles: Vec::new(),
        }
    }

    /// Copy of a prototype with a fresh identity.
    pub fn instantiate(&self) -> Self {
        Self {
            id: new_entity_id(),
            location: None,
            level: None,
            ..self.clone()
        }
    }

    pub fn is_ammunition(&self) -> bool {
        self.ammunition_data.is_some()
    }

    pub fn effect_handles_for(&self, trigger: Trigger) -> impl Iterator<Item = &EffectHandle> {
        self.effect_handles
            .iter()
            .filter(move |h| h.trigger == trigger)
    }
}

/// Items carried by a character and the equipment slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Item>,
    pub weapon: Option<EntityId>,
    pub projectiles: Option<EntityId>,
    pub armour: Option<EntityId>,
}

impl Inventory {
    pub fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Takes an item out of the pack, clearing any slot it filled.
    pub fn remove(&mut self, id: EntityId) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == id)?;
        for slot in [&mut self.weapon, &mut self.projectiles, &mut self.armour] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: EntityId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn weapon_item(&self) -> Option<&Item> {
        self.weapon.and_then(|id| self.get(id))
    }

    pub fn projectile_item(&self) -> Option<&Item> {
        self.projectiles.and_then(|id| self.get(id))
    }

    pub fn armour_item(&self) -> Option<&Item> {
        self.armour.and_then(|id| self.get(id))
    }

    /// Ids of every item in a slot.
    pub fn equipped(&self) -> Vec<EntityId> {
        [self.weapon, self.projectiles, self.armour]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn is_equipped(&self, id: EntityId) -> bool {
        self.equipped().contains(&id)
    }

    /// Ammunition stack with the given item name, if one is carried.
    pub fn ammunition_stack_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.items
            .iter_mut()
            .find(|i| i.is_ammunition() && i.name == name)
    }
}

/// Spell known by a character, gated by a domain level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellEntry {
    pub name: String,
    pub domain: String,
    pub level: u32,
}

/// Domains studied by a character and the spells they unlock.
///
/// # Examples
///
/// ```
/// use catacomb::{SpellBook, SpellEntry};
///
/// let mut book = SpellBook::default();
/// book.add_spell(SpellEntry { name: "fireball".into(), domain: "fire".into(), level: 2 });
/// book.add_domain_level("fire", 1);
/// assert!(book.known_spells().is_empty());
///
/// book.add_domain_level("fire", 1);
/// assert_eq!(book.known_spells().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpellBook {
    domains: HashMap<String, u32>,
    spells: Vec<SpellEntry>,
}

impl SpellBook {
    pub fn add_spell(&mut self, spell: SpellEntry) {
        self.spells.push(spell);
    }

    /// Raises the level of a domain, returning the new level.
    pub fn add_domain_level(&mut self, domain: &str, amount: u32) -> u32 {
        let level = self.domains.entry(domain.to_string()).or_insert(0);
        *level += amount;
        *level
    }

    pub fn domain_level(&self, domain: &str) -> u32 {
        self.domains.get(domain).copied().unwrap_or(0)
    }

    pub fn known_spells(&self) -> Vec<&SpellEntry> {
        self.spells
            .iter()
            .filter(|s| s.level <= self.domain_level(&s.domain))
            .collect()
    }

    pub fn knows_spell(&self, name: &str) -> bool {
        self.known_spells().iter().any(|s| s.name == name)
    }
}

/// A creature or the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: EntityId,
    pub name: String,
    pub icon: char,
    pub attributes: Attributes,
    hit_points: i32,
    pub max_hp: i32,
    pub spirit: i32,
    pub max_spirit: i32,
    /// Multiplier for the time cost of actions; lower is faster
    pub speed: i32,
    pub size: Size,
    /// Damage dealt when fighting without a weapon
    pub unarmed_damage: Dice,
    pub inventory: Inventory,
    /// Only meaningful while `level` is set; changed through the level store
    pub location: Position,
    pub level: Option<LevelId>,
    /// Scheduling clock; the character acts when it reaches zero
    pub tick: i32,
    pub short_term_memory: VecDeque<GameEvent>,
    effects: Vec<Effect>,
    pub effect_handles: Vec<EffectHandle>,
    pub feats: Vec<Feat>,
    pub spellbook: SpellBook,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            name: name.into(),
            icon: '@',
            attributes: Attributes::default(),
            hit_points: 10,
            max_hp: 10,
            spirit: 5,
            max_spirit: 5,
            speed: 1,
            size: Size::Medium,
            unarmed_damage: Dice::new(1, 3),
            inventory: Inventory::default(),
            location: Position::origin(),
            level: None,
            tick: 0,
            short_term_memory: VecDeque::new(),
            effects: Vec::new(),
            effect_handles: Vec::new(),
            feats: Vec::new(),
            spellbook: SpellBook::default(),
        }
    }

    /// Copy of a prototype with fresh identities for it and everything it
    /// carries. Equipment slots follow their items.
    pub fn instantiate(&self) -> Self {
        let mut inventory = Inventory::default();
        for item in self.inventory.items() {
            let copy = item.instantiate();
            let slot = |equipped: Option<EntityId>| (equipped == Some(item.id)).then_some(copy.id);
            inventory.weapon = inventory.weapon.or(slot(self.inventory.weapon));
            inventory.projectiles = inventory.projectiles.or(slot(self.inventory.projectiles));
            inventory.armour = inventory.armour.or(slot(self.inventory.armour));
            inventory.add(copy);
        }
        Self {
            id: new_entity_id(),
            inventory,
            level: None,
            short_term_memory: VecDeque::new(),
            ..self.clone()
        }
    }

    pub fn hit_points(&self) -> i32 {
        self.hit_points
    }

    /// Sets hit points directly, without clamping.
    pub fn set_hit_points(&mut self, hit_points: i32) {
        self.hit_points = hit_points;
    }

    /// Restores hit points, never above `max_hp`.
    pub fn heal(&mut self, amount: i32) {
        if self.hit_points < self.max_hp {
            self.hit_points = (self.hit_points + amount).min(self.max_hp);
        }
    }

    /// Reduces hit points; the result may go negative.
    pub fn take_damage(&mut self, amount: i32) {
        self.hit_points -= amount;
    }

    pub fn is_dead(&self) -> bool {
        self.hit_points <= 0
    }

    /// Adds the cost of an action to the tick, scaled by speed.
    pub fn add_to_tick(&mut self, cost: i32) {
        self.tick += self.speed * cost;
    }

    pub fn strength_modifier(&self) -> i32 {
        attribute_modifier(self.attributes.strength)
    }

    pub fn dexterity_modifier(&self) -> i32 {
        attribute_modifier(self.attributes.dexterity)
    }

    /// Number an attack roll must reach to hit this character.
    pub fn armour_class(&self) -> i32 {
        let armour = self
            .inventory
            .armour_item()
            .and_then(|i| i.armour_data)
            .map_or(0, |a| a.armour_bonus);
        10 + self.size.modifier() + self.dexterity_modifier() + armour
    }

    /// Whether a feat covers the given weapon.
    pub fn is_proficient(&self, weapon_name: &str, weapon: &WeaponData) -> bool {
        self.feats.iter().any(|feat| match feat {
            Feat::WeaponProficiency { class, weapon: None } => *class == weapon.class,
            Feat::WeaponProficiency {
                class,
                weapon: Some(name),
            } => *class == weapon.class && name == weapon_name,
        })
    }

    // Effects

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn has_effect_type(&self, effect_type: EffectType) -> bool {
        self.effects.iter().any(|e| e.effect_type() == effect_type)
    }

    /// Starts an effect unless one of the same type is already active.
    ///
    /// Returns the event to raise, or `None` when the effect was rejected.
    pub fn add_effect(&mut self, effect: Effect, level: LevelId) -> Option<GameEvent> {
        let effect_type = effect.effect_type();
        if self.has_effect_type(effect_type) {
            debug!("{} already has a {:?} effect", self.name, effect_type);
            return None;
        }
        let event = GameEvent::EffectAdded {
            character: self.id,
            level,
            effect: effect.name.clone(),
            effect_type,
        };
        self.effects.push(effect);
        Some(event)
    }

    /// Drops every expired effect and reports each removal.
    pub fn remove_expired_effects(&mut self, level: LevelId) -> Vec<GameEvent> {
        let (expired, active): (Vec<Effect>, Vec<Effect>) =
            std::mem::take(&mut self.effects)
                .into_iter()
                .partition(Effect::is_expired);
        self.effects = active;
        expired
            .into_iter()
            .map(|effect| GameEvent::EffectRemoved {
                character: self.id,
                level,
                effect_type: effect.effect_type(),
                effect: effect.name,
            })
            .collect()
    }

    /// Advances every active effect by one tick and removes the expired ones.
    pub fn advance_effects(&mut self, level: LevelId) -> Vec<GameEvent> {
        let mut active = std::mem::take(&mut self.effects);
        let mut events = Vec::new();
        for effect in active.iter_mut() {
            events.extend(effect.advance(self, level));
        }
        self.effects = active;
        events.extend(self.remove_expired_effects(level));
        events
    }

    /// Remembers an event, forgetting the oldest when memory is full.
    pub fn receive_event(&mut self, event: &GameEvent) {
        if self.short_term_memory.len() >= config::SHORT_TERM_MEMORY_SIZE {
            self.short_term_memory.pop_front();
        }
        self.short_term_memory.push_back(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectsFactory, ItemBuilder};

    #[test]
    fn test_character_defaults() {
        let character = Character::new("Pete");
        assert_eq!(character.hit_points(), 10);
        assert_eq!(character.max_hp, 10);
        assert_eq!(character.speed, 1);
        assert_eq!(character.tick, 0);
        assert_eq!(character.armour_class(), 10);
    }

    #[test]
    fn test_add_to_tick_scales_with_speed() {
        let mut character = Character::new("Slowpoke");
        character.speed = 3;
        character.add_to_tick(2);
        assert_eq!(character.tick, 6);
    }

    #[test]
    fn test_effects_do_not_stack() {
        let factory = EffectsFactory::with_defaults();
        let mut character = Character::new("Target");
        let first = factory.create_effect("poison", Some(character.id)).unwrap();
        let second = factory.create_effect("poison", Some(character.id)).unwrap();

        assert!(character.add_effect(first, 0).is_some());
        assert!(character.add_effect(second, 0).is_none());
        assert_eq!(character.effects().len(), 1);
    }

    #[test]
    fn test_expired_effect_raises_add_and_removal_events() {
        let factory = EffectsFactory::with_defaults();
        let mut character = Character::new("Target");
        let mut events = Vec::new();
        let mut effect = factory.create_effect("poison", None).unwrap();
        effect.duration = 0;
        effect.tick = 10;
        effect.frequency = 10;

        events.extend(character.add_effect(effect, 0));
        events.extend(character.remove_expired_effects(0));

        assert_eq!(events.len(), 2);
        assert!(character.effects().is_empty());
    }

    #[test]
    fn test_inventory_remove_clears_slots() {
        let mut inventory = Inventory::default();
        let sword = ItemBuilder::new().with_name("sword").build();
        let id = sword.id;
        inventory.add(sword);
        inventory.weapon = Some(id);

        assert!(inventory.is_equipped(id));
        assert!(inventory.remove(id).is_some());
        assert_eq!(inventory.weapon, None);
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_armour_adds_to_armour_class() {
        let mut character = Character::new("Knight");
        let mail = ItemBuilder::new()
            .with_name("chain mail")
            .with_armour_bonus(4)
            .build();
        let id = mail.id;
        character.inventory.add(mail);
        character.inventory.armour = Some(id);
        assert_eq!(character.armour_class(), 14);
    }

    #[test]
    fn test_short_term_memory_is_capped() {
        let mut character = Character::new("Forgetful");
        for _ in 0..(config::SHORT_TERM_MEMORY_SIZE + 5) {
            character.receive_event(&GameEvent::Wait {
                character: character.id,
                level: 0,
            });
        }
        assert_eq!(
            character.short_term_memory.len(),
            config::SHORT_TERM_MEMORY_SIZE
        );
    }

    #[test]
    fn test_proficiency() {
        let mut character = Character::new("Fighter");
        let axe = WeaponData {
            damage: Dice::new(1, 8),
            damage_type: DamageType::Slashing,
            class: WeaponClass::Martial,
            light: false,
            two_handed: false,
            ammunition_type: None,
        };
        assert!(!character.is_proficient("axe", &axe));

        character.feats.push(Feat::WeaponProficiency {
            class: WeaponClass::Martial,
            weapon: None,
        });
        assert!(character.is_proficient("axe", &axe));
    }
}
