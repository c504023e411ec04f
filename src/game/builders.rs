//! # Builders
//!
//! Fluent builders for characters, items and levels.
//!
//! They are used by the generators to describe prototypes and by tests to set
//! up exactly the situation under test.

use crate::{
    AmmunitionData, ArmourData, Attributes, Character, DamageType, Dice, EffectHandle, Feat,
    Item, Level, LevelId, Position, Size, SpellEntry, TileId, WeaponClass, WeaponData,
};

/// Builds a [`Character`] with sensible defaults.
///
/// # Examples
///
/// ```
/// use catacomb::CharacterBuilder;
///
/// let goblin = CharacterBuilder::new()
///     .with_name("goblin")
///     .with_hit_points(4)
///     .with_speed(2)
///     .build();
/// assert_eq!(goblin.hit_points(), 4);
/// assert_eq!(goblin.max_hp, 10);
/// ```
#[derive(Debug, Clone)]
pub struct CharacterBuilder {
    character: Character,
    items: Vec<Item>,
    weapon: Option<Item>,
}

impl CharacterBuilder {
    pub fn new() -> Self {
        Self {
            character: Character::new("prototype"),
            items: Vec::new(),
            weapon: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.character.name = name.to_string();
        self
    }

    pub fn with_icon(mut self, icon: char) -> Self {
        self.character.icon = icon;
        self
    }

    pub fn with_hit_points(mut self, hit_points: i32) -> Self {
        self.character.set_hit_points(hit_points);
        self
    }

    pub fn with_max_hp(mut self, max_hp: i32) -> Self {
        self.character.max_hp = max_hp;
        self
    }

    pub fn with_spirit(mut self, spirit: i32) -> Self {
        self.character.spirit = spirit;
        self.character.max_spirit = self.character.max_spirit.max(spirit);
        self
    }

    pub fn with_speed(mut self, speed: i32) -> Self {
        self.character.speed = speed;
        self
    }

    pub fn with_tick(mut self, tick: i32) -> Self {
        self.character.tick = tick;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.character.size = size;
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.character.attributes = attributes;
        self
    }

    pub fn with_strength(mut self, strength: i32) -> Self {
        self.character.attributes.strength = strength;
        self
    }

    pub fn with_dexterity(mut self, dexterity: i32) -> Self {
        self.character.attributes.dexterity = dexterity;
        self
    }

    pub fn with_unarmed_damage(mut self, damage: Dice) -> Self {
        self.character.unarmed_damage = damage;
        self
    }

    pub fn with_location(mut self, location: Position) -> Self {
        self.character.location = location;
        self
    }

    pub fn with_effect_handle(mut self, handle: EffectHandle) -> Self {
        self.character.effect_handles.push(handle);
        self
    }

    pub fn with_feat(mut self, feat: Feat) -> Self {
        self.character.feats.push(feat);
        self
    }

    /// Adds a spell and enough domain levels to know it.
    pub fn with_spell(mut self, name: &str, domain: &str, level: u32) -> Self {
        self.character.spellbook.add_spell(SpellEntry {
            name: name.to_string(),
            domain: domain.to_string(),
            level,
        });
        let missing = level.saturating_sub(self.character.spellbook.domain_level(domain));
        if missing > 0 {
            self.character.spellbook.add_domain_level(domain, missing);
        }
        self
    }

    pub fn with_domain_level(mut self, domain: &str, level: u32) -> Self {
        self.character.spellbook.add_domain_level(domain, level);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Carries and wields the given weapon.
    pub fn with_weapon(mut self, item: Item) -> Self {
        self.weapon = Some(item);
        self
    }

    pub fn build(self) -> Character {
        let mut character = self.character;
        for item in self.items {
            character.inventory.add(item);
        }
        if let Some(weapon) = self.weapon {
            character.inventory.weapon = Some(weapon.id);
            character.inventory.add(weapon);
        }
        character
    }
}

impl Default for CharacterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds an [`Item`].
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    pub fn new() -> Self {
        Self {
            item: Item::new("prototype", '?'),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.item.name = name.to_string();
        self
    }

    pub fn with_icon(mut self, icon: char) -> Self {
        self.item.icon = icon;
        self
    }

    pub fn with_effect(mut self, handle: EffectHandle) -> Self {
        self.item.effect_handles.push(handle);
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.item.domain = Some(domain.to_string());
        self
    }

    pub fn with_weapon_data(mut self, data: WeaponData) -> Self {
        self.item.weapon_data = Some(data);
        self
    }

    /// One-handed simple weapon with the given damage.
    pub fn with_damage(mut self, damage: Dice, damage_type: DamageType) -> Self {
        self.item.weapon_data = Some(WeaponData {
            damage,
            damage_type,
            class: WeaponClass::Simple,
            light: false,
            two_handed: false,
            ammunition_type: None,
        });
        self
    }

    /// Launcher firing the named ammunition type.
    pub fn with_launcher(mut self, damage: Dice, ammunition_type: &str) -> Self {
        self.item.weapon_data = Some(WeaponData {
            damage,
            damage_type: DamageType::Crushing,
            class: WeaponClass::Simple,
            light: false,
            two_handed: true,
            ammunition_type: Some(ammunition_type.to_string()),
        });
        self
    }

    pub fn with_ammunition(
        mut self,
        ammunition_type: &str,
        count: u32,
        damage: Dice,
        damage_type: DamageType,
    ) -> Self {
        self.item.ammunition_data = Some(AmmunitionData {
            ammunition_type: ammunition_type.to_string(),
            count,
            damage,
            damage_type,
        });
        self
    }

    pub fn with_armour_bonus(mut self, armour_bonus: i32) -> Self {
        self.item.armour_data = Some(ArmourData { armour_bonus });
        self
    }

    pub fn build(self) -> Item {
        self.item
    }
}

impl Default for ItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds an open [`Level`] with optional walls and occupants.
///
/// # Examples
///
/// ```
/// use catacomb::{CharacterBuilder, LevelBuilder, Position};
///
/// let level = LevelBuilder::new()
///     .with_size(10, 10)
///     .with_wall_at(Position::new(4, 4))
///     .with_character(CharacterBuilder::new().build(), Position::new(1, 1))
///     .build()
///     .unwrap();
/// assert!(level.blocks_movement(Position::new(4, 4)));
/// assert_eq!(level.creatures().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct LevelBuilder {
    id: LevelId,
    width: u32,
    height: u32,
    floor_tile: TileId,
    empty_wall: TileId,
    solid_wall: TileId,
    walls: Vec<Position>,
    characters: Vec<(Character, Position)>,
    items: Vec<(Item, Position)>,
}

impl LevelBuilder {
    pub fn new() -> Self {
        Self {
            id: 0,
            width: 20,
            height: 20,
            floor_tile: TileId::FLOOR_ROCK,
            empty_wall: TileId::WALL_EMPTY,
            solid_wall: TileId::WALL_ROCK,
            walls: Vec::new(),
            characters: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: LevelId) -> Self {
        self.id = id;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_floor_tile(mut self, tile: TileId) -> Self {
        self.floor_tile = tile;
        self
    }

    pub fn with_wall_tile(mut self, tile: TileId) -> Self {
        self.solid_wall = tile;
        self
    }

    pub fn with_wall_at(mut self, location: Position) -> Self {
        self.walls.push(location);
        self
    }

    pub fn with_character(mut self, character: Character, location: Position) -> Self {
        self.characters.push((character, location));
        self
    }

    pub fn with_item(mut self, item: Item, location: Position) -> Self {
        self.items.push((item, location));
        self
    }

    pub fn build(self) -> crate::CatacombResult<Level> {
        let mut level = Level::new(self.width, self.height, self.floor_tile, self.empty_wall);
        level.id = self.id;
        for wall in self.walls {
            level.set_wall(wall, self.solid_wall);
        }
        for (character, location) in self.characters {
            level.add_creature(character, location)?;
        }
        for (item, location) in self.items {
            level.add_item(item, location);
        }
        Ok(level)
    }
}

impl Default for LevelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
