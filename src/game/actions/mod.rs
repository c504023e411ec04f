//! # Actions
//!
//! Turning intents into validated changes of the game state.
//!
//! A player's input or a monster's AI produces [`ActionParameters`]. The
//! [`ActionFactory`] hands them to the sub-factory registered for their kind,
//! which builds a concrete [`Action`]. Callers then check
//! [`Action::is_legal`] and, if the action is legal, call
//! [`Action::execute`] exactly once.
//!
//! ```
//! use catacomb::*;
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::rc::Rc;
//!
//! let hero = CharacterBuilder::new().build();
//! let hero_id = hero.id;
//! let level = LevelBuilder::new()
//!     .with_character(hero, Position::new(5, 5))
//!     .build()
//!     .unwrap();
//! let mut state = GameState::with_level(level);
//! let factory = ActionFactory::with_defaults(Rc::new(EffectsFactory::with_defaults()));
//! let mut rng = StdRng::seed_from_u64(1);
//!
//! let events = factory
//!     .perform(ActionParameters::Move { character: hero_id, direction: Direction::East }, &mut state, &mut rng)
//!     .unwrap()
//!     .expect("moving into open floor is legal");
//! assert_eq!(events[0].event_type(), "move");
//! assert_eq!(state.character(hero_id).unwrap().location, Position::new(6, 5));
//! ```

pub mod combat;
pub mod consume;
pub mod inventory;
pub mod magic;
pub mod moving;
pub mod wait;

pub use combat::*;
pub use consume::*;
pub use inventory::*;
pub use magic::*;
pub use moving::*;
pub use wait::*;

use crate::{
    CatacombError, CatacombResult, Character, Direction, EffectsFactory, EntityId, GameEvent,
    GameState, LevelId, RollQueue,
};
use log::debug;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Kind tag of an intent, used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Move,
    Attack,
    Drink,
    PickUp,
    Drop,
    Equip,
    Unequip,
    SpellCast,
    GainDomain,
    Wait,
    Escape,
}

/// An intent together with everything needed to carry it out.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionParameters {
    Move {
        character: EntityId,
        direction: Direction,
    },
    Attack {
        attacker: EntityId,
        direction: Direction,
        /// Pre-rolled dice for deterministic tests
        rolls: RollQueue,
    },
    Drink {
        character: EntityId,
        item: EntityId,
    },
    PickUp {
        character: EntityId,
        item: EntityId,
    },
    Drop {
        character: EntityId,
        item: EntityId,
    },
    Equip {
        character: EntityId,
        item: EntityId,
    },
    Unequip {
        character: EntityId,
        item: EntityId,
    },
    SpellCast {
        caster: EntityId,
        direction: Direction,
        spell: String,
    },
    GainDomain {
        character: EntityId,
        item: EntityId,
        domain: String,
    },
    Wait {
        character: EntityId,
    },
    Escape {
        character: EntityId,
    },
}

impl ActionParameters {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionParameters::Move { .. } => ActionKind::Move,
            ActionParameters::Attack { .. } => ActionKind::Attack,
            ActionParameters::Drink { .. } => ActionKind::Drink,
            ActionParameters::PickUp { .. } => ActionKind::PickUp,
            ActionParameters::Drop { .. } => ActionKind::Drop,
            ActionParameters::Equip { .. } => ActionKind::Equip,
            ActionParameters::Unequip { .. } => ActionKind::Unequip,
            ActionParameters::SpellCast { .. } => ActionKind::SpellCast,
            ActionParameters::GainDomain { .. } => ActionKind::GainDomain,
            ActionParameters::Wait { .. } => ActionKind::Wait,
            ActionParameters::Escape { .. } => ActionKind::Escape,
        }
    }

    /// Character performing the action.
    pub fn actor(&self) -> EntityId {
        match self {
            ActionParameters::Move { character, .. }
            | ActionParameters::Drink { character, .. }
            | ActionParameters::PickUp { character, .. }
            | ActionParameters::Drop { character, .. }
            | ActionParameters::Equip { character, .. }
            | ActionParameters::Unequip { character, .. }
            | ActionParameters::GainDomain { character, .. }
            | ActionParameters::Wait { character }
            | ActionParameters::Escape { character } => *character,
            ActionParameters::Attack { attacker, .. } => *attacker,
            ActionParameters::SpellCast { caster, .. } => *caster,
        }
    }
}

/// A single, fully resolved command.
pub trait Action: fmt::Debug {
    /// Checks whether the action may be executed. Never changes state.
    fn is_legal(&self, state: &GameState) -> bool;

    /// Carries the action out, raises its events and returns them.
    ///
    /// Returns [`CatacombError::InvalidAction`] when called on an illegal
    /// action.
    fn execute(&mut self, state: &mut GameState, rng: &mut StdRng)
        -> CatacombResult<Vec<GameEvent>>;
}

/// Builds actions for the kinds it declares.
pub trait SubActionFactory: fmt::Debug {
    /// Kinds this factory is registered for.
    fn handled_kinds(&self) -> &'static [ActionKind];

    fn can_handle(&self, parameters: &ActionParameters) -> bool {
        self.handled_kinds().contains(&parameters.kind())
    }

    fn get_action(
        &self,
        parameters: ActionParameters,
        state: &GameState,
    ) -> CatacombResult<Box<dyn Action>>;
}

/// Dispatches intents to sub-factories.
///
/// Each kind goes to the first registered factory that claims it.
#[derive(Debug, Default)]
pub struct ActionFactory {
    factories: Vec<Box<dyn SubActionFactory>>,
    table: HashMap<ActionKind, usize>,
}

impl ActionFactory {
    /// Creates a factory with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with every built-in action registered.
    pub fn with_defaults(effects: Rc<EffectsFactory>) -> Self {
        Self::new()
            .with_factory(MoveFactory)
            .with_factory(EscapeFactory)
            .with_factory(AttackFactory::new(Rc::clone(&effects)))
            .with_factory(DrinkFactory::new(Rc::clone(&effects)))
            .with_factory(InventoryFactory)
            .with_factory(SpellCastingFactory::new(
                Rc::new(SpellGenerator::new()),
                effects,
            ))
            .with_factory(GainDomainFactory)
            .with_factory(WaitFactory)
    }

    pub fn with_factory(mut self, factory: impl SubActionFactory + 'static) -> Self {
        self.add_factory(Box::new(factory));
        self
    }

    /// Registers a sub-factory after the existing ones.
    pub fn add_factory(&mut self, factory: Box<dyn SubActionFactory>) {
        let index = self.factories.len();
        for kind in factory.handled_kinds() {
            self.table.entry(*kind).or_insert(index);
        }
        self.factories.push(factory);
    }

    /// Builds the action for the given intent.
    ///
    /// A kind without a registered factory is a wiring mistake and is
    /// reported as [`CatacombError::Configuration`].
    pub fn get_action(
        &self,
        parameters: ActionParameters,
        state: &GameState,
    ) -> CatacombResult<Box<dyn Action>> {
        let kind = parameters.kind();
        let index = self
            .table
            .get(&kind)
            .copied()
            .filter(|i| self.factories[*i].can_handle(&parameters))
            .or_else(|| self.factories.iter().position(|f| f.can_handle(&parameters)))
            .ok_or_else(|| {
                CatacombError::Configuration(format!("No factory handles {:?} actions", kind))
            })?;
        debug!("Dispatching {:?} to {:?}", kind, self.factories[index]);
        self.factories[index].get_action(parameters, state)
    }

    /// Builds the action and executes it if it is legal.
    ///
    /// Returns `Ok(None)` when the intent is not legal right now.
    pub fn perform(
        &self,
        parameters: ActionParameters,
        state: &mut GameState,
        rng: &mut StdRng,
    ) -> CatacombResult<Option<Vec<GameEvent>>> {
        let mut action = self.get_action(parameters, state)?;
        if !action.is_legal(state) {
            debug!("Illegal action rejected: {:?}", action);
            return Ok(None);
        }
        action.execute(state, rng).map(Some)
    }
}

/// Finds a character and the level it stands on.
pub(crate) fn find_actor(state: &GameState, id: EntityId) -> Option<(LevelId, &Character)> {
    let level = state.locate_character(id)?;
    let character = state.level(level)?.creature(id)?;
    Some((level, character))
}

pub(crate) fn require_actor(state: &GameState, id: EntityId) -> CatacombResult<(LevelId, &Character)> {
    find_actor(state, id).ok_or(CatacombError::UnknownEntity(id))
}

pub(crate) fn illegal(action: &dyn fmt::Debug) -> CatacombError {
    CatacombError::InvalidAction(format!("{:?} is not legal", action))
}
