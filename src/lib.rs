//! # Catacomb
//!
//! The simulation core of a turn-based roguelike dungeon crawler.
//!
//! ## Architecture Overview
//!
//! The crate is split into two halves that only meet at the [`Level`] store:
//!
//! - **Generation**: a level is partitioned into sections, the sections are
//!   connected by a random walk, rooms and corridors are carved, and
//!   decorators post-process the tile grid. This runs once per level.
//! - **Game**: the turn scheduler picks the next actor, the actor's intent is
//!   turned into an action by the [`ActionFactory`], the action mutates the
//!   [`GameState`] and raises [`GameEvent`]s, and the effect and dying rules
//!   react to what happened.
//!
//! Presentation (windows, terminal rendering, input) lives outside this crate.
//! It reads tile grids and creatures from levels, subscribes to events, and
//! feeds player intents back as [`ActionParameters`].
//!
//! All randomness is threaded through explicitly as a `StdRng`, so tests can
//! seed or pre-roll every decision.

pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use utils::*;

/// Core error type for the Catacomb engine.
#[derive(thiserror::Error, Debug)]
pub enum CatacombError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action was executed although it is not legal
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Wiring error: unhandled action kind, unknown effect, missing generator
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Referenced character or item does not exist
    #[error("Unknown entity: {0}")]
    UnknownEntity(uuid::Uuid),
}

/// Result type used throughout the Catacomb codebase.
pub type CatacombResult<T> = Result<T, CatacombError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    /// Default level width in tiles
    pub const DEFAULT_LEVEL_WIDTH: u32 = 80;

    /// Default level height in tiles
    pub const DEFAULT_LEVEL_HEIGHT: u32 = 30;

    /// Number of events a character keeps in short-term memory
    pub const SHORT_TERM_MEMORY_SIZE: usize = 32;

    /// Number of events the game state keeps in its log
    pub const EVENT_LOG_SIZE: usize = 1024;

    /// Maximum flight distance of projectiles and targeted spells
    pub const MAX_TARGETING_RANGE: i32 = 20;

    /// Tick cost of taking a step
    pub const MOVE_COST: i32 = 2;

    /// Tick cost of a melee, unarmed or ranged attack
    pub const ATTACK_COST: i32 = 6;

    /// Tick cost of picking up, dropping, equipping or unequipping
    pub const INVENTORY_COST: i32 = 2;

    /// Tick cost of drinking a potion
    pub const DRINK_COST: i32 = 2;

    /// Tick cost of casting a spell
    pub const SPELL_COST: i32 = 6;

    /// Tick cost of studying a domain
    pub const GAIN_DOMAIN_COST: i32 = 4;

    /// Tick cost of waiting
    pub const WAIT_COST: i32 = 1;
}
