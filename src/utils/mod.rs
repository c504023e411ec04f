//! # Utilities Module
//!
//! Dice rolling, geometry and reachability helpers shared by generation and rules.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use self::pathfinding::*;
