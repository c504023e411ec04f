//! # Game Mathematics
//!
//! Dice notation, pre-rolled dice queues and attribute modifiers.

use crate::{CatacombError, CatacombResult};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// A dice expression such as `1d6` or `2d4+1`.
///
/// # Examples
///
/// ```
/// use catacomb::Dice;
///
/// let dice: Dice = "2d4+1".parse().unwrap();
/// assert_eq!(dice, Dice::new(2, 4).with_bonus(1));
/// assert_eq!(dice.max(), 9);
/// assert_eq!(dice.min(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dice {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides on each die
    pub sides: u32,
    /// Flat bonus added to the total
    #[serde(default)]
    pub bonus: i32,
}

impl Dice {
    /// Creates a dice expression without a bonus.
    pub const fn new(count: u32, sides: u32) -> Self {
        Self {
            count,
            sides,
            bonus: 0,
        }
    }

    /// The twenty-sided die used for attack rolls.
    pub const fn d20() -> Self {
        Self::new(1, 20)
    }

    /// Returns a copy of these dice with a flat bonus.
    pub const fn with_bonus(mut self, bonus: i32) -> Self {
        self.bonus = bonus;
        self
    }

    /// Rolls the dice with the given random number generator.
    pub fn roll(&self, rng: &mut StdRng) -> i32 {
        let mut total = self.bonus;
        for _ in 0..self.count {
            if self.sides > 0 {
                total += rng.gen_range(1..=self.sides) as i32;
            }
        }
        total
    }

    /// Highest possible result.
    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.bonus
    }

    /// Lowest possible result.
    pub fn min(&self) -> i32 {
        if self.sides == 0 {
            self.bonus
        } else {
            self.count as i32 + self.bonus
        }
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bonus {
            0 => write!(f, "{}d{}", self.count, self.sides),
            b if b > 0 => write!(f, "{}d{}+{}", self.count, self.sides, b),
            b => write!(f, "{}d{}{}", self.count, self.sides, b),
        }
    }
}

impl FromStr for Dice {
    type Err = CatacombError;

    fn from_str(s: &str) -> CatacombResult<Self> {
        let invalid = || CatacombError::Configuration(format!("Invalid dice expression '{}'", s));
        let trimmed = s.trim();
        let (count, rest) = trimmed.split_once('d').ok_or_else(invalid)?;
        let (sides, bonus) = if let Some((sides, bonus)) = rest.split_once('+') {
            (sides, bonus.parse::<i32>().map_err(|_| invalid())?)
        } else if let Some((sides, bonus)) = rest.split_once('-') {
            (sides, -bonus.parse::<i32>().map_err(|_| invalid())?)
        } else {
            (rest, 0)
        };
        let count = if count.is_empty() {
            1
        } else {
            count.parse::<u32>().map_err(|_| invalid())?
        };
        let sides = sides.parse::<u32>().map_err(|_| invalid())?;

        Ok(Dice::new(count, sides).with_bonus(bonus))
    }
}

/// Queue of pre-rolled dice results.
///
/// Rules that need a roll take it from the front of the queue. Once the queue
/// runs dry the supplied random number generator is used instead, so a test
/// can fix just the first few rolls of a longer sequence.
///
/// # Examples
///
/// ```
/// use catacomb::{Dice, RollQueue};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let mut rolls = RollQueue::from(vec![17, 4]);
///
/// assert_eq!(rolls.roll(&Dice::d20(), &mut rng), 17);
/// assert_eq!(rolls.roll(&Dice::new(1, 6), &mut rng), 4);
/// let live = rolls.roll(&Dice::new(1, 6), &mut rng);
/// assert!((1..=6).contains(&live));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollQueue {
    rolls: VecDeque<i32>,
}

impl RollQueue {
    /// Creates an empty queue; every roll comes from the generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the next roll, falling back to rolling `dice` live.
    pub fn roll(&mut self, dice: &Dice, rng: &mut StdRng) -> i32 {
        match self.rolls.pop_front() {
            Some(value) => value,
            None => dice.roll(rng),
        }
    }

    /// Number of pre-rolled values left.
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }

    /// Whether all pre-rolled values have been used.
    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }
}

impl From<Vec<i32>> for RollQueue {
    fn from(rolls: Vec<i32>) -> Self {
        Self {
            rolls: rolls.into(),
        }
    }
}

/// Modifier granted by an ability score (10 and 11 give +0).
///
/// # Examples
///
/// ```
/// use catacomb::attribute_modifier;
///
/// assert_eq!(attribute_modifier(10), 0);
/// assert_eq!(attribute_modifier(18), 4);
/// assert_eq!(attribute_modifier(7), -2);
/// ```
pub fn attribute_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_dice_parsing() {
        assert_eq!("1d6".parse::<Dice>().unwrap(), Dice::new(1, 6));
        assert_eq!("d8".parse::<Dice>().unwrap(), Dice::new(1, 8));
        assert_eq!(
            "3d4-2".parse::<Dice>().unwrap(),
            Dice::new(3, 4).with_bonus(-2)
        );
        assert!("six".parse::<Dice>().is_err());
        assert!("1d".parse::<Dice>().is_err());
    }

    #[test]
    fn test_dice_display_round_trip() {
        for text in ["1d6", "2d4+1", "3d8-2"] {
            let dice: Dice = text.parse().unwrap();
            assert_eq!(dice.to_string(), text);
        }
    }

    #[test]
    fn test_dice_rolls_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(99);
        let dice = Dice::new(2, 6).with_bonus(1);
        for _ in 0..200 {
            let value = dice.roll(&mut rng);
            assert!(value >= dice.min() && value <= dice.max());
        }
    }

    #[test]
    fn test_roll_queue_is_consumed_front_to_back() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut queue = RollQueue::from(vec![1, 2, 3]);
        assert_eq!(queue.remaining(), 3);
        assert_eq!(queue.roll(&Dice::d20(), &mut rng), 1);
        assert_eq!(queue.roll(&Dice::d20(), &mut rng), 2);
        assert_eq!(queue.roll(&Dice::d20(), &mut rng), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_attribute_modifier_rounds_down() {
        assert_eq!(attribute_modifier(11), 0);
        assert_eq!(attribute_modifier(9), -1);
        assert_eq!(attribute_modifier(12), 1);
        assert_eq!(attribute_modifier(3), -4);
    }
}
