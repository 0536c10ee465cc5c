//! Difficulty policy.
//!
//! The single mapping from a difficulty label to the range numbers are drawn
//! from. Both the socket and the HTTP transports answer requests through
//! [`respond`], so they cannot drift apart.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NumgenError;
use crate::protocol::{NumberPair, Response};

/// A difficulty level selecting the numeric range of a problem.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Single digit numbers.
    #[default]
    Easy,
    /// Two digit numbers.
    Medium,
    /// Three digit numbers.
    Hard,
}

impl Difficulty {
    /// Inclusive range both numbers of a pair are drawn from.
    pub fn range(self) -> RangeInclusive<u32> {
        match self {
            Difficulty::Easy => 0..=9,
            Difficulty::Medium => 10..=99,
            Difficulty::Hard => 100..=999,
        }
    }

    /// The wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = NumgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(NumgenError::InvalidDifficulty(other.to_string())),
        }
    }
}

/// Draw two independent numbers from the range of `difficulty`.
pub fn generate<R: Rng>(difficulty: Difficulty, rng: &mut R) -> NumberPair {
    let range = difficulty.range();
    NumberPair {
        number1: rng.random_range(range.clone()),
        number2: rng.random_range(range),
    }
}

/// Answer one raw request label.
pub fn respond<R: Rng>(label: &str, rng: &mut R) -> Response {
    match label.parse::<Difficulty>() {
        Ok(difficulty) => Response::Numbers(generate(difficulty, rng)),
        Err(e) => Response::Err {
            error: format!("Invalid request: {e}"),
        },
    }
}
