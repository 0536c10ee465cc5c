//! Math problems built from number pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::NumberSource;
use crate::error::Result;
use crate::policy::Difficulty;
use crate::protocol::NumberPair;

/// Operator joining the two numbers of a problem.
///
/// Only addition is offered to players so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// `a + b`
    #[default]
    Add,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Add => f.write_str("+"),
        }
    }
}

/// A problem as handed to the game front end.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MathProblem {
    /// Display string, e.g. `"3 + 7"`.
    pub math_problem: String,
    /// Normalized label of the requested difficulty.
    pub difficulty: String,
}

/// `"{number1} {op} {number2}"`
pub fn format_problem(pair: NumberPair, op: Operator) -> String {
    format!("{} {} {}", pair.number1, op, pair.number2)
}

/// Fetch numbers for `difficulty` (easy when absent) and build an addition problem.
pub fn solve(source: &dyn NumberSource, difficulty: Option<&str>) -> Result<MathProblem> {
    let difficulty = match difficulty {
        Some(label) => label.parse::<Difficulty>()?,
        None => Difficulty::default(),
    };
    let pair = source.fetch(difficulty.as_str())?;
    Ok(MathProblem {
        math_problem: format_problem(pair, Operator::Add),
        difficulty: difficulty.as_str().to_string(),
    })
}
