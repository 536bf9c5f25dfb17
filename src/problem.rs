use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::ConfigurationError;
use crate::scorer;

/// Binary operator folded across the flashed operands
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "×")]
    Mul,
    #[strum(serialize = "÷")]
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    /// Apply the operator to a running value.
    ///
    /// Division by zero yields `None`; the caller decides what that means.
    pub fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Operator::Add => Some(lhs + rhs),
            Operator::Sub => Some(lhs - rhs),
            Operator::Mul => Some(lhs * rhs),
            Operator::Div => {
                if rhs == 0.0 {
                    None
                } else {
                    Some(lhs / rhs)
                }
            }
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|op| *op == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|op| *op == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// One generated exercise: the operands in reveal order and the operator
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub operands: Vec<u128>,
    pub operator: Operator,
}

impl Problem {
    pub fn new(operands: Vec<u128>, operator: Operator) -> Self {
        Self { operands, operator }
    }

    pub fn len(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    /// Integer result for `+`, `-` and `×`; division has none
    pub fn exact_expected(&self) -> Option<i128> {
        scorer::evaluate_exact(&self.operands, self.operator)
    }

    /// Expected answer before any display rounding. Integer results are
    /// converted to `f64` once, after the fold.
    pub fn expected(&self) -> f64 {
        if let Some(exact) = self.exact_expected() {
            return exact as f64;
        }
        let values: Vec<f64> = self.operands.iter().map(|&n| n as f64).collect();
        scorer::evaluate(&values, self.operator)
    }

    /// The expected answer as shown to the player
    pub fn expected_text(&self) -> String {
        match self.exact_expected() {
            Some(exact) => exact.to_string(),
            None => scorer::format_number(self.expected()),
        }
    }

    pub fn expression_text(&self) -> String {
        scorer::expression_text(&self.operands, self.operator, &self.expected_text())
    }
}

/// Draw one operand: first a digit width, then a value of that width.
///
/// Widths are uniform per position, values are uniform only within a width.
pub fn draw_operand<R: Rng + ?Sized>(rng: &mut R, min_digits: u32, max_digits: u32) -> u128 {
    let digits = rng.gen_range(min_digits..=max_digits);
    let low = 10u128.pow(digits - 1);
    let high = 10u128.pow(digits) - 1;
    rng.gen_range(low..=high)
}

/// Build a problem for the given settings.
///
/// For division the first operand is the product of an initial draw and
/// every later operand, so the left-to-right quotient is the initial draw.
pub fn generate_problem<R: Rng + ?Sized>(
    settings: &Settings,
    rng: &mut R,
) -> Result<Problem, ConfigurationError> {
    settings.validate()?;

    let (min, max) = (settings.min_digits, settings.max_digits);
    let mut operands: Vec<u128> = (0..settings.term_count)
        .map(|_| draw_operand(rng, min, max))
        .collect();

    if settings.operator == Operator::Div {
        let mut product = operands[0];
        for slot in operands.iter_mut().skip(1) {
            let divisor = draw_operand(rng, min, max);
            product *= divisor;
            *slot = divisor;
        }
        operands[0] = product;
    }

    Ok(Problem::new(operands, settings.operator))
}

/// Number of decimal digits in `n`
pub fn digit_count(n: u128) -> u32 {
    n.checked_ilog10().map_or(1, |log| log + 1)
}
