use itertools::Itertools;

use crate::problem::Operator;

/// Answers within this distance of the expected value count as correct
pub const TOLERANCE: f64 = 0.01;

/// Left-fold `operator` across `operands`.
///
/// Division by zero short-circuits to positive infinity and the remaining
/// operands are not applied. An empty slice evaluates to zero.
pub fn evaluate(operands: &[f64], operator: Operator) -> f64 {
    let Some((&first, rest)) = operands.split_first() else {
        return 0.0;
    };

    let mut result = first;
    for &n in rest {
        match operator.apply(result, n) {
            Some(value) => result = value,
            None => return f64::INFINITY,
        }
    }
    result
}

/// Exact left fold for `+`, `-` and `×`.
///
/// `None` for division, an empty slice, or a value outside `i128`.
pub fn evaluate_exact(operands: &[u128], operator: Operator) -> Option<i128> {
    let (&first, rest) = operands.split_first()?;
    let mut result = i128::try_from(first).ok()?;
    for &n in rest {
        let n = i128::try_from(n).ok()?;
        result = match operator {
            Operator::Add => result.checked_add(n)?,
            Operator::Sub => result.checked_sub(n)?,
            Operator::Mul => result.checked_mul(n)?,
            Operator::Div => return None,
        };
    }
    Some(result)
}

pub fn is_correct(submitted: f64, expected: f64) -> bool {
    (submitted - expected).abs() < TOLERANCE
}

/// Round to two decimal places, halves to even
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round_ties_even() / 100.0
    } else {
        value
    }
}

/// Render a value for display: whole numbers without a fraction, others
/// with at most two decimals.
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value.is_nan() {
        return "NaN".to_string();
    }

    let rounded = round2(value);
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}

/// `a op b op c = result`
pub fn expression_text(operands: &[u128], operator: Operator, result: &str) -> String {
    let separator = format!(" {operator} ");
    format!("{} = {}", operands.iter().join(&separator), result)
}
