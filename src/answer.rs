use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

const FULL_WIDTH: &str = "０１２３４５６７８９．";
const HALF_WIDTH: &str = "0123456789.";

/// How answer keystrokes are collected
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    /// digits, a single decimal point and a leading minus, like a number pad
    #[default]
    #[strum(serialize = "keypad")]
    Keypad,
    /// any text, normalized and parsed on submit
    #[strum(serialize = "free text")]
    FreeText,
}

impl InputMode {
    pub fn toggle(self) -> Self {
        match self {
            InputMode::Keypad => InputMode::FreeText,
            InputMode::FreeText => InputMode::Keypad,
        }
    }
}

fn to_half_width(c: char) -> char {
    FULL_WIDTH
        .chars()
        .zip(HALF_WIDTH.chars())
        .find_map(|(fw, hw)| (fw == c).then_some(hw))
        .unwrap_or(c)
}

/// Map full-width digits and the full-width period to ASCII
pub fn normalize_input(s: &str) -> String {
    s.chars().map(to_half_width).collect()
}

/// Normalize and parse a submitted answer. Only finite numbers are accepted.
pub fn parse_answer(raw: &str) -> Result<f64, ParseError> {
    let normalized = normalize_input(raw);
    match normalized.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::new(raw)),
    }
}

/// Answer text being assembled one keystroke at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerBuffer {
    text: String,
    mode: InputMode,
}

impl AnswerBuffer {
    pub fn new(mode: InputMode) -> Self {
        Self {
            text: String::new(),
            mode,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Append a character if the current mode accepts it.
    /// Returns whether the buffer changed.
    pub fn push(&mut self, c: char) -> bool {
        match self.mode {
            InputMode::Keypad => {
                let c = to_half_width(c);
                let accepted = match c {
                    '0'..='9' => true,
                    '.' => !self.text.contains('.'),
                    '-' => self.text.is_empty(),
                    _ => false,
                };
                if accepted {
                    self.text.push(c);
                    true
                } else {
                    false
                }
            }
            InputMode::FreeText => {
                if c.is_control() {
                    false
                } else {
                    self.text.push(c);
                    true
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
