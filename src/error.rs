use thiserror::Error;

/// Settings rejected by [`crate::config::Settings::validate`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("term count must be between {min} and {max}, got {got}")]
    TermCountOutOfRange { got: usize, min: usize, max: usize },

    #[error("{field} must be between {min} and {max}, got {got}")]
    DigitsOutOfRange {
        field: &'static str,
        got: u32,
        min: u32,
        max: u32,
    },

    #[error("minimum digits ({min}) exceeds maximum digits ({max})")]
    InvertedDigitRange { min: u32, max: u32 },

    #[error("reveal delay must be a positive number of seconds, got {0}")]
    InvalidDelay(f64),
}

/// Submitted answer text that does not normalize to a finite number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{input}` is not a number")]
pub struct ParseError {
    pub input: String,
}

impl ParseError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
