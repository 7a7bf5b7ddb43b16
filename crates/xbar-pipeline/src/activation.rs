//! Elementwise activation variants applied at the Activate stage.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Activation applied to a layer's MAC outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// `max(x, 0)`
    Relu,
    /// `x` for non-negative `x`, else `x >> 3` (arithmetic shift — divide
    /// toward negative infinity by 8). Fixed slope, kept for compatibility
    /// with the modeled hardware.
    Leaky,
}

impl Activation {
    /// Apply to one accumulator value.
    #[must_use]
    pub const fn apply(self, x: i64) -> i64 {
        match self {
            Self::Relu => {
                if x > 0 {
                    x
                } else {
                    0
                }
            }
            Self::Leaky => {
                if x >= 0 {
                    x
                } else {
                    x >> 3
                }
            }
        }
    }

    /// Apply in place to a slice of accumulator values.
    pub fn apply_all(self, values: &mut [i64]) {
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relu" => Ok(Self::Relu),
            "leaky" => Ok(Self::Leaky),
            other => Err(ConfigError::unknown_activation(other)),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relu => write!(f, "relu"),
            Self::Leaky => write!(f, "leaky"),
        }
    }
}
