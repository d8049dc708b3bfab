//! Fixed-point effort measured in hundredths of an hour.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Effort in hundredths of an hour.
///
/// Estimates and reported hours are decimal values such as `1.5`; keeping
/// them as integers avoids float drift when summing checklist progress.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Effort(u32);

impl Effort {
    /// No effort.
    pub const ZERO: Self = Self(0);

    /// Creates an effort value from hundredths of an hour.
    #[must_use]
    pub const fn from_centihours(centihours: u32) -> Self {
        Self(centihours)
    }

    /// Creates an effort value from whole hours.
    #[must_use]
    pub const fn from_hours(hours: u32) -> Self {
        Self(hours.saturating_mul(100))
    }

    /// Parses a decimal hour value such as `"2"`, `"1.5"` or `"0.25"`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidEffort`] for negative, non-numeric
    /// or over-precise input.
    pub fn parse_hours(value: &str) -> Result<Self, TaskDomainError> {
        let invalid = || TaskDomainError::InvalidEffort(value.to_owned());
        let trimmed = value.trim();
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        let all_digits = |part: &str| part.chars().all(|ch| ch.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) || fraction.len() > 2 {
            return Err(invalid());
        }

        let whole_hours: u32 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut padded = fraction.to_owned();
        while padded.len() < 2 {
            padded.push('0');
        }
        let hundredths: u32 = padded.parse().map_err(|_| invalid())?;

        whole_hours
            .checked_mul(100)
            .and_then(|centi| centi.checked_add(hundredths))
            .map(Self)
            .ok_or_else(invalid)
    }

    /// Returns the raw hundredths-of-an-hour value.
    #[must_use]
    pub const fn centihours(self) -> u32 {
        self.0
    }

    /// Adds two effort values, saturating on overflow.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Sum for Effort {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0.div_euclid(100);
        let hundredths = self.0.rem_euclid(100);
        write!(f, "{whole}.{hundredths:02}h")
    }
}
