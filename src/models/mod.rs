pub mod catalog;
pub mod showtime;
pub mod ticket;

pub use catalog::{Cinema, Film, Seat, SeatType, Showroom};
pub use showtime::{intervals_overlap, Showtime, ShowtimeStatus};
pub use ticket::{Ticket, TicketStatus};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monetary amount in minor currency units (cents).
///
/// All prices are integer cents, so rounding happens exactly once, inside
/// `with_premium_percent`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest base price the scheduler accepts; keeps premium arithmetic
    /// comfortably inside i64 even at the highest premium percentages.
    pub const MAX_BASE: Money = Money(100_000_000_000);

    pub fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Applies a percentage premium, rounding half-up to the minor unit.
    ///
    /// The multiply runs in i128, so no input can panic; amounts beyond the
    /// i64 range clamp to `i64::MAX` (unreachable for prices within
    /// [`Money::MAX_BASE`]).
    pub fn with_premium_percent(self, percent: u32) -> Money {
        let scaled = i128::from(self.0) * i128::from(100 + percent);
        let rounded = (scaled + 50) / 100;
        Money(i64::try_from(rounded).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_rounds_half_up() {
        assert_eq!(Money::from_minor(1000).with_premium_percent(50).minor(), 1500);
        // 0.50 * 1.01 = 0.505 -> 0.51
        assert_eq!(Money::from_minor(50).with_premium_percent(1).minor(), 51);
        // 0.01 * 1.01 = 0.0101 -> 0.01
        assert_eq!(Money::from_minor(1).with_premium_percent(1).minor(), 1);
        assert_eq!(Money::ZERO.with_premium_percent(100).minor(), 0);
    }

    #[test]
    fn premium_never_panics_on_extreme_amounts() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!(max.with_premium_percent(400).minor(), i64::MAX);
        assert_eq!(
            Money::MAX_BASE.with_premium_percent(400).minor(),
            Money::MAX_BASE.minor() * 5
        );
    }

    #[test]
    fn display_renders_minor_units() {
        assert_eq!(Money::from_minor(1500).to_string(), "15.00");
        assert_eq!(Money::from_minor(705).to_string(), "7.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }
}
