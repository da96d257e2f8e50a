use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowtimeStatus {
    Scheduled,
    Cancelled,
}

/// One scheduled screening of a film in a showroom.
///
/// Immutable after creation except for cancellation. For a fixed showroom no
/// two scheduled showtimes may overlap under half-open interval semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub film_id: i64,
    pub showroom_id: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub base_price: Money,
    pub status: ShowtimeStatus,
}

impl Showtime {
    pub fn is_scheduled(&self) -> bool {
        self.status == ShowtimeStatus::Scheduled
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(self.start_at, self.end_at, start, end)
    }
}

/// Half-open interval overlap: `[a_start, a_end)` against `[b_start, b_end)`.
/// Back-to-back intervals (one ends exactly where the other starts) do not
/// overlap.
pub fn intervals_overlap<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_to_back_does_not_overlap() {
        assert!(!intervals_overlap(14, 16, 16, 18));
        assert!(!intervals_overlap(16, 18, 14, 16));
    }

    #[test]
    fn partial_and_contained_overlap() {
        assert!(intervals_overlap(14, 16, 15, 17));
        assert!(intervals_overlap(14, 18, 15, 16));
        assert!(intervals_overlap(15, 16, 14, 18));
    }
}
