use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Seat categories carrying a percentage premium over the show's base price.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SeatType {
    Ordinary,
    Vip,
    Couple,
    SuperVip,
}

impl SeatType {
    pub const ALL: [SeatType; 4] = [
        SeatType::Ordinary,
        SeatType::Vip,
        SeatType::Couple,
        SeatType::SuperVip,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cinema {
    pub id: i64,
    pub name: String,
    /// Per-seat-type premium overrides; seat types absent here fall back to
    /// the configured defaults.
    #[serde(default)]
    pub premium_overrides: HashMap<SeatType, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Film {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Showroom {
    pub id: i64,
    pub cinema_id: i64,
    pub name: String,
}

/// One physical seat. Immutable once the showroom is provisioned; seating
/// is never reconfigured per show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub showroom_id: i64,
    pub seat_type: SeatType,
    /// Position label printed on the ticket, e.g. "B7".
    pub position: String,
}
