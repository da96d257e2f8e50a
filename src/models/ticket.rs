use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Money, SeatType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Held,
    Confirmed,
    Cancelled,
}

impl TicketStatus {
    /// Held and confirmed tickets occupy their seat; cancelled ones do not.
    pub fn is_active(self) -> bool {
        matches!(self, TicketStatus::Held | TicketStatus::Confirmed)
    }

    /// held -> confirmed, held -> cancelled, confirmed -> cancelled.
    /// Cancelled is terminal and confirmed never reverts to held.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Held, TicketStatus::Confirmed)
                | (TicketStatus::Held, TicketStatus::Cancelled)
                | (TicketStatus::Confirmed, TicketStatus::Cancelled)
        )
    }
}

/// A seat reservation for one showtime.
///
/// Created in `held` state with a hold deadline; the price is computed at
/// reservation time and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub showtime_id: i64,
    pub seat_id: i64,
    /// Seat position label at booking time, so a printed ticket can say
    /// where the holder sits.
    pub seat_position: String,
    pub seat_type: SeatType,
    pub status: TicketStatus,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    /// A held ticket not confirmed before this instant no longer blocks the
    /// seat and is swept to cancelled.
    pub hold_expires_at: DateTime<Utc>,
}

impl Ticket {
    pub fn hold_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == TicketStatus::Held && now >= self.hold_expires_at
    }

    /// Whether the ticket blocks its seat at `now`: confirmed, or held and
    /// still within the hold window.
    pub fn blocks_seat(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            TicketStatus::Confirmed => true,
            TicketStatus::Held => now < self.hold_expires_at,
            TicketStatus::Cancelled => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_transitions() {
        use TicketStatus::*;
        assert!(Held.can_transition_to(Confirmed));
        assert!(Held.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Held));
        assert!(!Cancelled.can_transition_to(Held));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Held.can_transition_to(Held));
    }
}
