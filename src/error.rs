use thiserror::Error;

/// Error taxonomy crossing the core boundary.
///
/// Every store-level abort is translated into one of these before it reaches
/// a caller; raw storage details never leak out. Partial writes are never
/// observable behind any of them.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape or range; not retryable without fixing the input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested slot overlaps an existing showtime of the showroom.
    #[error("showroom {showroom_id} already has showtime {existing} in that slot")]
    Conflict { showroom_id: i64, existing: i64 },

    /// One or more requested seats already carry a held or confirmed ticket.
    /// The whole batch was rejected; the caller may retry with other seats.
    #[error("seats unavailable: {seats:?}")]
    SeatUnavailable { seats: Vec<i64> },

    /// The hold lapsed (or a ticket vanished) before confirmation; the
    /// caller must reserve again.
    #[error("reservation expired before confirmation")]
    ReservationExpired,

    /// Cancellation blocked by live bookings; use force-cancel to cascade.
    #[error("showtime still has {count} active tickets")]
    HasActiveTickets { count: usize },

    /// The store transaction could not be started within its time bound.
    /// Transient; the caller may retry as-is.
    #[error("store transaction timed out")]
    TransactionTimeout,
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransactionTimeout)
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
