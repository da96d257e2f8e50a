use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Money, Showtime, TicketStatus};
use crate::store::Store;

/// Creates and cancels showtimes, keeping every showroom's timetable free of
/// overlapping screenings.
#[derive(Clone)]
pub struct Scheduler {
    store: Store,
}

impl Scheduler {
    pub fn new(store: Store) -> Self {
        Scheduler { store }
    }

    /// Schedules a screening. The conflict check and the insert run inside
    /// one write transaction, so two concurrent attempts on the same
    /// showroom serialize and at most one of an overlapping pair wins.
    ///
    /// Overlap is half-open: a show ending at 16:00 does not conflict with
    /// one starting at 16:00.
    pub async fn schedule_showtime(
        &self,
        film_id: i64,
        showroom_id: i64,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        base_price: Money,
    ) -> Result<Showtime> {
        if start_at >= end_at {
            return Err(Error::validation("start_at must be before end_at"));
        }
        if base_price.is_negative() {
            return Err(Error::validation("base_price must not be negative"));
        }
        if base_price > Money::MAX_BASE {
            return Err(Error::validation("base_price exceeds the supported maximum"));
        }

        let mut txn = self.store.begin_write().await?;
        if txn.film(film_id).is_none() {
            return Err(Error::Validation(format!("unknown film {film_id}")));
        }
        if txn.showroom(showroom_id).is_none() {
            return Err(Error::Validation(format!("unknown showroom {showroom_id}")));
        }

        let clash = txn
            .scheduled_in_showroom(showroom_id)
            .find(|s| s.overlaps(start_at, end_at))
            .map(|s| s.id);
        if let Some(existing) = clash {
            return Err(Error::Conflict {
                showroom_id,
                existing,
            });
        }

        let showtime = txn.insert_showtime(film_id, showroom_id, start_at, end_at, base_price);
        info!(
            showtime_id = showtime.id,
            film_id, showroom_id, "showtime scheduled"
        );
        Ok(showtime)
    }

    /// Cancels a showtime. Without `force` the call fails while any ticket
    /// is held or confirmed; with `force` every active ticket is cancelled
    /// in the same transaction. Lapsed holds never block cancellation.
    pub async fn cancel_showtime(&self, showtime_id: i64, force: bool) -> Result<()> {
        let now = Utc::now();
        let mut txn = self.store.begin_write().await?;
        let showtime = txn
            .showtime(showtime_id)
            .ok_or_else(|| Error::Validation(format!("unknown showtime {showtime_id}")))?;
        if !showtime.is_scheduled() {
            return Err(Error::Validation(format!(
                "showtime {showtime_id} is already cancelled"
            )));
        }

        txn.expire_overdue_for_showtime(showtime_id, now);

        let active: Vec<i64> = txn
            .active_tickets_for_showtime(showtime_id)
            .iter()
            .map(|t| t.id)
            .collect();
        if !active.is_empty() {
            if !force {
                return Err(Error::HasActiveTickets {
                    count: active.len(),
                });
            }
            for ticket_id in &active {
                txn.transition_ticket(*ticket_id, TicketStatus::Cancelled)?;
            }
            warn!(
                showtime_id,
                tickets = active.len(),
                "force-cancel cascaded to active tickets"
            );
        }

        txn.set_showtime_cancelled(showtime_id)?;
        info!(showtime_id, "showtime cancelled");
        Ok(())
    }
}
