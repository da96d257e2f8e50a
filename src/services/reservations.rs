use chrono::{Duration as TimeDelta, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::config::ReservationConfig;
use crate::error::{Error, Result};
use crate::models::{Seat, Showtime, Ticket, TicketStatus};
use crate::services::pricing::PricingService;
use crate::store::Store;

/// The concurrency-critical core: holds, confirms and releases seats.
///
/// Every mutating entry point runs as one store write transaction, so a
/// check-then-write here can never interleave with another request's. Batch
/// operations are all-or-nothing throughout.
#[derive(Clone)]
pub struct ReservationEngine {
    store: Store,
    pricing: PricingService,
    hold_window: TimeDelta,
    grace_window: TimeDelta,
}

impl ReservationEngine {
    pub fn new(store: Store, pricing: PricingService, config: &ReservationConfig) -> Self {
        ReservationEngine {
            store,
            pricing,
            hold_window: TimeDelta::seconds(config.hold_window_secs),
            grace_window: TimeDelta::seconds(config.grace_window_secs),
        }
    }

    /// Atomically holds a batch of seats for a showtime.
    ///
    /// If any requested seat is already held or confirmed the whole batch is
    /// rejected with [`Error::SeatUnavailable`] listing every offending
    /// seat; a group booking gets all of its seats or none of them. On
    /// success one `held` ticket per seat is returned, priced at
    /// reservation time and valid until the hold window elapses.
    pub async fn reserve_seats(&self, showtime_id: i64, seat_ids: &[i64]) -> Result<Vec<Ticket>> {
        let requested: BTreeSet<i64> = seat_ids.iter().copied().collect();
        if requested.is_empty() {
            return Err(Error::validation("at least one seat must be requested"));
        }

        let now = Utc::now();
        let mut txn = self.store.begin_write().await?;

        let showtime = txn
            .showtime(showtime_id)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("unknown showtime {showtime_id}")))?;
        if !showtime.is_scheduled() {
            return Err(Error::Validation(format!(
                "showtime {showtime_id} is cancelled"
            )));
        }
        // Booking stays open for a configurable grace window past the start.
        if now >= showtime.start_at + self.grace_window {
            return Err(Error::Validation(format!(
                "booking closed: showtime {showtime_id} has already started"
            )));
        }

        let mut seats: Vec<Seat> = Vec::with_capacity(requested.len());
        for &seat_id in &requested {
            match txn.seat(seat_id) {
                Some(seat) if seat.showroom_id == showtime.showroom_id => {
                    seats.push(seat.clone());
                }
                Some(seat) => {
                    return Err(Error::Validation(format!(
                        "seat {seat_id} belongs to showroom {}, not {}",
                        seat.showroom_id, showtime.showroom_id
                    )));
                }
                None => {
                    return Err(Error::Validation(format!("unknown seat {seat_id}")));
                }
            }
        }

        // Lapsed holds on this showtime are dead weight; sweep them here so
        // they cannot block the batch.
        txn.expire_overdue_for_showtime(showtime_id, now);

        let taken: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|&seat_id| txn.seat_blocked(showtime_id, seat_id, now))
            .collect();
        if !taken.is_empty() {
            debug!(showtime_id, seats = ?taken, "reservation rejected, seats taken");
            return Err(Error::SeatUnavailable { seats: taken });
        }

        let mut tickets = Vec::with_capacity(seats.len());
        for seat in &seats {
            let price = self.pricing.price_in(&txn, &showtime, seat.seat_type)?;
            let ticket = txn.insert_ticket(showtime_id, seat, price, now, self.hold_window)?;
            tickets.push(ticket);
        }

        info!(
            showtime_id,
            seats = tickets.len(),
            "seats held until {}",
            now + self.hold_window
        );
        Ok(tickets)
    }

    /// Flips a batch of held tickets to confirmed, all or nothing.
    ///
    /// Fails with [`Error::ReservationExpired`] if any listed ticket is
    /// missing, no longer held, or past its hold deadline; lapsed holds are
    /// cancelled on the way out. A confirm racing the background sweeper
    /// resolves under the store's write lock: whichever commits first wins,
    /// never both.
    pub async fn confirm_reservation(&self, ticket_ids: &[i64]) -> Result<Vec<Ticket>> {
        let ids: BTreeSet<i64> = ticket_ids.iter().copied().collect();
        if ids.is_empty() {
            return Err(Error::validation("at least one ticket must be confirmed"));
        }

        let now = Utc::now();
        let mut txn = self.store.begin_write().await?;

        let mut lapsed: Vec<i64> = Vec::new();
        for &ticket_id in &ids {
            match txn.ticket(ticket_id) {
                Some(t) if t.status == TicketStatus::Held && now < t.hold_expires_at => {}
                Some(t) if t.hold_lapsed(now) => lapsed.push(ticket_id),
                _ => return Err(Error::ReservationExpired),
            }
        }
        if !lapsed.is_empty() {
            for ticket_id in lapsed {
                txn.transition_ticket(ticket_id, TicketStatus::Cancelled)?;
            }
            return Err(Error::ReservationExpired);
        }

        let mut confirmed = Vec::with_capacity(ids.len());
        for &ticket_id in &ids {
            confirmed.push(txn.transition_ticket(ticket_id, TicketStatus::Confirmed)?);
        }
        info!(tickets = confirmed.len(), "reservation confirmed");
        Ok(confirmed)
    }

    /// Releases a batch of held tickets back to the pool (held -> cancelled),
    /// all or nothing. Confirmed or unknown tickets are an input error.
    pub async fn release_held(&self, ticket_ids: &[i64]) -> Result<()> {
        let ids: BTreeSet<i64> = ticket_ids.iter().copied().collect();
        if ids.is_empty() {
            return Err(Error::validation("at least one ticket must be released"));
        }

        let mut txn = self.store.begin_write().await?;
        for &ticket_id in &ids {
            match txn.ticket(ticket_id) {
                Some(t) if t.status == TicketStatus::Held => {}
                Some(t) => {
                    return Err(Error::Validation(format!(
                        "ticket {ticket_id} is {:?}, not held",
                        t.status
                    )));
                }
                None => {
                    return Err(Error::Validation(format!("unknown ticket {ticket_id}")));
                }
            }
        }
        for &ticket_id in &ids {
            txn.transition_ticket(ticket_id, TicketStatus::Cancelled)?;
        }
        info!(tickets = ids.len(), "held tickets released");
        Ok(())
    }

    /// Cancels a confirmed (or still-held) ticket, freeing its seat. Refund
    /// policy is the caller's concern.
    pub async fn cancel_ticket(&self, ticket_id: i64) -> Result<Ticket> {
        let mut txn = self.store.begin_write().await?;
        let ticket = txn.transition_ticket(ticket_id, TicketStatus::Cancelled)?;
        info!(ticket_id, "ticket cancelled");
        Ok(ticket)
    }

    /// Every seat of the showtime's showroom with no blocking ticket right
    /// now. Pure read; lapsed holds count as free even before the sweeper
    /// has cancelled them.
    pub async fn available_seats(&self, showtime_id: i64) -> Result<Vec<Seat>> {
        let now = Utc::now();
        let txn = self.store.begin_read().await?;
        let showtime = txn
            .showtime(showtime_id)
            .ok_or_else(|| Error::Validation(format!("unknown showtime {showtime_id}")))?;
        if !showtime.is_scheduled() {
            return Ok(Vec::new());
        }
        Ok(txn
            .seats_of(showtime.showroom_id)
            .into_iter()
            .filter(|seat| !txn.seat_blocked(showtime_id, seat.id, now))
            .cloned()
            .collect())
    }

    /// Scheduled showtimes with their free-seat counts, so a browsing layer
    /// can hide booked-out shows.
    pub async fn showtimes_with_availability(&self) -> Result<Vec<(Showtime, usize)>> {
        let now = Utc::now();
        let txn = self.store.begin_read().await?;
        let mut out = Vec::new();
        let mut shows: Vec<Showtime> = txn.all_scheduled_showtimes().into_iter().cloned().collect();
        shows.sort_by_key(|s| s.start_at);
        for show in shows {
            let free = txn
                .seats_of(show.showroom_id)
                .into_iter()
                .filter(|seat| !txn.seat_blocked(show.id, seat.id, now))
                .count();
            out.push((show, free));
        }
        Ok(out)
    }

    /// Cancels a bounded batch of lapsed holds. Driven by the background
    /// sweeper; returns how many holds were expired.
    pub async fn expire_due_holds(&self, limit: usize) -> Result<usize> {
        let now = Utc::now();
        let mut txn = self.store.begin_write().await?;
        let expired = txn.expire_due_holds(now, limit);
        if !expired.is_empty() {
            info!(count = expired.len(), "lapsed holds expired");
        }
        Ok(expired.len())
    }
}
