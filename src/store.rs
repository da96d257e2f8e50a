use chrono::{DateTime, Duration as TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    Cinema, Film, Money, Seat, SeatType, Showroom, Showtime, ShowtimeStatus, Ticket, TicketStatus,
};

/// The shared store: sole source of truth for catalog and booking state.
///
/// Every mutation runs under one write transaction (the write guard held for
/// the whole check-then-write sequence), so cross-request ordering is
/// enforced here and nowhere else. There is no availability cache anywhere
/// outside this state; availability is always derived from tickets.
///
/// Waiting for a transaction slot is bounded by `txn_timeout`; on elapse the
/// caller gets a retryable [`Error::TransactionTimeout`] with nothing
/// written.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<StoreState>>,
    txn_timeout: Duration,
}

/// All persisted entities. Fields are private to this module; reads go
/// through the getter methods, writes through [`WriteTxn`].
#[derive(Default)]
pub struct StoreState {
    cinemas: BTreeMap<i64, Cinema>,
    films: BTreeMap<i64, Film>,
    showrooms: BTreeMap<i64, Showroom>,
    seats: BTreeMap<i64, Seat>,
    showtimes: BTreeMap<i64, Showtime>,
    tickets: BTreeMap<i64, Ticket>,
    /// Uniqueness constraint on (showtime_id, seat_id) for non-cancelled
    /// tickets, maintained by the store itself. Maps to the active ticket id.
    active_seats: HashMap<(i64, i64), i64>,
    next_id: i64,
}

/// Read transaction: a consistent snapshot view of the store.
pub struct ReadTxn<'a>(RwLockReadGuard<'a, StoreState>);

/// Write transaction: exclusive access for one atomic check-then-write
/// sequence. Dropping the guard commits; since every mutator validates
/// before touching state, an error return leaves nothing half-written.
pub struct WriteTxn<'a>(RwLockWriteGuard<'a, StoreState>);

impl Deref for ReadTxn<'_> {
    type Target = StoreState;
    fn deref(&self) -> &StoreState {
        &self.0
    }
}

impl Deref for WriteTxn<'_> {
    type Target = StoreState;
    fn deref(&self) -> &StoreState {
        &self.0
    }
}

impl DerefMut for WriteTxn<'_> {
    fn deref_mut(&mut self) -> &mut StoreState {
        &mut self.0
    }
}

impl Store {
    pub fn new(txn_timeout: Duration) -> Self {
        Store {
            inner: Arc::new(RwLock::new(StoreState::default())),
            txn_timeout,
        }
    }

    pub async fn begin_read(&self) -> Result<ReadTxn<'_>> {
        let guard = tokio::time::timeout(self.txn_timeout, self.inner.read())
            .await
            .map_err(|_| Error::TransactionTimeout)?;
        Ok(ReadTxn(guard))
    }

    pub async fn begin_write(&self) -> Result<WriteTxn<'_>> {
        let guard = tokio::time::timeout(self.txn_timeout, self.inner.write())
            .await
            .map_err(|_| Error::TransactionTimeout)?;
        Ok(WriteTxn(guard))
    }

    /* ---------- catalog administration ---------- */

    pub async fn add_cinema(
        &self,
        name: &str,
        premium_overrides: HashMap<SeatType, u32>,
    ) -> Result<Cinema> {
        if name.trim().is_empty() {
            return Err(Error::validation("cinema name must not be empty"));
        }
        let mut txn = self.begin_write().await?;
        let id = txn.alloc_id();
        let cinema = Cinema {
            id,
            name: name.to_string(),
            premium_overrides,
        };
        txn.cinemas.insert(id, cinema.clone());
        debug!(cinema_id = id, name, "cinema added");
        Ok(cinema)
    }

    pub async fn add_film(&self, title: &str) -> Result<Film> {
        if title.trim().is_empty() {
            return Err(Error::validation("film title must not be empty"));
        }
        let mut txn = self.begin_write().await?;
        let id = txn.alloc_id();
        let film = Film {
            id,
            title: title.to_string(),
        };
        txn.films.insert(id, film.clone());
        debug!(film_id = id, title, "film added");
        Ok(film)
    }

    /// Provisions a showroom with its fixed seat set in one transaction.
    /// The seat layout is immutable afterwards.
    pub async fn add_showroom(
        &self,
        cinema_id: i64,
        name: &str,
        seats: Vec<(SeatType, String)>,
    ) -> Result<Showroom> {
        if seats.is_empty() {
            return Err(Error::validation("showroom needs at least one seat"));
        }
        let mut txn = self.begin_write().await?;
        if txn.cinema(cinema_id).is_none() {
            return Err(Error::Validation(format!("unknown cinema {cinema_id}")));
        }
        let showroom_id = txn.alloc_id();
        let showroom = Showroom {
            id: showroom_id,
            cinema_id,
            name: name.to_string(),
        };
        txn.showrooms.insert(showroom_id, showroom.clone());
        let seat_count = seats.len();
        for (seat_type, position) in seats {
            let seat_id = txn.alloc_id();
            txn.seats.insert(
                seat_id,
                Seat {
                    id: seat_id,
                    showroom_id,
                    seat_type,
                    position,
                },
            );
        }
        debug!(showroom_id, cinema_id, seats = seat_count, "showroom provisioned");
        Ok(showroom)
    }

    /* ---------- browse reads ---------- */

    pub async fn list_films(&self) -> Result<Vec<Film>> {
        let txn = self.begin_read().await?;
        Ok(txn.films.values().cloned().collect())
    }

    /// Scheduled (non-cancelled) showtimes of one film, ordered by start.
    pub async fn showtimes_for_film(&self, film_id: i64) -> Result<Vec<Showtime>> {
        let txn = self.begin_read().await?;
        let mut shows: Vec<Showtime> = txn
            .showtimes
            .values()
            .filter(|s| s.film_id == film_id && s.is_scheduled())
            .cloned()
            .collect();
        shows.sort_by_key(|s| s.start_at);
        Ok(shows)
    }

    pub async fn seats_in_showroom(&self, showroom_id: i64) -> Result<Vec<Seat>> {
        let txn = self.begin_read().await?;
        Ok(txn.seats_of(showroom_id).into_iter().cloned().collect())
    }

    pub async fn showtime(&self, id: i64) -> Result<Option<Showtime>> {
        let txn = self.begin_read().await?;
        Ok(txn.showtime(id).cloned())
    }

    pub async fn ticket(&self, id: i64) -> Result<Option<Ticket>> {
        let txn = self.begin_read().await?;
        Ok(txn.ticket(id).cloned())
    }
}

impl StoreState {
    pub fn cinema(&self, id: i64) -> Option<&Cinema> {
        self.cinemas.get(&id)
    }

    pub fn film(&self, id: i64) -> Option<&Film> {
        self.films.get(&id)
    }

    pub fn showroom(&self, id: i64) -> Option<&Showroom> {
        self.showrooms.get(&id)
    }

    pub fn seat(&self, id: i64) -> Option<&Seat> {
        self.seats.get(&id)
    }

    pub fn showtime(&self, id: i64) -> Option<&Showtime> {
        self.showtimes.get(&id)
    }

    pub fn ticket(&self, id: i64) -> Option<&Ticket> {
        self.tickets.get(&id)
    }

    /// Seats of a showroom in stable id order.
    pub fn seats_of(&self, showroom_id: i64) -> Vec<&Seat> {
        self.seats
            .values()
            .filter(|s| s.showroom_id == showroom_id)
            .collect()
    }

    pub fn all_scheduled_showtimes(&self) -> Vec<&Showtime> {
        self.showtimes.values().filter(|s| s.is_scheduled()).collect()
    }

    pub fn scheduled_in_showroom(&self, showroom_id: i64) -> impl Iterator<Item = &Showtime> {
        self.showtimes
            .values()
            .filter(move |s| s.showroom_id == showroom_id && s.is_scheduled())
    }

    /// Whether the seat carries a ticket that blocks it at `now` (confirmed,
    /// or held within its deadline). Lapsed holds do not block even before
    /// the sweeper has cancelled them.
    pub fn seat_blocked(&self, showtime_id: i64, seat_id: i64, now: DateTime<Utc>) -> bool {
        self.active_seats
            .get(&(showtime_id, seat_id))
            .and_then(|ticket_id| self.tickets.get(ticket_id))
            .is_some_and(|t| t.blocks_seat(now))
    }

    /// All held/confirmed tickets of a showtime (including lapsed holds not
    /// yet swept).
    pub fn active_tickets_for_showtime(&self, showtime_id: i64) -> Vec<&Ticket> {
        self.active_seats
            .iter()
            .filter(|((st, _), _)| *st == showtime_id)
            .filter_map(|(_, ticket_id)| self.tickets.get(ticket_id))
            .collect()
    }

    /// (live holds, lapsed-but-unswept holds) for sweeper monitoring.
    pub fn hold_counts(&self, now: DateTime<Utc>) -> (usize, usize) {
        let mut live = 0;
        let mut due = 0;
        for t in self.tickets.values() {
            if t.status == TicketStatus::Held {
                if now < t.hold_expires_at {
                    live += 1;
                } else {
                    due += 1;
                }
            }
        }
        (live, due)
    }

    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl WriteTxn<'_> {
    pub fn insert_showtime(
        &mut self,
        film_id: i64,
        showroom_id: i64,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        base_price: Money,
    ) -> Showtime {
        let id = self.0.alloc_id();
        let showtime = Showtime {
            id,
            film_id,
            showroom_id,
            start_at,
            end_at,
            base_price,
            status: ShowtimeStatus::Scheduled,
        };
        self.0.showtimes.insert(id, showtime.clone());
        showtime
    }

    pub fn set_showtime_cancelled(&mut self, id: i64) -> Result<()> {
        match self.0.showtimes.get_mut(&id) {
            Some(s) => {
                s.status = ShowtimeStatus::Cancelled;
                Ok(())
            }
            None => Err(Error::Validation(format!("unknown showtime {id}"))),
        }
    }

    /// Inserts a held ticket, enforcing the (showtime, seat) uniqueness
    /// constraint for non-cancelled tickets. A violation surfaces as
    /// [`Error::SeatUnavailable`].
    pub fn insert_ticket(
        &mut self,
        showtime_id: i64,
        seat: &Seat,
        price: Money,
        now: DateTime<Utc>,
        hold_window: TimeDelta,
    ) -> Result<Ticket> {
        let key = (showtime_id, seat.id);
        if self.0.active_seats.contains_key(&key) {
            return Err(Error::SeatUnavailable {
                seats: vec![seat.id],
            });
        }
        let id = self.0.alloc_id();
        let ticket = Ticket {
            id,
            showtime_id,
            seat_id: seat.id,
            seat_position: seat.position.clone(),
            seat_type: seat.seat_type,
            status: TicketStatus::Held,
            price,
            created_at: now,
            hold_expires_at: now + hold_window,
        };
        self.0.active_seats.insert(key, id);
        self.0.tickets.insert(id, ticket.clone());
        Ok(ticket)
    }

    /// Moves a ticket along its state machine, keeping the active-seat
    /// constraint index in step. Illegal transitions and unknown ids are
    /// validation errors.
    pub fn transition_ticket(&mut self, id: i64, next: TicketStatus) -> Result<Ticket> {
        let ticket = self
            .0
            .tickets
            .get_mut(&id)
            .ok_or_else(|| Error::Validation(format!("unknown ticket {id}")))?;
        if !ticket.status.can_transition_to(next) {
            return Err(Error::Validation(format!(
                "illegal ticket transition {:?} -> {:?}",
                ticket.status, next
            )));
        }
        ticket.status = next;
        let updated = ticket.clone();
        if !next.is_active() {
            self.0
                .active_seats
                .remove(&(updated.showtime_id, updated.seat_id));
        }
        Ok(updated)
    }

    /// Cancels up to `limit` held tickets whose hold deadline has passed,
    /// freeing their seats. Returns the cancelled ticket ids.
    pub fn expire_due_holds(&mut self, now: DateTime<Utc>, limit: usize) -> Vec<i64> {
        let due: Vec<i64> = self
            .0
            .tickets
            .values()
            .filter(|t| t.hold_lapsed(now))
            .take(limit)
            .map(|t| t.id)
            .collect();
        for id in &due {
            self.cancel_hold_unchecked(*id);
        }
        due
    }

    /// Lazy in-transaction expiry for one showtime, so operations under the
    /// same write lock see lapsed holds as already cancelled.
    pub fn expire_overdue_for_showtime(&mut self, showtime_id: i64, now: DateTime<Utc>) -> Vec<i64> {
        let due: Vec<i64> = self
            .0
            .tickets
            .values()
            .filter(|t| t.showtime_id == showtime_id && t.hold_lapsed(now))
            .map(|t| t.id)
            .collect();
        for id in &due {
            self.cancel_hold_unchecked(*id);
        }
        due
    }

    fn cancel_hold_unchecked(&mut self, id: i64) {
        let key = match self.0.tickets.get_mut(&id) {
            Some(t) => {
                t.status = TicketStatus::Cancelled;
                (t.showtime_id, t.seat_id)
            }
            None => return,
        };
        self.0.active_seats.remove(&key);
    }
}
