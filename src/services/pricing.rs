use crate::config::PricingConfig;
use crate::error::{Error, Result};
use crate::models::{Money, SeatType, Showtime};
use crate::store::{Store, StoreState};

/// Computes per-seat ticket prices from a show's base price and the seat
/// type's percentage premium. Pure arithmetic over two inputs; the only I/O
/// is reading them from the store.
#[derive(Clone)]
pub struct PricingService {
    store: Store,
    defaults: PricingConfig,
}

impl PricingService {
    pub fn new(store: Store, defaults: PricingConfig) -> Self {
        PricingService { store, defaults }
    }

    /// `base_price * (1 + premium/100)`, rounded half-up to the minor unit.
    /// The premium comes from the owning cinema's overrides, falling back to
    /// the configured defaults.
    pub async fn compute_price(&self, showtime_id: i64, seat_type: SeatType) -> Result<Money> {
        let txn = self.store.begin_read().await?;
        let showtime = txn
            .showtime(showtime_id)
            .ok_or_else(|| Error::Validation(format!("unknown showtime {showtime_id}")))?;
        self.price_in(&txn, showtime, seat_type)
    }

    /// Same computation against an already-open transaction, so the
    /// reservation engine can price seats inside its own write transaction.
    pub(crate) fn price_in(
        &self,
        state: &StoreState,
        showtime: &Showtime,
        seat_type: SeatType,
    ) -> Result<Money> {
        let showroom = state.showroom(showtime.showroom_id).ok_or_else(|| {
            Error::Validation(format!("unknown showroom {}", showtime.showroom_id))
        })?;
        let cinema = state
            .cinema(showroom.cinema_id)
            .ok_or_else(|| Error::Validation(format!("unknown cinema {}", showroom.cinema_id)))?;
        let percent = cinema
            .premium_overrides
            .get(&seat_type)
            .copied()
            .unwrap_or_else(|| self.defaults.default_percent(seat_type));
        Ok(showtime.base_price.with_premium_percent(percent))
    }
}
