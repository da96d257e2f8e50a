pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

pub use error::{Error, Result};

use services::pricing::PricingService;
use services::reservations::ReservationEngine;
use services::scheduler::Scheduler;

// Shared state for the whole core: one store, one config, the services on top
#[derive(Clone)]
pub struct AppState {
    pub store: store::Store,
    pub config: config::Config,
    pub scheduler: Scheduler,
    pub pricing: PricingService,
    pub reservations: ReservationEngine,
}

impl AppState {
    pub fn new(config: config::Config) -> Arc<Self> {
        let store = store::Store::new(Duration::from_millis(config.reservation.txn_timeout_ms));
        let pricing = PricingService::new(store.clone(), config.pricing.clone());
        let scheduler = Scheduler::new(store.clone());
        let reservations = ReservationEngine::new(store.clone(), pricing.clone(), &config.reservation);

        Arc::new(Self {
            store,
            config,
            scheduler,
            pricing,
            reservations,
        })
    }
}
