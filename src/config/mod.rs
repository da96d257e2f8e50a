use serde::Deserialize;
use std::env;

use crate::models::SeatType;

// Top-level configuration container for the whole core
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub reservation: ReservationConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub rust_log: String,
}

// Knobs governing holds, booking cutoff and store transactions
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationConfig {
    /// Seconds a held ticket stays valid before it expires unconfirmed.
    pub hold_window_secs: i64,
    /// Seconds after a showtime's start during which booking is still open.
    pub grace_window_secs: i64,
    /// Upper bound on waiting for a store transaction slot, milliseconds.
    pub txn_timeout_ms: u64,
    /// Max holds expired per background sweep.
    pub expiry_batch_size: usize,
    /// Seconds between background expiry sweeps.
    pub expiry_sweep_secs: u64,
}

/// Default seat-type premiums, percent over a show's base price.
/// Cinemas may override individual seat types in their catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    pub ordinary_premium_pct: u32,
    pub vip_premium_pct: u32,
    pub couple_premium_pct: u32,
    pub super_vip_premium_pct: u32,
}

impl PricingConfig {
    pub fn default_percent(&self, seat_type: SeatType) -> u32 {
        match seat_type {
            SeatType::Ordinary => self.ordinary_premium_pct,
            SeatType::Vip => self.vip_premium_pct,
            SeatType::Couple => self.couple_premium_pct,
            SeatType::SuperVip => self.super_vip_premium_pct,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            app: AppConfig {
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_core=debug".to_string()),
            },
            reservation: ReservationConfig {
                hold_window_secs: env::var("HOLD_WINDOW_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .expect("HOLD_WINDOW_SECS must be a valid number"),
                grace_window_secs: env::var("GRACE_WINDOW_SECS")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .expect("GRACE_WINDOW_SECS must be a valid number"),
                txn_timeout_ms: env::var("TXN_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .expect("TXN_TIMEOUT_MS must be a valid number"),
                expiry_batch_size: env::var("EXPIRY_BATCH_SIZE")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .expect("EXPIRY_BATCH_SIZE must be a valid number"),
                expiry_sweep_secs: env::var("EXPIRY_SWEEP_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .expect("EXPIRY_SWEEP_SECS must be a valid number"),
            },
            pricing: PricingConfig {
                ordinary_premium_pct: env::var("PREMIUM_ORDINARY_PCT")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .expect("PREMIUM_ORDINARY_PCT must be a valid number"),
                vip_premium_pct: env::var("PREMIUM_VIP_PCT")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .expect("PREMIUM_VIP_PCT must be a valid number"),
                couple_premium_pct: env::var("PREMIUM_COUPLE_PCT")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("PREMIUM_COUPLE_PCT must be a valid number"),
                super_vip_premium_pct: env::var("PREMIUM_SUPER_VIP_PCT")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .expect("PREMIUM_SUPER_VIP_PCT must be a valid number"),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                rust_log: "cinema_core=debug".to_string(),
            },
            reservation: ReservationConfig {
                hold_window_secs: 600,
                grace_window_secs: 0,
                txn_timeout_ms: 5000,
                expiry_batch_size: 500,
                expiry_sweep_secs: 60,
            },
            pricing: PricingConfig {
                ordinary_premium_pct: 0,
                vip_premium_pct: 50,
                couple_premium_pct: 30,
                super_vip_premium_pct: 100,
            },
        }
    }
}
