pub mod cleanup;
pub mod pricing;
pub mod reservations;
pub mod scheduler;
