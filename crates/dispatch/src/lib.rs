//! Stock availability evaluation for order dispatch.

pub mod availability;

pub use availability::{evaluate, AvailabilityError, Shortfall, StockVerdict};
