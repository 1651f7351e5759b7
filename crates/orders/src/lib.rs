//! Customer orders and the order-status state machine.

pub mod order;

pub use order::{InvalidTransition, Order, OrderLine, OrderStatus};
