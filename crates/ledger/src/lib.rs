//! Van-inventory ledger: immutable stock movements and derived balances.

pub mod balance;
pub mod movement;

pub use balance::VanBalances;
pub use movement::{MovementKind, StockMovement};
