//! Storage boundary for orders and the movement ledger.
//!
//! This module defines infrastructure-facing traits without making storage
//! assumptions. The in-memory implementation serves tests/dev; a SQL backend
//! would satisfy the same contracts, in particular the atomicity of
//! `DispatchStore::commit_dispatch`.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDispatchStore;
pub use r#trait::{DispatchStore, OrderStore, StockLedger, StoreError};
