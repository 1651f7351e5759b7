//! Infrastructure layer: storage boundary, transaction manager, query side.

pub mod agent_locks;
pub mod dispatcher;
pub mod query;
pub mod store;


pub use dispatcher::{DispatchConfig, DispatchError, DispatchReceipt, DispatchService};
pub use query::{list_orders, stock_status_for, StatusFilter};
pub use store::{DispatchStore, InMemoryDispatchStore, OrderStore, StockLedger, StoreError};
