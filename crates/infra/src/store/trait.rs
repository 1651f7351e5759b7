use std::sync::Arc;

use thiserror::Error;

use vanflow_core::{AgentId, OrderId, ProductId};
use vanflow_ledger::{StockMovement, VanBalances};
use vanflow_orders::{Order, OrderStatus};

/// Storage operation error.
///
/// These are **infrastructure errors** (conditional writes losing a race,
/// ledger rejections, backend failures) as opposed to domain errors
/// (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order not found")]
    OrderNotFound,

    #[error("order already exists")]
    DuplicateOrder,

    /// A conditional status update found a different status than expected.
    #[error("status conflict: expected {expected}, found {found}")]
    StatusConflict {
        expected: OrderStatus,
        found: OrderStatus,
    },

    /// The ledger rejected an append that would drive a balance negative.
    #[error("ledger append rejected: agent {agent_id} product {product_id} would fall to {resulting}")]
    NegativeBalance {
        agent_id: AgentId,
        product_id: ProductId,
        resulting: i64,
    },

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Order persistence boundary.
///
/// Orders are created by an upstream ordering process (`insert_order` exists
/// for it and for tests) and mutated only through conditional status updates,
/// never deleted.
pub trait OrderStore: Send + Sync {
    fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Snapshot of all orders, in no particular sequence; the query layer
    /// filters and sorts.
    fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    fn insert_order(&self, order: Order) -> Result<(), StoreError>;

    /// Compare-and-set status update: succeeds only while the stored status
    /// equals `expected`. Returns the updated order.
    fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, StoreError>;
}

/// Append-only movement ledger boundary.
///
/// Implementations must keep balance reads consistent with appended
/// movements: for every (agent, product), balance equals the signed sum of
/// movement deltas.
pub trait StockLedger: Send + Sync {
    /// Current balance; 0 if the pair never moved.
    fn balance(&self, agent_id: AgentId, product_id: ProductId) -> Result<i64, StoreError>;

    /// Snapshot across all products the agent has ever moved.
    fn balances(&self, agent_id: AgentId) -> Result<VanBalances, StoreError>;

    /// Audit lookup: movements referencing one order.
    fn movements_for_order(&self, order_id: OrderId) -> Result<Vec<StockMovement>, StoreError>;

    /// Audit lookup: movements of one agent, in append order.
    fn movements_for_agent(&self, agent_id: AgentId) -> Result<Vec<StockMovement>, StoreError>;

    /// Append a batch of movements, all-or-nothing.
    ///
    /// Fails with `NegativeBalance` (no movement applied) if any resulting
    /// balance would go negative.
    fn append(&self, movements: Vec<StockMovement>) -> Result<(), StoreError>;
}

/// Combined boundary for the dispatch transaction manager.
///
/// `commit_dispatch` is the single atomic commit of a dispatch: the status
/// transition and the ledger append persist together or not at all.
pub trait DispatchStore: OrderStore + StockLedger {
    /// Atomically, under one transactional scope:
    /// - verify the order's status equals `expected` (else `StatusConflict`),
    /// - verify no resulting balance goes negative (else `NegativeBalance`),
    /// - append all movements and set the order's status to `next`.
    ///
    /// On any failure nothing is applied: the order keeps its prior status
    /// and balances are unchanged. Returns the updated order.
    fn commit_dispatch(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        movements: Vec<StockMovement>,
    ) -> Result<Order, StoreError>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).get_order(order_id)
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders()
    }

    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        (**self).insert_order(order)
    }

    fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, StoreError> {
        (**self).update_status(order_id, expected, next)
    }
}

impl<S> StockLedger for Arc<S>
where
    S: StockLedger + ?Sized,
{
    fn balance(&self, agent_id: AgentId, product_id: ProductId) -> Result<i64, StoreError> {
        (**self).balance(agent_id, product_id)
    }

    fn balances(&self, agent_id: AgentId) -> Result<VanBalances, StoreError> {
        (**self).balances(agent_id)
    }

    fn movements_for_order(&self, order_id: OrderId) -> Result<Vec<StockMovement>, StoreError> {
        (**self).movements_for_order(order_id)
    }

    fn movements_for_agent(&self, agent_id: AgentId) -> Result<Vec<StockMovement>, StoreError> {
        (**self).movements_for_agent(agent_id)
    }

    fn append(&self, movements: Vec<StockMovement>) -> Result<(), StoreError> {
        (**self).append(movements)
    }
}

impl<S> DispatchStore for Arc<S>
where
    S: DispatchStore + ?Sized,
{
    fn commit_dispatch(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        movements: Vec<StockMovement>,
    ) -> Result<Order, StoreError> {
        (**self).commit_dispatch(order_id, expected, next, movements)
    }
}
