//! Dispatch transaction manager.
//!
//! The only path that advances an order to `completed` and deducts van
//! stock. The execution pipeline for `confirm_dispatch`:
//!
//! ```text
//! confirm_dispatch(order_id, agent_id)
//!   ↓
//! 1. Load order, check the pending → completed edge is legal
//!   ↓
//! 2. Acquire the agent's dispatch lock (bounded wait, Busy on timeout)
//!   ↓
//! 3. Re-read balances inside the critical section, evaluate availability
//!   ↓
//! 4. Build one sale movement per order line
//!   ↓
//! 5-6. commit_dispatch: ledger append + status transition, atomically
//!   ↓
//! 7. Release the lock (guard drop)
//! ```
//!
//! The caller-facing snapshot path (`evaluate_stock`) never feeds the commit
//! decision; step 3 always re-reads under the lock.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use vanflow_core::{AgentId, DomainError, OrderId, ProductId};
use vanflow_dispatch::{evaluate, AvailabilityError, Shortfall, StockVerdict};
use vanflow_ledger::StockMovement;
use vanflow_orders::{InvalidTransition, Order, OrderStatus};

use crate::agent_locks::AgentLocks;
use crate::query::StatusFilter;
use crate::store::{DispatchStore, StoreError};

/// Dispatch operation error.
///
/// `InsufficientStock` and `Busy` are retryable (pick another agent or try
/// again later); the rest indicate caller or upstream-data error.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("order not found")]
    OrderNotFound,

    /// The order is not in a state that admits the requested transition
    /// (double dispatch, dispatching a cancelled order, refusing twice).
    #[error("invalid order state: {0}")]
    InvalidOrderState(#[from] InvalidTransition),

    /// Order data failed integrity checks (non-positive line quantity).
    #[error(transparent)]
    InvalidOrderLine(#[from] AvailabilityError),

    /// The agent's van cannot cover every line; carries the full shortfall
    /// detail.
    #[error("insufficient stock for agent {agent_id}: {} line(s) short", .shortfalls.len())]
    InsufficientStock {
        agent_id: AgentId,
        shortfalls: Vec<Shortfall>,
    },

    /// The agent's dispatch lock could not be acquired within the configured
    /// timeout.
    #[error("dispatch busy: agent {0} has a dispatch in flight")]
    Busy(AgentId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl DispatchError {
    /// Whether the caller may retry the same call (possibly against another
    /// agent) and expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::InsufficientStock { .. } | DispatchError::Busy(_)
        )
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound => DispatchError::OrderNotFound,
            other => DispatchError::Validation(other.to_string()),
        }
    }
}

/// Tunables for the transaction manager.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Bound on waiting for another dispatch to the same agent. On expiry
    /// the call fails with `DispatchError::Busy` instead of deadlocking.
    pub lock_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of a successful dispatch: the completed order and the movements
/// appended for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub order: Order,
    pub movements: Vec<StockMovement>,
}

/// Dispatch transaction manager over a storage backend.
///
/// Generic over `DispatchStore` so tests and the embedding application can
/// choose the backend (`InMemoryDispatchStore` ships here; Arc-wrapped stores
/// work through the blanket impls).
#[derive(Debug)]
pub struct DispatchService<S> {
    store: S,
    pub(crate) locks: AgentLocks,
    config: DispatchConfig,
}

impl<S> DispatchService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, DispatchConfig::default())
    }

    pub fn with_config(store: S, config: DispatchConfig) -> Self {
        Self {
            store,
            locks: AgentLocks::new(),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> DispatchService<S>
where
    S: DispatchStore,
{
    /// Dispatch a pending order to an agent, deducting the agent's van stock.
    ///
    /// On success the order is `completed` and one `sale` movement per line
    /// is on the ledger. On any failure the order stays `pending` and no
    /// balance changes.
    pub fn confirm_dispatch(
        &self,
        order_id: OrderId,
        agent_id: AgentId,
    ) -> Result<DispatchReceipt, DispatchError> {
        // 1) Load and check the transition is legal before taking any lock.
        let order = self.load_order(order_id)?;
        order.status().transition(OrderStatus::Completed)?;

        // 2) Per-agent critical section, bounded wait.
        let lock = self.locks.lock_for(agent_id);
        let Some(_guard) = lock.try_lock_for(self.config.lock_timeout) else {
            warn!(%order_id, %agent_id, "dispatch lock wait timed out");
            return Err(DispatchError::Busy(agent_id));
        };

        // 3) Authoritative snapshot, re-read inside the critical section.
        let balances = self.store.balances(agent_id).map_err(storage)?;
        let verdict = evaluate(&order, &balances)?;
        if !verdict.fulfillable() {
            return Err(DispatchError::InsufficientStock {
                agent_id,
                shortfalls: verdict.into_shortfalls(),
            });
        }

        // 4) One sale movement per order line.
        let now = Utc::now();
        let movements = order
            .lines()
            .iter()
            .map(|line| StockMovement::sale(agent_id, line.product_id, line.quantity, order_id, now))
            .collect::<Result<Vec<_>, _>>()?;

        // 5-6) Atomic commit: append + pending → completed, or neither.
        match self.store.commit_dispatch(
            order_id,
            OrderStatus::Pending,
            OrderStatus::Completed,
            movements.clone(),
        ) {
            Ok(updated) => {
                info!(
                    %order_id,
                    %agent_id,
                    lines = movements.len(),
                    total = updated.total_amount(),
                    "order dispatched"
                );
                Ok(DispatchReceipt {
                    order: updated,
                    movements,
                })
            }
            Err(StoreError::NegativeBalance { .. }) => {
                // The commit-time re-validation lost a race (e.g. an external
                // adjustment landed between evaluation and commit). Report it
                // as insufficient stock with a fresh shortfall picture.
                let balances = self.store.balances(agent_id).map_err(storage)?;
                let verdict = evaluate(&order, &balances)?;
                Err(DispatchError::InsufficientStock {
                    agent_id,
                    shortfalls: verdict.into_shortfalls(),
                })
            }
            Err(StoreError::StatusConflict { found, .. }) => {
                Err(DispatchError::InvalidOrderState(InvalidTransition {
                    from: found,
                    to: OrderStatus::Completed,
                }))
            }
            Err(StoreError::OrderNotFound) => Err(DispatchError::OrderNotFound),
            Err(e) => Err(storage(e)),
        }
    }

    /// Refuse a pending order: `pending → cancelled`, no ledger effect.
    ///
    /// A single conditional status update; no agent lock is involved.
    pub fn refuse_order(&self, order_id: OrderId) -> Result<Order, DispatchError> {
        let order = self.load_order(order_id)?;
        let next = order.status().transition(OrderStatus::Cancelled)?;

        match self.store.update_status(order_id, order.status(), next) {
            Ok(updated) => {
                info!(%order_id, "order refused");
                Ok(updated)
            }
            Err(StoreError::StatusConflict { found, .. }) => {
                Err(DispatchError::InvalidOrderState(InvalidTransition {
                    from: found,
                    to: OrderStatus::Cancelled,
                }))
            }
            Err(StoreError::OrderNotFound) => Err(DispatchError::OrderNotFound),
            Err(e) => Err(storage(e)),
        }
    }

    /// Availability verdict on a best-effort snapshot, for presentation.
    ///
    /// Staleness is acceptable here; `confirm_dispatch` never trusts this
    /// path and re-evaluates under the agent lock.
    pub fn evaluate_stock(
        &self,
        order_id: OrderId,
        agent_id: AgentId,
    ) -> Result<StockVerdict, DispatchError> {
        let order = self.load_order(order_id)?;
        let balances = self.store.balances(agent_id).map_err(storage)?;
        Ok(evaluate(&order, &balances)?)
    }

    /// Record a van load: one positive `replenishment` movement, serialized
    /// with dispatches for the same agent.
    pub fn record_replenishment(
        &self,
        agent_id: AgentId,
        product_id: ProductId,
        quantity: i64,
        note: Option<String>,
    ) -> Result<StockMovement, DispatchError> {
        let movement =
            StockMovement::replenishment(agent_id, product_id, quantity, note, Utc::now())?;

        let lock = self.locks.lock_for(agent_id);
        let Some(_guard) = lock.try_lock_for(self.config.lock_timeout) else {
            warn!(%agent_id, "replenishment lock wait timed out");
            return Err(DispatchError::Busy(agent_id));
        };

        self.store.append(vec![movement.clone()]).map_err(storage)?;
        info!(%agent_id, %product_id, quantity, "van replenished");
        Ok(movement)
    }

    /// The query layer's listing, exposed on the service for callers that
    /// hold nothing but the service.
    pub fn list_orders(
        &self,
        filter: StatusFilter,
        search_term: &str,
    ) -> Result<Vec<Order>, DispatchError> {
        crate::query::list_orders(&self.store, filter, search_term).map_err(storage)
    }

    fn load_order(&self, order_id: OrderId) -> Result<Order, DispatchError> {
        self.store
            .get_order(order_id)
            .map_err(storage)?
            .ok_or(DispatchError::OrderNotFound)
    }
}

fn storage(e: StoreError) -> DispatchError {
    DispatchError::Storage(e.to_string())
}
