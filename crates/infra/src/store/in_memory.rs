use std::collections::HashMap;
use std::sync::RwLock;

use vanflow_core::{AgentId, OrderId, ProductId};
use vanflow_ledger::{StockMovement, VanBalances};
use vanflow_orders::{Order, OrderStatus};

use super::r#trait::{DispatchStore, OrderStore, StockLedger, StoreError};

#[derive(Debug, Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    movements: Vec<StockMovement>,
    /// Running balances, maintained on every append. Invariant: equal to the
    /// signed sum of `movements` per (agent, product).
    balances: HashMap<(AgentId, ProductId), i64>,
}

impl Inner {
    /// Validate a batch against current balances without applying it.
    ///
    /// Returns the resulting balance per touched pair; fails on the first
    /// pair that would go negative.
    fn check_batch(
        &self,
        movements: &[StockMovement],
    ) -> Result<HashMap<(AgentId, ProductId), i64>, StoreError> {
        let mut resulting: HashMap<(AgentId, ProductId), i64> = HashMap::new();
        for m in movements {
            let key = (m.agent_id(), m.product_id());
            let entry = resulting
                .entry(key)
                .or_insert_with(|| self.balances.get(&key).copied().unwrap_or(0));
            *entry += m.quantity();
            if *entry < 0 {
                return Err(StoreError::NegativeBalance {
                    agent_id: key.0,
                    product_id: key.1,
                    resulting: *entry,
                });
            }
        }
        Ok(resulting)
    }

    fn apply_batch(
        &mut self,
        movements: Vec<StockMovement>,
        resulting: HashMap<(AgentId, ProductId), i64>,
    ) {
        for (key, balance) in resulting {
            self.balances.insert(key, balance);
        }
        self.movements.extend(movements);
    }
}

/// In-memory order store + movement ledger.
///
/// Intended for tests/dev. One write lock spans both tables, which is what
/// makes `commit_dispatch` trivially atomic; a SQL backend would use a
/// multi-row transaction instead.
#[derive(Debug, Default)]
pub struct InMemoryDispatchStore {
    inner: RwLock<Inner>,
}

impl InMemoryDispatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryDispatchStore {
    fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(inner.orders.get(&order_id).cloned())
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(inner.orders.values().cloned().collect())
    }

    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        let order_id = order.id_typed();
        if inner.orders.contains_key(&order_id) {
            return Err(StoreError::DuplicateOrder);
        }
        inner.orders.insert(order_id, order);
        Ok(())
    }

    fn update_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        let order = inner
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound)?;
        if order.status() != expected {
            return Err(StoreError::StatusConflict {
                expected,
                found: order.status(),
            });
        }

        let updated = transitioned(order, next)?;
        inner.orders.insert(order_id, updated.clone());
        Ok(updated)
    }
}

impl StockLedger for InMemoryDispatchStore {
    fn balance(&self, agent_id: AgentId, product_id: ProductId) -> Result<i64, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(inner
            .balances
            .get(&(agent_id, product_id))
            .copied()
            .unwrap_or(0))
    }

    fn balances(&self, agent_id: AgentId) -> Result<VanBalances, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(inner
            .balances
            .iter()
            .filter(|((agent, _), _)| *agent == agent_id)
            .map(|((_, product), quantity)| (*product, *quantity))
            .collect())
    }

    fn movements_for_order(&self, order_id: OrderId) -> Result<Vec<StockMovement>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(inner
            .movements
            .iter()
            .filter(|m| m.order_id() == Some(order_id))
            .cloned()
            .collect())
    }

    fn movements_for_agent(&self, agent_id: AgentId) -> Result<Vec<StockMovement>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(inner
            .movements
            .iter()
            .filter(|m| m.agent_id() == agent_id)
            .cloned()
            .collect())
    }

    fn append(&self, movements: Vec<StockMovement>) -> Result<(), StoreError> {
        if movements.is_empty() {
            return Ok(());
        }
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        let resulting = inner.check_batch(&movements)?;
        inner.apply_batch(movements, resulting);
        Ok(())
    }
}

impl DispatchStore for InMemoryDispatchStore {
    fn commit_dispatch(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        movements: Vec<StockMovement>,
    ) -> Result<Order, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        let order = inner
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound)?;
        if order.status() != expected {
            return Err(StoreError::StatusConflict {
                expected,
                found: order.status(),
            });
        }

        // All checks precede any mutation.
        let updated = transitioned(order, next)?;
        let resulting = inner.check_batch(&movements)?;

        inner.apply_batch(movements, resulting);
        inner.orders.insert(order_id, updated.clone());
        Ok(updated)
    }
}

/// Apply a status transition to a copy of the order.
fn transitioned(mut order: Order, next: OrderStatus) -> Result<Order, StoreError> {
    match next {
        OrderStatus::Completed => order.complete(),
        OrderStatus::Cancelled => order.cancel(),
        OrderStatus::Pending => order.status().transition(next).map(|_| ()),
    }
    .map_err(|e| StoreError::Storage(e.to_string()))?;
    Ok(order)
}
