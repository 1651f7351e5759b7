use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vanflow_core::{AgentId, DomainError, DomainResult, Entity, MovementId, OrderId, ProductId};

/// Kind tag of a stock movement.
///
/// Only `sale` is produced by the dispatch path; `replenishment` records van
/// loading; `adjustment` is reserved for external correction tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Sale,
    Replenishment,
    Adjustment,
}

/// Immutable ledger entry: a signed change in an agent's carried quantity of
/// a product.
///
/// Movements are append-only; once recorded they are never mutated or
/// deleted. The per-(agent, product) balance is the running sum of deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    id: MovementId,
    agent_id: AgentId,
    product_id: ProductId,
    /// Signed quantity delta (negative for a sale deduction).
    quantity: i64,
    kind: MovementKind,
    order_id: Option<OrderId>,
    note: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl StockMovement {
    /// Sale deduction for one order line: delta is `-quantity`.
    pub fn sale(
        agent_id: AgentId,
        product_id: ProductId,
        quantity: i64,
        order_id: OrderId,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("sale quantity must be positive"));
        }
        Ok(Self {
            id: MovementId::new(),
            agent_id,
            product_id,
            quantity: -quantity,
            kind: MovementKind::Sale,
            order_id: Some(order_id),
            note: None,
            occurred_at,
        })
    }

    /// Van load: delta is `+quantity`.
    pub fn replenishment(
        agent_id: AgentId,
        product_id: ProductId,
        quantity: i64,
        note: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation(
                "replenishment quantity must be positive",
            ));
        }
        Ok(Self {
            id: MovementId::new(),
            agent_id,
            product_id,
            quantity,
            kind: MovementKind::Replenishment,
            order_id: None,
            note,
            occurred_at,
        })
    }

    /// Manual correction with an arbitrary non-zero delta.
    pub fn adjustment(
        agent_id: AgentId,
        product_id: ProductId,
        delta: i64,
        note: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if delta == 0 {
            return Err(DomainError::validation("adjustment delta cannot be zero"));
        }
        Ok(Self {
            id: MovementId::new(),
            agent_id,
            product_id,
            quantity: delta,
            kind: MovementKind::Adjustment,
            order_id: None,
            note,
            occurred_at,
        })
    }

    pub fn id_typed(&self) -> MovementId {
        self.id
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Signed quantity delta.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
