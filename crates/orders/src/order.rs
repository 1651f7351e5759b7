use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vanflow_core::{DomainError, DomainResult, Entity, OrderId, ProductId, ValueObject};
use vanflow_parties::Customer;

/// Order status lifecycle.
///
/// `Pending` is the initial state; `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Enforce the transition topology: `pending → completed` and
    /// `pending → cancelled` are the only legal edges.
    ///
    /// Whether a legal transition is business-rule-valid (stock sufficiency)
    /// is the transaction manager's call, not this one.
    pub fn transition(self, to: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        match (self, to) {
            (OrderStatus::Pending, OrderStatus::Completed)
            | (OrderStatus::Pending, OrderStatus::Cancelled) => Ok(to),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Requested order-state transition is not a legal edge.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("illegal order status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Order line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents). Fixed at order creation.
    pub unit_price: u64,
}

impl OrderLine {
    /// Line quantity times unit price, in smallest currency unit.
    pub fn extended_price(&self) -> u128 {
        self.quantity as u128 * self.unit_price as u128
    }
}

impl ValueObject for OrderLine {}

/// Customer order awaiting dispatch.
///
/// Created by an upstream ordering process; mutated only through the status
/// state machine; never deleted by this core. The total amount is computed
/// once at construction from line extended prices and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    status: OrderStatus,
    customer: Customer,
    created_at: DateTime<Utc>,
    order_date: NaiveDate,
    total_amount: u64,
    lines: Vec<OrderLine>,
}

impl Order {
    pub fn new(
        id: OrderId,
        customer: Customer,
        order_date: NaiveDate,
        lines: Vec<OrderLine>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }

        let mut seen = HashSet::new();
        let mut total: u128 = 0;
        for line in &lines {
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "line {}: quantity must be positive",
                    line.line_no
                )));
            }
            if !seen.insert(line.line_no) {
                return Err(DomainError::validation(format!(
                    "line {}: duplicate line number",
                    line.line_no
                )));
            }
            total += line.extended_price();
        }

        let total_amount = u64::try_from(total)
            .map_err(|_| DomainError::validation("order total overflows"))?;

        Ok(Self {
            id,
            status: OrderStatus::Pending,
            customer,
            created_at,
            order_date,
            total_amount,
            lines,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    /// Sum of line extended prices, fixed at creation.
    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_dispatchable(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Transition `pending → completed`.
    pub fn complete(&mut self) -> Result<(), InvalidTransition> {
        self.status = self.status.transition(OrderStatus::Completed)?;
        Ok(())
    }

    /// Transition `pending → cancelled`.
    pub fn cancel(&mut self) -> Result<(), InvalidTransition> {
        self.status = self.status.transition(OrderStatus::Cancelled)?;
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
