//! Stock availability evaluation.
//!
//! Pure decision logic: given an order and a snapshot of an agent's balances,
//! decide whether every line is satisfiable and report the shortfalls
//! otherwise. The evaluator never reads storage itself; callers supply the
//! snapshot so a verdict is reproducible against known inputs. The
//! transaction manager re-runs this inside its critical section; the query
//! layer runs it on best-effort snapshots for display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vanflow_core::{ProductId, ValueObject};
use vanflow_ledger::VanBalances;
use vanflow_orders::Order;

/// Data-integrity failure detected during evaluation.
///
/// Not a shortfall: a non-positive line quantity means the order record is
/// corrupt (orders deserialized from foreign stores bypass constructor
/// validation).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("invalid order line {line_no}: quantity {quantity} is not positive")]
    InvalidOrderLine { line_no: u32, quantity: i64 },
}

/// Gap between one line's demand and the agent's available balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub product_id: ProductId,
    pub needed: i64,
    pub available: i64,
}

impl ValueObject for Shortfall {}

/// Evaluation result: fulfillable iff no shortfalls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockVerdict {
    shortfalls: Vec<Shortfall>,
}

impl StockVerdict {
    pub fn fulfillable(&self) -> bool {
        self.shortfalls.is_empty()
    }

    /// Shortfalls in the order's line sequence.
    pub fn shortfalls(&self) -> &[Shortfall] {
        &self.shortfalls
    }

    pub fn into_shortfalls(self) -> Vec<Shortfall> {
        self.shortfalls
    }
}

/// Evaluate whether `balances` can satisfy every line of `order`.
///
/// Lines are walked in order sequence; quantity already claimed by an earlier
/// satisfied line of the same product is not counted twice, so the verdict
/// agrees with what an atomic commit of all the deductions would do. A
/// product absent from the snapshot is available at 0.
pub fn evaluate(order: &Order, balances: &VanBalances) -> Result<StockVerdict, AvailabilityError> {
    let mut remaining: HashMap<ProductId, i64> = HashMap::new();
    let mut shortfalls = Vec::new();

    for line in order.lines() {
        if line.quantity <= 0 {
            return Err(AvailabilityError::InvalidOrderLine {
                line_no: line.line_no,
                quantity: line.quantity,
            });
        }

        let available = *remaining
            .entry(line.product_id)
            .or_insert_with(|| balances.quantity(line.product_id));

        if available < line.quantity {
            shortfalls.push(Shortfall {
                product_id: line.product_id,
                needed: line.quantity,
                available: available.max(0),
            });
        } else {
            remaining
                .entry(line.product_id)
                .and_modify(|q| *q -= line.quantity);
        }
    }

    Ok(StockVerdict { shortfalls })
}
