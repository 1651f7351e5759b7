use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use vanflow_core::{AgentId, ProductId, ValueObject};

use crate::movement::StockMovement;

/// Snapshot of the per-product quantities one agent currently carries.
///
/// Derived value: equal to the running sum of all movement deltas for that
/// agent. A product with no movements reads as 0. Post-commit balances are
/// never negative; a snapshot built from an arbitrary movement slice makes no
/// such promise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VanBalances {
    by_product: HashMap<ProductId, i64>,
}

impl VanBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a snapshot by summing the given movements for one agent.
    /// Movements belonging to other agents are ignored.
    pub fn from_movements<'a>(
        agent_id: AgentId,
        movements: impl IntoIterator<Item = &'a StockMovement>,
    ) -> Self {
        let mut balances = Self::new();
        for m in movements {
            if m.agent_id() == agent_id {
                balances.apply(m.product_id(), m.quantity());
            }
        }
        balances
    }

    /// Current quantity for a product; 0 if the product never moved.
    pub fn quantity(&self, product_id: ProductId) -> i64 {
        self.by_product.get(&product_id).copied().unwrap_or(0)
    }

    /// Fold one signed delta into the snapshot.
    pub fn apply(&mut self, product_id: ProductId, delta: i64) {
        *self.by_product.entry(product_id).or_insert(0) += delta;
    }

    pub fn is_empty(&self) -> bool {
        self.by_product.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProductId, i64)> + '_ {
        self.by_product.iter().map(|(p, q)| (*p, *q))
    }
}

impl FromIterator<(ProductId, i64)> for VanBalances {
    fn from_iter<I: IntoIterator<Item = (ProductId, i64)>>(iter: I) -> Self {
        Self {
            by_product: iter.into_iter().collect(),
        }
    }
}

impl ValueObject for VanBalances {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::StockMovement;
    use chrono::Utc;
    use proptest::prelude::*;
    use vanflow_core::OrderId;

    #[test]
    fn unknown_product_reads_zero() {
        let balances = VanBalances::new();
        assert_eq!(balances.quantity(ProductId::new()), 0);
        assert!(balances.is_empty());
    }

    #[test]
    fn apply_accumulates_signed_deltas() {
        let product_id = ProductId::new();
        let mut balances = VanBalances::new();
        balances.apply(product_id, 10);
        balances.apply(product_id, -3);
        assert_eq!(balances.quantity(product_id), 7);
    }

    #[test]
    fn from_movements_ignores_other_agents() {
        let agent_id = AgentId::new();
        let other_agent = AgentId::new();
        let product_id = ProductId::new();
        let now = Utc::now();

        let movements = vec![
            StockMovement::replenishment(agent_id, product_id, 8, None, now).unwrap(),
            StockMovement::replenishment(other_agent, product_id, 100, None, now).unwrap(),
            StockMovement::sale(agent_id, product_id, 5, OrderId::new(), now).unwrap(),
        ];

        let balances = VanBalances::from_movements(agent_id, &movements);
        assert_eq!(balances.quantity(product_id), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of movements, the rebuilt balance per
        /// product equals the signed sum of that product's deltas.
        #[test]
        fn balance_equals_signed_sum_of_deltas(
            deltas in prop::collection::vec((0usize..4, -50i64..50i64), 1..40)
        ) {
            let agent_id = AgentId::new();
            let products: Vec<ProductId> = (0..4).map(|_| ProductId::new()).collect();
            let now = Utc::now();

            let mut movements = Vec::new();
            let mut expected: HashMap<ProductId, i64> = HashMap::new();
            for (idx, delta) in deltas {
                if delta == 0 {
                    continue;
                }
                let product_id = products[idx];
                movements.push(
                    StockMovement::adjustment(agent_id, product_id, delta, None, now).unwrap(),
                );
                *expected.entry(product_id).or_insert(0) += delta;
            }

            let balances = VanBalances::from_movements(agent_id, &movements);
            for product_id in &products {
                prop_assert_eq!(
                    balances.quantity(*product_id),
                    expected.get(product_id).copied().unwrap_or(0)
                );
            }
        }
    }
}
