//! Dispatch query layer: the read side used by presentation.
//!
//! No mutation here; listing reads one consistent snapshot from the store
//! and the stock-status pass-through runs on best-effort balances (the
//! transaction manager never trusts this path).

use core::str::FromStr;

use vanflow_core::DomainError;
use vanflow_dispatch::{evaluate, StockVerdict};
use vanflow_orders::{Order, OrderStatus};
use vanflow_parties::Agent;

use crate::dispatcher::DispatchError;
use crate::store::{OrderStore, StockLedger, StoreError};

/// Status filter for order listings: everything, or one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == wanted,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Only(OrderStatus::Pending)),
            "completed" => Ok(StatusFilter::Only(OrderStatus::Completed)),
            "cancelled" => Ok(StatusFilter::Only(OrderStatus::Cancelled)),
            other => Err(DomainError::validation(format!(
                "unknown status filter: {other}"
            ))),
        }
    }
}

/// The working set of orders for review: filtered by status, matched against
/// a free-text term, most recently created first.
///
/// The term matches case-insensitively as a substring of the order id, the
/// customer name, and the customer email; an empty term matches everything.
pub fn list_orders<S>(
    store: &S,
    filter: StatusFilter,
    search_term: &str,
) -> Result<Vec<Order>, StoreError>
where
    S: OrderStore + ?Sized,
{
    let term = search_term.trim().to_lowercase();
    let mut orders = store.list_orders()?;
    orders.retain(|order| filter.matches(order.status()) && matches_term(order, &term));
    orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    Ok(orders)
}

/// Presentation-grade availability check for one order against one agent.
pub fn stock_status_for<L>(
    ledger: &L,
    order: &Order,
    agent: &Agent,
) -> Result<StockVerdict, DispatchError>
where
    L: StockLedger + ?Sized,
{
    let balances = ledger
        .balances(agent.id_typed())
        .map_err(|e| DispatchError::Storage(e.to_string()))?;
    Ok(evaluate(order, &balances)?)
}

fn matches_term(order: &Order, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    if order.id_typed().to_string().contains(term) {
        return true;
    }
    let customer = order.customer();
    if customer.name().to_lowercase().contains(term) {
        return true;
    }
    customer
        .email()
        .is_some_and(|email| email.to_lowercase().contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use vanflow_core::{AgentId, CustomerId, OrderId, ProductId};
    use vanflow_ledger::StockMovement;
    use vanflow_orders::OrderLine;
    use vanflow_parties::Customer;

    use crate::store::InMemoryDispatchStore;

    fn customer(name: &str, email: Option<&str>) -> Customer {
        Customer::new(CustomerId::new(), name, email.map(str::to_string)).unwrap()
    }

    fn order_created_at(customer: Customer, minutes_ago: i64) -> Order {
        Order::new(
            OrderId::new(),
            customer,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            vec![OrderLine {
                line_no: 1,
                product_id: ProductId::new(),
                quantity: 1,
                unit_price: 100,
            }],
            Utc::now() - Duration::minutes(minutes_ago),
        )
        .unwrap()
    }

    fn seeded_store() -> (InMemoryDispatchStore, OrderId, OrderId, OrderId) {
        let store = InMemoryDispatchStore::new();

        let oldest = order_created_at(customer("Acme Retail", Some("orders@acme.example")), 30);
        let middle = order_created_at(customer("Blue Kiosk", Some("buy@bluekiosk.example")), 20);
        let newest = order_created_at(customer("Corner Shop", None), 10);

        let (oldest_id, middle_id, newest_id) =
            (oldest.id_typed(), middle.id_typed(), newest.id_typed());
        store.insert_order(oldest).unwrap();
        store.insert_order(middle).unwrap();
        store.insert_order(newest).unwrap();

        // One terminal order in the mix.
        store
            .update_status(middle_id, OrderStatus::Pending, OrderStatus::Cancelled)
            .unwrap();

        (store, oldest_id, middle_id, newest_id)
    }

    #[test]
    fn pending_filter_returns_pending_newest_first() {
        let (store, oldest_id, _, newest_id) = seeded_store();

        let listed = list_orders(&store, StatusFilter::Only(OrderStatus::Pending), "").unwrap();
        let ids: Vec<OrderId> = listed.iter().map(|o| o.id_typed()).collect();
        assert_eq!(ids, vec![newest_id, oldest_id]);
        assert!(listed.iter().all(|o| o.status() == OrderStatus::Pending));
    }

    #[test]
    fn all_filter_keeps_every_status() {
        let (store, ..) = seeded_store();
        let listed = list_orders(&store, StatusFilter::All, "").unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[test]
    fn search_matches_customer_name_case_insensitively() {
        let (store, oldest_id, ..) = seeded_store();
        let listed = list_orders(&store, StatusFilter::All, "aCmE").unwrap();
        let ids: Vec<OrderId> = listed.iter().map(|o| o.id_typed()).collect();
        assert_eq!(ids, vec![oldest_id]);
    }

    #[test]
    fn search_matches_customer_email() {
        let (store, _, middle_id, _) = seeded_store();
        let listed = list_orders(&store, StatusFilter::All, "bluekiosk").unwrap();
        let ids: Vec<OrderId> = listed.iter().map(|o| o.id_typed()).collect();
        assert_eq!(ids, vec![middle_id]);
    }

    #[test]
    fn search_matches_order_id_substring() {
        let (store, _, _, newest_id) = seeded_store();
        let term = newest_id.to_string()[..8].to_string();
        let listed = list_orders(&store, StatusFilter::All, &term).unwrap();
        assert!(listed.iter().any(|o| o.id_typed() == newest_id));
    }

    #[test]
    fn blank_search_term_matches_everything() {
        let (store, ..) = seeded_store();
        let listed = list_orders(&store, StatusFilter::All, "   ").unwrap();
        assert_eq!(listed.len(), 3);
    }

    #[test]
    fn status_filter_parses_from_str() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "Pending".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(OrderStatus::Pending)
        );
        assert_eq!(
            "completed".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(OrderStatus::Completed)
        );
        assert_eq!(
            "cancelled".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(OrderStatus::Cancelled)
        );
        assert!("shipped".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn stock_status_for_reports_presentation_shortfalls() {
        let store = InMemoryDispatchStore::new();
        let agent = Agent::new(AgentId::new(), "Dana K.").unwrap();
        let product_id = ProductId::new();
        store
            .append(vec![
                StockMovement::replenishment(agent.id_typed(), product_id, 2, None, Utc::now())
                    .unwrap(),
            ])
            .unwrap();

        let order = Order::new(
            OrderId::new(),
            customer("Acme Retail", None),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            vec![OrderLine {
                line_no: 1,
                product_id,
                quantity: 4,
                unit_price: 100,
            }],
            Utc::now(),
        )
        .unwrap();

        let verdict = stock_status_for(&store, &order, &agent).unwrap();
        assert!(!verdict.fulfillable());
        assert_eq!(verdict.shortfalls()[0].needed, 4);
        assert_eq!(verdict.shortfalls()[0].available, 2);
    }
}
