use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use vanflow_core::{AgentId, CustomerId, OrderId, ProductId};
use vanflow_dispatch::evaluate;
use vanflow_infra::{DispatchService, InMemoryDispatchStore, OrderStore, StockLedger};
use vanflow_ledger::{StockMovement, VanBalances};
use vanflow_orders::{Order, OrderLine};
use vanflow_parties::Customer;

fn order_with_lines(products: &[ProductId], quantity: i64) -> Order {
    let customer = Customer::new(CustomerId::new(), "Bench Customer", None).unwrap();
    let lines = products
        .iter()
        .enumerate()
        .map(|(i, product_id)| OrderLine {
            line_no: i as u32 + 1,
            product_id: *product_id,
            quantity,
            unit_price: 100,
        })
        .collect();
    Order::new(
        OrderId::new(),
        customer,
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        lines,
        Utc::now(),
    )
    .unwrap()
}

/// Pure availability evaluation across order sizes.
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for lines in [1usize, 5, 20] {
        let products: Vec<ProductId> = (0..lines).map(|_| ProductId::new()).collect();
        let order = order_with_lines(&products, 3);
        let balances: VanBalances = products.iter().map(|p| (*p, 10i64)).collect();

        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, _| {
            b.iter(|| evaluate(black_box(&order), black_box(&balances)).unwrap());
        });
    }
    group.finish();
}

/// Full check-then-commit dispatch against a freshly seeded store.
fn bench_confirm_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("confirm_dispatch");
    for lines in [1usize, 5, 20] {
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, &lines| {
            b.iter_batched(
                || {
                    let store = Arc::new(InMemoryDispatchStore::new());
                    let agent_id = AgentId::new();
                    let products: Vec<ProductId> = (0..lines).map(|_| ProductId::new()).collect();
                    let replenishments = products
                        .iter()
                        .map(|p| {
                            StockMovement::replenishment(agent_id, *p, 10, None, Utc::now())
                                .unwrap()
                        })
                        .collect();
                    store.append(replenishments).unwrap();

                    let order = order_with_lines(&products, 3);
                    let order_id = order.id_typed();
                    store.insert_order(order).unwrap();

                    (DispatchService::new(store), order_id, agent_id)
                },
                |(service, order_id, agent_id)| {
                    service.confirm_dispatch(order_id, agent_id).unwrap()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_confirm_dispatch);
criterion_main!(benches);
