use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use address_watch::blockchain::{abi_decoder, classify, match_transaction};
use address_watch::models::{AddressRegistry, Transaction};
use alloy_primitives::U256;

const TOKEN: &str = "0x5c95260ebd1dd21547528e73dc601d74b2793e0d";
const WATCHED: &str = "0x29772ce1cb7c1cefcae07fa7f03dc7d2de8cba83";

fn create_test_transaction(id: u64) -> Transaction {
    let hash = format!("0x{:064x}", id);
    let from = format!("0x{:040x}", id);
    match id % 4 {
        0 => Transaction::new(&hash, &from, Some(WATCHED), U256::from(id + 1), "0x"),
        1 => {
            let data = format!("0xa9059cbb{:0>64}{:064x}", &WATCHED[2..], id);
            Transaction::new(&hash, &from, Some(TOKEN), U256::ZERO, &data)
        }
        2 => {
            let data = format!("0x23b872dd{:0>64}{:0>64}{:064x}", &from[2..], &WATCHED[2..], id);
            Transaction::new(&hash, &from, Some(TOKEN), U256::ZERO, &data)
        }
        _ => {
            let data = format!("0x095ea7b3{}", "ab".repeat(100));
            Transaction::new(&hash, &from, Some(TOKEN), U256::ZERO, &data)
        }
    }
}

fn bench_classify(c: &mut Criterion) {
    let transactions: Vec<Transaction> = (0..4).map(create_test_transaction).collect();
    let mut group = c.benchmark_group("classify");

    for (name, tx) in ["native", "transfer", "transfer_from", "contract_call"]
        .iter()
        .zip(transactions.iter())
    {
        group.bench_with_input(BenchmarkId::new("single", name), tx, |b, tx| {
            b.iter(|| classify(black_box(tx)));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let transfer = create_test_transaction(1);
    let transfer_from = create_test_transaction(2);
    let mut group = c.benchmark_group("decode");

    group.bench_function("transfer", |b| {
        b.iter(|| abi_decoder::decode(black_box(&transfer)));
    });
    group.bench_function("transfer_from", |b| {
        b.iter(|| abi_decoder::decode(black_box(&transfer_from)));
    });

    group.finish();
}

fn bench_block_matching(c: &mut Criterion) {
    let registry = AddressRegistry::new([WATCHED, TOKEN]);
    let mut group = c.benchmark_group("block_matching");

    for size in [10u64, 100, 1000].iter() {
        let block: Vec<Transaction> = (0..*size).map(create_test_transaction).collect();
        group.bench_with_input(BenchmarkId::new("match_transaction", size), &block, |b, block| {
            b.iter(|| {
                block
                    .iter()
                    .map(|tx| match_transaction(black_box(&registry), black_box(tx)).len())
                    .sum::<usize>()
            });
        });
    }

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(100);
    targets = bench_classify, bench_decode, bench_block_matching
);
criterion_main!(benches);
