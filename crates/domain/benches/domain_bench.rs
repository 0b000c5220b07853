use common::UserId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::CartService;
use store::{InMemoryStore, ProductRecord, StorefrontStore};

fn bench_get_or_create_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/get_or_create_cart", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = CartService::new(InMemoryStore::new());
                service
                    .get_or_create_active_cart(UserId::new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_add_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = ProductRecord::new("Benchmark Widget", 1000);
    let product_id = product.id;
    rt.block_on(async { store.insert_product(product, i32::MAX).await.unwrap() });
    let service = CartService::new(store);
    let user_id = UserId::new();

    c.bench_function("domain/add_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.add_item(user_id, product_id, 1).await.unwrap();
            });
        });
    });
}

fn bench_cart_snapshot(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let service = CartService::new(store.clone());
    let user_id = UserId::new();

    rt.block_on(async {
        for i in 0..20 {
            let product = ProductRecord::new(format!("Widget {i}"), 500 + i as i64);
            let product_id = product.id;
            store.insert_product(product, 100).await.unwrap();
            service.add_item(user_id, product_id, 2).await.unwrap();
        }
    });

    c.bench_function("domain/cart_snapshot_20_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.get_or_create_active_cart(user_id).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_get_or_create_cart,
    bench_add_item,
    bench_cart_snapshot
);
criterion_main!(benches);
