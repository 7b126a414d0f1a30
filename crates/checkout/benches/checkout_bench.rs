use checkout::{CheckoutProcessor, TracingNotifier};
use common::{Money, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Cart, Customer};
use store::{Catalog, InMemoryStore, Product};

async fn seeded_store(products: usize) -> (InMemoryStore, Vec<Product>) {
    let store = InMemoryStore::new();
    let mut seeded = Vec::with_capacity(products);
    for i in 0..products {
        let product = Product::new(format!("Product {i}"), Money::from_cents(1000), u32::MAX);
        store.insert_product(product.clone()).await.unwrap();
        seeded.push(product);
    }
    (store, seeded)
}

fn bench_checkout_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, products) = rt.block_on(seeded_store(1));
    let processor = CheckoutProcessor::new(store.clone(), TracingNotifier);
    let customer = Customer::new(UserId::new(), "bench", "bench@example.com");

    c.bench_function("checkout/single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut cart = Cart::new();
                cart.add(products[0].id, 1);
                processor.checkout(&customer, &mut cart).await.unwrap();
            });
        });
    });
}

fn bench_checkout_ten_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, products) = rt.block_on(seeded_store(10));
    let processor = CheckoutProcessor::new(store.clone(), TracingNotifier);
    let customer = Customer::new(UserId::new(), "bench", "bench@example.com");

    c.bench_function("checkout/ten_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut cart = Cart::new();
                for product in &products {
                    cart.add(product.id, 2);
                }
                processor.checkout(&customer, &mut cart).await.unwrap();
            });
        });
    });
}

fn bench_preview(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, products) = rt.block_on(seeded_store(10));
    let processor = CheckoutProcessor::new(store, TracingNotifier);
    let mut cart = Cart::new();
    for product in &products {
        cart.add(product.id, 1);
    }

    c.bench_function("checkout/preview_ten_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                processor.preview(&cart).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_checkout_single_line,
    bench_checkout_ten_lines,
    bench_preview
);
criterion_main!(benches);
