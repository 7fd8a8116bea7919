use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};

use common::{Money, RecordId};
use domain::{OrderService, PlaceOrder};
use notifier::InMemoryNotifier;
use store::{InMemoryStore, Record, RecordCategory, RecordFormat, StoreExt};

fn make_record(qty: u32) -> Record {
    Record {
        id: RecordId::new(),
        artist: "Miles Davis".to_string(),
        album: "Kind of Blue".to_string(),
        price: Money::from_cents(2599),
        qty,
        format: RecordFormat::Vinyl,
        category: RecordCategory::Jazz,
        created: Utc::now(),
        last_modified: Utc::now(),
        mbid: None,
        track_list: None,
    }
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let record = make_record(u32::MAX);

    rt.block_on(async {
        store.create_record(&record).await.unwrap();
    });

    let service = OrderService::new(store, InMemoryNotifier::new());

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .place_order(PlaceOrder::new(record.id, 1))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_order_rejection(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let record = make_record(0);

    rt.block_on(async {
        store.create_record(&record).await.unwrap();
    });

    let service = OrderService::new(store, InMemoryNotifier::new());

    c.bench_function("domain/place_order_insufficient_stock", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = service.place_order(PlaceOrder::new(record.id, 1)).await;
                assert!(result.is_err());
            });
        });
    });
}

criterion_group!(benches, bench_place_order, bench_place_order_rejection);
criterion_main!(benches);
