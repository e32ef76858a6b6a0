use std::sync::Arc;

use async_trait::async_trait;
use common::{
    CatalogItem, CatalogItemId, Money, NewCatalogItem, NewUser, ServiceError, ServiceLocation,
    User, UserId,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use discovery::{CATALOG_AUTHORITY, Directory, InMemoryDirectory, Registration, USER_AUTHORITY};
use orchestration::{
    AggregateRequest, CatalogAuthority, CreateOrderRequest, FanOutAggregator,
    InMemoryCatalogAuthority, InMemoryUserAuthority, Invoker, OrderItemRequest, OrderWorkflow,
    RemoteCall, RemoteRecord, SubRequest, UserAuthority,
};
use store::InMemoryStore;

struct EchoInvoker;

#[async_trait]
impl Invoker for EchoInvoker {
    async fn invoke(
        &self,
        _location: &ServiceLocation,
        call: &RemoteCall,
    ) -> Result<RemoteRecord, ServiceError> {
        match *call {
            RemoteCall::GetUser(id) => Ok(RemoteRecord::User(User {
                id,
                name: "Bench".to_string(),
                email: "bench@example.com".to_string(),
            })),
            RemoteCall::GetCatalogItem(id) => Ok(RemoteRecord::CatalogItem(CatalogItem {
                id,
                name: "Widget".to_string(),
                description: String::new(),
                price: Money::from_cents(1000),
            })),
            RemoteCall::GetOrder(id) => Err(ServiceError::not_found(format!("order {id} not found"))),
        }
    }
}

fn bench_fan_out(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let directory = InMemoryDirectory::new();
    rt.block_on(async {
        for service in [USER_AUTHORITY, CATALOG_AUTHORITY] {
            directory
                .register(&Registration::new(service, ServiceLocation::new("127.0.0.1", 9000)))
                .await
                .unwrap();
        }
    });
    let aggregator = FanOutAggregator::new(Arc::new(directory), Arc::new(EchoInvoker));

    let mut group = c.benchmark_group("aggregator/fan_out");
    for width in [2usize, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter(|| {
                rt.block_on(async {
                    let subrequests = (0..width)
                        .map(|i| {
                            SubRequest::new(
                                format!("item-{i}"),
                                RemoteCall::GetCatalogItem(CatalogItemId::new(i as i64)),
                            )
                        })
                        .collect();
                    let request = AggregateRequest::new(subrequests).unwrap();
                    aggregator.execute(request).await.unwrap();
                });
            });
        });
    }
    group.finish();
}

fn bench_user_and_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let directory = InMemoryDirectory::new();
    rt.block_on(async {
        for service in [USER_AUTHORITY, CATALOG_AUTHORITY] {
            directory
                .register(&Registration::new(service, ServiceLocation::new("127.0.0.1", 9000)))
                .await
                .unwrap();
        }
    });
    let aggregator = FanOutAggregator::new(Arc::new(directory), Arc::new(EchoInvoker));

    c.bench_function("aggregator/user_and_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                aggregator
                    .user_and_item(UserId::new(1), CatalogItemId::new(1))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let users = InMemoryUserAuthority::new();
    let catalog = InMemoryCatalogAuthority::new();
    let (user, items) = rt.block_on(async {
        let user = users
            .create_user(NewUser {
                name: "Bench".to_string(),
                email: "bench@example.com".to_string(),
            })
            .await
            .unwrap();
        let mut items = Vec::new();
        for i in 0..4 {
            let item = catalog
                .create_item(NewCatalogItem {
                    name: format!("Widget {i}"),
                    description: String::new(),
                    price: Money::from_cents(100 * (i + 1)),
                })
                .await
                .unwrap();
            items.push(item.id);
        }
        (user, items)
    });
    let workflow = OrderWorkflow::new(InMemoryStore::new(), users, catalog);

    c.bench_function("orchestration/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let request = CreateOrderRequest {
                    user_id: user.id,
                    items: items
                        .iter()
                        .map(|&id| OrderItemRequest::new(id, 2))
                        .collect(),
                };
                workflow.create_order(request).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_fan_out, bench_user_and_item, bench_create_order);
criterion_main!(benches);
