//! Property tests for the catalogue service over the in-memory store
//!
//! Every property is checked across all tag subsets of the fixture and
//! every sort order, so they hold for more than one hand-picked case.

use domain_catalogue::*;
use std::collections::BTreeSet;

const TAGS: [&str; 4] = ["red", "wool", "blue", "sport"];

fn sock(id: &str, name: &str, price: f64, count: i32, tags: &[&str]) -> Sock {
    Sock {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} socks", name),
        image_urls: vec![format!("/catalogue/images/{}.jpg", id)],
        price,
        quantity: count,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn fixture() -> CatalogueServiceImpl<MemorySockStore> {
    let socks = vec![
        sock("a", "Argyle", 12.0, 5, &["red", "wool"]),
        sock("b", "Bamboo", 7.5, 0, &["red"]),
        sock("c", "Crew", 12.0, 9, &["wool"]),
        sock("d", "Dress", 3.0, 2, &["blue", "red", "sport"]),
        sock("e", "Argyle", 18.0, 5, &[]),
        sock("f", "Fuzzy", 7.5, 1, &["blue", "wool"]),
        sock("g", "Gym", 9.99, 12, &["sport", "blue"]),
    ];
    CatalogueServiceImpl::new(MemorySockStore::new(socks).unwrap())
}

fn tag_subsets() -> Vec<Vec<String>> {
    (0..1u32 << TAGS.len())
        .map(|mask| {
            TAGS.iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, t)| t.to_string())
                .collect()
        })
        .collect()
}

fn orders() -> Vec<SortOrder> {
    ["id", "name", "-name", "price", "-price", "count", "-count", "tags", "-tags"]
        .into_iter()
        .map(SortOrder::parse_lenient)
        .collect()
}

fn ids(socks: &[Sock]) -> Vec<&str> {
    socks.iter().map(|s| s.id.as_str()).collect()
}

async fn everything(
    service: &CatalogueServiceImpl<MemorySockStore>,
    tags: &[String],
    order: SortOrder,
) -> Vec<Sock> {
    let query = ListQuery::new(tags.to_vec()).order(order).page(0, 0);
    service.list(&CallContext::new(), query).await.unwrap()
}

#[tokio::test]
async fn test_scenario_red_wool_fixture() {
    let store = MemorySockStore::new(vec![
        sock("A", "A", 1.0, 1, &["red", "wool"]),
        sock("B", "B", 1.0, 1, &["red"]),
        sock("C", "C", 1.0, 1, &["wool"]),
    ])
    .unwrap();
    let service = CatalogueServiceImpl::new(store);
    let ctx = CallContext::new();

    let query = ListQuery::new(vec!["red".into()])
        .order(SortOrder::parse_lenient("name"))
        .page(1, 10);
    let socks = service.list(&ctx, query).await.unwrap();
    assert_eq!(ids(&socks), ["A", "B"]);

    assert_eq!(
        service.count(&ctx, &["red".into(), "wool".into()]).await.unwrap(),
        1
    );
    assert_eq!(
        service.get(&ctx, "missing-id").await.unwrap_err(),
        CatalogueError::NotFound("missing-id".into())
    );
    assert_eq!(service.tags(&ctx).await.unwrap(), vec!["red", "wool"]);
}

#[tokio::test]
async fn test_count_matches_unpaged_list() {
    let service = fixture();
    let ctx = CallContext::new();

    for tags in tag_subsets() {
        let count = service.count(&ctx, &tags).await.unwrap();
        for order in orders() {
            assert_eq!(
                count,
                everything(&service, &tags, order).await.len(),
                "tags {:?} order {}",
                tags,
                order
            );
        }
    }
}

#[tokio::test]
async fn test_pages_partition_the_listing() {
    let service = fixture();
    let ctx = CallContext::new();

    for tags in tag_subsets() {
        for order in orders() {
            let full = everything(&service, &tags, order).await;

            for size in 1..=8 {
                let mut joined = Vec::new();
                let mut page = 1;
                loop {
                    let query = ListQuery::new(tags.clone()).order(order).page(page, size);
                    let chunk = service.list(&ctx, query).await.unwrap();
                    assert!(chunk.len() <= size as usize);
                    if chunk.is_empty() {
                        break;
                    }
                    joined.extend(chunk);
                    page += 1;
                }
                assert_eq!(joined, full, "tags {:?} order {} size {}", tags, order, size);
            }
        }
    }
}

#[tokio::test]
async fn test_adding_a_tag_never_grows_the_result() {
    let service = fixture();
    let ctx = CallContext::new();

    for tags in tag_subsets() {
        let base = service.count(&ctx, &tags).await.unwrap();
        for extra in TAGS {
            let mut narrowed = tags.clone();
            narrowed.push(extra.to_string());
            let narrowed_count = service.count(&ctx, &narrowed).await.unwrap();
            assert!(narrowed_count <= base, "{:?} + {}", tags, extra);
        }
    }
}

#[tokio::test]
async fn test_every_listed_id_can_be_fetched() {
    let service = fixture();
    let ctx = CallContext::new();

    for sock in everything(&service, &[], SortOrder::default()).await {
        let fetched = service.get(&ctx, &sock.id).await.unwrap();
        assert_eq!(fetched, sock);
    }
}

#[tokio::test]
async fn test_tags_are_union_of_all_sock_tags() {
    let service = fixture();

    let expected: BTreeSet<String> = everything(&service, &[], SortOrder::default())
        .await
        .into_iter()
        .flat_map(|s| s.tags)
        .collect();
    let tags = service.tags(&CallContext::new()).await.unwrap();

    assert_eq!(tags, expected.into_iter().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_equal_keys_keep_store_order() {
    let service = fixture();

    let by_price = everything(&service, &[], SortOrder::parse_lenient("price")).await;
    assert_eq!(ids(&by_price), ["d", "b", "f", "g", "a", "c", "e"]);

    let by_name_desc = everything(&service, &[], SortOrder::parse_lenient("-name")).await;
    assert_eq!(ids(&by_name_desc), ["g", "f", "d", "c", "b", "a", "e"]);
}

#[tokio::test]
async fn test_decorators_do_not_change_results() {
    let plain = fixture();
    let decorated = LoggingCatalogue::new(std::sync::Arc::new(InstrumentedCatalogue::new(
        std::sync::Arc::new(fixture()),
    )));
    let ctx = CallContext::new();

    for tags in tag_subsets() {
        let query = ListQuery::new(tags.clone()).page(1, 3);
        assert_eq!(
            plain.list(&ctx, query.clone()).await,
            decorated.list(&ctx, query).await
        );
        assert_eq!(plain.count(&ctx, &tags).await, decorated.count(&ctx, &tags).await);
    }
    assert_eq!(
        plain.get(&ctx, "nope").await,
        decorated.get(&ctx, "nope").await
    );
}

#[tokio::test]
async fn test_cancelled_context_fails_every_call() {
    let service = fixture();
    let ctx = CallContext::new();
    ctx.cancel();

    assert_eq!(
        service.list(&ctx, ListQuery::default()).await.unwrap_err(),
        CatalogueError::Cancelled { operation: "list" }
    );
    assert_eq!(
        service.count(&ctx, &[]).await.unwrap_err(),
        CatalogueError::Cancelled { operation: "count" }
    );
    assert_eq!(
        service.get(&ctx, "a").await.unwrap_err(),
        CatalogueError::Cancelled { operation: "get" }
    );
    assert_eq!(
        service.tags(&ctx).await.unwrap_err(),
        CatalogueError::Cancelled { operation: "tags" }
    );
}
