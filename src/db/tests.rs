use tempfile::tempdir;

use super::{
    assign_delivery_round, escape_like, find_open_orders_by_contact, get_order_by_code,
    get_order_by_id, init_pool, insert_order, list_orders, search_open_orders,
    update_order_tracking, DbPool, NewOrder, OrderFilter, OrderStatus,
};

async fn seed(pool: &DbPool, code: &str, contact: &str, tracking: Option<&str>) -> i64 {
    insert_order(
        pool,
        NewOrder {
            order_code: code,
            customer_contact: contact,
            status: OrderStatus::Pending,
            tracking_number: tracking,
            delivery_round: None,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn init_db_runs_migrations_and_enables_wal() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode;")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal");

    let tables: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'orders'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(tables, 1);
}

#[tokio::test]
async fn insert_and_read_back_order() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    let order_id = seed(&pool, "ORD-001", "สมชาย ใจดี\n0812345678\nกรุงเทพฯ", None).await;
    let order = get_order_by_id(&pool, order_id).await.unwrap();
    assert_eq!(order.order_code, "ORD-001");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_name(), "สมชาย ใจดี");
    assert!(order.is_open());

    let by_code = get_order_by_code(&pool, " ORD-001 ").await.unwrap().unwrap();
    assert_eq!(by_code.order_id, order_id);
    assert!(get_order_by_code(&pool, "ORD-404").await.unwrap().is_none());
}

#[tokio::test]
async fn contact_lookup_skips_tracked_orders_and_keeps_id_order() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    seed(&pool, "ORD-001", "A\n0812345678", Some("TH0000000001")).await;
    let second = seed(&pool, "ORD-002", "B\n0812345678", None).await;
    let third = seed(&pool, "ORD-003", "C\ntel 0812345678", None).await;
    seed(&pool, "ORD-004", "D\n0899999999", None).await;

    let found = find_open_orders_by_contact(&pool, "0812345678").await.unwrap();
    let ids: Vec<i64> = found.iter().map(|o| o.order_id).collect();
    assert_eq!(ids, vec![second, third]);
}

#[tokio::test]
async fn search_matches_code_or_contact_case_insensitively() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    seed(&pool, "ORD-100", "Alice Walker\n0811111111", None).await;
    seed(&pool, "ORD-200", "Bob\n0822222222", None).await;
    seed(&pool, "ORD-300", "alice cooper\n0833333333", Some("TH1111111111")).await;

    let by_name = search_open_orders(&pool, "ALICE", 5).await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].order_code, "ORD-100");

    let by_code = search_open_orders(&pool, "ord-2", 5).await.unwrap();
    assert_eq!(by_code.len(), 1);
    assert_eq!(by_code[0].order_code, "ORD-200");

    let limited = search_open_orders(&pool, "ORD", 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    seed(&pool, "ORD-1", "Carol\n0844444444", None).await;
    seed(&pool, "ORD_2", "Dave\n0855555555", None).await;

    assert!(search_open_orders(&pool, "%", 5).await.unwrap().is_empty());
    let underscored = search_open_orders(&pool, "ORD_1", 5).await.unwrap();
    assert!(underscored.is_empty());
    let literal = search_open_orders(&pool, "ORD_", 5).await.unwrap();
    assert_eq!(literal.len(), 1);
    assert_eq!(literal[0].order_code, "ORD_2");
    assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
}

#[tokio::test]
async fn update_tracking_reports_missing_rows() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    let order_id = seed(&pool, "ORD-001", "A\n0812345678", None).await;
    let updated = update_order_tracking(&pool, order_id, Some("TH1234567890XY"), OrderStatus::Processing)
        .await
        .unwrap();
    assert!(updated);

    let order = get_order_by_id(&pool, order_id).await.unwrap();
    assert_eq!(order.tracking_number.as_deref(), Some("TH1234567890XY"));
    assert_eq!(order.status, OrderStatus::Processing);

    let missing = update_order_tracking(&pool, 9999, Some("X"), OrderStatus::Pending)
        .await
        .unwrap();
    assert!(!missing);
}

#[tokio::test]
async fn bulk_delivery_round_touches_only_listed_orders() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    let a = seed(&pool, "ORD-A", "A", None).await;
    let b = seed(&pool, "ORD-B", "B", None).await;
    let c = seed(&pool, "ORD-C", "C", None).await;

    assert_eq!(assign_delivery_round(&pool, &[], Some("R1")).await.unwrap(), 0);
    let rows = assign_delivery_round(&pool, &[a, c], Some("R1")).await.unwrap();
    assert_eq!(rows, 2);

    assert_eq!(get_order_by_id(&pool, a).await.unwrap().delivery_round.as_deref(), Some("R1"));
    assert_eq!(get_order_by_id(&pool, b).await.unwrap().delivery_round, None);
    assert_eq!(get_order_by_id(&pool, c).await.unwrap().delivery_round.as_deref(), Some("R1"));
}

#[tokio::test]
async fn list_orders_applies_filters() {
    let dir = tempdir().unwrap();
    let pool = init_pool(dir.path().join("orders.sqlite")).await.unwrap();

    seed(&pool, "ORD-A", "A", None).await;
    seed(&pool, "ORD-B", "B", Some("TH2222222222")).await;
    insert_order(
        &pool,
        NewOrder {
            order_code: "ORD-C",
            customer_contact: "C",
            status: OrderStatus::Shipped,
            tracking_number: None,
            delivery_round: None,
        },
    )
    .await
    .unwrap();

    let all = list_orders(&pool, OrderFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let open = list_orders(&pool, OrderFilter { open_only: true, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(open.len(), 2);

    let shipped = list_orders(
        &pool,
        OrderFilter {
            status: Some(OrderStatus::Shipped),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(shipped.len(), 1);
    assert_eq!(shipped[0].order_code, "ORD-C");

    let limited = list_orders(&pool, OrderFilter { limit: Some(1), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}
