//! 订单表读写
//!
//! 运单导入只关心 `orders` 表中的联系信息、状态和运单号；
//! “未填运单号” 即 `tracking_number IS NULL` 的订单才是自动匹配和手动搜索的目标。

use sqlx::{QueryBuilder, Sqlite};

use crate::db::{DbPool, NewOrder, OrderFilter, OrderRecord, OrderStatus};

const ORDER_FIELDS: &str = "order_id, order_code, customer_contact, status, tracking_number, \
     delivery_round, created_at, updated_at";

/// 转义 LIKE 通配符，使用户输入按字面匹配（配合 `ESCAPE '\'`）
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn contains_pattern(raw: &str) -> String {
    format!("%{}%", escape_like(raw))
}

pub async fn insert_order(pool: &DbPool, params: NewOrder<'_>) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO orders (order_code, customer_contact, status, tracking_number, delivery_round) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(params.order_code)
    .bind(params.customer_contact)
    .bind(params.status)
    .bind(params.tracking_number)
    .bind(params.delivery_round)
    .execute(pool)
    .await?;

    let order_id = result.last_insert_rowid();
    tracing::debug!(
        order_id,
        order_code = %params.order_code,
        status = ?params.status,
        tracking_number = ?params.tracking_number,
        "Order created"
    );
    Ok(order_id)
}

pub async fn get_order_by_id(pool: &DbPool, order_id: i64) -> Result<OrderRecord, sqlx::Error> {
    let sql = format!("SELECT {} FROM orders WHERE order_id = ?", ORDER_FIELDS);
    sqlx::query_as::<_, OrderRecord>(&sql)
        .bind(order_id)
        .fetch_one(pool)
        .await
}

pub async fn get_order_by_code(
    pool: &DbPool,
    order_code: &str,
) -> Result<Option<OrderRecord>, sqlx::Error> {
    let sql = format!("SELECT {} FROM orders WHERE order_code = ?", ORDER_FIELDS);
    sqlx::query_as::<_, OrderRecord>(&sql)
        .bind(order_code.trim())
        .fetch_optional(pool)
        .await
}

/// 联系信息中包含该电话号码（不区分大小写的子串）的未填运单号订单，按 order_id 升序
pub async fn find_open_orders_by_contact(
    pool: &DbPool,
    phone: &str,
) -> Result<Vec<OrderRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM orders \
         WHERE tracking_number IS NULL AND customer_contact LIKE ? ESCAPE '\\' \
         ORDER BY order_id ASC",
        ORDER_FIELDS
    );
    sqlx::query_as::<_, OrderRecord>(&sql)
        .bind(contains_pattern(phone))
        .fetch_all(pool)
        .await
}

/// 手动对账搜索：订单号或联系信息包含关键词的未填运单号订单
pub async fn search_open_orders(
    pool: &DbPool,
    keyword: &str,
    limit: i64,
) -> Result<Vec<OrderRecord>, sqlx::Error> {
    let pattern = contains_pattern(keyword);
    let sql = format!(
        "SELECT {} FROM orders \
         WHERE tracking_number IS NULL \
         AND (order_code LIKE ? ESCAPE '\\' OR customer_contact LIKE ? ESCAPE '\\') \
         ORDER BY created_at DESC, order_id DESC \
         LIMIT ?",
        ORDER_FIELDS
    );
    sqlx::query_as::<_, OrderRecord>(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// 单行更新运单号和状态，返回是否命中该订单
pub async fn update_order_tracking(
    pool: &DbPool,
    order_id: i64,
    tracking_number: Option<&str>,
    status: OrderStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET tracking_number = ?, status = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE order_id = ?",
    )
    .bind(tracking_number)
    .bind(status)
    .bind(order_id)
    .execute(pool)
    .await?;
    tracing::debug!(
        order_id,
        tracking_number = ?tracking_number,
        status = ?status,
        rows = result.rows_affected(),
        "Order tracking updated"
    );
    Ok(result.rows_affected() > 0)
}

/// 批量设置配送批次（`IN (...)`），返回受影响行数
pub async fn assign_delivery_round(
    pool: &DbPool,
    order_ids: &[i64],
    delivery_round: Option<&str>,
) -> Result<u64, sqlx::Error> {
    if order_ids.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE orders SET delivery_round = ");
    builder.push_bind(delivery_round);
    builder.push(", updated_at = CURRENT_TIMESTAMP WHERE order_id IN (");
    let mut separated = builder.separated(", ");
    for order_id in order_ids {
        separated.push_bind(*order_id);
    }
    separated.push_unseparated(")");

    let result = builder.build().execute(pool).await?;
    tracing::debug!(
        orders = order_ids.len(),
        delivery_round = ?delivery_round,
        rows = result.rows_affected(),
        "Delivery round assigned"
    );
    Ok(result.rows_affected())
}

pub async fn list_orders(
    pool: &DbPool,
    filter: OrderFilter,
) -> Result<Vec<OrderRecord>, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM orders WHERE 1 = 1", ORDER_FIELDS));
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
    if filter.open_only {
        builder.push(" AND tracking_number IS NULL");
    }
    builder.push(" ORDER BY created_at DESC, order_id DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    builder
        .build_query_as::<OrderRecord>()
        .fetch_all(pool)
        .await
}
