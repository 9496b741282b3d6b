//! 订单相关命令

use chrono::Local;

use crate::db::{self, NewOrder, OrderFilter, OrderRecord};
use crate::error::{AppError, AppResult};
use crate::services::tracking_import::set_order_tracking;
use crate::utils::{normalize_tracking, parse_order_status, validate_limit, validate_not_empty};
use crate::AppState;

const MAX_LIST_LIMIT: i64 = 500;
const MAX_SEARCH_LIMIT: i64 = 50;

/// 列出订单
pub async fn list_orders(
    state: &AppState,
    status: Option<&str>,
    open_only: bool,
    limit: Option<i64>,
) -> AppResult<Vec<OrderRecord>> {
    let filter = OrderFilter {
        status: status.map(parse_order_status).transpose()?,
        open_only,
        limit: limit.map(|l| l.clamp(1, MAX_LIST_LIMIT)),
    };
    Ok(db::list_orders(&state.db, filter).await?)
}

/// 搜索待发货订单；输入过短时返回空结果
pub async fn search_orders(state: &AppState, query: &str, limit: Option<i64>) -> AppResult<Vec<OrderRecord>> {
    let query = query.trim();
    if query.chars().count() < state.config.search.min_query_len {
        return Ok(Vec::new());
    }
    let limit = validate_limit(limit, state.config.search.limit, MAX_SEARCH_LIMIT);
    Ok(db::search_open_orders(&state.db, query, limit).await?)
}

/// 新增订单
pub async fn add_order(state: &AppState, order_code: &str, contact: &str, status: &str) -> AppResult<OrderRecord> {
    let order_code = validate_not_empty(order_code, "订单号")?;
    let status = parse_order_status(status)?;
    if db::get_order_by_code(&state.db, order_code).await?.is_some() {
        return Err(AppError::Business(format!("订单号已存在: {}", order_code)));
    }

    let order_id = db::insert_order(
        &state.db,
        NewOrder {
            order_code,
            customer_contact: contact.trim(),
            status,
            tracking_number: None,
            delivery_round: None,
        },
    )
    .await?;
    Ok(db::get_order_by_id(&state.db, order_id).await?)
}

/// 手动设置单个订单的运单号
pub async fn set_tracking(state: &AppState, order_code: &str, tracking: Option<&str>) -> AppResult<OrderRecord> {
    let order = find_by_code(state, order_code).await?;
    set_order_tracking(&state.db, order.order_id, tracking.and_then(normalize_tracking)).await
}

/// 批量设置配送批次；任一订单号不存在时整批不修改
pub async fn assign_round(state: &AppState, order_codes: &[String], round: Option<&str>) -> AppResult<u64> {
    let mut order_ids = Vec::with_capacity(order_codes.len());
    for code in order_codes {
        order_ids.push(find_by_code(state, code).await?.order_id);
    }
    order_ids.sort_unstable();
    order_ids.dedup();

    let round = round.map(str::trim).filter(|r| !r.is_empty());
    Ok(db::assign_delivery_round(&state.db, &order_ids, round).await?)
}

pub fn default_round_name() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

async fn find_by_code(state: &AppState, order_code: &str) -> AppResult<OrderRecord> {
    let order_code = validate_not_empty(order_code, "订单号")?;
    db::get_order_by_code(&state.db, order_code)
        .await?
        .ok_or_else(|| AppError::not_found("order", order_code))
}
