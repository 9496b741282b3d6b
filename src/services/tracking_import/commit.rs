//! 写入运单号并推进订单状态

use serde::Serialize;

use crate::db::{get_order_by_id, update_order_tracking, DbPool, OrderRecord, OrderStatus};
use crate::error::{AppError, AppResult};

use super::types::MatchCandidate;

#[derive(Debug, Clone, Serialize)]
pub struct CommitFailure {
    pub order_id: i64,
    pub order_code: String,
    pub tracking: String,
    pub message: String,
}

/// 提交结果：每一行独立成功或失败
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommitReport {
    pub attempted: usize,
    pub success_count: usize,
    pub failures: Vec<CommitFailure>,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn message(&self) -> String {
        if self.attempted == 0 {
            "没有需要提交的运单号".to_string()
        } else if self.success_count == 0 {
            format!("{} 个订单全部保存失败", self.attempted)
        } else if self.is_complete() {
            format!("已保存 {} 个订单的运单号", self.success_count)
        } else {
            format!(
                "已保存 {}/{} 个订单的运单号，{} 个失败",
                self.success_count,
                self.attempted,
                self.failures.len()
            )
        }
    }
}

/// 逐行写入，单行失败不影响其它行
pub async fn commit_matches(pool: &DbPool, matches: &[MatchCandidate]) -> CommitReport {
    let mut report = CommitReport {
        attempted: matches.len(),
        ..Default::default()
    };

    for candidate in matches {
        match write_tracking(pool, candidate.order_id, Some(&candidate.tracking)).await {
            Ok(_) => report.success_count += 1,
            Err(err) => {
                tracing::warn!(
                    order_id = candidate.order_id,
                    tracking = %candidate.tracking,
                    error = %err,
                    "[TrackingImport] commit failed for order"
                );
                report.failures.push(CommitFailure {
                    order_id: candidate.order_id,
                    order_code: candidate.order_code.clone(),
                    tracking: candidate.tracking.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        attempted = report.attempted,
        succeeded = report.success_count,
        failed = report.failures.len(),
        "[TrackingImport] commit finished"
    );
    report
}

/// 手动修改单个订单的运单号；`None` 清除运单号且不改变状态
pub async fn set_order_tracking(
    pool: &DbPool,
    order_id: i64,
    tracking: Option<&str>,
) -> AppResult<OrderRecord> {
    write_tracking(pool, order_id, tracking).await?;
    Ok(get_order_by_id(pool, order_id).await?)
}

/// 只有运单号从空变为非空时才推进状态
async fn write_tracking(pool: &DbPool, order_id: i64, tracking: Option<&str>) -> AppResult<OrderStatus> {
    let order = get_order_by_id(pool, order_id)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => AppError::not_found("order", order_id),
            other => AppError::Database(other),
        })?;

    let next_status = match tracking {
        Some(_) => order.status.after_tracking_assigned(order.tracking_number.is_some()),
        None => order.status,
    };

    if !update_order_tracking(pool, order_id, tracking, next_status).await? {
        return Err(AppError::not_found("order", order_id));
    }
    if next_status != order.status {
        tracing::debug!(
            order_id,
            from = %order.status,
            to = %next_status,
            "Order status advanced"
        );
    }
    Ok(next_status)
}
