//! 数据库记录类型定义（从数据库读取）

use serde::Serialize;
use sqlx::FromRow;

use super::enums::OrderStatus;

/// 订单记录
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct OrderRecord {
    pub order_id: i64,
    pub order_code: String,
    pub customer_contact: String,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub delivery_round: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl OrderRecord {
    /// 联系信息的第一行，按惯例是客户姓名
    pub fn customer_name(&self) -> &str {
        self.customer_contact
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    pub fn is_open(&self) -> bool {
        self.tracking_number.is_none()
    }
}
