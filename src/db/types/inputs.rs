//! 数据库输入类型定义（用于插入/查询条件）

use super::enums::OrderStatus;

/// 新建订单输入
pub struct NewOrder<'a> {
    pub order_code: &'a str,
    pub customer_contact: &'a str,
    pub status: OrderStatus,
    pub tracking_number: Option<&'a str>,
    pub delivery_round: Option<&'a str>,
}

/// 订单列表过滤条件
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// 只列出尚未填写运单号的订单
    pub open_only: bool,
    pub limit: Option<i64>,
}
