//! 数据库枚举类型定义

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// 订单状态
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// 写入运单号后的状态。
    ///
    /// 只在运单号从空变为非空时推进一步（pending → processing → shipped），
    /// 其余状态以及覆盖已有运单号的情况保持不变。批量提交和单条编辑共用这张表。
    pub fn after_tracking_assigned(self, had_tracking: bool) -> OrderStatus {
        if had_tracking {
            return self;
        }
        match self {
            OrderStatus::Pending => OrderStatus::Processing,
            OrderStatus::Processing => OrderStatus::Shipped,
            other => other,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("未知的订单状态: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tracking_assignment_advances_one_step() {
        assert_eq!(
            OrderStatus::Pending.after_tracking_assigned(false),
            OrderStatus::Processing
        );
        assert_eq!(
            OrderStatus::Processing.after_tracking_assigned(false),
            OrderStatus::Shipped
        );
    }

    #[test]
    fn terminal_statuses_never_move() {
        for status in [
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.after_tracking_assigned(false), status);
            assert_eq!(status.after_tracking_assigned(true), status);
        }
    }

    #[test]
    fn overwriting_tracking_does_not_transition() {
        assert_eq!(
            OrderStatus::Pending.after_tracking_assigned(true),
            OrderStatus::Pending
        );
        assert_eq!(
            OrderStatus::Processing.after_tracking_assigned(true),
            OrderStatus::Processing
        );
    }

    #[test]
    fn parses_status_names() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(" Canceled ".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
