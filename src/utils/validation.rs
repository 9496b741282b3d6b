//! 通用验证函数
//!
//! 提供集中的验证逻辑，避免在命令层重复验证代码

use crate::db::OrderStatus;
use crate::error::{AppError, AppResult, ResultExt};
use crate::services::ocr::ImageUpload;

/// 验证图片选择：为空或含有任何非 JPEG/PNG 文件时整批拒绝
pub fn validate_image_selection(images: &[ImageUpload]) -> AppResult<()> {
    if images.is_empty() {
        return Err(AppError::Validation("请至少选择一张图片".to_string()));
    }

    let rejected: Vec<String> = images
        .iter()
        .filter(|image| !image.is_accepted_type())
        .map(|image| image.file_name.clone())
        .collect();
    if !rejected.is_empty() {
        return Err(AppError::InputRejected { files: rejected });
    }
    Ok(())
}

/// 验证字符串非空（通用）
///
/// 返回 trim 后的字符串引用
pub fn validate_not_empty<'a>(value: &'a str, field_name: &str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} 不能为空", field_name)));
    }
    Ok(trimmed)
}

/// 手动填写的运单号：trim 后为空表示清除
pub fn normalize_tracking(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// 解析订单状态
pub fn parse_order_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().validation_err("订单状态")
}

/// 验证限制值范围
pub fn validate_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}
