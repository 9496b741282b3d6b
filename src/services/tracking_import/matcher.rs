//! 按电话号码把识别结果匹配到待发货订单

use crate::db::{find_open_orders_by_contact, DbPool};
use crate::error::{AppError, AppResult};

use super::progress::CancelHandle;
use super::types::{ExtractedPair, MatchCandidate, MatchSource, UnmatchedEntry};

/// 查找联系信息中包含该电话、且尚未填写运单号的第一个订单（按订单 ID 升序）。
pub async fn find_match(pool: &DbPool, pair: &ExtractedPair) -> AppResult<Option<MatchCandidate>> {
    let candidates = find_open_orders_by_contact(pool, &pair.phone).await?;
    if candidates.len() > 1 {
        tracing::warn!(
            phone = %pair.phone,
            candidates = candidates.len(),
            chosen = candidates[0].order_id,
            "[TrackingImport] several open orders share a phone, taking the oldest"
        );
    }

    Ok(candidates
        .first()
        .map(|order| MatchCandidate::new(order, &pair.phone, &pair.tracking, MatchSource::Automatic)))
}

/// 依次匹配所有结果。任意一次查询失败都会中止整个匹配阶段。
pub async fn match_pairs(
    pool: &DbPool,
    pairs: &[ExtractedPair],
    cancel: &CancelHandle,
) -> AppResult<(Vec<MatchCandidate>, Vec<UnmatchedEntry>)> {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for pair in pairs {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        match find_match(pool, pair).await? {
            Some(candidate) => matched.push(candidate),
            None => unmatched.push(UnmatchedEntry {
                entry_id: unmatched.len(),
                phone: pair.phone.clone(),
                tracking: pair.tracking.clone(),
            }),
        }
    }

    Ok((matched, unmatched))
}
