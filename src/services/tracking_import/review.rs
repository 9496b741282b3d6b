//! 审核会话：查看识别结果 → 审核匹配（含手动对账）→ 提交或取消

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::commit::{commit_matches, CommitReport};
use super::types::{BatchReport, BatchStatus, ImageResult, MatchCandidate, MatchSource, UnmatchedEntry};
use crate::config::SearchConfig;
use crate::db::{search_open_orders, DbPool, OrderRecord};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStep {
    ReviewingResults,
    ReviewingMatches,
    Committed,
    Cancelled,
}

/// 某条未匹配结果的搜索状态
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntrySearch {
    pub query: String,
    pub results: Vec<OrderRecord>,
}

pub struct ReviewSession {
    run_id: Uuid,
    step: ReviewStep,
    status: BatchStatus,
    per_image: Vec<ImageResult>,
    matched: Vec<MatchCandidate>,
    unmatched: Vec<UnmatchedEntry>,
    searches: HashMap<usize, EntrySearch>,
    next_entry_id: usize,
    search: SearchConfig,
}

impl ReviewSession {
    pub fn new(report: BatchReport, search: SearchConfig) -> Self {
        let status = report.status();
        let next_entry_id = report
            .unmatched
            .iter()
            .map(|e| e.entry_id + 1)
            .max()
            .unwrap_or(0);
        Self {
            run_id: report.run_id,
            step: ReviewStep::ReviewingResults,
            status,
            per_image: report.per_image,
            matched: report.matched,
            unmatched: report.unmatched,
            searches: HashMap::new(),
            next_entry_id,
            search,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn step(&self) -> ReviewStep {
        self.step
    }

    /// 批处理结束时的结论，不随手动对账变化
    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn per_image(&self) -> &[ImageResult] {
        &self.per_image
    }

    pub fn matched(&self) -> &[MatchCandidate] {
        &self.matched
    }

    pub fn unmatched(&self) -> &[UnmatchedEntry] {
        &self.unmatched
    }

    pub fn search_state(&self, entry_id: usize) -> Option<&EntrySearch> {
        self.searches.get(&entry_id)
    }

    /// 没有任何识别数据时不能进入匹配审核
    pub fn can_proceed(&self) -> bool {
        self.step == ReviewStep::ReviewingResults && self.status != BatchStatus::NoDataFound
    }

    /// 有数据但一条都没自动匹配上：直接进入手动对账
    pub fn opens_on_unmatched(&self) -> bool {
        matches!(self.status, BatchStatus::NoMatchesFound { .. })
    }

    pub fn proceed(&mut self) -> AppResult<()> {
        self.expect_step(ReviewStep::ReviewingResults)?;
        if self.status == BatchStatus::NoDataFound {
            return Err(AppError::Business(self.status.message()));
        }
        self.step = ReviewStep::ReviewingMatches;
        Ok(())
    }

    /// 为某条未匹配结果搜索待发货订单（订单号或联系信息）
    ///
    /// 少于最小长度的输入会清空结果且不查询数据库。
    pub async fn search(&mut self, pool: &DbPool, entry_id: usize, text: &str) -> AppResult<Vec<OrderRecord>> {
        self.expect_step(ReviewStep::ReviewingMatches)?;
        self.entry(entry_id)?;

        let query = text.trim();
        let results = if query.chars().count() < self.search.min_query_len {
            Vec::new()
        } else {
            search_open_orders(pool, query, self.search.limit).await?
        };

        self.searches.insert(
            entry_id,
            EntrySearch {
                query: text.to_string(),
                results: results.clone(),
            },
        );
        Ok(results)
    }

    /// 把未匹配结果手动绑定到订单，并清除它的搜索状态
    pub fn bind(&mut self, entry_id: usize, order: &OrderRecord) -> AppResult<&MatchCandidate> {
        self.expect_step(ReviewStep::ReviewingMatches)?;
        if !order.is_open() {
            return Err(AppError::Validation(format!(
                "订单 {} 已有运单号",
                order.order_code
            )));
        }
        let position = self.entry(entry_id)?;

        let entry = self.unmatched.remove(position);
        self.searches.remove(&entry_id);
        tracing::debug!(
            entry_id,
            order_id = order.order_id,
            tracking = %entry.tracking,
            "[TrackingImport] entry bound manually"
        );
        self.matched.push(MatchCandidate::new(
            order,
            &entry.phone,
            &entry.tracking,
            MatchSource::Manual,
        ));
        Ok(&self.matched[self.matched.len() - 1])
    }

    /// 撤销一条匹配，放回未匹配列表
    pub fn unbind(&mut self, index: usize) -> AppResult<&UnmatchedEntry> {
        self.expect_step(ReviewStep::ReviewingMatches)?;
        if index >= self.matched.len() {
            return Err(AppError::not_found("match", index));
        }
        let candidate = self.matched.remove(index);
        let entry = UnmatchedEntry {
            entry_id: self.next_entry_id,
            phone: candidate.phone,
            tracking: candidate.tracking,
        };
        self.next_entry_id += 1;
        self.unmatched.push(entry);
        Ok(&self.unmatched[self.unmatched.len() - 1])
    }

    /// 提交当前所有匹配；未匹配结果被丢弃，提交后会话不再持有任何结果
    pub async fn commit(&mut self, pool: &DbPool) -> AppResult<CommitReport> {
        self.expect_step(ReviewStep::ReviewingMatches)?;
        if !self.unmatched.is_empty() {
            tracing::info!(
                run_id = %self.run_id,
                discarded = self.unmatched.len(),
                "[TrackingImport] unmatched entries discarded on commit"
            );
        }
        let matched = std::mem::take(&mut self.matched);
        self.unmatched.clear();
        self.searches.clear();
        let report = commit_matches(pool, &matched).await;
        self.step = ReviewStep::Committed;
        Ok(report)
    }

    /// 放弃本次结果，不写入任何数据
    pub fn cancel(&mut self) -> AppResult<()> {
        if matches!(self.step, ReviewStep::Committed | ReviewStep::Cancelled) {
            return Err(AppError::Business("审核已结束".to_string()));
        }
        self.step = ReviewStep::Cancelled;
        self.matched.clear();
        self.unmatched.clear();
        self.searches.clear();
        Ok(())
    }

    fn expect_step(&self, expected: ReviewStep) -> AppResult<()> {
        if self.step != expected {
            return Err(AppError::Business(format!(
                "当前步骤 {:?} 不允许该操作",
                self.step
            )));
        }
        Ok(())
    }

    fn entry(&self, entry_id: usize) -> AppResult<usize> {
        self.unmatched
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or_else(|| AppError::not_found("unmatched entry", entry_id))
    }
}
