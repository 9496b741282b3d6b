//! 批处理编排：逐张识别，全部识别完成后再统一匹配

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use super::extractor::extract_pairs;
use super::matcher::match_pairs;
use super::progress::{BatchPhase, BatchProgress, BatchState, CancelHandle};
use super::types::{BatchReport, ExtractedPair, ImageResult};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::ocr::{ImageUpload, TextExtractor};
use crate::utils::validate_image_selection;

pub struct BatchOrchestrator {
    db: DbPool,
    extractor: TextExtractor,
    progress: BatchProgress,
    cancel: CancelHandle,
    // 同一时间只允许一个批次
    run_lock: Mutex<()>,
}

impl BatchOrchestrator {
    pub fn new(db: DbPool, extractor: TextExtractor) -> Self {
        Self {
            db,
            extractor,
            progress: BatchProgress::new(),
            cancel: CancelHandle::default(),
            run_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.progress.subscribe()
    }

    pub fn state(&self) -> BatchState {
        self.progress.snapshot()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// 处理一批图片
    ///
    /// - 选择不合法时直接拒绝，不处理任何图片
    /// - 单张图片识别失败只记录在该图片的结果中，继续处理下一张
    /// - 匹配阶段任何查询失败都会中止匹配，已完成的识别结果仍保留在进度快照中
    pub async fn run_batch(&self, images: Vec<ImageUpload>) -> AppResult<BatchReport> {
        validate_image_selection(&images)?;
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| AppError::Business("已有批处理正在进行".to_string()))?;

        self.cancel.reset();
        let run_id = Uuid::new_v4();
        let start = Instant::now();
        self.progress.start(run_id, images.len());
        tracing::info!(%run_id, images = images.len(), "[TrackingImport] batch started");

        let (per_image, pairs) = match self.extract_all(run_id, &images).await {
            Ok(extracted) => extracted,
            Err(err) => return Err(self.abort(run_id, err)),
        };

        self.progress.set_phase(BatchPhase::Matching);
        let (matched, unmatched) = match match_pairs(&self.db, &pairs, &self.cancel).await {
            Ok(result) => result,
            Err(err) => return Err(self.abort(run_id, err)),
        };

        let report = BatchReport {
            run_id,
            per_image,
            matched,
            unmatched,
        };
        self.progress.set_phase(BatchPhase::Finished);
        tracing::info!(
            %run_id,
            pairs = report.pair_count(),
            matched = report.matched.len(),
            unmatched = report.unmatched.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "[TrackingImport] batch finished"
        );
        Ok(report)
    }

    async fn extract_all(
        &self,
        run_id: Uuid,
        images: &[ImageUpload],
    ) -> AppResult<(Vec<ImageResult>, Vec<ExtractedPair>)> {
        let mut per_image = Vec::with_capacity(images.len());
        let mut pairs = Vec::new();
        let mut seen: HashMap<String, String> = HashMap::new();

        for (index, upload) in images.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }
            self.progress.begin_image(index + 1, &upload.file_name);

            let fingerprint = upload.fingerprint();
            let duplicate_of = seen.get(&fingerprint).cloned();
            if let Some(first) = &duplicate_of {
                tracing::warn!(
                    %run_id,
                    file = %upload.file_name,
                    duplicate_of = %first,
                    "[TrackingImport] same image selected twice"
                );
            } else {
                seen.insert(fingerprint.clone(), upload.file_name.clone());
            }

            let mut result = match self
                .extractor
                .extract(upload, self.progress.stage_callback())
                .await
            {
                Ok(text) => {
                    let found = extract_pairs(&text);
                    tracing::debug!(
                        %run_id,
                        file = %upload.file_name,
                        pairs = found.len(),
                        "[TrackingImport] image recognized"
                    );
                    let result = ImageResult::from_pairs(&upload.file_name, fingerprint, &found);
                    pairs.extend(found);
                    result
                }
                Err(err) => {
                    tracing::warn!(
                        %run_id,
                        file = %upload.file_name,
                        error = %err,
                        "[TrackingImport] image skipped"
                    );
                    ImageResult::failed(&upload.file_name, fingerprint, err.to_string())
                }
            };
            result.duplicate_of = duplicate_of;

            self.progress.finish_image(result.clone());
            per_image.push(result);
        }

        Ok((per_image, pairs))
    }

    fn abort(&self, run_id: Uuid, err: AppError) -> AppError {
        match &err {
            AppError::Cancelled => {
                self.progress.set_phase(BatchPhase::Cancelled);
                tracing::info!(%run_id, "[TrackingImport] batch cancelled");
            }
            other if other.is_query_failure() => {
                self.progress.fail(format!("查询订单失败，匹配已中止: {}", other));
                tracing::error!(%run_id, error = %other, "[TrackingImport] order lookup failed, matching aborted");
            }
            other => {
                self.progress.fail(other.to_string());
                tracing::error!(%run_id, error = %other, "[TrackingImport] batch failed");
            }
        }
        err
    }
}
