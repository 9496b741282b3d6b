//! 批处理进度状态与取消信号

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use super::types::ImageResult;
use crate::services::ocr::{OcrProgress, OcrStage, ProgressCallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Idle,
    Extracting,
    Matching,
    Finished,
    Failed,
    Cancelled,
}

/// 当前图片所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStage {
    Queued,
    LoadingEngine,
    Initializing,
    LoadingLanguage,
    PreparingApi,
    Recognizing,
    Done,
    Failed,
}

impl From<OcrStage> for ImageStage {
    fn from(stage: OcrStage) -> Self {
        match stage {
            OcrStage::LoadingEngine => ImageStage::LoadingEngine,
            OcrStage::Initializing => ImageStage::Initializing,
            OcrStage::LoadingLanguage => ImageStage::LoadingLanguage,
            OcrStage::PreparingApi => ImageStage::PreparingApi,
            OcrStage::Recognizing => ImageStage::Recognizing,
        }
    }
}

impl ImageStage {
    pub fn label(&self) -> &'static str {
        match self {
            ImageStage::Queued => "queued",
            ImageStage::LoadingEngine => OcrStage::LoadingEngine.label(),
            ImageStage::Initializing => OcrStage::Initializing.label(),
            ImageStage::LoadingLanguage => OcrStage::LoadingLanguage.label(),
            ImageStage::PreparingApi => OcrStage::PreparingApi.label(),
            ImageStage::Recognizing => OcrStage::Recognizing.label(),
            ImageStage::Done => "done",
            ImageStage::Failed => "failed",
        }
    }
}

/// 可订阅的批处理快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchState {
    pub run_id: Option<Uuid>,
    pub phase: BatchPhase,
    pub total_images: usize,
    /// 从 1 开始；尚未开始时为 0
    pub current_index: usize,
    pub current_file: Option<String>,
    pub stage: ImageStage,
    /// 当前图片的识别进度 0–100
    pub percent: u8,
    pub completed: Vec<ImageResult>,
    pub error: Option<String>,
}

impl Default for BatchState {
    fn default() -> Self {
        Self {
            run_id: None,
            phase: BatchPhase::Idle,
            total_images: 0,
            current_index: 0,
            current_file: None,
            stage: ImageStage::Queued,
            percent: 0,
            completed: Vec::new(),
            error: None,
        }
    }
}

impl BatchState {
    pub fn is_running(&self) -> bool {
        matches!(self.phase, BatchPhase::Extracting | BatchPhase::Matching)
    }
}

/// 协作式取消：在两张图片之间、两次匹配查询之间检查
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 写入端，只由编排器持有
#[derive(Clone)]
pub(crate) struct BatchProgress {
    sender: Arc<watch::Sender<BatchState>>,
}

impl BatchProgress {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(BatchState::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> BatchState {
        self.sender.borrow().clone()
    }

    pub fn start(&self, run_id: Uuid, total_images: usize) {
        self.sender.send_replace(BatchState {
            run_id: Some(run_id),
            phase: BatchPhase::Extracting,
            total_images,
            ..BatchState::default()
        });
    }

    pub fn begin_image(&self, index: usize, file_name: &str) {
        self.sender.send_modify(|state| {
            state.current_index = index;
            state.current_file = Some(file_name.to_string());
            state.stage = ImageStage::Queued;
            state.percent = 0;
        });
    }

    /// 转发给 OCR 适配器的进度回调
    pub fn stage_callback(&self) -> ProgressCallback {
        let sender = self.sender.clone();
        Box::new(move |progress: OcrProgress| {
            sender.send_modify(|state| {
                state.stage = progress.stage.into();
                state.percent = progress.percent;
            });
        })
    }

    pub fn finish_image(&self, result: ImageResult) {
        self.sender.send_modify(|state| {
            state.stage = if result.error.is_some() {
                ImageStage::Failed
            } else {
                ImageStage::Done
            };
            state.percent = 100;
            state.completed.push(result);
        });
    }

    pub fn set_phase(&self, phase: BatchPhase) {
        self.sender.send_modify(|state| state.phase = phase);
    }

    pub fn fail(&self, message: String) {
        self.sender.send_modify(|state| {
            state.phase = BatchPhase::Failed;
            state.error = Some(message);
        });
    }
}
