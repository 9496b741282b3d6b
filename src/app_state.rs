use std::fs;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::services::{TesseractFactory, TextExtractor};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<AppConfig>,
    pub extractor: TextExtractor,
}

impl AppState {
    /// 打开数据库（必要时创建目录）并准备 OCR 引擎工厂
    pub async fn init(config: AppConfig) -> AppResult<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let db = db::init_pool(&db_path).await?;
        let extractor = TextExtractor::new(Arc::new(TesseractFactory::new(config.ocr.clone())));
        tracing::debug!(db = %db_path.display(), "App state ready");

        Ok(Self {
            db,
            config: Arc::new(config),
            extractor,
        })
    }
}
