//! 应用配置
//!
//! 配置文件为 `<配置目录>/config.json`，不存在时使用默认值。
//! 环境变量 `TRACKLABEL_DB` / `TRACKLABEL_TESSERACT` 优先于配置文件。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ResultExt};

pub const ENV_DATABASE_PATH: &str = "TRACKLABEL_DB";
pub const ENV_TESSERACT_BINARY: &str = "TRACKLABEL_TESSERACT";

const CONFIG_FILE_NAME: &str = "config.json";
const DATABASE_FILE_NAME: &str = "tracklabel.sqlite3";

/// Tesseract 命令行配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrConfig {
    pub binary_path: String,
    /// 语言包，`+` 分隔
    pub languages: String,
    pub page_segmentation_mode: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary_path: "tesseract".to_string(),
            languages: "tha+eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

impl OcrConfig {
    pub fn language_list(&self) -> Vec<&str> {
        self.languages
            .split('+')
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .collect()
    }
}

/// 手动对账搜索配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    pub min_query_len: usize,
    pub limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            limit: 5,
        }
    }
}

/// 配置数据结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub version: u32,
    #[serde(default)]
    pub database_path: String,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            database_path: String::new(),
            ocr: OcrConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AppConfig {
    fn apply_defaults(&mut self, data_dir: &Path) {
        if self.database_path.trim().is_empty() {
            self.database_path = data_dir.join(DATABASE_FILE_NAME).to_string_lossy().to_string();
        }
        if self.search.min_query_len == 0 {
            self.search.min_query_len = SearchConfig::default().min_query_len;
        }
        if self.search.limit <= 0 {
            self.search.limit = SearchConfig::default().limit;
        }
    }

    /// 用环境变量覆盖（`lookup` 便于测试注入）
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|v| !v.trim().is_empty()) {
            self.database_path = path;
        }
        if let Some(binary) = lookup(ENV_TESSERACT_BINARY).filter(|v| !v.trim().is_empty()) {
            self.ocr.binary_path = binary;
        }
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
    }
}

/// 配置服务
pub struct ConfigService {
    config_path: PathBuf,
    data_dir: PathBuf,
}

impl ConfigService {
    /// 使用操作系统标准目录
    pub fn new() -> AppResult<Self> {
        let dirs = directories::ProjectDirs::from("", "", "tracklabel")
            .ok_or_else(|| AppError::Config("无法确定用户目录".to_string()))?;
        Ok(Self::with_dirs(dirs.config_dir(), dirs.data_dir()))
    }

    pub fn with_dirs(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 加载配置（文件不存在则返回默认配置），不含环境变量覆盖
    pub fn load_file(&self) -> AppResult<AppConfig> {
        let mut config = if self.config_path.exists() {
            let raw = fs::read_to_string(&self.config_path)?;
            serde_json::from_str::<AppConfig>(&raw).config_err("配置文件格式错误")?
        } else {
            AppConfig::default()
        };
        config.apply_defaults(&self.data_dir);
        Ok(config)
    }

    /// 加载生效配置（含环境变量覆盖）
    pub fn load(&self) -> AppResult<AppConfig> {
        let mut config = self.load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 保存配置
    pub fn save(&self, config: &AppConfig) -> AppResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, json)?;
        tracing::debug!(path = %self.config_path.display(), "Config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults_under_data_dir() {
        let dir = tempdir().unwrap();
        let service = ConfigService::with_dirs(&dir.path().join("cfg"), &dir.path().join("data"));

        let config = service.load_file().unwrap();
        assert_eq!(config.ocr, OcrConfig::default());
        assert_eq!(config.search.limit, 5);
        assert_eq!(config.search.min_query_len, 2);
        assert_eq!(
            config.database_path(),
            dir.path().join("data").join(DATABASE_FILE_NAME)
        );
    }

    #[test]
    fn saved_config_round_trips_partial_files() {
        let dir = tempdir().unwrap();
        let service = ConfigService::with_dirs(dir.path(), dir.path());

        fs::write(
            service.config_path(),
            r#"{"version":1,"ocr":{"binary_path":"/opt/tess","languages":"eng","page_segmentation_mode":4}}"#,
        )
        .unwrap();
        let config = service.load_file().unwrap();
        assert_eq!(config.ocr.binary_path, "/opt/tess");
        assert_eq!(config.ocr.language_list(), vec!["eng"]);
        assert_eq!(config.search, SearchConfig::default());

        service.save(&config).unwrap();
        assert_eq!(service.load_file().unwrap(), config);
    }

    #[test]
    fn environment_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            ENV_DATABASE_PATH => Some("/tmp/shop.sqlite3".to_string()),
            ENV_TESSERACT_BINARY => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.database_path, "/tmp/shop.sqlite3");
        assert_eq!(config.ocr.binary_path, "tesseract");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let service = ConfigService::with_dirs(dir.path(), dir.path());
        fs::write(service.config_path(), "{ not json").unwrap();
        assert!(matches!(service.load_file(), Err(AppError::Config(_))));
    }

    #[test]
    fn language_list_skips_empty_parts() {
        let ocr = OcrConfig {
            languages: "tha++eng ".to_string(),
            ..OcrConfig::default()
        };
        assert_eq!(ocr.language_list(), vec!["tha", "eng"]);
    }
}
