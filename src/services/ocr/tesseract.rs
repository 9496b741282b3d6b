//! Tesseract OCR engine (CLI wrapper)

use image::DynamicImage;
use std::process::Command;
use std::time::Instant;
use tempfile::TempDir;

use super::engine::{OcrEngine, OcrEngineFactory};
use crate::config::OcrConfig;

const SCRATCH_IMAGE_NAME: &str = "label.png";

/// One tesseract session. The scratch directory lives from `initialize`
/// until `terminate`.
pub struct TesseractEngine {
    config: OcrConfig,
    version: Option<String>,
    scratch: Option<TempDir>,
    args: Vec<String>,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            version: None,
            scratch: None,
            args: Vec::new(),
        }
    }

    fn binary(&self) -> &str {
        self.config.binary_path.as_str()
    }
}

impl OcrEngine for TesseractEngine {
    fn load(&mut self) -> Result<(), String> {
        let version = get_tesseract_version(self.binary())?;
        tracing::debug!(version = %version, "[Tesseract] engine loaded");
        self.version = Some(version);
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), String> {
        let scratch = tempfile::Builder::new()
            .prefix("tracklabel-ocr-")
            .tempdir()
            .map_err(|e| format!("创建临时目录失败: {}", e))?;
        self.scratch = Some(scratch);
        Ok(())
    }

    fn load_language(&mut self) -> Result<(), String> {
        let output = Command::new(self.binary())
            .arg("--list-langs")
            .output()
            .map_err(|e| format!("无法执行 tesseract: {}", e))?;
        // 旧版本把语言列表写到 stderr
        let listing = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).to_string()
        };
        let available = parse_language_list(&listing);

        let missing: Vec<&str> = self
            .config
            .language_list()
            .into_iter()
            .filter(|lang| !available.iter().any(|a| a == lang))
            .collect();
        if !missing.is_empty() {
            return Err(format!("缺少语言包: {}", missing.join(", ")));
        }
        Ok(())
    }

    fn prepare_api(&mut self) -> Result<(), String> {
        let languages = self.config.language_list();
        if languages.is_empty() {
            return Err("未配置识别语言".to_string());
        }
        self.args = vec![
            "-l".to_string(),
            languages.join("+"),
            "--psm".to_string(),
            self.config.page_segmentation_mode.to_string(),
        ];
        Ok(())
    }

    fn recognize(&mut self, image: &DynamicImage, progress: &dyn Fn(f32)) -> Result<String, String> {
        let start = Instant::now();
        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| "OCR 引擎尚未初始化".to_string())?;
        let input = scratch.path().join(SCRATCH_IMAGE_NAME);

        image
            .save(&input)
            .map_err(|e| format!("保存临时图片失败: {}", e))?;
        progress(0.2);

        let output = Command::new(self.binary())
            .arg(&input)
            .arg("stdout")
            .args(&self.args)
            .output()
            .map_err(|e| format!("执行 tesseract 失败: {}", e))?;
        progress(0.9);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("Tesseract 执行失败: {}", stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        tracing::debug!(
            version = self.version.as_deref().unwrap_or("unknown"),
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "[Tesseract] recognition finished"
        );
        Ok(text)
    }

    fn terminate(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            if let Err(err) = scratch.close() {
                tracing::warn!(error = %err, "[Tesseract] failed to remove scratch dir");
            }
        }
        self.args.clear();
    }
}

/// Builds one `TesseractEngine` per image from the shared configuration.
#[derive(Debug, Clone)]
pub struct TesseractFactory {
    config: OcrConfig,
}

impl TesseractFactory {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl OcrEngineFactory for TesseractFactory {
    fn create(&self) -> Result<Box<dyn OcrEngine>, String> {
        Ok(Box::new(TesseractEngine::new(self.config.clone())))
    }
}

/// Get the tesseract version line
pub fn get_tesseract_version(binary_path: &str) -> Result<String, String> {
    let output = Command::new(binary_path)
        .arg("--version")
        .output()
        .map_err(|e| format!("无法执行 tesseract: {}", e))?;
    if !output.status.success() {
        return Err(format!("tesseract --version 失败: {:?}", output.status.code()));
    }

    // 有些版本输出到 stderr
    let raw = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    String::from_utf8_lossy(&raw)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| "无法读取 tesseract 版本".to_string())
}

/// Parses `tesseract --list-langs` output, skipping the header line.
fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}
