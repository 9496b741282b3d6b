//! Label text extraction
//!
//! Wraps an OCR engine behind a single `extract` call per image:
//! - `engine`: the engine lifecycle trait and its per-image factory
//! - `stage`: the five recognition stages and their progress bands
//! - `tesseract`: the production engine (tesseract CLI)
//! - `upload`: an uploaded image and its declared MIME type

mod engine;
mod stage;
mod tesseract;
mod upload;

pub use engine::{OcrEngine, OcrEngineFactory};
pub use stage::{OcrProgress, OcrStage};
pub use tesseract::{get_tesseract_version, TesseractEngine, TesseractFactory};
pub use upload::{mime_for_path, ImageUpload, ACCEPTED_MIME_TYPES};

use std::sync::Arc;

use crate::error::{AppResult, ResultExt};

/// Progress callback for one image's recognition
pub type ProgressCallback = Box<dyn Fn(OcrProgress) + Send + Sync>;

/// Releases the engine however the extraction ends.
struct EngineGuard {
    engine: Box<dyn OcrEngine>,
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        self.engine.terminate();
    }
}

/// Runs one OCR engine per image on the blocking thread pool.
#[derive(Clone)]
pub struct TextExtractor {
    factory: Arc<dyn OcrEngineFactory>,
}

impl TextExtractor {
    pub fn new(factory: Arc<dyn OcrEngineFactory>) -> Self {
        Self { factory }
    }

    /// Recognize the text of a single image.
    ///
    /// Progress is reported through the five stages in order. Any engine or
    /// decoding failure comes back as `AppError::Extraction` for this image only.
    pub async fn extract(&self, upload: &ImageUpload, on_progress: ProgressCallback) -> AppResult<String> {
        let factory = self.factory.clone();
        let bytes = upload.bytes.clone();
        let file_name = upload.file_name.clone();

        let text = tokio::task::spawn_blocking(move || {
            run_engine(factory.as_ref(), &bytes, on_progress.as_ref())
        })
        .await
        .map_err(|e| format!("识别任务异常退出: {}", e))
        .ocr_err(&file_name)?
        .ocr_err(&file_name)?;
        Ok(text)
    }
}

fn run_engine(
    factory: &dyn OcrEngineFactory,
    bytes: &[u8],
    report: &(dyn Fn(OcrProgress) + Send + Sync),
) -> Result<String, String> {
    report(OcrStage::LoadingEngine.at(0.0));
    let engine = factory.create()?;
    let mut guard = EngineGuard { engine };
    guard.engine.load()?;
    report(OcrStage::LoadingEngine.at(1.0));

    report(OcrStage::Initializing.at(0.0));
    guard.engine.initialize()?;
    report(OcrStage::Initializing.at(1.0));

    report(OcrStage::LoadingLanguage.at(0.0));
    guard.engine.load_language()?;
    report(OcrStage::LoadingLanguage.at(1.0));

    report(OcrStage::PreparingApi.at(0.0));
    guard.engine.prepare_api()?;
    report(OcrStage::PreparingApi.at(1.0));

    report(OcrStage::Recognizing.at(0.0));
    let image = image::load_from_memory(bytes).map_err(|e| format!("无法解码图片: {}", e))?;
    let text = guard
        .engine
        .recognize(&image, &|fraction| report(OcrStage::Recognizing.at(fraction)))?;
    report(OcrStage::Recognizing.at(1.0));

    Ok(text)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted engine used by the pipeline tests.

    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use image::{DynamicImage, ImageFormat};

    use super::{OcrEngine, OcrEngineFactory};

    /// One scripted outcome per created engine, consumed in order.
    #[derive(Default)]
    pub struct ScriptedFactory {
        pub outcomes: Mutex<VecDeque<Result<String, String>>>,
        pub created: AtomicUsize,
        pub terminated: Arc<AtomicUsize>,
    }

    impl ScriptedFactory {
        pub fn new(outcomes: Vec<Result<String, String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                ..Default::default()
            }
        }

        pub fn terminated(&self) -> usize {
            self.terminated.load(Ordering::SeqCst)
        }

        pub fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }
    }

    struct ScriptedEngine {
        outcome: Result<String, String>,
        terminated: Arc<AtomicUsize>,
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&mut self, _image: &DynamicImage, progress: &dyn Fn(f32)) -> Result<String, String> {
            progress(0.5);
            self.outcome.clone()
        }

        fn terminate(&mut self) {
            self.terminated.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl OcrEngineFactory for ScriptedFactory {
        fn create(&self) -> Result<Box<dyn OcrEngine>, String> {
            self.created.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .outcomes
                .lock()
                .map_err(|e| e.to_string())?
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()));
            Ok(Box::new(ScriptedEngine {
                outcome,
                terminated: self.terminated.clone(),
            }))
        }
    }

    /// A tiny valid PNG.
    pub fn png_bytes() -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(4, 4)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::testing::{png_bytes, ScriptedFactory};
    use super::*;
    use crate::error::AppError;

    fn recorder() -> (Arc<Mutex<Vec<OcrProgress>>>, ProgressCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Box::new(move |p| sink.lock().unwrap().push(p));
        (seen, callback)
    }

    #[tokio::test]
    async fn extract_reports_stages_in_order_and_releases_engine() {
        let factory = Arc::new(ScriptedFactory::new(vec![Ok("hello".to_string())]));
        let extractor = TextExtractor::new(factory.clone());
        let upload = ImageUpload::new("a.png", "image/png", png_bytes());

        let (seen, callback) = recorder();
        let text = extractor.extract(&upload, callback).await.unwrap();
        assert_eq!(text, "hello");
        assert_eq!(factory.terminated(), 1);

        let seen = seen.lock().unwrap();
        let percents: Vec<u8> = seen.iter().map(|p| p.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
        assert!(seen.contains(&OcrStage::Recognizing.at(0.5)));

        let mut stages: Vec<OcrStage> = seen.iter().map(|p| p.stage).collect();
        stages.dedup();
        assert_eq!(stages, OcrStage::ORDERED.to_vec());
    }

    #[tokio::test]
    async fn undecodable_image_is_an_extraction_error_and_still_released() {
        let factory = Arc::new(ScriptedFactory::new(vec![Ok("unused".to_string())]));
        let extractor = TextExtractor::new(factory.clone());
        let upload = ImageUpload::new("broken.png", "image/png", b"not an image".to_vec());

        let (_, callback) = recorder();
        let err = extractor.extract(&upload, callback).await.unwrap_err();
        match err {
            AppError::Extraction { file, .. } => assert_eq!(file, "broken.png"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(factory.terminated(), 1);
    }

    #[tokio::test]
    async fn engine_failure_is_reported_for_that_image() {
        let factory = Arc::new(ScriptedFactory::new(vec![Err("engine crashed".to_string())]));
        let extractor = TextExtractor::new(factory.clone());
        let upload = ImageUpload::new("a.jpg", "image/jpeg", png_bytes());

        let (_, callback) = recorder();
        let err = extractor.extract(&upload, callback).await.unwrap_err();
        match err {
            AppError::Extraction { file, message } => {
                assert_eq!(file, "a.jpg");
                assert!(message.contains("engine crashed"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(factory.terminated(), 1);
    }
}
