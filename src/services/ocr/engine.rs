//! OCR engine trait

use image::DynamicImage;

/// Lifecycle of one OCR engine instance. The extractor calls the hooks in
/// declaration order, once each, and always finishes with `terminate`.
pub trait OcrEngine: Send {
    /// Load the engine core
    fn load(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Load the language data used for recognition
    fn load_language(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn prepare_api(&mut self) -> Result<(), String> {
        Ok(())
    }

    /// Recognize text in the image. `progress` takes the fraction (0.0–1.0)
    /// of recognition completed so far.
    fn recognize(&mut self, image: &DynamicImage, progress: &dyn Fn(f32)) -> Result<String, String>;

    /// Release everything the engine holds. Must not fail.
    fn terminate(&mut self);
}

/// Creates a fresh engine for every image.
pub trait OcrEngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn OcrEngine>, String>;
}
