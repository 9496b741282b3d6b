pub mod ocr;
pub mod tracking_import;

pub use ocr::{ImageUpload, TesseractFactory, TextExtractor};
pub use tracking_import::{BatchOrchestrator, ReviewSession};
