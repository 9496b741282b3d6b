//! OCR stages and their fixed share of the 0–100 progress scale

use serde::Serialize;

/// One phase of a single image's recognition, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrStage {
    LoadingEngine,
    Initializing,
    LoadingLanguage,
    PreparingApi,
    Recognizing,
}

impl OcrStage {
    pub const ORDERED: [OcrStage; 5] = [
        OcrStage::LoadingEngine,
        OcrStage::Initializing,
        OcrStage::LoadingLanguage,
        OcrStage::PreparingApi,
        OcrStage::Recognizing,
    ];

    /// Progress band `[start, end]` owned by this stage.
    pub fn band(&self) -> (u8, u8) {
        match self {
            OcrStage::LoadingEngine => (0, 20),
            OcrStage::Initializing => (20, 40),
            OcrStage::LoadingLanguage => (40, 60),
            OcrStage::PreparingApi => (60, 70),
            OcrStage::Recognizing => (70, 100),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OcrStage::LoadingEngine => "loading engine",
            OcrStage::Initializing => "initializing",
            OcrStage::LoadingLanguage => "loading language data",
            OcrStage::PreparingApi => "preparing api",
            OcrStage::Recognizing => "recognizing text",
        }
    }

    /// Maps a fraction of this stage (0.0–1.0, clamped) onto the overall scale.
    pub fn progress_at(&self, fraction: f32) -> u8 {
        let (start, end) = self.band();
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let span = f32::from(end - start);
        start + (fraction * span).round() as u8
    }

    pub fn at(self, fraction: f32) -> OcrProgress {
        OcrProgress {
            stage: self,
            percent: self.progress_at(fraction),
        }
    }
}

/// A single progress notification emitted while one image is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OcrProgress {
    pub stage: OcrStage,
    pub percent: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_contiguous_and_cover_the_scale() {
        let mut expected_start = 0;
        for stage in OcrStage::ORDERED {
            let (start, end) = stage.band();
            assert_eq!(start, expected_start, "{stage:?}");
            assert!(end > start);
            expected_start = end;
        }
        assert_eq!(expected_start, 100);
    }

    #[test]
    fn fractions_map_into_the_stage_band() {
        assert_eq!(OcrStage::LoadingEngine.progress_at(0.0), 0);
        assert_eq!(OcrStage::LoadingEngine.progress_at(0.5), 10);
        assert_eq!(OcrStage::LoadingLanguage.progress_at(1.0), 60);
        assert_eq!(OcrStage::PreparingApi.progress_at(0.5), 65);
        assert_eq!(OcrStage::Recognizing.progress_at(0.5), 85);
        assert_eq!(OcrStage::Recognizing.progress_at(1.0), 100);
    }

    #[test]
    fn out_of_range_fractions_are_clamped() {
        assert_eq!(OcrStage::Initializing.progress_at(-3.0), 20);
        assert_eq!(OcrStage::Initializing.progress_at(7.0), 40);
        assert_eq!(OcrStage::Recognizing.progress_at(f32::NAN), 70);
    }
}
