//! Binding to the OCR engine.
//!
//! The pipeline only talks to [`OcrClient`], so the engine can be swapped
//! for a stub in tests.

use anyhow::{Context, Result};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("no image set on the ocr client")]
    NoImage,

    #[error("failed to read image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("ocr engine failed on {path:?}: {message}")]
    Engine { path: PathBuf, message: String },
}

/// A reusable handle to an OCR engine.
pub trait OcrClient {
    /// Selects the image the next [`OcrClient::recognize_text`] call works on.
    fn set_image(&mut self, path: &Path);

    fn recognize_text(&mut self) -> Result<String, OcrError>;
}

/// `ocrs` engine with the detection and recognition models loaded once.
pub struct OcrsClient {
    engine: OcrEngine,
    image: Option<PathBuf>,
}

impl OcrsClient {
    pub fn new(models_dir: &Path) -> Result<Self> {
        let detection_path = models_dir.join(DETECTION_MODEL);
        let recognition_path = models_dir.join(RECOGNITION_MODEL);

        log::debug!("loading detection model from {:?}", detection_path);
        let detection_model = Model::load_file(&detection_path)
            .with_context(|| format!("failed to load detection model from {:?}", detection_path))?;

        log::debug!("loading recognition model from {:?}", recognition_path);
        let recognition_model = Model::load_file(&recognition_path).with_context(|| {
            format!("failed to load recognition model from {:?}", recognition_path)
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .context("failed to create ocr engine")?;
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: OcrEngine) -> Self {
        Self {
            engine,
            image: None,
        }
    }

    /// Where the `ocrs` tooling keeps its downloaded models.
    pub fn default_models_dir() -> Result<PathBuf> {
        Ok(dirs::cache_dir()
            .context("no cache directory for this user")?
            .join("ocrs"))
    }

    fn recognize(&self, path: &Path) -> Result<String> {
        let img = image::open(path)?.into_rgb8();
        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .context("failed to create image source")?;
        let input = self
            .engine
            .prepare_input(img_source)
            .context("failed to prepare ocr input")?;
        let word_rects = self
            .engine
            .detect_words(&input)
            .context("failed to detect words")?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .context("failed to recognize text")?;
        Ok(lines
            .iter()
            .flatten()
            .map(|line| line.to_string())
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl OcrClient for OcrsClient {
    fn set_image(&mut self, path: &Path) {
        self.image = Some(path.to_path_buf());
    }

    fn recognize_text(&mut self) -> Result<String, OcrError> {
        let path = self.image.as_deref().ok_or(OcrError::NoImage)?;
        self.recognize(path).map_err(|err| match err.downcast::<image::ImageError>() {
            Ok(source) => OcrError::Image {
                path: path.to_path_buf(),
                source,
            },
            Err(err) => OcrError::Engine {
                path: path.to_path_buf(),
                message: format!("{err:#}"),
            },
        })
    }
}
