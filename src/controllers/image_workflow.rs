// src/controllers/image_workflow.rs
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::LeafscanError;
use crate::models::{ImageAnalysisRequest, ImageReport, StagedFile, UploadedImage};
use crate::services::{AnalysisService, ImageProcessor};

use super::{lock, CompletionHook};

/// Two-step image flow. Upload and analysis are distinct pending stages: a
/// file must be uploaded before analysis can be requested, and the uploaded
/// handle is the input to the next step.
#[derive(Debug, Clone, Default)]
enum ImageStage {
    #[default]
    Idle,
    FileSelected {
        file: StagedFile,
    },
    Uploading {
        file: StagedFile,
    },
    Uploaded {
        image: UploadedImage,
    },
    Analyzing {
        image: UploadedImage,
    },
    Analyzed {
        image: UploadedImage,
        report: ImageReport,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePhase {
    Idle,
    FileSelected,
    Uploading,
    Uploaded,
    Analyzing,
    Analyzed,
}

impl ImageStage {
    const fn phase(&self) -> ImagePhase {
        match self {
            Self::Idle => ImagePhase::Idle,
            Self::FileSelected { .. } => ImagePhase::FileSelected,
            Self::Uploading { .. } => ImagePhase::Uploading,
            Self::Uploaded { .. } => ImagePhase::Uploaded,
            Self::Analyzing { .. } => ImagePhase::Analyzing,
            Self::Analyzed { .. } => ImagePhase::Analyzed,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ImageState {
    stage: ImageStage,
    error: Option<String>,
}

pub struct ImageWorkflowController {
    service: Arc<AnalysisService>,
    processor: ImageProcessor,
    state: Mutex<ImageState>,
    generation: AtomicU64,
    on_complete: Option<CompletionHook<ImageReport>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageWorkflowSnapshot {
    pub phase: ImagePhase,
    pub staged_filename: Option<String>,
    pub uploaded: Option<UploadedImage>,
    pub report: Option<ImageReport>,
    pub error: Option<String>,
}

impl ImageWorkflowController {
    pub fn new(service: Arc<AnalysisService>) -> Self {
        Self {
            service,
            processor: ImageProcessor::new(),
            state: Mutex::new(ImageState::default()),
            generation: AtomicU64::new(0),
            on_complete: None,
        }
    }

    pub fn with_completion_hook(mut self, hook: CompletionHook<ImageReport>) -> Self {
        self.on_complete = Some(hook);
        self
    }

    /// Stages a local file, running pre-upload validation and downscaling.
    pub fn select_file(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<(), LeafscanError> {
        let mut state = lock(&self.state);
        match state.stage {
            ImageStage::Idle | ImageStage::FileSelected { .. } => {}
            ImageStage::Uploading { .. } | ImageStage::Analyzing { .. } => {
                return Err(LeafscanError::Busy);
            }
            _ => {
                let err = LeafscanError::Validation(
                    "Reset the workflow before selecting a new image".to_string(),
                );
                state.error = Some(err.to_string());
                return Err(err);
            }
        }

        match self.processor.prepare_upload(filename, content_type, data) {
            Ok(file) => {
                debug!("staged {} as {}", file.filename, file.id);
                state.stage = ImageStage::FileSelected { file };
                state.error = None;
                Ok(())
            }
            Err(err) => {
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn upload(&self) -> Result<(), LeafscanError> {
        let (file, generation) = {
            let mut state = lock(&self.state);
            match &state.stage {
                ImageStage::FileSelected { file } => {
                    let file = file.clone();
                    state.stage = ImageStage::Uploading { file: file.clone() };
                    state.error = None;
                    (file, self.generation.fetch_add(1, Ordering::SeqCst) + 1)
                }
                ImageStage::Uploading { .. } | ImageStage::Analyzing { .. } => {
                    return Err(LeafscanError::Busy);
                }
                _ => {
                    let err =
                        LeafscanError::Validation("Select an image before uploading".to_string());
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            }
        };

        let outcome = self.service.upload_image(file).await;

        let mut state = lock(&self.state);
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("dropping stale upload response");
            return Ok(());
        }
        match outcome {
            Ok(image) => {
                // Staged bytes are no longer needed once the server holds the file.
                state.stage = ImageStage::Uploaded { image };
                Ok(())
            }
            Err(err) => {
                // Park at the step's precondition so the same step can be retried.
                if let ImageStage::Uploading { file } = std::mem::take(&mut state.stage) {
                    state.stage = ImageStage::FileSelected { file };
                }
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn analyze(&self) -> Result<(), LeafscanError> {
        let (image, generation) = {
            let mut state = lock(&self.state);
            match &state.stage {
                ImageStage::Uploaded { image } | ImageStage::Analyzed { image, .. } => {
                    let image = image.clone();
                    state.stage = ImageStage::Analyzing {
                        image: image.clone(),
                    };
                    state.error = None;
                    (image, self.generation.fetch_add(1, Ordering::SeqCst) + 1)
                }
                ImageStage::Uploading { .. } | ImageStage::Analyzing { .. } => {
                    return Err(LeafscanError::Busy);
                }
                _ => {
                    let err =
                        LeafscanError::Validation("No uploaded image to analyze".to_string());
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            }
        };

        let request = ImageAnalysisRequest {
            image_id: image.image_id.clone(),
        };
        let outcome = self.service.analyze_image(&request).await;

        let mut state = lock(&self.state);
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("dropping stale analysis response");
            return Ok(());
        }
        match outcome {
            Ok(report) => {
                state.stage = ImageStage::Analyzed {
                    image,
                    report: report.clone(),
                };
                drop(state);
                if let Some(hook) = &self.on_complete {
                    hook(&report);
                }
                Ok(())
            }
            Err(err) => {
                state.stage = ImageStage::Uploaded { image };
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn reset(&self) {
        let mut state = lock(&self.state);
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = ImageState::default();
    }

    pub fn dismiss_error(&self) {
        let mut state = lock(&self.state);
        state.error = None;
    }

    pub fn snapshot(&self) -> ImageWorkflowSnapshot {
        let state = lock(&self.state);
        let (staged_filename, uploaded, report) = match &state.stage {
            ImageStage::Idle => (None, None, None),
            ImageStage::FileSelected { file } | ImageStage::Uploading { file } => {
                (Some(file.filename.clone()), None, None)
            }
            ImageStage::Uploaded { image } | ImageStage::Analyzing { image } => {
                (None, Some(image.clone()), None)
            }
            ImageStage::Analyzed { image, report } => {
                (None, Some(image.clone()), Some(report.clone()))
            }
        };
        ImageWorkflowSnapshot {
            phase: state.stage.phase(),
            staged_filename,
            uploaded,
            report,
            error: state.error.clone(),
        }
    }
}
